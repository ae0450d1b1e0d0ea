//! Random UUID keys.

use tabula_common::TabulaResult;
use uuid::Uuid;

use super::IdGenerator;

/// Generates hyphenated version 4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl UuidGenerator {
    /// Creates a generator.
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> TabulaResult<String> {
        Ok(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let id = UuidGenerator::new().generate().unwrap();
        assert_eq!(id.len(), 36);
        assert_eq!(id.matches('-').count(), 4);
        assert_eq!(&id[14..15], "4");
    }

    #[test]
    fn test_distinct() {
        let generator = UuidGenerator::new();
        assert_ne!(generator.generate().unwrap(), generator.generate().unwrap());
    }
}
