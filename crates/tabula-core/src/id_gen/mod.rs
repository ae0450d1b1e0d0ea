//! Row key generators.
//!
//! A table given no key on insert asks its generator for one. The table
//! retries when a generated key is already taken.

mod snowflake;
mod ulid;
mod uuid;

pub use self::snowflake::SnowflakeGenerator;
pub use self::ulid::UlidGenerator;
pub use self::uuid::UuidGenerator;

use std::fmt;

use tabula_common::TabulaResult;

/// Produces row keys.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Returns a new key.
    fn generate(&self) -> TabulaResult<String>;
}

/// Milliseconds since the Unix epoch.
pub(crate) fn unix_millis() -> TabulaResult<u64> {
    let elapsed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| tabula_common::TabulaError::internal(format!("system clock before epoch: {e}")))?;
    u64::try_from(elapsed.as_millis())
        .map_err(|_| tabula_common::TabulaError::internal("system clock out of range"))
}
