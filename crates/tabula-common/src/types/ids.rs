//! Identifier types for Tabula.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index node identifier - addresses one node row of an index backing table.
///
/// Node ids are assigned sequentially starting at 1; 0 means "no child".
///
/// # Example
///
/// ```rust
/// use tabula_common::types::IndexNodeId;
///
/// let root = IndexNodeId::ROOT;
/// assert_eq!(root.as_u64(), 1);
/// assert!(!IndexNodeId::NONE.is_some());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct IndexNodeId(u64);

impl IndexNodeId {
    /// Sentinel for an absent child.
    pub const NONE: Self = Self(0);

    /// Id of the root node.
    pub const ROOT: Self = Self(1);

    /// Creates a new `IndexNodeId` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Checks if this id points at a node.
    #[inline]
    #[must_use]
    pub const fn is_some(self) -> bool {
        self.0 != Self::NONE.0
    }

    /// Returns `Some(self)` when this id points at a node.
    #[inline]
    #[must_use]
    pub const fn get(self) -> Option<Self> {
        if self.is_some() {
            Some(self)
        } else {
            None
        }
    }

    /// Returns the row key of the node in the backing table.
    #[must_use]
    pub fn row_key(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Debug for IndexNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_some() {
            write!(f, "IndexNodeId({})", self.0)
        } else {
            write!(f, "IndexNodeId(NONE)")
        }
    }
}

impl fmt::Display for IndexNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for IndexNodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_node_id() {
        let id = IndexNodeId::new(42);
        assert_eq!(id.as_u64(), 42);
        assert_eq!(id.row_key(), "42");
        assert_eq!(id.get(), Some(id));
        assert_eq!(IndexNodeId::NONE.get(), None);
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", IndexNodeId::NONE), "IndexNodeId(NONE)");
        assert_eq!(format!("{:?}", IndexNodeId::ROOT), "IndexNodeId(1)");
    }
}
