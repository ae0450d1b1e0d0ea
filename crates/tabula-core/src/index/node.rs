//! Index node rows.
//!
//! A node is stored as one row of the index backing table:
//!
//! | column      | type       | content                                |
//! |-------------|------------|----------------------------------------|
//! | `keyLeft`   | int(8)     | id of the inferior child, 0 if none    |
//! | `keyRight`  | int(8)     | id of the superior child, 0 if none    |
//! | `data`      | string     | JSON array of the indexed tuple        |
//! | `tableKeys` | string     | JSON array of the row keys at the node |

use std::cmp::Ordering;

use tabula_common::{compare_tuple_prefix, IndexNodeId, TabulaError, TabulaResult, Value};

use crate::row::Row;

pub(crate) const KEY_LEFT: &str = "keyLeft";
pub(crate) const KEY_RIGHT: &str = "keyRight";
pub(crate) const DATA: &str = "data";
pub(crate) const TABLE_KEYS: &str = "tableKeys";

/// One node of an index tree.
///
/// Every tuple in the `left` subtree is strictly inferior to `tuple` and
/// every tuple in the `right` subtree strictly superior. Rows whose tuples
/// are equal share the node's key set.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IndexNode {
    pub(crate) id: IndexNodeId,
    pub(crate) tuple: Vec<Value>,
    pub(crate) keys: Vec<String>,
    pub(crate) left: IndexNodeId,
    pub(crate) right: IndexNodeId,
}

impl IndexNode {
    /// Creates a leaf holding one row key.
    pub(crate) fn new(id: IndexNodeId, tuple: Vec<Value>, key: &str) -> Self {
        Self {
            id,
            tuple,
            keys: vec![key.to_string()],
            left: IndexNodeId::NONE,
            right: IndexNodeId::NONE,
        }
    }

    /// Compares the node tuple with `probe`, over the probe's length.
    pub(crate) fn compare(&self, probe: &[Value]) -> Ordering {
        compare_tuple_prefix(&self.tuple, probe)
    }

    /// Adds a row key; returns false if it was already present.
    pub(crate) fn add_key(&mut self, key: &str) -> bool {
        if self.keys.iter().any(|k| k == key) {
            return false;
        }
        self.keys.push(key.to_string());
        true
    }

    /// Removes a row key; returns false if it was absent.
    pub(crate) fn remove_key(&mut self, key: &str) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k != key);
        self.keys.len() != before
    }

    /// Encodes the node as a backing-table row.
    pub(crate) fn to_row(&self) -> TabulaResult<Row> {
        let data = serde_json::to_string(&self.tuple)
            .map_err(|e| TabulaError::serialization(e.to_string()))?;
        let keys = serde_json::to_string(&self.keys)
            .map_err(|e| TabulaError::serialization(e.to_string()))?;
        Ok(Row::new()
            .with(KEY_LEFT, encode_id(self.left)?)
            .with(KEY_RIGHT, encode_id(self.right)?)
            .with(DATA, data)
            .with(TABLE_KEYS, keys))
    }

    /// Decodes a backing-table row.
    pub(crate) fn from_row(id: IndexNodeId, row: &Row) -> TabulaResult<Self> {
        let tuple = serde_json::from_str(text_field(row, DATA)?)
            .map_err(|e| TabulaError::serialization(e.to_string()))?;
        let keys = serde_json::from_str(text_field(row, TABLE_KEYS)?)
            .map_err(|e| TabulaError::serialization(e.to_string()))?;
        Ok(Self {
            id,
            tuple,
            keys,
            left: decode_id(row, KEY_LEFT)?,
            right: decode_id(row, KEY_RIGHT)?,
        })
    }
}

fn encode_id(id: IndexNodeId) -> TabulaResult<i64> {
    i64::try_from(id.as_u64()).map_err(|_| TabulaError::index(format!("node id {id} overflows")))
}

fn decode_id(row: &Row, field: &str) -> TabulaResult<IndexNodeId> {
    match row.get(field) {
        Some(Value::Int(id)) => u64::try_from(*id)
            .map(IndexNodeId::new)
            .map_err(|_| TabulaError::index(format!("negative node id in '{field}'"))),
        _ => Err(TabulaError::index(format!("node row lacks '{field}'"))),
    }
}

fn text_field<'a>(row: &'a Row, field: &str) -> TabulaResult<&'a str> {
    row.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| TabulaError::index(format!("node row lacks '{field}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_codec() {
        let mut node = IndexNode::new(
            IndexNodeId::new(3),
            vec![Value::from("john"), Value::Float(12.5)],
            "k1",
        );
        node.add_key("k2");
        node.right = IndexNodeId::new(7);

        let row = node.to_row().unwrap();
        assert_eq!(row.get(DATA), Some(&Value::from(r#"["john",12.5]"#)));
        assert_eq!(row.get(TABLE_KEYS), Some(&Value::from(r#"["k1","k2"]"#)));
        assert_eq!(IndexNode::from_row(node.id, &row).unwrap(), node);
    }

    #[test]
    fn test_key_set() {
        let mut node = IndexNode::new(IndexNodeId::ROOT, vec![Value::Int(1)], "a");
        assert!(!node.add_key("a"));
        assert!(node.add_key("b"));
        assert!(node.remove_key("a"));
        assert!(!node.remove_key("a"));
        assert_eq!(node.keys, vec!["b".to_string()]);
    }
}
