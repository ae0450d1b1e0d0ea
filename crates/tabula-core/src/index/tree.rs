//! Index tree operations.
//!
//! The tree is an unbalanced binary search tree over composite tuples whose
//! nodes are rows of a backing table. Node ids are allocated sequentially
//! from 1 and nodes are never physically removed: deleting the last key of
//! a node leaves an empty tombstone that still routes descents.
//!
//! Writers serialize on a latch. Readers take no latch and rely on the
//! backing table's row locks, so a reader racing a writer sees either the
//! node before or after the write.

use std::cmp::Ordering;
use std::collections::HashSet;

use parking_lot::Mutex;
use tabula_common::{IndexNodeId, TabulaError, TabulaResult, Value};
use tracing::trace;

use super::node::{IndexNode, DATA, KEY_LEFT, KEY_RIGHT, TABLE_KEYS};
use crate::column::Column;
use crate::filter::{IndexFilter, Operator};
use crate::table::Table;

/// A persistent ordered index over one or more fields of a table.
///
/// # Example
///
/// ```rust
/// use tabula_core::{Index, Operator, Value};
///
/// let index = Index::new("_INDEX_user_age", vec!["age".into()], 1024, 256, 4096).unwrap();
/// index.insert("john", &[Value::Int(40)]).unwrap();
/// index.insert("paul", &[Value::Int(25)]).unwrap();
///
/// let keys = index.get_keys(Operator::Superior, &[Value::Int(30)]).unwrap();
/// assert_eq!(keys, vec!["john".to_string()]);
/// ```
#[derive(Debug)]
pub struct Index {
    /// Name of the index, also the name of its backing table.
    name: String,
    /// Indexed fields, in tuple order.
    fields: Vec<String>,
    /// Backing table holding one row per node.
    nodes: Table,
    /// Serializes writers.
    latch: Mutex<()>,
}

impl Index {
    /// Creates an empty index and allocates its backing table.
    ///
    /// `max_nodes` bounds the number of distinct tuples, `data_size` the
    /// serialized tuple and `keys_size` the serialized key set of a node.
    pub fn new(
        name: impl Into<String>,
        fields: Vec<String>,
        max_nodes: usize,
        data_size: usize,
        keys_size: usize,
    ) -> TabulaResult<Self> {
        let name = name.into();
        if fields.is_empty() {
            return Err(TabulaError::index(format!("index '{name}' has no fields")));
        }

        let nodes = Table::new(name.clone(), max_nodes);
        nodes
            .add_column(Column::int(KEY_LEFT, 8))?
            .add_column(Column::int(KEY_RIGHT, 8))?
            .add_column(Column::string(DATA, data_size))?
            .add_column(Column::string(TABLE_KEYS, keys_size))?;
        nodes.create()?;

        Ok(Self {
            name,
            fields,
            nodes,
            latch: Mutex::new(()),
        })
    }

    /// Returns the index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the indexed fields.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the number of allocated nodes, tombstones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node was ever allocated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Adds `key` under `tuple`.
    ///
    /// Inserting a key that is already present under the same tuple is a
    /// no-op.
    pub fn insert(&self, key: &str, tuple: &[Value]) -> TabulaResult<()> {
        self.check_full_tuple(tuple)?;
        let _latch = self.latch.lock();

        if self.nodes.is_empty() {
            self.persist(&IndexNode::new(IndexNodeId::ROOT, tuple.to_vec(), key))?;
            trace!(index = %self.name, key, "root node created");
            return Ok(());
        }

        let mut node = self.load(IndexNodeId::ROOT)?;
        loop {
            let next = match node.compare(tuple) {
                Ordering::Equal => {
                    if node.add_key(key) {
                        self.persist(&node)?;
                    }
                    return Ok(());
                }
                Ordering::Greater => node.left,
                Ordering::Less => node.right,
            };

            match next.get() {
                Some(id) => node = self.load(id)?,
                None => {
                    let child = self.allocate()?;
                    self.persist(&IndexNode::new(child, tuple.to_vec(), key))?;
                    if node.compare(tuple) == Ordering::Greater {
                        node.left = child;
                    } else {
                        node.right = child;
                    }
                    self.persist(&node)?;
                    trace!(index = %self.name, key, node = %child, "node linked");
                    return Ok(());
                }
            }
        }
    }

    /// Removes `key` from the node holding `tuple`.
    ///
    /// Returns false when no node holds the tuple or the key is not in its
    /// key set. The node itself stays in place.
    pub fn remove(&self, key: &str, tuple: &[Value]) -> TabulaResult<bool> {
        self.check_full_tuple(tuple)?;
        let _latch = self.latch.lock();

        let Some(mut node) = self.find(tuple)? else {
            return Ok(false);
        };
        if !node.remove_key(key) {
            return Ok(false);
        }
        self.persist(&node)?;
        trace!(index = %self.name, key, node = %node.id, "key removed");
        Ok(true)
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Returns the keys of the rows whose tuple equals `tuple`.
    pub fn search_equal(&self, tuple: &[Value]) -> TabulaResult<Vec<String>> {
        self.check_full_tuple(tuple)?;
        Ok(self.find(tuple)?.map(|node| node.keys).unwrap_or_default())
    }

    /// Returns the keys of the rows whose tuple satisfies `tuple OP probe`.
    ///
    /// A probe shorter than the index compares against tuple prefixes, so
    /// on an index over `(a, b)` the probe `[x]` with `Superior` selects
    /// every row with `a > x`.
    pub fn get_keys(&self, operator: Operator, probe: &[Value]) -> TabulaResult<Vec<String>> {
        if probe.is_empty() || probe.len() > self.fields.len() {
            return Err(TabulaError::index(format!(
                "probe of {} values on index '{}' over {} fields",
                probe.len(),
                self.name,
                self.fields.len()
            )));
        }
        if operator == Operator::Equal && probe.len() == self.fields.len() {
            return self.search_equal(probe);
        }
        if self.nodes.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        let mut pending = vec![IndexNodeId::ROOT];

        while let Some(id) = pending.pop() {
            let node = self.load(id)?;
            let ordering = node.compare(probe);

            if operator.accepts(ordering) {
                for key in node.keys {
                    if seen.insert(key.clone()) {
                        keys.push(key);
                    }
                }
                pending.extend(node.right.get());
                pending.extend(node.left.get());
                continue;
            }

            // On a miss only one side can still hold matching tuples.
            let next = match operator {
                op if op.is_inferior() => node.left,
                op if op.is_superior() => node.right,
                _ if ordering == Ordering::Greater => node.left,
                _ => node.right,
            };
            pending.extend(next.get());
        }

        Ok(keys)
    }

    /// Plans the probes this index can answer for `filters`.
    ///
    /// Fields are walked in index order. At each position every filter on
    /// the field yields a probe made of the equality values matched so far
    /// plus the filter's own value. The walk continues past a position only
    /// when that position carries an equality filter.
    pub fn plan(&self, filters: &[IndexFilter]) -> Vec<(Operator, Vec<Value>)> {
        let mut prefix = Vec::new();
        let mut probes = Vec::new();

        for field in &self.fields {
            let on_field: Vec<&IndexFilter> = filters.iter().filter(|f| f.field == *field).collect();
            if on_field.is_empty() {
                break;
            }

            for filter in &on_field {
                let mut probe = prefix.clone();
                probe.push(filter.value.clone());
                probes.push((filter.operator, probe));
            }

            match on_field.iter().find(|f| f.operator == Operator::Equal) {
                Some(equal) => prefix.push(equal.value.clone()),
                None => break,
            }
        }

        probes
    }

    // =========================================================================
    // Node Access
    // =========================================================================

    /// Descends to the node holding exactly `tuple`.
    fn find(&self, tuple: &[Value]) -> TabulaResult<Option<IndexNode>> {
        if self.nodes.is_empty() {
            return Ok(None);
        }

        let mut node = self.load(IndexNodeId::ROOT)?;
        loop {
            let next = match node.compare(tuple) {
                Ordering::Equal => return Ok(Some(node)),
                Ordering::Greater => node.left,
                Ordering::Less => node.right,
            };
            match next.get() {
                Some(id) => node = self.load(id)?,
                None => return Ok(None),
            }
        }
    }

    fn load(&self, id: IndexNodeId) -> TabulaResult<IndexNode> {
        let row = self
            .nodes
            .get(&id.row_key())?
            .ok_or_else(|| TabulaError::index(format!("index '{}' lost node {id}", self.name)))?;
        IndexNode::from_row(id, &row)
    }

    fn persist(&self, node: &IndexNode) -> TabulaResult<()> {
        self.nodes.set(Some(&node.id.row_key()), node.to_row()?)?;
        Ok(())
    }

    fn allocate(&self) -> TabulaResult<IndexNodeId> {
        let next = u64::try_from(self.nodes.len() + 1)
            .map_err(|_| TabulaError::index("node id space exhausted"))?;
        Ok(IndexNodeId::new(next))
    }

    fn check_full_tuple(&self, tuple: &[Value]) -> TabulaResult<()> {
        if tuple.len() != self.fields.len() {
            return Err(TabulaError::index(format!(
                "tuple of {} values on index '{}' over {} fields",
                tuple.len(),
                self.name,
                self.fields.len()
            )));
        }
        Ok(())
    }
}
