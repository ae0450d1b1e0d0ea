//! Join expansion of one driving row.
//!
//! ```text
//!            user:paul
//!           /         \
//!     posts:p1       posts:p2        one leaf per path
//!         |              |
//!   comments:∅     comments:c9       ∅ = left join without partner
//! ```

use tabula_common::TabulaResult;
use tabula_core::{Record, RecordCollection};

use crate::join::{Join, JoinType};

/// A tree of aliased records rooted at one driving row.
#[derive(Debug, Clone)]
pub struct ResultTree {
    alias: String,
    record: Option<Record>,
    children: Vec<ResultTree>,
}

impl ResultTree {
    /// Creates a leaf.
    pub fn new(alias: impl Into<String>, record: Option<Record>) -> Self {
        Self {
            alias: alias.into(),
            record,
            children: Vec::new(),
        }
    }

    /// Returns the alias of this node.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns the record of this node, absent for a left join miss.
    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    /// Returns the children.
    pub fn children(&self) -> &[ResultTree] {
        &self.children
    }

    /// Returns true if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Applies a join to every node bound to the join's source alias.
    ///
    /// The linked records are fetched once per source node and attached
    /// under each leaf of its subtree. An inner join without match attaches
    /// nothing; a left join without match attaches an absent record.
    pub fn expand(&mut self, join: &Join) -> TabulaResult<()> {
        if self.alias == join.from_alias() {
            let linked = match &self.record {
                Some(record) => join.get(record)?,
                None => Vec::new(),
            };
            self.attach(join, &linked);
            return Ok(());
        }
        for child in &mut self.children {
            child.expand(join)?;
        }
        Ok(())
    }

    fn attach(&mut self, join: &Join, linked: &[Record]) {
        if !self.is_leaf() {
            for child in &mut self.children {
                child.attach(join, linked);
            }
            return;
        }
        if linked.is_empty() {
            if join.join_type() == JoinType::Left {
                self.children.push(ResultTree::new(join.alias(), None));
            }
            return;
        }
        self.children.extend(
            linked
                .iter()
                .map(|record| ResultTree::new(join.alias(), Some(record.clone()))),
        );
    }

    /// Returns one row combination per root-to-leaf path.
    pub fn flatten(&self) -> Vec<RecordCollection> {
        let mut combinations = Vec::new();
        self.collect(&RecordCollection::new(), &mut combinations);
        combinations
    }

    fn collect(&self, path: &RecordCollection, out: &mut Vec<RecordCollection>) {
        let mut current = path.clone();
        current.insert(self.alias.clone(), self.record.clone());
        if self.is_leaf() {
            out.push(current);
            return;
        }
        for child in &self.children {
            child.collect(&current, out);
        }
    }
}
