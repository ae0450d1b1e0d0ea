//! Row representation.
//!
//! A `Row` is an ordered list of named values. Rows read from a table list
//! every column in schema order; rows handed to `Table::set` may list any
//! subset of the columns.

use std::fmt;

use tabula_common::Value;

/// An ordered set of named values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    /// The fields of this row, in insertion order.
    fields: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds a field and returns the row, for chaining.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the number of fields in this row.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if this row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the value of a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Returns true if the row has a field with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets a field, replacing its value or appending it.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let position = self.fields.iter().position(|(field, _)| field == name)?;
        Some(self.fields.remove(position).1)
    }

    /// Returns an iterator over the fields.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the field names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Projects the row onto `fields`, missing fields as null.
    pub fn project(&self, fields: &[String]) -> Vec<Value> {
        fields
            .iter()
            .map(|field| self.get(field).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Row {
    fn from(fields: [(K, V); N]) -> Self {
        fields.into_iter().collect()
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces() {
        let mut row = Row::new().with("name", "john").with("price", 12.5);
        row.insert("name", "paul");
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("name"), Some(&Value::from("paul")));
        assert_eq!(row.names().collect::<Vec<_>>(), vec!["name", "price"]);
    }

    #[test]
    fn test_project_fills_nulls() {
        let row = Row::from([("a", Value::Int(1)), ("b", Value::Int(2))]);
        let tuple = row.project(&["b".to_string(), "c".to_string()]);
        assert_eq!(tuple, vec![Value::Int(2), Value::Null]);
    }

    #[test]
    fn test_display() {
        let row = Row::new().with("name", "john").with("age", 40);
        assert_eq!(row.to_string(), "(name: john, age: 40)");
    }
}
