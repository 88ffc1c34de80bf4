//! Persisted field representation produced by serializers.
//!
//! [`Fields`] is what a persistence layer stores for one value. It is a flat
//! name → [`FieldValue`] map; composite values nest another [`Fields`].

use std::collections::BTreeMap;

use crate::FieldsError;

/// One stored field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Nested(Fields),
}

impl FieldValue {
    fn kind(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
            FieldValue::Nested(_) => "nested",
        }
    }
}

/// Named fields of one serialized value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: BTreeMap<String, FieldValue>,
}

impl Fields {
    /// Create an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.put(name, value);
        self
    }

    /// Insert or replace a field.
    pub fn put(&mut self, name: impl Into<String>, value: FieldValue) {
        self.entries.insert(name.into(), value);
    }

    /// Check whether a field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Raw field access.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, name: &str) -> Result<&FieldValue, FieldsError> {
        self.entries
            .get(name)
            .ok_or_else(|| FieldsError::Missing(name.to_string()))
    }

    fn mismatch(name: &str, expected: &'static str, found: &FieldValue) -> FieldsError {
        FieldsError::Mismatch {
            field: name.to_string(),
            expected,
            found: found.kind(),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, FieldsError> {
        match self.require(name)? {
            FieldValue::Bool(v) => Ok(*v),
            other => Err(Self::mismatch(name, "bool", other)),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i64, FieldsError> {
        match self.require(name)? {
            FieldValue::Int(v) => Ok(*v),
            other => Err(Self::mismatch(name, "int", other)),
        }
    }

    /// Get a float field. Integer fields widen losslessly enough for storage.
    pub fn get_float(&self, name: &str) -> Result<f64, FieldsError> {
        match self.require(name)? {
            FieldValue::Float(v) => Ok(*v),
            FieldValue::Int(v) => Ok(*v as f64),
            other => Err(Self::mismatch(name, "float", other)),
        }
    }

    pub fn get_text(&self, name: &str) -> Result<&str, FieldsError> {
        match self.require(name)? {
            FieldValue::Text(v) => Ok(v),
            other => Err(Self::mismatch(name, "text", other)),
        }
    }

    pub fn get_nested(&self, name: &str) -> Result<&Fields, FieldsError> {
        match self.require(name)? {
            FieldValue::Nested(v) => Ok(v),
            other => Err(Self::mismatch(name, "nested", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters() {
        let fields = Fields::new()
            .with("x", FieldValue::Float(1.5))
            .with("world", FieldValue::Text("overworld".into()))
            .with("count", FieldValue::Int(3));

        assert_eq!(fields.get_float("x").unwrap(), 1.5);
        assert_eq!(fields.get_float("count").unwrap(), 3.0);
        assert_eq!(fields.get_text("world").unwrap(), "overworld");
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn missing_and_mismatched_fields() {
        let fields = Fields::new().with("flag", FieldValue::Bool(true));

        assert_eq!(fields.get_int("nope"), Err(FieldsError::Missing("nope".into())));
        assert_eq!(
            fields.get_int("flag"),
            Err(FieldsError::Mismatch {
                field: "flag".into(),
                expected: "int",
                found: "bool",
            })
        );
    }

    #[test]
    fn nested_fields() {
        let inner = Fields::new().with("v", FieldValue::Int(7));
        let outer = Fields::new().with("inner", FieldValue::Nested(inner.clone()));
        assert_eq!(outer.get_nested("inner").unwrap(), &inner);
    }

    #[test]
    fn iteration_is_sorted() {
        let fields = Fields::new()
            .with("b", FieldValue::Int(2))
            .with("a", FieldValue::Int(1));
        let names: Vec<_> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
