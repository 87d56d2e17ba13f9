// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tagged value model shared by baselines and observations.
//!
//! Raw API payloads are converted into [`Value`] at the normalizer boundary so
//! everything downstream matches on a closed type. The variant of a node is
//! chosen by the schema, never inferred from the data: a [`Value::Sequence`]
//! and a [`Value::Collection`] may hold identical elements and still compare
//! differently.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Number;

/// Primitive leaf value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scalar {
    /// Absent or explicit null.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Number, kept in its decoded JSON representation.
    Number(Number),
    /// UTF-8 string.
    String(String),
}

impl Scalar {
    /// Returns `true` for null and the empty string.
    pub fn is_vacant(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
        }
    }
}

/// One normalized attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Primitive leaf.
    Scalar(Scalar),
    /// Ordered list; position is significant.
    Sequence(Vec<Value>),
    /// Unordered list; equality ignores element order.
    Collection(Vec<Value>),
    /// Nested block keyed by field name.
    Record(Record),
}

impl Value {
    /// The null scalar.
    pub const fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    /// Numeric scalar holding an element count.
    pub fn count(n: usize) -> Self {
        Self::Scalar(Scalar::Number(Number::from(n)))
    }

    /// Returns the nested record, if this is one.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Sequence(_) => "sequence",
            Self::Collection(_) => "collection",
            Self::Record(_) => "record",
        }
    }

    /// Returns `true` when the value carries nothing the caller declared.
    ///
    /// Null and empty-string scalars, empty sequences and collections, and
    /// records whose every field is vacant or computed.
    pub fn is_vacant(&self) -> bool {
        match self {
            Self::Scalar(s) => s.is_vacant(),
            Self::Sequence(items) | Self::Collection(items) => items.is_empty(),
            Self::Record(r) => r.is_vacant(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::String(s.to_owned()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Scalar(Scalar::String(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Scalar(Scalar::Number(Number::from(n)))
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Self::Record(r)
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Sequence(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Self::Collection(items) => {
                f.write_str("set[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Self::Record(r) => write!(f, "{r}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(s) => s.serialize(serializer),
            Self::Sequence(items) | Self::Collection(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Record(r) => r.serialize(serializer),
        }
    }
}

/// A field inside a [`Record`], annotated with the schema's computed flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// The normalized value.
    pub value: Value,
    /// Server may assign or override this field; caller intent is non-binding.
    pub computed: bool,
}

/// Nested block of named fields.
///
/// Keys are kept sorted so iteration (and therefore mismatch reporting) is
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: BTreeMap<String, Field>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, value: Value, computed: bool) {
        self.fields.insert(name.into(), Field { value, computed });
    }

    /// Builder form of [`insert`](Record::insert) for a caller-controlled field.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value.into(), false);
        self
    }

    /// Builder form of [`insert`](Record::insert) for a computed field.
    pub fn with_computed(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value.into(), true);
        self
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if every field is computed or vacant.
    pub fn is_vacant(&self) -> bool {
        self.fields.values().all(|f| f.computed || f.value.is_vacant())
    }

    /// Returns `true` if no top-level field carries caller-declared content.
    ///
    /// Fields whose name ends with `identity_suffix` (remote ids and
    /// references) are ignored along with computed and vacant fields.
    pub fn is_empty_declared(&self, identity_suffix: &str) -> bool {
        self.fields.iter().all(|(name, f)| {
            f.computed
                || f.value.is_vacant()
                || (!identity_suffix.is_empty() && name.ends_with(identity_suffix))
        })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, field)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {}", field.value)?;
        }
        f.write_str("}")
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, field) in &self.fields {
            map.serialize_entry(name, &field.value)?;
        }
        map.end()
    }
}
