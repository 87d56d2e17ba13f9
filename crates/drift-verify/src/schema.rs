// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Entity schema supplied by the caller.
//!
//! The schema tells the normalizer how to classify every raw field and which
//! fields are computed. It is passed explicitly to every verification; nothing
//! is read out of a host framework's internals.
//!
//! Schemas can be assembled with the builder methods or decoded from JSON:
//!
//! ```
//! use drift_verify::{FieldSchema, RecordSchema};
//!
//! let json = r#"{
//!     "name":     { "type": "scalar" },
//!     "owner_id": { "type": "scalar", "computed": true },
//!     "tags":     { "type": "collection", "elem": { "type": "scalar" } }
//! }"#;
//! let schema: RecordSchema = serde_json::from_str(json).unwrap();
//! assert!(schema.get("owner_id").unwrap().computed);
//! assert_eq!(schema, RecordSchema::new()
//!     .with("name", FieldSchema::scalar())
//!     .with("owner_id", FieldSchema::scalar().computed())
//!     .with("tags", FieldSchema::collection(drift_verify::FieldKind::Scalar)));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::path::{FieldPath, Segment};

/// Classification of a field: which [`Value`](crate::Value) variant it
/// normalizes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Primitive leaf.
    Scalar,
    /// Ordered repeated field.
    Sequence {
        /// Element classification.
        elem: Box<FieldKind>,
    },
    /// Unordered repeated field (set semantics).
    Collection {
        /// Element classification.
        elem: Box<FieldKind>,
    },
    /// Nested block.
    Record {
        /// Field schemas of the block.
        fields: RecordSchema,
    },
}

impl FieldKind {
    /// Short name used in shape diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Sequence { .. } => "sequence",
            Self::Collection { .. } => "collection",
            Self::Record { .. } => "record",
        }
    }

    /// Nested block kind.
    pub fn record(fields: RecordSchema) -> Self {
        Self::Record { fields }
    }

    fn element(&self) -> Option<&Self> {
        match self {
            Self::Sequence { elem } | Self::Collection { elem } => Some(elem),
            Self::Scalar | Self::Record { .. } => None,
        }
    }
}

/// Schema of a single named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Classification of the field's value.
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Server may assign or override this field.
    #[serde(default)]
    pub computed: bool,
}

impl FieldSchema {
    /// Caller-controlled field of the given kind.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            computed: false,
        }
    }

    /// Scalar field.
    pub fn scalar() -> Self {
        Self::new(FieldKind::Scalar)
    }

    /// Ordered repeated field.
    pub fn sequence(elem: FieldKind) -> Self {
        Self::new(FieldKind::Sequence {
            elem: Box::new(elem),
        })
    }

    /// Unordered repeated field.
    pub fn collection(elem: FieldKind) -> Self {
        Self::new(FieldKind::Collection {
            elem: Box::new(elem),
        })
    }

    /// Nested block.
    pub fn record(schema: RecordSchema) -> Self {
        Self::new(FieldKind::record(schema))
    }

    /// Mark the field computed.
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }
}

/// Field schemas of one record level, keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSchema {
    fields: BTreeMap<String, FieldSchema>,
}

impl RecordSchema {
    /// Empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add or replace a field.
    pub fn with(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.insert(name, field);
        self
    }

    /// Add or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, field: FieldSchema) {
        self.fields.insert(name.into(), field);
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields at this level.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Schema of the nearest named field along `path`.
    ///
    /// Index segments step into a repeated field's elements; a field segment
    /// directly after a repeated field of records is also accepted
    /// (`siblings.names`). Count segments refer to their container and are
    /// skipped. Returns `None` for the root and for paths the schema does not
    /// declare.
    pub fn resolve(&self, path: &FieldPath) -> Option<&FieldSchema> {
        let mut current: Option<&FieldSchema> = None;
        let mut element: Option<&FieldKind> = None;
        for segment in path.segments() {
            match segment {
                Segment::Field(name) => {
                    let record = match element.or_else(|| current.map(|f| &f.kind)) {
                        None => self,
                        Some(FieldKind::Record { fields }) => fields,
                        Some(kind) => match kind.element() {
                            Some(FieldKind::Record { fields }) => fields,
                            _ => return None,
                        },
                    };
                    current = Some(record.get(name)?);
                    element = None;
                }
                Segment::Index(_) => {
                    let kind = element.or_else(|| current.map(|f| &f.kind))?;
                    element = Some(kind.element()?);
                }
                Segment::Count => {}
            }
        }
        current
    }
}
