// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Snapshot normalizer: raw decoded state into the [`Value`] model.
//!
//! Every field the schema declares is present in the output, absent raw
//! fields normalize to their empty form (null scalar, empty list, record of
//! empty fields). Raw fields the schema does not declare are dropped. Computed
//! fields are kept and flagged so the comparator can skip them.

use serde_json::Value as Json;
use tracing::trace;

use crate::error::ShapeError;
use crate::path::FieldPath;
use crate::schema::{FieldKind, RecordSchema};
use crate::value::{Record, Scalar, Value};

/// Normalize a raw entity state against its schema.
///
/// The result is always a [`Value::Record`]. A raw `null` root is treated as
/// an empty object.
///
/// # Errors
///
/// Returns [`ShapeError`] when a raw value's JSON type cannot represent the
/// classification the schema declares at that path.
pub fn normalize(schema: &RecordSchema, raw: &Json) -> Result<Value, ShapeError> {
    normalize_record(schema, raw, &FieldPath::root()).map(Value::Record)
}

fn normalize_record(
    schema: &RecordSchema,
    raw: &Json,
    path: &FieldPath,
) -> Result<Record, ShapeError> {
    let empty = serde_json::Map::new();
    let object = match raw {
        Json::Object(map) => map,
        Json::Null => &empty,
        other => return Err(shape_error(path, "record", other)),
    };

    let mut record = Record::new();
    for (name, field) in schema.iter() {
        let raw_field = object.get(name).unwrap_or(&Json::Null);
        let value = normalize_kind(&field.kind, raw_field, &path.child(name))?;
        record.insert(name, value, field.computed);
    }

    for name in object.keys().filter(|k| schema.get(k).is_none()) {
        trace!(%path, field = %name, "dropping field not declared in schema");
    }
    Ok(record)
}

fn normalize_kind(kind: &FieldKind, raw: &Json, path: &FieldPath) -> Result<Value, ShapeError> {
    match kind {
        FieldKind::Scalar => normalize_scalar(raw, path).map(Value::Scalar),
        FieldKind::Sequence { elem } => normalize_elements(elem, raw, path, "sequence")
            .map(Value::Sequence),
        FieldKind::Collection { elem } => normalize_elements(elem, raw, path, "collection")
            .map(Value::Collection),
        FieldKind::Record { fields } => normalize_record(fields, raw, path).map(Value::Record),
    }
}

fn normalize_scalar(raw: &Json, path: &FieldPath) -> Result<Scalar, ShapeError> {
    match raw {
        Json::Null => Ok(Scalar::Null),
        Json::Bool(b) => Ok(Scalar::Bool(*b)),
        Json::Number(n) => Ok(Scalar::Number(n.clone())),
        Json::String(s) => Ok(Scalar::String(s.clone())),
        other => Err(shape_error(path, "scalar", other)),
    }
}

fn normalize_elements(
    elem: &FieldKind,
    raw: &Json,
    path: &FieldPath,
    expected: &'static str,
) -> Result<Vec<Value>, ShapeError> {
    match raw {
        Json::Null => Ok(Vec::new()),
        Json::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| normalize_kind(elem, item, &path.index(i)))
            .collect(),
        other => Err(shape_error(path, expected, other)),
    }
}

fn shape_error(path: &FieldPath, expected: &'static str, found: &Json) -> ShapeError {
    ShapeError {
        path: path.clone(),
        expected,
        found: json_type(found),
    }
}

fn json_type(raw: &Json) -> &'static str {
    match raw {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
