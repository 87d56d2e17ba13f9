// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dotted field paths (`siblings.1.names`, `siblings.#`).

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Named field of a record.
    Field(String),
    /// Position inside a sequence or collection.
    Index(usize),
    /// Element-count marker of a sequence or collection, rendered `#`.
    Count,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(i) => write!(f, "{i}"),
            Self::Count => f.write_str("#"),
        }
    }
}

/// Route from the entity root to a (possibly nested, possibly repeated) field.
///
/// Paths are built by value while descending; each child call clones the
/// parent's segments. Entity schemas are shallow, so this stays cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The entity root (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns `true` for the entity root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments from the root outward.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Final segment, if any.
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Path to the named child field.
    pub fn child(&self, name: &str) -> Self {
        self.push(Segment::Field(name.to_owned()))
    }

    /// Path to the element at `index`.
    pub fn index(&self, index: usize) -> Self {
        self.push(Segment::Index(index))
    }

    /// Path to this container's element count.
    pub fn count(&self) -> Self {
        self.push(Segment::Count)
    }

    fn push(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A dotted path string contained an empty segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[PATH_EMPTY_SEGMENT] empty segment at position {position} in {input:?}")]
pub struct PathParseError {
    /// The rejected input.
    pub input: String,
    /// Zero-based segment position.
    pub position: usize,
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let segments = s
            .split('.')
            .enumerate()
            .map(|(position, raw)| match raw {
                "" => Err(PathParseError {
                    input: s.to_owned(),
                    position,
                }),
                "#" => Ok(Segment::Count),
                _ => Ok(raw
                    .parse::<usize>()
                    .map_or_else(|_| Segment::Field(raw.to_owned()), Segment::Index)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }
}
