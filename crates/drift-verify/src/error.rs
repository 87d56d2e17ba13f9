// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy.
//!
//! Shape errors are fatal: they mean the caller's schema and the collaborator's
//! payload disagree, which no amount of retrying will fix. Drift is reported as
//! data inside [`VerifyError::Inconsistent`] and is retryable by definition.

use std::fmt;

use thiserror::Error;

use crate::compare::Mismatch;
use crate::path::FieldPath;

/// Raw state's shape disagrees with the schema's classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[SHAPE_MISMATCH] {path}: schema declares {expected}, raw state holds {found}")]
pub struct ShapeError {
    /// Where the disagreement was found.
    pub path: FieldPath,
    /// Classification the schema declares.
    pub expected: &'static str,
    /// JSON type actually present.
    pub found: &'static str,
}

/// One or more caller-controlled fields drifted from the baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inconsistency {
    identity: String,
    mismatches: Vec<Mismatch>,
}

impl Inconsistency {
    /// Bundle the mismatches found for `identity`.
    pub fn new(identity: impl Into<String>, mismatches: Vec<Mismatch>) -> Self {
        Self {
            identity: identity.into(),
            mismatches,
        }
    }

    /// Identity of the drifted entity.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Mismatches in report order.
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    /// Take ownership of the mismatches.
    pub fn into_mismatches(self) -> Vec<Mismatch> {
        self.mismatches
    }
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[DRIFT] {}: {} attribute(s) drifted from baseline",
            self.identity,
            self.mismatches.len()
        )?;
        for mismatch in &self.mismatches {
            write!(f, "\n{mismatch}")?;
        }
        Ok(())
    }
}

/// Failure of a single `verify` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Schema/shape mismatch. Fatal.
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// Observed state drifted from the baseline. Retryable; the baseline is kept.
    #[error("{0}")]
    Inconsistent(Inconsistency),
}

impl VerifyError {
    /// Whether the caller's retry loop may try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Inconsistent(_))
    }

    /// Mismatches carried by an inconsistency; empty for shape errors.
    pub fn mismatches(&self) -> &[Mismatch] {
        match self {
            Self::Inconsistent(i) => i.mismatches(),
            Self::Shape(_) => &[],
        }
    }
}

/// Verifier configuration could not be decoded or encoded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Serialization/deserialization failure.
    #[error("[CONFIG_SERDE] {0}")]
    Serde(#[from] serde_json::Error),
}
