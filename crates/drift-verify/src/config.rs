// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Verifier configuration.
//!
//! Fixed per [`Verifier`](crate::Verifier) at construction; individual
//! `verify` calls cannot change the drift policy.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How many mismatches a comparison collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Stop at the first mismatch.
    #[default]
    First,
    /// Collect every mismatch.
    All,
}

/// Drift-tolerance and reporting knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    /// Mismatch reporting mode.
    pub report: ReportMode,
    /// Top-level attributes ending with this suffix are ignored when deciding
    /// whether a baseline is empty declared state. Empty disables the rule.
    pub identity_suffix: String,
    /// Treat a single vacant block in the baseline as equal to no blocks in
    /// the observation.
    pub tolerate_empty_placeholder: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            report: ReportMode::First,
            identity_suffix: "id".to_owned(),
            tolerate_empty_placeholder: true,
        }
    }
}

impl VerifierConfig {
    /// Decode a JSON config blob. An empty blob yields the defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, ConfigError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Builder: set the report mode.
    pub fn with_report(mut self, report: ReportMode) -> Self {
        self.report = report;
        self
    }
}
