// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Verifier facade: per-identity capture → compare → discard state machine.

use std::sync::Arc;

use serde_json::Value as Json;
use tracing::{debug, instrument, trace};

use crate::compare::Comparator;
use crate::config::VerifierConfig;
use crate::error::{Inconsistency, VerifyError};
use crate::normalize::normalize;
use crate::path::FieldPath;
use crate::registry::{Baseline, BaselineRegistry};
use crate::schema::RecordSchema;

/// Successful outcome of [`Verifier::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No baseline existed; this observation became the baseline.
    BaselineCaptured,
    /// Observation matches the baseline; the baseline was discarded.
    Consistent,
    /// Baseline declared nothing the caller controls; discarded without
    /// comparison.
    EmptyDeclaredState,
}

/// Post-mutation consistency verifier.
///
/// Borrows a [`BaselineRegistry`] owned by the caller. The first observation
/// of an identity becomes its baseline; each later observation is judged
/// against that same baseline until one matches, at which point the baseline
/// is discarded and the next call starts over.
///
/// The verifier performs no I/O, never sleeps and never retries. It assumes a
/// single logical retry loop per identity; concurrent calls for one identity
/// still capture exactly one baseline.
///
/// ```
/// use std::sync::Arc;
/// use drift_verify::{BaselineRegistry, FieldSchema, RecordSchema, Verdict, Verifier};
/// use serde_json::json;
///
/// let registry = BaselineRegistry::new();
/// let verifier = Verifier::new(&registry);
/// let schema = Arc::new(RecordSchema::new().with("name", FieldSchema::scalar()));
///
/// let first = verifier.verify("q-1", &schema, &json!({"name": "queue"})).unwrap();
/// assert_eq!(first, Verdict::BaselineCaptured);
///
/// let err = verifier.verify("q-1", &schema, &json!({"name": "other"})).unwrap_err();
/// assert!(err.is_retryable());
/// assert_eq!(err.mismatches()[0].path.to_string(), "name");
///
/// let ok = verifier.verify("q-1", &schema, &json!({"name": "queue"})).unwrap();
/// assert_eq!(ok, Verdict::Consistent);
/// assert!(!verifier.has_baseline("q-1"));
/// ```
#[derive(Debug)]
pub struct Verifier<'r> {
    registry: &'r BaselineRegistry,
    config: VerifierConfig,
    comparator: Comparator,
}

impl<'r> Verifier<'r> {
    /// Verifier with the default configuration.
    pub fn new(registry: &'r BaselineRegistry) -> Self {
        Self::with_config(registry, VerifierConfig::default())
    }

    /// Verifier with an explicit configuration.
    pub fn with_config(registry: &'r BaselineRegistry, config: VerifierConfig) -> Self {
        let comparator = Comparator::from_config(&config);
        Self {
            registry,
            config,
            comparator,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Judge one observation of `identity`.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::Shape`] if `observed` does not fit the schema. Fatal;
    ///   an existing baseline is left in place.
    /// - [`VerifyError::Inconsistent`] if caller-controlled fields drifted.
    ///   Retryable; the baseline is kept for the next call.
    #[instrument(level = "debug", skip(self, schema, observed))]
    pub fn verify(
        &self,
        identity: &str,
        schema: &Arc<RecordSchema>,
        observed: &Json,
    ) -> Result<Verdict, VerifyError> {
        let (baseline, captured) = self.registry.get_or_create(identity, || {
            Baseline::capture(identity, Arc::clone(schema), observed, &self.config)
        })?;
        if captured {
            debug!(empty_declared = baseline.is_empty_declared(), "baseline captured");
            return Ok(Verdict::BaselineCaptured);
        }

        if baseline.is_empty_declared() {
            self.registry.discard(identity);
            debug!("baseline declares nothing; skipping comparison");
            return Ok(Verdict::EmptyDeclaredState);
        }

        if !Arc::ptr_eq(baseline.schema(), schema) {
            trace!("normalizing against the baseline's schema, not the caller's");
        }
        let current = normalize(baseline.schema(), observed)?;
        let mismatches = self
            .comparator
            .compare(baseline.value(), &current, &FieldPath::root());

        match mismatches.first() {
            None => {
                self.registry.discard(identity);
                debug!("observation consistent with baseline");
                Ok(Verdict::Consistent)
            }
            Some(first) => {
                debug!(
                    mismatches = mismatches.len(),
                    first = %first.path,
                    "observation drifted from baseline"
                );
                Err(VerifyError::Inconsistent(Inconsistency::new(
                    identity, mismatches,
                )))
            }
        }
    }

    /// Drop the baseline for `identity` (the caller gave up). Returns `true`
    /// if one was held.
    pub fn abandon(&self, identity: &str) -> bool {
        let removed = self.registry.discard(identity);
        if removed {
            debug!(identity, "baseline abandoned");
        }
        removed
    }

    /// Returns `true` if a baseline is held for `identity`.
    pub fn has_baseline(&self, identity: &str) -> bool {
        self.registry.contains(identity)
    }
}
