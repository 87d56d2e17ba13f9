// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Baseline registry: at most one frozen baseline per entity identity.
//!
//! The registry is an explicit object owned by the caller and lent to each
//! [`Verifier`](crate::Verifier); there is no process-wide instance. Several
//! independent registries can coexist (one per test, one per provider).

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use serde_json::Value as Json;

use crate::config::VerifierConfig;
use crate::error::ShapeError;
use crate::normalize::normalize;
use crate::schema::RecordSchema;
use crate::value::Value;

/// Frozen snapshot of intended state for one identity.
///
/// Immutable once captured; every later observation is compared against this
/// same value, never against the previous observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    identity: String,
    value: Value,
    schema: Arc<RecordSchema>,
    empty_declared: bool,
}

impl Baseline {
    /// Normalize `raw` against `schema` and freeze it as the baseline for
    /// `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] if `raw` does not fit `schema`.
    pub fn capture(
        identity: impl Into<String>,
        schema: Arc<RecordSchema>,
        raw: &Json,
        config: &VerifierConfig,
    ) -> Result<Self, ShapeError> {
        let value = normalize(&schema, raw)?;
        let empty_declared = value
            .as_record()
            .is_some_and(|r| r.is_empty_declared(&config.identity_suffix));
        Ok(Self {
            identity: identity.into(),
            value,
            schema,
            empty_declared,
        })
    }

    /// Entity identity.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Normalized intended state (always a record).
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Schema the baseline was normalized with.
    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// `true` if the captured state had no caller-observable attributes.
    pub fn is_empty_declared(&self) -> bool {
        self.empty_declared
    }
}

/// Per-identity registry entry.
#[derive(Debug)]
enum Slot {
    /// A factory is running outside the map lock.
    Capturing,
    Ready(Arc<Baseline>),
}

/// Concurrent identity → [`Baseline`] store.
///
/// The map mutex is held only to read or flip an entry; capture factories run
/// outside it. A caller that finds a capture in flight for its identity waits
/// on a condition variable, so check-then-insert stays exactly-once without
/// stalling other identities.
#[derive(Debug, Default)]
pub struct BaselineRegistry {
    slots: Mutex<HashMap<String, Slot>>,
    settled: Condvar,
}

impl BaselineRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the baseline for `identity`, capturing it with `factory` if none
    /// exists.
    ///
    /// The boolean is `true` when this call ran the factory. Concurrent callers
    /// for the same identity wait for the running factory, so it runs at most
    /// once until the baseline is discarded. Callers for other identities are
    /// not held up. A factory error (or panic) leaves the registry unchanged and
    /// lets the next waiter try its own factory.
    pub fn get_or_create<E, F>(
        &self,
        identity: &str,
        factory: F,
    ) -> Result<(Arc<Baseline>, bool), E>
    where
        F: FnOnce() -> Result<Baseline, E>,
    {
        let mut slots = self.lock();
        loop {
            let in_flight = match slots.get(identity) {
                Some(Slot::Ready(existing)) => return Ok((Arc::clone(existing), false)),
                Some(Slot::Capturing) => true,
                None => false,
            };
            if !in_flight {
                break;
            }
            slots = self
                .settled
                .wait(slots)
                .unwrap_or_else(PoisonError::into_inner);
        }
        slots.insert(identity.to_owned(), Slot::Capturing);
        drop(slots);

        let mut pending = Capture {
            registry: self,
            identity,
            baseline: None,
        };
        let baseline = Arc::new(factory()?);
        pending.baseline = Some(Arc::clone(&baseline));
        Ok((baseline, true))
    }

    /// Baseline for `identity`, if captured.
    pub fn get(&self, identity: &str) -> Option<Arc<Baseline>> {
        match self.lock().get(identity) {
            Some(Slot::Ready(baseline)) => Some(Arc::clone(baseline)),
            _ => None,
        }
    }

    /// Remove the baseline for `identity`. Returns `true` if one was present;
    /// discarding an unknown identity, or one still being captured, is a no-op.
    pub fn discard(&self, identity: &str) -> bool {
        let mut slots = self.lock();
        if matches!(slots.get(identity), Some(Slot::Ready(_))) {
            slots.remove(identity);
            true
        } else {
            false
        }
    }

    /// Returns `true` if a baseline is held for `identity`.
    pub fn contains(&self, identity: &str) -> bool {
        matches!(self.lock().get(identity), Some(Slot::Ready(_)))
    }

    /// Number of held baselines.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    /// Returns `true` if no baselines are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Settles a `Capturing` slot when the factory returns, fails or unwinds.
struct Capture<'a> {
    registry: &'a BaselineRegistry,
    identity: &'a str,
    baseline: Option<Arc<Baseline>>,
}

impl Drop for Capture<'_> {
    fn drop(&mut self) {
        let mut slots = self.registry.lock();
        match self.baseline.take() {
            Some(baseline) => {
                slots.insert(self.identity.to_owned(), Slot::Ready(baseline));
            }
            None => {
                slots.remove(self.identity);
            }
        }
        drop(slots);
        self.registry.settled.notify_all();
    }
}
