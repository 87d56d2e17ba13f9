// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Structural comparator.
//!
//! Walks a baseline and an observation in lockstep and reports where a
//! caller-controlled field disagrees. Tolerated divergences:
//!
//! - computed fields never mismatch, whatever either side holds;
//! - a non-empty baseline string observed as `""` is equal (one direction only);
//! - an absent value and `""` are equal in both directions;
//! - numbers compare by value, so `30` equals `30.0`;
//! - collections compare without regard to element order;
//! - a single vacant block in the baseline equals an empty observation
//!   (when [`VerifierConfig::tolerate_empty_placeholder`] is set).
//!
//! Sequences are positional. Length differences are reported at the
//! container's count path (`<path>.#`).
//!
//! # Collection matching
//!
//! Each baseline element claims the first unclaimed observed element it is
//! consistent with, scanning left to right. This is greedy, not a maximum
//! bipartite matching: when a baseline element is consistent with several
//! observed elements (possible only through the empty-string tolerance), an
//! early claim can starve a later baseline element and report a mismatch a
//! full matching would avoid.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use serde_json::Number;

use crate::config::{ReportMode, VerifierConfig};
use crate::path::FieldPath;
use crate::value::{Record, Scalar, Value};

static NULL: Value = Value::null();

/// A field whose observed value disagrees with the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Where the disagreement is.
    pub path: FieldPath,
    /// Baseline (intended) value.
    pub expected: Value,
    /// Observed value.
    pub actual: Value,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mismatch on attribute {}:\nexpected value: {}\nactual value:   {}",
            self.path, self.expected, self.actual
        )
    }
}

/// Drift-tolerant structural diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparator {
    mode: ReportMode,
    tolerate_empty_placeholder: bool,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::from_config(&VerifierConfig::default())
    }
}

impl Comparator {
    /// Comparator with the given report mode and default tolerances.
    pub fn new(mode: ReportMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Comparator configured from a [`VerifierConfig`].
    pub fn from_config(config: &VerifierConfig) -> Self {
        Self {
            mode: config.report,
            tolerate_empty_placeholder: config.tolerate_empty_placeholder,
        }
    }

    /// Report mode in effect.
    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    /// Compare `baseline` against `observed` rooted at `path`.
    ///
    /// An empty result means consistent. In [`ReportMode::First`] at most one
    /// mismatch is returned.
    pub fn compare(&self, baseline: &Value, observed: &Value, path: &FieldPath) -> Vec<Mismatch> {
        let mut out = Vec::new();
        self.diff(baseline, observed, path, &mut out);
        out
    }

    /// Returns `true` if the two values are consistent.
    pub fn is_consistent(&self, baseline: &Value, observed: &Value) -> bool {
        let first = Self {
            mode: ReportMode::First,
            ..*self
        };
        first.compare(baseline, observed, &FieldPath::root()).is_empty()
    }

    fn saturated(&self, out: &[Mismatch]) -> bool {
        self.mode == ReportMode::First && !out.is_empty()
    }

    fn diff(&self, baseline: &Value, observed: &Value, path: &FieldPath, out: &mut Vec<Mismatch>) {
        match (baseline, observed) {
            (Value::Scalar(b), Value::Scalar(o)) => {
                if !scalars_consistent(b, o) {
                    out.push(mismatch(path.clone(), baseline, observed));
                }
            }
            (Value::Record(b), Value::Record(o)) => self.diff_records(b, o, path, out),
            (Value::Sequence(b), Value::Sequence(o)) => self.diff_sequences(b, o, path, out),
            (Value::Collection(b), Value::Collection(o)) => {
                self.diff_collections(b, o, path, out);
            }
            _ => out.push(mismatch(path.clone(), baseline, observed)),
        }
    }

    fn diff_records(
        &self,
        baseline: &Record,
        observed: &Record,
        path: &FieldPath,
        out: &mut Vec<Mismatch>,
    ) {
        let names: BTreeSet<&str> = baseline.names().chain(observed.names()).collect();
        for name in names {
            if self.saturated(out) {
                return;
            }
            let b = baseline.get(name);
            let o = observed.get(name);
            if b.is_some_and(|f| f.computed) || o.is_some_and(|f| f.computed) {
                continue;
            }
            let b = b.map_or(&NULL, |f| &f.value);
            let o = o.map_or(&NULL, |f| &f.value);
            self.diff(b, o, &path.child(name), out);
        }
    }

    fn diff_sequences(
        &self,
        baseline: &[Value],
        observed: &[Value],
        path: &FieldPath,
        out: &mut Vec<Mismatch>,
    ) {
        if self.is_placeholder(baseline, observed) {
            return;
        }
        if baseline.len() != observed.len() {
            out.push(count_mismatch(path, baseline, observed));
        }
        for (i, (b, o)) in baseline.iter().zip(observed).enumerate() {
            if self.saturated(out) {
                return;
            }
            self.diff(b, o, &path.index(i), out);
        }
    }

    fn diff_collections(
        &self,
        baseline: &[Value],
        observed: &[Value],
        path: &FieldPath,
        out: &mut Vec<Mismatch>,
    ) {
        if self.is_placeholder(baseline, observed) {
            return;
        }
        if baseline.len() != observed.len() {
            out.push(count_mismatch(path, baseline, observed));
        }
        let mut claimed = vec![false; observed.len()];
        for b in baseline {
            if self.saturated(out) {
                return;
            }
            let hit = observed
                .iter()
                .enumerate()
                .find(|(j, o)| !claimed[*j] && self.is_consistent(b, o))
                .map(|(j, _)| j);
            match hit {
                Some(j) => claimed[j] = true,
                None => out.push(Mismatch {
                    path: path.clone(),
                    expected: b.clone(),
                    actual: Value::Collection(observed.to_vec()),
                }),
            }
        }
    }

    fn is_placeholder(&self, baseline: &[Value], observed: &[Value]) -> bool {
        self.tolerate_empty_placeholder
            && observed.is_empty()
            && matches!(baseline, [Value::Record(r)] if r.is_vacant())
    }
}

/// Compare with the default [`Comparator`].
pub fn compare(baseline: &Value, observed: &Value, path: &FieldPath) -> Vec<Mismatch> {
    Comparator::default().compare(baseline, observed, path)
}

fn scalars_consistent(baseline: &Scalar, observed: &Scalar) -> bool {
    match (baseline, observed) {
        (Scalar::Number(b), Scalar::Number(o)) => numbers_equal(b, o),
        // Absent and empty are the same unset value.
        (Scalar::Null, Scalar::String(s)) | (Scalar::String(s), Scalar::Null) => s.is_empty(),
        // Intended value echoed back empty before the write propagated.
        (Scalar::String(b), Scalar::String(o)) => b == o || o.is_empty(),
        _ => baseline == observed,
    }
}

/// `30` and `30.0` are the same number; integers compare exactly.
#[allow(clippy::float_cmp)]
fn numbers_equal(baseline: &Number, observed: &Number) -> bool {
    if baseline.is_f64() || observed.is_f64() {
        matches!((baseline.as_f64(), observed.as_f64()), (Some(b), Some(o)) if b == o)
    } else {
        baseline == observed
    }
}

fn mismatch(path: FieldPath, baseline: &Value, observed: &Value) -> Mismatch {
    Mismatch {
        path,
        expected: baseline.clone(),
        actual: observed.clone(),
    }
}

fn count_mismatch(path: &FieldPath, baseline: &[Value], observed: &[Value]) -> Mismatch {
    Mismatch {
        path: path.count(),
        expected: Value::count(baseline.len()),
        actual: Value::count(observed.len()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn strs(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::from(*s)).collect()
    }

    fn all() -> Comparator {
        Comparator::new(ReportMode::All)
    }

    fn root() -> FieldPath {
        FieldPath::root()
    }

    // ── 1. scalar equality and the one-way empty tolerance ──────────────

    #[test]
    fn scalar_equal() {
        assert!(compare(&Value::from("a"), &Value::from("a"), &root()).is_empty());
        assert!(compare(&Value::from(7_i64), &Value::from(7_i64), &root()).is_empty());
    }

    #[test]
    fn baseline_value_observed_empty_is_tolerated() {
        assert!(compare(&Value::from("configured"), &Value::from(""), &root()).is_empty());
    }

    #[test]
    fn baseline_empty_observed_value_is_drift() {
        let out = compare(&Value::from(""), &Value::from("configured"), &root());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].actual, Value::from("configured"));
    }

    #[test]
    fn observed_null_is_not_tolerated() {
        assert_eq!(compare(&Value::from("x"), &Value::null(), &root()).len(), 1);
    }

    #[test]
    fn absent_and_empty_string_are_equal() {
        assert!(compare(&Value::null(), &Value::from(""), &root()).is_empty());
        assert!(compare(&Value::from(""), &Value::null(), &root()).is_empty());
        assert_eq!(compare(&Value::null(), &Value::from("set"), &root()).len(), 1);
    }

    #[test]
    fn undeclared_field_read_back_empty_is_consistent() {
        let b = Value::Record(Record::new().with("name", "n"));
        let o = Value::Record(Record::new().with("name", "n").with("desc", ""));
        assert!(compare(&b, &o, &root()).is_empty());
    }

    #[test]
    fn numbers_compare_by_value() {
        let n = |raw: &str| Value::Scalar(Scalar::Number(raw.parse().unwrap()));
        assert!(compare(&n("30"), &n("30.0"), &root()).is_empty());
        assert!(compare(&n("1.5"), &n("1.5"), &root()).is_empty());
        assert_eq!(compare(&n("30"), &n("30.5"), &root()).len(), 1);
        assert_eq!(compare(&n("-1"), &n("18446744073709551615"), &root()).len(), 1);
    }

    // ── 2. records ──────────────────────────────────────────────────────

    #[test]
    fn record_field_drift_reports_field_path() {
        let b = Value::Record(Record::new().with("name", "a").with("mode", "fast"));
        let o = Value::Record(Record::new().with("name", "a").with("mode", "slow"));
        let out = compare(&b, &o, &root());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path.to_string(), "mode");
        assert_eq!(out[0].expected, Value::from("fast"));
        assert_eq!(out[0].actual, Value::from("slow"));
    }

    #[test]
    fn computed_fields_never_mismatch() {
        let b = Value::Record(Record::new().with_computed("etag", "x"));
        for observed in ["y", ""] {
            let o = Value::Record(Record::new().with_computed("etag", observed));
            assert!(compare(&b, &o, &root()).is_empty());
        }
        let o = Value::Record(Record::new().with_computed("etag", Value::Sequence(vec![])));
        assert!(compare(&b, &o, &root()).is_empty());
    }

    #[test]
    fn field_missing_from_observation_is_drift() {
        let b = Value::Record(Record::new().with("name", "a"));
        let o = Value::Record(Record::new());
        let out = compare(&b, &o, &root());
        assert_eq!(out[0].path.to_string(), "name");
        assert_eq!(out[0].actual, Value::null());
    }

    // ── 3. sequences are positional ─────────────────────────────────────

    #[test]
    fn sequence_reorder_is_drift() {
        let b = Value::Sequence(strs(&["a", "b"]));
        let o = Value::Sequence(strs(&["b", "a"]));
        let out = compare(&b, &o, &FieldPath::root().child("list"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path.to_string(), "list.0");
    }

    #[test]
    fn sequence_length_reported_at_count_path() {
        let path = FieldPath::root().child("list");
        let b = Value::Sequence(strs(&["a", "b"]));
        for observed in [strs(&["a"]), strs(&["a", "b", "c"])] {
            let out = compare(&b, &Value::Sequence(observed.clone()), &path);
            assert_eq!(out[0].path.to_string(), "list.#");
            assert_eq!(out[0].expected, Value::count(2));
            assert_eq!(out[0].actual, Value::count(observed.len()));
        }
    }

    #[test]
    fn all_mode_reports_count_and_positions() {
        let b = Value::Sequence(strs(&["a", "b"]));
        let o = Value::Sequence(strs(&["x"]));
        let out = all().compare(&b, &o, &FieldPath::root().child("l"));
        let paths: Vec<String> = out.iter().map(|m| m.path.to_string()).collect();
        assert_eq!(paths, vec!["l.#", "l.0"]);
    }

    // ── 4. collections ignore order ─────────────────────────────────────

    #[test]
    fn collection_reorder_is_consistent() {
        let b = Value::Collection(strs(&["a", "b", "c"]));
        let o = Value::Collection(strs(&["c", "a", "b"]));
        assert!(compare(&b, &o, &root()).is_empty());
    }

    #[test]
    fn collection_changed_element_reports_collection_path() {
        let path = FieldPath::root().child("tags");
        let b = Value::Collection(strs(&["a", "b"]));
        let o = Value::Collection(strs(&["a", "c"]));
        let out = compare(&b, &o, &path);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path, path);
        assert_eq!(out[0].expected, Value::from("b"));
    }

    #[test]
    fn collection_duplicates_are_not_reused() {
        let b = Value::Collection(strs(&["a", "a"]));
        let o = Value::Collection(strs(&["a", "b"]));
        let out = all().compare(&b, &o, &root());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].expected, Value::from("a"));
    }

    #[test]
    fn collection_length_reported_at_count_path() {
        let path = FieldPath::root().child("tags");
        let b = Value::Collection(strs(&["a", "b"]));
        let o = Value::Collection(strs(&["b"]));
        let out = compare(&b, &o, &path);
        assert_eq!(out[0].path.to_string(), "tags.#");
    }

    #[test]
    fn collection_of_records_matches_whole_elements() {
        let rec = |id: &str, names: &[&str]| {
            Value::Record(
                Record::new()
                    .with("id", id)
                    .with("names", Value::Collection(strs(names))),
            )
        };
        let b = Value::Collection(vec![rec("1", &["bob", "tod"]), rec("2", &["mary"])]);
        let o = Value::Collection(vec![rec("2", &["mary"]), rec("1", &["tod", "bob"])]);
        assert!(compare(&b, &o, &root()).is_empty());

        let o = Value::Collection(vec![rec("2", &["bob"]), rec("1", &["tod", "mary"])]);
        assert_eq!(all().compare(&b, &o, &root()).len(), 2);
    }

    #[test]
    fn greedy_claim_can_starve_later_element() {
        // "x" is consistent with both "x" and "" so it claims "" first,
        // leaving nothing for the second baseline element.
        let b = Value::Collection(strs(&["x", "y"]));
        let o = Value::Collection(strs(&["", "x"]));
        let out = compare(&b, &o, &root());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].expected, Value::from("y"));
    }

    // ── 5. placeholders and shape drift ─────────────────────────────────

    #[test]
    fn single_vacant_block_equals_none() {
        let b = Value::Sequence(vec![Value::Record(Record::new().with("mode", ""))]);
        assert!(compare(&b, &Value::Sequence(vec![]), &root()).is_empty());
        let b = Value::Collection(vec![Value::Record(Record::new())]);
        assert!(compare(&b, &Value::Collection(vec![]), &root()).is_empty());
    }

    #[test]
    fn placeholder_tolerance_can_be_disabled() {
        let cfg = VerifierConfig {
            tolerate_empty_placeholder: false,
            ..VerifierConfig::default()
        };
        let b = Value::Sequence(vec![Value::Record(Record::new())]);
        let out = Comparator::from_config(&cfg).compare(&b, &Value::Sequence(vec![]), &root());
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn variant_disagreement_is_drift() {
        let out = compare(&Value::Sequence(vec![]), &Value::Collection(vec![]), &root());
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn mismatch_message_format() {
        let m = Mismatch {
            path: "siblings.#".parse().unwrap(),
            expected: Value::count(2),
            actual: Value::count(1),
        };
        assert_eq!(
            m.to_string(),
            "mismatch on attribute siblings.#:\nexpected value: 2\nactual value:   1"
        );
    }
}
