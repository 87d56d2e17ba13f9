// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use std::sync::Arc;

use drift_verify::{
    BaselineRegistry, FieldKind, FieldSchema, RecordSchema, Verdict, Verifier, VerifyError,
};
use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};
use serde_json::{json, Value as Json};

fn schema() -> Arc<RecordSchema> {
    Arc::new(
        RecordSchema::new()
            .with("tags", FieldSchema::collection(FieldKind::Scalar))
            .with("ports", FieldSchema::sequence(FieldKind::Scalar))
            .with("etag", FieldSchema::scalar().computed()),
    )
}

/// Distinct, non-empty lowercase labels.
fn labels(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,6}", 1..max).prop_map(|s| s.into_iter().collect())
}

/// Capture `baseline` then verify `observed` against it.
fn judge(baseline: &Json, observed: &Json) -> Result<Verdict, VerifyError> {
    let registry = BaselineRegistry::new();
    let verifier = Verifier::new(&registry);
    let schema = schema();
    verifier.verify("e", &schema, baseline)?;
    verifier.verify("e", &schema, observed)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn collection_permutation_is_consistent(
        (original, shuffled) in labels(8).prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let verdict = judge(&json!({"tags": original}), &json!({"tags": shuffled}));
        prop_assert_eq!(verdict, Ok(Verdict::Consistent));
    }

    #[test]
    fn collection_replacement_is_drift_at_field_path(
        (tags, victim) in labels(8).prop_flat_map(|v| { let n = v.len(); (Just(v), 0..n) }),
        replacement in "[A-Z]{1,6}",
    ) {
        let mut observed = tags.clone();
        observed[victim] = replacement;
        let err = judge(&json!({"tags": tags}), &json!({"tags": observed})).unwrap_err();
        prop_assert!(err.is_retryable());
        prop_assert_eq!(err.mismatches()[0].path.to_string(), "tags");
    }

    #[test]
    fn sequence_reversal_is_drift(ports in prop::collection::btree_set(1_u16..u16::MAX, 2..8)) {
        let ports: Vec<u16> = ports.into_iter().collect();
        let reversed: Vec<u16> = ports.iter().rev().copied().collect();
        let err = judge(&json!({"ports": ports}), &json!({"ports": reversed})).unwrap_err();
        prop_assert_eq!(err.mismatches()[0].path.to_string(), "ports.0");
    }

    #[test]
    fn computed_field_never_drifts(
        before in ".{0,12}",
        after in ".{0,12}",
        port in 1_u16..,
    ) {
        let verdict = judge(
            &json!({"ports": [port], "etag": before}),
            &json!({"ports": [port], "etag": after}),
        );
        prop_assert_eq!(verdict, Ok(Verdict::Consistent));
    }
}

#[test]
fn seed_pinned_length_change_reports_count() {
    const SEED_BYTES: [u8; 32] = [
        0x21, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0,
    ];
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    let mut runner = TestRunner::new_with_rng(PropConfig::default(), rng);

    runner
        .run(&(labels(6), any::<bool>()), |(tags, grow)| {
            let mut observed = tags.clone();
            if grow {
                observed.push("EXTRA".to_owned());
            } else {
                observed.pop();
            }
            for field in ["tags", "ports"] {
                let err = judge(&json!({ field: tags }), &json!({ field: observed })).unwrap_err();
                prop_assert_eq!(err.mismatches()[0].path.to_string(), format!("{field}.#"));
            }
            Ok(())
        })
        .expect("length changes always surface at the count path");
}
