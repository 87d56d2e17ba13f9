// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Post-mutation consistency verifier.
//!
//! After a declarative-infrastructure engine creates or updates a remote
//! entity, it reads the entity back (often several times, under a retry
//! loop). `drift-verify` decides whether those reads still hold what the
//! caller declared, tolerating divergences the remote system is allowed to
//! introduce, and reports exactly which field drifted when they do not.
//!
//! # Pipeline
//!
//! 1. [`normalize`] turns the collaborator's decoded payload into a [`Value`]
//!    tree, classified by the caller's [`RecordSchema`].
//! 2. [`BaselineRegistry`] freezes the first observation per identity.
//! 3. [`Comparator`] diffs later observations against that frozen baseline.
//! 4. [`Verifier`] runs the per-identity state machine on top.
//!
//! # Error Policy
//!
//! Shape errors ([`ShapeError`]) are fatal. Drift is returned as
//! [`VerifyError::Inconsistent`] and is retryable; retry, backoff and user
//! facing formatting belong to the caller.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::option_if_let_else,
    clippy::significant_drop_tightening
)]

mod compare;
mod config;
mod error;
mod normalize;
mod path;
mod registry;
mod schema;
mod value;
mod verifier;

pub use compare::{compare, Comparator, Mismatch};
pub use config::{ReportMode, VerifierConfig};
pub use error::{ConfigError, Inconsistency, ShapeError, VerifyError};
pub use normalize::normalize;
pub use path::{FieldPath, PathParseError, Segment};
pub use registry::{Baseline, BaselineRegistry};
pub use schema::{FieldKind, FieldSchema, RecordSchema};
pub use value::{Field, Record, Scalar, Value};
pub use verifier::{Verdict, Verifier};
