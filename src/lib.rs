//! # provgen -- SLSA v1 provenance predicate generator for GitLab CI
//!
//! Assembles a SLSA v1 build-provenance predicate from the GitLab CI
//! environment and writes it to the path named by `PROVENANCE_PREDICATE`.
//! The predicate describes *how* an image was built (source, trigger,
//! pipeline, runner, timestamps); a separate signer (cosign) wraps it in an
//! in-toto statement and attaches it to the published artifact. provgen
//! itself never signs anything and never touches credentials.
//!
//! ## Design Properties
//!
//! - **One environment snapshot**: the CI environment is captured once at
//!   startup into [`env::EnvSnapshot`]; every lookup within a run sees the
//!   same values.
//! - **Fail before writing**: all required variables are resolved before
//!   any byte reaches the output path. A missing variable aborts with a
//!   single-line error naming exactly that variable, and no file exists
//!   afterwards to imply success.
//! - **No partial output**: the predicate is serialized fully in memory
//!   and written in one call, so an I/O failure never leaves truncated
//!   JSON behind.
//! - **Stable ordering**: JSON key order follows struct declaration order,
//!   so two runs over an identical environment produce byte-identical
//!   output.
//!
//! ## Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`env`] | Read-only environment snapshot, required/optional lookup |
//! | [`predicate`] | Typed predicate schema and assembly |
//! | [`output`] | Serialization, file write, stderr diagnostics |

#![forbid(unsafe_code)]

/// Read-only snapshot of the process environment. Single source of truth
/// for all configuration input in provgen.
pub mod env;

/// The SLSA v1 predicate schema as typed serde structs, and `build()`,
/// which populates it from an environment snapshot.
pub mod predicate;

/// Predicate serialization and the single output-file write, plus the two
/// advisory diagnostic lines on stderr.
pub mod output;
