//! Read-only environment snapshot.
//!
//! The CI environment is the only configuration source provgen has. It is
//! captured once, at startup, into an [`EnvSnapshot`]; the builder never
//! reads `std::env` directly. This keeps every lookup within one run
//! consistent and lets tests feed a plain map instead of mutating the
//! process environment.

use std::collections::BTreeMap;
use std::fmt;

/// A required environment variable was not set.
///
/// This is the configuration-error half of provgen's error taxonomy (the
/// other half being plain I/O failure on the output path). It is fatal at
/// the top level: the message names exactly the missing variable and the
/// process exits non-zero without producing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingVariable(pub String);

impl fmt::Display for MissingVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing required environment variable: {}", self.0)
    }
}

impl std::error::Error for MissingVariable {}

/// An immutable snapshot of environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Captures the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Builds a snapshot from explicit pairs. Primarily for tests.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Looks up `name`, failing with [`MissingVariable`] if unset.
    pub fn required(&self, name: &str) -> Result<String, MissingVariable> {
        self.vars
            .get(name)
            .cloned()
            .ok_or_else(|| MissingVariable(name.to_string()))
    }

    /// Looks up `name`, falling back to `default` if unset. Never fails.
    pub fn optional(&self, name: &str, default: &str) -> String {
        self.vars
            .get(name)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}
