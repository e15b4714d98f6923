use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};

use provgen::{env::EnvSnapshot, output, predicate};

/// A predicate is a few KB; anything bigger is not one of ours.
const MAX_PREDICATE_BYTES: u64 = 1024 * 1024; // 1MB

#[derive(Parser)]
#[command(
    name = "provgen",
    about = "SLSA v1 provenance predicate generator for GitLab CI",
    version
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Assemble the predicate from CI environment variables and write it
    Generate {
        /// Destination path (defaults to $PROVENANCE_PREDICATE)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Inspect a previously generated predicate
    Show {
        /// Path to the predicate JSON
        predicate: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Generate { output } => generate(output),
        Cmd::Show { predicate } => show(&predicate),
    }
}

fn generate(output: Option<PathBuf>) -> Result<()> {
    let env = EnvSnapshot::from_process();

    // Resolve the destination before building anything: with nowhere to
    // write, the run cannot succeed.
    let path = match output {
        Some(p) => p,
        None => PathBuf::from(env.required("PROVENANCE_PREDICATE")?),
    };

    let predicate = predicate::build(&env)?;
    output::write(&predicate, &path)
}

/// Reads `path` after checking it is not a symlink and within the size
/// bound. Predicates come back from CI artifact storage, so the same
/// caution applies as to any fetched file.
fn read_bounded(path: &Path) -> Result<Vec<u8>> {
    let meta = fs::symlink_metadata(path).with_context(|| format!("stat {}", path.display()))?;
    if meta.file_type().is_symlink() {
        return Err(anyhow!("Refusing to read symlink: {}", path.display()));
    }
    if meta.len() > MAX_PREDICATE_BYTES {
        return Err(anyhow!(
            "File too large: {} ({} bytes, max {MAX_PREDICATE_BYTES} bytes)",
            path.display(),
            meta.len(),
        ));
    }
    fs::read(path).with_context(|| format!("read {}", path.display()))
}

fn show(path: &Path) -> Result<()> {
    let doc: Value = serde_json::from_slice(&read_bounded(path)?)
        .with_context(|| format!("parse {}", path.display()))?;

    let obj = doc
        .as_object()
        .ok_or_else(|| anyhow!("Not a JSON object: {}", path.display()))?;
    let keys: Vec<&str> = obj.keys().map(String::as_str).collect();

    let build_type = doc
        .pointer("/buildDefinition/buildType")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let builder_id = doc
        .pointer("/runDetails/builder/id")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let invocation_id = doc
        .pointer("/runDetails/metadata/invocationId")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let finished_on = doc
        .pointer("/runDetails/metadata/finishedOn")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    println!("Provenance predicate v{}", env!("CARGO_PKG_VERSION"));
    println!("Keys: [{}]", keys.join(", "));
    println!("Build type: {build_type}");
    println!("Builder: {builder_id}");
    println!("Invocation: {invocation_id}");
    println!("Finished: {finished_on}");

    let mut missing: Vec<&str> = Vec::new();
    for key in predicate::ProvenancePredicate::TOP_LEVEL_KEYS {
        if !obj.contains_key(key) {
            missing.push(key);
        }
    }
    if !missing.is_empty() {
        return Err(anyhow!("Missing top-level keys: [{}]", missing.join(", ")));
    }

    Ok(())
}
