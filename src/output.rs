//! Predicate serialization and the single output write.
//!
//! The predicate is rendered fully in memory first, so a failing
//! destination (missing directory, permissions) aborts without creating a
//! half-written file that a later pipeline stage could mistake for a
//! complete predicate.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::predicate::ProvenancePredicate;

/// Renders the predicate as indented JSON with a trailing newline.
pub fn render(predicate: &ProvenancePredicate) -> Result<Vec<u8>> {
    let mut buf = serde_json::to_vec_pretty(predicate).context("serializing predicate")?;
    buf.push(b'\n');
    Ok(buf)
}

/// Writes the predicate to `path`, overwriting any existing content, then
/// emits two advisory lines on stderr (the path and the top-level keys)
/// for operator troubleshooting. The lines never affect the exit status.
pub fn write(predicate: &ProvenancePredicate, path: &Path) -> Result<()> {
    let buf = render(predicate)?;
    fs::write(path, &buf).with_context(|| format!("write {}", path.display()))?;

    eprintln!("Provenance predicate written to: {}", path.display());
    eprintln!(
        "Top-level keys: [{}]",
        ProvenancePredicate::TOP_LEVEL_KEYS.join(", ")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvSnapshot;
    use crate::predicate;

    fn sample() -> ProvenancePredicate {
        let env = EnvSnapshot::from_pairs([
            ("CI_COMMIT_REF_NAME", "main"),
            ("X_CI_BUILD_KIND", "release"),
            ("CI_PROJECT_PATH", "group/proj"),
            ("CI_COMMIT_SHA", "abc123"),
            ("CI_PIPELINE_ID", "42"),
            ("BUILD_FINISHED", "2024-01-01T00:00:00Z"),
        ]);
        predicate::build(&env).unwrap()
    }

    #[test]
    fn test_render_ends_with_single_newline() {
        let buf = render(&sample()).unwrap();
        assert_eq!(buf.last(), Some(&b'\n'));
        assert_ne!(buf.get(buf.len() - 2), Some(&b'\n'));
    }

    #[test]
    fn test_render_key_order_is_declaration_order() {
        let text = String::from_utf8(render(&sample()).unwrap()).unwrap();
        let pos = |needle: &str| text.find(needle).unwrap_or_else(|| panic!("missing {needle}"));

        assert!(pos("\"buildDefinition\"") < pos("\"runDetails\""));
        assert!(pos("\"buildType\"") < pos("\"externalParameters\""));
        assert!(pos("\"ref\"") < pos("\"build_kind\""));
        assert!(pos("\"build_kind\"") < pos("\"source\""));
        assert!(pos("\"trigger\"") < pos("\"commit_title\""));
        assert!(pos("\"internalParameters\"") < pos("\"resolvedDependencies\""));
        assert!(pos("\"invocationId\"") < pos("\"startedOn\""));
        assert!(pos("\"startedOn\"") < pos("\"finishedOn\""));
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predicate.json");
        fs::write(&path, "stale content").unwrap();

        write(&sample(), &path).unwrap();

        let on_disk = fs::read(&path).unwrap();
        assert_eq!(on_disk, render(&sample()).unwrap());
    }

    #[test]
    fn test_write_missing_directory_fails_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("predicate.json");

        assert!(write(&sample(), &path).is_err());
        assert!(!path.exists());
    }
}
