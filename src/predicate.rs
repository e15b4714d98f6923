//! SLSA v1 provenance predicate schema and assembly.
//!
//! The predicate is modelled as plain serde structs rather than a free-form
//! JSON value: field declaration order fixes the serialized key order, which
//! keeps the output byte-stable across runs, and the compiler enforces that
//! every field of the schema is populated. Only the *predicate* is produced
//! here; cosign wraps it into the in-toto statement at signing time.
//!
//! Leaf values are copied verbatim from the environment. The only derived
//! strings are the two URLs ([`BuildDefinition::build_type`] and
//! [`Builder::id`]), concatenated from the server URL, project path, and
//! pipeline id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::env::{EnvSnapshot, MissingVariable};

/// Base URL used when the pipeline does not export `CI_SERVER_URL`
/// (self-hosted instances always do; this covers local dry runs).
pub const DEFAULT_SERVER_URL: &str = "https://gitlab.com";

/// Fallback GitLab server version when `CI_SERVER_VERSION` is unset.
pub const DEFAULT_SERVER_VERSION: &str = "18.2.1-ee";

/// Pipeline definitions live at a fixed path in the repository.
const ENTRY_POINT: &str = ".gitlab-ci.yml";

/// The complete SLSA v1 provenance predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenancePredicate {
    pub build_definition: BuildDefinition,
    pub run_details: RunDetails,
}

impl ProvenancePredicate {
    /// Top-level key names, in serialization order.
    pub const TOP_LEVEL_KEYS: [&'static str; 2] = ["buildDefinition", "runDetails"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDefinition {
    pub build_type: String,
    pub external_parameters: ExternalParameters,
    pub internal_parameters: InternalParameters,
    /// Always empty: dependency resolution happens outside this pipeline.
    pub resolved_dependencies: Vec<Value>,
}

/// Parameters under the control of whoever triggered the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalParameters {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub build_kind: String,
    pub source: Source,
    pub trigger: String,
    pub commit_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub uri: String,
    pub digest: Digest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    pub sha256: String,
}

/// Parameters fixed by the CI system rather than the triggering user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalParameters {
    #[serde(rename = "entryPoint")]
    pub entry_point: String,
    pub pipeline_id: String,
    pub job_id: String,
    pub job_name: String,
    pub runner_id: String,
    pub runner_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDetails {
    pub builder: Builder,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Builder {
    /// URL of the specific pipeline run that performed the build.
    pub id: String,
    pub version: BuilderVersion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderVersion {
    pub gitlab: String,
    pub gitlab_runner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub invocation_id: String,
    pub started_on: String,
    pub finished_on: String,
    pub project: Project,
    pub commit: Commit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub visibility: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub short_sha: String,
    pub branch: String,
    pub tag: String,
    pub author: String,
    pub timestamp: String,
}

/// Assembles the predicate from one environment snapshot.
///
/// Pure: no clock, no I/O. All timestamps come from the environment, so an
/// identical snapshot always yields an identical predicate.
///
/// `startedOn` falls back from `CI_PIPELINE_CREATED_AT` to `BUILD_FINISHED`,
/// but `finishedOn` requires `BUILD_FINISHED` outright; the asymmetry is
/// deliberate and `BUILD_FINISHED` is effectively always required.
pub fn build(env: &EnvSnapshot) -> Result<ProvenancePredicate, MissingVariable> {
    let server_url = env.optional("CI_SERVER_URL", DEFAULT_SERVER_URL);
    let project_path = env.required("CI_PROJECT_PATH")?;
    let pipeline_id = env.required("CI_PIPELINE_ID")?;
    let commit_sha = env.required("CI_COMMIT_SHA")?;
    let finished_on = env.required("BUILD_FINISHED")?;
    let started_on = env.optional("CI_PIPELINE_CREATED_AT", &finished_on);

    Ok(ProvenancePredicate {
        build_definition: BuildDefinition {
            build_type: format!("{server_url}/{project_path}/pipeline"),
            external_parameters: ExternalParameters {
                ref_name: env.required("CI_COMMIT_REF_NAME")?,
                build_kind: env.required("X_CI_BUILD_KIND")?,
                source: Source {
                    uri: format!("{server_url}/{project_path}"),
                    digest: Digest {
                        sha256: commit_sha.clone(),
                    },
                },
                trigger: env.optional("CI_PIPELINE_SOURCE", "unknown"),
                commit_title: env.optional("CI_COMMIT_TITLE", ""),
            },
            internal_parameters: InternalParameters {
                entry_point: ENTRY_POINT.to_string(),
                pipeline_id: pipeline_id.clone(),
                job_id: env.optional("CI_JOB_ID", ""),
                job_name: env.optional("CI_JOB_NAME", ""),
                runner_id: env.optional("CI_RUNNER_ID", ""),
                runner_description: env.optional("CI_RUNNER_DESCRIPTION", ""),
            },
            resolved_dependencies: Vec::new(),
        },
        run_details: RunDetails {
            builder: Builder {
                id: format!("{server_url}/{project_path}/-/pipelines/{pipeline_id}"),
                version: BuilderVersion {
                    gitlab: env.optional("CI_SERVER_VERSION", DEFAULT_SERVER_VERSION),
                    gitlab_runner: env.optional("CI_RUNNER_VERSION", "unknown"),
                },
            },
            metadata: Metadata {
                invocation_id: pipeline_id,
                started_on,
                finished_on,
                project: Project {
                    id: env.optional("CI_PROJECT_ID", ""),
                    name: env.optional("CI_PROJECT_NAME", ""),
                    namespace: env.optional("CI_PROJECT_NAMESPACE", ""),
                    visibility: env.optional("CI_PROJECT_VISIBILITY", ""),
                },
                commit: Commit {
                    sha: commit_sha,
                    short_sha: env.optional("CI_COMMIT_SHORT_SHA", ""),
                    branch: env.optional("CI_COMMIT_BRANCH", ""),
                    tag: env.optional("CI_COMMIT_TAG", ""),
                    author: env.optional("CI_COMMIT_AUTHOR", ""),
                    timestamp: env.optional("CI_COMMIT_TIMESTAMP", ""),
                },
            },
        },
    })
}
