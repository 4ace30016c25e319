//! Run context: who triggered the run, where, and on what.
//!
//! Built once before the orchestrator starts and passed in explicitly.
//! [`RunContext::from_env`] reads the GitHub Actions variables:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `GITHUB_WORKSPACE` | `workspace` | `.` |
//! | `GITHUB_ACTOR` | `actor` | required |
//! | `GITHUB_REPOSITORY` | `repository` | required, `owner/name` |
//! | `GITHUB_SHA` | `commit` | `unknown` |
//! | `GITHUB_EVENT_NAME` | `event_name` | `manual` |
//! | `GITHUB_HEAD_REF` | `head_ref` | required for pull requests |

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

/// Commit recorded when none is known.
pub const UNKNOWN_COMMIT: &str = "unknown";

/// Trigger recorded when the event name is absent.
pub const DEFAULT_TRIGGER: &str = "manual";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("missing required environment variable {name}")]
    Missing { name: &'static str },

    #[error("invalid repository '{value}': expected owner/name")]
    InvalidRepository { value: String },

    #[error("GITHUB_HEAD_REF is required for {event} events")]
    MissingHeadRef { event: String },
}

fn repository_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$").expect("static regex")
    })
}

fn is_pull_request_event(event: &str) -> bool {
    matches!(event, "pull_request" | "pull_request_target")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub workspace: PathBuf,
    pub actor: String,
    pub repository: String,
    pub commit: Option<String>,
    pub event_name: String,
    pub head_ref: Option<String>,
}

impl RunContext {
    /// Context with the required fields; everything else defaulted.
    pub fn new(
        workspace: impl Into<PathBuf>,
        actor: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            workspace: workspace.into(),
            actor: actor.into(),
            repository: repository.into(),
            commit: None,
            event_name: DEFAULT_TRIGGER.to_string(),
            head_ref: None,
        }
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn with_event(mut self, event_name: impl Into<String>) -> Self {
        self.event_name = event_name.into();
        self
    }

    pub fn with_head_ref(mut self, head_ref: impl Into<String>) -> Self {
        self.head_ref = Some(head_ref.into());
        self
    }

    /// Read and validate the context from process environment.
    pub fn from_env() -> Result<Self, ContextError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read and validate the context from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ContextError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let context = Self {
            workspace: get("GITHUB_WORKSPACE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            actor: get("GITHUB_ACTOR").ok_or(ContextError::Missing {
                name: "GITHUB_ACTOR",
            })?,
            repository: get("GITHUB_REPOSITORY").ok_or(ContextError::Missing {
                name: "GITHUB_REPOSITORY",
            })?,
            commit: get("GITHUB_SHA"),
            event_name: get("GITHUB_EVENT_NAME").unwrap_or_else(|| DEFAULT_TRIGGER.to_string()),
            head_ref: get("GITHUB_HEAD_REF"),
        };

        context.validate()?;
        Ok(context)
    }

    /// Check the repository pattern and the pull-request head ref.
    pub fn validate(&self) -> Result<(), ContextError> {
        if !repository_pattern().is_match(&self.repository) {
            return Err(ContextError::InvalidRepository {
                value: self.repository.clone(),
            });
        }

        if is_pull_request_event(&self.event_name) && self.head_ref.is_none() {
            return Err(ContextError::MissingHeadRef {
                event: self.event_name.clone(),
            });
        }

        Ok(())
    }

    /// Warning for head refs that look like they come from a fork.
    ///
    /// Flagged, never blocked.
    pub fn fork_warning(&self) -> Option<String> {
        let head_ref = self.head_ref.as_deref()?;
        if !is_pull_request_event(&self.event_name) {
            return None;
        }
        head_ref.contains(['/', ':']).then(|| {
            format!(
                "Head ref '{}' contains a path separator; this pull request may come from a fork",
                head_ref
            )
        })
    }

    pub fn commit_or_unknown(&self) -> &str {
        self.commit.as_deref().unwrap_or(UNKNOWN_COMMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_full() {
        let ctx = RunContext::from_lookup(lookup(&[
            ("GITHUB_WORKSPACE", "/work"),
            ("GITHUB_ACTOR", "test-actor"),
            ("GITHUB_REPOSITORY", "test-org/test-repo"),
            ("GITHUB_SHA", "abc123"),
            ("GITHUB_EVENT_NAME", "push"),
        ]))
        .unwrap();

        assert_eq!(ctx.workspace, PathBuf::from("/work"));
        assert_eq!(ctx.actor, "test-actor");
        assert_eq!(ctx.commit_or_unknown(), "abc123");
        assert_eq!(ctx.event_name, "push");
        assert!(ctx.fork_warning().is_none());
    }

    #[test]
    fn test_defaults() {
        let ctx = RunContext::from_lookup(lookup(&[
            ("GITHUB_ACTOR", "a"),
            ("GITHUB_REPOSITORY", "o/r"),
        ]))
        .unwrap();
        assert_eq!(ctx.workspace, PathBuf::from("."));
        assert_eq!(ctx.commit_or_unknown(), UNKNOWN_COMMIT);
        assert_eq!(ctx.event_name, DEFAULT_TRIGGER);
    }

    #[test]
    fn test_missing_actor() {
        let err = RunContext::from_lookup(lookup(&[("GITHUB_REPOSITORY", "o/r")])).unwrap_err();
        assert_eq!(
            err,
            ContextError::Missing {
                name: "GITHUB_ACTOR"
            }
        );
    }

    #[test]
    fn test_repository_pattern() {
        for bad in ["no-slash", "a/b/c", "own er/repo", "/repo", "owner/"] {
            let err = RunContext::new(".", "a", bad).validate().unwrap_err();
            assert!(matches!(err, ContextError::InvalidRepository { .. }), "{bad}");
        }
        assert!(RunContext::new(".", "a", "my-org/my.repo_1").validate().is_ok());
    }

    #[test]
    fn test_pull_request_requires_head_ref() {
        let ctx = RunContext::new(".", "a", "o/r").with_event("pull_request");
        assert_eq!(
            ctx.validate().unwrap_err(),
            ContextError::MissingHeadRef {
                event: "pull_request".into()
            }
        );
        assert!(ctx.with_head_ref("feature-branch").validate().is_ok());
    }

    const GITHUB_VARS: [&str; 6] = [
        "GITHUB_WORKSPACE",
        "GITHUB_ACTOR",
        "GITHUB_REPOSITORY",
        "GITHUB_SHA",
        "GITHUB_EVENT_NAME",
        "GITHUB_HEAD_REF",
    ];

    fn clear_github_env() {
        for name in GITHUB_VARS {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_github_env();
        std::env::set_var("GITHUB_ACTOR", "env-actor");
        std::env::set_var("GITHUB_REPOSITORY", "env-org/env-repo");
        std::env::set_var("GITHUB_SHA", "");
        let ctx = RunContext::from_env();
        clear_github_env();

        let ctx = ctx.unwrap();
        assert_eq!(ctx.actor, "env-actor");
        assert_eq!(ctx.repository, "env-org/env-repo");
        assert_eq!(ctx.commit_or_unknown(), UNKNOWN_COMMIT);
    }

    #[test]
    #[serial]
    fn test_from_env_pull_request_without_head_ref() {
        clear_github_env();
        std::env::set_var("GITHUB_ACTOR", "env-actor");
        std::env::set_var("GITHUB_REPOSITORY", "env-org/env-repo");
        std::env::set_var("GITHUB_EVENT_NAME", "pull_request_target");
        let result = RunContext::from_env();
        clear_github_env();

        assert!(matches!(
            result,
            Err(ContextError::MissingHeadRef { .. })
        ));
    }

    #[test]
    fn test_fork_like_head_ref_is_flagged_not_blocked() {
        let ctx = RunContext::new(".", "a", "o/r")
            .with_event("pull_request")
            .with_head_ref("contributor:feature");
        assert!(ctx.validate().is_ok());
        assert!(ctx.fork_warning().unwrap().contains("fork"));

        let plain = RunContext::new(".", "a", "o/r")
            .with_event("pull_request")
            .with_head_ref("feature-branch");
        assert!(plain.fork_warning().is_none());
    }
}
