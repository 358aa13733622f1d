//! CI environment detection for upload metadata

use zealot_core::{CiContext, CiDetector};

/// Reads the environment variables set by common CI services
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCiDetector;

impl CiDetector for EnvCiDetector {
    fn detect(&self) -> Option<CiContext> {
        detect_from(|name| std::env::var(name).ok())
    }
}

/// Detect CI values through a variable lookup
pub fn detect_from(var: impl Fn(&str) -> Option<String>) -> Option<CiContext> {
    let lookup = |name: &str| var(name).filter(|value| !value.is_empty());
    let first = |names: &[&str]| names.iter().find_map(|name| lookup(*name));

    let (source, ci_url) = if lookup("JENKINS_URL").is_some() {
        (Some("jenkins".to_string()), lookup("BUILD_URL"))
    } else if lookup("GITLAB_CI").is_some() {
        (Some("gitlab-ci".to_string()), lookup("CI_JOB_URL"))
    } else if lookup("GITHUB_ACTIONS").is_some() {
        let run_url = match (
            lookup("GITHUB_SERVER_URL"),
            lookup("GITHUB_REPOSITORY"),
            lookup("GITHUB_RUN_ID"),
        ) {
            (Some(server), Some(repository), Some(run_id)) => Some(format!(
                "{}/{}/actions/runs/{}",
                server.trim_end_matches('/'),
                repository,
                run_id
            )),
            _ => None,
        };
        (Some("github-actions".to_string()), run_url)
    } else {
        (None, None)
    };

    let context = CiContext {
        source,
        ci_url,
        branch: first(&["GIT_BRANCH", "CI_COMMIT_REF_NAME", "CI_BUILD_REF_NAME", "GITHUB_REF_NAME"]),
        git_commit: first(&["GIT_COMMIT", "CI_COMMIT_SHA", "CI_BUILD_REF", "GITHUB_SHA"]),
    };

    if context == CiContext::default() {
        None
    } else {
        Some(context)
    }
}
