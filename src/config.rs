//! Per-invocation configuration.
//!
//! One [`ApiConfig`] is built by the entry point and handed to the
//! [`GitHub`](crate::github::GitHub) client; nothing reads the environment
//! after that.

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "GITHUB_API";

/// Misspelt variable some existing pipelines still export. Only read when
/// [`API_URL_ENV`] is unset.
pub const LEGACY_API_URL_ENV: &str = "GITHUP_API";

/// Environment variable carrying the API token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Connection settings for the hosting platform API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub user_agent: String,
}

impl ApiConfig {
    /// Build from CLI/env values. `api_url` is whatever clap resolved from
    /// `--api-url` or `GITHUB_API`; the legacy variable is consulted only
    /// when that is absent.
    pub fn new(api_url: Option<String>, token: Option<String>) -> Self {
        let legacy = std::env::var(LEGACY_API_URL_ENV).ok();
        Self {
            base_url: resolve_base_url(api_url, legacy),
            token: token.filter(|t| !t.trim().is_empty()),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Options applied to the release object that gets created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseOptions {
    /// Create the release as a draft. Defaults to true so nothing is
    /// published without review.
    pub draft: bool,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        Self { draft: true }
    }
}

fn resolve_base_url(explicit: Option<String>, legacy: Option<String>) -> String {
    explicit
        .or(legacy)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_defaults_to_public_api() {
        assert_eq!(resolve_base_url(None, None), DEFAULT_API_URL);
    }

    #[test]
    fn explicit_base_url_beats_legacy_variable() {
        let url = resolve_base_url(
            Some("https://ghe.example.com/api/v3".into()),
            Some("https://legacy.example.com".into()),
        );
        assert_eq!(url, "https://ghe.example.com/api/v3");
    }

    #[test]
    fn legacy_variable_used_when_explicit_absent() {
        let url = resolve_base_url(None, Some("https://legacy.example.com".into()));
        assert_eq!(url, "https://legacy.example.com");
    }

    #[test]
    fn blank_base_url_falls_back_to_default() {
        assert_eq!(resolve_base_url(Some("  ".into()), None), DEFAULT_API_URL);
    }

    #[test]
    fn blank_token_is_dropped() {
        let config = ApiConfig::new(Some(DEFAULT_API_URL.into()), Some(String::new()));
        assert_eq!(config.token, None);
    }

    #[test]
    fn user_agent_names_the_tool() {
        assert!(ApiConfig::default().user_agent.starts_with("npm-release-check/"));
    }

    #[test]
    fn releases_are_drafts_by_default() {
        assert!(ReleaseOptions::default().draft);
    }
}
