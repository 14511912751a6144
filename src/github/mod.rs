//! Hosting platform access.
//!
//! [`ReleaseHost`] is the capability the release pipeline needs from the
//! platform; [`GitHub`] implements it over the REST API with `ureq`.
//! Every method is a single blocking request with the agent's default
//! timeouts and no retries.

pub mod types;

use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ApiConfig;
use crate::slug::RepoSlug;
use types::{Branch, Commit, ErrorBody, FileContent, NewRelease, Release, Repository};

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// Errors from hosting platform requests.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP 404.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// HTTP 422. `codes` holds the machine-readable error codes, e.g.
    /// `already_exists`.
    #[error("{url} rejected the request: {message}")]
    Validation {
        url: String,
        message: String,
        codes: Vec<String>,
    },

    /// Any other non-2xx status.
    #[error("{url} returned HTTP {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// Connection, TLS or I/O failure.
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// 2xx response whose body did not match the expected shape.
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("invalid API base URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ApiError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when the platform reported `code` in a 422 error list.
    pub fn has_code(&self, code: &str) -> bool {
        matches!(self, Self::Validation { codes, .. } if codes.iter().any(|c| c == code))
    }
}

/// Operations the release pipeline performs against the hosting platform.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseHost {
    /// Repository metadata, including the default branch name.
    fn repository(&self, slug: &RepoSlug) -> Result<Repository, ApiError>;

    /// A branch and its tip commit.
    fn branch(&self, slug: &RepoSlug, branch: &str) -> Result<Branch, ApiError>;

    /// A file on the default branch, still in transport encoding.
    fn file_content(&self, slug: &RepoSlug, path: &str) -> Result<FileContent, ApiError>;

    /// One page of releases in the platform's listing order.
    fn list_releases(
        &self,
        slug: &RepoSlug,
        per_page: u8,
        page: u32,
    ) -> Result<Vec<Release>, ApiError>;

    /// Resolve a tag, branch or SHA to a commit.
    fn commit(&self, slug: &RepoSlug, reference: &str) -> Result<Commit, ApiError>;

    /// Create a release object. Not idempotent.
    fn create_release(&self, slug: &RepoSlug, release: &NewRelease) -> Result<Release, ApiError>;
}

/// GitHub REST client. One per process, configured up front.
pub struct GitHub {
    config: ApiConfig,
    agent: ureq::Agent,
}

impl GitHub {
    pub fn new(config: ApiConfig) -> Self {
        // Status codes are classified here so error bodies stay readable.
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            config,
            agent: ureq::Agent::new_with_config(agent_config),
        }
    }

    /// Build `{base}/repos/{owner}/{repo}/{rest...}`, percent-encoding each segment.
    fn endpoint(&self, slug: &RepoSlug, rest: &[&str]) -> Result<Url, ApiError> {
        let invalid = |reason: String| ApiError::InvalidUrl {
            url: self.config.base_url.clone(),
            reason,
        };
        let mut url = Url::parse(&self.config.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["repos", slug.owner.as_str(), slug.repo.as_str()])
            .extend(rest);
        Ok(url)
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        let request = request
            .header("Accept", ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", self.config.user_agent.as_str());
        match &self.config.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    fn get<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ApiError> {
        tracing::debug!(%url, "GET");
        let response = self
            .authorize(self.agent.get(url.as_str()))
            .call()
            .map_err(|e| transport(url, &e))?;
        read_response(url, response)
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, url: &Url, body: &B) -> Result<T, ApiError> {
        tracing::debug!(%url, "POST");
        let payload = serde_json::to_vec(body).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let response = self
            .authorize(self.agent.post(url.as_str()))
            .header("Content-Type", "application/json")
            .send(payload.as_slice())
            .map_err(|e| transport(url, &e))?;
        read_response(url, response)
    }
}

impl ReleaseHost for GitHub {
    fn repository(&self, slug: &RepoSlug) -> Result<Repository, ApiError> {
        self.get(&self.endpoint(slug, &[])?)
    }

    fn branch(&self, slug: &RepoSlug, branch: &str) -> Result<Branch, ApiError> {
        self.get(&self.endpoint(slug, &["branches", branch])?)
    }

    fn file_content(&self, slug: &RepoSlug, path: &str) -> Result<FileContent, ApiError> {
        let mut rest = vec!["contents"];
        rest.extend(path.split('/').filter(|s| !s.is_empty()));
        self.get(&self.endpoint(slug, &rest)?)
    }

    fn list_releases(
        &self,
        slug: &RepoSlug,
        per_page: u8,
        page: u32,
    ) -> Result<Vec<Release>, ApiError> {
        let mut url = self.endpoint(slug, &["releases"])?;
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        self.get(&url)
    }

    fn commit(&self, slug: &RepoSlug, reference: &str) -> Result<Commit, ApiError> {
        self.get(&self.endpoint(slug, &["commits", reference])?)
    }

    fn create_release(&self, slug: &RepoSlug, release: &NewRelease) -> Result<Release, ApiError> {
        self.post(&self.endpoint(slug, &["releases"])?, release)
    }
}

fn transport(url: &Url, err: &ureq::Error) -> ApiError {
    ApiError::Transport {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

fn read_response<T: DeserializeOwned>(
    url: &Url,
    response: ureq::http::Response<ureq::Body>,
) -> Result<T, ApiError> {
    let status = response.status().as_u16();
    let body = response
        .into_body()
        .read_to_string()
        .map_err(|e| transport(url, &e))?;
    if !(200..300).contains(&status) {
        return Err(classify(url.as_str(), status, &body));
    }
    serde_json::from_str(&body).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Map a non-2xx response to an [`ApiError`].
fn classify(url: &str, status: u16, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = if parsed.message.is_empty() {
        body.trim().to_string()
    } else {
        parsed.summary()
    };
    match status {
        404 => ApiError::NotFound {
            url: url.to_string(),
        },
        422 => ApiError::Validation {
            url: url.to_string(),
            message,
            codes: parsed.codes(),
        },
        _ => ApiError::Status {
            url: url.to_string(),
            status,
            message,
        },
    }
}
