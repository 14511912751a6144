//! Remote `package.json` snapshot.
//!
//! A [`Package`] is read once per run from the repository's default branch
//! and never modified afterwards.

use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use crate::github::{ApiError, ReleaseHost};
use crate::slug::RepoSlug;

pub const MANIFEST_FILE: &str = "package.json";

/// Distribution tag used when the manifest has no `publishConfig.tag`.
pub const DEFAULT_NPM_TAG: &str = "latest";

/// The package as declared on the default branch, plus the commit it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub description: String,
    pub commit: String,
    pub npmtag: String,
}

impl Package {
    /// Anything other than the `latest` channel is a prerelease.
    pub fn is_prerelease(&self) -> bool {
        self.npmtag != DEFAULT_NPM_TAG
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("unsupported content encoding {0:?}")]
    UnsupportedEncoding(String),

    #[error("invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid hex content: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("content is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("{path} is not a valid package manifest: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    name: String,
    version: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "publishConfig")]
    publish_config: Option<PublishConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct PublishConfig {
    #[serde(default)]
    tag: Option<String>,
}

/// Path of the manifest below `sub_path`, with empty segments dropped.
///
/// ```
/// use npm_release_check::manifest::manifest_path;
///
/// assert_eq!(manifest_path(""), "package.json");
/// assert_eq!(manifest_path("/packages//core/"), "packages/core/package.json");
/// ```
pub fn manifest_path(sub_path: &str) -> String {
    sub_path
        .split('/')
        .chain(std::iter::once(MANIFEST_FILE))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode file content by the encoding the platform reported.
pub fn decode_content(content: &str, encoding: &str) -> Result<String, ManifestError> {
    let bytes = match encoding.to_ascii_lowercase().as_str() {
        // The API wraps base64 at 60 columns.
        "base64" => STANDARD.decode(strip_whitespace(content))?,
        "hex" => hex::decode(strip_whitespace(content))?,
        "" | "utf-8" | "utf8" | "none" => return Ok(content.to_string()),
        other => return Err(ManifestError::UnsupportedEncoding(other.to_string())),
    };
    Ok(String::from_utf8(bytes)?)
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}

fn parse_manifest(path: &str, text: &str) -> Result<RawManifest, ManifestError> {
    serde_json::from_str(text).map_err(|source| ManifestError::Json {
        path: path.to_string(),
        source,
    })
}

/// Tip commit of the repository's default branch.
pub fn latest_commit(host: &impl ReleaseHost, slug: &RepoSlug) -> Result<String, ApiError> {
    let repository = host.repository(slug)?;
    let branch = host.branch(slug, &repository.default_branch)?;
    tracing::debug!(branch = %branch.name, sha = %branch.commit.sha, "resolved default branch");
    Ok(branch.commit.sha)
}

/// Read `package.json` (below `sub_path`) from the default branch and pair it
/// with the branch's tip commit.
pub fn fetch_package(
    host: &impl ReleaseHost,
    slug: &RepoSlug,
    sub_path: &str,
) -> anyhow::Result<Package> {
    let path = manifest_path(sub_path);
    let file = host
        .file_content(slug, &path)
        .with_context(|| format!("fetching {path} from {slug}"))?;
    let text = decode_content(&file.content, &file.encoding)
        .with_context(|| format!("decoding {path} from {slug}"))?;
    let raw = parse_manifest(&path, &text)?;
    let commit =
        latest_commit(host, slug).with_context(|| format!("resolving latest commit of {slug}"))?;

    let npmtag = raw
        .publish_config
        .and_then(|p| p.tag)
        .unwrap_or_else(|| DEFAULT_NPM_TAG.to_string());
    tracing::info!(name = %raw.name, version = %raw.version, %npmtag, %commit, "read remote manifest");

    Ok(Package {
        name: raw.name,
        version: raw.version,
        description: raw.description.unwrap_or_default(),
        commit,
        npmtag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::MockReleaseHost;
    use crate::github::types::{Branch, Commit, FileContent, Repository};

    const SHA: &str = "66dfa0ff3b377a5f521c755c8b13c9f57905e096";

    fn slug() -> RepoSlug {
        RepoSlug::parse("xutl-es/release").unwrap()
    }

    fn host_serving(manifest: &str) -> MockReleaseHost {
        let encoded = STANDARD.encode(manifest);
        // Mimic the API's line wrapping.
        let wrapped = encoded
            .as_bytes()
            .chunks(60)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");

        let mut host = MockReleaseHost::new();
        host.expect_file_content()
            .withf(|_, path| path == "package.json")
            .returning(move |_, path| {
                Ok(FileContent {
                    path: path.to_string(),
                    content: wrapped.clone(),
                    encoding: "base64".into(),
                })
            });
        host.expect_repository().returning(|_| {
            Ok(Repository {
                full_name: "xutl-es/release".into(),
                default_branch: "main".into(),
            })
        });
        host.expect_branch()
            .withf(|_, branch| branch == "main")
            .returning(|_, branch| {
                Ok(Branch {
                    name: branch.to_string(),
                    commit: Commit { sha: SHA.into() },
                })
            });
        host
    }

    #[test]
    fn manifest_path_joins_sub_path() {
        assert_eq!(manifest_path(""), "package.json");
        assert_eq!(manifest_path("/"), "package.json");
        assert_eq!(manifest_path("packages/core"), "packages/core/package.json");
        assert_eq!(manifest_path("/packages//core/"), "packages/core/package.json");
    }

    #[test]
    fn decode_base64_with_line_breaks() {
        let text = decode_content("eyJhIjoi\nYiJ9\n", "base64").unwrap();
        assert_eq!(text, r#"{"a":"b"}"#);
    }

    #[test]
    fn decode_hex_and_plain() {
        assert_eq!(decode_content("7b7d", "hex").unwrap(), "{}");
        assert_eq!(decode_content("{}", "utf-8").unwrap(), "{}");
        assert_eq!(decode_content("{}", "UTF8").unwrap(), "{}");
    }

    #[test]
    fn decode_rejects_unknown_encoding() {
        let err = decode_content("{}", "rot13").unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedEncoding(e) if e == "rot13"));
    }

    #[test]
    fn decode_rejects_corrupt_base64() {
        assert!(matches!(
            decode_content("!!!", "base64").unwrap_err(),
            ManifestError::Base64(_)
        ));
    }

    #[test]
    fn fetch_package_reads_fields_and_commit() {
        let host = host_serving(
            r#"{"name": "@xutl/release", "version": "1.0.1", "description": "Release helper"}"#,
        );
        let pkg = fetch_package(&host, &slug(), "").unwrap();
        assert_eq!(pkg.name, "@xutl/release");
        assert_eq!(pkg.version, "1.0.1");
        assert_eq!(pkg.description, "Release helper");
        assert_eq!(pkg.commit, SHA);
        assert_eq!(pkg.npmtag, "latest");
        assert!(!pkg.is_prerelease());
    }

    #[test]
    fn fetch_package_reads_publish_tag() {
        let host = host_serving(
            r#"{"name": "@xutl/release", "version": "2.0.0-beta.1", "publishConfig": {"tag": "beta", "access": "public"}}"#,
        );
        let pkg = fetch_package(&host, &slug(), "").unwrap();
        assert_eq!(pkg.npmtag, "beta");
        assert!(pkg.is_prerelease());
        assert_eq!(pkg.description, "");
    }

    #[test]
    fn fetch_package_accepts_null_description() {
        let host = host_serving(r#"{"name": "@xutl/release", "version": "1.0.1", "description": null}"#);
        let pkg = fetch_package(&host, &slug(), "").unwrap();
        assert_eq!(pkg.description, "");
    }

    #[test]
    fn fetch_package_is_repeatable() {
        let host = host_serving(r#"{"name": "@xutl/release", "version": "1.0.1"}"#);
        let first = fetch_package(&host, &slug(), "").unwrap();
        let second = fetch_package(&host, &slug(), "").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn fetch_package_rejects_invalid_json() {
        let host = host_serving("not json");
        let err = fetch_package(&host, &slug(), "").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::Json { .. })
        ));
    }

    #[test]
    fn fetch_package_propagates_not_found() {
        let mut host = MockReleaseHost::new();
        host.expect_file_content().returning(|_, path| {
            Err(ApiError::NotFound {
                url: format!("https://api.github.com/repos/xutl-es/release/contents/{path}"),
            })
        });
        host.expect_repository().never();
        let err = fetch_package(&host, &slug(), "missing").unwrap_err();
        let api = err.downcast_ref::<ApiError>().unwrap();
        assert!(api.is_not_found());
        assert!(format!("{err:#}").contains("missing/package.json"));
    }

    #[test]
    fn latest_commit_follows_default_branch() {
        let host = host_serving("{}");
        assert_eq!(latest_commit(&host, &slug()).unwrap(), SHA);
    }

    #[test]
    #[ignore = "requires network access to api.github.com"]
    fn fetches_live_manifest() {
        let gh = crate::github::GitHub::new(crate::config::ApiConfig::new(
            None,
            std::env::var(crate::config::TOKEN_ENV).ok(),
        ));
        let pkg = fetch_package(&gh, &slug(), "").unwrap();
        assert_eq!(pkg.name, "@xutl/release");
        assert!(!pkg.version.is_empty());
        assert_eq!(pkg.commit.len(), 40);
        assert!(!pkg.npmtag.is_empty());
    }
}
