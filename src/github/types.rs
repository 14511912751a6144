//! Wire types for the subset of the GitHub REST API this tool touches.
//!
//! Only the fields that are read are declared; everything else in the
//! response is ignored by serde.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub default_branch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: Commit,
}

/// Commit reference. Both `/branches/{b}` (nested) and `/commits/{ref}`
/// carry the SHA under `sha`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Commit {
    pub sha: String,
}

/// Response of `/contents/{path}` for a file. Files above the API's size
/// limit come back with an empty `content` and encoding `none`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileContent {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_commitish: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub html_url: String,
}

/// Body of `POST /repos/{owner}/{repo}/releases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelease {
    pub tag_name: String,
    pub name: String,
    pub target_commitish: String,
    pub draft: bool,
    pub prerelease: bool,
}

/// Error payload returned with 4xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

impl ErrorBody {
    /// Machine-readable `code` of each entry in `errors`.
    pub fn codes(&self) -> Vec<String> {
        self.errors
            .iter()
            .filter_map(|e| e.get("code").and_then(serde_json::Value::as_str))
            .map(str::to_string)
            .collect()
    }

    /// `message` followed by any per-field details.
    pub fn summary(&self) -> String {
        let details: Vec<String> = self
            .errors
            .iter()
            .filter_map(|e| match e {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Object(_) => {
                    let field = e.get("field").and_then(serde_json::Value::as_str);
                    let code = e
                        .get("code")
                        .and_then(serde_json::Value::as_str)
                        .or_else(|| e.get("message").and_then(serde_json::Value::as_str));
                    match (field, code) {
                        (Some(f), Some(c)) => Some(format!("{f} {c}")),
                        (None, Some(c)) => Some(c.to_string()),
                        _ => None,
                    }
                }
                _ => None,
            })
            .collect();
        if details.is_empty() {
            self.message.clone()
        } else {
            format!("{} ({})", self.message, details.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_response_nests_commit_sha() {
        let json = r#"{"name": "main", "commit": {"sha": "66dfa0ff3b377a5f521c755c8b13c9f57905e096", "url": "x"}, "protected": false}"#;
        let branch: Branch = serde_json::from_str(json).unwrap();
        assert_eq!(branch.name, "main");
        assert_eq!(branch.commit.sha, "66dfa0ff3b377a5f521c755c8b13c9f57905e096");
    }

    #[test]
    fn release_tolerates_null_name() {
        let json = r#"{"id": 7, "tag_name": "v1.0.1", "name": null, "draft": true, "prerelease": false, "html_url": "https://github.com/o/r/releases/tag/v1.0.1"}"#;
        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "v1.0.1");
        assert_eq!(release.name, None);
        assert!(release.draft);
    }

    #[test]
    fn new_release_serializes_platform_field_names() {
        let body = NewRelease {
            tag_name: "v1.0.1".into(),
            name: "Release v1.0.1".into(),
            target_commitish: "abc".into(),
            draft: true,
            prerelease: false,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["tag_name"], "v1.0.1");
        assert_eq!(value["name"], "Release v1.0.1");
        assert_eq!(value["target_commitish"], "abc");
        assert_eq!(value["draft"], true);
        assert_eq!(value["prerelease"], false);
    }

    #[test]
    fn error_body_summary_includes_field_codes() {
        let json = r#"{"message": "Validation Failed", "errors": [{"resource": "Release", "code": "already_exists", "field": "tag_name"}]}"#;
        let body: ErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.codes(), vec!["already_exists".to_string()]);
        assert_eq!(body.summary(), "Validation Failed (tag_name already_exists)");
    }

    #[test]
    fn error_body_summary_without_details_is_message() {
        let body: ErrorBody = serde_json::from_str(r#"{"message": "Not Found"}"#).unwrap();
        assert!(body.codes().is_empty());
        assert_eq!(body.summary(), "Not Found");
    }
}
