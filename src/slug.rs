//! `owner/repo` resolution.
//!
//! The repository comes from the command line or, failing that, from the
//! local `package.json`: its `repository` field first, then its package name
//! with any leading `@` removed.

use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;

use crate::error::ExitError;

/// A repository on the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    /// Parse `owner/repo`. Exactly two non-empty segments are accepted.
    pub fn parse(input: &str) -> Result<Self, ExitError> {
        let malformed = || ExitError::MalformedRepository {
            given: input.to_string(),
        };
        let mut parts = input.trim().split('/');
        let (Some(owner), Some(repo), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };
        if owner.is_empty() || repo.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Resolve from an explicit argument, or from `manifest` when none was given.
    pub fn resolve(arg: Option<&str>, manifest: &Path) -> anyhow::Result<Self> {
        if let Some(arg) = arg {
            return Ok(Self::parse(arg)?);
        }
        let candidate = local_candidate(manifest)?.ok_or_else(|| ExitError::NoRepository {
            manifest: manifest.display().to_string(),
        })?;
        tracing::debug!(%candidate, manifest = %manifest.display(), "repository from local manifest");
        Ok(Self::parse(&candidate)?)
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Read the local manifest and derive an `owner/repo` candidate string.
/// Returns `Ok(None)` when the file is absent or names no repository.
fn local_candidate(manifest: &Path) -> anyhow::Result<Option<String>> {
    if !manifest.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(manifest)
        .with_context(|| format!("reading {}", manifest.display()))?;
    let pkg: Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", manifest.display()))?;

    let from_repository = pkg
        .get("repository")
        .and_then(|r| match r {
            Value::String(s) => Some(s.as_str()),
            Value::Object(_) => r.get("url").and_then(Value::as_str),
            _ => None,
        })
        .and_then(repository_path);
    if from_repository.is_some() {
        return Ok(from_repository);
    }

    Ok(pkg
        .get("name")
        .and_then(Value::as_str)
        .map(|name| name.trim_start_matches('@').to_string())
        .filter(|name| !name.is_empty()))
}

/// Extract the `owner/repo` part of a repository reference such as
/// `git+https://github.com/o/r.git`, `git@github.com:o/r.git`, `github:o/r`
/// or plain `o/r`.
fn repository_path(reference: &str) -> Option<String> {
    let reference = reference.trim();
    let path = if reference.contains("://") {
        url::Url::parse(reference).ok()?.path().to_string()
    } else if let Some((_, rest)) = reference.split_once(':') {
        rest.to_string()
    } else {
        reference.to_string()
    };
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    (!path.is_empty()).then(|| path.to_string())
}
