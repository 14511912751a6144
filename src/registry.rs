//! Publish status lookup.
//!
//! [`PublishStatusSource`] answers "which version does the registry report
//! for `name@version`?". [`NpmCli`] answers it by running the package
//! manager; an HTTP client against the registry could slot in the same way.

use anyhow::Context;

use crate::manifest::Package;
use crate::subprocess::Tool;

/// Something that can report the published version string for `name@version`.
#[cfg_attr(test, mockall::automock)]
pub trait PublishStatusSource {
    /// The registry's version string, or an error when the registry has no
    /// such version or could not be asked.
    fn published_version(&self, name: &str, version: &str) -> anyhow::Result<String>;
}

/// Queries the registry through `<program> view -- <name>@<version> version`.
#[derive(Debug, Clone)]
pub struct NpmCli {
    program: String,
}

impl NpmCli {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Default for NpmCli {
    fn default() -> Self {
        Self::new("npm")
    }
}

impl PublishStatusSource for NpmCli {
    fn published_version(&self, name: &str, version: &str) -> anyhow::Result<String> {
        let selector = format!("{name}@{version}");
        // `--` keeps a manifest name starting with `-` from being read as an option.
        let output = Tool::new(&self.program)
            .args(&["view", "--"])
            .arg(&selector)
            .arg("version")
            .run_ok()
            .with_context(|| format!("querying {selector}"))?;
        Ok(output.stdout)
    }
}

/// True only when the registry reports exactly `pkg.version`.
///
/// Any lookup failure counts as "not published": a missing version and an
/// unreachable registry look the same from here.
pub fn is_published(source: &impl PublishStatusSource, pkg: &Package) -> bool {
    match source.published_version(&pkg.name, &pkg.version) {
        Ok(reported) => {
            let published = reported.trim() == pkg.version.trim();
            tracing::debug!(name = %pkg.name, version = %pkg.version, reported = %reported.trim(), published, "registry lookup");
            published
        }
        Err(e) => {
            tracing::debug!(name = %pkg.name, version = %pkg.version, error = %format!("{e:#}"), "registry lookup failed; treating as unpublished");
            false
        }
    }
}
