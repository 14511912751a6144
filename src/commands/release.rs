use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use crate::config::{self, ApiConfig, ReleaseOptions};
use crate::github::types::Release;
use crate::github::{GitHub, ReleaseHost};
use crate::manifest::{self, MANIFEST_FILE, Package};
use crate::registry::{self, NpmCli, PublishStatusSource};
use crate::release;
use crate::slug::RepoSlug;

#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Repository as <owner>/<repo>. Defaults to the local package.json's
    /// repository, then its package name without the leading `@`.
    pub repository: Option<String>,

    /// Directory inside the repository that holds package.json
    #[arg(long, default_value = "")]
    pub path: String,

    /// Local manifest consulted when no repository is given
    #[arg(long, default_value = MANIFEST_FILE)]
    pub manifest: PathBuf,

    /// API base URL
    #[arg(long, env = config::API_URL_ENV)]
    pub api_url: Option<String>,

    /// API token
    #[arg(long, env = config::TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,

    /// Create a published release instead of a draft
    #[arg(long)]
    pub no_draft: bool,

    /// Package manager used to query the registry
    #[arg(long, default_value = "npm")]
    pub registry_client: String,
}

/// What the run decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    AlreadyPublished,
    AlreadyReleased { tag: String },
    Created(Release),
}

impl ReleaseArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let slug = RepoSlug::resolve(self.repository.as_deref(), &self.manifest)?;
        let host = GitHub::new(ApiConfig::new(self.api_url.clone(), self.token.clone()));
        let registry = NpmCli::new(&self.registry_client);
        let options = ReleaseOptions {
            draft: !self.no_draft,
        };

        let _span = tracing::info_span!("release", %slug).entered();
        run_release(
            &host,
            &registry,
            &slug,
            &self.path,
            options,
            &mut std::io::stderr(),
        )?;
        Ok(())
    }
}

/// Fetch the manifest, then create a release unless the version is already
/// published or its commit already carries a release. Notices go to `notices`.
pub fn run_release(
    host: &impl ReleaseHost,
    registry: &impl PublishStatusSource,
    slug: &RepoSlug,
    sub_path: &str,
    options: ReleaseOptions,
    notices: &mut impl Write,
) -> anyhow::Result<Outcome> {
    let pkg = manifest::fetch_package(host, slug, sub_path)?;

    if registry::is_published(registry, &pkg) {
        writeln!(
            notices,
            "{} version {} is already published to npm",
            pkg.name, pkg.version
        )?;
        return Ok(Outcome::AlreadyPublished);
    }

    if let Some(tag) = release::find_release_tag(host, slug, &pkg.commit)? {
        writeln!(
            notices,
            "{} version {} is already released as tag {tag}",
            pkg.name, pkg.version
        )?;
        return Ok(Outcome::AlreadyReleased { tag });
    }

    let created = release::create_release(host, slug, &pkg, options)?;
    report_created(notices, &pkg, &created)?;
    Ok(Outcome::Created(created))
}

fn report_created(notices: &mut impl Write, pkg: &Package, release: &Release) -> std::io::Result<()> {
    let kind = match (release.draft, release.prerelease) {
        (true, true) => "draft prerelease",
        (true, false) => "draft release",
        (false, true) => "prerelease",
        (false, false) => "release",
    };
    writeln!(
        notices,
        "created {kind} {} for {} at {}",
        release.tag_name, pkg.name, pkg.commit
    )?;
    if !release.html_url.is_empty() {
        println!("{}", release.html_url);
    }
    Ok(())
}
