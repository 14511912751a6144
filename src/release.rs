//! Release lookup and creation on the hosting platform.

use crate::config::ReleaseOptions;
use crate::github::types::{NewRelease, Release};
use crate::github::{ApiError, ReleaseHost};
use crate::manifest::Package;
use crate::slug::RepoSlug;

/// Largest page the releases listing accepts. Only the first page is scanned.
pub const RELEASES_PER_PAGE: u8 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    #[error("release tag {tag} already exists in {slug}")]
    TagExists {
        tag: String,
        slug: String,
        #[source]
        source: ApiError,
    },

    #[error("creating release {tag} in {slug}")]
    Create {
        tag: String,
        slug: String,
        #[source]
        source: ApiError,
    },

    #[error("listing releases of {slug}")]
    List {
        slug: String,
        #[source]
        source: ApiError,
    },

    #[error("resolving release tag {tag} in {slug}")]
    Resolve {
        tag: String,
        slug: String,
        #[source]
        source: ApiError,
    },
}

/// Tag of the first listed release whose tag points at `commit`.
///
/// A repository without releases (or one the platform reports as missing)
/// yields `None`. Releases whose tag cannot be resolved, such as drafts
/// whose tag was never pushed, are skipped. Other failures are returned.
pub fn find_release_tag(
    host: &impl ReleaseHost,
    slug: &RepoSlug,
    commit: &str,
) -> Result<Option<String>, ReleaseError> {
    let releases = match host.list_releases(slug, RELEASES_PER_PAGE, 1) {
        Ok(releases) => releases,
        Err(e) if e.is_not_found() => {
            tracing::debug!(%slug, "no releases listing");
            return Ok(None);
        }
        Err(source) => {
            return Err(ReleaseError::List {
                slug: slug.to_string(),
                source,
            });
        }
    };

    for release in releases {
        match host.commit(slug, &release.tag_name) {
            Ok(resolved) if resolved.sha == commit => return Ok(Some(release.tag_name)),
            Ok(_) => {}
            Err(e) if is_unresolvable(&e) => {
                tracing::debug!(tag = %release.tag_name, error = %e, "skipping release with unresolvable tag");
            }
            Err(source) => {
                return Err(ReleaseError::Resolve {
                    tag: release.tag_name,
                    slug: slug.to_string(),
                    source,
                });
            }
        }
    }
    Ok(None)
}

/// 404 for a deleted tag, 422 for a ref the platform cannot parse as a commit.
const fn is_unresolvable(e: &ApiError) -> bool {
    matches!(e, ApiError::NotFound { .. } | ApiError::Validation { .. })
}

/// Request body for releasing `pkg`: tag `v<version>` at the manifest's commit.
pub fn new_release(pkg: &Package, options: ReleaseOptions) -> NewRelease {
    NewRelease {
        tag_name: format!("v{}", pkg.version),
        name: format!("Release v{}", pkg.version),
        target_commitish: pkg.commit.clone(),
        draft: options.draft,
        prerelease: pkg.is_prerelease(),
    }
}

/// Create the release for `pkg`. Fails, without retrying, if the tag exists.
pub fn create_release(
    host: &impl ReleaseHost,
    slug: &RepoSlug,
    pkg: &Package,
    options: ReleaseOptions,
) -> Result<Release, ReleaseError> {
    let request = new_release(pkg, options);
    tracing::info!(%slug, tag = %request.tag_name, draft = request.draft, prerelease = request.prerelease, "creating release");
    host.create_release(slug, &request).map_err(|source| {
        let tag = request.tag_name.clone();
        let slug = slug.to_string();
        if source.has_code("already_exists") {
            ReleaseError::TagExists { tag, slug, source }
        } else {
            ReleaseError::Create { tag, slug, source }
        }
    })
}
