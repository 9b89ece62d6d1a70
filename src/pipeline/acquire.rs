//! Source acquisition for pipeline stages.
//!
//! Two strategies exist: release tarballs downloaded over HTTPS and
//! extracted in place, and shallow git clones pinned to an exact tag.
//! There are no retries and no fallback sources; any failure aborts the
//! pipeline run.

use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use git2::{FetchOptions, ObjectType, Repository, ResetType};
use tar::Archive;

use crate::catalog::{Acquisition, DependencySpec};
use crate::error::Error;

/// Obtains a dependency's sources into a stage workspace.
///
/// The pipeline only ever talks to this trait, so sequencing tests can
/// substitute a fetcher that touches neither the network nor git.
pub trait SourceFetcher {
    /// Place the sources for `spec` under `dest` and return the directory
    /// the build steps should run in.
    fn fetch(&self, spec: &DependencySpec, dest: &Path) -> Result<PathBuf, Error>;
}

/// Fetcher backed by real HTTPS downloads and git clones.
#[derive(Debug, Default)]
pub struct NetworkFetcher;

impl SourceFetcher for NetworkFetcher {
    fn fetch(&self, spec: &DependencySpec, dest: &Path) -> Result<PathBuf, Error> {
        let source_dir = dest.join(&spec.name);

        let result = match &spec.acquisition {
            Acquisition::Archive { url, strip_prefix } => {
                fetch_archive(url, strip_prefix, &source_dir)
            }
            Acquisition::GitTag { url, tag } => clone_at_tag(url, tag, &source_dir),
        };

        result.map_err(|e| Error::Acquisition {
            dependency: spec.name.clone(),
            message: format!("{:#}", e),
        })?;

        Ok(source_dir)
    }
}

/// Download a `.tar.gz` release archive and extract it into `dest`.
fn fetch_archive(url: &str, strip_prefix: &str, dest: &Path) -> Result<()> {
    tracing::info!("Fetching archive from {}", url);

    let response = reqwest::blocking::get(url)
        .with_context(|| format!("failed to download {}", url))?;

    if !response.status().is_success() {
        bail!("failed to download {}: HTTP {}", url, response.status());
    }

    let bytes = response
        .bytes()
        .context("failed to read archive response body")?;

    extract_tar_gz(&bytes, dest, strip_prefix)
        .with_context(|| format!("failed to extract archive from {}", url))?;

    tracing::debug!("Extracted archive to {}", dest.display());
    Ok(())
}

/// Extract a gzipped tarball, stripping the leading `strip_prefix`
/// directory from every entry.
pub(crate) fn extract_tar_gz(data: &[u8], dest: &Path, strip_prefix: &str) -> Result<()> {
    let decoder = GzDecoder::new(Cursor::new(data));
    let mut archive = Archive::new(decoder);

    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create directory: {}", dest.display()))?;

    for entry in archive.entries().context("failed to read archive entries")? {
        let mut entry = entry.context("failed to read archive entry")?;
        let entry_path = entry.path().context("failed to get entry path")?.into_owned();

        let stripped = match entry_path.strip_prefix(strip_prefix) {
            Ok(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            // The prefix directory itself, or a file outside it.
            _ => continue,
        };

        if stripped
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            bail!(
                "archive entry escapes destination directory: {}",
                entry_path.display()
            );
        }

        let output_path = dest.join(&stripped);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        entry
            .unpack(&output_path)
            .with_context(|| format!("failed to extract: {}", output_path.display()))?;
    }

    Ok(())
}

/// Shallow-clone a repository pinned to an exact tag.
///
/// Fetches only the tag's ref at depth 1, then hard-resets the worktree to
/// the tagged commit.
fn clone_at_tag(url: &str, tag: &str, dest: &Path) -> Result<()> {
    tracing::info!("Cloning {} at {}", url, tag);

    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create directory: {}", dest.display()))?;

    let repo = Repository::init(dest).context("failed to initialize repository")?;
    let mut remote = repo
        .remote("origin", url)
        .with_context(|| format!("failed to add remote {}", url))?;

    let refspec = format!("+refs/tags/{tag}:refs/tags/{tag}");
    let mut opts = FetchOptions::new();
    opts.depth(1);
    remote
        .fetch(&[refspec.as_str()], Some(&mut opts), None)
        .with_context(|| format!("failed to fetch {} from {}", tag, url))?;

    let object = repo
        .revparse_single(&format!("refs/tags/{tag}"))
        .with_context(|| format!("tag {} not found in {}", tag, url))?;
    let commit = object
        .peel(ObjectType::Commit)
        .with_context(|| format!("tag {} does not point at a commit", tag))?;

    repo.reset(&commit, ResetType::Hard, None)
        .context("failed to check out tagged commit")?;

    Ok(())
}
