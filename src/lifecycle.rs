//! Lifecycle integration: the three packaging entry points.
//!
//! A full install, a build-only invocation, and an editable/development
//! install all need the same mandatory pre-step: the dependency pipeline
//! must have run to completion before the extension compiles. Each entry
//! point is a thin adapter over one orchestration path, and the pipeline
//! runs exactly once per [`Lifecycle`] no matter which (or how many)
//! entry points are invoked on it.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::catalog::DependencyCatalog;
use crate::compiler::{artifact_name, bundle_runtime, ExtensionCompiler};
use crate::pipeline::{DependencyPipeline, NetworkFetcher, SourceFetcher};
use crate::platform::{self, numeric_include_dir, OsFamily, PlatformConfig};
use crate::util::fs::ensure_dir;
use crate::util::process::CommandRunner;

/// Inputs shared by every entry point.
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Shared install prefix the whole catalog builds into.
    pub prefix: PathBuf,

    /// The binding-extension source unit.
    pub source: PathBuf,

    /// Where `install` and `build` place the compiled extension.
    pub out_dir: PathBuf,

    /// Platform resolution input.
    pub platform: PlatformConfig,

    /// C++ compiler override.
    pub compiler: Option<PathBuf>,
}

/// Orchestrates pipeline, platform resolution, and extension compilation.
pub struct Lifecycle<'a> {
    catalog: DependencyCatalog,
    opts: LifecycleOptions,
    runner: &'a dyn CommandRunner,
    fetcher: Box<dyn SourceFetcher + 'a>,
    deps_ready: bool,
}

impl<'a> Lifecycle<'a> {
    pub fn new(
        catalog: DependencyCatalog,
        opts: LifecycleOptions,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Lifecycle {
            catalog,
            opts,
            runner,
            fetcher: Box::new(NetworkFetcher),
            deps_ready: false,
        }
    }

    /// Replace the pipeline's source fetcher (used by tests). The fetcher
    /// is kept for the lifetime of the lifecycle, so a pipeline run that
    /// fails is retried through the same fetcher.
    pub fn with_fetcher(mut self, fetcher: Box<dyn SourceFetcher + 'a>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Full install: pipeline, compile, then stage the runtime bundle
    /// (headers and shared libraries) alongside the extension.
    pub fn install(&mut self) -> Result<PathBuf> {
        let out_dir = self.opts.out_dir.clone();
        let artifact = self.run_to_artifact(&out_dir)?;
        let bundled = bundle_runtime(&self.opts.prefix, &out_dir)?;
        tracing::info!(
            "Installed {} with {} bundled libraries",
            artifact.display(),
            bundled.len()
        );
        Ok(artifact)
    }

    /// Build-only: pipeline, then compile into the output directory.
    pub fn build(&mut self) -> Result<PathBuf> {
        let out_dir = self.opts.out_dir.clone();
        self.run_to_artifact(&out_dir)
    }

    /// Editable/development install: pipeline, then compile the extension
    /// in place next to its source, with the runtime bundle beside it.
    pub fn develop(&mut self) -> Result<PathBuf> {
        let out_dir = self
            .opts
            .source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let artifact = self.run_to_artifact(&out_dir)?;
        bundle_runtime(&self.opts.prefix, &out_dir)?;
        Ok(artifact)
    }

    /// The one orchestration path every entry point goes through.
    fn run_to_artifact(&mut self, out_dir: &Path) -> Result<PathBuf> {
        // Classify the platform up front: an unsupported host must fail
        // before any network or build activity.
        let family = OsFamily::classify(&self.opts.platform.os)?;

        self.ensure_dependencies()?;

        let platform_config = self.opts.platform.clone().with_numeric_include(
            self.opts
                .platform
                .numeric_include
                .clone()
                .or_else(|| numeric_include_dir(self.runner)),
        );
        let profile = platform::resolve(&platform_config)?;

        ensure_dir(out_dir)?;
        let output = out_dir.join(artifact_name(&self.opts.source, family));

        let artifact = ExtensionCompiler::new(self.runner)
            .with_compiler(self.opts.compiler.clone())
            .compile(&self.opts.source, &output, &profile, &self.opts.prefix, family)?;

        Ok(artifact)
    }

    /// Run the dependency pipeline if it hasn't run in this invocation.
    ///
    /// The pipeline is never skippable: the flag is only set after a fully
    /// successful run, so a failed run is re-attempted from scratch on the
    /// next entry-point call.
    fn ensure_dependencies(&mut self) -> Result<()> {
        if self.deps_ready {
            tracing::debug!("dependencies already provisioned in this invocation");
            return Ok(());
        }

        let pipeline = DependencyPipeline::new(self.runner)
            .with_rpath_rewrite(self.opts.platform.os == "linux")
            .with_fetcher(self.fetcher.as_ref());

        pipeline.run(&self.catalog, &self.opts.prefix)?;
        self.deps_ready = true;
        Ok(())
    }
}
