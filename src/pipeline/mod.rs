//! The dependency pipeline: executes a catalog in declared order.
//!
//! Each stage owns a fresh temporary workspace (removed when the stage
//! ends, success or failure), acquires its sources, and runs its build
//! commands sequentially with the shared prefix substituted in. The first
//! failure of any kind aborts the whole run: no stage is skipped, retried,
//! or reordered, and nothing already installed into the prefix is rolled
//! back.

pub mod acquire;

use std::path::Path;

use tempfile::TempDir;

use crate::catalog::{DependencyCatalog, DependencySpec};
use crate::error::Error;
use crate::util::fs::shared_libraries;
use crate::util::process::{CommandRunner, ProcessBuilder};

pub use acquire::{NetworkFetcher, SourceFetcher};

/// Executes dependency catalogs.
///
/// Holds the command runner and source fetcher seams so sequencing and
/// failure propagation can be tested without real toolchains or network.
pub struct DependencyPipeline<'a> {
    runner: &'a dyn CommandRunner,
    fetcher: &'a dyn SourceFetcher,
    rewrite_rpaths: bool,
}

impl<'a> DependencyPipeline<'a> {
    /// Create a pipeline with the real network fetcher.
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        DependencyPipeline {
            runner,
            fetcher: &NetworkFetcher,
            rewrite_rpaths: false,
        }
    }

    /// Replace the source fetcher.
    pub fn with_fetcher(mut self, fetcher: &'a dyn SourceFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Rewrite shared-library RPATHs to `$ORIGIN` after the catalog
    /// completes. Only meaningful on Linux, where the bundled libraries
    /// must find each other next to the extension at load time.
    pub fn with_rpath_rewrite(mut self, rewrite: bool) -> Self {
        self.rewrite_rpaths = rewrite;
        self
    }

    /// Run every spec in catalog order against the shared prefix.
    ///
    /// Re-running re-fetches and re-builds everything from scratch; there
    /// is no skip-if-exists shortcut.
    pub fn run(&self, catalog: &DependencyCatalog, prefix: &Path) -> Result<(), Error> {
        for (index, spec) in catalog.specs().iter().enumerate() {
            tracing::info!(
                "Building {} {} ({}/{})",
                spec.name,
                spec.version,
                index + 1,
                catalog.len()
            );
            self.run_stage(spec, prefix)?;
        }

        if self.rewrite_rpaths {
            self.patch_rpaths(prefix)?;
        }

        Ok(())
    }

    /// Run one stage inside its own scoped workspace.
    fn run_stage(&self, spec: &DependencySpec, prefix: &Path) -> Result<(), Error> {
        // The TempDir guard removes the workspace whether or not the stage
        // succeeds.
        let workspace = TempDir::new().map_err(|e| Error::Acquisition {
            dependency: spec.name.clone(),
            message: format!("failed to create stage workspace: {}", e),
        })?;

        let source_dir = self.fetcher.fetch(spec, workspace.path())?;

        for step in &spec.steps {
            let (program, args) = step.render(prefix);
            let cmd = ProcessBuilder::new(&program).args(&args).cwd(&source_dir);

            tracing::debug!("Running `{}`", cmd.display_command());

            let output = self.runner.run(&cmd).map_err(|e| Error::Build {
                dependency: spec.name.clone(),
                command: cmd.display_command(),
                code: None,
                stderr: format!("{:#}", e),
            })?;

            if !output.success() {
                return Err(Error::Build {
                    dependency: spec.name.clone(),
                    command: cmd.display_command(),
                    code: output.code,
                    stderr: output.stderr,
                });
            }
        }

        Ok(())
    }

    /// Force every shared library in the prefix to look up its neighbors
    /// via `$ORIGIN`, so the bundle is relocatable.
    fn patch_rpaths(&self, prefix: &Path) -> Result<(), Error> {
        let lib_dir = prefix.join("lib");
        let libs = shared_libraries(&lib_dir).map_err(|e| Error::Build {
            dependency: "rpath".to_string(),
            command: "patchelf".to_string(),
            code: None,
            stderr: format!("{:#}", e),
        })?;

        for lib in libs {
            let cmd = ProcessBuilder::new("patchelf")
                .args(["--set-rpath", "$ORIGIN"])
                .arg(&lib)
                .cwd(&lib_dir);

            let output = self.runner.run(&cmd).map_err(|e| Error::Build {
                dependency: "rpath".to_string(),
                command: cmd.display_command(),
                code: None,
                stderr: format!("{:#}", e),
            })?;

            if !output.success() {
                return Err(Error::Build {
                    dependency: "rpath".to_string(),
                    command: cmd.display_command(),
                    code: output.code,
                    stderr: output.stderr,
                });
            }
        }

        Ok(())
    }
}
