//! Extension compilation and runtime bundling.
//!
//! Compiles the one binding-extension source unit against the platform
//! profile's search paths plus the shared install prefix, then stages the
//! headers and shared libraries the extension needs at runtime next to it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::Error;
use crate::platform::{OsFamily, PlatformProfile};
use crate::util::fs::{copy_dir_all, ensure_dir, shared_libraries};
use crate::util::process::{find_cxx_compiler, CommandRunner, ProcessBuilder};

/// Language standard the extension is compiled at.
const CXX_STANDARD: &str = "-std=c++11";

/// Compiles the binding extension.
pub struct ExtensionCompiler<'a> {
    runner: &'a dyn CommandRunner,
    compiler: Option<PathBuf>,
}

impl<'a> ExtensionCompiler<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        ExtensionCompiler {
            runner,
            compiler: None,
        }
    }

    /// Use a specific compiler instead of `CXX`/PATH discovery.
    pub fn with_compiler(mut self, compiler: Option<PathBuf>) -> Self {
        self.compiler = compiler;
        self
    }

    /// Compile and link the extension module.
    ///
    /// Search paths come from the profile (already ordered) followed by
    /// the shared prefix's own include/lib subtrees. Any compiler or
    /// linker error is fatal and reported verbatim; no fallback flags are
    /// attempted.
    pub fn compile(
        &self,
        source: &Path,
        output: &Path,
        profile: &PlatformProfile,
        prefix: &Path,
        family: OsFamily,
    ) -> Result<PathBuf, Error> {
        let compiler = match &self.compiler {
            Some(c) => c.clone(),
            None => find_cxx_compiler().ok_or_else(|| Error::Compile {
                command: "c++".to_string(),
                code: None,
                stderr: "no C++ compiler found; install one or set CXX".to_string(),
            })?,
        };

        let mut cmd = ProcessBuilder::new(&compiler)
            .arg(CXX_STANDARD)
            .args(["-fPIC", "-shared"])
            .arg(source)
            .arg("-o")
            .arg(output);

        for dir in profile
            .include_dirs
            .iter()
            .chain([prefix.join("include"), prefix.join("include/eigen3")].iter())
        {
            cmd = cmd.arg(format!("-I{}", dir.display()));
        }

        for dir in profile.lib_dirs.iter().chain([prefix.join("lib")].iter()) {
            cmd = cmd.arg(format!("-L{}", dir.display()));
        }

        for name in &profile.lib_names {
            cmd = cmd.arg(format!("-l{}", name));
        }

        if family == OsFamily::Unix {
            // The bundled libraries live in lib/ next to the extension.
            cmd = cmd.arg("-Wl,-rpath,$ORIGIN/lib");
        }

        tracing::info!("Compiling extension {}", source.display());
        tracing::debug!("Running `{}`", cmd.display_command());

        let result = self.runner.run(&cmd).map_err(|e| Error::Compile {
            command: cmd.display_command(),
            code: None,
            stderr: format!("{:#}", e),
        })?;

        if !result.success() {
            return Err(Error::Compile {
                command: cmd.display_command(),
                code: result.code,
                stderr: result.stderr,
            });
        }

        Ok(output.to_path_buf())
    }
}

/// Artifact filename for a source unit, by family.
pub fn artifact_name(source: &Path, family: OsFamily) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "extension".to_string());

    match family {
        OsFamily::Unix => format!("{stem}.so"),
        OsFamily::Windows => format!("{stem}.pyd"),
    }
}

/// Stage the redistributable runtime next to the compiled extension: the
/// prefix's header tree and every shared library.
pub fn bundle_runtime(prefix: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let include_src = prefix.join("include");
    if include_src.exists() {
        copy_dir_all(&include_src, &out_dir.join("include"))?;
    }

    let lib_out = out_dir.join("lib");
    ensure_dir(&lib_out)?;

    let mut bundled = Vec::new();
    for lib in shared_libraries(&prefix.join("lib"))? {
        let name = lib
            .file_name()
            .context("shared library has no file name")?;
        let dest = lib_out.join(name);
        std::fs::copy(&lib, &dest)
            .with_context(|| format!("failed to copy {} to {}", lib.display(), dest.display()))?;
        bundled.push(dest);
    }

    tracing::info!(
        "Bundled {} shared libraries into {}",
        bundled.len(),
        lib_out.display()
    );

    Ok(bundled)
}
