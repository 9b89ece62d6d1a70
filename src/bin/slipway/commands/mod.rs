//! Command implementations.

pub mod build;
pub mod develop;
pub mod install;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use slipway::util::config::{project_config_path, Config};
use slipway::{Lifecycle, LifecycleOptions, PlatformConfig};

use crate::cli::CommonArgs;

/// Default extension source unit, relative to the project directory.
const DEFAULT_SOURCE: &str = "src/fcl/fcl.cpp";

/// Default shared install prefix, relative to the project directory.
const DEFAULT_PREFIX: &str = "src/fcl";

/// Default output directory, relative to the project directory.
const DEFAULT_OUT_DIR: &str = "build";

/// Merge CLI args over `slipway.toml` over defaults into lifecycle options.
pub fn resolve_options(args: &CommonArgs) -> Result<LifecycleOptions> {
    let project_dir = match &args.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to determine current directory")?,
    };

    let config = Config::load_or_default(&project_config_path(&project_dir))?;

    let prefix = resolve_path(&project_dir, args.prefix.as_ref(), config.paths.prefix.as_ref())
        .unwrap_or_else(|| project_dir.join(DEFAULT_PREFIX));
    let source = resolve_path(&project_dir, args.source.as_ref(), config.paths.source.as_ref())
        .unwrap_or_else(|| project_dir.join(DEFAULT_SOURCE));
    let out_dir = resolve_path(&project_dir, args.out_dir.as_ref(), config.paths.out_dir.as_ref())
        .unwrap_or_else(|| project_dir.join(DEFAULT_OUT_DIR));

    if !source.exists() {
        bail!("extension source not found: {}", source.display());
    }

    let mut platform = PlatformConfig::from_env(&prefix);
    if let Some(include_path) = &config.platform.include_path {
        platform.include_path = Some(match platform.include_path {
            Some(env) => format!("{env}:{include_path}"),
            None => include_path.clone(),
        });
    }
    if let Some(library_path) = &config.platform.library_path {
        platform.library_path = Some(match platform.library_path {
            Some(env) => format!("{env}:{library_path}"),
            None => library_path.clone(),
        });
    }

    Ok(LifecycleOptions {
        prefix,
        source,
        out_dir,
        platform,
        compiler: config.platform.cxx.clone(),
    })
}

fn resolve_path(
    project_dir: &std::path::Path,
    flag: Option<&PathBuf>,
    config: Option<&PathBuf>,
) -> Option<PathBuf> {
    flag.or(config).map(|p| {
        if p.is_absolute() {
            p.clone()
        } else {
            project_dir.join(p)
        }
    })
}

/// Build a lifecycle over the standard catalog and run one entry point.
pub fn with_lifecycle(
    args: &CommonArgs,
    entry: impl FnOnce(&mut Lifecycle<'_>) -> Result<PathBuf>,
) -> Result<()> {
    let opts = resolve_options(args)?;
    let runner = slipway::util::process::SystemRunner;
    let mut lifecycle = Lifecycle::new(
        slipway::DependencyCatalog::standard(),
        opts,
        &runner,
    );

    let artifact = entry(&mut lifecycle)?;
    eprintln!("Finished: {}", artifact.display());
    Ok(())
}
