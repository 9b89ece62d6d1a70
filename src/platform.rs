//! Platform profile resolution.
//!
//! Classifies the host OS into one of the recognized families and produces
//! the include directories, library directories, and link-library names the
//! extension compile needs. Resolution is a pure function of an explicit
//! [`PlatformConfig`] record; the environment is only consulted in
//! [`PlatformConfig::from_env`].

use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::util::process::{CommandRunner, ProcessBuilder};

/// Install prefix used on Windows, relative to the project directory.
pub const WINDOWS_INSTALL_PREFIX: &str = "deps\\install";

/// Recognized host OS families.
///
/// Anything else is a hard [`Error::UnsupportedPlatform`]; there is no
/// guessed default profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    /// Linux, macOS, and the BSDs.
    Unix,
    /// Windows, which builds against a fixed local install prefix.
    Windows,
}

impl OsFamily {
    /// Classify an OS name as reported by `std::env::consts::OS`.
    pub fn classify(os: &str) -> Result<Self, Error> {
        match os {
            "linux" | "macos" | "freebsd" | "netbsd" | "openbsd" | "dragonfly" => Ok(OsFamily::Unix),
            "windows" => Ok(OsFamily::Windows),
            other => Err(Error::UnsupportedPlatform {
                family: other.to_string(),
            }),
        }
    }
}

/// Explicit input record for platform resolution.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// OS name (`std::env::consts::OS` form).
    pub os: String,

    /// Root of the package tree the dependencies install into; its
    /// `include/` and `lib/` subtrees shadow the system paths.
    pub package_root: PathBuf,

    /// Colon-separated extra include roots (the `CPATH` contents).
    pub include_path: Option<String>,

    /// Colon-separated extra library roots (the `LD_LIBRARY_PATH` contents).
    pub library_path: Option<String>,

    /// Include directory of the numeric-array library, appended last.
    pub numeric_include: Option<PathBuf>,
}

impl PlatformConfig {
    /// Build a config for the current process environment.
    ///
    /// This is the only place slipway reads `CPATH` and `LD_LIBRARY_PATH`.
    pub fn from_env(package_root: impl Into<PathBuf>) -> Self {
        PlatformConfig {
            os: std::env::consts::OS.to_string(),
            package_root: package_root.into(),
            include_path: std::env::var("CPATH").ok(),
            library_path: std::env::var("LD_LIBRARY_PATH").ok(),
            numeric_include: None,
        }
    }

    /// Set the numeric-array include directory.
    pub fn with_numeric_include(mut self, dir: Option<PathBuf>) -> Self {
        self.numeric_include = dir;
        self
    }
}

/// Resolved search paths and link targets for the extension compile.
///
/// Recomputed on every invocation; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
    pub include_dirs: Vec<PathBuf>,
    pub lib_dirs: Vec<PathBuf>,
    pub lib_names: Vec<String>,
}

/// Resolve a [`PlatformProfile`] for the given config.
///
/// Path precedence is fixed: package-local paths first (so a vendored
/// header always shadows a system one of the same name), then standard
/// system roots, then any env-supplied extras, with the numeric include
/// appended last.
pub fn resolve(config: &PlatformConfig) -> Result<PlatformProfile, Error> {
    match OsFamily::classify(&config.os)? {
        OsFamily::Unix => Ok(resolve_unix(config)),
        OsFamily::Windows => Ok(resolve_windows(config)),
    }
}

fn resolve_unix(config: &PlatformConfig) -> PlatformProfile {
    let root = &config.package_root;

    let mut include_dirs = vec![
        root.join("include"),
        root.join("include/eigen3"),
        PathBuf::from("/usr/include"),
        PathBuf::from("/usr/local/include"),
        PathBuf::from("/usr/include/eigen3"),
        PathBuf::from("/usr/local/include/eigen3"),
    ];
    include_dirs.extend(split_path_list(config.include_path.as_deref()));

    let mut lib_dirs = vec![
        root.join("lib"),
        PathBuf::from("/usr/lib"),
        PathBuf::from("/usr/local/lib"),
    ];
    lib_dirs.extend(split_path_list(config.library_path.as_deref()));

    if let Some(numeric) = &config.numeric_include {
        include_dirs.push(numeric.clone());
    }

    PlatformProfile {
        include_dirs,
        lib_dirs,
        lib_names: vec!["fcl".to_string(), "octomap".to_string()],
    }
}

fn resolve_windows(config: &PlatformConfig) -> PlatformProfile {
    let prefix = Path::new(WINDOWS_INSTALL_PREFIX);

    let mut include_dirs = vec![prefix.join("include"), prefix.join("include").join("eigen3")];

    if let Some(numeric) = &config.numeric_include {
        include_dirs.push(numeric.clone());
    }

    PlatformProfile {
        include_dirs,
        lib_dirs: vec![prefix.join("lib")],
        // vcruntime is required only on this family.
        lib_names: vec![
            "fcl".to_string(),
            "octomap".to_string(),
            "octomath".to_string(),
            "ccd".to_string(),
            "vcruntime".to_string(),
        ],
    }
}

fn split_path_list(list: Option<&str>) -> Vec<PathBuf> {
    list.map(|l| {
        l.split(':')
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Ask the host Python where the NumPy headers live.
///
/// NumPy is an external collaborator here: the binding extension includes
/// its array headers, and only the interpreter knows where they are. A
/// missing interpreter or missing NumPy yields `None` and the compile
/// proceeds without that include root.
pub fn numeric_include_dir(runner: &dyn CommandRunner) -> Option<PathBuf> {
    let cmd = ProcessBuilder::new("python3").args([
        "-c",
        "import numpy; print(numpy.get_include())",
    ]);

    match runner.run(&cmd) {
        Ok(output) if output.success() => {
            let dir = output.stdout.trim();
            if dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            }
        }
        Ok(output) => {
            tracing::warn!(
                "could not locate numpy headers: {}",
                output.stderr.trim()
            );
            None
        }
        Err(e) => {
            tracing::warn!("could not locate numpy headers: {:#}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unix_config() -> PlatformConfig {
        PlatformConfig {
            os: "linux".to_string(),
            package_root: PathBuf::from("/project/src/fcl"),
            include_path: None,
            library_path: None,
            numeric_include: None,
        }
    }

    #[test]
    fn test_classify_families() {
        assert_eq!(OsFamily::classify("linux").unwrap(), OsFamily::Unix);
        assert_eq!(OsFamily::classify("macos").unwrap(), OsFamily::Unix);
        assert_eq!(OsFamily::classify("freebsd").unwrap(), OsFamily::Unix);
        assert_eq!(OsFamily::classify("windows").unwrap(), OsFamily::Windows);
    }

    #[test]
    fn test_unknown_family_is_unsupported() {
        let err = OsFamily::classify("solaris").unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform { family } if family == "solaris"));
    }

    #[test]
    fn test_unknown_family_produces_no_profile() {
        let mut config = unix_config();
        config.os = "wasi".to_string();

        assert!(resolve(&config).is_err());
    }

    #[test]
    fn test_unix_package_local_paths_come_first() {
        let profile = resolve(&unix_config()).unwrap();

        assert_eq!(profile.include_dirs[0], Path::new("/project/src/fcl/include"));
        assert_eq!(
            profile.include_dirs[1],
            Path::new("/project/src/fcl/include/eigen3")
        );
        assert_eq!(profile.lib_dirs[0], Path::new("/project/src/fcl/lib"));

        // System roots follow, never precede.
        let sys_pos = profile
            .include_dirs
            .iter()
            .position(|p| p == Path::new("/usr/include"))
            .unwrap();
        assert!(sys_pos > 1);
    }

    #[test]
    fn test_env_extras_come_after_system_paths() {
        let mut config = unix_config();
        config.include_path = Some("/opt/a/include:/opt/b/include".to_string());
        config.library_path = Some("/opt/a/lib".to_string());

        let profile = resolve(&config).unwrap();

        assert_eq!(
            profile.include_dirs.last().unwrap(),
            Path::new("/opt/b/include")
        );
        assert_eq!(profile.lib_dirs.last().unwrap(), Path::new("/opt/a/lib"));
    }

    #[test]
    fn test_numeric_include_is_last() {
        let mut config = unix_config();
        config.include_path = Some("/opt/extra/include".to_string());
        config.numeric_include = Some(PathBuf::from("/site/numpy/core/include"));

        let profile = resolve(&config).unwrap();
        assert_eq!(
            profile.include_dirs.last().unwrap(),
            Path::new("/site/numpy/core/include")
        );
    }

    #[test]
    fn test_empty_path_list_entries_are_skipped() {
        let mut config = unix_config();
        config.include_path = Some(":/opt/include:".to_string());

        let profile = resolve(&config).unwrap();
        assert!(!profile.include_dirs.iter().any(|p| p.as_os_str().is_empty()));
        assert!(profile
            .include_dirs
            .contains(&PathBuf::from("/opt/include")));
    }

    #[test]
    fn test_windows_uses_fixed_prefix_and_extra_libs() {
        let mut config = unix_config();
        config.os = "windows".to_string();

        let profile = resolve(&config).unwrap();
        assert_eq!(
            profile.include_dirs[0],
            Path::new(WINDOWS_INSTALL_PREFIX).join("include")
        );
        assert_eq!(
            profile.lib_dirs,
            vec![Path::new(WINDOWS_INSTALL_PREFIX).join("lib")]
        );
        assert!(profile.lib_names.contains(&"vcruntime".to_string()));
        assert!(profile.lib_names.contains(&"ccd".to_string()));
    }

    #[test]
    fn test_unix_lib_names() {
        let profile = resolve(&unix_config()).unwrap();
        assert_eq!(profile.lib_names, vec!["fcl", "octomap"]);
    }
}
