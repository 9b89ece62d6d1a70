//! Dependency catalog: declarative descriptions of the native libraries to
//! fetch, build, and install.
//!
//! Catalog order is the dependency order. Every spec's build steps install
//! into the one shared prefix, which is how a later stage finds headers
//! and libraries installed by an earlier one.

use std::path::Path;

/// Token substituted with the shared install prefix when a build step is
/// rendered for execution.
pub const PREFIX_TOKEN: &str = "{prefix}";

/// How a dependency's sources are obtained.
#[derive(Debug, Clone)]
pub enum Acquisition {
    /// Download a release tarball over HTTPS and extract it.
    Archive {
        /// Full URL with the pinned version baked in.
        url: String,
        /// Leading directory inside the archive to strip.
        strip_prefix: String,
    },

    /// Shallow clone pinned to an exact tag. Never a floating branch.
    GitTag { url: String, tag: String },
}

/// One build command, parameterized by the shared install prefix.
#[derive(Debug, Clone)]
pub struct BuildStep {
    program: String,
    args: Vec<String>,
}

impl BuildStep {
    /// Create a build step.
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        BuildStep {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Render the step against a concrete prefix, substituting
    /// [`PREFIX_TOKEN`] wherever it appears.
    pub fn render(&self, prefix: &Path) -> (String, Vec<String>) {
        let prefix = prefix.display().to_string();
        let args = self
            .args
            .iter()
            .map(|a| a.replace(PREFIX_TOKEN, &prefix))
            .collect();
        (self.program.clone(), args)
    }
}

/// One native dependency to build into the shared prefix.
#[derive(Debug, Clone)]
pub struct DependencySpec {
    /// Identity, used in error reports.
    pub name: String,

    /// Pinned version or tag, exact.
    pub version: String,

    /// How to obtain the sources.
    pub acquisition: Acquisition,

    /// Build commands, run in order from the source root.
    pub steps: Vec<BuildStep>,
}

/// Ordered sequence of dependency specs.
///
/// The order must respect the dependency partial order: no spec may build
/// before one whose installed outputs it needs.
#[derive(Debug, Clone)]
pub struct DependencyCatalog {
    specs: Vec<DependencySpec>,
}

impl DependencyCatalog {
    /// Create a catalog from an ordered list of specs.
    pub fn new(specs: Vec<DependencySpec>) -> Self {
        DependencyCatalog { specs }
    }

    /// The specs, in build order.
    pub fn specs(&self) -> &[DependencySpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// The standard fcl dependency chain.
    ///
    /// eigen is header-only and goes first; libccd and octomap are
    /// independent of each other; fcl links against both and goes last.
    pub fn standard() -> Self {
        let cmake_prefix = format!("-DCMAKE_INSTALL_PREFIX:PATH={}", PREFIX_TOKEN);

        DependencyCatalog::new(vec![
            DependencySpec {
                name: "eigen".to_string(),
                version: "3.3.9".to_string(),
                acquisition: Acquisition::Archive {
                    url: "https://gitlab.com/libeigen/eigen/-/archive/3.3.9/eigen-3.3.9.tar.gz"
                        .to_string(),
                    strip_prefix: "eigen-3.3.9".to_string(),
                },
                steps: vec![
                    BuildStep::new("cmake", [cmake_prefix.as_str(), "-B", "build"]),
                    BuildStep::new("cmake", ["--install", "build"]),
                ],
            },
            DependencySpec {
                name: "libccd".to_string(),
                version: "v2.1".to_string(),
                acquisition: Acquisition::GitTag {
                    url: "https://github.com/danfis/libccd.git".to_string(),
                    tag: "v2.1".to_string(),
                },
                steps: vec![
                    BuildStep::new(
                        "cmake",
                        [cmake_prefix.as_str(), "-DENABLE_DOUBLE_PRECISION=ON", "."],
                    ),
                    BuildStep::new("make", ["install", "-j8"]),
                ],
            },
            DependencySpec {
                name: "octomap".to_string(),
                version: "v1.9.8".to_string(),
                acquisition: Acquisition::GitTag {
                    url: "https://github.com/OctoMap/octomap.git".to_string(),
                    tag: "v1.9.8".to_string(),
                },
                steps: vec![
                    BuildStep::new(
                        "cmake",
                        [
                            "-DCMAKE_BUILD_TYPE=Release",
                            "-DBUILD_OCTOVIS_SUBPROJECT=OFF",
                            "-DBUILD_DYNAMICETD3D_SUBPROJECT=OFF",
                            cmake_prefix.as_str(),
                            ".",
                        ],
                    ),
                    BuildStep::new("make", ["install", "-j8"]),
                ],
            },
            DependencySpec {
                name: "fcl".to_string(),
                version: "v0.7.0".to_string(),
                acquisition: Acquisition::GitTag {
                    url: "https://github.com/ambi-robotics/fcl.git".to_string(),
                    tag: "v0.7.0".to_string(),
                },
                steps: vec![
                    BuildStep::new("cmake", [cmake_prefix.as_str(), "."]),
                    BuildStep::new("make", ["install", "-j8"]),
                ],
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_render_substitutes_prefix() {
        let step = BuildStep::new(
            "cmake",
            ["-DCMAKE_INSTALL_PREFIX:PATH={prefix}", "-B", "build"],
        );
        let (program, args) = step.render(&PathBuf::from("/tmp/out"));

        assert_eq!(program, "cmake");
        assert_eq!(args[0], "-DCMAKE_INSTALL_PREFIX:PATH=/tmp/out");
        assert_eq!(&args[1..], ["-B", "build"]);
    }

    #[test]
    fn test_render_leaves_plain_args_alone() {
        let step = BuildStep::new("make", ["install", "-j8"]);
        let (_, args) = step.render(&PathBuf::from("/tmp/out"));
        assert_eq!(args, ["install", "-j8"]);
    }

    #[test]
    fn test_standard_catalog_order() {
        let catalog = DependencyCatalog::standard();
        let names: Vec<_> = catalog.specs().iter().map(|s| s.name.as_str()).collect();

        // fcl links against libccd and octomap, both of which need eigen's
        // headers in the prefix, so the order is fixed.
        assert_eq!(names, ["eigen", "libccd", "octomap", "fcl"]);
    }

    #[test]
    fn test_standard_catalog_pins_exact_versions() {
        let catalog = DependencyCatalog::standard();

        for spec in catalog.specs() {
            match &spec.acquisition {
                Acquisition::Archive { url, .. } => {
                    assert!(url.contains(&spec.version), "unpinned url for {}", spec.name);
                }
                Acquisition::GitTag { tag, .. } => {
                    assert_eq!(tag, &spec.version, "unpinned tag for {}", spec.name);
                }
            }
        }
    }

    #[test]
    fn test_standard_catalog_shares_one_prefix() {
        let catalog = DependencyCatalog::standard();
        let prefix = PathBuf::from("/tmp/out");

        for spec in catalog.specs() {
            let installs: Vec<_> = spec
                .steps
                .iter()
                .map(|s| s.render(&prefix))
                .filter(|(_, args)| {
                    args.iter().any(|a| a.contains("/tmp/out"))
                })
                .collect();
            assert!(
                !installs.is_empty(),
                "{} never references the shared prefix",
                spec.name
            );
        }
    }
}
