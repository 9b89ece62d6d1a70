//! slipway - a native dependency build orchestrator.
//!
//! This crate fetches, builds, and installs a chain of pinned native
//! libraries into a shared install prefix, then compiles a binding
//! extension against the resulting headers and archives using
//! platform-specific search paths.

pub mod catalog;
pub mod compiler;
pub mod error;
pub mod lifecycle;
pub mod pipeline;
pub mod platform;
pub mod util;

/// Test doubles for slipway unit tests.
///
/// Only available when compiling tests. Provides a scripted command
/// runner and a stub source fetcher.
#[cfg(test)]
pub mod test_support;

pub use catalog::{Acquisition, BuildStep, DependencyCatalog, DependencySpec};
pub use error::Error;
pub use lifecycle::{Lifecycle, LifecycleOptions};
pub use pipeline::DependencyPipeline;
pub use platform::{OsFamily, PlatformConfig, PlatformProfile};
