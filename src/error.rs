//! Error taxonomy for the dependency pipeline and extension build.
//!
//! Every error here is fatal: nothing in slipway retries, falls back, or
//! swallows a failure. The CLI layer converts these into a non-zero exit
//! with the underlying tool output intact.

use thiserror::Error;

/// Render an optional exit code for error messages.
fn code_str(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "signal".to_string(),
    }
}

/// Fatal errors raised by the platform resolver, pipeline, and compiler.
#[derive(Debug, Error)]
pub enum Error {
    /// The host OS family is not one slipway knows how to build on.
    /// There is no guessed default profile.
    #[error(
        "unsupported platform `{family}`\n\
         \n\
         slipway can build on Unix-like systems (Linux, macOS, BSD) and Windows."
    )]
    UnsupportedPlatform { family: String },

    /// Fetching a dependency's sources failed (download, extraction, clone).
    #[error("failed to acquire sources for `{dependency}`: {message}")]
    Acquisition { dependency: String, message: String },

    /// A configure/build/install command exited non-zero.
    #[error(
        "build of `{dependency}` failed: `{command}` exited with {}\n{stderr}",
        code_str(.code)
    )]
    Build {
        dependency: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The extension compile/link step failed. The toolchain's output is
    /// reported verbatim.
    #[error("failed to compile extension: `{command}` exited with {}\n{stderr}", code_str(.code))]
    Compile {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}
