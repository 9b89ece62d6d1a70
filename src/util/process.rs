//! Subprocess execution utilities.
//!
//! External build tools (cmake, make, patchelf, the C++ compiler) are
//! described by [`ProcessBuilder`] and executed via the [`CommandRunner`]
//! trait. The trait exists so the pipeline's sequencing and failure
//! propagation can be unit-tested with a scripted runner instead of real
//! multi-minute toolchain invocations.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Builder describing one external command invocation.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the working directory, if set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Display the full command line for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Captured result of one command invocation.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    /// Whether the command exited zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes [`ProcessBuilder`] commands.
pub trait CommandRunner {
    /// Run the command to completion, capturing output.
    ///
    /// An `Err` means the command could not be started at all (missing
    /// program, bad working directory). A command that ran and exited
    /// non-zero is `Ok` with a failing [`ExecOutput`].
    fn run(&self, cmd: &ProcessBuilder) -> Result<ExecOutput>;
}

/// Runner that spawns real subprocesses, blocking until completion.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<ExecOutput> {
        let mut command = Command::new(cmd.get_program());
        command.args(cmd.get_args());
        if let Some(cwd) = cmd.get_cwd() {
            command.current_dir(cwd);
        }
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let output = command
            .output()
            .with_context(|| format!("failed to spawn `{}`", cmd.display_command()))?;

        Ok(ExecOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find a C++ compiler for the extension build.
///
/// Checks the `CXX` environment variable first, then common driver names.
pub fn find_cxx_compiler() -> Option<PathBuf> {
    if let Ok(cxx) = std::env::var("CXX") {
        if let Some(path) = find_executable(&cxx) {
            return Some(path);
        }
    }

    for compiler in &["c++", "g++", "clang++", "cl"] {
        if let Some(path) = find_executable(compiler) {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("cmake").args(["-B", "build", "-DCMAKE_BUILD_TYPE=Release"]);

        assert_eq!(
            pb.display_command(),
            "cmake -B build -DCMAKE_BUILD_TYPE=Release"
        );
    }

    #[test]
    fn test_system_runner_captures_output() {
        let output = SystemRunner
            .run(&ProcessBuilder::new("echo").arg("hello"))
            .unwrap();

        assert!(output.success());
        assert!(output.stdout.contains("hello"));
    }

    #[test]
    fn test_system_runner_spawn_failure_is_err() {
        let result = SystemRunner.run(&ProcessBuilder::new("slipway-no-such-tool"));
        assert!(result.is_err());
    }

    #[test]
    fn test_nonzero_exit_is_ok_with_failing_output() {
        let output = SystemRunner
            .run(&ProcessBuilder::new("sh").args(["-c", "exit 3"]))
            .unwrap();

        assert!(!output.success());
        assert_eq!(output.code, Some(3));
    }
}
