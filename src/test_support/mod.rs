//! Test doubles for slipway unit tests.
//!
//! Provides a scripted command runner and a stub source fetcher so
//! pipeline sequencing and lifecycle ordering can be exercised without
//! invoking real toolchains or touching the network.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;

use crate::catalog::DependencySpec;
use crate::error::Error;
use crate::pipeline::SourceFetcher;
use crate::util::process::{CommandRunner, ExecOutput, ProcessBuilder};

/// Canned output for a scripted command.
#[derive(Debug, Clone)]
pub struct ScriptedOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptedOutput {
    /// A zero-exit output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        ScriptedOutput {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A non-zero exit with the given stderr.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        ScriptedOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    fn to_exec(&self) -> ExecOutput {
        ExecOutput {
            code: self.code,
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

/// Command runner that never spawns processes.
///
/// Every invocation is recorded (command line plus working directory) and
/// succeeds unless a registered substring matches it.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    failures: Vec<(String, ScriptedOutput)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    /// A runner where every command exits zero.
    pub fn succeed_all() -> Self {
        ScriptedRunner::default()
    }

    /// Return the scripted output for any command whose rendered form
    /// contains `substring`.
    pub fn fail_when(&mut self, substring: impl Into<String>, output: ScriptedOutput) {
        self.failures.push((substring.into(), output));
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn render(cmd: &ProcessBuilder) -> String {
        match cmd.get_cwd() {
            Some(cwd) => format!("{} [cwd={}]", cmd.display_command(), cwd.display()),
            None => cmd.display_command(),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<ExecOutput> {
        let rendered = Self::render(cmd);
        self.calls.lock().unwrap().push(rendered.clone());

        for (pattern, output) in &self.failures {
            if rendered.contains(pattern.as_str()) {
                return Ok(output.to_exec());
            }
        }

        Ok(ScriptedOutput::success("").to_exec())
    }
}

/// Source fetcher that fabricates an empty source directory.
#[derive(Debug, Default)]
pub struct StubFetcher {
    fail_for: Vec<String>,
}

impl StubFetcher {
    /// Make acquisition fail for the named dependency, simulating an
    /// unreachable network.
    pub fn fail_for(mut self, name: impl Into<String>) -> Self {
        self.fail_for.push(name.into());
        self
    }
}

impl SourceFetcher for StubFetcher {
    fn fetch(&self, spec: &DependencySpec, dest: &Path) -> Result<PathBuf, Error> {
        if self.fail_for.iter().any(|n| n == &spec.name) {
            return Err(Error::Acquisition {
                dependency: spec.name.clone(),
                message: "network unreachable".to_string(),
            });
        }

        let dir = dest.join(&spec.name);
        std::fs::create_dir_all(&dir).map_err(|e| Error::Acquisition {
            dependency: spec.name.clone(),
            message: e.to_string(),
        })?;
        Ok(dir)
    }
}
