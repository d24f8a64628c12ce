//! Runner module - Execution abstraction layer
//!
//! Provides a unified interface for launching the candidate program:
//! command templates are expanded here, one child process per invocation,
//! both output pipes captured.
//!
//! The runner module does NOT:
//! - Compare outputs or determine verdicts
//! - Discover sample files
//! - Know about the remote judge

pub mod process;

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Command specification for execution
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
    /// Working directory
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Create from a command vector (first element is program, rest are args)
    pub fn from_vec(cmd: &[String]) -> Self {
        let mut iter = cmd.iter();
        let program = iter.next().cloned().unwrap_or_default();
        let args: Vec<String> = iter.cloned().collect();
        Self {
            program,
            args,
            work_dir: None,
        }
    }

    /// Convert to a vector of strings (program + args)
    pub fn to_vec(&self) -> Vec<String> {
        let mut v = vec![self.program.clone()];
        v.extend(self.args.clone());
        v
    }
}

/// Outcome of running a program
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Exit code (-1 when the process was killed by a signal)
    pub exit_code: i32,
    /// Stdout content, decoded
    pub stdout: String,
    /// Stderr content, decoded
    pub stderr: String,
}

impl RunOutcome {
    /// Check if execution was successful
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Text to compare against the expected output: stderr when the run
    /// crashed, stdout otherwise
    pub fn comparison_text(&self) -> &str {
        if self.is_success() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Runner trait for executing commands
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run a command, optionally binding a file to its standard input
    async fn run(&self, cmd: &CommandSpec, stdin_file: Option<&Path>) -> Result<RunOutcome>;
}

// Re-exports
pub use process::ProcessRunner;
