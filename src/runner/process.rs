//! Process runner implementation
//!
//! Launches compile and run steps directly as child processes. Each sample
//! is an independent invocation; nothing is shared between runs. Children
//! are spawned with `kill_on_drop` so an aborted attempt never leaves an
//! orphan behind.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{CommandSpec, RunOutcome, Runner};
use crate::entrypoint::Entry;
use crate::languages::LanguageConfig;

/// Runner that executes compile and run commands as plain child processes
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run the language's compile command over the source files.
    ///
    /// Only call when the config carries a compile template. The file list
    /// replaces a `{files}` placeholder, or is appended when the template
    /// has none.
    pub async fn compile(
        &self,
        config: &LanguageConfig,
        files: &[std::path::PathBuf],
    ) -> Result<RunOutcome> {
        let template = config
            .compile_command
            .as_deref()
            .unwrap_or_default();
        let command = expand_compile(template, files);
        debug!(language = %config.id, "compiling with {:?}", command);

        let spec = CommandSpec::from_vec(&command);
        self.launch(&spec, None).await
    }

    /// Run the candidate program against one sample input file
    pub async fn run(
        &self,
        config: &LanguageConfig,
        entry: &Entry,
        input_file: &Path,
    ) -> Result<RunOutcome> {
        let command = expand_run(&config.run_command, entry);
        debug!(
            language = %config.id,
            input = %input_file.display(),
            "running {:?}",
            command
        );

        let spec = CommandSpec::from_vec(&command);
        self.launch(&spec, Some(input_file)).await
    }

    /// Spawn one child, feed stdin from the given file, drain both pipes.
    ///
    /// `wait_with_output` reads stdout and stderr concurrently, so a child
    /// that fills one pipe while we read the other cannot deadlock us.
    async fn launch(&self, spec: &CommandSpec, stdin_file: Option<&Path>) -> Result<RunOutcome> {
        let input = match stdin_file {
            Some(path) => Some(
                tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read input file {}", path.display()))?,
            ),
            None => None,
        };

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.work_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn {}", spec.program))?;

        if let Some(input) = input {
            if let Some(mut stdin) = child.stdin.take() {
                // The child may exit without reading all of its input;
                // a broken pipe here is not an error.
                let _ = stdin.write_all(&input).await;
            }
        }

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("Failed to wait for {}", spec.program))?;

        Ok(RunOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Substitute the source file list into a compile template
fn expand_compile(template: &[String], files: &[std::path::PathBuf]) -> Vec<String> {
    let file_args = || files.iter().map(|f| f.display().to_string());
    let mut command = Vec::with_capacity(template.len() + files.len());
    let mut substituted = false;
    for token in template {
        if token == "{files}" {
            command.extend(file_args());
            substituted = true;
        } else {
            command.push(token.clone());
        }
    }
    if !substituted {
        command.extend(file_args());
    }
    command
}

/// Substitute the resolved entry descriptor into a run template
fn expand_run(template: &[String], entry: &Entry) -> Vec<String> {
    let mainfile = entry.file.display().to_string();
    let mainclass = entry.mainclass.clone().unwrap_or_default();
    template
        .iter()
        .map(|token| {
            token
                .replace("{mainfile}", &mainfile)
                .replace("{mainclass}", &mainclass)
        })
        .collect()
}

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(&self, cmd: &CommandSpec, stdin_file: Option<&Path>) -> Result<RunOutcome> {
        self.launch(cmd, stdin_file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn entry(file: &str) -> Entry {
        Entry {
            file: PathBuf::from(file),
            mainclass: None,
        }
    }

    #[test]
    fn test_expand_compile_with_placeholder() {
        let template = vec!["g++".into(), "-O2".into(), "{files}".into()];
        let files = vec![PathBuf::from("a.cpp"), PathBuf::from("b.cpp")];
        assert_eq!(
            expand_compile(&template, &files),
            vec!["g++", "-O2", "a.cpp", "b.cpp"]
        );
    }

    #[test]
    fn test_expand_compile_appends_without_placeholder() {
        let template = vec!["javac".into()];
        let files = vec![PathBuf::from("Main.java")];
        assert_eq!(expand_compile(&template, &files), vec!["javac", "Main.java"]);
    }

    #[test]
    fn test_expand_run_substitutes_mainfile() {
        let template = vec!["python3".into(), "{mainfile}".into()];
        assert_eq!(
            expand_run(&template, &entry("sol.py")),
            vec!["python3", "sol.py"]
        );
    }

    #[test]
    fn test_expand_run_substitutes_mainclass() {
        let template = vec!["java".into(), "{mainclass}".into()];
        let entry = Entry {
            file: PathBuf::from("Solver.java"),
            mainclass: Some("Solver".into()),
        };
        assert_eq!(expand_run(&template, &entry), vec!["java", "Solver"]);
    }

    #[tokio::test]
    async fn test_launch_feeds_stdin_and_captures_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sample.in");
        writeln!(std::fs::File::create(&input).unwrap(), "hello").unwrap();

        let runner = ProcessRunner::new();
        let spec = CommandSpec::new("cat");
        let outcome = runner.launch(&spec, Some(&input)).await.unwrap();
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout, "hello\n");
        assert!(outcome.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_launch_reports_nonzero_exit() {
        let runner = ProcessRunner::new();
        let spec = CommandSpec::new("false");
        let outcome = runner.launch(&spec, None).await.unwrap();
        assert_ne!(outcome.exit_code, 0);
        assert_eq!(outcome.comparison_text(), outcome.stderr);
    }
}
