//! Sample test harness
//!
//! Runs one solution attempt against every discovered sample, in a fixed
//! lexicographic order, and builds the scoreboard that decides whether the
//! solution is worth submitting.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::checker::{outputs_match, CompareMode};
use crate::entrypoint::Entry;
use crate::errors::{Error, Result};
use crate::languages::LanguageConfig;
use crate::runner::ProcessRunner;
use crate::verdict::{SampleCase, TestReport, Verdict};

/// Orchestrates compile + run + compare for one attempt
pub struct SampleTestHarness {
    runner: ProcessRunner,
    mode: CompareMode,
}

impl SampleTestHarness {
    pub fn new(mode: CompareMode) -> Self {
        Self {
            runner: ProcessRunner::new(),
            mode,
        }
    }

    /// Enumerate `*.in` files under the sample directory, pairing each with
    /// its `.ans` (or `.out`) neighbor when present.
    ///
    /// Zero inputs is fatal for the attempt; a missing expected file is not.
    pub fn discover(data_dir: &Path) -> Result<Vec<SampleCase>> {
        let mut inputs: Vec<PathBuf> = match std::fs::read_dir(data_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "in"))
                .collect(),
            Err(_) => Vec::new(),
        };
        if inputs.is_empty() {
            return Err(Error::NoSampleData(data_dir.to_path_buf()));
        }
        inputs.sort();

        let cases = inputs
            .into_iter()
            .map(|input| {
                let expected = ["ans", "out"]
                    .iter()
                    .map(|ext| input.with_extension(ext))
                    .find(|p| p.is_file());
                SampleCase { input, expected }
            })
            .collect();
        Ok(cases)
    }

    /// Compile once when the language requires it, then run every sample.
    ///
    /// A non-zero compile exit aborts the attempt before any sample runs. A
    /// failing sample keeps the harness going, unless its stderr carries the
    /// language's fatal parse-error signature, in which case the remaining
    /// samples would fail identically and are skipped.
    pub async fn run_all(
        &self,
        config: &LanguageConfig,
        entry: &Entry,
        files: &[PathBuf],
        samples: Vec<SampleCase>,
    ) -> Result<TestReport> {
        if samples.is_empty() {
            return Err(Error::NoSampleData(PathBuf::new()));
        }

        if config.needs_compile() {
            let outcome = self
                .runner
                .compile(config, files)
                .await
                .map_err(|e| Error::Process(format!("{:#}", e)))?;
            if !outcome.is_success() {
                return Err(Error::Compile {
                    stderr: outcome.stderr,
                });
            }
            info!(language = %config.id, "compiled successfully");
        }

        let mut report = TestReport::new(samples.len());

        for case in samples {
            let outcome = self
                .runner
                .run(config, entry, &case.input)
                .await
                .map_err(|e| Error::Process(format!("{:#}", e)))?;

            let verdict = match &case.expected {
                Some(expected_path) => {
                    let expected = tokio::fs::read_to_string(expected_path).await?;
                    if outputs_match(&expected, outcome.comparison_text(), self.mode) {
                        Verdict::Pass
                    } else {
                        Verdict::Fail
                    }
                }
                None => Verdict::Indeterminate,
            };
            debug!(sample = %case.input_name(), verdict = %verdict, "sample evaluated");

            let fatal = !outcome.is_success()
                && config
                    .fatal_signature
                    .as_deref()
                    .is_some_and(|sig| outcome.stderr.contains(sig));

            report.record(case, outcome, verdict);

            if fatal {
                warn!(language = %config.id, "fatal parse error, skipping remaining samples");
                break;
            }
        }

        info!(
            passed = report.passed,
            total = report.total,
            "sample run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn interpreted_config(execute: &str) -> LanguageConfig {
        LanguageConfig {
            id: "test".into(),
            name: "Test".into(),
            extensions: vec!["txt".into()],
            compile_command: None,
            run_command: execute.split_whitespace().map(String::from).collect(),
            mainfile_template: None,
            entry_kind: Default::default(),
            entry_marker: None,
            class_suffix: None,
            capitalize_class: false,
            fatal_signature: None,
        }
    }

    fn entry(file: &Path) -> Entry {
        Entry {
            file: file.to_path_buf(),
            mainclass: None,
        }
    }

    fn write_sample(data: &Path, name: &str, input: &str, ans: Option<&str>) {
        fs::write(data.join(format!("{name}.in")), input).unwrap();
        if let Some(ans) = ans {
            fs::write(data.join(format!("{name}.ans")), ans).unwrap();
        }
    }

    fn problem_dir() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        (dir, data)
    }

    #[test]
    fn test_discover_orders_and_pairs_samples() {
        let (_dir, data) = problem_dir();
        write_sample(&data, "2", "b\n", Some("b\n"));
        write_sample(&data, "1", "a\n", None);
        fs::write(data.join("1.out"), "a\n").unwrap();

        let cases = SampleTestHarness::discover(&data).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].input_name(), "1.in");
        // .out accepted when no .ans exists
        assert!(cases[0].expected.as_ref().unwrap().ends_with("1.out"));
        assert!(cases[1].expected.as_ref().unwrap().ends_with("2.ans"));
    }

    #[test]
    fn test_discover_empty_dir_is_fatal() {
        let (_dir, data) = problem_dir();
        assert!(matches!(
            SampleTestHarness::discover(&data),
            Err(Error::NoSampleData(_))
        ));
    }

    #[tokio::test]
    async fn test_squaring_program_passes_single_sample() {
        let (dir, data) = problem_dir();
        write_sample(&data, "1", "3\n", Some("9\n"));
        let program = dir.path().join("square.awk");
        fs::write(&program, "{ print $1 * $1 }\n").unwrap();

        let harness = SampleTestHarness::new(CompareMode::Exact);
        let config = interpreted_config("awk -f {mainfile}");
        let cases = SampleTestHarness::discover(&data).unwrap();
        let report = harness
            .run_all(&config, &entry(&program), &[program.clone()], cases)
            .await
            .unwrap();

        assert_eq!((report.passed, report.total), (1, 1));
        assert!(report.is_submit_ready());
    }

    #[tokio::test]
    async fn test_compile_error_runs_no_samples() {
        let (dir, data) = problem_dir();
        write_sample(&data, "1", "x\n", Some("x\n"));
        let program = dir.path().join("sol.txt");
        fs::write(&program, "").unwrap();

        let mut config = interpreted_config("cat");
        config.compile_command = Some(vec!["false".into()]);

        let harness = SampleTestHarness::new(CompareMode::Exact);
        let cases = SampleTestHarness::discover(&data).unwrap();
        let result = harness
            .run_all(&config, &entry(&program), &[program.clone()], cases)
            .await;
        assert!(matches!(result, Err(Error::Compile { .. })));
    }

    #[tokio::test]
    async fn test_missing_expected_file_is_indeterminate() {
        let (dir, data) = problem_dir();
        write_sample(&data, "1", "x\n", None);
        let program = dir.path().join("sol.txt");
        fs::write(&program, "").unwrap();

        let harness = SampleTestHarness::new(CompareMode::Exact);
        let config = interpreted_config("cat");
        let cases = SampleTestHarness::discover(&data).unwrap();
        let report = harness
            .run_all(&config, &entry(&program), &[program.clone()], cases)
            .await
            .unwrap();

        assert_eq!(report.results[0].verdict, Verdict::Indeterminate);
        assert_eq!((report.passed, report.total), (0, 1));
    }

    #[tokio::test]
    async fn test_crash_compares_stderr_and_fails() {
        let (dir, data) = problem_dir();
        write_sample(&data, "1", "x\n", Some("ok\n"));
        let program = dir.path().join("boom.sh");
        fs::write(&program, "echo boom >&2\nexit 3\n").unwrap();

        let harness = SampleTestHarness::new(CompareMode::Exact);
        let config = interpreted_config("sh {mainfile}");
        let cases = SampleTestHarness::discover(&data).unwrap();
        let report = harness
            .run_all(&config, &entry(&program), &[program.clone()], cases)
            .await
            .unwrap();

        assert_eq!(report.results[0].verdict, Verdict::Fail);
        assert_eq!(report.results[0].outcome.stderr, "boom\n");
    }

    #[tokio::test]
    async fn test_fatal_signature_short_circuits() {
        let (dir, data) = problem_dir();
        write_sample(&data, "1", "x\n", Some("ok\n"));
        write_sample(&data, "2", "y\n", Some("ok\n"));
        write_sample(&data, "3", "z\n", Some("ok\n"));
        let program = dir.path().join("broken.sh");
        fs::write(&program, "echo 'SyntaxError: bad token' >&2\nexit 1\n").unwrap();

        let harness = SampleTestHarness::new(CompareMode::Exact);
        let mut config = interpreted_config("sh {mainfile}");
        config.fatal_signature = Some("SyntaxError: ".into());
        let cases = SampleTestHarness::discover(&data).unwrap();
        let report = harness
            .run_all(&config, &entry(&program), &[program.clone()], cases)
            .await
            .unwrap();

        // First sample recorded, the rest skipped
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.total, 3);
        assert!(!report.is_submit_ready());
    }
}
