mod checker;
mod entrypoint;
mod errors;
mod judgement;
mod judger;
mod languages;
mod runner;
mod submission;
mod verdict;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::checker::CompareMode;
use crate::judgement::{
    CommandFeed, JudgeState, JudgementSession, PollConfig, PollOutcome, StatusTable,
    SubmissionPoller,
};
use crate::judger::SampleTestHarness;
use crate::languages::{LanguageConfig, LanguageRegistry};
use crate::submission::{normalize_files, SubmissionHandle};
use crate::verdict::Verdict;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("judge_client=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    // `watch <submission-url> [token]` tracks an uploaded submission;
    // anything else tests the solution in the given (or current) folder.
    let ok = match args.get(1).map(String::as_str) {
        Some("watch") => {
            let url = args
                .get(2)
                .cloned()
                .context("usage: judge-client watch <submission-url> [token]")?;
            let token = args.get(3).cloned().unwrap_or_default();
            watch_submission(url, token).await?
        }
        _ => {
            let problem_dir = args
                .get(1)
                .map(PathBuf::from)
                .unwrap_or(std::env::current_dir()?);
            let language_arg = args.get(2).cloned();
            test_solution(&problem_dir, language_arg).await?
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Poll a submission's status endpoint until the judge settles.
///
/// The transport is an external command (curl by default) so credentials
/// and cookie handling stay with the user's tooling.
async fn watch_submission(url: String, token: String) -> Result<bool> {
    let template = std::env::var("STATUS_FEED_CMD")
        .unwrap_or_else(|_| "curl -s -b EduSiteCookie={token} {url}?json".to_string());
    let template: Vec<String> = template.split_whitespace().map(String::from).collect();

    let mut config = PollConfig::default();
    if let Some(ms) = env_u64("POLL_INTERVAL_MS") {
        config.interval = Duration::from_millis(ms);
    }
    if let Some(attempts) = env_u64("POLL_MAX_ATTEMPTS") {
        config.max_attempts = attempts as u32;
    }

    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        cancel_tx.send(true).ok();
    });

    let mut table = StatusTable::default();
    if let Some(last_pending) = env_u64("STATUS_LAST_PENDING") {
        table.last_pending = last_pending as i32;
    }

    let poller = SubmissionPoller::new(CommandFeed::new(template), config)
        .with_table(table)
        .with_cancel(cancel_rx);
    let mut session = JudgementSession::new(SubmissionHandle::new(url.clone(), token, ""));
    let handle = session.handle().clone();

    let outcome = poller
        .poll_with(&handle, |snapshot| {
            let label_changed = session
                .latest()
                .map(|prev| prev.label != snapshot.label)
                .unwrap_or(true);
            if label_changed {
                println!("JUDGEMENT: {}  TESTCASES: {}", snapshot.label, snapshot.row.test_status);
            }
            session.observe(snapshot);
        })
        .await?;

    match outcome {
        PollOutcome::Terminal(snapshot) => {
            println!(
                "JUDGEMENT: {}  RUNTIME: {}  TESTCASES: {}",
                snapshot.label, snapshot.row.runtime, snapshot.row.test_status
            );
            println!("Details: {}", url);
            Ok(snapshot.state == JudgeState::Accepted)
        }
        PollOutcome::Cancelled(last) => {
            match last {
                Some(snapshot) => println!("Aborted while {}.", snapshot.label),
                None => println!("Aborted before the first status arrived."),
            }
            Ok(false)
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

async fn test_solution(problem_dir: &PathBuf, language_arg: Option<String>) -> Result<bool> {
    // Language table: shipped defaults, overridable like the sample data path
    let registry = match std::env::var("LANGUAGES_CONFIG") {
        Ok(path) => {
            info!("Loading language configurations from {}", path);
            LanguageRegistry::from_file(&path)?
        }
        Err(_) => LanguageRegistry::builtin()?,
    };

    let problem_id = problem_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let sources = collect_sources(problem_dir, &registry)?;
    let config = resolve_language(&registry, &sources, language_arg.as_deref())?;
    info!(language = %config.id, problem = %problem_id, "testing solution");

    let files: Vec<PathBuf> = sources
        .iter()
        .filter(|f| {
            f.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| config.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        })
        .cloned()
        .collect();
    anyhow::ensure!(
        !files.is_empty(),
        "no {} source files in {}",
        config.id,
        problem_dir.display()
    );

    let entry = entrypoint::resolve(config, &files, &problem_id);
    if let Some(mainclass) = &entry.mainclass {
        info!("Mainclass: {}", mainclass);
    } else {
        info!("Main file: {}", entry.file.display());
    }

    let precision = std::env::var("COMPARE_PRECISION")
        .ok()
        .and_then(|p| p.parse::<f64>().ok());
    let harness = SampleTestHarness::new(CompareMode::from_precision(precision));

    let data_dir = problem_dir.join("data");
    let samples = SampleTestHarness::discover(&data_dir)?;
    println!("Sample data folder: {}", data_dir.display());
    println!("Total {} input/output sample(s) found.", samples.len());

    let report = harness.run_all(config, &entry, &files, samples).await?;

    for result in &report.results {
        let mark = match result.verdict {
            Verdict::Pass => "ok",
            Verdict::Fail => "FAIL",
            Verdict::Indeterminate => "n/a",
        };
        println!("  {:<20} {}", result.case.input_name(), mark);
    }
    println!("{}/{} tests passed.", report.passed, report.total);
    if report.is_submit_ready() {
        println!("All samples passed. Time to submit!");
    } else {
        println!("Check the failing samples and keep trying.");
    }

    Ok(report.is_submit_ready())
}

/// Source files in the problem folder with a recognized extension,
/// deduplicated and sorted
fn collect_sources(problem_dir: &PathBuf, registry: &LanguageRegistry) -> Result<Vec<PathBuf>> {
    let names: Vec<String> = std::fs::read_dir(problem_dir)
        .with_context(|| format!("Failed to read {}", problem_dir.display()))?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();

    let files = names
        .iter()
        .filter(|name| {
            PathBuf::from(name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| registry.guess_by_extension(ext, &names).is_some())
        })
        .map(|name| problem_dir.join(name))
        .collect::<Vec<_>>();

    let files = normalize_files(files);
    anyhow::ensure!(
        !files.is_empty(),
        "no source files found in {}",
        problem_dir.display()
    );
    Ok(files)
}

/// Explicit language argument, or a guess from the first file's extension
fn resolve_language<'r>(
    registry: &'r LanguageRegistry,
    sources: &[PathBuf],
    language_arg: Option<&str>,
) -> Result<&'r LanguageConfig> {
    if let Some(language) = language_arg {
        return Ok(registry.get(language)?);
    }
    let names: Vec<String> = sources
        .iter()
        .map(|f| f.to_string_lossy().into_owned())
        .collect();
    let ext = sources
        .first()
        .and_then(|f| f.extension())
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    registry
        .guess_by_extension(ext, &names)
        .with_context(|| format!("could not guess language from extension {:?}", ext))
}
