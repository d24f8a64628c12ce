//! Submission verdict state machine
//!
//! After an upload, the judge exposes a status endpoint that reports a
//! numeric status code plus a rendered result fragment. This module decodes
//! both into structured judgements and drives the poll loop until the judge
//! reaches a terminal state.
//!
//! The transport itself is a collaborator behind the [`StatusFeed`] trait;
//! tests drive the poller with scripted feeds.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::{Error, Result};
use crate::submission::SubmissionHandle;

/// Coarse bucketing of judge status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeState {
    /// Received but not yet compiling
    Queued,
    Compiling,
    Running,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    RuntimeError,
    CompileError,
    JudgeError,
    SubmissionError,
    MemoryLimitExceeded,
    OutputLimitExceeded,
    IllegalOperation,
}

impl JudgeState {
    /// Terminal states never change again for a submission
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            JudgeState::Queued | JudgeState::Compiling | JudgeState::Running
        )
    }
}

impl fmt::Display for JudgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JudgeState::Queued => "Queued",
            JudgeState::Compiling => "Compiling",
            JudgeState::Running => "Running",
            JudgeState::Accepted => "Accepted",
            JudgeState::WrongAnswer => "Wrong Answer",
            JudgeState::TimeLimitExceeded => "Time Limit Exceeded",
            JudgeState::RuntimeError => "Run Time Error",
            JudgeState::CompileError => "Compile Error",
            JudgeState::JudgeError => "Judge Error",
            JudgeState::SubmissionError => "Submission Error",
            JudgeState::MemoryLimitExceeded => "Memory Limit Exceeded",
            JudgeState::OutputLimitExceeded => "Output Limit Exceeded",
            JudgeState::IllegalOperation => "Illegal Function",
        };
        write!(f, "{}", s)
    }
}

/// Fixed lookup table from judge status codes to states.
///
/// The boundary between pending and terminal codes is configuration, not a
/// constant: codes the table does not know fall on the side of
/// `last_pending`, logged, never dropped.
#[derive(Debug, Clone)]
pub struct StatusTable {
    /// Highest status code still considered pending when unknown
    pub last_pending: i32,
}

impl Default for StatusTable {
    fn default() -> Self {
        Self { last_pending: 5 }
    }
}

impl StatusTable {
    /// Total mapping: every code the judge can emit gets exactly one state
    pub fn classify(&self, code: i32) -> JudgeState {
        match code {
            0 | 1 | 2 => JudgeState::Queued,
            3 => JudgeState::Compiling,
            4 | 5 => JudgeState::Running,
            6 => JudgeState::JudgeError,
            7 => JudgeState::SubmissionError,
            8 => JudgeState::CompileError,
            9 => JudgeState::RuntimeError,
            10 => JudgeState::MemoryLimitExceeded,
            11 => JudgeState::OutputLimitExceeded,
            12 => JudgeState::TimeLimitExceeded,
            13 => JudgeState::IllegalOperation,
            14 => JudgeState::WrongAnswer,
            16 => JudgeState::Accepted,
            other if other <= self.last_pending => {
                warn!(code = other, "unknown pending status code");
                JudgeState::Running
            }
            other => {
                warn!(code = other, "unknown terminal status code");
                JudgeState::JudgeError
            }
        }
    }

    /// Human label for a status code, as the judge names them
    pub fn label(&self, code: i32) -> String {
        match code {
            0 | 1 => "New".to_string(),
            2 => "Waiting for compile".to_string(),
            4 => "Waiting for run".to_string(),
            other => self.classify(other).to_string(),
        }
    }
}

/// Per-test-case micro-verdict decoded from the result fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestCaseVerdict {
    Accepted,
    NotChecked,
    Rejected,
}

/// Structured contents of the judge's rendered result fragment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSummary {
    /// Reported runtime, e.g. "0.01 s"
    pub runtime: String,
    /// Status label as rendered by the judge
    pub status_label: String,
    /// Language label as rendered by the judge
    pub language: String,
    /// Aggregate test-case summary, e.g. "5/5"
    pub test_status: String,
    /// Ordered per-test micro-verdicts
    pub test_results: Vec<TestCaseVerdict>,
}

const UNKNOWN_FIELD: &str = "?";

/// Decode the rendered result fragment.
///
/// Fields that cannot be located degrade to "?" rather than failing: the
/// fragment layout is the judge's, not ours, and the status code alone is
/// enough to drive the state machine.
pub fn parse_row_fragment(html: &str) -> RowSummary {
    let field = |pattern: &str| -> String {
        Regex::new(pattern)
            .ok()
            .and_then(|re| re.captures(html))
            .and_then(|c| c.get(1))
            .map(|m| strip_tags(m.as_str()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_FIELD.to_string())
    };

    let runtime = field(r#"(?s)<td[^>]*data-type="cpu"[^>]*>(.*?)</td>"#);
    let status_label = field(r#"(?s)<div[^>]*class="[^"]*status[^"]*"[^>]*>(.*?)</div>"#);
    let language = field(r#"(?s)<td[^>]*data-type="lang"[^>]*>(.*?)</td>"#);
    let test_status = field(r#"(?s)<td[^>]*data-type="testcases"[^>]*>(.*?)</td>"#);

    let title_re = Regex::new(r#"<i\s[^>]*title="([^"]*)""#).expect("static pattern");
    let test_results = title_re
        .captures_iter(html)
        .map(|c| {
            let title = c.get(1).map(|m| m.as_str()).unwrap_or_default();
            let outcome = title.rsplit(':').next().unwrap_or_default();
            if outcome.contains("Accepted") {
                TestCaseVerdict::Accepted
            } else if outcome.contains("not checked") {
                TestCaseVerdict::NotChecked
            } else {
                TestCaseVerdict::Rejected
            }
        })
        .collect();

    RowSummary {
        runtime,
        status_label,
        language,
        test_status,
        test_results,
    }
}

fn strip_tags(fragment: &str) -> String {
    let tag_re = Regex::new(r"<[^>]*>").expect("static pattern");
    tag_re
        .replace_all(fragment, "")
        .replace("&nbsp;", " ")
        .trim()
        .to_string()
}

/// One poll response from the judge, as received on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// Coarse status code; the judge sends it as a number or a string
    #[serde(deserialize_with = "status_id_from_number_or_string")]
    pub status_id: i32,
    /// Rendered result fragment
    #[serde(default)]
    pub row_html: String,
}

fn status_id_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(i32),
        String(String),
    }
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// One decoded judgement, built fresh per poll tick
#[derive(Debug, Clone)]
pub struct JudgementSnapshot {
    pub status_code: i32,
    pub state: JudgeState,
    pub label: String,
    pub row: RowSummary,
}

impl JudgementSnapshot {
    pub fn decode(response: &StatusResponse, table: &StatusTable) -> Self {
        Self {
            status_code: response.status_id,
            state: table.classify(response.status_id),
            label: table.label(response.status_id),
            row: parse_row_fragment(&response.row_html),
        }
    }
}

/// Transport seam: fetch one fresh status response for a submission
#[async_trait]
pub trait StatusFeed: Send + Sync {
    async fn fetch(&self, handle: &SubmissionHandle) -> Result<StatusResponse>;
}

/// Status feed backed by an external transport command.
///
/// The HTTP client (cookies, TLS, redirects) stays outside this crate; the
/// command template gets `{url}` and `{token}` substituted per fetch and
/// must print the judge's JSON status payload on stdout.
pub struct CommandFeed {
    template: Vec<String>,
    runner: crate::runner::ProcessRunner,
}

impl CommandFeed {
    pub fn new(template: Vec<String>) -> Self {
        Self {
            template,
            runner: crate::runner::ProcessRunner::new(),
        }
    }
}

#[async_trait]
impl StatusFeed for CommandFeed {
    async fn fetch(&self, handle: &SubmissionHandle) -> Result<StatusResponse> {
        use crate::runner::{CommandSpec, Runner};

        let command: Vec<String> = self
            .template
            .iter()
            .map(|token| {
                token
                    .replace("{url}", &handle.submission_url)
                    .replace("{token}", &handle.session_token)
            })
            .collect();

        let outcome = Runner::run(&self.runner, &CommandSpec::from_vec(&command), None)
            .await
            .map_err(|e| Error::Transport(format!("{:#}", e)))?;
        if !outcome.is_success() {
            return Err(Error::Transport(outcome.stderr.trim().to_string()));
        }
        serde_json::from_str(&outcome.stdout)
            .map_err(|e| Error::Transport(format!("bad status payload: {}", e)))
    }
}

/// One submission's poll loop state: the handle plus the most recent
/// snapshot, kept for display after cancellation
#[derive(Debug)]
pub struct JudgementSession {
    handle: SubmissionHandle,
    latest: Option<JudgementSnapshot>,
}

impl JudgementSession {
    pub fn new(handle: SubmissionHandle) -> Self {
        Self {
            handle,
            latest: None,
        }
    }

    pub fn handle(&self) -> &SubmissionHandle {
        &self.handle
    }

    pub fn observe(&mut self, snapshot: &JudgementSnapshot) {
        self.latest = Some(snapshot.clone());
    }

    pub fn latest(&self) -> Option<&JudgementSnapshot> {
        self.latest.as_ref()
    }
}

/// Poll loop tuning
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between ticks
    pub interval: Duration,
    /// Attempt budget; exhausting it aborts the loop instead of spinning
    /// forever on a stuck submission
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            max_attempts: 600,
        }
    }
}

/// How a poll loop ended
#[derive(Debug)]
pub enum PollOutcome {
    /// The judge reached a terminal state
    Terminal(JudgementSnapshot),
    /// The caller aborted between ticks; the last snapshot, if any, is
    /// still valid and displayable
    Cancelled(Option<JudgementSnapshot>),
}

/// Drives the poll loop for one submission
pub struct SubmissionPoller<F> {
    feed: F,
    table: StatusTable,
    config: PollConfig,
    cancel: Option<watch::Receiver<bool>>,
}

impl<F: StatusFeed> SubmissionPoller<F> {
    pub fn new(feed: F, config: PollConfig) -> Self {
        Self {
            feed,
            table: StatusTable::default(),
            config,
            cancel: None,
        }
    }

    pub fn with_table(mut self, table: StatusTable) -> Self {
        self.table = table;
        self
    }

    /// Abort signal, checked between ticks
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| *c.borrow())
    }

    /// Poll until a terminal state, cancellation, or budget exhaustion
    pub async fn poll(&self, handle: &SubmissionHandle) -> Result<PollOutcome> {
        self.poll_with(handle, |_| {}).await
    }

    /// Like [`poll`](Self::poll), invoking `observer` on every snapshot so a
    /// UI layer can render progress per tick
    pub async fn poll_with(
        &self,
        handle: &SubmissionHandle,
        mut observer: impl FnMut(&JudgementSnapshot) + Send,
    ) -> Result<PollOutcome> {
        let mut last: Option<JudgementSnapshot> = None;

        for attempt in 1..=self.config.max_attempts {
            if self.cancelled() {
                return Ok(PollOutcome::Cancelled(last));
            }

            let response = self.feed.fetch(handle).await?;
            let snapshot = JudgementSnapshot::decode(&response, &self.table);
            debug!(
                attempt,
                code = snapshot.status_code,
                state = %snapshot.state,
                "poll tick"
            );
            observer(&snapshot);

            if snapshot.state.is_terminal() {
                return Ok(PollOutcome::Terminal(snapshot));
            }
            last = Some(snapshot);

            sleep(self.config.interval).await;
        }

        Err(Error::PollBudgetExhausted {
            attempts: self.config.max_attempts,
            last_code: last.map(|s| s.status_code).unwrap_or(-1),
        })
    }
}
