//! Error taxonomy for the judge client
//!
//! Resolution and comparison never fail - they degrade to deterministic
//! fallbacks. Everything that can actually stop an attempt or a poll loop
//! lives here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Requested language has no registry entry
    #[error("unsupported language: {0}")]
    LanguageNotSupported(String),

    /// No *.in files were found in the sample data directory
    #[error("no sample input files found in {0}")]
    NoSampleData(PathBuf),

    /// Compile step exited non-zero; the whole attempt is abandoned
    #[error("compilation failed:\n{stderr}")]
    Compile { stderr: String },

    /// A compile or run process could not be spawned or reaped
    #[error("process execution failed: {0}")]
    Process(String),

    /// Network failure while talking to the judge
    #[error("judge transport failed: {0}")]
    Transport(String),

    /// Upload succeeded but the response carried no recognizable submission id
    #[error("could not find submission id in judge response")]
    MalformedResponse,

    /// Poll loop ran out of attempts before the judge reached a terminal state
    #[error("submission still pending after {attempts} polls (last status code {last_code})")]
    PollBudgetExhausted { attempts: u32, last_code: i32 },

    /// Language table or other configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
