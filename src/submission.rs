//! Submission handles and upload-response parsing

use std::path::PathBuf;

use regex::Regex;

use crate::errors::{Error, Result};

/// Read-only description of an uploaded submission, shared by the uploader
/// and the poller for the life of one poll loop
#[derive(Debug, Clone)]
pub struct SubmissionHandle {
    /// Status endpoint for this submission
    pub submission_url: String,
    /// Authenticated session token or cookie value
    pub session_token: String,
    /// Problem the submission belongs to
    pub problem_id: String,
}

impl SubmissionHandle {
    pub fn new(
        submission_url: impl Into<String>,
        session_token: impl Into<String>,
        problem_id: impl Into<String>,
    ) -> Self {
        Self {
            submission_url: submission_url.into(),
            session_token: session_token.into(),
            problem_id: problem_id.into(),
        }
    }
}

/// Deduplicate and sort a submission's file list.
///
/// Every consumer (hashing, display, upload payloads) sees the same order.
pub fn normalize_files(files: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = files.into_iter().collect();
    files.sort();
    files.dedup();
    files
}

/// Extract the submission id from the judge's upload response text.
///
/// The response is plain text containing `Submission ID: <digits>`; anything
/// else means the upload cannot be tracked and no polling begins.
pub fn extract_submission_id(response_text: &str) -> Result<u64> {
    let re = Regex::new(r"Submission ID: (\d+)").expect("static pattern");
    re.captures(response_text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or(Error::MalformedResponse)
}

/// Build the status URL for an extracted submission id
pub fn submission_status_url(submissions_url: &str, submission_id: u64) -> String {
    format!("{}/{}", submissions_url.trim_end_matches('/'), submission_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_submission_id() {
        let text = "Submission received. Submission ID: 123456.";
        assert_eq!(extract_submission_id(text).unwrap(), 123456);
    }

    #[test]
    fn test_extract_submission_id_missing_is_malformed() {
        assert!(matches!(
            extract_submission_id("Internal error"),
            Err(Error::MalformedResponse)
        ));
    }

    #[test]
    fn test_normalize_files_sorts_and_dedups() {
        let files = normalize_files([
            PathBuf::from("b.py"),
            PathBuf::from("a.py"),
            PathBuf::from("b.py"),
        ]);
        assert_eq!(files, vec![PathBuf::from("a.py"), PathBuf::from("b.py")]);
    }

    #[test]
    fn test_submission_status_url() {
        assert_eq!(
            submission_status_url("https://judge.example/submissions/", 42),
            "https://judge.example/submissions/42"
        );
    }
}
