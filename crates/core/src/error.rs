use std::time::Duration;

use thiserror::Error;

use crate::driver::DriverError;

pub type Result<T> = std::result::Result<T, FlowError>;

/// Everything a workflow run can fail with. Each variant is terminal for
/// the run; none are retried automatically.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Required input or credential missing before any browser work starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required UI affordance could not be resolved after walking its
    /// whole fallback chain.
    #[error("no usable element for {what} (tried: {})", .attempted.join(", "))]
    ElementNotFound {
        what: &'static str,
        attempted: Vec<String>,
    },

    /// The login sequence did not reach an authenticated session.
    #[error("login failed: {0}")]
    Login(String),

    /// The studio reported an explicit failure for the submitted job.
    /// `message` is the on-page error text, verbatim.
    #[error("generation failed: {message}")]
    JobFailed { message: String },

    /// A bounded wait elapsed without reaching its target state.
    #[error("timed out after {}s waiting for {what}", .elapsed.as_secs())]
    Timeout {
        what: &'static str,
        elapsed: Duration,
    },

    /// The artifact could not be triggered, captured, or materialized.
    #[error("download failed: {0}")]
    Download(String),

    /// The run was cancelled from outside; the session was still released.
    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Driver(#[from] DriverError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_not_found_lists_every_attempt() {
        let err = FlowError::ElementNotFound {
            what: "generate button",
            attempted: vec!["button:has-text(\"Generate\")".into(), "button[type=\"submit\"]".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("generate button"));
        assert!(msg.contains("button:has-text(\"Generate\")"));
        assert!(msg.contains("button[type=\"submit\"]"));
    }

    #[test]
    fn timeout_reports_the_bound_in_seconds() {
        let err = FlowError::Timeout {
            what: "generation to complete",
            elapsed: Duration::from_secs(300),
        };
        assert_eq!(err.to_string(), "timed out after 300s waiting for generation to complete");
    }

    #[test]
    fn job_failure_keeps_the_page_text_verbatim() {
        let err = FlowError::JobFailed {
            message: "Quota exceeded. Try again tomorrow.".into(),
        };
        assert!(err.to_string().ends_with("Quota exceeded. Try again tomorrow."));
    }
}
