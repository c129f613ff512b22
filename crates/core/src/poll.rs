//! Completion polling: a fixed-interval state machine over DOM signals.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::Settings;
use crate::driver::UiDriver;
use crate::error::{FlowError, Result};
use crate::selector::{self, Constraints};
use crate::ui;

/// Which terminal signal ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessSignal {
    /// A playable media element with a resolved source.
    MediaReady,
    /// A visible download affordance.
    DownloadControl,
}

/// Job state as re-derived from the live DOM on each tick. Never cached
/// between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Succeeded(SuccessSignal),
    Failed(String),
    TimedOut,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => f.write_str("pending"),
            JobState::Succeeded(SuccessSignal::MediaReady) => f.write_str("succeeded (media ready)"),
            JobState::Succeeded(SuccessSignal::DownloadControl) => {
                f.write_str("succeeded (download control)")
            }
            JobState::Failed(message) => write!(f, "failed: {message}"),
            JobState::TimedOut => f.write_str("timed out"),
        }
    }
}

pub struct CompletionPoller<'a> {
    driver: &'a dyn UiDriver,
    clock: &'a dyn Clock,
    settings: &'a Settings,
}

impl<'a> CompletionPoller<'a> {
    pub fn new(driver: &'a dyn UiDriver, clock: &'a dyn Clock, settings: &'a Settings) -> Self {
        Self { driver, clock, settings }
    }

    /// One sampling pass. Success signals are checked before failure
    /// signals: a frame showing both a ready video and a stale error toast
    /// counts as success. Never returns `TimedOut`; the deadline belongs to
    /// [`wait_for_completion`].
    pub async fn poll_once(&self) -> Result<JobState> {
        if selector::try_resolve(self.driver, &ui::media_ready(), Constraints::none())
            .await?
            .is_some()
        {
            return Ok(JobState::Succeeded(SuccessSignal::MediaReady));
        }

        if selector::try_resolve(self.driver, &ui::download_control(), Constraints::visible())
            .await?
            .is_some()
        {
            return Ok(JobState::Succeeded(SuccessSignal::DownloadControl));
        }

        if let Some(el) =
            selector::try_resolve(self.driver, &ui::error_indicator(), Constraints::visible()).await?
        {
            let message = self.driver.text(&el).await?;
            return Ok(JobState::Failed(message.trim().to_string()));
        }

        if let Some(el) =
            selector::try_resolve(self.driver, &ui::progress_indicator(), Constraints::visible())
                .await?
        {
            if let Some(progress) = self.driver.attribute(&el, "aria-valuenow").await? {
                info!(target = "flowbot.poll", %progress, "generation in progress");
            }
        }

        Ok(JobState::Pending)
    }

    /// Sample until a terminal state or until the configured deadline. The
    /// deadline accumulates in whole ticks, so it is exact within tick
    /// granularity.
    pub async fn wait_for_completion(&self) -> Result<SuccessSignal> {
        let interval = self.settings.timeouts.poll_interval;
        let deadline = self.settings.timeouts.completion_deadline;
        info!(
            target = "flowbot.poll",
            deadline_secs = deadline.as_secs(),
            interval_secs = interval.as_secs(),
            "waiting for generation to finish"
        );

        let mut elapsed = Duration::ZERO;
        while elapsed < deadline {
            let state = self.poll_once().await?;
            match state {
                JobState::Succeeded(signal) => {
                    info!(target = "flowbot.poll", %state, waited_secs = elapsed.as_secs(), "generation finished");
                    return Ok(signal);
                }
                JobState::Failed(message) => {
                    warn!(target = "flowbot.poll", waited_secs = elapsed.as_secs(), "studio reported failure");
                    return Err(FlowError::JobFailed { message });
                }
                JobState::Pending | JobState::TimedOut => {
                    debug!(target = "flowbot.poll", waited_secs = elapsed.as_secs(), "still pending");
                }
            }
            self.clock.sleep(interval).await;
            elapsed += interval;
        }

        warn!(
            target = "flowbot.poll",
            state = %JobState::TimedOut,
            waited_secs = elapsed.as_secs(),
            "giving up"
        );
        Err(FlowError::Timeout { what: "generation to complete", elapsed: deadline })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_display_is_log_friendly() {
        assert_eq!(JobState::Pending.to_string(), "pending");
        assert_eq!(
            JobState::Succeeded(SuccessSignal::MediaReady).to_string(),
            "succeeded (media ready)"
        );
        assert_eq!(JobState::Failed("boom".into()).to_string(), "failed: boom");
        assert_eq!(JobState::TimedOut.to_string(), "timed out");
    }
}
