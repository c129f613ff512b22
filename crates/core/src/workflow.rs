//! End-to-end orchestration over exactly one browser session.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::auth::Authenticator;
use crate::clock::Clock;
use crate::config::Settings;
use crate::download::ArtifactRetriever;
use crate::driver::WaitUntil;
use crate::error::{FlowError, Result};
use crate::generate::JobSubmitter;
use crate::poll::CompletionPoller;
use crate::selector::{self, Constraints};
use crate::session::{BrowserSession, SessionLauncher};
use crate::ui;

/// Bound on finding the landing page's entry control in interactive mode.
const ENTRY_WAIT: Duration = Duration::from_secs(10);

/// One generation request. Immutable once submitted.
#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    pub prompt: String,
    pub output_filename: Option<String>,
    /// Assume the persistent profile is already authenticated.
    pub skip_login: bool,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct WorkflowResult {
    pub file_path: PathBuf,
}

pub struct Workflow {
    launcher: Arc<dyn SessionLauncher>,
    clock: Arc<dyn Clock>,
    settings: Settings,
}

impl Workflow {
    pub fn new(launcher: Arc<dyn SessionLauncher>, clock: Arc<dyn Clock>, settings: Settings) -> Self {
        Self { launcher, clock, settings }
    }

    /// Run the whole workflow: authenticate, submit, wait, download.
    ///
    /// Requests and credentials are validated before any session exists, so
    /// configuration errors never cause navigation. The session is released
    /// on every exit path, including cancellation.
    pub async fn run(&self, request: WorkflowRequest, cancel: CancellationToken) -> Result<WorkflowResult> {
        if request.prompt.trim().is_empty() {
            return Err(FlowError::Configuration("prompt must not be empty".into()));
        }
        if !request.skip_login {
            self.settings.credentials.require()?;
        }

        info!(target = "flowbot", prompt = %request.prompt, "starting workflow");
        let session = self.launcher.launch().await?;
        let outcome = tokio::select! {
            result = self.run_steps(session.as_ref(), &request) => result,
            _ = cancel.cancelled() => {
                warn!(target = "flowbot", "workflow cancelled");
                Err(FlowError::Interrupted)
            }
        };
        self.release(session.as_ref()).await;
        outcome.map(|file_path| WorkflowResult { file_path })
    }

    async fn run_steps(&self, session: &dyn BrowserSession, request: &WorkflowRequest) -> Result<PathBuf> {
        let driver = session.driver();
        let clock = self.clock.as_ref();

        if request.skip_login {
            info!(target = "flowbot.auth", "login skipped by request");
        } else {
            Authenticator::new(driver, clock, &self.settings).ensure_logged_in().await?;
        }

        let submitter = JobSubmitter::new(driver, clock, &self.settings);
        submitter.open_create_page().await?;
        submitter.enter_prompt(&request.prompt).await?;
        submitter.trigger_generation().await?;

        CompletionPoller::new(driver, clock, &self.settings).wait_for_completion().await?;

        ArtifactRetriever::new(driver, clock, &self.settings)
            .fetch_artifact(request.output_filename.as_deref())
            .await
    }

    /// Open the studio, click through to the editor, then hand the browser
    /// to a human until the token fires.
    pub async fn interactive(&self, cancel: CancellationToken) -> Result<()> {
        let session = self.launcher.launch().await?;
        let setup = tokio::select! {
            result = self.interactive_setup(session.as_ref()) => result,
            _ = cancel.cancelled() => Err(FlowError::Interrupted),
        };

        let outcome = match setup {
            Ok(()) => {
                info!(target = "flowbot", "interactive session ready, waiting for Ctrl-C");
                cancel.cancelled().await;
                Ok(())
            }
            // Cancellation during setup is a normal end for this mode.
            Err(FlowError::Interrupted) => Ok(()),
            Err(err) => Err(err),
        };
        self.release(session.as_ref()).await;
        outcome
    }

    async fn interactive_setup(&self, session: &dyn BrowserSession) -> Result<()> {
        let driver = session.driver();
        let clock = self.clock.as_ref();

        Authenticator::new(driver, clock, &self.settings).ensure_logged_in().await?;

        let url = &self.settings.urls.flow;
        driver.goto(url, WaitUntil::NetworkIdle).await.map_err(FlowError::from)?;
        clock.sleep(self.settings.timeouts.settle).await;

        // Best effort only: the entry control's hashed classes churn, and a
        // human can click it themselves.
        match selector::resolve_within(driver, clock, &ui::entry_button(), Constraints::visible(), ENTRY_WAIT)
            .await
        {
            Ok(button) => {
                if let Err(err) = driver.click(&button).await {
                    warn!(target = "flowbot", error = %err, "entry control click failed");
                }
            }
            Err(err) => {
                warn!(target = "flowbot", error = %err, "entry control not found, leaving page as-is");
            }
        }
        Ok(())
    }

    async fn release(&self, session: &dyn BrowserSession) {
        if let Err(err) = session.close().await {
            warn!(target = "flowbot.session", error = %err, "session close failed");
        }
    }
}
