//! Artifact capture: race the download event against its trigger, then
//! materialize the file under a deterministic name.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::Settings;
use crate::driver::{DownloadEvent, UiDriver};
use crate::error::{FlowError, Result};
use crate::selector::{self, Constraints};
use crate::ui;

/// Context menus need a beat to render before their entries resolve.
const CONTEXT_MENU_DELAY: Duration = Duration::from_secs(1);

pub struct ArtifactRetriever<'a> {
    driver: &'a dyn UiDriver,
    clock: &'a dyn Clock,
    settings: &'a Settings,
}

impl<'a> ArtifactRetriever<'a> {
    pub fn new(driver: &'a dyn UiDriver, clock: &'a dyn Clock, settings: &'a Settings) -> Self {
        Self { driver, clock, settings }
    }

    /// Trigger the download, capture its event, and write the artifact into
    /// the output directory. Returns the absolute path of a file that
    /// exists at return time.
    pub async fn fetch_artifact(&self, custom_name: Option<&str>) -> Result<PathBuf> {
        let out_dir = &self.settings.output_dir;
        fs::create_dir_all(out_dir).map_err(|e| {
            FlowError::Download(format!("cannot create output dir {}: {e}", out_dir.display()))
        })?;

        // The event listener must be armed while the trigger runs; whichever
        // side fails first fails the pair.
        let (event, ()) = tokio::try_join!(self.next_download_event(), self.trigger_download())?;

        let name = artifact_filename(custom_name, event.suggested_filename.as_deref(), Utc::now());
        let dest = out_dir.join(&name);
        self.driver.save_download(&event, &dest).await?;

        if !dest.exists() {
            return Err(FlowError::Download(format!(
                "artifact missing after save: {}",
                dest.display()
            )));
        }
        let absolute = std::path::absolute(&dest).map_err(|e| {
            FlowError::Download(format!("cannot resolve {}: {e}", dest.display()))
        })?;
        info!(target = "flowbot.download", path = %absolute.display(), "artifact saved");
        Ok(absolute)
    }

    async fn next_download_event(&self) -> Result<DownloadEvent> {
        let bound = self.settings.timeouts.download;
        match self.driver.wait_for_download(bound).await? {
            Some(event) => Ok(event),
            None => Err(FlowError::Download(format!(
                "no download event within {}s of triggering",
                bound.as_secs()
            ))),
        }
    }

    /// Click a download control if one is visible; otherwise fall back to
    /// the media element's context menu.
    async fn trigger_download(&self) -> Result<()> {
        if let Some(button) =
            selector::try_resolve(self.driver, &ui::download_control(), Constraints::visible())
                .await?
        {
            self.driver.click(&button).await?;
            return Ok(());
        }

        debug!(target = "flowbot.download", "no download control, trying context menu");
        let media =
            match selector::try_resolve(self.driver, &ui::media_ready(), Constraints::none()).await? {
                Some(media) => media,
                None => {
                    return Err(FlowError::Download(format!(
                        "no download control or media element (tried: {})",
                        ui::download_control().descriptors().join(", ")
                    )));
                }
            };
        self.driver.context_click(&media).await?;
        self.clock.sleep(CONTEXT_MENU_DELAY).await;

        match selector::try_resolve(self.driver, &ui::context_menu_save(), Constraints::visible())
            .await?
        {
            Some(entry) => {
                self.driver.click(&entry).await?;
                Ok(())
            }
            None => Err(FlowError::Download(format!(
                "context menu had no save entry (tried: {})",
                ui::context_menu_save().descriptors().join(", ")
            ))),
        }
    }
}

/// File-name priority: the caller's explicit name, then the browser's
/// suggestion, then a timestamped fallback with `:` and `.` replaced so the
/// stem is safe on any filesystem.
pub fn artifact_filename(
    custom: Option<&str>,
    suggested: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    if let Some(name) = custom {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    if let Some(name) = suggested {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("flow-video-{stamp}.mp4")
}
