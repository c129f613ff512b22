//! Chromium lifecycle. Launches the browser with the studio's expected
//! fingerprint, installs download capture, and hands a single page to the
//! driver. Downloads land in a staging directory under the output dir and
//! are renamed into place once the workflow names them.

use std::collections::HashMap;
use std::fmt;
use std::fs;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, EventDownloadWillBegin,
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, Headers, SetExtraHttpHeadersParams,
};
use flowbot::config::Settings;
use flowbot::driver::{DownloadEvent, DriverError, UiDriver};
use flowbot::session::{BrowserSession, SessionLauncher};
use flowbot::{FlowError, Result};
use futures::StreamExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::driver::CdpDriver;

/// The studio serves its Vietnamese UI to this locale; the selector catalog
/// carries both English and Vietnamese labels to match.
const ACCEPT_LANGUAGE: &str = "vi-VN,vi;q=0.9,en;q=0.8";

const STAGING_DIR: &str = ".flowbot-staging";

pub struct CdpLauncher {
    settings: Settings,
}

impl CdpLauncher {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SessionLauncher for CdpLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let staging_dir = self.settings.output_dir.join(STAGING_DIR);
        fs::create_dir_all(&staging_dir)
            .map_err(|err| launch_err(format!("cannot create staging dir: {err}")))?;

        let mut config = BrowserConfig::builder()
            .user_data_dir(&self.settings.user_data_dir)
            .window_size(1920, 1080)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-sandbox")
            .arg("--disable-infobars");
        if !self.settings.headless {
            config = config.with_head();
        }
        let config = config
            .build()
            .map_err(|err| FlowError::from(DriverError::Launch(err)))?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(launch_err)?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(target = "flowbot.cdp", error = %err, "handler event error");
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(launch_err)?;
        page.execute(EnableParams::default()).await.map_err(launch_err)?;
        let headers = serde_json::json!({ "Accept-Language": ACCEPT_LANGUAGE });
        page.execute(SetExtraHttpHeadersParams::new(Headers::new(headers)))
            .await
            .map_err(launch_err)?;

        browser
            .execute(
                SetDownloadBehaviorParams::builder()
                    .behavior(SetDownloadBehaviorBehavior::AllowAndName)
                    .download_path(staging_dir.to_string_lossy().into_owned())
                    .events_enabled(true)
                    .build()
                    .map_err(|err| FlowError::from(DriverError::Launch(err)))?,
            )
            .await
            .map_err(launch_err)?;

        let mut will_begin = page
            .event_listener::<EventDownloadWillBegin>()
            .await
            .map_err(launch_err)?;
        let mut progress = page
            .event_listener::<EventDownloadProgress>()
            .await
            .map_err(launch_err)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let pump_task = tokio::spawn(async move {
            // AllowAndName writes each download as <staging>/<guid>; the
            // suggested filename only travels in the willBegin event, so
            // pair it up here and emit one event per completed download.
            let mut suggested: HashMap<String, Option<String>> = HashMap::new();
            loop {
                tokio::select! {
                    Some(event) = will_begin.next() => {
                        debug!(
                            target = "flowbot.download",
                            guid = %event.guid,
                            filename = %event.suggested_filename,
                            "download started"
                        );
                        let name = (!event.suggested_filename.is_empty())
                            .then(|| event.suggested_filename.clone());
                        suggested.insert(event.guid.clone(), name);
                    }
                    Some(event) = progress.next() => match event.state {
                        DownloadProgressState::Completed => {
                            let done = DownloadEvent {
                                guid: event.guid.clone(),
                                suggested_filename: suggested.remove(&event.guid).flatten(),
                            };
                            if tx.send(done).is_err() {
                                break;
                            }
                        }
                        DownloadProgressState::Canceled => {
                            warn!(target = "flowbot.download", guid = %event.guid, "download canceled");
                            suggested.remove(&event.guid);
                        }
                        DownloadProgressState::InProgress => {}
                    },
                    else => break,
                }
            }
        });

        let driver = CdpDriver::new(page, rx, staging_dir);
        info!(
            target = "flowbot.session",
            headless = self.settings.headless,
            user_data_dir = %self.settings.user_data_dir.display(),
            "browser session started"
        );
        Ok(Box::new(CdpSession {
            browser: Mutex::new(browser),
            driver,
            handler_task,
            pump_task,
        }))
    }
}

struct CdpSession {
    browser: Mutex<Browser>,
    driver: CdpDriver,
    handler_task: JoinHandle<()>,
    pump_task: JoinHandle<()>,
}

#[async_trait]
impl BrowserSession for CdpSession {
    fn driver(&self) -> &dyn UiDriver {
        &self.driver
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|err| FlowError::from(DriverError::Call(err.to_string())))?;
        if let Err(err) = browser.wait().await {
            debug!(target = "flowbot.session", error = %err, "browser exit status unavailable");
        }
        self.pump_task.abort();
        self.handler_task.abort();
        info!(target = "flowbot.session", "browser session closed");
        Ok(())
    }
}

fn launch_err(err: impl fmt::Display) -> FlowError {
    DriverError::Launch(err.to_string()).into()
}
