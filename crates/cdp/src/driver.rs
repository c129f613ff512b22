//! [`UiDriver`] backed by a live Chromium page.
//!
//! Element handles are `data-flowbot-ref` attributes stamped by the query
//! script; every interaction re-finds the element by that attribute so a
//! re-render between calls surfaces as a stale-element error instead of
//! acting on the wrong node.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::{Element, Page};
use flowbot::driver::{DownloadEvent, DriverError, ElementRef, UiDriver, WaitOutcome, WaitUntil};
use flowbot::selector::{Candidate, Constraints};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

use crate::js;

pub struct CdpDriver {
    page: Page,
    downloads: Mutex<mpsc::UnboundedReceiver<DownloadEvent>>,
    staging_dir: PathBuf,
    next_ref: AtomicU64,
}

impl CdpDriver {
    pub(crate) fn new(
        page: Page,
        downloads: mpsc::UnboundedReceiver<DownloadEvent>,
        staging_dir: PathBuf,
    ) -> Self {
        Self {
            page,
            downloads: Mutex::new(downloads),
            staging_dir,
            next_ref: AtomicU64::new(0),
        }
    }

    fn ref_selector(el: &ElementRef) -> String {
        format!(r#"[data-flowbot-ref="{}"]"#, el.token())
    }

    async fn element(&self, el: &ElementRef) -> Result<Element, DriverError> {
        self.page
            .find_element(Self::ref_selector(el))
            .await
            .map_err(|err| DriverError::Call(format!("element {} is gone: {err}", el.token())))
    }

    async fn eval_bool(&self, script: String) -> Result<bool, DriverError> {
        let result = self.page.evaluate(script).await.map_err(call_err)?;
        result.into_value::<bool>().map_err(call_err)
    }

    async fn settle_network(&self, url: &str) {
        match self.page.evaluate(js::NETWORK_IDLE_SCRIPT).await {
            Ok(result) => {
                let settled = result
                    .into_value::<serde_json::Value>()
                    .ok()
                    .and_then(|v| v.get("settled").and_then(|s| s.as_bool()))
                    .unwrap_or(false);
                if settled {
                    debug!(target = "flowbot.cdp", url, "network settled");
                } else {
                    warn!(target = "flowbot.cdp", url, "network still busy after idle window");
                }
            }
            Err(err) => {
                warn!(target = "flowbot.cdp", url, error = %err, "network-idle probe failed");
            }
        }
    }
}

#[async_trait]
impl UiDriver for CdpDriver {
    async fn goto(&self, url: &str, wait: WaitUntil) -> Result<(), DriverError> {
        self.page
            .goto(url)
            .await
            .map_err(|err| DriverError::Navigation {
                url: url.to_string(),
                message: err.to_string(),
            })?;
        if wait == WaitUntil::NetworkIdle {
            self.settle_network(url).await;
        }
        Ok(())
    }

    async fn query(
        &self,
        candidate: &Candidate,
        constraints: Constraints,
    ) -> Result<Option<ElementRef>, DriverError> {
        let token = format!("flowbot-{}", self.next_ref.fetch_add(1, Ordering::Relaxed));
        let script = js::query_script(candidate, constraints, &token).map_err(call_err)?;
        if self.eval_bool(script).await? {
            Ok(Some(ElementRef::new(token)))
        } else {
            Ok(None)
        }
    }

    async fn click(&self, el: &ElementRef) -> Result<(), DriverError> {
        let element = self.element(el).await?;
        element.scroll_into_view().await.map_err(call_err)?;
        element.click().await.map_err(call_err)?;
        Ok(())
    }

    async fn context_click(&self, el: &ElementRef) -> Result<(), DriverError> {
        let element = self.element(el).await?;
        element.scroll_into_view().await.map_err(call_err)?;
        let point = element.clickable_point().await.map_err(call_err)?;
        let mouse = DispatchMouseEventParams::builder()
            .x(point.x)
            .y(point.y)
            .button(MouseButton::Right)
            .click_count(1);
        for kind in [
            DispatchMouseEventType::MousePressed,
            DispatchMouseEventType::MouseReleased,
        ] {
            let cmd = mouse.clone().r#type(kind).build().map_err(DriverError::Call)?;
            self.page.execute(cmd).await.map_err(call_err)?;
        }
        Ok(())
    }

    async fn fill(&self, el: &ElementRef, text: &str) -> Result<(), DriverError> {
        let element = self.element(el).await?;
        element.scroll_into_view().await.map_err(call_err)?;
        element.click().await.map_err(call_err)?;
        let clear = js::clear_script(&Self::ref_selector(el)).map_err(call_err)?;
        self.eval_bool(clear).await?;
        element.type_str(text).await.map_err(call_err)?;
        Ok(())
    }

    async fn text(&self, el: &ElementRef) -> Result<String, DriverError> {
        let element = self.element(el).await?;
        let text = element.inner_text().await.map_err(call_err)?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(
        &self,
        el: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let element = self.element(el).await?;
        element.attribute(name).await.map_err(call_err)
    }

    async fn wait_for_navigation(&self, timeout: Duration) -> Result<WaitOutcome, DriverError> {
        match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(WaitOutcome::Navigated),
            Ok(Err(err)) => Err(call_err(err)),
            Err(_) => Ok(WaitOutcome::TimedOut),
        }
    }

    async fn wait_for_download(
        &self,
        timeout: Duration,
    ) -> Result<Option<DownloadEvent>, DriverError> {
        let mut downloads = self.downloads.lock().await;
        match tokio::time::timeout(timeout, downloads.recv()).await {
            Ok(Some(event)) => Ok(Some(event)),
            Ok(None) => Err(DriverError::Download("download event stream closed".into())),
            Err(_) => Ok(None),
        }
    }

    async fn save_download(&self, event: &DownloadEvent, dest: &Path) -> Result<(), DriverError> {
        let staged = self.staging_dir.join(&event.guid);
        // Staging lives under the output dir, so rename is the common case.
        if let Err(rename_err) = fs::rename(&staged, dest) {
            fs::copy(&staged, dest).map_err(|copy_err| {
                DriverError::Download(format!(
                    "cannot move {} into place: rename failed ({rename_err}), copy failed ({copy_err})",
                    staged.display()
                ))
            })?;
            let _ = fs::remove_file(&staged);
        }
        debug!(
            target = "flowbot.download",
            guid = %event.guid,
            dest = %dest.display(),
            "staged file moved"
        );
        Ok(())
    }
}

fn call_err(err: impl fmt::Display) -> DriverError {
    DriverError::Call(err.to_string())
}
