//! Capability traits the workflow drives the browser through. The core
//! never talks to a browser engine directly; `flowbot-cdp` implements
//! these for Chromium and the test suite implements them in memory.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::selector::{Candidate, Constraints};

/// Opaque handle to an element the driver has resolved. Only meaningful to
/// the driver that minted it, and only until the next navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

/// How far a navigation must settle before `goto` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    Load,
    NetworkIdle,
}

/// Result of waiting on a navigation event with a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Navigated,
    TimedOut,
}

/// A download the browser has finished writing to its staging area.
#[derive(Debug, Clone)]
pub struct DownloadEvent {
    pub guid: String,
    pub suggested_filename: Option<String>,
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("browser call failed: {0}")]
    Call(String),

    #[error("download could not be materialized: {0}")]
    Download(String),
}

#[async_trait]
pub trait UiDriver: Send + Sync {
    async fn goto(&self, url: &str, wait: WaitUntil) -> Result<(), DriverError>;

    /// Find the first element matching `candidate` under `constraints`.
    /// `Ok(None)` means "not on this page right now" and is never an error.
    async fn query(
        &self,
        candidate: &Candidate,
        constraints: Constraints,
    ) -> Result<Option<ElementRef>, DriverError>;

    async fn click(&self, el: &ElementRef) -> Result<(), DriverError>;

    /// Right-click, used to reach the media context menu.
    async fn context_click(&self, el: &ElementRef) -> Result<(), DriverError>;

    async fn fill(&self, el: &ElementRef, text: &str) -> Result<(), DriverError>;

    async fn text(&self, el: &ElementRef) -> Result<String, DriverError>;

    async fn attribute(
        &self,
        el: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Wait for the page to navigate away from the current document.
    async fn wait_for_navigation(&self, timeout: Duration) -> Result<WaitOutcome, DriverError>;

    /// Wait for the next completed download. `Ok(None)` when the bound
    /// elapses without one.
    async fn wait_for_download(
        &self,
        timeout: Duration,
    ) -> Result<Option<DownloadEvent>, DriverError>;

    /// Move a captured download to its final destination.
    async fn save_download(&self, event: &DownloadEvent, dest: &Path) -> Result<(), DriverError>;
}
