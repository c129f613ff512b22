#![allow(dead_code)]

//! Scripted in-memory driver and session for exercising the workflow
//! without a browser. Cloning a `FakeDriver` shares its state, so tests
//! can mutate the fake DOM from spawned tasks while the code under test
//! holds its own handle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use flowbot::config::{Credentials, Settings, Timeouts};
use flowbot::driver::{DownloadEvent, DriverError, ElementRef, UiDriver, WaitOutcome, WaitUntil};
use flowbot::selector::{Candidate, Constraints};
use flowbot::session::{BrowserSession, SessionLauncher};

/// One fake DOM node. A node answers to the candidate descriptors listed
/// in `matches` (compare `Candidate::to_string()`); precedence between
/// candidates comes from the list under test, not from the node store.
#[derive(Debug, Clone)]
pub struct FakeNode {
    pub id: &'static str,
    pub matches: Vec<String>,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub visible: bool,
    pub enabled: bool,
}

impl FakeNode {
    pub fn new(id: &'static str, matches: &[&str]) -> Self {
        Self {
            id,
            matches: matches.iter().map(|m| (*m).to_string()).collect(),
            text: String::new(),
            attrs: HashMap::new(),
            visible: true,
            enabled: true,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }
}

/// Everything the code under test did to the driver, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Goto(String),
    Click(String),
    ContextClick(String),
    Fill(String, String),
}

#[derive(Default)]
struct Inner {
    nodes: Vec<FakeNode>,
    ops: Vec<Op>,
    goto_failures: Vec<String>,
    navigation_outcomes: Vec<WaitOutcome>,
    download_events: Vec<DownloadEvent>,
    reveal_on_context_click: Vec<&'static str>,
    saved: Vec<PathBuf>,
}

#[derive(Clone, Default)]
pub struct FakeDriver {
    inner: Arc<Mutex<Inner>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&self, node: FakeNode) {
        self.inner.lock().unwrap().nodes.push(node);
    }

    pub fn remove_node(&self, id: &str) {
        self.inner.lock().unwrap().nodes.retain(|n| n.id != id);
    }

    /// Queue a navigation failure for the next `goto`.
    pub fn fail_next_goto(&self, message: &str) {
        self.inner.lock().unwrap().goto_failures.push(message.to_string());
    }

    /// Queue the outcome of the next `wait_for_navigation`.
    pub fn push_navigation_outcome(&self, outcome: WaitOutcome) {
        self.inner.lock().unwrap().navigation_outcomes.push(outcome);
    }

    /// Queue a completed download for `wait_for_download` to hand out.
    pub fn push_download_event(&self, guid: &str, suggested: Option<&str>) {
        self.inner.lock().unwrap().download_events.push(DownloadEvent {
            guid: guid.to_string(),
            suggested_filename: suggested.map(str::to_string),
        });
    }

    /// Make a node visible once something is right-clicked, like a context
    /// menu opening.
    pub fn reveal_on_context_click(&self, id: &'static str) {
        self.inner.lock().unwrap().reveal_on_context_click.push(id);
    }

    pub fn ops(&self) -> Vec<Op> {
        self.inner.lock().unwrap().ops.clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Goto(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn clicked(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Click(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn filled(&self) -> Vec<(String, String)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Fill(id, text) => Some((id, text)),
                _ => None,
            })
            .collect()
    }

    pub fn saved(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().saved.clone()
    }
}

#[async_trait]
impl UiDriver for FakeDriver {
    async fn goto(&self, url: &str, _wait: WaitUntil) -> Result<(), DriverError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.goto_failures.is_empty() {
            let message = inner.goto_failures.remove(0);
            return Err(DriverError::Navigation { url: url.to_string(), message });
        }
        inner.ops.push(Op::Goto(url.to_string()));
        Ok(())
    }

    async fn query(
        &self,
        candidate: &Candidate,
        constraints: Constraints,
    ) -> Result<Option<ElementRef>, DriverError> {
        let inner = self.inner.lock().unwrap();
        let descriptor = candidate.to_string();
        for node in &inner.nodes {
            if !node.matches.contains(&descriptor) {
                continue;
            }
            if constraints.visible && !node.visible {
                continue;
            }
            if constraints.enabled && !node.enabled {
                continue;
            }
            return Ok(Some(ElementRef::new(node.id)));
        }
        Ok(None)
    }

    async fn click(&self, el: &ElementRef) -> Result<(), DriverError> {
        self.inner.lock().unwrap().ops.push(Op::Click(el.token().to_string()));
        Ok(())
    }

    async fn context_click(&self, el: &ElementRef) -> Result<(), DriverError> {
        let mut inner = self.inner.lock().unwrap();
        inner.ops.push(Op::ContextClick(el.token().to_string()));
        let reveal: Vec<&'static str> = inner.reveal_on_context_click.drain(..).collect();
        for id in reveal {
            if let Some(node) = inner.nodes.iter_mut().find(|n| n.id == id) {
                node.visible = true;
            }
        }
        Ok(())
    }

    async fn fill(&self, el: &ElementRef, text: &str) -> Result<(), DriverError> {
        self.inner
            .lock()
            .unwrap()
            .ops
            .push(Op::Fill(el.token().to_string(), text.to_string()));
        Ok(())
    }

    async fn text(&self, el: &ElementRef) -> Result<String, DriverError> {
        let inner = self.inner.lock().unwrap();
        inner
            .nodes
            .iter()
            .find(|n| n.id == el.token())
            .map(|n| n.text.clone())
            .ok_or_else(|| DriverError::Call(format!("stale element: {}", el.token())))
    }

    async fn attribute(
        &self,
        el: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let inner = self.inner.lock().unwrap();
        let node = inner
            .nodes
            .iter()
            .find(|n| n.id == el.token())
            .ok_or_else(|| DriverError::Call(format!("stale element: {}", el.token())))?;
        Ok(node.attrs.get(name).cloned())
    }

    async fn wait_for_navigation(&self, _timeout: Duration) -> Result<WaitOutcome, DriverError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.navigation_outcomes.is_empty() {
            Ok(WaitOutcome::Navigated)
        } else {
            Ok(inner.navigation_outcomes.remove(0))
        }
    }

    async fn wait_for_download(
        &self,
        _timeout: Duration,
    ) -> Result<Option<DownloadEvent>, DriverError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.download_events.is_empty() {
            Ok(None)
        } else {
            Ok(Some(inner.download_events.remove(0)))
        }
    }

    async fn save_download(&self, _event: &DownloadEvent, dest: &Path) -> Result<(), DriverError> {
        std::fs::write(dest, b"fake media bytes")
            .map_err(|e| DriverError::Download(e.to_string()))?;
        self.inner.lock().unwrap().saved.push(dest.to_path_buf());
        Ok(())
    }
}

pub struct FakeSession {
    driver: FakeDriver,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    fn driver(&self) -> &dyn UiDriver {
        &self.driver
    }

    async fn close(&self) -> flowbot::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out sessions over a shared `FakeDriver` and records lifecycle
/// facts the scenario tests assert on.
pub struct FakeLauncher {
    driver: FakeDriver,
    pub launches: Arc<AtomicUsize>,
    pub closed: Arc<AtomicBool>,
}

impl FakeLauncher {
    pub fn new(driver: FakeDriver) -> Self {
        Self {
            driver,
            launches: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self) -> flowbot::Result<Box<dyn BrowserSession>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            driver: self.driver.clone(),
            closed: self.closed.clone(),
        }))
    }
}

/// Settings tuned for virtual-time tests: no settle pauses, short field
/// waits, production polling and download bounds.
pub fn test_settings(output_dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.credentials = Credentials {
        email: Some("user@example.com".into()),
        password: Some("hunter2".into()),
    };
    settings.output_dir = output_dir.to_path_buf();
    settings.timeouts = Timeouts {
        settle: Duration::ZERO,
        field_wait: Duration::from_secs(3),
        ..Timeouts::default()
    };
    settings
}
