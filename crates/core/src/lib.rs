//! Workflow engine for the Flow generative-video studio.
//!
//! Turns an unreliable, selector-driven web UI into a deterministic
//! multi-step operation: authenticate, submit a prompt, poll the page for
//! a terminal signal with bounded waiting, and capture the downloaded
//! artifact. The browser itself sits behind the capability traits in
//! [`driver`] and [`session`]; `flowbot-cdp` provides the Chromium
//! implementation and tests provide scripted fakes.

pub mod auth;
pub mod clock;
pub mod config;
pub mod download;
pub mod driver;
pub mod error;
pub mod generate;
pub mod poll;
pub mod selector;
pub mod session;
pub mod ui;
pub mod workflow;

pub use error::{FlowError, Result};
pub use workflow::{Workflow, WorkflowRequest, WorkflowResult};
