//! Chromium implementation of the `flowbot` driver traits, built on the
//! DevTools protocol via `chromiumoxide`.

pub mod driver;
mod js;
pub mod launcher;

pub use driver::CdpDriver;
pub use launcher::CdpLauncher;
