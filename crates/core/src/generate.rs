//! Prompt entry and job kickoff on the create page.

use std::time::Duration;

use tracing::info;

use crate::clock::Clock;
use crate::config::Settings;
use crate::driver::{UiDriver, WaitUntil};
use crate::error::Result;
use crate::selector::{self, Constraints};
use crate::ui;

/// Pause between focusing the prompt field and typing, so client-side
/// editors finish attaching their handlers.
const FOCUS_DELAY: Duration = Duration::from_millis(500);

pub struct JobSubmitter<'a> {
    driver: &'a dyn UiDriver,
    clock: &'a dyn Clock,
    settings: &'a Settings,
}

impl<'a> JobSubmitter<'a> {
    pub fn new(driver: &'a dyn UiDriver, clock: &'a dyn Clock, settings: &'a Settings) -> Self {
        Self { driver, clock, settings }
    }

    pub async fn open_create_page(&self) -> Result<()> {
        let url = &self.settings.urls.flow_create;
        info!(target = "flowbot", %url, "opening create page");
        self.driver.goto(url, WaitUntil::NetworkIdle).await?;
        self.clock.sleep(self.settings.timeouts.settle).await;
        Ok(())
    }

    pub async fn enter_prompt(&self, text: &str) -> Result<()> {
        let field =
            selector::resolve(self.driver, &ui::prompt_input(), Constraints::visible()).await?;
        self.driver.click(&field).await?;
        self.clock.sleep(FOCUS_DELAY).await;
        self.driver.fill(&field, text).await?;
        info!(target = "flowbot", chars = text.len(), "prompt entered");
        Ok(())
    }

    pub async fn trigger_generation(&self) -> Result<()> {
        let button =
            selector::resolve(self.driver, &ui::generate_button(), Constraints::actionable())
                .await?;
        self.driver.click(&button).await?;
        info!(target = "flowbot", "generation triggered");
        Ok(())
    }
}
