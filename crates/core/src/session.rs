use async_trait::async_trait;

use crate::driver::UiDriver;
use crate::error::Result;

/// One live browser context. Exactly one session exists per workflow run
/// and the orchestrator releases it on every exit path.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    fn driver(&self) -> &dyn UiDriver;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}
