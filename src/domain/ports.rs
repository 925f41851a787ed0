use anyhow::Result;
use async_trait::async_trait;

/// A check that succeeds only when its target accepts traffic
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Short label used in logs and readiness events
    fn name(&self) -> &str;

    async fn check(&self) -> Result<()>;
}
