use crate::domain::ports::ReadinessProbe;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Succeeds when a GET to `url` answers with a 2xx status
pub struct HttpProbe {
    url: String,
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl ReadinessProbe for HttpProbe {
    fn name(&self) -> &str {
        &self.url
    }

    async fn check(&self) -> Result<()> {
        self.client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?
            .error_for_status()
            .with_context(|| format!("GET {}", self.url))?;
        Ok(())
    }
}
