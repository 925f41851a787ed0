use crate::config::DatabaseBackend;
use crate::domain::ports::ReadinessProbe;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::net::TcpStream;
use url::Url;

/// Succeeds when a TCP connection to `host:port` is accepted
pub struct TcpProbe {
    name: String,
    host: String,
    port: u16,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            name: format!("tcp://{}:{}", host, port),
            host,
            port,
        }
    }

    /// Derive the endpoint from a database URL, using the backend's standard
    /// port when the URL names none.
    pub fn from_database_url(raw: &str) -> Result<Self> {
        let backend = DatabaseBackend::from_url(raw)?;
        let default_port = backend
            .default_port()
            .context("sqlite databases have no network endpoint to probe")?;

        let url = Url::parse(raw).context("Failed to parse DATABASE_URL")?;
        let host = url
            .host_str()
            .context("DATABASE_URL has no host")?
            .to_string();

        Ok(Self::new(host, url.port().unwrap_or(default_port)))
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait]
impl ReadinessProbe for TcpProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<()> {
        TcpStream::connect((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("connect to {}:{}", self.host, self.port))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_from_database_url() {
        let probe = TcpProbe::from_database_url("postgres://u:p@db/exchange").unwrap();
        assert_eq!(probe.name(), "tcp://db:5432");

        let probe = TcpProbe::from_database_url("postgresql://u:p@localhost:6543/x").unwrap();
        assert_eq!(probe.port(), 6543);

        assert!(TcpProbe::from_database_url("sqlite://stock_market.db").is_err());
    }

    #[tokio::test]
    async fn test_accepting_listener_succeeds() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = TcpProbe::new("127.0.0.1", port);
        assert!(probe.check().await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_port_fails() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let probe = TcpProbe::new("127.0.0.1", port);
        assert!(probe.check().await.is_err());
    }
}
