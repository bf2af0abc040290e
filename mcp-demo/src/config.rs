//! Server configuration.

/// Settings for one server instance.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Public base URL advertised as the OAuth issuer. Falls back to the
    /// bind address when unset.
    pub public_url: Option<String>,
    /// Reject MCP requests that carry no `Authorization` header.
    pub require_auth: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 6277,
            public_url: None,
            require_auth: false,
        }
    }
}

impl ServerConfig {
    /// Socket address string for the TCP listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Issuer base URL used in the OAuth discovery documents.
    #[must_use]
    pub fn issuer(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_defaults_to_bind_address() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:6277");
        assert_eq!(config.issuer(), "http://127.0.0.1:6277");
    }

    #[test]
    fn issuer_prefers_public_url() {
        let config = ServerConfig {
            public_url: Some("https://mcp.example.com".to_owned()),
            ..ServerConfig::default()
        };
        assert_eq!(config.issuer(), "https://mcp.example.com");
    }
}
