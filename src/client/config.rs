use std::env;

/// Settings for [`PortalClient`](super::PortalClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 30,
            token: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            base_url: env::var("PORTAL_API_URL").unwrap_or(defaults.base_url),
            timeout_seconds: env::var("PORTAL_API_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.timeout_seconds),
            token: env::var("PORTAL_API_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}
