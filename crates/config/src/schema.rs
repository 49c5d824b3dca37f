use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
}

/// HTTP/WebSocket server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u16,
    /// Origin allowed to send credentialed requests.
    pub cors_origin: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 5000,
            cors_origin: "http://localhost:3000".into(),
        }
    }
}

/// Session token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. Overridden by `STOREFRONT_SECRET`.
    pub secret: String,
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: "secret_key_Ecommerce".into(),
            token_ttl_hours: 24,
        }
    }
}

/// Store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Overridden by `STOREFRONT_DB`.
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://storefront.db?mode=rwc".into(),
        }
    }
}

impl StorefrontConfig {
    /// Apply environment overrides on top of whatever was loaded from disk.
    pub fn apply_env(mut self) -> Self {
        if let Ok(secret) = std::env::var("STOREFRONT_SECRET") {
            self.auth.secret = secret;
        }
        if let Ok(url) = std::env::var("STOREFRONT_DB") {
            self.database.url = url;
        }
        if let Ok(port) = std::env::var("PORT")
            && let Ok(port) = port.parse()
        {
            self.gateway.port = port;
        }
        self
    }
}
