//! Configuration schema definitions.
//!
//! Every value comes from a command-line flag; defaults below match the
//! flag defaults.

/// Root configuration for the proxy.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream target.
    pub upstream: UpstreamConfig,

    /// Banner appearance.
    pub banner: BannerConfig,
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8001").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8001".to_string(),
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the upstream service: scheme and authority only.
    pub url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

/// Banner appearance configuration.
#[derive(Debug, Clone)]
pub struct BannerConfig {
    /// Message shown in the banner; HTML-escaped before embedding.
    pub message: String,

    /// CSS color token for the banner background; spliced in verbatim.
    pub color: String,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            message: "Production".to_string(),
            color: "red".to_string(),
        }
    }
}
