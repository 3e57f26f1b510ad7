//! Semantic validation of the configured upstream.
//!
//! # Responsibilities
//! - Parse the upstream URL and reject anything the rewriter cannot honor
//! - Pre-split the URL into the scheme and authority spliced into every
//!   outbound request URI
//!
//! # Design Decisions
//! - The rewriter replaces scheme and authority only, so a URL carrying a
//!   path, query, or fragment would be silently misrouted — rejected up
//!   front instead
//! - The plain HTTP connector has no TLS, so `https` upstreams are refused
//!   at startup rather than failing on the first request

use std::str::FromStr;

use axum::http::uri::{Authority, Scheme};
use url::Url;

use crate::config::schema::UpstreamConfig;

/// Error type for configuration validation.
#[derive(Debug)]
pub enum ConfigError {
    /// Upstream URL failed to parse.
    Parse(url::ParseError),
    /// Upstream scheme is not plain http.
    UnsupportedScheme(String),
    /// Upstream URL carries a path, query, or fragment.
    NotABaseUrl(String),
    /// Upstream URL has no usable host.
    MissingHost(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "Invalid upstream URL: {}", e),
            ConfigError::UnsupportedScheme(scheme) => {
                write!(f, "Unsupported upstream scheme '{}': only http is supported", scheme)
            }
            ConfigError::NotABaseUrl(url) => {
                write!(f, "Upstream URL '{}' must not carry a path, query, or fragment", url)
            }
            ConfigError::MissingHost(url) => write!(f, "Upstream URL '{}' has no host", url),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validated upstream target, pre-split for per-request URI rewriting.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    pub scheme: Scheme,
    pub authority: Authority,
}

/// Parse and validate the upstream URL.
pub fn validate_upstream(config: &UpstreamConfig) -> Result<UpstreamTarget, ConfigError> {
    let url = Url::parse(&config.url).map_err(ConfigError::Parse)?;

    if url.scheme() != "http" {
        return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
    }
    if !matches!(url.path(), "" | "/") || url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::NotABaseUrl(config.url.clone()));
    }
    let host = url
        .host_str()
        .ok_or_else(|| ConfigError::MissingHost(config.url.clone()))?;

    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let authority = Authority::from_str(&authority)
        .map_err(|_| ConfigError::MissingHost(config.url.clone()))?;

    Ok(UpstreamTarget {
        scheme: Scheme::HTTP,
        authority,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(url: &str) -> UpstreamConfig {
        UpstreamConfig {
            url: url.to_string(),
        }
    }

    #[test]
    fn test_default_upstream_is_valid() {
        let target = validate_upstream(&UpstreamConfig::default()).unwrap();
        assert_eq!(target.authority.as_str(), "127.0.0.1:8000");
        assert_eq!(target.scheme.as_str(), "http");
    }

    #[test]
    fn test_host_without_port_is_valid() {
        let target = validate_upstream(&upstream("http://backend.internal")).unwrap();
        assert_eq!(target.authority.as_str(), "backend.internal");
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            validate_upstream(&upstream("not a url")),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_https_is_rejected() {
        assert!(matches!(
            validate_upstream(&upstream("https://backend.internal")),
            Err(ConfigError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_path_is_rejected() {
        assert!(matches!(
            validate_upstream(&upstream("http://backend.internal/base")),
            Err(ConfigError::NotABaseUrl(_))
        ));
    }

    #[test]
    fn test_query_is_rejected() {
        assert!(matches!(
            validate_upstream(&upstream("http://backend.internal/?x=1")),
            Err(ConfigError::NotABaseUrl(_))
        ));
    }
}
