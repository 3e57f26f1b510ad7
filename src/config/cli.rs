//! Command-line interface.

use clap::Parser;

use crate::config::schema::{BannerConfig, ListenerConfig, ProxyConfig, UpstreamConfig};

/// Transparent forwarding proxy that injects an environment banner into
/// every HTML page served through it.
#[derive(Debug, Parser)]
#[command(name = "banner-proxy", version)]
pub struct Cli {
    /// Upstream base URL
    #[arg(short = 'u', long, default_value = "http://127.0.0.1:8000")]
    pub upstream: String,

    /// Listen address
    #[arg(short = 'l', long, default_value = "0.0.0.0:8001")]
    pub listen: String,

    /// Banner message
    #[arg(short = 'm', long, default_value = "Production")]
    pub message: String,

    /// CSS color of the banner
    #[arg(short = 'c', long, default_value = "red")]
    pub color: String,
}

impl Cli {
    /// Convert parsed flags into the runtime configuration.
    pub fn into_config(self) -> ProxyConfig {
        ProxyConfig {
            listener: ListenerConfig {
                bind_address: self.listen,
            },
            upstream: UpstreamConfig {
                url: self.upstream,
            },
            banner: BannerConfig {
                message: self.message,
                color: self.color,
            },
        }
    }
}
