//! Environment-banner forwarding proxy.
//!
//! Sits between clients and a single upstream HTTP service, forwarding every
//! request untouched (aside from the usual proxy headers) and splicing a
//! fixed environment banner into every HTML response, immediately after the
//! opening `<body>` tag.
//!
//! # Data Flow
//! ```text
//! client request
//!     → http::server (Axum catch-all handler)
//!     → http::request (retarget URI, preserve Host, strip Accept-Encoding,
//!                      add X-Forwarded-*)
//!     → upstream
//!     → http::response (media-type gate; HTML bodies wrapped in the
//!                       streaming banner injector, everything else passed
//!                       through unbuffered)
//!     → client
//! ```
//!
//! The banner itself is built once at startup by [`rewrite::Banner`] and
//! shared read-only across all requests; [`rewrite::BodyScanner`] is the
//! streaming state machine that finds the injection point.

pub mod config;
pub mod http;
pub mod rewrite;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use rewrite::Banner;
