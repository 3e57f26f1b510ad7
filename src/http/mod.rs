//! HTTP forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (Axum catch-all handler, one task per request)
//!     → request.rs (retarget URI, preserve Host, strip Accept-Encoding,
//!                   add X-Forwarded-*)
//!     → upstream (hyper legacy client)
//!     → response.rs (media-type gate + streaming banner injection)
//!     → client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use response::InterceptError;
pub use server::HttpServer;
