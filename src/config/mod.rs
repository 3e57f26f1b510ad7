//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command-line flags
//!     → cli.rs (clap parse)
//!     → ProxyConfig (immutable for the process lifetime)
//!     → validation.rs (upstream URL → scheme + authority, fail-fast)
//!     → shared with every handler through the server state
//! ```
//!
//! # Design Decisions
//! - Flags only: no file or environment configuration, nothing persisted
//! - Validation is separated from flag parsing and runs before the first
//!   connection is accepted

pub mod cli;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use schema::ProxyConfig;
pub use validation::{validate_upstream, ConfigError, UpstreamTarget};
