//! Response-rewriting pipeline.
//!
//! # Data Flow
//! ```text
//! startup flags (message, color)
//!     → banner.rs (build the style-isolated fragment once)
//!
//! upstream HTML body, chunk by chunk
//!     → scanner.rs (tokenize while SCANNING, splice the banner after the
//!                   first <body> start tag, then verbatim COPYING)
//!     → rewritten chunks
//! ```
//!
//! # Design Decisions
//! - The banner is immutable bytes shared read-only by every request
//! - The scanner never normalizes input; every non-banner byte is emitted
//!   exactly as received

pub mod banner;
pub mod scanner;

pub use banner::Banner;
pub use scanner::BodyScanner;
