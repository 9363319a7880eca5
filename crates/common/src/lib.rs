//! Shared building blocks for the catalog binaries and crates.

pub mod types;

pub mod utils {
    pub mod logging;
}

/// Header carrying the per-request correlation id, echoed on every response.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
