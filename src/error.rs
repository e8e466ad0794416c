//! Unified error type.

use thiserror::Error;

/// The error type returned by zipserve's fallible startup operations.
///
/// Per-request failures (missing folder, unspawnable archiver, a client
/// hanging up) never surface here — they become HTTP status codes or debug
/// traces inside the handlers. This type covers the failures that stop the
/// service itself: a malformed listen address or a socket that can't be
/// bound.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid listen address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
