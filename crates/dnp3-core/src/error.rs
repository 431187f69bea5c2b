use thiserror::Error;

/// Construction-time errors for the dissector and its context table.
///
/// The core never returns an error for data-plane conditions: malformed
/// frames, segments, and application payloads all become sink events
/// instead. This enum only covers host misconfiguration discovered while
/// building a dissector.
#[derive(Error, Debug)]
pub enum Error {
    #[error("context table capacity must be at least 1, got {requested}")]
    ZeroCapacity { requested: usize },

    #[error("per-context raw buffer capacity must be at least {minimum}, got {requested}")]
    BufferTooSmall { requested: usize, minimum: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
