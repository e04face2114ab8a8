/*!
    Error type shared by every crate in the pipeline.
*/

use thiserror::Error;

/**
    Errors produced while configuring, encoding, or muxing.

    Transient encoder backpressure and end-of-stream are not errors; they are
    reported as [`DrainStatus`](crate::DrainStatus) values.
*/
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ── Configuration ─────────────────────────────────────────────────
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("filter graph error: {0}")]
    Filter(String),

    // ── Input ─────────────────────────────────────────────────────────
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("invalid state: expected {expected}, was {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    // ── Encoding ──────────────────────────────────────────────────────
    #[error("encoder rejected frame: {0}")]
    EncodeSubmit(String),
    #[error("codec error: {0}")]
    Codec(String),

    // ── Output ────────────────────────────────────────────────────────
    #[error("mux error: {0}")]
    Mux(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn filter(msg: impl Into<String>) -> Self {
        Self::Filter(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    pub fn invalid_state(expected: &'static str, actual: &'static str) -> Self {
        Self::InvalidState { expected, actual }
    }

    pub fn encode_submit(msg: impl Into<String>) -> Self {
        Self::EncodeSubmit(msg.into())
    }

    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    pub fn mux(msg: impl Into<String>) -> Self {
        Self::Mux(msg.into())
    }

    /**
        True for errors raised while configuring or opening, before any
        byte of the container is written.
    */
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::UnsupportedFormat(_) | Self::Filter(_)
        )
    }

    /**
        True when the stream that raised this error cannot accept more input.
    */
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::EncodeSubmit(_) | Self::Codec(_) | Self::Mux(_))
    }
}

/// Result alias used throughout the pipeline crates.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy() {
        assert!(Error::config("x").is_configuration());
        assert!(Error::filter("x").is_configuration());
        assert!(!Error::config("x").is_fatal());
        assert!(Error::encode_submit("x").is_fatal());
        assert!(!Error::invalid_data("x").is_fatal());
        assert!(!Error::invalid_state("opened", "closed").is_configuration());
    }

    #[test]
    fn io_errors_convert() {
        fn read_missing() -> Result<u64> {
            Ok(std::fs::metadata("/no/such/export/file.mp4")?.len())
        }
        let err = read_missing().unwrap_err();
        assert!(matches!(&err, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound));
        assert!(!err.is_configuration());
    }

    #[test]
    fn invalid_state_message() {
        let err = Error::invalid_state("opened", "configured");
        assert_eq!(err.to_string(), "invalid state: expected opened, was configured");
    }
}
