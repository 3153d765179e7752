//! Custom error types for the application.
//!
//! This module defines the primary error type, `ThermologError`, for the
//! entire application. Using the `thiserror` crate, it provides a centralized
//! and consistent way to handle the different kinds of errors that can occur,
//! from sensor decode failures to I/O and configuration issues.
//!
//! ## Error Taxonomy
//!
//! - **`MissingData`**: A captured level sequence framed to something other
//!   than 40 pulses. The frame is discarded; no reading is produced.
//! - **`Checksum`**: The fifth byte of a decoded frame did not match the
//!   masked sum of the first four. The frame is discarded.
//! - **`Acquisition`**: Transport-level acquisition failures (device absent,
//!   malformed serial line, timeout). Caught at the acquisition loop and
//!   retried after a fixed backoff.
//! - **`Parse`**: A malformed or incomplete wire message on the ingest side.
//!   Logged per-connection; never crashes the server.
//! - **`WriterQueueClosed`**: A handler raced the writer's shutdown and found
//!   the queue gone. Only reachable while the server is going down.
//! - **`Config`**: Wraps errors from the `config` crate (file parsing,
//!   format issues).
//! - **`Io`**: Wraps `std::io::Error`, covering file and network I/O.
//!
//! Propagation policy: decode errors never cross into the network layer as
//! anything but "no reading produced this cycle"; handler errors never cross
//! into the writer; writer errors never stop the writer.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type Result<T> = std::result::Result<T, ThermologError>;

#[derive(Error, Debug)]
pub enum ThermologError {
    #[error("missing data: framed {pulses} pulses, expected 40")]
    MissingData { pulses: usize },

    #[error("checksum mismatch: frame carried {expected:#04x}, computed {computed:#04x}")]
    Checksum { expected: u8, computed: u8 },

    #[error("acquisition error: {0}")]
    Acquisition(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("writer queue closed")]
    WriterQueueClosed,

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ThermologError {
    /// Whether the acquisition loop may retry after this error.
    ///
    /// Decode and transport errors are transient per cycle; configuration and
    /// I/O failures at startup are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ThermologError::MissingData { .. }
                | ThermologError::Checksum { .. }
                | ThermologError::Acquisition(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_are_transient() {
        assert!(ThermologError::MissingData { pulses: 39 }.is_transient());
        assert!(ThermologError::Checksum {
            expected: 0x10,
            computed: 0x11
        }
        .is_transient());
        assert!(ThermologError::Acquisition("port vanished".into()).is_transient());
    }

    #[test]
    fn io_errors_are_not_transient() {
        let err = ThermologError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(!err.is_transient());
    }

    #[test]
    fn missing_data_reports_pulse_count() {
        let msg = ThermologError::MissingData { pulses: 12 }.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("40"));
    }
}
