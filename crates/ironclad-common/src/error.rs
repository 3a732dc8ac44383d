//! Error types for Ironclad.

use thiserror::Error;

/// Top-level error type for Ironclad operations.
#[derive(Debug, Error)]
pub enum IroncladError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Raster decode errors
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Result type for Ironclad operations.
pub type IroncladResult<T> = Result<T, IroncladError>;

/// Invalid tuning parameters. Construction fails on any of these.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Value must be strictly positive
    #[error("{field} must be positive, got {value}")]
    NonPositive {
        /// Name of the offending field
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// Value must be finite
    #[error("{field} must be finite, got {value}")]
    NonFinite {
        /// Name of the offending field
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// Value exceeds its upper bound
    #[error("{field} must be at most {max}, got {value}")]
    TooLarge {
        /// Name of the offending field
        field: &'static str,
        /// Offending value
        value: u64,
        /// Largest accepted value
        max: u64,
    },

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Checks that `value` is finite and strictly positive.
    pub fn require_positive(field: &'static str, value: f64) -> Result<f64, Self> {
        if !value.is_finite() {
            return Err(Self::NonFinite { field, value });
        }
        if value <= 0.0 {
            return Err(Self::NonPositive { field, value });
        }
        Ok(value)
    }

    /// Checks that an integer parameter is non-zero.
    pub fn require_nonzero(field: &'static str, value: u32) -> Result<u32, Self> {
        if value == 0 {
            return Err(Self::NonPositive {
                field,
                value: f64::from(value),
            });
        }
        Ok(value)
    }

    /// Checks that an integer parameter does not exceed `max`.
    pub fn require_at_most(field: &'static str, value: u64, max: u64) -> Result<u64, Self> {
        if value > max {
            return Err(Self::TooLarge { field, value, max });
        }
        Ok(value)
    }
}

/// Raster decode errors reported by a decode service.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Header magic or fields are invalid
    #[error("Invalid image header: {0}")]
    InvalidHeader(String),

    /// Buffer ended before the image was complete
    #[error("Truncated image data: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes required
        expected: usize,
        /// Bytes available
        actual: usize,
    },
}
