//! Validation utilities for sketch deserialization and parameter bounds checking

use crate::common::{Result, SketchError};

/// Maximum serialized sketch size (256MB) to prevent resource exhaustion
pub const MAX_BYTE_SIZE: usize = 256 * 1024 * 1024; // 256MB

/// Maximum accepted bin cap for a collapsing store (2^20 bins)
pub const MAX_BIN_LIMIT: usize = 1 << 20;

/// Validate that a value is a valid probability (0.0 < p < 1.0)
/// Used for relative accuracy parameters
pub fn validate_probability(value: f64, param_name: &str) -> Result<()> {
    if !(0.0 < value && value < 1.0) {
        return Err(SketchError::InvalidParameter {
            param: param_name.to_string(),
            value: value.to_string(),
            constraint: "must be in range (0.0, 1.0) (exclusive)".to_string(),
        });
    }
    Ok(())
}

/// Validate a collapsing store's cap on live bins
pub fn validate_bin_limit(bin_limit: usize) -> Result<()> {
    if bin_limit == 0 {
        return Err(SketchError::InvalidParameter {
            param: "bin_limit".to_string(),
            value: bin_limit.to_string(),
            constraint: "must be greater than 0".to_string(),
        });
    }
    if bin_limit > MAX_BIN_LIMIT {
        return Err(SketchError::InvalidParameter {
            param: "bin_limit".to_string(),
            value: bin_limit.to_string(),
            constraint: format!("must not exceed {}", MAX_BIN_LIMIT),
        });
    }
    Ok(())
}

/// Validate that a deserialized byte size doesn't exceed safety limits
pub fn validate_byte_size(size: usize) -> Result<()> {
    if size > MAX_BYTE_SIZE {
        return Err(SketchError::DeserializationError(format!(
            "Deserialized sketch size {} exceeds maximum allowed size {}",
            size, MAX_BYTE_SIZE
        )));
    }
    Ok(())
}

/// Validate minimum required bytes for deserialization header
pub fn validate_min_size(actual: usize, required: usize) -> Result<()> {
    if actual < required {
        return Err(SketchError::DeserializationError(format!(
            "Insufficient data: need at least {} bytes, got {}",
            required, actual
        )));
    }
    Ok(())
}
