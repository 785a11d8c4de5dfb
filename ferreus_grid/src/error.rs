/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the error type shared by every gridding operation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Error types for ferreus_grid.

use thiserror::Error;

/// Errors raised by data validation, fitting, prediction and masking.
///
/// Every error is returned at the call that detects the violation. A failed
/// `fit` never modifies the estimator it was called on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridderError {
    /// Zero-length input where at least one point is required.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Out-of-range parameter or inconsistent input shapes.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// The spline system cannot be solved safely.
    #[error("singular system: {0}")]
    SingularSystem(String),

    /// Predict, grid or score called before a successful fit.
    #[error("{0} has not been fitted")]
    NotFitted(String),

    /// Prediction requested from an estimator that only filters data.
    #[error("{0} does not support prediction")]
    NotPredictive(String),
}

impl GridderError {
    pub(crate) fn invalid(name: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        GridderError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for ferreus_grid operations.
pub type Result<T> = std::result::Result<T, GridderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_message() {
        let err = GridderError::invalid("spacing", -1.0, "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid parameter: spacing = -1 (must be positive)"
        );
    }

    #[test]
    fn not_fitted_message() {
        let err = GridderError::NotFitted("Spline".into());
        assert_eq!(err.to_string(), "Spline has not been fitted");
    }
}
