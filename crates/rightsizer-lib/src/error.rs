//! Error types for the recommendation library

use thiserror::Error;

/// Fatal configuration errors raised while building a recommendation model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("recommendation model name must not be empty")]
    EmptyModelName,

    #[error("recommendation tunables are required to build model '{0}'")]
    MissingTunables(String),
}

/// Rejected input to the unit conversion helpers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("amount or format is missing")]
    MissingAmountOrFormat,

    #[error("value cannot be negative: {0}")]
    NegativeValue(f64),

    #[error("unsupported memory format: {0}")]
    UnsupportedMemoryFormat(String),

    #[error("unsupported format for CPU conversion: {0}")]
    UnsupportedCpuFormat(String),

    #[error("unsupported format for accelerator conversion: {0}")]
    UnsupportedAcceleratorFormat(String),
}
