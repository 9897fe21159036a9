use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("host denied access to {0}")]
    Denied(&'static str),

    #[error("{0} is not supported by this host")]
    Unsupported(&'static str),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("zoom bounds must be positive (got {min}..{max})")]
    NonPositiveZoom { min: f32, max: f32 },

    #[error("zoom_min {min} is greater than zoom_max {max}")]
    InvertedZoom { min: f32, max: f32 },

    #[error("initial zoom {0} lies outside the configured zoom bounds")]
    InitialZoomOutOfBounds(f32),

    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be at least 1 (got {value})")]
    BelowOne { field: &'static str, value: f32 },
}

impl ConfigError {
    pub fn non_positive(field: &'static str, value: impl Into<f64>) -> Self {
        Self::NonPositive {
            field,
            value: value.into(),
        }
    }

    pub fn negative(field: &'static str, value: impl Into<f64>) -> Self {
        Self::Negative {
            field,
            value: value.into(),
        }
    }
}
