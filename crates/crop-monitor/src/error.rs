use crate::config::ConfigError;
use crate::indicators::StoreError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde_json::json;
use std::fmt;

/// Failure modes of the stress and forecast operations.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("'{fips}' is not a recognized Iowa county FIPS code")]
    InvalidCounty { fips: String },
    #[error("no indicator rows for county {fips} between {start} and {end}")]
    NotFound {
        fips: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("no indicator history for county {fips} through week {week} of {year}")]
    InsufficientData { fips: String, year: i32, week: u32 },
    #[error("window end {end} precedes window start {start}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
    #[error("week {week} is outside the growing season (weeks 1-{max})")]
    InvalidWeek { week: u32, max: u32 },
    #[error("sub-index weights must sum to 1.0 with no negative entries (sum was {sum:.4})")]
    InvalidWeightConfiguration { sum: f64 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AnalyticsError {
    /// Stable machine-readable code for API payloads.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidCounty { .. } => "invalid_county",
            Self::NotFound { .. } => "not_found",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::InvalidWindow { .. } => "invalid_window",
            Self::InvalidWeek { .. } => "invalid_week",
            Self::InvalidWeightConfiguration { .. } => "invalid_weight_configuration",
            Self::Store(_) => "store_unavailable",
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCounty { .. } | Self::InvalidWindow { .. } | Self::InvalidWeek { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidWeightConfiguration { .. } | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AnalyticsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string(), "code": self.code() }));
        (status, body).into_response()
    }
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Analytics(AnalyticsError),
    Store(StoreError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Analytics(err) => write!(f, "analytics error: {}", err),
            AppError::Store(err) => write!(f, "indicator store error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Analytics(err) => Some(err),
            AppError::Store(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Analytics(err) => err.into_response(),
            other => {
                let body = Json(json!({ "error": other.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<AnalyticsError> for AppError {
    fn from(value: AnalyticsError) -> Self {
        Self::Analytics(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analytics_errors_map_to_http_statuses() {
        let invalid = AnalyticsError::InvalidCounty {
            fips: "17031".to_string(),
        };
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.code(), "invalid_county");

        let sparse = AnalyticsError::InsufficientData {
            fips: "19001".to_string(),
            year: 2024,
            week: 3,
        };
        assert_eq!(sparse.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = AppError::from(sparse).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
