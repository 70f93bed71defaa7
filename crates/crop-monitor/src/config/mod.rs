use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::forecast::ForecastConfig;
use crate::stress::{StressConfig, StressWeights};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub analytics: AnalyticsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            analytics: AnalyticsConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Stress weights, completeness thresholds and the indicator source.
///
/// Weights are only parsed here; the sum-to-one rule is enforced when the
/// aggregator is built so a bad configuration stops startup.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub stress: StressConfig,
    pub forecast: ForecastConfig,
    pub baseline_yield: f64,
    pub indicator_csv: Option<PathBuf>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            stress: StressConfig::default(),
            forecast: ForecastConfig::default(),
            baseline_yield: 200.0,
            indicator_csv: None,
        }
    }
}

impl AnalyticsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("CROP_STRESS_WEIGHTS") {
            config.stress.weights = parse_weights(&raw)?;
        }
        if let Ok(raw) = env::var("CROP_STRESS_MIN_COVERAGE") {
            config.stress.min_window_coverage =
                parse_fraction("CROP_STRESS_MIN_COVERAGE", &raw)?;
        }
        if let Ok(raw) = env::var("CROP_FORECAST_MAX_MISSING_FRACTION") {
            config.forecast.max_missing_fraction =
                parse_fraction("CROP_FORECAST_MAX_MISSING_FRACTION", &raw)?;
        }
        if let Ok(raw) = env::var("CROP_BASELINE_YIELD") {
            config.baseline_yield = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite() && *value > 0.0)
                .ok_or(ConfigError::InvalidBaselineYield { value: raw.clone() })?;
        }
        config.indicator_csv = env::var("CROP_INDICATOR_CSV")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}

/// Parse `water,heat,vegetation,atmosphere`.
pub fn parse_weights(raw: &str) -> Result<StressWeights, ConfigError> {
    let values: Vec<f64> = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| ConfigError::InvalidWeights {
            value: raw.to_string(),
        })?;

    match values.as_slice() {
        [water, heat, vegetation, atmosphere] => Ok(StressWeights {
            water: *water,
            heat: *heat,
            vegetation: *vegetation,
            atmosphere: *atmosphere,
        }),
        _ => Err(ConfigError::InvalidWeights {
            value: raw.to_string(),
        }),
    }
}

fn parse_fraction(name: &'static str, raw: &str) -> Result<f64, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| (0.0..=1.0).contains(value))
        .ok_or(ConfigError::InvalidFraction {
            name,
            value: raw.to_string(),
        })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidWeights { value: String },
    InvalidFraction { name: &'static str, value: String },
    InvalidBaselineYield { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidWeights { value } => write!(
                f,
                "CROP_STRESS_WEIGHTS must list four numbers (water,heat,vegetation,atmosphere), got '{}'",
                value
            ),
            ConfigError::InvalidFraction { name, value } => {
                write!(f, "{} must be a number between 0 and 1, got '{}'", name, value)
            }
            ConfigError::InvalidBaselineYield { value } => {
                write!(f, "CROP_BASELINE_YIELD must be a positive number, got '{}'", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "CROP_STRESS_WEIGHTS",
            "CROP_STRESS_MIN_COVERAGE",
            "CROP_FORECAST_MAX_MISSING_FRACTION",
            "CROP_BASELINE_YIELD",
            "CROP_INDICATOR_CSV",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.analytics.stress.weights, StressWeights::default());
        assert_eq!(config.analytics.forecast.max_missing_fraction, 0.25);
        assert!(config.analytics.indicator_csv.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_analytics_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CROP_STRESS_WEIGHTS", "0.25, 0.25, 0.25, 0.25");
        env::set_var("CROP_FORECAST_MAX_MISSING_FRACTION", "0.4");
        env::set_var("CROP_INDICATOR_CSV", "/data/indicators.csv");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.analytics.stress.weights.heat, 0.25);
        assert_eq!(config.analytics.forecast.max_missing_fraction, 0.4);
        assert_eq!(
            config.analytics.indicator_csv,
            Some(PathBuf::from("/data/indicators.csv"))
        );
        reset_env();
    }

    #[test]
    fn rejects_malformed_weight_lists() {
        assert!(matches!(
            parse_weights("0.5,0.5"),
            Err(ConfigError::InvalidWeights { .. })
        ));
        assert!(matches!(
            parse_weights("0.4,0.3,heavy,0.1"),
            Err(ConfigError::InvalidWeights { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_fractions() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CROP_STRESS_MIN_COVERAGE", "1.5");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFraction { .. })
        ));
        reset_env();
    }
}
