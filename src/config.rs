use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the alert-card service.
    pub alert_api_url: String,
    /// Base URL of the margin-check agent.
    pub agent_api_url: String,
    /// Cadence of the alert-card poll tick.
    pub poll_interval: Duration,
    /// Cadence of the notification dedup-window clear.
    pub dedup_window: Duration,
    /// Margin level (percent) above which a card breaches. Deliberately low
    /// by default so the behavior is observable on demo data.
    pub margin_threshold: f64,
    /// Hard deadline on free-text lookup requests.
    pub lookup_timeout: Duration,
    /// Minimum spacing between operator-triggered manual refreshes.
    pub manual_refresh_debounce: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let alert_api_url = env_map
            .get("ALERT_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("ALERT_API_URL".to_string()))?;

        let agent_api_url = env_map
            .get("AGENT_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("AGENT_API_URL".to_string()))?;

        let poll_interval = parse_ms(&env_map, "POLL_INTERVAL_MS", 60_000)?;
        let dedup_window = parse_ms(&env_map, "DEDUP_WINDOW_MS", 60_000)?;
        let lookup_timeout = parse_ms(&env_map, "LOOKUP_TIMEOUT_MS", 10_000)?;
        let manual_refresh_debounce = parse_ms(&env_map, "MANUAL_REFRESH_DEBOUNCE_MS", 1_000)?;

        let margin_threshold = env_map
            .get("MARGIN_THRESHOLD")
            .map(|s| s.as_str())
            .unwrap_or("10")
            .parse::<f64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "MARGIN_THRESHOLD".to_string(),
                    "must be a valid number".to_string(),
                )
            })?;
        if !margin_threshold.is_finite() || margin_threshold < 0.0 {
            return Err(ConfigError::InvalidValue(
                "MARGIN_THRESHOLD".to_string(),
                "must be a non-negative finite number".to_string(),
            ));
        }

        Ok(Config {
            alert_api_url,
            agent_api_url,
            poll_interval,
            dedup_window,
            margin_threshold,
            lookup_timeout,
            manual_refresh_debounce,
        })
    }
}

fn parse_ms(
    env_map: &HashMap<String, String>,
    key: &str,
    default_ms: u64,
) -> Result<Duration, ConfigError> {
    let ms = match env_map.get(key) {
        Some(s) => s.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), "must be a valid u64".to_string())
        })?,
        None => default_ms,
    };
    if ms == 0 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_millis(ms))
}
