use crate::weather::DEFAULT_WEATHER_URL;
use std::{env, path::PathBuf, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub weather_url: String,
    pub weather_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            data_dir: PathBuf::from("data"),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            weather_timeout: Duration::from_secs(10),
        }
    }
}

impl AppConfig {
    /// Reads `PORT`, `APP_DATA_DIR`, `WEATHER_API_URL` and
    /// `WEATHER_TIMEOUT_SECS`; anything unset or unparsable keeps its default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: lookup("PORT")
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: lookup("APP_DATA_DIR")
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            weather_url: lookup("WEATHER_API_URL")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.weather_url),
            weather_timeout: lookup("WEATHER_TIMEOUT_SECS")
                .and_then(|value| value.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.weather_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn unset_and_garbage_values_keep_defaults() {
        let vars = HashMap::from([("PORT", "eighty"), ("WEATHER_TIMEOUT_SECS", "-3")]);
        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.weather_url, DEFAULT_WEATHER_URL);
        assert_eq!(config.weather_timeout, Duration::from_secs(10));
    }

    #[test]
    fn env_values_override_defaults() {
        let vars = HashMap::from([
            ("PORT", "9123"),
            ("APP_DATA_DIR", "/tmp/hunts"),
            ("WEATHER_API_URL", "http://localhost:9999"),
            ("WEATHER_TIMEOUT_SECS", "3"),
        ]);
        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.port, 9123);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/hunts"));
        assert_eq!(config.weather_url, "http://localhost:9999");
        assert_eq!(config.weather_timeout, Duration::from_secs(3));
    }
}
