use chrono::FixedOffset;
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/store.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    /// `None` follows the host's local time.
    pub utc_offset: Option<FixedOffset>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match value("PORT") {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|err| {
                warn!("ignoring PORT={raw:?}: {err}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let data_path = value("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let utc_offset = value("APP_UTC_OFFSET").and_then(|raw| {
            raw.trim()
                .parse::<FixedOffset>()
                .map_err(|err| warn!("ignoring APP_UTC_OFFSET={raw:?}: {err}"))
                .ok()
        });

        Self {
            port,
            data_path,
            utc_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("data/store.json"));
        assert_eq!(config.utc_offset, None);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("PORT", "9090"),
            ("APP_DATA_PATH", "/tmp/todo.json"),
            ("APP_UTC_OFFSET", "-03:00"),
        ]);
        assert_eq!(config.port, 9090);
        assert_eq!(config.data_path, PathBuf::from("/tmp/todo.json"));
        assert_eq!(config.utc_offset, FixedOffset::west_opt(3 * 3600));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config(&[
            ("PORT", "eighty"),
            ("APP_DATA_PATH", "   "),
            ("APP_UTC_OFFSET", "Mars/Olympus"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("data/store.json"));
        assert_eq!(config.utc_offset, None);
    }
}
