//! Configuration loading and dotted-key lookup

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use toml::Value;
use tracing::debug;

use crate::shared::errors::AppError;

/// Root namespace of every configuration key.
pub const NAMESPACE: &str = "cryptotrader";

/// Process-wide configuration keys that are not owned by a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Version,
    TradingInterval,
    TradingTargets,
    TradingAggressiveness,
}

impl PropertyType {
    pub fn key(&self) -> String {
        let name = match self {
            PropertyType::Version => "version",
            PropertyType::TradingInterval => "trading_interval",
            PropertyType::TradingTargets => "trading_targets",
            PropertyType::TradingAggressiveness => "trading_aggressiveness",
        };
        format!("{}.{}", NAMESPACE, name)
    }
}

/// Immutable configuration source.
///
/// Nested TOML tables are flattened into dotted keys, so
///
/// ```toml
/// [cryptotrader.adviser.bitflyer]
/// swap_rate = "0.0004"
/// ```
///
/// is addressed as `cryptotrader.adviser.bitflyer.swap_rate`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    values: BTreeMap<String, Value>,
}

impl Configuration {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, AppError> {
        let root: toml::Table = toml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        let mut values = BTreeMap::new();
        flatten("", Value::Table(root), &mut values);
        debug!("Loaded {} configuration entries", values.len());

        Ok(Self { values })
    }

    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_property(&self, property: PropertyType) -> Option<&Value> {
        self.get(&property.key())
    }

    /// Entries whose key starts with `prefix.`, with the prefix stripped.
    pub fn subset(&self, prefix: &str) -> BTreeMap<String, Value> {
        let head = format!("{}.", prefix);
        self.values
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(&head).map(|rest| (rest.to_string(), v.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn flatten(prefix: &str, value: Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Table(table) => {
            for (k, v) in table {
                let key = if prefix.is_empty() {
                    k
                } else {
                    format!("{}.{}", prefix, k)
                };
                flatten(&key, v, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [cryptotrader]
        version = "0.2.0"
        trading_interval = 60000
        trading_targets = ["bf:FX_BTC_JPY"]

        [cryptotrader.adviser.bitflyer]
        swap_rate = "0.0004"
    "#;

    #[test]
    fn test_flattened_keys() {
        let config = Configuration::from_toml(SAMPLE).unwrap();

        assert_eq!(config.len(), 4);
        assert_eq!(
            config.get("cryptotrader.adviser.bitflyer.swap_rate"),
            Some(&Value::String("0.0004".to_string()))
        );
        assert_eq!(
            config.get_property(PropertyType::TradingInterval),
            Some(&Value::Integer(60000))
        );
        assert!(config.get_property(PropertyType::TradingAggressiveness).is_none());
    }

    #[test]
    fn test_subset() {
        let config = Configuration::from_toml(SAMPLE).unwrap();
        let subset = config.subset("cryptotrader.adviser");
        assert_eq!(subset.len(), 1);
        assert!(subset.contains_key("bitflyer.swap_rate"));
    }

    #[test]
    fn test_property_type_keys() {
        assert_eq!(PropertyType::Version.key(), "cryptotrader.version");
        assert_eq!(
            PropertyType::TradingAggressiveness.key(),
            "cryptotrader.trading_aggressiveness"
        );
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Configuration::from_toml("[broken"),
            Err(AppError::ConfigError(_))
        ));
        assert!(Configuration::from_file("/nonexistent/Config.toml").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = Configuration::from_file(&path).unwrap();
        assert_eq!(config, Configuration::from_toml(SAMPLE).unwrap());
        assert!(config.get(&PropertyType::Version.key()).is_some());
    }
}
