//! Component-scoped, type-safe configuration lookup.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use toml::Value;
use tracing::debug;

use super::config::Configuration;

/// Reads `<prefix>.<key>` from a shared [`Configuration`].
///
/// Every getter falls back to the supplied default when the key is missing or the
/// stored value cannot be converted to the requested type.
#[derive(Debug, Clone)]
pub struct PropertyAccessor {
    configuration: Arc<Configuration>,
    prefix: String,
}

impl PropertyAccessor {
    pub fn new(configuration: Arc<Configuration>, component: &str) -> Self {
        Self {
            configuration,
            prefix: format!("{}.", component),
        }
    }

    /// Accessor with no backing entries; every lookup yields its default.
    pub fn empty(component: &str) -> Self {
        Self::new(Arc::new(Configuration::default()), component)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        let value = self.configuration.get(&format!("{}{}", self.prefix, key));
        if value.is_none() {
            debug!("Property {}{} not configured", self.prefix, key);
        }
        value
    }

    fn fallback<T: std::fmt::Debug>(&self, key: &str, value: &Value, default: T) -> T {
        debug!(
            "Property {}{} has unusable value {:?}, using {:?}",
            self.prefix, key, value, default
        );
        default
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        match self.lookup(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Integer(i)) => i.to_string(),
            Some(Value::Float(f)) => f.to_string(),
            Some(Value::Boolean(b)) => b.to_string(),
            Some(other) => self.fallback(key, other, default.to_string()),
            None => default.to_string(),
        }
    }

    pub fn get_long(&self, key: &str, default: i64) -> i64 {
        match self.lookup(key) {
            Some(Value::Integer(i)) => *i,
            Some(v @ Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(parsed) => parsed,
                Err(_) => self.fallback(key, v, default),
            },
            Some(other) => self.fallback(key, other, default),
            None => default,
        }
    }

    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.lookup(key) {
            Some(v @ (Value::Integer(_) | Value::String(_))) => {
                let long = self.get_long(key, i64::from(default));
                match i32::try_from(long) {
                    Ok(int) => int,
                    Err(_) => self.fallback(key, v, default),
                }
            }
            Some(other) => self.fallback(key, other, default),
            None => default,
        }
    }

    pub fn get_decimal(&self, key: &str, default: Decimal) -> Decimal {
        match self.lookup(key) {
            Some(Value::Integer(i)) => Decimal::from(*i),
            Some(v @ Value::Float(f)) => match Decimal::from_f64(*f) {
                Some(parsed) => parsed,
                None => self.fallback(key, v, default),
            },
            Some(v @ Value::String(s)) => match Decimal::from_str(s.trim()) {
                Ok(parsed) => parsed,
                Err(_) => self.fallback(key, v, default),
            },
            Some(other) => self.fallback(key, other, default),
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn accessor() -> PropertyAccessor {
        let configuration = Configuration::from_entries([
            ("test.component.text", Value::String("hello".to_string())),
            ("test.component.number", Value::Integer(42)),
            ("test.component.numeric_text", Value::String(" 7 ".to_string())),
            ("test.component.huge", Value::Integer(i64::MAX)),
            ("test.component.rate", Value::String("0.0004".to_string())),
            ("test.component.ratio", Value::Float(0.5)),
            ("test.component.flag", Value::Boolean(true)),
            ("other.component.number", Value::Integer(1)),
        ]);
        PropertyAccessor::new(Arc::new(configuration), "test.component")
    }

    #[test]
    fn test_get_string() {
        let target = accessor();
        assert_eq!(target.get_string("text", "x"), "hello");
        assert_eq!(target.get_string("number", "x"), "42");
        assert_eq!(target.get_string("missing", "x"), "x");
    }

    #[test]
    fn test_get_int_and_long() {
        let target = accessor();
        assert_eq!(target.get_int("number", -1), 42);
        assert_eq!(target.get_int("numeric_text", -1), 7);
        assert_eq!(target.get_int("text", -1), -1);
        assert_eq!(target.get_int("huge", -1), -1);
        assert_eq!(target.get_int("flag", -1), -1);
        assert_eq!(target.get_long("huge", -1), i64::MAX);
        assert_eq!(target.get_long("ratio", -1), -1);
        assert_eq!(target.get_long("missing", 9), 9);
    }

    #[test]
    fn test_get_decimal() {
        let target = accessor();
        assert_eq!(target.get_decimal("rate", dec!(1)), dec!(0.0004));
        assert_eq!(target.get_decimal("number", dec!(1)), dec!(42));
        assert_eq!(target.get_decimal("ratio", dec!(1)), dec!(0.5));
        assert_eq!(target.get_decimal("text", dec!(1)), dec!(1));
        assert_eq!(target.get_decimal("flag", dec!(1)), dec!(1));
        assert_eq!(target.get_decimal("missing", dec!(1)), dec!(1));
    }

    #[test]
    fn test_scoped_by_prefix() {
        let target = accessor();
        assert_eq!(target.prefix(), "test.component.");
        assert_eq!(target.get_int("component.number", -1), -1);

        let empty = PropertyAccessor::empty("test.component");
        assert_eq!(empty.get_int("number", -1), -1);
    }
}
