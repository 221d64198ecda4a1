//! Common types used across the application

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Site value denoting "any site" / the routing facade itself.
pub const WILDCARD: &str = "*";

/// Ordered instant -> price (or return) series. Keys are strictly increasing.
pub type DecimalSeries = BTreeMap<DateTime<Utc>, Option<Decimal>>;

/// Address of a tradable context: which site, which instrument, as of when.
///
/// Immutable; derive variations with [`Key::build_from`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Key {
    site: Option<String>,
    instrument: Option<String>,
    timestamp: Option<DateTime<Utc>>,
}

impl Key {
    pub fn builder() -> KeyBuilder {
        KeyBuilder::default()
    }

    /// Start a builder pre-populated with every field of `key`.
    pub fn build_from(key: &Key) -> KeyBuilder {
        KeyBuilder { inner: key.clone() }
    }

    /// Key addressing every site at once.
    pub fn wildcard(instrument: Option<&str>, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            site: Some(WILDCARD.to_string()),
            instrument: instrument.map(str::to_string),
            timestamp,
        }
    }

    pub fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    pub fn instrument(&self) -> Option<&str> {
        self.instrument.as_deref()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn is_wildcard(&self) -> bool {
        self.site() == Some(WILDCARD)
    }
}

impl From<&Request> for Key {
    fn from(request: &Request) -> Self {
        Self {
            site: request.site.clone(),
            instrument: request.instrument.clone(),
            timestamp: request.current_time,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeyBuilder {
    inner: Key,
}

impl KeyBuilder {
    pub fn site(mut self, site: impl Into<String>) -> Self {
        self.inner.site = Some(site.into());
        self
    }

    pub fn instrument(mut self, instrument: impl Into<String>) -> Self {
        self.inner.instrument = Some(instrument.into());
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.inner.timestamp = Some(timestamp);
        self
    }

    pub fn build(self) -> Key {
        self.inner
    }
}

/// Strategy parameters handed to the advisers for one decision cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    site: Option<String>,
    instrument: Option<String>,
    current_time: Option<DateTime<Utc>>,
    trading_spread: Option<Decimal>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    pub fn instrument(&self) -> Option<&str> {
        self.instrument.as_deref()
    }

    pub fn current_time(&self) -> Option<DateTime<Utc>> {
        self.current_time
    }

    pub fn trading_spread(&self) -> Option<Decimal> {
        self.trading_spread
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    inner: Request,
}

impl RequestBuilder {
    pub fn site(mut self, site: impl Into<String>) -> Self {
        self.inner.site = Some(site.into());
        self
    }

    pub fn instrument(mut self, instrument: impl Into<String>) -> Self {
        self.inner.instrument = Some(instrument.into());
        self
    }

    pub fn current_time(mut self, time: DateTime<Utc>) -> Self {
        self.inner.current_time = Some(time);
        self
    }

    pub fn trading_spread(mut self, spread: Decimal) -> Self {
        self.inner.trading_spread = Some(spread);
        self
    }

    pub fn build(self) -> Request {
        self.inner
    }
}

/// One execution print. Any missing field excludes the print from aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: Option<DateTime<Utc>>,
    pub price: Option<Decimal>,
    pub size: Option<Decimal>,
}

impl Trade {
    pub fn new(timestamp: DateTime<Utc>, price: Decimal, size: Decimal) -> Self {
        Self {
            timestamp: Some(timestamp),
            price: Some(price),
            size: Some(size),
        }
    }
}

/// One leg of a composite price formula, e.g. `{"+bf", "BTC_JPY"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Composite {
    pub site: String,
    pub instrument: String,
}

impl Composite {
    pub fn new(site: impl Into<String>, instrument: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            instrument: instrument.into(),
        }
    }
}

/// Order as reported by a site. Opaque to the decision core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub instrument: String,
    pub active: bool,
    pub ordered_price: Option<Decimal>,
    pub ordered_quantity: Option<Decimal>,
    pub filled_quantity: Option<Decimal>,
}

impl Order {
    pub fn remaining_quantity(&self) -> Option<Decimal> {
        let ordered = self.ordered_quantity?;
        let filled = self.filled_quantity.unwrap_or(Decimal::ZERO);
        ordered.checked_sub(filled)
    }
}

/// Instruction to place a new order. Negative size sells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInstruction {
    pub price: Decimal,
    pub size: Decimal,
}

/// Instruction to cancel a resting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelInstruction {
    pub id: String,
}

/// Rounding direction requested from lot/tick rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundingMode {
    Up,
    Down,
    Ceiling,
    Floor,
    HalfUp,
    HalfDown,
    HalfEven,
}

impl RoundingMode {
    pub fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::Up => RoundingStrategy::AwayFromZero,
            RoundingMode::Down => RoundingStrategy::ToZero,
            RoundingMode::Ceiling => RoundingStrategy::ToPositiveInfinity,
            RoundingMode::Floor => RoundingStrategy::ToNegativeInfinity,
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfDown => RoundingStrategy::MidpointTowardZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    #[test]
    fn test_key_equality_by_value() {
        let now = Utc.with_ymd_and_hms(2017, 8, 25, 0, 0, 0).unwrap();
        let k1 = Key::builder().site("bf").instrument("BTC_JPY").timestamp(now).build();
        let k2 = Key::builder().site("bf").instrument("BTC_JPY").timestamp(now).build();
        let k3 = Key::build_from(&k1).instrument("FX_BTC_JPY").build();

        assert_eq!(k1, k2);
        assert_ne!(k1, k3);
        assert_eq!(k3.site(), Some("bf"));
        assert_eq!(k3.timestamp(), Some(now));

        let set: HashSet<Key> = [k1.clone(), k2, k3].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_key_from_request() {
        let now = Utc.with_ymd_and_hms(2017, 8, 25, 0, 0, 0).unwrap();
        let request = Request::builder()
            .site("bf")
            .instrument("BTC_JPY")
            .current_time(now)
            .trading_spread(dec!(0.001))
            .build();

        let key = Key::from(&request);
        assert_eq!(key.site(), Some("bf"));
        assert_eq!(key.instrument(), Some("BTC_JPY"));
        assert_eq!(key.timestamp(), Some(now));
        assert!(!key.is_wildcard());

        assert_eq!(Key::from(&Request::default()), Key::default());
        assert!(Key::wildcard(None, None).is_wildcard());
    }

    #[test]
    fn test_request_carries_adviser_inputs() {
        let now = Utc.with_ymd_and_hms(2017, 8, 25, 0, 0, 0).unwrap();
        let request = Request::builder()
            .site("bf")
            .instrument("FX_BTC_JPY")
            .current_time(now)
            .trading_spread(dec!(0.001))
            .build();

        assert_eq!(request.site(), Some("bf"));
        assert_eq!(request.instrument(), Some("FX_BTC_JPY"));
        assert_eq!(request.current_time(), Some(now));
        assert_eq!(request.trading_spread(), Some(dec!(0.001)));

        let empty = Request::default();
        assert_eq!(empty.current_time(), None);
        assert_eq!(empty.trading_spread(), None);
    }

    #[test]
    fn test_order_remaining_quantity() {
        let order = Order {
            id: "o1".to_string(),
            instrument: "BTC_JPY".to_string(),
            active: true,
            ordered_price: Some(dec!(5000)),
            ordered_quantity: Some(dec!(1.5)),
            filled_quantity: Some(dec!(0.5)),
        };
        assert_eq!(order.remaining_quantity(), Some(dec!(1.0)));
    }
}
