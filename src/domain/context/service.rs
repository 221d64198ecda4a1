//! Per-site capability trait

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;

use crate::shared::errors::ServiceError;
use crate::shared::types::{CancelInstruction, CreateInstruction, Key, Order, RoundingMode, Trade};

/// Uniform market and order surface of one site.
///
/// Every lookup is keyed by [`Key`] and answers `None` when the value is unknown.
/// Default implementations answer `None`, so an adapter only implements what its
/// venue supports. Implementations apply their own timeouts.
pub trait Service: Send + Sync {
    /// Site identifier this service is registered under.
    fn get(&self) -> &str;

    fn get_best_ask_price(&self, _key: &Key) -> Option<Decimal> {
        None
    }

    fn get_best_bid_price(&self, _key: &Key) -> Option<Decimal> {
        None
    }

    fn get_mid_price(&self, _key: &Key) -> Option<Decimal> {
        None
    }

    fn get_last_price(&self, _key: &Key) -> Option<Decimal> {
        None
    }

    /// Trades executed at or after `from_time` (all known trades when `None`).
    fn list_trades(&self, _key: &Key, _from_time: Option<DateTime<Utc>>) -> Option<Vec<Trade>> {
        None
    }

    fn get_instrument_position(&self, _key: &Key) -> Option<Decimal> {
        None
    }

    fn get_funding_position(&self, _key: &Key) -> Option<Decimal> {
        None
    }

    fn round_lot_size(&self, _key: &Key, _value: Decimal, _mode: RoundingMode) -> Option<Decimal> {
        None
    }

    fn round_tick_size(&self, _key: &Key, _value: Decimal, _mode: RoundingMode) -> Option<Decimal> {
        None
    }

    fn get_commission_rate(&self, _key: &Key) -> Option<Decimal> {
        None
    }

    fn is_marginable(&self, _key: &Key) -> Option<bool> {
        None
    }

    /// Expiry of a derivative, in the venue's local offset so trading days line up.
    fn get_expiry(&self, _key: &Key) -> Option<DateTime<FixedOffset>> {
        None
    }

    fn find_order(&self, _key: &Key, _id: &str) -> Option<Order> {
        None
    }

    fn list_active_orders(&self, _key: &Key) -> Option<Vec<Order>> {
        None
    }

    /// Returns the venue-assigned order id on acceptance.
    fn create_order(&self, _key: &Key, _instruction: &CreateInstruction) -> Option<String> {
        None
    }

    /// Returns the cancelled order id on acceptance.
    fn cancel_order(&self, _key: &Key, _instruction: &CancelInstruction) -> Option<String> {
        None
    }

    fn close(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
