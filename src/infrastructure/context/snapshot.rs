//! In-memory site service backed by a TOML market snapshot.
//!
//! ```toml
//! [[instruments]]
//! code = "BTC_JPY"
//! best_bid = "5000"
//! best_ask = "5010"
//! lot_size = "0.001"
//!
//! [[instruments.trades]]
//! timestamp = "2017-08-25T00:00:00Z"
//! price = "5000"
//! size = "0.1"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::context::Service;
use crate::shared::errors::{AppError, ServiceError};
use crate::shared::types::{CancelInstruction, CreateInstruction, Key, Order, RoundingMode, Trade};
use crate::shared::utils::{divide, generate_id};

/// Whole snapshot document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub instruments: Vec<InstrumentSnapshot>,
}

/// Market state of one instrument. Every field except `code` is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstrumentSnapshot {
    pub code: String,
    #[serde(default)]
    pub best_bid: Option<Decimal>,
    #[serde(default)]
    pub best_ask: Option<Decimal>,
    /// Explicit mid; derived from bid and ask when absent.
    #[serde(default)]
    pub mid: Option<Decimal>,
    #[serde(default)]
    pub last: Option<Decimal>,
    #[serde(default)]
    pub instrument_position: Option<Decimal>,
    #[serde(default)]
    pub funding_position: Option<Decimal>,
    #[serde(default)]
    pub lot_size: Option<Decimal>,
    #[serde(default)]
    pub tick_size: Option<Decimal>,
    #[serde(default)]
    pub commission_rate: Option<Decimal>,
    #[serde(default)]
    pub marginable: Option<bool>,
    #[serde(default)]
    pub expiry: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub trades: Vec<Trade>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

pub struct SnapshotService {
    site: String,
    instruments: HashMap<String, InstrumentSnapshot>,
    orders: Mutex<Vec<Order>>,
    closed: AtomicBool,
}

impl SnapshotService {
    pub fn new(site: &str, snapshot: Snapshot) -> Self {
        let mut instruments = HashMap::new();
        let mut orders = Vec::new();

        for mut instrument in snapshot.instruments {
            for order in instrument.orders.drain(..) {
                orders.push(Order {
                    instrument: instrument.code.clone(),
                    ..order
                });
            }
            if instruments.contains_key(&instrument.code) {
                warn!("[{}] Duplicate instrument {}, keeping the last one", site, instrument.code);
            }
            instruments.insert(instrument.code.clone(), instrument);
        }

        info!("[{}] Loaded {} instrument(s), {} order(s)", site, instruments.len(), orders.len());

        Self {
            site: site.to_string(),
            instruments,
            orders: Mutex::new(orders),
            closed: AtomicBool::new(false),
        }
    }

    pub fn from_toml(site: &str, content: &str) -> Result<Self, AppError> {
        let snapshot: Snapshot = toml::from_str(content)
            .map_err(|e| AppError::SnapshotError(format!("Failed to parse snapshot for {}: {}", site, e)))?;
        Ok(Self::new(site, snapshot))
    }

    pub fn from_file<P: AsRef<Path>>(site: &str, path: P) -> Result<Self, AppError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::SnapshotError(format!(
                "Failed to read snapshot {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(site, &content)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn instrument(&self, key: &Key) -> Option<&InstrumentSnapshot> {
        if self.is_closed() {
            debug!("[{}] Query after close", self.site);
            return None;
        }
        self.instruments.get(key.instrument()?)
    }

    fn round(value: Decimal, unit: Option<Decimal>, mode: RoundingMode) -> Option<Decimal> {
        let unit = unit.filter(|u| u.is_sign_positive() && !u.is_zero())?;
        let units = value.checked_div(unit)?.round_dp_with_strategy(0, mode.strategy());
        units.checked_mul(unit)
    }
}

impl Service for SnapshotService {
    fn get(&self) -> &str {
        &self.site
    }

    fn get_best_ask_price(&self, key: &Key) -> Option<Decimal> {
        self.instrument(key)?.best_ask
    }

    fn get_best_bid_price(&self, key: &Key) -> Option<Decimal> {
        self.instrument(key)?.best_bid
    }

    fn get_mid_price(&self, key: &Key) -> Option<Decimal> {
        let instrument = self.instrument(key)?;
        if instrument.mid.is_some() {
            return instrument.mid;
        }
        let sum = instrument.best_bid?.checked_add(instrument.best_ask?)?;
        divide(sum, Decimal::TWO)
    }

    fn get_last_price(&self, key: &Key) -> Option<Decimal> {
        self.instrument(key)?.last
    }

    fn list_trades(&self, key: &Key, from_time: Option<DateTime<Utc>>) -> Option<Vec<Trade>> {
        let trades = &self.instrument(key)?.trades;
        Some(
            trades
                .iter()
                .filter(|t| match (from_time, t.timestamp) {
                    (Some(from), Some(ts)) => ts >= from,
                    _ => true,
                })
                .cloned()
                .collect(),
        )
    }

    fn get_instrument_position(&self, key: &Key) -> Option<Decimal> {
        self.instrument(key)?.instrument_position
    }

    fn get_funding_position(&self, key: &Key) -> Option<Decimal> {
        self.instrument(key)?.funding_position
    }

    fn round_lot_size(&self, key: &Key, value: Decimal, mode: RoundingMode) -> Option<Decimal> {
        Self::round(value, self.instrument(key)?.lot_size, mode)
    }

    fn round_tick_size(&self, key: &Key, value: Decimal, mode: RoundingMode) -> Option<Decimal> {
        Self::round(value, self.instrument(key)?.tick_size, mode)
    }

    fn get_commission_rate(&self, key: &Key) -> Option<Decimal> {
        self.instrument(key)?.commission_rate
    }

    fn is_marginable(&self, key: &Key) -> Option<bool> {
        self.instrument(key)?.marginable
    }

    fn get_expiry(&self, key: &Key) -> Option<DateTime<FixedOffset>> {
        self.instrument(key)?.expiry
    }

    fn find_order(&self, key: &Key, id: &str) -> Option<Order> {
        let instrument = self.instrument(key)?;
        let orders = self.orders.lock().ok()?;
        orders
            .iter()
            .find(|o| o.id == id && o.instrument == instrument.code)
            .cloned()
    }

    fn list_active_orders(&self, key: &Key) -> Option<Vec<Order>> {
        let instrument = self.instrument(key)?;
        let orders = self.orders.lock().ok()?;
        Some(
            orders
                .iter()
                .filter(|o| o.active && o.instrument == instrument.code)
                .cloned()
                .collect(),
        )
    }

    fn create_order(&self, key: &Key, instruction: &CreateInstruction) -> Option<String> {
        let instrument = self.instrument(key)?;

        if instruction.size.is_zero() || instruction.price <= Decimal::ZERO {
            warn!("[{}] Rejected order {:?}", self.site, instruction);
            return None;
        }

        let order = Order {
            id: generate_id(),
            instrument: instrument.code.clone(),
            active: true,
            ordered_price: Some(instruction.price),
            ordered_quantity: Some(instruction.size),
            filled_quantity: Some(Decimal::ZERO),
        };
        let id = order.id.clone();

        self.orders.lock().ok()?.push(order);
        info!("[{}] Created order {} : {:?}", self.site, id, instruction);

        Some(id)
    }

    fn cancel_order(&self, key: &Key, instruction: &CancelInstruction) -> Option<String> {
        let instrument = self.instrument(key)?;
        let mut orders = self.orders.lock().ok()?;

        let order = orders
            .iter_mut()
            .find(|o| o.active && o.id == instruction.id && o.instrument == instrument.code)?;
        order.active = false;

        info!("[{}] Cancelled order {}", self.site, instruction.id);

        Some(instruction.id.clone())
    }

    fn close(&self) -> Result<(), ServiceError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(ServiceError::AlreadyClosed(self.site.clone()));
        }
        info!("[{}] Closed", self.site);
        Ok(())
    }
}
