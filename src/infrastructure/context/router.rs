//! Routing facade over the per-site services

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::domain::context::Service;
use crate::shared::errors::{ServiceError, ShutdownError};
use crate::shared::types::{
    CancelInstruction, CreateInstruction, Key, Order, RoundingMode, Trade, WILDCARD,
};

/// Dispatches every keyed call to the service registered for `key.site`.
///
/// The registry is fixed at construction. Unknown or missing sites answer `None`.
pub struct ContextRouter {
    contexts: HashMap<String, Arc<dyn Service>>,
}

impl ContextRouter {
    pub fn new(services: Vec<Arc<dyn Service>>) -> Self {
        let mut contexts: HashMap<String, Arc<dyn Service>> = HashMap::new();

        for service in services {
            let site = service.get().to_string();
            if contexts.insert(site.clone(), service).is_some() {
                warn!("Duplicate service for site {}, keeping the last one", site);
            }
        }

        info!("Registered {} context(s)", contexts.len());

        Self { contexts }
    }

    /// Registered sites, sorted.
    pub fn sites(&self) -> Vec<&str> {
        let mut sites: Vec<&str> = self.contexts.keys().map(String::as_str).collect();
        sites.sort_unstable();
        sites
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    fn for_context(&self, key: &Key) -> Option<&Arc<dyn Service>> {
        let site = key.site()?;
        let context = self.contexts.get(site);
        if context.is_none() {
            debug!("No context for site {}", site);
        }
        context
    }

    /// Close every registered service, then report all failures at once.
    pub fn shutdown(&self) -> Result<(), ShutdownError> {
        let mut failures = Vec::new();

        for site in self.sites() {
            let Some(context) = self.contexts.get(site) else {
                continue;
            };

            match context.close() {
                Ok(()) => info!("Closed context : {}", site),
                Err(e) => {
                    warn!("Failed to close context {} : {}", site, e);
                    failures.push(e);
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError { failures })
        }
    }
}

impl Service for ContextRouter {
    fn get(&self) -> &str {
        WILDCARD
    }

    fn get_best_ask_price(&self, key: &Key) -> Option<Decimal> {
        self.for_context(key)?.get_best_ask_price(key)
    }

    fn get_best_bid_price(&self, key: &Key) -> Option<Decimal> {
        self.for_context(key)?.get_best_bid_price(key)
    }

    fn get_mid_price(&self, key: &Key) -> Option<Decimal> {
        self.for_context(key)?.get_mid_price(key)
    }

    fn get_last_price(&self, key: &Key) -> Option<Decimal> {
        self.for_context(key)?.get_last_price(key)
    }

    fn list_trades(&self, key: &Key, from_time: Option<DateTime<Utc>>) -> Option<Vec<Trade>> {
        self.for_context(key)?.list_trades(key, from_time)
    }

    fn get_instrument_position(&self, key: &Key) -> Option<Decimal> {
        self.for_context(key)?.get_instrument_position(key)
    }

    fn get_funding_position(&self, key: &Key) -> Option<Decimal> {
        self.for_context(key)?.get_funding_position(key)
    }

    fn round_lot_size(&self, key: &Key, value: Decimal, mode: RoundingMode) -> Option<Decimal> {
        self.for_context(key)?.round_lot_size(key, value, mode)
    }

    fn round_tick_size(&self, key: &Key, value: Decimal, mode: RoundingMode) -> Option<Decimal> {
        self.for_context(key)?.round_tick_size(key, value, mode)
    }

    fn get_commission_rate(&self, key: &Key) -> Option<Decimal> {
        self.for_context(key)?.get_commission_rate(key)
    }

    fn is_marginable(&self, key: &Key) -> Option<bool> {
        self.for_context(key)?.is_marginable(key)
    }

    fn get_expiry(&self, key: &Key) -> Option<DateTime<FixedOffset>> {
        self.for_context(key)?.get_expiry(key)
    }

    fn find_order(&self, key: &Key, id: &str) -> Option<Order> {
        self.for_context(key)?.find_order(key, id)
    }

    fn list_active_orders(&self, key: &Key) -> Option<Vec<Order>> {
        self.for_context(key)?.list_active_orders(key)
    }

    fn create_order(&self, key: &Key, instruction: &CreateInstruction) -> Option<String> {
        self.for_context(key)?.create_order(key, instruction)
    }

    fn cancel_order(&self, key: &Key, instruction: &CancelInstruction) -> Option<String> {
        self.for_context(key)?.cancel_order(key, instruction)
    }

    fn close(&self) -> Result<(), ServiceError> {
        self.shutdown().map_err(ServiceError::Shutdown)
    }
}
