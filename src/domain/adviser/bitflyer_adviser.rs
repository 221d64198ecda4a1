//! bitFlyer adviser: swap-aware boundaries and futures hedging for FX_BTC_JPY.

use std::collections::BTreeSet;
use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use super::product::ProductType;
use super::Adviser;
use crate::domain::context::Service;
use crate::shared::config::{Configuration, NAMESPACE};
use crate::shared::properties::PropertyAccessor;
use crate::shared::types::{Key, Request, RoundingMode};
use crate::shared::utils::{round_half_up, trim_to_zero, SCALE};

pub const ID: &str = "bitflyer";

const DEFAULT_SWAP_RATE: Decimal = dec!(0.0004);

const DEFAULT_PRICE_SCALE: i32 = 4;

/// Product whose size is clamped to what the futures book needs for hedging.
const HEDGED_PRODUCT: ProductType = ProductType::FxBtcJpy;

pub struct BitflyerAdviser {
    properties: PropertyAccessor,
}

impl BitflyerAdviser {
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self {
            properties: PropertyAccessor::new(configuration, &format!("{}.adviser.{}", NAMESPACE, ID)),
        }
    }

    /// Daily swap charged for carrying a future over a session boundary.
    fn swap_rate(&self) -> Decimal {
        self.properties
            .get_decimal("swap_rate", DEFAULT_SWAP_RATE)
            .max(Decimal::ZERO)
    }

    fn price_scale(&self) -> u32 {
        let scale = self.properties.get_int("price_scale", DEFAULT_PRICE_SCALE);
        u32::try_from(scale).unwrap_or(0).min(SCALE)
    }

    /// Key of the cash product a dated future settles against.
    pub fn get_underlying_key(&self, request: &Request) -> Option<Key> {
        let product = ProductType::find(request.instrument()?)?;
        let underlying = product.underlying()?;
        Some(
            Key::build_from(&Key::from(request))
                .instrument(underlying.code())
                .build(),
        )
    }

    /// Size that flattens the combined position of the request's product and `related`.
    pub fn get_hedge_size(
        &self,
        context: &dyn Service,
        request: &Request,
        related: &BTreeSet<ProductType>,
    ) -> Option<Decimal> {
        let key = Key::from(request);

        let Some(mut total) = context.get_instrument_position(&key) else {
            debug!("Hedge unknown: no position for {:?}", key.instrument());
            return None;
        };

        for product in related {
            let leg = Key::build_from(&key).instrument(product.code()).build();
            let Some(position) = context.get_instrument_position(&leg) else {
                debug!("Hedge unknown: no position for {}", product);
                return None;
            };
            total = total.checked_add(position)?;
        }

        Some(-total)
    }

    /// Spread, commission and swap that a boundary must clear.
    fn boundary_basis(&self, context: &dyn Service, request: &Request, key: &Key) -> Decimal {
        let spread = trim_to_zero(request.trading_spread());
        let commission = trim_to_zero(context.get_commission_rate(key));
        let swap = self.calculate_swap_rate(context, request);
        spread + commission + swap
    }

    fn boundary(
        &self,
        context: &dyn Service,
        request: &Request,
        price: Option<Decimal>,
        buy: bool,
    ) -> Option<Decimal> {
        let price = price?;

        let Some(key) = self.get_underlying_key(request) else {
            return Some(price);
        };

        let market = if buy {
            context.get_best_bid_price(&key)
        } else {
            context.get_best_ask_price(&key)
        };

        let Some(market) = market else {
            debug!("No market price for {:?}, keeping {}", key.instrument(), price);
            return Some(price);
        };

        let basis = self.boundary_basis(context, request, &key);
        let ratio = if buy {
            Decimal::ONE - basis
        } else {
            Decimal::ONE + basis
        };

        let Some(bound) = market.checked_mul(ratio) else {
            return Some(price);
        };
        let bound = round_half_up(bound, self.price_scale());

        debug!(
            "Boundary {} : market={}, basis={}, bound={}, candidate={}",
            if buy { "buy" } else { "sell" },
            market,
            basis,
            bound,
            price
        );

        Some(if buy { price.min(bound) } else { price.max(bound) })
    }

    /// Clamp `size` to the hedge requirement in direction `sign` (+1 buy, -1 sell).
    fn hedge_limit(&self, context: &dyn Service, request: &Request, size: Decimal, sign: Decimal) -> Decimal {
        if request.instrument() != Some(HEDGED_PRODUCT.code()) {
            return size;
        }

        let related: BTreeSet<ProductType> = HEDGED_PRODUCT.related_futures().into_iter().collect();

        let Some(hedge) = self.get_hedge_size(context, request, &related) else {
            warn!("Hedge size unavailable for {}, suppressing order size", HEDGED_PRODUCT);
            return Decimal::ZERO;
        };

        let limit = size.min((hedge * sign).max(Decimal::ZERO));

        trim_to_zero(context.round_lot_size(&Key::from(request), limit, RoundingMode::Down))
    }
}

/// `(1 + rate)^days - 1`, rounded up to [`SCALE`]. Saturates at `Decimal::MAX` on overflow.
fn compound(rate: Decimal, days: i64) -> Decimal {
    let factor = Decimal::ONE.saturating_add(rate);
    let mut total = Decimal::ONE;
    for _ in 0..days {
        total = match total.checked_mul(factor) {
            Some(next) => next,
            None => {
                warn!("Swap rate saturated over {} days", days);
                Decimal::MAX
            }
        };
        if total == Decimal::MAX {
            break;
        }
    }
    (total - Decimal::ONE).round_dp_with_strategy(SCALE, RoundingStrategy::AwayFromZero)
}

impl Adviser for BitflyerAdviser {
    fn get(&self) -> &str {
        ID
    }

    /// Zero unless the product expires on a later trading day than the request, counted in the expiry's offset.
    fn calculate_swap_rate(&self, context: &dyn Service, request: &Request) -> Decimal {
        let Some(now) = request.current_time() else {
            return Decimal::ZERO;
        };

        let Some(expiry) = context.get_expiry(&Key::from(request)) else {
            return Decimal::ZERO;
        };

        let today = now.with_timezone(expiry.offset()).date_naive();
        let days = (expiry.date_naive() - today).num_days();

        if days <= 0 {
            return Decimal::ZERO;
        }

        compound(self.swap_rate(), days)
    }

    fn adjust_buy_boundary_price(
        &self,
        context: &dyn Service,
        request: &Request,
        price: Option<Decimal>,
    ) -> Option<Decimal> {
        self.boundary(context, request, price, true)
    }

    fn adjust_sell_boundary_price(
        &self,
        context: &dyn Service,
        request: &Request,
        price: Option<Decimal>,
    ) -> Option<Decimal> {
        self.boundary(context, request, price, false)
    }

    fn adjust_buy_limit_size(&self, context: &dyn Service, request: &Request, size: Decimal) -> Decimal {
        self.hedge_limit(context, request, size, Decimal::ONE)
    }

    fn adjust_sell_limit_size(&self, context: &dyn Service, request: &Request, size: Decimal) -> Decimal {
        self.hedge_limit(context, request, size, Decimal::NEGATIVE_ONE)
    }
}
