//! Collapsing of irregular trade prints into a fixed-interval price series.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::debug;

use crate::shared::types::{DecimalSeries, Trade};
use crate::shared::utils::{divide, round_half_up, SCALE};

/// Running quantity and notional of one bucket.
#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    quantity: Option<Decimal>,
    notional: Option<Decimal>,
}

impl Bucket {
    fn accumulate(&mut self, quantity: Decimal, notional: Decimal, sum: bool) -> Option<()> {
        if sum {
            let q = self.quantity.map_or(Some(quantity), |q| q.checked_add(quantity))?;
            let n = self.notional.map_or(Some(notional), |n| n.checked_add(notional))?;
            self.quantity = Some(q);
            self.notional = Some(n);
        } else {
            self.quantity = Some(quantity);
            self.notional = Some(notional);
        }
        Some(())
    }

    fn price(&self) -> Option<Decimal> {
        let quantity = self.quantity.filter(|q| !q.is_zero())?;
        divide(self.notional?, quantity)
    }
}

/// Bucket `trades` onto the grid `from, from + interval, ...` (keys strictly before `to`).
///
/// Each trade lands in the first bucket at or after its timestamp. With `sum` the
/// bucket price is volume weighted; otherwise the latest trade in the bucket wins.
/// Buckets without trades carry the previous price forward.
pub fn collapse_prices(
    trades: &[Trade],
    interval: Duration,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    sum: bool,
) -> DecimalSeries {
    let mut collapsed = std::collections::BTreeMap::new();

    if interval <= Duration::zero() {
        debug!("Non-positive collapse interval: {}", interval);
        return DecimalSeries::new();
    }

    let mut instant = from;
    while instant < to {
        collapsed.insert(instant, Bucket::default());
        match instant.checked_add_signed(interval) {
            Some(next) => instant = next,
            None => break,
        }
    }

    let lower = from.checked_sub_signed(interval);

    let mut candidates: Vec<(DateTime<Utc>, Decimal, Decimal)> = trades
        .iter()
        .filter_map(|t| Some((t.timestamp?, t.price?, t.size?)))
        .filter(|(ts, _, _)| lower.map_or(true, |l| *ts > l))
        .filter(|(ts, _, _)| *ts < to)
        .collect();

    candidates.sort_by_key(|(ts, _, _)| *ts);

    for (timestamp, price, size) in candidates {
        let Some((_, bucket)) = collapsed.range_mut(timestamp..).next() else {
            continue;
        };

        let accumulated = size
            .checked_mul(price)
            .and_then(|notional| bucket.accumulate(size, notional, sum));

        if accumulated.is_none() {
            debug!("Skipping trade at {} (overflow): {} x {}", timestamp, size, price);
        }
    }

    let mut prices = DecimalSeries::new();
    let mut previous = None;

    for (instant, bucket) in collapsed {
        let current = bucket.price().or(previous);
        prices.insert(instant, current);
        previous = current;
    }

    prices
}

/// Log returns between consecutive entries, keyed by the later instant.
///
/// A return is `None` when either neighbour is missing or not strictly positive.
pub fn calculate_returns(prices: &DecimalSeries) -> DecimalSeries {
    prices
        .iter()
        .zip(prices.iter().skip(1))
        .map(|((_, p0), (instant, p1))| (*instant, log_return(*p0, *p1)))
        .collect()
}

fn log_return(p0: Option<Decimal>, p1: Option<Decimal>) -> Option<Decimal> {
    let p0 = p0.filter(|p| p.is_sign_positive() && !p.is_zero())?;
    let p1 = p1.filter(|p| p.is_sign_positive() && !p.is_zero())?;

    let diff = (p1.to_f64()? / p0.to_f64()?).ln();

    if !diff.is_finite() {
        return None;
    }

    Decimal::from_f64(diff).map(|v| round_half_up(v, SCALE))
}
