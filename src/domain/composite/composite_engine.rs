//! Evaluation of composite price formulas.
//!
//! A formula is an ordered list of [`Composite`] legs. The first character of each
//! leg's site is its operator:
//!
//! | tag | meaning |
//! |-----|---------|
//! | `+` `-` `*` | applied left to right onto the running value |
//! | `/` | division at 10 dp, half-up |
//! | anything else, canonically `@` | averaged member |
//!
//! The running value starts unset and is seeded with 1 before the first operator,
//! except for `+`, which starts from 0. The running value and every averaged member are
//! averaged into the final price.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::context::Service;
use crate::shared::types::{Composite, Key};
use crate::shared::utils::divide;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Average,
}

impl Operation {
    pub fn from_tag(tag: char) -> Self {
        match tag {
            '+' => Operation::Add,
            '-' => Operation::Subtract,
            '*' => Operation::Multiply,
            '/' => Operation::Divide,
            _ => Operation::Average,
        }
    }

    /// Seed of an unset running value.
    pub fn identity(self) -> Decimal {
        match self {
            Operation::Add => Decimal::ZERO,
            _ => Decimal::ONE,
        }
    }

    /// `None` for [`Operation::Average`], on overflow, or on a zero divisor.
    pub fn apply(self, left: Decimal, right: Decimal) -> Option<Decimal> {
        match self {
            Operation::Add => left.checked_add(right),
            Operation::Subtract => left.checked_sub(right),
            Operation::Multiply => left.checked_mul(right),
            Operation::Divide => divide(left, right),
            Operation::Average => None,
        }
    }
}

/// Blend `legs` into one price, fetching each leg through `quote(site, instrument)`.
///
/// Returns `None` for an empty formula, a leg whose site tag is shorter than two
/// characters, or a leg whose quote is missing or zero.
pub fn calculate_composite<F>(legs: &[Composite], mut quote: F) -> Option<Decimal>
where
    F: FnMut(&str, &str) -> Option<Decimal>,
{
    if legs.is_empty() {
        return None;
    }

    let mut current: Option<Decimal> = None;
    let mut averaged: Vec<Decimal> = Vec::new();

    for composite in legs {
        let mut chars = composite.site.chars();

        let tag = match chars.next() {
            Some(tag) if composite.site.chars().count() >= 2 => tag,
            _ => {
                debug!("Invalid composite leg: {:?}", composite);
                return None;
            }
        };

        let site = chars.as_str();
        let operation = Operation::from_tag(tag);

        let value = match quote(site, &composite.instrument) {
            Some(v) if !v.is_zero() => v,
            other => {
                debug!(
                    "Composite leg {}:{} unresolved ({:?})",
                    site, composite.instrument, other
                );
                return None;
            }
        };

        if operation == Operation::Average {
            averaged.push(value);
            continue;
        }

        current = Some(operation.apply(current.unwrap_or(operation.identity()), value)?);
    }

    let contributions: Vec<Decimal> = current.into_iter().chain(averaged).collect();

    let mut total = Decimal::ZERO;
    for value in &contributions {
        total = total.checked_add(*value)?;
    }

    divide(total, Decimal::from(contributions.len()))
}

/// Evaluates composite formulas against the mid prices of a [`Service`].
pub struct CompositeEngine<'a> {
    context: &'a dyn Service,
}

impl<'a> CompositeEngine<'a> {
    pub fn new(context: &'a dyn Service) -> Self {
        Self { context }
    }

    pub fn evaluate(&self, legs: &[Composite], timestamp: Option<DateTime<Utc>>) -> Option<Decimal> {
        calculate_composite(legs, |site, instrument| {
            let mut builder = Key::builder().site(site).instrument(instrument);
            if let Some(ts) = timestamp {
                builder = builder.timestamp(ts);
            }
            self.context.get_mid_price(&builder.build())
        })
    }
}
