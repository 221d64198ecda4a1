//! Adviser domain - venue-specific adjustments of quotes and sizes

mod bitflyer_adviser;
mod product;

pub use bitflyer_adviser::BitflyerAdviser;
pub use product::ProductType;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::context::Service;
use crate::shared::types::Request;

/// Adjusted instruction parameters for one decision cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advice {
    pub swap_rate: Decimal,
    pub buy_boundary_price: Option<Decimal>,
    pub sell_boundary_price: Option<Decimal>,
    pub buy_limit_size: Decimal,
    pub sell_limit_size: Decimal,
}

/// Venue hooks applied on top of a strategy's raw quotes.
///
/// The defaults leave every value untouched.
pub trait Adviser: Send + Sync {
    /// Site identifier this adviser applies to.
    fn get(&self) -> &str;

    fn calculate_swap_rate(&self, _context: &dyn Service, _request: &Request) -> Decimal {
        Decimal::ZERO
    }

    fn adjust_basis(
        &self,
        context: &dyn Service,
        request: &Request,
        basis: Option<Decimal>,
    ) -> Option<Decimal> {
        basis?.checked_add(self.calculate_swap_rate(context, request))
    }

    fn adjust_buy_boundary_price(
        &self,
        _context: &dyn Service,
        _request: &Request,
        price: Option<Decimal>,
    ) -> Option<Decimal> {
        price
    }

    fn adjust_sell_boundary_price(
        &self,
        _context: &dyn Service,
        _request: &Request,
        price: Option<Decimal>,
    ) -> Option<Decimal> {
        price
    }

    fn adjust_buy_limit_size(&self, _context: &dyn Service, _request: &Request, size: Decimal) -> Decimal {
        size
    }

    fn adjust_sell_limit_size(&self, _context: &dyn Service, _request: &Request, size: Decimal) -> Decimal {
        size
    }

    /// Run every hook over one set of candidate prices and size.
    fn advise(
        &self,
        context: &dyn Service,
        request: &Request,
        buy_price: Option<Decimal>,
        sell_price: Option<Decimal>,
        size: Decimal,
    ) -> Advice {
        Advice {
            swap_rate: self.calculate_swap_rate(context, request),
            buy_boundary_price: self.adjust_buy_boundary_price(context, request, buy_price),
            sell_boundary_price: self.adjust_sell_boundary_price(context, request, sell_price),
            buy_limit_size: self.adjust_buy_limit_size(context, request, size),
            sell_limit_size: self.adjust_sell_limit_size(context, request, size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct Passthrough;

    impl Adviser for Passthrough {
        fn get(&self) -> &str {
            "passthrough"
        }
    }

    struct Nothing;

    impl Service for Nothing {
        fn get(&self) -> &str {
            "nothing"
        }
    }

    #[test]
    fn test_default_hooks_leave_values_untouched() {
        let request = Request::default();
        let advice = Passthrough.advise(&Nothing, &request, Some(dec!(99)), None, dec!(1.5));

        assert_eq!(
            advice,
            Advice {
                swap_rate: Decimal::ZERO,
                buy_boundary_price: Some(dec!(99)),
                sell_boundary_price: None,
                buy_limit_size: dec!(1.5),
                sell_limit_size: dec!(1.5),
            }
        );
        assert_eq!(Passthrough.adjust_basis(&Nothing, &request, Some(dec!(0.002))), Some(dec!(0.002)));
        assert_eq!(Passthrough.adjust_basis(&Nothing, &request, None), None);
    }
}
