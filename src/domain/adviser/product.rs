//! Bitflyer product catalog

use std::fmt;

/// Maturity marker separating a future's root from its tenor, e.g. `BTCJPY_MAT1WK`.
const MATURITY_MARKER: &str = "_MAT";

/// Instruments listed on bitFlyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProductType {
    BtcJpy,
    FxBtcJpy,
    EthBtc,
    BchBtc,
    BtcjpyMat1wk,
    BtcjpyMat2wk,
    BtcjpyMat3m,
}

impl ProductType {
    pub const ALL: [ProductType; 7] = [
        ProductType::BtcJpy,
        ProductType::FxBtcJpy,
        ProductType::EthBtc,
        ProductType::BchBtc,
        ProductType::BtcjpyMat1wk,
        ProductType::BtcjpyMat2wk,
        ProductType::BtcjpyMat3m,
    ];

    /// Exchange product code
    pub fn code(&self) -> &'static str {
        match self {
            ProductType::BtcJpy => "BTC_JPY",
            ProductType::FxBtcJpy => "FX_BTC_JPY",
            ProductType::EthBtc => "ETH_BTC",
            ProductType::BchBtc => "BCH_BTC",
            ProductType::BtcjpyMat1wk => "BTCJPY_MAT1WK",
            ProductType::BtcjpyMat2wk => "BTCJPY_MAT2WK",
            ProductType::BtcjpyMat3m => "BTCJPY_MAT3M",
        }
    }

    pub fn find(code: &str) -> Option<ProductType> {
        Self::ALL.iter().copied().find(|p| p.code() == code)
    }

    pub fn is_derivative(&self) -> bool {
        self.code().contains(MATURITY_MARKER)
    }

    /// Cash product a dated future settles against: `BTCJPY_MAT1WK` -> `BTC_JPY`.
    pub fn underlying(&self) -> Option<ProductType> {
        let (root, _tenor) = self.code().split_once(MATURITY_MARKER)?;
        Self::ALL
            .iter()
            .copied()
            .filter(|p| !p.is_derivative())
            .find(|p| p.code().replace('_', "") == root)
    }

    /// Futures settling against the same cash product as `self`.
    pub fn related_futures(&self) -> Vec<ProductType> {
        let root = match self {
            ProductType::FxBtcJpy => Some(ProductType::BtcJpy),
            p if p.is_derivative() => p.underlying(),
            p => Some(*p),
        };

        Self::ALL
            .iter()
            .copied()
            .filter(|p| p.is_derivative() && p.underlying() == root)
            .collect()
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for product in ProductType::ALL {
            assert_eq!(ProductType::find(product.code()), Some(product));
        }
        assert_eq!(ProductType::find("XRP_JPY"), None);
    }

    #[test]
    fn test_underlying() {
        assert_eq!(ProductType::BtcjpyMat1wk.underlying(), Some(ProductType::BtcJpy));
        assert_eq!(ProductType::BtcjpyMat2wk.underlying(), Some(ProductType::BtcJpy));
        assert_eq!(ProductType::BtcjpyMat3m.underlying(), Some(ProductType::BtcJpy));
        assert_eq!(ProductType::BtcJpy.underlying(), None);
        assert_eq!(ProductType::FxBtcJpy.underlying(), None);
    }

    #[test]
    fn test_related_futures() {
        let expected = vec![
            ProductType::BtcjpyMat1wk,
            ProductType::BtcjpyMat2wk,
            ProductType::BtcjpyMat3m,
        ];
        assert_eq!(ProductType::FxBtcJpy.related_futures(), expected);
        assert_eq!(ProductType::BtcJpy.related_futures(), expected);
        assert!(ProductType::EthBtc.related_futures().is_empty());
    }
}
