//! Two-sided 95% Student-t critical values keyed by sample size.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Ascending (sample size threshold, critical value) pairs. The final entry catches
/// everything above 2880 with the asymptotic normal value.
pub const DEGREES: [(u64, Decimal); 23] = [
    (1, dec!(12.7062)),
    (2, dec!(4.3027)),
    (3, dec!(3.1824)),
    (4, dec!(2.7764)),
    (5, dec!(2.5706)),
    (6, dec!(2.4469)),
    (7, dec!(2.3646)),
    (8, dec!(2.3060)),
    (9, dec!(2.2622)),
    (10, dec!(2.2281)),
    (15, dec!(2.1314)),
    (20, dec!(2.0860)),
    (30, dec!(2.0423)),
    (45, dec!(2.0141)),
    (60, dec!(2.0003)),
    (90, dec!(1.9867)),
    (120, dec!(1.9799)),
    (180, dec!(1.9732)),
    (360, dec!(1.9666)),
    (720, dec!(1.9633)),
    (1440, dec!(1.9616)),
    (2880, dec!(1.9608)),
    (u64::MAX, dec!(1.9600)),
];

/// Critical value of the smallest threshold >= `samples`.
pub fn critical_value(samples: u64) -> Decimal {
    let index = DEGREES.partition_point(|(threshold, _)| *threshold < samples);
    // The u64::MAX sentinel guarantees a match.
    DEGREES[index.min(DEGREES.len() - 1)].1
}
