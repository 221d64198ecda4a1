//! Series domain - fixed-interval price series and returns

mod time_series;

pub use time_series::{calculate_returns, collapse_prices};
