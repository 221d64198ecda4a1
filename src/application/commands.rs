//! CLI commands and handlers
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::domain::adviser::{Advice, Adviser, BitflyerAdviser};
use crate::domain::composite::CompositeEngine;
use crate::domain::context::Service;
use crate::domain::series::{calculate_returns, collapse_prices};
use crate::domain::statistics::critical_value;
use crate::infrastructure::context::{ContextRouter, ServiceFactory};
use crate::shared::config::{Configuration, PropertyType};
use crate::shared::errors::AppError;
use crate::shared::types::{Composite, DecimalSeries, Key, Request};
use crate::shared::utils::trim_to_empty;

#[derive(Parser)]
#[command(name = "cryptotrader")]
#[command(about = "Trading decision core: composite prices, returns and venue advice")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "Config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a composite price formula over mid prices
    Composite {
        /// Leg as `<op><site>:<instrument>`, e.g. `+bitflyer:BTC_JPY`
        #[arg(short, long = "leg", value_parser = parse_leg, required = true)]
        legs: Vec<Composite>,

        /// Quote time (RFC 3339)
        #[arg(short, long)]
        time: Option<DateTime<Utc>>,
    },

    /// Collapse trades into a fixed-interval series and compute log returns
    Returns {
        #[arg(short, long)]
        site: String,

        #[arg(short, long)]
        instrument: String,

        /// Series start (RFC 3339)
        #[arg(long)]
        from: DateTime<Utc>,

        /// Series end, exclusive (RFC 3339)
        #[arg(long)]
        to: DateTime<Utc>,

        /// Bucket width in seconds; defaults to the configured trading interval
        #[arg(long)]
        interval: Option<i64>,

        /// Keep only the last print of each bucket instead of volume weighting
        #[arg(long)]
        last: bool,
    },

    /// Apply the site's adviser to candidate boundary prices and size
    Advise {
        #[arg(short, long)]
        site: String,

        #[arg(short, long)]
        instrument: String,

        /// Decision time (RFC 3339); defaults to now
        #[arg(short, long)]
        time: Option<DateTime<Utc>>,

        #[arg(long)]
        spread: Option<Decimal>,

        #[arg(long)]
        buy_price: Option<Decimal>,

        #[arg(long)]
        sell_price: Option<Decimal>,

        #[arg(long, default_value = "0")]
        size: Decimal,
    },

    /// Print the two-sided 95% Student-t critical value for a sample count
    Critical {
        #[arg(short, long)]
        samples: u64,
    },
}

/// Parse `<op><site>:<instrument>` into a composite leg.
pub fn parse_leg(value: &str) -> Result<Composite, String> {
    let (site, instrument) = value
        .split_once(':')
        .ok_or_else(|| format!("expected <op><site>:<instrument>, got {}", value))?;

    if site.chars().count() < 2 || instrument.is_empty() {
        return Err(format!("expected <op><site>:<instrument>, got {}", value));
    }

    Ok(Composite::new(site, instrument))
}

#[derive(Debug, Serialize)]
struct CompositeOutput {
    legs: Vec<Composite>,
    price: Option<Decimal>,
}

#[derive(Debug, Serialize)]
struct ReturnsOutput {
    prices: DecimalSeries,
    returns: DecimalSeries,
}

#[derive(Debug, Serialize)]
struct AdviseOutput {
    adviser: String,
    #[serde(flatten)]
    advice: Advice,
}

#[derive(Debug, Serialize)]
struct CriticalOutput {
    samples: u64,
    critical_value: Decimal,
}

const DEFAULT_INTERVAL_SECS: i64 = 60;

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command against the configured sites
    pub fn execute(command: Commands, configuration: Arc<Configuration>, base_dir: &Path) -> Result<(), AppError> {
        if let Commands::Critical { samples } = command {
            return print(&Self::execute_critical_command(samples));
        }

        let router = ServiceFactory::load(&configuration, base_dir)?;

        let result = match command {
            Commands::Composite { legs, time } => {
                print(&Self::execute_composite_command(&router, legs, time))
            }
            Commands::Returns { site, instrument, from, to, interval, last } => {
                let interval = interval.unwrap_or_else(|| configured_interval(&configuration));
                Self::execute_returns_command(&router, &site, &instrument, from, to, interval, !last)
                    .and_then(|output| print(&output))
            }
            Commands::Advise { site, instrument, time, spread, buy_price, sell_price, size } => {
                let mut request = Request::builder()
                    .site(site)
                    .instrument(instrument)
                    .current_time(time.unwrap_or_else(Utc::now));
                if let Some(spread) = spread {
                    request = request.trading_spread(spread);
                }
                Self::execute_advise_command(&router, configuration.clone(), &request.build(), buy_price, sell_price, size)
                    .and_then(|output| print(&output))
            }
            Commands::Critical { .. } => Ok(()),
        };

        router.shutdown()?;
        result
    }

    fn execute_composite_command(
        router: &ContextRouter,
        legs: Vec<Composite>,
        time: Option<DateTime<Utc>>,
    ) -> CompositeOutput {
        let price = CompositeEngine::new(router).evaluate(&legs, time);
        info!("Composite of {} leg(s) : {:?}", legs.len(), price);
        CompositeOutput { legs, price }
    }

    fn execute_returns_command(
        router: &ContextRouter,
        site: &str,
        instrument: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        interval_secs: i64,
        sum: bool,
    ) -> Result<ReturnsOutput, AppError> {
        let interval = Duration::try_seconds(interval_secs)
            .filter(|d| *d > Duration::zero())
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid interval: {}", interval_secs)))?;
        let key = Key::builder().site(site).instrument(instrument).build();

        let trades = trim_to_empty(router.list_trades(&key, from.checked_sub_signed(interval)));
        info!("Collapsing {} trade(s) of {}:{}", trades.len(), site, instrument);

        let prices = collapse_prices(&trades, interval, from, to, sum);
        let returns = calculate_returns(&prices);

        Ok(ReturnsOutput { prices, returns })
    }

    fn execute_advise_command(
        router: &ContextRouter,
        configuration: Arc<Configuration>,
        request: &Request,
        buy_price: Option<Decimal>,
        sell_price: Option<Decimal>,
        size: Decimal,
    ) -> Result<AdviseOutput, AppError> {
        let advisers: Vec<Box<dyn Adviser>> = vec![Box::new(BitflyerAdviser::new(configuration))];

        let site = request.site().unwrap_or_default();
        let adviser = advisers
            .iter()
            .find(|a| a.get() == site)
            .ok_or_else(|| AppError::InvalidInput(format!("No adviser for site {}", site)))?;

        let advice = adviser.advise(router, request, buy_price, sell_price, size);
        info!("Advice [{}] : {:?}", adviser.get(), advice);

        Ok(AdviseOutput {
            adviser: adviser.get().to_string(),
            advice,
        })
    }

    fn execute_critical_command(samples: u64) -> CriticalOutput {
        CriticalOutput {
            samples,
            critical_value: critical_value(samples),
        }
    }
}

fn configured_interval(configuration: &Configuration) -> i64 {
    configuration
        .get_property(PropertyType::TradingInterval)
        .and_then(|v| v.as_integer())
        .map(|millis| millis / 1000)
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_INTERVAL_SECS)
}

fn print<T: Serialize>(output: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| AppError::InvalidInput(format!("Failed to serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::context::SnapshotService;
    use rust_decimal_macros::dec;
    use toml::Value;

    fn router() -> ContextRouter {
        let snapshot = r#"
            [[instruments]]
            code = "BTC_JPY"
            best_bid = "5000"
            best_ask = "5010"
            commission_rate = "0.0012"

            [[instruments.trades]]
            timestamp = "2017-08-25T00:00:10Z"
            price = "5000"
            size = "1"

            [[instruments.trades]]
            timestamp = "2017-08-25T00:01:10Z"
            price = "5100"
            size = "1"

            [[instruments]]
            code = "BTCJPY_MAT1WK"
            mid = "5100"
            expiry = "2017-08-26T16:00:00+09:00"
        "#;
        let service = SnapshotService::from_toml("bitflyer", snapshot).unwrap();
        ContextRouter::new(vec![Arc::new(service) as Arc<dyn Service>])
    }

    fn time(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(2017, 8, 25, h, m, s).unwrap()
    }

    #[test]
    fn test_parse_cli() {
        let cli = Cli::try_parse_from([
            "cryptotrader",
            "composite",
            "--leg",
            "+bitflyer:BTC_JPY",
            "--leg",
            "/bitflyer:BTCJPY_MAT1WK",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("Config.toml"));
        match cli.command {
            Commands::Composite { legs, time } => {
                assert_eq!(legs[1], Composite::new("/bitflyer", "BTCJPY_MAT1WK"));
                assert!(time.is_none());
            }
            _ => panic!("expected composite"),
        }

        assert!(Cli::try_parse_from(["cryptotrader", "composite"]).is_err());
        assert!(Cli::try_parse_from(["cryptotrader", "critical", "--samples", "x"]).is_err());
    }

    #[test]
    fn test_parse_leg() {
        assert_eq!(parse_leg("+bf:BTC_JPY"), Ok(Composite::new("+bf", "BTC_JPY")));
        assert!(parse_leg("+bf").is_err());
        assert!(parse_leg("+:BTC_JPY").is_err());
        assert!(parse_leg("+bf:").is_err());
    }

    #[test]
    fn test_composite_command() {
        let legs = vec![
            Composite::new("+bitflyer", "BTCJPY_MAT1WK"),
            Composite::new("-bitflyer", "BTC_JPY"),
        ];
        let output = CommandExecutor::execute_composite_command(&router(), legs, None);
        assert_eq!(output.price, Some(dec!(95)));
    }

    #[test]
    fn test_returns_command() {
        let output = CommandExecutor::execute_returns_command(
            &router(),
            "bitflyer",
            "BTC_JPY",
            time(0, 1, 0),
            time(0, 3, 0),
            60,
            true,
        )
        .unwrap();

        assert_eq!(output.prices.len(), 2);
        assert_eq!(output.prices[&time(0, 1, 0)], Some(dec!(5000)));
        assert_eq!(output.prices[&time(0, 2, 0)], Some(dec!(5100)));
        assert_eq!(output.returns.len(), 1);
        assert!(output.returns[&time(0, 2, 0)].unwrap() > Decimal::ZERO);

        assert!(CommandExecutor::execute_returns_command(
            &router(),
            "bitflyer",
            "BTC_JPY",
            time(0, 1, 0),
            time(0, 3, 0),
            0,
            true,
        )
        .is_err());
    }

    #[test]
    fn test_advise_command() {
        use chrono::TimeZone;
        let now = chrono::FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2017, 8, 25, 8, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let request = Request::builder()
            .site("bitflyer")
            .instrument("BTCJPY_MAT1WK")
            .current_time(now)
            .trading_spread(dec!(0.0008))
            .build();

        let output = CommandExecutor::execute_advise_command(
            &router(),
            Arc::new(Configuration::default()),
            &request,
            Some(dec!(6000)),
            Some(dec!(4000)),
            dec!(1),
        )
        .unwrap();

        assert_eq!(output.adviser, "bitflyer");
        assert_eq!(output.advice.swap_rate, dec!(0.0004));
        assert_eq!(output.advice.buy_boundary_price, Some(dec!(4988)));
        assert_eq!(output.advice.sell_boundary_price, Some(dec!(5022.024)));

        let unknown = Request::builder().site("nowhere").build();
        assert!(CommandExecutor::execute_advise_command(
            &router(),
            Arc::new(Configuration::default()),
            &unknown,
            None,
            None,
            dec!(1),
        )
        .is_err());
    }

    #[test]
    fn test_critical_command() {
        let output = CommandExecutor::execute_critical_command(1);
        assert_eq!(output.critical_value, dec!(12.7062));
        assert_eq!(
            serde_json::to_value(&output).unwrap()["critical_value"],
            serde_json::json!("12.7062")
        );
    }

    #[test]
    fn test_configured_interval() {
        assert_eq!(configured_interval(&Configuration::default()), DEFAULT_INTERVAL_SECS);

        let configuration = Configuration::from_entries([(
            "cryptotrader.trading_interval",
            Value::Integer(300_000),
        )]);
        assert_eq!(configured_interval(&configuration), 300);
    }
}
