//! Cryptotrader - multi-exchange trading decision core
//! Built with Domain-Driven Design principles

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use domain::adviser::{Advice, Adviser, BitflyerAdviser, ProductType};
pub use domain::composite::{calculate_composite, CompositeEngine};
pub use domain::context::Service;
pub use domain::series::{calculate_returns, collapse_prices};
pub use infrastructure::context::{ContextRouter, ServiceFactory, SnapshotService};
pub use shared::config::Configuration;
pub use shared::errors::{AppError, ServiceError, ShutdownError};
pub use shared::types::{Key, Request};
