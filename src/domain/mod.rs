//! Domain layer - core business logic and entities

pub mod adviser;
pub mod composite;
pub mod context;
pub mod series;
pub mod statistics;
