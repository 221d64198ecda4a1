//! Composite domain - synthetic prices blended across sites

mod composite_engine;

pub use composite_engine::{calculate_composite, CompositeEngine, Operation};
