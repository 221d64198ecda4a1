//! Infrastructure layer - site adapters and the routing registry

pub mod context;

pub use context::{ContextRouter, ServiceFactory, SnapshotService};
