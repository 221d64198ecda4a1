pub mod factory;
pub mod router;
pub mod snapshot;

pub use factory::ServiceFactory;
pub use router::ContextRouter;
pub use snapshot::{InstrumentSnapshot, Snapshot, SnapshotService};
