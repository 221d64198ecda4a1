//! Context domain - the uniform per-site market/order capability

mod service;

pub use service::Service;
