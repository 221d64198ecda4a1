//! Statistics domain - constants consumed by confidence-interval estimators

mod student_t;

pub use student_t::{critical_value, DEGREES};
