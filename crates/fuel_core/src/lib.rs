//! `fuel_core` — the refueling station monitor.
//!
//! No IO. Callers share one [`Station`] across threads and block inside it
//! until docking space, fuel, or storage headroom is available.

mod config;
mod station;
mod types;

pub use config::{DeliveryCheck, MillisRange, StationConfig};
pub use station::Station;
pub use types::*;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

#[cfg(test)]
mod tests;
