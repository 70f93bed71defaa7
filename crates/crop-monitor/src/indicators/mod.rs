//! Weekly county indicator rows and the read-only store contract the analytics consume.

pub mod counties;
pub mod domain;
mod loader;
pub mod store;

pub use domain::{Fips, IndicatorRow, IndicatorStats, InvalidFips};
pub use store::{
    InMemoryIndicatorStore, IndicatorSnapshot, IndicatorStore, IndicatorTable, StoreError,
};
