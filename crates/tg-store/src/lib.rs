pub mod store;

pub use crate::store::{StoreConfig, TelemetryStore};
