// Adapters layer: concrete implementations of the domain ports.

pub mod csv_report;
pub mod json_store;

pub use json_store::{JsonFileStore, StoreDocument};
