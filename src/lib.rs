pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, OutputFormat};
pub use config::RolloverConfig;

pub use adapters::JsonFileStore;
pub use core::rollover::{RolloverEngine, RolloverOutcome, RolloverRequest};
pub use core::{ObligationClass, ObligationClassifier, Period, RolloverInput, RolloverPlan, RolloverPlanner};
pub use domain::model::{
    Customer, CustomerId, CustomerSelection, DeclarationItem, DeclarationType,
    ExistingDeclaration, SourceItem, StoredDeclaration, TypeId,
};
pub use utils::error::{RolloverError, Result};
