pub mod classifier;
pub mod due_date;
pub mod period;
pub mod planner;
pub mod prepare;
pub mod rollover;

pub use crate::domain::ports::{CatalogProvider, CustomerDirectory, ExistingRecords, PersistenceSink};
pub use crate::utils::error::Result;
pub use classifier::{ClassifierRules, ObligationClass, ObligationClassifier};
pub use period::Period;
pub use planner::{RolloverInput, RolloverPlan, RolloverPlanner};
