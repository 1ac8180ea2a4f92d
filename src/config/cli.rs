use crate::domain::model::CustomerId;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
    Table,
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "decl-rollover")]
#[command(about = "Roll declaration obligations forward into the next reporting period")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "rollover.toml")]
    pub config: String,

    /// Source period (MM/YYYY); defaults to the latest period in the store
    #[arg(long)]
    pub source: Option<String>,

    /// Target period (MM/YYYY or Qn/YYYY); defaults to the month after the source
    #[arg(long)]
    pub target: Option<String>,

    /// Customers that should not receive newly injected obligations
    #[arg(long, value_delimiter = ',')]
    pub exclude_customers: Vec<String>,

    /// Customers that should receive newly injected obligations even if inactive
    #[arg(long, value_delimiter = ',')]
    pub include_customers: Vec<String>,

    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Show the plan without writing anything
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    /// 命令列指定的客戶勾選，排除優先於加入
    pub fn selection_overrides(&self) -> Vec<(CustomerId, bool)> {
        let included = self
            .include_customers
            .iter()
            .map(|id| (CustomerId::from(id.trim()), true));
        let excluded = self
            .exclude_customers
            .iter()
            .map(|id| (CustomerId::from(id.trim()), false));
        included.chain(excluded).collect()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        crate::utils::validation::validate_path("config", &self.config)?;
        for (field, value) in [("source", &self.source), ("target", &self.target)] {
            if let Some(period) = value {
                crate::utils::validation::validate_non_empty_string(field, period)?;
            }
        }
        Ok(())
    }
}
