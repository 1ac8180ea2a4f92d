use crate::core::classifier::ClassifierRules;
use crate::core::planner::DEFAULT_CUSTOMER_TITLE_TEMPLATE;
use crate::domain::model::{CustomerId, TypeId, DEFAULT_DUE_DAY};
use crate::utils::date_format::parse_date;
use crate::utils::error::{Result, RolloverError};
use crate::utils::validation::{self, Validate};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloverConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub planning: PlanningConfig,
    #[serde(default)]
    pub classifier: ClassifierRules,
    pub logging: Option<LoggingConfig>,
    /// 類型 id -> 到期日 (YYYY-MM-DD)
    pub due_date_overrides: Option<HashMap<String, String>>,
    /// 客戶 id -> 是否加入新注入的申報
    pub customer_selection: Option<HashMap<String, bool>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    pub source_period: Option<String>,
    pub target_period: Option<String>,
    pub default_due_day: u32,
    pub customer_title_template: String,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            source_period: None,
            target_period: None,
            default_due_day: DEFAULT_DUE_DAY,
            customer_title_template: DEFAULT_CUSTOMER_TITLE_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
    pub verbose: Option<bool>,
}

impl RolloverConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RolloverError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| RolloverError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${STORE_PATH})，未設定的保留原字樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("store.path", &self.store.path)?;
        validation::validate_range("planning.default_due_day", self.planning.default_due_day, 1, 31)?;
        validation::validate_non_empty_string(
            "planning.customer_title_template",
            &self.planning.customer_title_template,
        )?;

        validation::validate_tokens("classifier.quarterly_tokens", &self.classifier.quarterly_tokens)?;
        validation::validate_tokens("classifier.annual_markers", &self.classifier.annual_markers)?;
        validation::validate_tokens(
            "classifier.quarter_end_injection_tokens",
            &self.classifier.quarter_end_injection_tokens,
        )?;
        validation::validate_tokens(
            "classifier.year_end_injection_tokens",
            &self.classifier.year_end_injection_tokens,
        )?;

        if let Some(overrides) = &self.due_date_overrides {
            for (type_id, date) in overrides {
                if parse_date(date).is_none() {
                    return Err(RolloverError::InvalidConfigValueError {
                        field: format!("due_date_overrides.{}", type_id),
                        value: date.clone(),
                        reason: "Expected a date in YYYY-MM-DD format".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn store_path(&self) -> &str {
        &self.store.path
    }

    pub fn due_date_overrides(&self) -> BTreeMap<TypeId, NaiveDate> {
        self.due_date_overrides
            .iter()
            .flatten()
            .filter_map(|(type_id, date)| parse_date(date).map(|d| (TypeId::from(type_id.as_str()), d)))
            .collect()
    }

    pub fn selection_overrides(&self) -> BTreeMap<CustomerId, bool> {
        self.customer_selection
            .iter()
            .flatten()
            .map(|(id, included)| (CustomerId::from(id.as_str()), *included))
            .collect()
    }

    pub fn json_logging(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn verbose_logging(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }
}

impl Validate for RolloverConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
