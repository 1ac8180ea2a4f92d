use crate::domain::model::DeclarationType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static QUARTER_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Q[1-4]$").expect("quarter token pattern is valid"));

static TOKEN_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Z0-9]+").expect("token separator pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObligationClass {
    Monthly,
    Quarterly,
    Annual,
}

impl fmt::Display for ObligationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ObligationClass::Monthly => "monthly",
            ObligationClass::Quarterly => "quarterly",
            ObligationClass::Annual => "annual",
        };
        f.write_str(label)
    }
}

/// 申報類型名稱的比對規則
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierRules {
    /// 完整 token 比對，命中即為季報
    pub quarterly_tokens: Vec<String>,
    /// 子字串比對，命中即為年報
    pub annual_markers: Vec<String>,
    /// 季末時補上的類型
    pub quarter_end_injection_tokens: Vec<String>,
    /// 年末時額外補上的類型
    pub year_end_injection_tokens: Vec<String>,
}

fn to_owned_upper(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_uppercase()).collect()
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            quarterly_tokens: to_owned_upper(&["QL", "IL", "IS", "QS", "QUARTER"]),
            annual_markers: to_owned_upper(&["CD", "PD"]),
            quarter_end_injection_tokens: to_owned_upper(&["IL", "IS", "QL", "QS"]),
            year_end_injection_tokens: to_owned_upper(&["CD", "PD"]),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObligationClassifier {
    rules: ClassifierRules,
}

impl ObligationClassifier {
    pub fn new(rules: ClassifierRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// 年報優先於季報，兩者皆否則為月報
    pub fn classify(&self, type_name: &str) -> ObligationClass {
        if self.is_annual(type_name) {
            ObligationClass::Annual
        } else if self.is_quarterly(type_name) {
            ObligationClass::Quarterly
        } else {
            ObligationClass::Monthly
        }
    }

    pub fn is_quarterly(&self, type_name: &str) -> bool {
        let upper = type_name.to_uppercase();
        TOKEN_SPLIT_RE
            .split(&upper)
            .filter(|tok| !tok.is_empty())
            .any(|tok| {
                self.rules
                    .quarterly_tokens
                    .iter()
                    .any(|q| q.eq_ignore_ascii_case(tok))
                    || QUARTER_TOKEN_RE.is_match(tok)
            })
    }

    pub fn is_annual(&self, type_name: &str) -> bool {
        let upper = type_name.to_uppercase();
        self.rules
            .annual_markers
            .iter()
            .any(|marker| !marker.is_empty() && upper.contains(&marker.to_uppercase()))
    }

    /// 目標期間需要補上的類型 token：季末一律補季報，年末再加年報
    pub fn injection_tokens(&self, quarter_end: bool, year_end: bool) -> Vec<&str> {
        let mut tokens: Vec<&str> = Vec::new();
        if quarter_end || year_end {
            tokens.extend(self.rules.quarter_end_injection_tokens.iter().map(String::as_str));
        }
        if year_end {
            tokens.extend(self.rules.year_end_injection_tokens.iter().map(String::as_str));
        }
        tokens
    }
}

/// 名稱（轉大寫後）包含任一 token 子字串的類型，維持目錄原順序
pub fn find_by_tokens<'a, S: AsRef<str>>(
    types: &'a [DeclarationType],
    tokens: &[S],
) -> Vec<&'a DeclarationType> {
    let upper_tokens: Vec<String> = tokens
        .iter()
        .map(|t| t.as_ref().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect();

    types
        .iter()
        .filter(|ty| {
            let name = ty.type_name.to_uppercase();
            upper_tokens.iter().any(|tok| name.contains(tok.as_str()))
        })
        .collect()
}
