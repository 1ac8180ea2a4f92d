use crate::domain::model::{DeclarationItem, DedupKey};
use crate::utils::error::{Result, RolloverError};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(RolloverError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(RolloverError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RolloverError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(RolloverError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_tokens(field_name: &str, tokens: &[String]) -> Result<()> {
    if tokens.iter().any(|t| t.trim().is_empty()) {
        return Err(RolloverError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: tokens.join(","),
            reason: "Tokens cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// 寫入前的檢查：每筆都要有客戶、類型、期間與到期日，且整批不得重複
pub fn validate_payload(items: &[DeclarationItem]) -> Result<()> {
    let mut seen: HashSet<DedupKey> = HashSet::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let missing = if item.customer_id.is_empty() {
            Some("customer id is required")
        } else if item.type_id.is_empty() {
            Some("declaration type id is required")
        } else if item.period_name.trim().is_empty() {
            Some("target period is required")
        } else if item.due_date.is_none() {
            Some("due date is required")
        } else {
            None
        };

        if let Some(reason) = missing {
            return Err(RolloverError::InvalidPayload {
                index,
                reason: reason.to_string(),
            });
        }

        if !seen.insert(item.dedup_key()) {
            return Err(RolloverError::DuplicateDeclaration {
                customer_id: item.customer_id.to_string(),
                type_id: item.type_id.to_string(),
                period_name: item.period_name.clone(),
            });
        }
    }

    Ok(())
}

impl Validate for [DeclarationItem] {
    fn validate(&self) -> Result<()> {
        validate_payload(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CustomerId, TypeId};
    use chrono::NaiveDate;

    fn item(customer: &str, type_id: &str, due: Option<NaiveDate>) -> DeclarationItem {
        DeclarationItem {
            customer_id: CustomerId::from(customer),
            type_id: TypeId::from(type_id),
            due_date: due,
            period_name: "12/2025".to_string(),
            customer_title: "Acme".to_string(),
        }
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("planning.default_due_day", 15, 1, 31).is_ok());
        assert!(validate_range("planning.default_due_day", 0, 1, 31).is_err());
        assert!(validate_range("planning.default_due_day", 32, 1, 31).is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("store.path", "./declarations.json").is_ok());
        assert!(validate_path("store.path", "").is_err());
    }

    #[test]
    fn test_validate_payload_requires_due_date() {
        let due = NaiveDate::from_ymd_opt(2026, 1, 15);
        let items = vec![item("1", "2", due), item("1", "3", None)];
        match validate_payload(&items) {
            Err(RolloverError::InvalidPayload { index, reason }) => {
                assert_eq!(index, 1);
                assert_eq!(reason, "due date is required");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_payload_rejects_duplicates() {
        let due = NaiveDate::from_ymd_opt(2026, 1, 15);
        let items = vec![item("1", "2", due), item("1", "2", due)];
        assert!(matches!(
            items.validate(),
            Err(RolloverError::DuplicateDeclaration { .. })
        ));
    }

    #[test]
    fn test_validate_payload_requires_ids() {
        let due = NaiveDate::from_ymd_opt(2026, 1, 15);
        assert!(validate_payload(&[item("", "2", due)]).is_err());
        assert!(validate_payload(&[item("1", "", due)]).is_err());
        assert!(validate_payload(&[item("1", "2", due)]).is_ok());
    }
}
