//! 申報期間：`MM/YYYY`（月）或 `Qn/YYYY`（季）。
//!
//! 字串只在 [`Period::parse`] 與 `Display` 出入，其餘邏輯都操作列舉本身。
//! 無法辨識的字串是資料狀況而非錯誤，以 [`Period::Invalid`] 表示。

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static MONTHLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0?[1-9]|1[0-2])/(\d{4})$").expect("monthly period pattern is valid")
});

static QUARTERLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[Qq]([1-4])/(\d{4})$").expect("quarterly period pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Monthly { month: u32, year: i32 },
    Quarterly { quarter: u32, year: i32 },
    Invalid,
}

impl Period {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        if let Some(caps) = MONTHLY_RE.captures(text) {
            if let (Ok(month), Ok(year)) = (caps[1].parse(), caps[2].parse()) {
                return Period::Monthly { month, year };
            }
        }

        if let Some(caps) = QUARTERLY_RE.captures(text) {
            if let (Ok(quarter), Ok(year)) = (caps[1].parse(), caps[2].parse()) {
                return Period::Quarterly { quarter, year };
            }
        }

        Period::Invalid
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Period::Invalid)
    }

    /// `year * 12 + month`，季以該季最後一個月代表
    pub fn ordering_key(&self) -> Option<i64> {
        match *self {
            Period::Monthly { month, year } => Some(i64::from(year) * 12 + i64::from(month)),
            Period::Quarterly { quarter, year } => {
                Some(i64::from(year) * 12 + i64::from(quarter * 3))
            }
            Period::Invalid => None,
        }
    }

    /// 只有月格式才有月份
    pub fn month(&self) -> Option<u32> {
        match *self {
            Period::Monthly { month, .. } => Some(month),
            _ => None,
        }
    }

    pub fn year(&self) -> Option<i32> {
        match *self {
            Period::Monthly { year, .. } | Period::Quarterly { year, .. } => Some(year),
            Period::Invalid => None,
        }
    }

    /// 季末月份（3/6/9/12）轉成對應的季；已是季格式的期間回傳 `None`
    pub fn quarter_end(&self) -> Option<Period> {
        match *self {
            Period::Monthly { month, year } if month % 3 == 0 => Some(Period::Quarterly {
                quarter: month / 3,
                year,
            }),
            _ => None,
        }
    }

    pub fn is_year_end(&self) -> bool {
        self.month() == Some(12)
    }

    /// 下一個月；只對月格式有定義
    pub fn successor(&self) -> Period {
        match *self {
            Period::Monthly { month: 12, year } => Period::Monthly {
                month: 1,
                year: year + 1,
            },
            Period::Monthly { month, year } => Period::Monthly {
                month: month + 1,
                year,
            },
            _ => Period::Invalid,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Monthly { month, year } => write!(f, "{:02}/{}", month, year),
            Period::Quarterly { quarter, year } => write!(f, "Q{}/{}", quarter, year),
            Period::Invalid => Ok(()),
        }
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 依排序鍵比較；無效期間小於任何有效期間，彼此相等。
/// 排序鍵相同時（例如 `03/2025` 與 `Q1/2025`）以月格式在前，維持與 `Eq` 一致。
impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordering_key()
            .cmp(&other.ordering_key())
            .then_with(|| granularity_rank(self).cmp(&granularity_rank(other)))
    }
}

fn granularity_rank(period: &Period) -> u8 {
    match period {
        Period::Invalid => 0,
        Period::Monthly { .. } => 1,
        Period::Quarterly { .. } => 2,
    }
}

pub fn parse(text: &str) -> Period {
    Period::parse(text)
}

pub fn ordering_key(text: &str) -> Option<i64> {
    Period::parse(text).ordering_key()
}

pub fn month_of(text: &str) -> Option<u32> {
    Period::parse(text).month()
}

pub fn year_of(text: &str) -> Option<i32> {
    Period::parse(text).year()
}

/// `"06/2025"` -> `Some("Q2/2025")`
pub fn is_quarter_end(text: &str) -> Option<String> {
    Period::parse(text).quarter_end().map(|q| q.to_string())
}

pub fn successor(text: &str) -> Period {
    Period::parse(text).successor()
}

/// 下一期名稱，無法推算時為空字串
pub fn next_period_name(text: &str) -> String {
    successor(text).to_string()
}

/// 只比較排序鍵：無效期間最小，兩個無效期間相等
pub fn compare(a: &str, b: &str) -> Ordering {
    ordering_key(a).cmp(&ordering_key(b))
}

/// 排序鍵最大的期間；鍵相同時取較後出現者，空輸入回傳 `""`
pub fn find_latest<S: AsRef<str>>(periods: &[S]) -> String {
    periods
        .iter()
        .map(AsRef::as_ref)
        .max_by(|a, b| compare(a, b))
        .map(str::to_string)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_forms() {
        assert_eq!(parse("03/2025"), Period::Monthly { month: 3, year: 2025 });
        assert_eq!(parse(" 3/2025 "), Period::Monthly { month: 3, year: 2025 });
        assert_eq!(parse("Q2/2025"), Period::Quarterly { quarter: 2, year: 2025 });
        assert_eq!(parse("q4/2024"), Period::Quarterly { quarter: 4, year: 2024 });
    }

    #[test]
    fn test_parse_rejects_other_text() {
        for text in ["", "13/2025", "00/2025", "Q5/2025", "Q0/2025", "2025-03", "03/25", "03/2025x"] {
            assert_eq!(parse(text), Period::Invalid, "{text:?} should be invalid");
        }
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(parse("3/2025").to_string(), "03/2025");
        assert_eq!(parse("q1/2025").to_string(), "Q1/2025");
        assert_eq!(Period::Invalid.to_string(), "");
    }

    #[test]
    fn test_ordering_key() {
        assert_eq!(ordering_key("01/2025"), Some(2025 * 12 + 1));
        assert_eq!(ordering_key("Q2/2025"), Some(2025 * 12 + 6));
        assert_eq!(ordering_key("garbage"), None);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(month_of("11/2025"), Some(11));
        assert_eq!(month_of("Q4/2025"), None);
        assert_eq!(year_of("11/2025"), Some(2025));
        assert_eq!(year_of("Q4/2025"), Some(2025));
        assert_eq!(year_of("nope"), None);
    }

    #[test]
    fn test_is_quarter_end() {
        assert_eq!(is_quarter_end("06/2025").as_deref(), Some("Q2/2025"));
        assert_eq!(is_quarter_end("12/2025").as_deref(), Some("Q4/2025"));
        assert_eq!(is_quarter_end("05/2025"), None);
        assert_eq!(is_quarter_end("Q2/2025"), None);
    }

    #[test]
    fn test_successor_rolls_year() {
        assert_eq!(next_period_name("11/2025"), "12/2025");
        assert_eq!(next_period_name("12/2025"), "01/2026");
        assert_eq!(successor("Q1/2025"), Period::Invalid);
        assert_eq!(next_period_name("bad"), "");
    }

    #[test]
    fn test_compare_orders_invalid_first() {
        assert_eq!(compare("01/2025", "12/2024"), Ordering::Greater);
        assert_eq!(compare("bad", "01/2000"), Ordering::Less);
        assert_eq!(compare("bad", "worse"), Ordering::Equal);
        assert_eq!(compare("03/2025", "Q1/2025"), Ordering::Equal);
    }

    #[test]
    fn test_find_latest() {
        assert_eq!(find_latest(&["02/2025", "11/2024", "bad", "01/2025"]), "02/2025");
        assert_eq!(find_latest(&["Q4/2024", "11/2024"]), "Q4/2024");
        assert_eq!(find_latest::<&str>(&[]), "");
    }

    #[test]
    fn test_find_latest_matches_max_key() {
        let periods = vec!["05/2023", "Q3/2024", "12/2023", "07/2024", "01/2024"];
        let latest = find_latest(&periods);
        let max_key = periods.iter().filter_map(|p| ordering_key(p)).max();
        assert_eq!(ordering_key(&latest), max_key);
    }
}
