use crate::core::period::Period;
use crate::domain::model::DEFAULT_DUE_DAY;
use crate::utils::date_format::format_date;
use chrono::NaiveDate;

/// 年報固定於目標年度次年 3 月 31 日到期
pub const ANNUAL_DUE_MONTH: u32 = 3;
pub const ANNUAL_DUE_DAY: u32 = 31;

/// 期間的預設到期日。
///
/// - 月報 `MM/YYYY`：次月的 `default_day`，12 月跨年到 1 月
/// - 季報 `Qn/YYYY`：第 `n*3+1` 月的 `default_day`，Q4 一律為次年 1 月
///
/// 無效期間或當月不存在該日（例如 4 月 31 日）回傳 `None`。
pub fn due_date_for(period: &Period, default_day: u32) -> Option<NaiveDate> {
    let (year, month) = match *period {
        Period::Monthly { month, year } => roll_month(year, month + 1),
        Period::Quarterly { quarter, year } => roll_month(year, quarter * 3 + 1),
        Period::Invalid => return None,
    };
    NaiveDate::from_ymd_opt(year, month, default_day)
}

fn roll_month(year: i32, month: u32) -> (i32, u32) {
    if month > 12 {
        (year + 1, 1)
    } else {
        (year, month)
    }
}

/// 年報到期日：目標期間年度的次年 3/31
pub fn annual_due_date(target: &Period) -> Option<NaiveDate> {
    target
        .year()
        .and_then(|year| NaiveDate::from_ymd_opt(year + 1, ANNUAL_DUE_MONTH, ANNUAL_DUE_DAY))
}

/// 字串版本，無法計算時回傳 `""`
pub fn default_due_date(period: &str, default_day: Option<u32>) -> String {
    let day = default_day.unwrap_or(DEFAULT_DUE_DAY);
    format_date(due_date_for(&Period::parse(period), day))
}
