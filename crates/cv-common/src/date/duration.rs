use chrono::{Datelike, NaiveDate};

use super::{find_month, find_year, is_ongoing};

/// 開始〜終了の月数
///
/// - 年は各文字列の最初の 4 桁
/// - 月名がなければ開始は 1 月、終了は 12 月とみなす
/// - 終了が Present/Current 等なら `today` の年月
/// - 年が読めなければ `None`
pub fn duration_months(start: &str, end: &str, today: NaiveDate) -> Option<i32> {
    let start_year = find_year(start)?;
    let start_month = find_month(start).unwrap_or(1) as i32;

    let (end_year, end_month) = if is_ongoing(end) {
        (today.year(), today.month() as i32)
    } else {
        let year = find_year(end)?;
        (year, find_month(end).unwrap_or(12) as i32)
    };

    Some((end_year - start_year) * 12 + (end_month - start_month))
}

fn plural(count: i32, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// 月数を "Less than 1 month" / "N months" / "Y years M months" に整形
pub fn format_months(total_months: i32) -> String {
    if total_months < 1 {
        return "Less than 1 month".to_string();
    }
    if total_months < 12 {
        return plural(total_months, "month");
    }

    let years = total_months / 12;
    let months = total_months % 12;
    if months == 0 {
        plural(years, "year")
    } else {
        format!("{} {}", plural(years, "year"), plural(months, "month"))
    }
}

/// 職歴 1 件の期間表記。日付が読めなければ空文字
pub fn calculate_duration(start: &str, end: &str, today: NaiveDate) -> String {
    duration_months(start, end, today)
        .map(format_months)
        .unwrap_or_default()
}

/// 読める期間だけを合算した月数（負の期間は 0 扱い）。1 件も読めなければ `None`
pub fn total_experience_months<'a, I>(ranges: I, today: NaiveDate) -> Option<i32>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    ranges
        .into_iter()
        .filter_map(|(start, end)| duration_months(start, end, today))
        .map(|months| months.max(0))
        .reduce(|acc, months| acc + months)
}
