pub mod duration;

pub use duration::{calculate_duration, duration_months, format_months, total_experience_months};

use lazy_static::lazy_static;
use regex::Regex;

/// 月名（フル表記 / 3 文字略記）。他モジュールの正規表現に埋め込んで使う
pub const MONTH_PATTERN: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

lazy_static! {
    static ref MONTH_RE: Regex = Regex::new(&format!(r"(?i)\b({MONTH_PATTERN})\b")).unwrap();
    static ref YEAR_RE: Regex = Regex::new(r"\d{4}").unwrap();
    static ref ONGOING_RE: Regex =
        Regex::new(r"(?i)^\s*(?:present|current|till\s+date|to\s+date|ongoing|now)\s*$").unwrap();
}

/// 月名 → 1..=12
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.trim().to_ascii_lowercase();
    let prefix = lower.get(..3)?;
    let month = match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// 文字列中の最初の月名
pub fn find_month(text: &str) -> Option<u32> {
    MONTH_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| month_from_name(m.as_str()))
}

/// 文字列中の最初の 4 桁の数字
pub fn find_year(text: &str) -> Option<i32> {
    YEAR_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

/// "Present" / "Current" など「現在まで」を表す終了日
pub fn is_ongoing(text: &str) -> bool {
    ONGOING_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names_and_abbreviations() {
        assert_eq!(month_from_name("January"), Some(1));
        assert_eq!(month_from_name("sept"), Some(9));
        assert_eq!(month_from_name("DEC"), Some(12));
        assert_eq!(month_from_name("Ma"), None);
        assert_eq!(month_from_name("Foo"), None);
        assert_eq!(find_month("Joined in Aug 2019"), Some(8));
        assert_eq!(find_month("Marketing 2019"), None);
    }

    #[test]
    fn years_and_ongoing_markers() {
        assert_eq!(find_year("Jan 2020"), Some(2020));
        assert_eq!(find_year("Present"), None);
        assert!(is_ongoing("Present"));
        assert!(is_ongoing(" current "));
        assert!(is_ongoing("Till Date"));
        assert!(!is_ongoing("Dec 2021"));
    }
}
