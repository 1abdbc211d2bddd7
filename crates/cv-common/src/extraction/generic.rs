use lazy_static::lazy_static;
use regex::Regex;

use crate::date::MONTH_PATTERN;

pub const MAX_DATES: usize = 5;
pub const MAX_AMOUNTS: usize = 10;
pub const SUMMARY_CHARS: usize = 500;

lazy_static! {
    // "$450.00" / "€ 1,200" / "AED 15,000" / "Rs. 5000"
    static ref AMOUNT_RE: Regex = Regex::new(
        r"(?:[$€£₹¥]\s?\d[\d,]*(?:\.\d{1,2})?|\b(?:USD|EUR|GBP|INR|AED|SAR|QAR|Rs\.?)\s?\d[\d,]*(?:\.\d{1,2})?)"
    )
    .unwrap();
    static ref DATE_RE: Regex = Regex::new(&format!(
        r"(?i)\b(?:\d{{4}}-\d{{2}}-\d{{2}}|\d{{1,2}}[/.-]\d{{1,2}}[/.-]\d{{2,4}}|\d{{1,2}}\s+{m}\.?,?\s+\d{{4}}|{m}\.?\s+\d{{1,2}},?\s+\d{{4}})\b",
        m = MONTH_PATTERN
    ))
    .unwrap();
}

fn collect_unique<'a>(matches: impl Iterator<Item = &'a str>, cap: usize) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in matches {
        let value = m.trim().trim_end_matches(',').to_string();
        if !found.contains(&value) {
            found.push(value);
        }
        if found.len() == cap {
            break;
        }
    }
    found
}

/// 金額表記（通貨記号 / 通貨コード付き）。出現順・重複除去・最大 10 件
pub fn extract_amounts(text: &str) -> Vec<String> {
    collect_unique(AMOUNT_RE.find_iter(text).map(|m| m.as_str()), MAX_AMOUNTS)
}

/// 日付らしい表記。出現順・重複除去・最大 5 件
pub fn extract_dates(text: &str) -> Vec<String> {
    collect_unique(DATE_RE.find_iter(text).map(|m| m.as_str()), MAX_DATES)
}

/// 先頭 500 文字
pub fn summarize(text: &str) -> String {
    crate::normalize::truncate_chars(text, SUMMARY_CHARS)
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_with_symbols_and_codes() {
        let text = "Invoice #1023, Amount Due: $450.00, Payment due within 30 days. Tax AED 1,250, total $450.00";
        assert_eq!(extract_amounts(text), vec!["$450.00", "AED 1,250"]);
    }

    #[test]
    fn plain_numbers_are_not_amounts() {
        assert!(extract_amounts("Invoice #1023 for 30 days").is_empty());
    }

    #[test]
    fn dates_in_common_forms() {
        let text = "Issued 2024-03-01, due 15/03/2024. Meeting on March 5, 2024 and 7 Apr 2024.";
        assert_eq!(
            extract_dates(text),
            vec!["2024-03-01", "15/03/2024", "March 5, 2024", "7 Apr 2024"]
        );
    }

    #[test]
    fn dates_are_capped() {
        let text = (1..=8).map(|d| format!("0{d}/01/2024")).collect::<Vec<_>>().join(" ");
        assert_eq!(extract_dates(&text).len(), MAX_DATES);
    }

    #[test]
    fn counts_and_summary() {
        assert_eq!(word_count("one two  three\nfour"), 4);
        assert_eq!(char_count("résumé"), 6);
        let long = "a".repeat(600);
        assert_eq!(summarize(&long).len(), SUMMARY_CHARS);
        assert_eq!(summarize(""), "");
    }
}
