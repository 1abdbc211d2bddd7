//! 本文全体から拾う補助的なシグナル（経験年数・地域・転居可否・生年月日・所在地・自己紹介）

use lazy_static::lazy_static;
use regex::Regex;

use crate::date::MONTH_PATTERN;
use crate::segmentation::{SectionMap, SectionName};

const MAX_LOCATION_CHARS: usize = 50;
const MAX_SUMMARY_LINES: usize = 9;
const SUMMARY_SCAN_LINES: usize = 30;
const SUMMARY_HEADER_MAX_CHARS: usize = 30;

const GCC_KEYWORDS: &[&str] = &[
    "gcc",
    "uae",
    "dubai",
    "abu dhabi",
    "saudi",
    "riyadh",
    "qatar",
    "bahrain",
    "kuwait",
    "oman",
];

const RELOCATION_PHRASES: &[&str] = &[
    "open to relocation",
    "willing to relocate",
    "ready to relocate",
    "can relocate",
];

const SUMMARY_HEADER_WORDS: &[&str] = &[
    "summary",
    "profile",
    "professional summary",
    "objective",
    "about me",
    "executive summary",
];

const SECTION_STOP_WORDS: &[&str] = &[
    "experience",
    "education",
    "skills",
    "projects",
    "certifications",
    "languages",
];

lazy_static! {
    static ref YEARS_EXPERIENCE_RE: Regex =
        Regex::new(r"(?i)(\d+)\+?\s*years?\s*(?:of\s+)?experience").unwrap();
    // "oman" が "woman" に当たらないよう単語境界で見る
    static ref GCC_RE: Regex = Regex::new(&format!(
        r"(?i)\b(?:{})\b",
        GCC_KEYWORDS.join("|")
    ))
    .unwrap();
    static ref DOB_RE: Regex = Regex::new(&format!(
        r"(?i)\b(?:DOB|Date\s+of\s+Birth|Born(?:\s+on)?)[:\s–—-]*(\d{{1,2}}[/.-]\d{{1,2}}[/.-]\d{{4}}|\d{{1,2}}\s+{m}\.?,?\s+\d{{4}}|{m}\.?\s+\d{{1,2}},?\s+\d{{4}})",
        m = MONTH_PATTERN
    ))
    .unwrap();
    static ref LOCATION_RE: Regex = Regex::new(
        r"(?im)\b(?:currently\s+based\s+in|based\s+in|current\s+location|location|lives\s+in|address)\b[: \t]*([A-Za-z][^\n|]*)"
    )
    .unwrap();
    static ref LOCATION_CUT_RE: Regex =
        Regex::new(r"(?i)\s*(?:[–—]|\s-\s|-\s|\b(?:email|e-mail|phone|mobile|tel)\b).*$").unwrap();
}

/// "5+ years of experience" の数字部分。なければ空文字
pub fn extract_years_experience(text: &str) -> String {
    YEARS_EXPERIENCE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

pub fn has_gcc_experience(text: &str) -> bool {
    GCC_RE.is_match(text)
}

pub fn is_willing_to_relocate(text: &str) -> bool {
    let lower = text.to_lowercase();
    RELOCATION_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// 生年月日（表記はそのまま）
pub fn extract_dob(text: &str) -> String {
    DOB_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// 現住所・拠点。区切り記号や "Email" などの手前で切り、50 文字以上なら捨てる
pub fn extract_location(text: &str) -> String {
    for caps in LOCATION_RE.captures_iter(text) {
        let Some(raw) = caps.get(1) else {
            continue;
        };
        let cut = LOCATION_CUT_RE.replace(raw.as_str(), "");
        let location = cut.trim().trim_end_matches([',', ';', '.']).trim();
        if location.is_empty() || location.contains('@') {
            continue;
        }
        if location.chars().count() < MAX_LOCATION_CHARS {
            return location.to_string();
        }
    }
    String::new()
}

/// 自己紹介の段落
///
/// summary セクションがあればその本文（空行を除く最大 9 行）を 1 行に連結する。
/// なければ冒頭 30 行から "Profile" などの短い見出し行を探し、次の見出しまでを拾う。
pub fn extract_summary(text: &str, sections: &SectionMap<'_>) -> String {
    if let Some(span) = sections.get(SectionName::Summary) {
        let joined = join_lines(span.text.lines());
        if !joined.is_empty() {
            return joined;
        }
    }

    let mut lines = text.lines().take(SUMMARY_SCAN_LINES);
    let header_found = lines.by_ref().any(|line| {
        let lower = line.trim().to_lowercase();
        lower.chars().count() < SUMMARY_HEADER_MAX_CHARS
            && SUMMARY_HEADER_WORDS.iter().any(|word| lower.contains(word))
    });
    if !header_found {
        return String::new();
    }

    let body = lines.take_while(|line| {
        let lower = line.to_lowercase();
        !SECTION_STOP_WORDS.iter().any(|word| lower.contains(word))
    });
    join_lines(body)
}

fn join_lines<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_SUMMARY_LINES)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::segment;

    #[test]
    fn years_of_experience_number() {
        assert_eq!(extract_years_experience("Over 7+ years of experience in BIM"), "7");
        assert_eq!(extract_years_experience("3 year experience"), "3");
        assert_eq!(extract_years_experience("experienced engineer"), "");
    }

    #[test]
    fn gcc_keywords_match_whole_words() {
        assert!(has_gcc_experience("Worked in Abu Dhabi for 2 years"));
        assert!(has_gcc_experience("Projects across the UAE"));
        assert!(!has_gcc_experience("Mentored a woman-led startup"));
    }

    #[test]
    fn relocation_phrases() {
        assert!(is_willing_to_relocate("Open to relocation within Europe"));
        assert!(!is_willing_to_relocate("Relocated in 2019"));
    }

    #[test]
    fn date_of_birth_forms() {
        assert_eq!(extract_dob("DOB: 12/05/1990"), "12/05/1990");
        assert_eq!(extract_dob("Date of Birth - 3 March 1988"), "3 March 1988");
        assert_eq!(extract_dob("Born on Jan 5, 1992"), "Jan 5, 1992");
        assert_eq!(extract_dob("no birthday here"), "");
    }

    #[test]
    fn location_is_cut_at_separators() {
        assert_eq!(extract_location("Location: Dubai, UAE | +971 50 000 0000"), "Dubai, UAE");
        assert_eq!(extract_location("Currently based in Pune - open to travel"), "Pune");
        assert_eq!(
            extract_location("Current Location: Doha, Qatar Email: a@b.com"),
            "Doha, Qatar"
        );
        let long = format!("Location: {}", "Very Long Place Name ".repeat(4));
        assert_eq!(extract_location(&long), "");
    }

    #[test]
    fn summary_from_section() {
        let text = "Jane Doe\nSUMMARY\nCivil engineer with 8 years\nin high-rise projects.\n\nEXPERIENCE\nSite Engineer";
        let sections = segment(text);
        assert_eq!(
            extract_summary(text, &sections),
            "Civil engineer with 8 years in high-rise projects."
        );
    }

    #[test]
    fn summary_from_inline_header() {
        let text = "Jane Doe\nMy Profile\nDetail oriented designer.\nLoves Revit.\nKey Skills include Revit";
        let sections = segment(text);
        assert_eq!(
            extract_summary(text, &sections),
            "Detail oriented designer. Loves Revit."
        );
        assert_eq!(extract_summary("Jane Doe", &segment("Jane Doe")), "");
    }
}
