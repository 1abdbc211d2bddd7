use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::normalize::{truncate_chars, window_after};
use crate::record::{DegreeLevel, EducationEntry};

pub const MAX_EDUCATION_ENTRIES: usize = 5;

const SEARCH_WINDOW_CHARS: usize = 300;
const MAX_MAJOR_CHARS: usize = 60;
const MIN_INSTITUTION_CHARS: usize = 10;

/// 学位の後ろに続く専攻（"in Computer Science" / ", Civil Engineering"）。改行はまたがない
const MAJOR_SUFFIX: &str = r"(?:(?:[ \t,]+in)?[ \t,]+([A-Za-z][\w&]*(?:[ \t]+[A-Za-z&][\w&]*){0,3}))?";

const FIELDS: &str = r"(?:Engineering|Technology|Science|Arts|Commerce|Architecture|Business\s+Administration|Computer\s+Applications)";

fn degree_regex(alternatives: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b((?:{alternatives})\b\.?){MAJOR_SUFFIX}")).unwrap()
}

lazy_static! {
    static ref DEGREE_RES: Vec<(DegreeLevel, Regex)> = vec![
        (
            DegreeLevel::Bachelor,
            degree_regex(&format!(
                r"Bachelor(?:'s)?\s+(?:of|in)\s+{FIELDS}|B\.\s?Tech|BTech|B\.\s?E|B\.\s?Sc|BSc|B\.\s?A|BBA|BCA|B\.\s?Com|B\.\s?Arch"
            )),
        ),
        (
            DegreeLevel::Master,
            degree_regex(&format!(
                r"Master(?:'s)?\s+(?:of|in)\s+{FIELDS}|M\.\s?Tech|MTech|M\.\s?E|M\.\s?Sc|MSc|M\.\s?A|MBA|MCA|M\.\s?Com|M\.\s?Arch"
            )),
        ),
        (
            DegreeLevel::Doctorate,
            degree_regex(r"Ph\.?\s?D|Doctor\s+of\s+Philosophy|Doctorate"),
        ),
    ];

    static ref INSTITUTION_RE: Regex = Regex::new(
        r"\b((?:[A-Z][A-Za-z&.'\- ]{0,98}?)?\b(?:University|College|Institute|Technology|School|Academy)\b(?:[ \t]+(?:of|for)[ \t]+[A-Z][A-Za-z&.'\- ]*)?)"
    )
    .unwrap();
    static ref DASH_CLAUSE_RE: Regex = Regex::new(r"\s*[–—-].*$").unwrap();
    static ref YEAR_RE: Regex = Regex::new(r"\b(?:19|20)\d{2}\b").unwrap();
    static ref CGPA_RE: Regex =
        Regex::new(r"(?i)\b(?:CGPA|GPA)[:\s]+(\d+\.\d+(?:/\d+(?:\.\d+)?)?)").unwrap();
    static ref WORD_RE: Regex = Regex::new(r"\S+").unwrap();
    static ref INSTITUTION_WORD_RE: Regex =
        Regex::new(r"(?i)\b(?:University|College|Institute|School|Academy)\b").unwrap();
}

const MAJOR_STOP_WORDS: &[&str] = &["from", "at", "with", "under"];

/// 学位の出現 1 件
struct DegreeHit {
    level: DegreeLevel,
    start: usize,
    end: usize,
    degree: String,
    major: String,
}

/// 学歴を抽出（学歴セクション、なければ本文全体を渡す）
///
/// 学位ごとに直後 300 文字（次の学位が先に来ればそこまで）から
/// 学校名・卒業年・CGPA を拾う。(学位, 専攻) で重複除去し、出現順に最大 5 件。
pub fn extract_education(text: &str) -> Vec<EducationEntry> {
    let mut hits: Vec<DegreeHit> = DEGREE_RES
        .iter()
        .flat_map(|(level, re)| {
            re.captures_iter(text).filter_map(move |caps| {
                let whole = caps.get(0)?;
                let degree = caps.get(1)?;
                let cleaned = caps
                    .get(2)
                    .and_then(|m| clean_major(m.as_str()).map(|(major, len)| (major, m.start() + len)));
                let (major, end) = match cleaned {
                    Some(found) => found,
                    // 専攻として拾った部分が学校名だった場合は学位の直後から探し直す
                    None => (String::new(), degree.end()),
                };
                Some(DegreeHit {
                    level: *level,
                    start: whole.start(),
                    end,
                    degree: degree.as_str().trim().to_string(),
                    major,
                })
            })
        })
        .collect();
    hits.sort_by_key(|hit| hit.start);

    let mut entries: Vec<EducationEntry> = Vec::new();
    let mut last_end = 0usize;
    for (idx, hit) in hits.iter().enumerate() {
        if hit.start < last_end {
            continue;
        }
        last_end = hit.end;

        let next_start = hits[idx + 1..]
            .iter()
            .map(|h| h.start)
            .find(|&s| s >= hit.end)
            .unwrap_or(text.len());
        let window = window_after(&text[..next_start], hit.end, SEARCH_WINDOW_CHARS);

        let duplicate = entries.iter().any(|e| {
            e.degree.eq_ignore_ascii_case(&hit.degree) && e.major.eq_ignore_ascii_case(&hit.major)
        });
        if duplicate {
            continue;
        }

        let entry = EducationEntry {
            degree: hit.degree.clone(),
            level: hit.level,
            major: hit.major.clone(),
            institution: find_institution(window).unwrap_or_default(),
            year: YEAR_RE.find(window).map(|m| m.as_str().to_string()),
            cgpa: CGPA_RE
                .captures(window)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
        };
        debug!(degree = %entry.degree, institution = %entry.institution, "education entry");
        entries.push(entry);

        if entries.len() == MAX_EDUCATION_ENTRIES {
            break;
        }
    }
    entries
}

/// 専攻の後処理。from / at などの前置詞以降と末尾の記号を落とし、60 文字に丸める。
/// 戻り値の 2 つ目は `raw` のうち専攻として採用したバイト長。
/// 学校名そのものだった場合は `None`
fn clean_major(raw: &str) -> Option<(String, usize)> {
    let cut = WORD_RE
        .find_iter(raw)
        .find(|word| {
            MAJOR_STOP_WORDS
                .iter()
                .any(|stop| word.as_str().eq_ignore_ascii_case(stop))
        })
        .map(|word| word.start())
        .unwrap_or(raw.len());
    let major = raw[..cut].trim_end_matches(|c: char| !c.is_alphanumeric());

    if major.is_empty() || INSTITUTION_WORD_RE.is_match(major) {
        return None;
    }
    Some((truncate_chars(major, MAX_MAJOR_CHARS), major.len()))
}

fn find_institution(window: &str) -> Option<String> {
    let raw = INSTITUTION_RE.captures(window)?.get(1)?.as_str();
    let cleaned = DASH_CLAUSE_RE.replace(raw, "");
    let cleaned = cleaned.trim();
    (cleaned.chars().count() >= MIN_INSTITUTION_CHARS).then(|| cleaned.to_string())
}
