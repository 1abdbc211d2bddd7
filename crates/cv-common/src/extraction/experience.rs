use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::debug;

use crate::date::{calculate_duration, MONTH_PATTERN};
use crate::normalize::truncate_chars;
use crate::record::WorkExperienceEntry;

pub const MAX_WORK_ENTRIES: usize = 10;

const MAX_COMPANY_CHARS: usize = 100;
const MAX_TITLE_CHARS: usize = 80;

const JOB_TITLE_WORDS: &[&str] = &[
    "engineer",
    "developer",
    "manager",
    "analyst",
    "architect",
    "designer",
    "consultant",
    "coordinator",
    "specialist",
    "modeler",
    "modeller",
    "lead",
    "director",
    "intern",
    "administrator",
    "technician",
    "officer",
    "executive",
    "scientist",
    "programmer",
    "tester",
    "trainee",
    "supervisor",
    "head",
    "accountant",
    "draftsman",
    "assistant",
];

lazy_static! {
    static ref JOB_TITLE_RE: Regex =
        Regex::new(&format!(r"(?i)\b(?:{})s?\b", JOB_TITLE_WORDS.join("|"))).unwrap();

    // 肩書 [改行 | "|" | "@" | "," | " – " | " at "] 会社 [– 勤務地] 改行 期間
    static ref SINGLE_LINE_RE: Regex = Regex::new(&format!(
        r"(?m)^[ \t]*(?P<title>[^\n|@,]{{2,80}}?)[ \t]*(?:\n[ \t]*|[ \t]*[|@,][ \t]*|[ \t]+[–—-][ \t]+|[ \t]+at[ \t]+)(?P<company>[A-Z][^\n|]{{0,99}}?)(?:(?:[ \t]*\|[ \t]*|[ \t]+-[ \t]+|[ \t]*[–—][ \t]*)(?P<location>[A-Za-z][A-Za-z .,]{{0,59}}?))?[ \t]*\n[ \t]*(?P<start>(?i:{m})\.?[ \t]*,?[ \t]*\d{{4}})[ \t]*(?:[–—-]|(?i:to))[ \t]*(?P<end>(?i:{m})\.?[ \t]*,?[ \t]*\d{{4}}|(?i:present|current))\b",
        m = MONTH_PATTERN
    ))
    .unwrap();

    // 3 行形式の期間行: "Mar 2018 – Jun 2021" / "2016 - 2018" / "2019 to Present"
    // 年は 19xx / 20xx のみ（"9876-5432" のような電話番号の断片を拾わない）
    static ref DATE_RANGE_RE: Regex = Regex::new(&format!(
        r"(?i)(?P<start>\b{m}\.?\s*,?\s*(?:19|20)\d{{2}}|\b(?:19|20)\d{{2}})\s*(?:[–—-]|\bto\b)\s*(?P<end>{m}\.?\s*,?\s*(?:19|20)\d{{2}}|(?:19|20)\d{{2}}|present|current|till\s+date|ongoing)\b",
        m = MONTH_PATTERN
    ))
    .unwrap();

    static ref LOCATION_SPLIT_RE: Regex = Regex::new(r"[ \t]*\|[ \t]*|[ \t]+-[ \t]+|[ \t]*[–—][ \t]*").unwrap();
    static ref TRAILING_JUNK_RE: Regex = Regex::new(r"[\s,;|–—-]+$").unwrap();
}

/// 出現位置つきの職歴候補
struct Found {
    offset: usize,
    entry: WorkExperienceEntry,
}

/// 職歴を抽出（職歴セクション、なければ本文全体を渡す）
///
/// 1. 1 行形式: 肩書・区切り（または改行）・会社・任意の勤務地・改行・期間
/// 2. 3 行形式: 肩書の行・会社の行・期間の行
///
/// 肩書には職種語（engineer / manager など）が含まれていること。
/// 出現順に並べ、同じ肩書（大文字小文字無視）の 2 件目以降は捨てる。最大 10 件。
pub fn extract_work_experience(text: &str, today: NaiveDate) -> Vec<WorkExperienceEntry> {
    let mut found = single_line_entries(text, today);
    found.extend(three_line_entries(text, today));
    found.sort_by_key(|f| f.offset);

    let mut entries: Vec<WorkExperienceEntry> = Vec::new();
    for Found { entry, .. } in found {
        if entries
            .iter()
            .any(|e| e.job_title.eq_ignore_ascii_case(&entry.job_title))
        {
            continue;
        }
        debug!(title = %entry.job_title, company = %entry.company, "work entry");
        entries.push(entry);
        if entries.len() == MAX_WORK_ENTRIES {
            break;
        }
    }
    entries
}

fn single_line_entries(text: &str, today: NaiveDate) -> Vec<Found> {
    SINGLE_LINE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let offset = caps.name("title")?.start();
            let (title, company) = title_and_company(
                caps.name("title")?.as_str(),
                caps.name("company")?.as_str(),
            )?;
            let location = named(&caps, "location");
            let entry = build_entry(
                title,
                company,
                location,
                caps.name("start")?.as_str(),
                caps.name("end")?.as_str(),
                today,
            );
            Some(Found { offset, entry })
        })
        .collect()
}

/// 肩書に職種語がなく会社側にある場合（会社 → 肩書の順に書く履歴書）は入れ替える
fn title_and_company<'a>(title: &'a str, company: &'a str) -> Option<(&'a str, &'a str)> {
    if JOB_TITLE_RE.is_match(title) {
        Some((title, company))
    } else if JOB_TITLE_RE.is_match(company) && company.chars().count() <= MAX_TITLE_CHARS {
        Some((company, title))
    } else {
        None
    }
}

fn named(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn three_line_entries(text: &str, today: NaiveDate) -> Vec<Found> {
    // (offset, trimmed line)。空行は除く
    let mut lines: Vec<(usize, &str)> = Vec::new();
    let mut offset = 0usize;
    for raw in text.split('\n') {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let lead = raw.len() - raw.trim_start().len();
            lines.push((offset + lead, trimmed));
        }
        offset += raw.len() + 1;
    }

    let mut found = Vec::new();
    let mut idx = 0usize;
    while idx + 2 < lines.len() {
        let (title_offset, title) = lines[idx];
        let (_, company_line) = lines[idx + 1];
        let (_, date_line) = lines[idx + 2];

        let title_ok = title.chars().count() <= MAX_TITLE_CHARS
            && JOB_TITLE_RE.is_match(title)
            && !DATE_RANGE_RE.is_match(title);
        let company_ok = company_line
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase())
            && !DATE_RANGE_RE.is_match(company_line);

        let range = if title_ok && company_ok {
            DATE_RANGE_RE.captures(date_line)
        } else {
            None
        };

        match range {
            Some(caps) => {
                let (company, location) = split_location(company_line);
                let start = caps.name("start").map_or("", |m| m.as_str());
                let end = caps.name("end").map_or("", |m| m.as_str());
                let entry = build_entry(title, company, location, start, end, today);
                found.push(Found {
                    offset: title_offset,
                    entry,
                });
                idx += 3;
            }
            None => idx += 1,
        }
    }
    found
}

/// "BuildCo – Dubai" → ("BuildCo", Some("Dubai"))
fn split_location(line: &str) -> (&str, Option<String>) {
    match LOCATION_SPLIT_RE.find(line) {
        Some(sep) if sep.start() > 0 => {
            let location = line[sep.end()..].trim();
            let location = (!location.is_empty()).then(|| location.to_string());
            (&line[..sep.start()], location)
        }
        _ => (line, None),
    }
}

fn build_entry(
    title: &str,
    company: &str,
    location: Option<String>,
    start: &str,
    end: &str,
    today: NaiveDate,
) -> WorkExperienceEntry {
    let title = TRAILING_JUNK_RE.replace(title.trim(), "").to_string();
    let company = TRAILING_JUNK_RE.replace(company.trim(), "");
    let start = start.trim().to_string();
    let end = end.trim().to_string();

    WorkExperienceEntry {
        job_title: title,
        company: truncate_chars(&company, MAX_COMPANY_CHARS),
        location,
        duration: calculate_duration(&start, &end, today),
        period: format!("{start} – {end}"),
        start_date: start,
        end_date: end,
    }
}
