use lazy_static::lazy_static;
use regex::Regex;

use crate::normalize::truncate_chars;

pub const MAX_CERTIFICATIONS: usize = 10;

const MAX_LINE_CERT_CHARS: usize = 80;

lazy_static! {
    // "Autodesk Certified Professional Revit, 2021"
    static ref PROVIDER_RE: Regex = Regex::new(
        r"(?i)\b(Autodesk|Microsoft|AWS|Azure|Google Cloud|Cisco|Oracle|PMP|CompTIA|Red Hat|Salesforce)[ \t]+([A-Za-z &-]+?)(?:,[ \t]*|[ \t]+|[ \t]*\()((?:19|20)\d{2})\b"
    )
    .unwrap();
    // "LEED Green Associate Certified, 2020"（行頭か区切り記号の直後から）
    static ref GENERIC_RE: Regex = Regex::new(
        r"(?m)(?:^|[,;|:][ \t]*)[ \t]*([A-Z][A-Za-z0-9&+ -]{1,60}?)[ \t]+(?i:certified|certification)[ \t]*(?:,[ \t]*|[ \t]+|\()((?:19|20)\d{2})\b"
    )
    .unwrap();
    static ref CERT_HINT_RE: Regex = Regex::new(
        r"(?i)\b(?:certif\w*|licen[cs]e\w*|autodesk|microsoft|aws|azure|google cloud|cisco|oracle|pmp|comptia|red hat|salesforce)\b"
    )
    .unwrap();
    static ref YEAR_RE: Regex = Regex::new(r"\b(?:19|20)\d{2}\b").unwrap();
    static ref EMPTY_PARENS_RE: Regex = Regex::new(r"\(\s*\)").unwrap();
}

/// 資格を抽出
///
/// `"<名称> (<年>)"` 形式（年がなければ `"<名称>"`）。重複除去、最大 10 件。
/// `from_section` が真（資格セクションの本文を渡した場合）は、パターンに
/// 当たらなかった行のうち資格らしい行もそのまま拾う。
pub fn extract_certifications(text: &str, from_section: bool) -> Vec<String> {
    let mut certs: Vec<String> = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();

    for caps in PROVIDER_RE.captures_iter(text) {
        let (Some(whole), Some(provider), Some(details), Some(year)) =
            (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };
        let details = details.as_str().trim().trim_end_matches(['-', '&', ' ']);
        spans.push((whole.start(), whole.end()));
        push(
            &mut certs,
            format!("{} {} ({})", provider.as_str(), details, year.as_str()),
        );
    }

    for caps in GENERIC_RE.captures_iter(text) {
        let (Some(name), Some(year)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let (start, end) = (name.start(), year.end());
        if overlaps(&spans, start, end) {
            continue;
        }
        spans.push((start, end));
        push(&mut certs, format!("{} ({})", name.as_str().trim(), year.as_str()));
    }

    if from_section {
        let mut offset = 0usize;
        for line in text.split('\n') {
            let (start, end) = (offset, offset + line.len());
            offset = end + 1;
            if overlaps(&spans, start, end) {
                continue;
            }
            if let Some(cert) = certification_from_line(line) {
                push(&mut certs, cert);
            }
        }
    }

    certs
}

fn push(certs: &mut Vec<String>, cert: String) {
    if !cert.is_empty() && !certs.contains(&cert) && certs.len() < MAX_CERTIFICATIONS {
        certs.push(cert);
    }
}

fn overlaps(spans: &[(usize, usize)], start: usize, end: usize) -> bool {
    spans.iter().any(|&(s, e)| start < e && s < end)
}

/// 資格セクション内の 1 行を "名称 (年)" / "名称" に整形
fn certification_from_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || !CERT_HINT_RE.is_match(line) {
        return None;
    }

    let year = YEAR_RE.find(line).map(|m| m.as_str().to_string());
    let without_year = YEAR_RE.replace(line, "");
    let without_year = EMPTY_PARENS_RE.replace_all(&without_year, "");
    let name = without_year
        .trim_matches(|c: char| c.is_whitespace() || ",;:–—-".contains(c))
        .to_string();
    if name.is_empty() || name.chars().count() > MAX_LINE_CERT_CHARS {
        return None;
    }

    let name = truncate_chars(&name, MAX_LINE_CERT_CHARS);
    Some(match year {
        Some(year) => format!("{name} ({year})"),
        None => name,
    })
}
