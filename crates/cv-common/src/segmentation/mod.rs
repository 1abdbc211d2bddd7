use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use tracing::debug;

/// 履歴書のセクション名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SectionName {
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
    Achievements,
}

/// 見出しの候補。長い表記を先に置く（"work experience" を "experience" より優先）
const SECTION_HEADERS: &[(SectionName, &[&str])] = &[
    (
        SectionName::Summary,
        &[
            "professional summary",
            "executive summary",
            "career summary",
            "summary",
            "professional profile",
            "profile",
            "career objective",
            "objective",
            "about me",
        ],
    ),
    (
        SectionName::Experience,
        &[
            "work experience",
            "professional experience",
            "employment history",
            "work history",
            "career history",
            "experience",
        ],
    ),
    (
        SectionName::Education,
        &[
            "educational qualifications",
            "academic qualifications",
            "academic background",
            "education",
            "qualifications",
        ],
    ),
    (
        SectionName::Skills,
        &[
            "technical skills",
            "key skills",
            "software skills",
            "core competencies",
            "competencies",
            "skills",
        ],
    ),
    (
        SectionName::Projects,
        &["key projects", "personal projects", "academic projects", "projects"],
    ),
    (
        SectionName::Certifications,
        &[
            "licenses & certifications",
            "certifications & licenses",
            "professional certifications",
            "certifications",
            "certificates",
        ],
    ),
    (
        SectionName::Achievements,
        &["awards & achievements", "achievements", "awards", "accomplishments", "honors"],
    ),
];

fn header_regex(alternatives: &[&str]) -> Regex {
    let alts = alternatives
        .iter()
        .map(|a| regex::escape(a))
        .collect::<Vec<_>>()
        .join("|");
    // 行頭に単独で置かれた見出しのみ（後ろはコロンか行末）
    Regex::new(&format!(r"(?im)^[ \t]*(?:{alts})[ \t]*(?::|$)")).unwrap()
}

lazy_static! {
    static ref HEADER_RES: Vec<(SectionName, Regex)> = SECTION_HEADERS
        .iter()
        .map(|(name, alts)| (*name, header_regex(alts)))
        .collect();
}

/// 見出しの直後から次の見出しの直前までの範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan<'a> {
    pub name: SectionName,
    /// 本文側の開始バイト位置（見出しの直後）
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

/// セクション名 → 範囲。見出しの出現順に並ぶ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap<'a> {
    spans: Vec<SectionSpan<'a>>,
}

impl<'a> SectionMap<'a> {
    pub fn get(&self, name: SectionName) -> Option<&SectionSpan<'a>> {
        self.spans.iter().find(|span| span.name == name)
    }

    /// セクション本文。見出しがない、または本文が空なら `fallback` を返す
    pub fn section_or(&self, name: SectionName, fallback: &'a str) -> &'a str {
        match self.get(name) {
            Some(span) if !span.text.trim().is_empty() => span.text,
            _ => fallback,
        }
    }

    pub fn names(&self) -> Vec<SectionName> {
        self.spans.iter().map(|span| span.name).collect()
    }

    pub fn spans(&self) -> &[SectionSpan<'a>] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }
}

/// 正規化済みテキストをセクションに分割
///
/// 各見出しパターンは最初の 1 回だけ採用する（同名の見出しが 2 度出ても 2 つ目は本文扱い）。
pub fn segment(text: &str) -> SectionMap<'_> {
    // (name, header_start, body_start)
    let mut headers: Vec<(SectionName, usize, usize)> = HEADER_RES
        .iter()
        .filter_map(|(name, re)| re.find(text).map(|m| (*name, m.start(), m.end())))
        .collect();
    headers.sort_by_key(|(_, start, _)| *start);

    let mut spans = Vec::with_capacity(headers.len());
    for (idx, (name, _, body_start)) in headers.iter().enumerate() {
        let end = headers
            .get(idx + 1)
            .map(|(_, next_start, _)| *next_start)
            .unwrap_or(text.len());
        // 別パターンが同じ行で重なった場合は後ろ側を空にする
        let end = end.max(*body_start);
        spans.push(SectionSpan {
            name: *name,
            start: *body_start,
            end,
            text: &text[*body_start..end],
        });
    }

    debug!(sections = spans.len(), "segmented document");
    SectionMap { spans }
}
