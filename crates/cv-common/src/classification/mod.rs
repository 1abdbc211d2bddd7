use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use tracing::debug;

/// 書類カテゴリ（1 書類につき 1 つ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentCategory {
    Resume,
    Invoice,
    Quotation,
    Proposal,
    Contract,
    Report,
    MeetingNotes,
    GeneralDocument,
    Unknown,
}

impl DocumentCategory {
    /// 画面表示用のラベル
    pub fn label(&self) -> &'static str {
        match self {
            DocumentCategory::Resume => "Resume",
            DocumentCategory::Invoice => "Invoice",
            DocumentCategory::Quotation => "Quotation",
            DocumentCategory::Proposal => "Proposal",
            DocumentCategory::Contract => "Contract",
            DocumentCategory::Report => "Report",
            DocumentCategory::MeetingNotes => "Meeting Notes",
            DocumentCategory::GeneralDocument => "General Document",
            DocumentCategory::Unknown => "Unknown",
        }
    }

    pub fn is_resume(&self) -> bool {
        matches!(self, DocumentCategory::Resume)
    }
}

/// 履歴書らしさの内訳（診断用）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationScore {
    pub resume_score: u32,
    pub non_resume_score: u32,
}

impl ClassificationScore {
    /// `resume_score > non_resume_score` かつ `resume_score >= 3`
    pub fn is_resume(&self) -> bool {
        self.resume_score > self.non_resume_score && self.resume_score >= MIN_RESUME_SCORE
    }
}

const MIN_RESUME_SCORE: u32 = 3;
const RESUME_KEYWORD_WEIGHT: u32 = 1;
// 業務文書にも "experience" は出てくるので、非履歴書側を重くする
const NON_RESUME_KEYWORD_WEIGHT: u32 = 2;
const EDUCATION_BONUS: u32 = 2;
const WORK_PHRASE_BONUS: u32 = 2;
const SKILL_BONUS: u32 = 1;

const RESUME_KEYWORDS: &[&str] = &[
    "resume",
    "résumé",
    "curriculum vitae",
    "cv",
    "experience",
    "education",
    "skills",
    "objective",
    "employment",
    "qualifications",
    "internship",
    "certifications",
    "work history",
    "career",
    "references",
    "achievements",
];

const NON_RESUME_KEYWORDS: &[&str] = &[
    "invoice",
    "quotation",
    "quote",
    "purchase order",
    "receipt",
    "contract",
    "agreement",
    "proposal",
    "report",
    "meeting minutes",
    "minutes of meeting",
    "agenda",
    "amount due",
    "payment terms",
    "bill to",
    "terms and conditions",
];

const EDUCATION_KEYWORDS: &[&str] = &[
    "university",
    "college",
    "bachelor",
    "master",
    "degree",
    "diploma",
    "institute",
    "b.tech",
    "m.tech",
    "phd",
    "cgpa",
    "gpa",
];

/// 判定順 = 優先順位。複数カテゴリに当たる文書は先に並んでいる方を採る
const CATEGORY_TRIGGERS: &[(DocumentCategory, &[&str])] = &[
    (
        DocumentCategory::Invoice,
        &["invoice", "amount due", "bill to", "tax invoice", "payment due"],
    ),
    (
        DocumentCategory::Quotation,
        &["quotation", "quote", "price quote", "estimate"],
    ),
    (
        DocumentCategory::Proposal,
        &["proposal", "proposed solution", "scope of work"],
    ),
    (
        DocumentCategory::Contract,
        &["contract", "agreement", "terms and conditions", "hereinafter"],
    ),
    (
        DocumentCategory::Report,
        &["report", "findings", "quarterly results", "annual report"],
    ),
    (
        DocumentCategory::MeetingNotes,
        &[
            "meeting minutes",
            "minutes of meeting",
            "agenda",
            "attendees",
            "action items",
        ],
    ),
];

fn keyword_regex(keyword: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword))).unwrap()
}

fn compile(keywords: &[&str]) -> Vec<Regex> {
    keywords.iter().map(|k| keyword_regex(k)).collect()
}

lazy_static! {
    static ref RESUME_RES: Vec<Regex> = compile(RESUME_KEYWORDS);
    static ref NON_RESUME_RES: Vec<Regex> = compile(NON_RESUME_KEYWORDS);
    static ref EDUCATION_RES: Vec<Regex> = compile(EDUCATION_KEYWORDS);
    static ref TRIGGER_RES: Vec<(DocumentCategory, Vec<Regex>)> = CATEGORY_TRIGGERS
        .iter()
        .map(|(category, keywords)| (*category, compile(keywords)))
        .collect();

    // 職歴らしい言い回し（"worked at" / "5 years of experience" / "2019 - Present" など）
    static ref WORK_PHRASE_RE: Regex = Regex::new(
        r"(?i)\b(?:worked\s+(?:at|as|for|with)|working\s+(?:at|as|for)|employed\s+(?:at|by|as)|\d{1,2}\+?\s*(?:years?|yrs?)\s+(?:of\s+)?experience|(?:19|20)\d{2}\s*(?:[–—-]|to)\s*(?:present|current))\b"
    )
    .unwrap();
    static ref SKILL_RE: Regex = Regex::new(r"(?i)skill").unwrap();
}

fn count_hits(patterns: &[Regex], text: &str) -> u32 {
    patterns.iter().filter(|re| re.is_match(text)).count() as u32
}

/// キーワード集合ごとのスコアを計算
pub fn score(text: &str) -> ClassificationScore {
    if text.trim().is_empty() {
        return ClassificationScore::default();
    }

    let mut resume_score = count_hits(&RESUME_RES, text) * RESUME_KEYWORD_WEIGHT;
    if EDUCATION_RES.iter().any(|re| re.is_match(text)) {
        resume_score += EDUCATION_BONUS;
    }
    if WORK_PHRASE_RE.is_match(text) {
        resume_score += WORK_PHRASE_BONUS;
    }
    if SKILL_RE.is_match(text) {
        resume_score += SKILL_BONUS;
    }

    let non_resume_score = count_hits(&NON_RESUME_RES, text) * NON_RESUME_KEYWORD_WEIGHT;

    ClassificationScore {
        resume_score,
        non_resume_score,
    }
}

/// 書類カテゴリを判定
///
/// - 空入力は `Unknown`
/// - 履歴書スコアが非履歴書スコアを上回り、かつ 3 以上なら `Resume`
/// - それ以外は invoice → quotation → proposal → contract → report → meeting_notes の順で最初に当たったもの
/// - どれにも当たらなければ `GeneralDocument`
pub fn classify(text: &str) -> DocumentCategory {
    classify_with_score(text).0
}

pub fn classify_with_score(text: &str) -> (DocumentCategory, ClassificationScore) {
    if text.trim().is_empty() {
        return (DocumentCategory::Unknown, ClassificationScore::default());
    }

    let scores = score(text);
    if scores.is_resume() {
        debug!(
            resume_score = scores.resume_score,
            non_resume_score = scores.non_resume_score,
            "classified as resume"
        );
        return (DocumentCategory::Resume, scores);
    }

    let category = TRIGGER_RES
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(text)))
        .map(|(category, _)| *category)
        .unwrap_or(DocumentCategory::GeneralDocument);

    debug!(
        category = category.as_ref(),
        resume_score = scores.resume_score,
        non_resume_score = scores.non_resume_score,
        "classified as non-resume"
    );
    (category, scores)
}
