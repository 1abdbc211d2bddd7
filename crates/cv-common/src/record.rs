//! Structured values handed back to the caller.
//!
//! Every record is produced by a single extraction call and owned by the caller;
//! nothing here carries identity or lifecycle beyond that call.

use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::classification::DocumentCategory;
use crate::segmentation::SectionName;

/// 呼び出し元が知っている入力の出どころ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentHint {
    Email,
    #[default]
    File,
}

/// 抽出前の入力（メール本文 + 署名 or 添付ファイルのテキスト）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub text: String,
    pub signature: Option<String>,
    pub hint: DocumentHint,
}

impl RawDocument {
    pub fn from_file_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            signature: None,
            hint: DocumentHint::File,
        }
    }

    pub fn from_email(body: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            text: body.into(),
            signature: Some(signature.into()),
            hint: DocumentHint::Email,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub portfolio: Option<String>,
}

/// メール本文・署名から拾った連絡先（添付なしメール用）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContact {
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub linkedin: Option<String>,
    pub other_links: Vec<String>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DegreeLevel {
    Bachelor,
    Master,
    Doctorate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    pub level: DegreeLevel,
    pub major: String,
    pub institution: String,
    pub year: Option<String>,
    pub cgpa: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkExperienceEntry {
    pub job_title: String,
    pub company: String,
    pub location: Option<String>,
    pub start_date: String,
    pub end_date: String,
    /// "Less than 1 month" / "N months" / "N years M months"。日付が読めなければ空文字
    pub duration: String,
    pub period: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Proficiency {
    Expert,
    Advanced,
    Proficient,
    Intermediate,
    Beginner,
    Basic,
}

impl Proficiency {
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "expert" => Some(Proficiency::Expert),
            "advanced" => Some(Proficiency::Advanced),
            "proficient" => Some(Proficiency::Proficient),
            "intermediate" => Some(Proficiency::Intermediate),
            "beginner" => Some(Proficiency::Beginner),
            "basic" => Some(Proficiency::Basic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub years: Option<u32>,
    pub proficiency: Option<Proficiency>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub dob: String,
    pub location: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionalSummary {
    /// 本文中の "N years experience" 表記そのまま（なければ空文字）
    pub years_experience: String,
    /// 職歴の期間を合算したもの
    pub total_experience: String,
    pub gcc_experience: bool,
    pub willing_to_relocate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub category: DocumentCategory,
    pub hint: DocumentHint,
    pub personal_info: PersonalInfo,
    pub contact_details: ContactInfo,
    pub professional_summary: ProfessionalSummary,
    pub education: Vec<EducationEntry>,
    pub skills: Vec<Skill>,
    pub work_history: Vec<WorkExperienceEntry>,
    pub certifications: Vec<String>,
    pub sections: Vec<SectionName>,
}

/// 履歴書以外の書類（請求書・見積書など）の要約
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericDocumentRecord {
    pub category: DocumentCategory,
    pub label: String,
    pub hint: DocumentHint,
    pub summary: String,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub dates_found: Vec<String>,
    pub amounts_found: Vec<String>,
    pub word_count: usize,
    pub char_count: usize,
}

/// OCR エンジンが返す 1 行ぶんの結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    pub confidence: f32,
}

impl OcrLine {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub lines: Vec<OcrLine>,
    pub text: String,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub average_confidence: f32,
    pub dropped_lines: usize,
}

/// `extract` の戻り値。JSON では `kind` タグで判別する
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionResult {
    Candidate(CandidateRecord),
    Document(GenericDocumentRecord),
    Image(ImageRecord),
}

impl ExtractionResult {
    /// 画像は分類を通さないので `None`
    pub fn category(&self) -> Option<DocumentCategory> {
        match self {
            ExtractionResult::Candidate(record) => Some(record.category),
            ExtractionResult::Document(record) => Some(record.category),
            ExtractionResult::Image(_) => None,
        }
    }

    pub fn as_candidate(&self) -> Option<&CandidateRecord> {
        match self {
            ExtractionResult::Candidate(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&GenericDocumentRecord> {
        match self {
            ExtractionResult::Document(record) => Some(record),
            _ => None,
        }
    }
}
