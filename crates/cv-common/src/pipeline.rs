use chrono::NaiveDate;
use tracing::{debug, info};

use crate::classification::{classify_with_score, DocumentCategory};
use crate::date::{format_months, total_experience_months};
use crate::extraction::{
    certifications::extract_certifications, contact, education::extract_education,
    experience::extract_work_experience, generic, signals, skills::extract_skills,
};
use crate::normalize::normalize_text;
use crate::record::{
    CandidateRecord, DocumentHint, ExtractionResult, GenericDocumentRecord, ImageRecord, OcrLine,
    PersonalInfo, ProfessionalSummary, RawDocument,
};
use crate::segmentation::{segment, SectionName};

/// OCR 行の採用しきい値（この値以上を残す）
pub const DEFAULT_OCR_MIN_CONFIDENCE: f32 = 0.3;

/// 本文と署名を 1 つのテキストにまとめる
fn full_text(raw: &RawDocument) -> String {
    match raw.signature.as_deref() {
        Some(signature) if !signature.trim().is_empty() => format!("{}\n{}", raw.text, signature),
        _ => raw.text.clone(),
    }
}

/// 書類 1 件を分類して抽出
///
/// - `resume` → `CandidateRecord`
/// - それ以外（空入力の `unknown` を含む）→ `GenericDocumentRecord`
///
/// `raw.hint` は結果に記録するだけで分岐には使わない。画像は `extract_image` を使う。
pub fn extract(raw: &RawDocument, today: NaiveDate) -> ExtractionResult {
    let text = normalize_text(&full_text(raw));
    let (category, scores) = classify_with_score(&text);
    info!(
        category = category.as_ref(),
        hint = raw.hint.as_ref(),
        resume_score = scores.resume_score,
        non_resume_score = scores.non_resume_score,
        "document classified"
    );

    if category.is_resume() {
        ExtractionResult::Candidate(candidate_from_normalized(&text, raw.hint, today))
    } else {
        ExtractionResult::Document(generic_from_normalized(&text, category, raw.hint))
    }
}

/// 分類を通さず履歴書として抽出する（添付ファイルの履歴書向け）
pub fn extract_resume(raw: &RawDocument, today: NaiveDate) -> CandidateRecord {
    let text = normalize_text(&full_text(raw));
    candidate_from_normalized(&text, raw.hint, today)
}

/// 履歴書以外の書類として要約する
pub fn extract_generic(raw: &RawDocument, category: DocumentCategory) -> GenericDocumentRecord {
    let text = normalize_text(&full_text(raw));
    generic_from_normalized(&text, category, raw.hint)
}

fn candidate_from_normalized(text: &str, hint: DocumentHint, today: NaiveDate) -> CandidateRecord {
    let sections = segment(text);

    let contact_details = contact::extract_contact_info(text);
    let education = extract_education(sections.section_or(SectionName::Education, text));
    let work_history =
        extract_work_experience(sections.section_or(SectionName::Experience, text), today);
    let skills = extract_skills(sections.section_or(SectionName::Skills, text));
    let certifications = match sections.get(SectionName::Certifications) {
        Some(span) if !span.text.trim().is_empty() => extract_certifications(span.text, true),
        _ => extract_certifications(text, false),
    };

    let total_experience = total_experience_months(
        work_history
            .iter()
            .map(|w| (w.start_date.as_str(), w.end_date.as_str())),
        today,
    )
    .map(format_months)
    .unwrap_or_default();

    let personal_info = PersonalInfo {
        name: contact::extract_name(text),
        email: contact_details.emails.first().cloned().unwrap_or_default(),
        phone: contact_details.phones.first().cloned().unwrap_or_default(),
        dob: signals::extract_dob(text),
        location: signals::extract_location(text),
        summary: signals::extract_summary(text, &sections),
    };

    let professional_summary = ProfessionalSummary {
        years_experience: signals::extract_years_experience(text),
        total_experience,
        gcc_experience: signals::has_gcc_experience(text),
        willing_to_relocate: signals::is_willing_to_relocate(text),
    };

    debug!(
        name = %personal_info.name,
        education = education.len(),
        work = work_history.len(),
        skills = skills.len(),
        certifications = certifications.len(),
        "candidate record assembled"
    );

    CandidateRecord {
        category: DocumentCategory::Resume,
        hint,
        personal_info,
        contact_details,
        professional_summary,
        education,
        skills,
        work_history,
        certifications,
        sections: sections.names(),
    }
}

fn generic_from_normalized(
    text: &str,
    category: DocumentCategory,
    hint: DocumentHint,
) -> GenericDocumentRecord {
    GenericDocumentRecord {
        category,
        label: category.label().to_string(),
        hint,
        summary: generic::summarize(text),
        phones: contact::extract_phones(text),
        emails: contact::extract_emails(text),
        dates_found: generic::extract_dates(text),
        amounts_found: generic::extract_amounts(text),
        word_count: generic::word_count(text),
        char_count: generic::char_count(text),
    }
}

/// OCR 結果から画像レコードを組み立てる
///
/// 信頼度が `min_confidence` 以上の行だけを残し、残った行を改行で連結して連絡先を拾う。
/// 平均信頼度は残った行だけで計算する（1 行も残らなければ 0.0）。
pub fn extract_image(lines: &[OcrLine], min_confidence: f32) -> ImageRecord {
    let kept: Vec<OcrLine> = lines
        .iter()
        .filter(|line| line.confidence >= min_confidence)
        .cloned()
        .collect();
    let dropped_lines = lines.len() - kept.len();

    let average_confidence = if kept.is_empty() {
        0.0
    } else {
        kept.iter().map(|line| line.confidence).sum::<f32>() / kept.len() as f32
    };

    let text = kept
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let normalized = normalize_text(&text);

    debug!(
        kept = kept.len(),
        dropped = dropped_lines,
        average_confidence,
        "ocr lines filtered"
    );

    ImageRecord {
        phones: contact::extract_phones(&normalized),
        emails: contact::extract_emails(&normalized),
        lines: kept,
        text,
        average_confidence,
        dropped_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn empty_input_is_unknown_generic_record() {
        let result = extract(&RawDocument::from_file_text(""), today());
        let record = result.as_document().unwrap();
        assert_eq!(record.category, DocumentCategory::Unknown);
        assert_eq!(record.label, "Unknown");
        assert_eq!(record.summary, "");
        assert!(record.phones.is_empty());
        assert!(record.emails.is_empty());
        assert!(record.dates_found.is_empty());
        assert!(record.amounts_found.is_empty());
        assert_eq!(record.word_count, 0);
        assert_eq!(record.char_count, 0);
    }

    #[test]
    fn hint_is_recorded_but_does_not_change_category() {
        let text = "Invoice #7, Amount Due: $10.00";
        let as_file = extract(&RawDocument::from_file_text(text), today());
        let as_email = extract(&RawDocument::from_email(text, ""), today());
        assert_eq!(as_file.category(), as_email.category());
        assert_eq!(as_email.as_document().unwrap().hint, DocumentHint::Email);
    }

    #[test]
    fn forced_resume_extraction_ignores_category() {
        let raw = RawDocument::from_file_text("Jane Doe\njane@doe.dev\nInvoice reviewer");
        let record = extract_resume(&raw, today());
        assert_eq!(record.category, DocumentCategory::Resume);
        assert_eq!(record.personal_info.name, "Jane Doe");
        assert_eq!(record.personal_info.email, "jane@doe.dev");
    }

    #[test]
    fn total_experience_sums_work_history() {
        let raw = RawDocument::from_file_text(
            "Jane Doe\nEXPERIENCE\nSite Engineer\nAlpha Build\nJan 2020 - Jan 2022\nDraftsman\nBeta Build\nJan 2018 - Jul 2018\nEDUCATION\nB.E. Civil, Anna University, 2017\nSKILLS\nAutoCAD, Revit",
        );
        let record = extract_resume(&raw, today());
        assert_eq!(record.work_history.len(), 2);
        assert_eq!(record.professional_summary.total_experience, "2 years 6 months");
        assert_eq!(
            record.sections,
            vec![SectionName::Experience, SectionName::Education, SectionName::Skills]
        );
    }

    #[test]
    fn image_lines_filtered_by_confidence() {
        let lines = vec![
            OcrLine::new("Jane Doe", 0.9),
            OcrLine::new("jane@doe.dev", 0.7),
            OcrLine::new("~~noise~~", 0.1),
            OcrLine::new("+971 50 123 4567", 0.3),
        ];
        let record = extract_image(&lines, DEFAULT_OCR_MIN_CONFIDENCE);
        assert_eq!(record.lines.len(), 3);
        assert_eq!(record.dropped_lines, 1);
        assert_eq!(record.emails, vec!["jane@doe.dev"]);
        assert_eq!(record.phones, vec!["+971 50 123 4567"]);
        assert!((record.average_confidence - (0.9 + 0.7 + 0.3) / 3.0).abs() < 1e-6);
        assert_eq!(record.text, "Jane Doe\njane@doe.dev\n+971 50 123 4567");
    }

    #[test]
    fn image_with_no_confident_lines() {
        let record = extract_image(&[OcrLine::new("blur", 0.05)], DEFAULT_OCR_MIN_CONFIDENCE);
        assert!(record.lines.is_empty());
        assert_eq!(record.average_confidence, 0.0);
        assert_eq!(record.text, "");
    }
}
