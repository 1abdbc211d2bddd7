//! 受信メール（本文 + 添付）をまとめて処理するバッチランナー
//!
//! メール 1 通ごとに本文・署名の連絡先を拾い、最初に扱える添付（履歴書・テキスト・画像・表）
//! があればそれを抽出して候補者 1 件にまとめる。候補者にできた message id はスキップし、
//! 添付のデコード失敗は `errors` に数えてバッチは止めない（失敗したものは次回また試す）。

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::extraction::contact::extract_from_email;
use crate::ids::{candidate_unique_id, new_batch_id};
use crate::pipeline::{extract_image, extract_resume};
use crate::record::{CandidateRecord, EmailContact, ImageRecord, RawDocument};
use crate::sources::{extension_of, DocumentKind, OcrEngine, SourceError, TextExtractor};

const UNKNOWN_NAME: &str = "Unknown";

static ANGLE_ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<\s*([^<>\s]+@[^<>\s]+)\s*>").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_file_name(&self.file_name)
    }
}

/// バッチに流す 1 通ぶんの入力
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingDocument {
    pub message_id: String,
    pub subject: String,
    /// `"Jane Doe <jane@doe.dev>"` もしくはアドレスのみ
    pub sender: String,
    pub received_at: DateTime<Utc>,
    pub body: String,
    pub signature: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BatchStatus {
    Running,
    Completed,
}

/// 1 通処理するたびにコールバックへ渡す進捗
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub batch_id: String,
    pub status: BatchStatus,
    pub total: usize,
    pub processed: usize,
    pub candidates_added: usize,
    pub skipped: usize,
    pub errors: usize,
    pub current_subject: Option<String>,
}

/// 候補者の情報をどこから取ったか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CandidateSource {
    Attachment,
    Image,
    /// 表計算ファイル。中身は読まずファイル名だけ残す
    Spreadsheet,
    EmailOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedCandidate {
    pub unique_id: String,
    pub message_id: String,
    pub subject: String,
    pub received_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub phones: Vec<String>,
    pub source: CandidateSource,
    pub attachment: Option<String>,
    pub email_contact: EmailContact,
    pub record: Option<CandidateRecord>,
    pub image: Option<ImageRecord>,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read attachment {file_name}: {source}")]
    Upstream {
        file_name: String,
        #[source]
        source: SourceError,
    },
}

/// 失敗した 1 通の記録（JSON 出力用に文字列化済み）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub message_id: String,
    pub subject: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub progress: BatchProgress,
    pub candidates: Vec<ScannedCandidate>,
    pub failures: Vec<BatchFailure>,
}

/// 添付から取り出した中身
enum AttachmentContent {
    Resume(CandidateRecord),
    Image(ImageRecord),
    Spreadsheet,
}

pub struct BatchRunner {
    text_extractor: Box<dyn TextExtractor>,
    ocr: Box<dyn OcrEngine>,
    config: EngineConfig,
    seen: HashSet<String>,
}

impl BatchRunner {
    pub fn new(
        text_extractor: Box<dyn TextExtractor>,
        ocr: Box<dyn OcrEngine>,
        config: EngineConfig,
    ) -> Self {
        Self {
            text_extractor,
            ocr,
            config,
            seen: HashSet::new(),
        }
    }

    /// 以前の実行で候補者にした message id を登録しておく
    pub fn mark_seen<I, S>(&mut self, message_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seen.extend(message_ids.into_iter().map(Into::into));
    }

    /// `documents` を順に処理する。`on_progress` は 1 通ごと + 完了時に呼ばれる
    pub fn run<F>(&mut self, documents: &[IncomingDocument], mut on_progress: F) -> BatchReport
    where
        F: FnMut(&BatchProgress),
    {
        let mut progress = BatchProgress {
            batch_id: new_batch_id(),
            status: BatchStatus::Running,
            total: documents.len(),
            processed: 0,
            candidates_added: 0,
            skipped: 0,
            errors: 0,
            current_subject: None,
        };
        let mut candidates = Vec::new();
        let mut failures = Vec::new();

        info!(batch_id = %progress.batch_id, total = progress.total, "batch started");

        for document in documents {
            progress.current_subject = Some(document.subject.clone());

            if self.seen.contains(&document.message_id) {
                debug!(message_id = %document.message_id, "already processed; skipping");
                progress.skipped += 1;
            } else {
                match self.process_document(document) {
                    Ok(candidate) => {
                        self.seen.insert(document.message_id.clone());
                        candidates.push(candidate);
                        progress.candidates_added += 1;
                    }
                    Err(err) => {
                        warn!(
                            message_id = %document.message_id,
                            error = %err,
                            "document failed; continuing"
                        );
                        failures.push(BatchFailure {
                            message_id: document.message_id.clone(),
                            subject: document.subject.clone(),
                            error: err.to_string(),
                        });
                        progress.errors += 1;
                    }
                }
            }

            progress.processed += 1;
            on_progress(&progress);
        }

        progress.status = BatchStatus::Completed;
        progress.current_subject = None;
        on_progress(&progress);

        info!(
            batch_id = %progress.batch_id,
            processed = progress.processed,
            candidates_added = progress.candidates_added,
            skipped = progress.skipped,
            errors = progress.errors,
            "batch completed"
        );

        BatchReport {
            progress,
            candidates,
            failures,
        }
    }

    /// 1 通を候補者にまとめる
    pub fn process_document(
        &self,
        document: &IncomingDocument,
    ) -> Result<ScannedCandidate, DocumentError> {
        let email_contact = extract_from_email(&document.body, &document.signature);

        let attachment = document.attachments.iter().find(|a| a.kind().is_some());

        let content = attachment
            .map(|a| self.read_attachment(a))
            .transpose()?;

        let (source, record, image) = match content {
            Some(AttachmentContent::Resume(record)) => {
                (CandidateSource::Attachment, Some(record), None)
            }
            Some(AttachmentContent::Image(image)) => (CandidateSource::Image, None, Some(image)),
            Some(AttachmentContent::Spreadsheet) => (CandidateSource::Spreadsheet, None, None),
            None => (CandidateSource::EmailOnly, None, None),
        };

        let name = resolve_name(record.as_ref(), &email_contact, &document.sender);
        let email = sender_address(&document.sender);
        let phones = resolve_phones(record.as_ref(), image.as_ref(), &email_contact);
        let unique_id = candidate_unique_id(&document.subject, document.received_at, &email);

        debug!(
            message_id = %document.message_id,
            unique_id = %unique_id,
            source = source.as_ref(),
            "candidate resolved"
        );

        Ok(ScannedCandidate {
            unique_id,
            message_id: document.message_id.clone(),
            subject: document.subject.clone(),
            received_at: document.received_at,
            name,
            email,
            phones,
            source,
            attachment: attachment.map(|a| a.file_name.clone()),
            email_contact,
            record,
            image,
        })
    }

    /// 添付の中身だけを読む。メール本文や署名は混ぜない
    fn read_attachment(&self, attachment: &Attachment) -> Result<AttachmentContent, DocumentError> {
        let upstream = |source: SourceError| DocumentError::Upstream {
            file_name: attachment.file_name.clone(),
            source,
        };

        match attachment.kind() {
            Some(DocumentKind::Image) => {
                let lines = self.ocr.recognize(&attachment.bytes).map_err(upstream)?;
                return Ok(AttachmentContent::Image(extract_image(
                    &lines,
                    self.config.ocr_min_confidence,
                )));
            }
            Some(DocumentKind::Spreadsheet) => return Ok(AttachmentContent::Spreadsheet),
            _ => {}
        }

        let extension = extension_of(&attachment.file_name).unwrap_or_default();
        let text = self
            .text_extractor
            .extract_text(&attachment.bytes, &extension)
            .map_err(upstream)?;

        Ok(AttachmentContent::Resume(extract_resume(
            &RawDocument::from_file_text(text),
            self.config.today(),
        )))
    }
}

/// 履歴書の氏名 → 署名の氏名 → 送信者の表示名 → "Unknown"
fn resolve_name(record: Option<&CandidateRecord>, contact: &EmailContact, sender: &str) -> String {
    record
        .map(|r| r.personal_info.name.clone())
        .filter(|name| !name.is_empty())
        .or_else(|| Some(contact.name.clone()).filter(|name| !name.is_empty()))
        .or_else(|| sender_display_name(sender))
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

fn resolve_phones(
    record: Option<&CandidateRecord>,
    image: Option<&ImageRecord>,
    contact: &EmailContact,
) -> Vec<String> {
    let from_attachment = record
        .map(|r| r.contact_details.phones.clone())
        .or_else(|| image.map(|i| i.phones.clone()))
        .unwrap_or_default();

    if from_attachment.is_empty() {
        contact.phones.clone()
    } else {
        from_attachment
    }
}

/// `"Jane Doe" <jane@doe.dev>` → `Jane Doe`
pub fn sender_display_name(sender: &str) -> Option<String> {
    let open = sender.find('<')?;
    let name = sender[..open].trim().trim_matches('"').trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// `<...>` 内のアドレス。なければ送信者文字列そのもの
pub fn sender_address(sender: &str) -> String {
    ANGLE_ADDRESS_RE
        .captures(sender)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| sender.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::OcrLine;
    use crate::sources::PlainTextExtractor;
    use chrono::{NaiveDate, TimeZone};
    use std::cell::Cell;

    struct FixedOcr(Vec<OcrLine>);

    impl OcrEngine for FixedOcr {
        fn recognize(&self, _bytes: &[u8]) -> Result<Vec<OcrLine>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingText;

    /// 最初の 1 回だけ失敗する
    struct FlakyText {
        failed: Cell<bool>,
    }

    impl TextExtractor for FlakyText {
        fn extract_text(&self, bytes: &[u8], extension: &str) -> Result<String, SourceError> {
            if !self.failed.replace(true) {
                return Err(SourceError::ExtractionFailed {
                    reason: "locked by another process".into(),
                });
            }
            PlainTextExtractor.extract_text(bytes, extension)
        }
    }

    impl TextExtractor for FailingText {
        fn extract_text(&self, _bytes: &[u8], _extension: &str) -> Result<String, SourceError> {
            Err(SourceError::ExtractionFailed {
                reason: "corrupt file".into(),
            })
        }
    }

    fn config() -> EngineConfig {
        EngineConfig::default()
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 1))
    }

    fn runner() -> BatchRunner {
        BatchRunner::new(
            Box::new(PlainTextExtractor),
            Box::new(FixedOcr(vec![OcrLine::new("+971 50 123 4567", 0.8)])),
            config(),
        )
    }

    fn document(id: &str, attachments: Vec<Attachment>) -> IncomingDocument {
        IncomingDocument {
            message_id: id.into(),
            subject: format!("Application {id}"),
            sender: "\"Maria Lopez\" <maria@lopez.dev>".into(),
            received_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            body: "Please find my CV attached.".into(),
            signature: "Best regards,\nMaria Lopez\n+34 612 345 678".into(),
            attachments,
        }
    }

    #[test]
    fn sender_parsing() {
        assert_eq!(
            sender_display_name("\"Maria Lopez\" <maria@lopez.dev>").as_deref(),
            Some("Maria Lopez")
        );
        assert_eq!(sender_display_name("maria@lopez.dev"), None);
        assert_eq!(sender_address("Maria <maria@lopez.dev>"), "maria@lopez.dev");
        assert_eq!(sender_address(" maria@lopez.dev "), "maria@lopez.dev");
    }

    #[test]
    fn resume_attachment_wins_over_email() {
        let cv = Attachment::new(
            "cv.txt",
            "JOHN SMITH\njohn@smith.io\n+1 415 555 0100\nEXPERIENCE\nSite Engineer\nAlpha Build\nJan 2020 - Present",
        );
        let candidate = runner().process_document(&document("m1", vec![cv])).unwrap();
        assert_eq!(candidate.source, CandidateSource::Attachment);
        assert_eq!(candidate.name, "John Smith");
        assert_eq!(candidate.email, "maria@lopez.dev");
        assert_eq!(candidate.phones, vec!["+1 415 555 0100"]);
        assert_eq!(candidate.attachment.as_deref(), Some("cv.txt"));
        assert_eq!(candidate.unique_id.len(), 10);
    }

    #[test]
    fn resume_record_holds_attachment_data_only() {
        let mut doc = document(
            "m7",
            vec![Attachment::new("cv.txt", "JOHN SMITH\nSKILLS\nAutoCAD")],
        );
        doc.signature =
            "Best regards,\nMaria Lopez\nRevit Trainer\nmaria.private@mail.com\n+34 612 345 678".into();

        let candidate = runner().process_document(&doc).unwrap();
        let record = candidate.record.as_ref().unwrap();
        assert_eq!(record.personal_info.email, "");
        assert_eq!(record.personal_info.phone, "");
        assert!(record.contact_details.phones.is_empty());
        let skills: Vec<&str> = record.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(skills, vec!["AutoCAD"]);

        // 履歴書に番号が無ければメール側の番号を使う
        assert_eq!(candidate.phones, vec!["+34 612 345 678"]);
        assert_eq!(candidate.email_contact.emails, vec!["maria.private@mail.com"]);
    }

    #[test]
    fn email_only_uses_signature() {
        let candidate = runner().process_document(&document("m2", vec![])).unwrap();
        assert_eq!(candidate.source, CandidateSource::EmailOnly);
        assert_eq!(candidate.name, "Maria Lopez");
        assert_eq!(candidate.phones, vec!["+34 612 345 678"]);
        assert!(candidate.record.is_none());
    }

    #[test]
    fn name_falls_back_to_sender_then_unknown() {
        let mut doc = document("m3", vec![]);
        doc.signature = String::new();
        doc.sender = "Ana Ruiz <ana@ruiz.dev>".into();
        assert_eq!(runner().process_document(&doc).unwrap().name, "Ana Ruiz");

        doc.sender = "ana@ruiz.dev".into();
        assert_eq!(runner().process_document(&doc).unwrap().name, "Unknown");
    }

    #[test]
    fn image_attachment_goes_through_ocr() {
        let mut doc = document("m4", vec![Attachment::new("scan.PNG", vec![0u8; 4])]);
        doc.signature = String::new();
        let candidate = runner().process_document(&doc).unwrap();
        assert_eq!(candidate.source, CandidateSource::Image);
        assert_eq!(candidate.phones, vec!["+971 50 123 4567"]);
        assert!(candidate.image.is_some());
    }

    #[test]
    fn spreadsheet_is_selected_without_a_record() {
        let doc = document(
            "m8",
            vec![
                Attachment::new("roster.xlsx", vec![0u8; 4]),
                Attachment::new("cv.txt", "JOHN SMITH"),
            ],
        );
        let candidate = runner().process_document(&doc).unwrap();
        assert_eq!(candidate.source, CandidateSource::Spreadsheet);
        assert_eq!(candidate.attachment.as_deref(), Some("roster.xlsx"));
        assert!(candidate.record.is_none() && candidate.image.is_none());
        assert_eq!(candidate.name, "Maria Lopez");
        assert_eq!(candidate.phones, vec!["+34 612 345 678"]);
    }

    #[test]
    fn unsupported_attachments_are_ignored() {
        let doc = document("m5", vec![Attachment::new("photo.zip", vec![1, 2, 3])]);
        let candidate = runner().process_document(&doc).unwrap();
        assert_eq!(candidate.source, CandidateSource::EmailOnly);
        assert!(candidate.attachment.is_none());
    }

    #[test]
    fn upstream_failure_names_the_file() {
        let runner = BatchRunner::new(Box::new(FailingText), Box::new(FixedOcr(vec![])), config());
        let doc = document("m6", vec![Attachment::new("cv.pdf", vec![0u8; 4])]);
        let err = runner.process_document(&doc).unwrap_err();
        let DocumentError::Upstream { file_name, source } = err;
        assert_eq!(file_name, "cv.pdf");
        assert!(matches!(source, SourceError::ExtractionFailed { .. }));
    }

    #[test]
    fn run_counts_skips_and_errors() {
        let mut runner = BatchRunner::new(Box::new(FailingText), Box::new(FixedOcr(vec![])), config());
        runner.mark_seen(["old"]);
        let docs = vec![
            document("a", vec![]),
            document("a", vec![]),
            document("old", vec![]),
            document("b", vec![Attachment::new("cv.docx", vec![0u8; 4])]),
        ];

        let mut updates = Vec::new();
        let report = runner.run(&docs, |p| updates.push(p.clone()));

        assert_eq!(report.progress.status, BatchStatus::Completed);
        assert_eq!(report.progress.total, 4);
        assert_eq!(report.progress.processed, 4);
        assert_eq!(report.progress.candidates_added, 1);
        assert_eq!(report.progress.skipped, 2);
        assert_eq!(report.progress.errors, 1);
        assert_eq!(report.failures[0].message_id, "b");
        assert!(report.failures[0].error.contains("cv.docx"));

        assert_eq!(updates.len(), 5);
        assert!(updates[..4].iter().all(|p| p.status == BatchStatus::Running));
        assert_eq!(updates[0].processed, 1);
        assert_eq!(updates[0].current_subject.as_deref(), Some("Application a"));
        assert!(updates.iter().all(|p| p.batch_id == report.progress.batch_id));
    }

    #[test]
    fn failed_documents_are_retried_on_the_next_run() {
        let flaky = FlakyText {
            failed: Cell::new(false),
        };
        let mut runner = BatchRunner::new(Box::new(flaky), Box::new(FixedOcr(vec![])), config());
        let docs = vec![document(
            "c",
            vec![Attachment::new("cv.txt", "JOHN SMITH\n+1 415 555 0100")],
        )];

        let first = runner.run(&docs, |_| {});
        assert_eq!(first.progress.errors, 1);
        assert_eq!(first.progress.candidates_added, 0);

        let second = runner.run(&docs, |_| {});
        assert_eq!(second.progress.errors, 0);
        assert_eq!(second.progress.skipped, 0);
        assert_eq!(second.progress.candidates_added, 1);
        assert_eq!(second.candidates[0].name, "John Smith");

        let third = runner.run(&docs, |_| {});
        assert_eq!(third.progress.skipped, 1);
    }
}
