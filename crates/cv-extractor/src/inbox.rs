use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use cv_common::batch::{Attachment, IncomingDocument};
use cv_common::extraction::split_signature;
use mailparse::{DispositionType, MailHeaderMap, ParsedMail};
use tracing::debug;

use crate::CliError;

/// ディレクトリ内の `*.eml` / `*.txt` を名前順に読み込む
///
/// - `.eml` はヘッダ・本文・添付を分解してメール 1 通として扱う
/// - `.txt` はファイルそのものを添付とした差出人不明のメールとして扱う
pub fn load_dir(dir: &Path) -> Result<Vec<IncomingDocument>, CliError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| matches!(extension(path).as_deref(), Some("eml" | "txt")))
        .collect();
    paths.sort();

    paths
        .iter()
        .map(|path| match extension(path).as_deref() {
            Some("eml") => load_eml(path),
            _ => load_txt(path),
        })
        .collect()
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn modified_at(path: &Path) -> DateTime<Utc> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

fn load_txt(path: &Path) -> Result<IncomingDocument, CliError> {
    let bytes = fs::read(path)?;
    let name = file_name(path);
    Ok(IncomingDocument {
        message_id: name.clone(),
        subject: name.clone(),
        sender: String::new(),
        received_at: modified_at(path),
        body: String::new(),
        signature: String::new(),
        attachments: vec![Attachment::new(name, bytes)],
    })
}

fn load_eml(path: &Path) -> Result<IncomingDocument, CliError> {
    let raw = fs::read(path)?;
    let mail = mailparse::parse_mail(&raw)?;
    let headers = mail.get_headers();

    let received_at = headers
        .get_first_value("Date")
        .and_then(|value| mailparse::dateparse(&value).ok())
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .unwrap_or_else(|| modified_at(path));

    let body = plain_body(&mail)?
        .unwrap_or_default()
        .replace("\r\n", "\n");
    let signature = split_signature(&body);

    let mut attachments = Vec::new();
    collect_attachments(&mail, &mut attachments)?;

    let document = IncomingDocument {
        message_id: headers
            .get_first_value("Message-ID")
            .unwrap_or_else(|| file_name(path)),
        subject: headers.get_first_value("Subject").unwrap_or_default(),
        sender: headers.get_first_value("From").unwrap_or_default(),
        received_at,
        body,
        signature,
        attachments,
    };
    debug!(
        path = %path.display(),
        message_id = %document.message_id,
        attachments = document.attachments.len(),
        "eml loaded"
    );
    Ok(document)
}

/// 最初の text/plain パート（添付扱いのものは除く）
fn plain_body(part: &ParsedMail<'_>) -> Result<Option<String>, CliError> {
    if part.subparts.is_empty() {
        let is_attachment =
            part.get_content_disposition().disposition == DispositionType::Attachment;
        if part.ctype.mimetype == "text/plain" && !is_attachment {
            return Ok(Some(part.get_body()?));
        }
        return Ok(None);
    }
    for sub in &part.subparts {
        if let Some(body) = plain_body(sub)? {
            return Ok(Some(body));
        }
    }
    Ok(None)
}

fn collect_attachments(part: &ParsedMail<'_>, out: &mut Vec<Attachment>) -> Result<(), CliError> {
    let disposition = part.get_content_disposition();
    let name = disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .cloned();

    if let Some(name) = name {
        if disposition.disposition == DispositionType::Attachment || part.subparts.is_empty() {
            out.push(Attachment::new(name, part.get_body_raw()?));
        }
    }
    for sub in &part.subparts {
        collect_attachments(sub, out)?;
    }
    Ok(())
}
