//! 添付ファイルからテキスト / OCR 行を取り出す外部コラボレータの境界
//!
//! PDF・Word・画像のデコードはこのクレートでは行わない。呼び出し側が
//! `TextExtractor` / `OcrEngine` を実装して渡す。プレーンテキスト系だけは
//! `PlainTextExtractor` で扱える。

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use thiserror::Error;

use crate::record::OcrLine;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unsupported format: .{extension}")]
    UnsupportedFormat { extension: String },
    #[error("text extraction failed: {reason}")]
    ExtractionFailed { reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// バイト列 + 拡張子 → テキスト
pub trait TextExtractor {
    fn extract_text(&self, bytes: &[u8], extension: &str) -> Result<String, SourceError>;
}

/// 画像バイト列 → 信頼度付きの行
pub trait OcrEngine {
    fn recognize(&self, bytes: &[u8]) -> Result<Vec<OcrLine>, SourceError>;
}

/// 添付ファイルの種別（拡張子で判定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    Spreadsheet,
    Image,
    PlainText,
}

impl DocumentKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" | "doc" | "docx" => Some(DocumentKind::Resume),
            "csv" | "xlsx" | "xls" => Some(DocumentKind::Spreadsheet),
            "jpg" | "jpeg" | "png" | "bmp" | "tiff" | "gif" => Some(DocumentKind::Image),
            "txt" | "md" | "eml" => Some(DocumentKind::PlainText),
            _ => None,
        }
    }

    pub fn from_file_name(file_name: &str) -> Option<Self> {
        extension_of(file_name).and_then(|ext| Self::from_extension(&ext))
    }
}

/// 小文字の拡張子（ドットなし）
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// txt / md / csv / eml を UTF-8 として読む（不正なバイトは置換文字）
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    const EXTENSIONS: [&'static str; 4] = ["txt", "md", "csv", "eml"];
}

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, bytes: &[u8], extension: &str) -> Result<String, SourceError> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        if !Self::EXTENSIONS.contains(&extension.as_str()) {
            return Err(SourceError::UnsupportedFormat { extension });
        }
        let text = String::from_utf8_lossy(bytes);
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
}

/// OCR を持たない環境用。常に `UnsupportedFormat`
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOcr;

impl OcrEngine for NoOcr {
    fn recognize(&self, _bytes: &[u8]) -> Result<Vec<OcrLine>, SourceError> {
        Err(SourceError::UnsupportedFormat {
            extension: "image".into(),
        })
    }
}
