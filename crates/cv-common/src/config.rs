use chrono::{Local, NaiveDate};
use thiserror::Error;

use crate::pipeline::DEFAULT_OCR_MIN_CONFIDENCE;

pub const OCR_MIN_CONFIDENCE_ENV: &str = "CV_OCR_MIN_CONFIDENCE";
pub const REFERENCE_DATE_ENV: &str = "CV_REFERENCE_DATE";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a number between 0 and 1, got {value:?}")]
    InvalidConfidence { name: &'static str, value: String },
    #[error("{name} must be a YYYY-MM-DD date, got {value:?}")]
    InvalidDate { name: &'static str, value: String },
}

/// 抽出エンジンの実行設定
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// OCR 行を採用する最低信頼度（以上）
    pub ocr_min_confidence: f32,
    /// 期間計算の「今日」。`None` ならローカル日付
    pub reference_date: Option<NaiveDate>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ocr_min_confidence: DEFAULT_OCR_MIN_CONFIDENCE,
            reference_date: None,
        }
    }
}

impl EngineConfig {
    /// 環境変数から読み込む。未設定・空文字はデフォルトのまま
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = non_empty(lookup(OCR_MIN_CONFIDENCE_ENV)) {
            config.ocr_min_confidence = parse_confidence(OCR_MIN_CONFIDENCE_ENV, &raw)?;
        }
        if let Some(raw) = non_empty(lookup(REFERENCE_DATE_ENV)) {
            config.reference_date = Some(parse_reference_date(REFERENCE_DATE_ENV, &raw)?);
        }

        Ok(config)
    }

    pub fn with_reference_date(mut self, date: Option<NaiveDate>) -> Self {
        if date.is_some() {
            self.reference_date = date;
        }
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_confidence(name: &'static str, raw: &str) -> Result<f32, ConfigError> {
    match raw.parse::<f32>() {
        Ok(value) if (0.0..=1.0).contains(&value) => Ok(value),
        _ => Err(ConfigError::InvalidConfidence {
            name,
            value: raw.to_string(),
        }),
    }
}

/// `YYYY-MM-DD` 形式の日付を読む（CLI 引数でも使う）
pub fn parse_reference_date(name: &'static str, raw: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.ocr_min_confidence, 0.3);
    }

    #[test]
    fn reads_both_values() {
        let config = EngineConfig::from_lookup(lookup(&[
            (OCR_MIN_CONFIDENCE_ENV, "0.55"),
            (REFERENCE_DATE_ENV, "2023-01-15"),
        ]))
        .unwrap();
        assert_eq!(config.ocr_min_confidence, 0.55);
        assert_eq!(config.today(), NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
    }

    #[test]
    fn blank_values_are_ignored() {
        let config =
            EngineConfig::from_lookup(lookup(&[(REFERENCE_DATE_ENV, "  ")])).unwrap();
        assert!(config.reference_date.is_none());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let err = EngineConfig::from_lookup(lookup(&[(OCR_MIN_CONFIDENCE_ENV, "1.5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfidence { .. }));
    }

    #[test]
    fn rejects_malformed_date() {
        let err =
            EngineConfig::from_lookup(lookup(&[(REFERENCE_DATE_ENV, "15/01/2023")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidDate {
                name: REFERENCE_DATE_ENV,
                value: "15/01/2023".into()
            }
        );
    }

    #[test]
    fn cli_date_overrides_only_when_present() {
        let fixed = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
        let config = EngineConfig::default().with_reference_date(Some(fixed));
        assert_eq!(config.today(), fixed);
        let kept = config.clone().with_reference_date(None);
        assert_eq!(kept.reference_date, Some(fixed));
    }
}
