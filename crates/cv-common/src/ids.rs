//! Identifiers: the process run id, per-batch ids and the stable candidate id.
//!
//! # Example
//! ```
//! use chrono::{TimeZone, Utc};
//! use cv_common::ids;
//!
//! let run = ids::run_id();
//! assert_eq!(run.len(), 26);
//!
//! let received = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
//! let id = ids::candidate_unique_id("Application: BIM Modeler", received, "Jane@Doe.dev");
//! assert_eq!(id.len(), 10);
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use ulid::Ulid;

const CANDIDATE_ID_LEN: usize = 10;

static RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// Process-level run id, generated on first access.
#[inline]
pub fn run_id() -> &'static str {
    &RUN_ID
}

/// Fresh ULID for one batch run.
#[inline]
pub fn new_batch_id() -> String {
    Ulid::new().to_string()
}

/// Stable 10-hex-char id for a candidate.
///
/// SHA-256 over `subject.trim() | received_at (RFC 3339, seconds) | email.trim().lowercase()`.
/// The same message always maps to the same id, so re-scanning a mailbox does not create
/// duplicate candidates.
pub fn candidate_unique_id(subject: &str, received_at: DateTime<Utc>, email: &str) -> String {
    let key = format!(
        "{}|{}|{}",
        subject.trim(),
        received_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        email.trim().to_lowercase()
    );
    let digest = Sha256::digest(key.as_bytes());
    let hex = digest
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    hex[..CANDIDATE_ID_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn run_id_is_stable_within_process() {
        assert_eq!(run_id(), run_id());
        assert_eq!(run_id().len(), 26);
    }

    #[test]
    fn batch_ids_are_unique() {
        let a = new_batch_id();
        let b = new_batch_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 26);
    }

    #[test]
    fn candidate_id_ignores_whitespace_and_email_case() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let a = candidate_unique_id("  Application  ", at, "Jane@Doe.dev ");
        let b = candidate_unique_id("Application", at, "jane@doe.dev");
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn candidate_id_changes_with_inputs() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 1, 9, 31, 0).unwrap();
        let base = candidate_unique_id("Application", at, "jane@doe.dev");
        assert_ne!(base, candidate_unique_id("Application", later, "jane@doe.dev"));
        assert_ne!(base, candidate_unique_id("Application", at, "john@doe.dev"));
    }
}
