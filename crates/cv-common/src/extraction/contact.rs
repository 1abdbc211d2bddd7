use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::normalize::context_window;
use crate::record::{ContactInfo, EmailContact};

pub const MAX_EMAILS: usize = 3;
pub const MAX_PHONES: usize = 3;
pub const MAX_OTHER_LINKS: usize = 5;

const NAME_SCAN_LINES: usize = 20;
const PHONE_CONTEXT_CHARS: usize = 30;
const MIN_PHONE_DIGITS: usize = 10;
/// E.164 の上限
const MAX_PHONE_DIGITS: usize = 15;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"\b[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}\b").unwrap();

    // 判定順に並べる。先に採用したマッチと重なる後続マッチは捨てる
    static ref PHONE_RES: Vec<Regex> = vec![
        // +91 98765 43210 / +1 415-555-0100 / +971501234567
        // 国番号の後は 2 桁以上の塊、最後は 3 桁以上（後ろの "12" などを巻き込まない）
        Regex::new(r"\+\d{1,3}(?:[ \t.-]{0,2}\d{2,5}){1,4}[ \t.-]{0,2}\d{3,5}\b").unwrap(),
        // 415-555-0100
        Regex::new(r"\b\d{3}[ \t.-]\d{3}[ \t.-]\d{4}\b").unwrap(),
        // (415) 555-0100
        Regex::new(r"\(\d{3}\)[ \t]*\d{3}[ \t.-]?\d{4}\b").unwrap(),
        // 4155550100
        Regex::new(r"\b\d{10}\b").unwrap(),
    ];
    static ref WHITESPACE_RUN_RE: Regex = Regex::new(r"\s+").unwrap();

    static ref LINKEDIN_RE: Regex =
        Regex::new(r"(?i)(?:https?://)?(?:www\.)?linkedin\.com/in/[A-Za-z0-9_-]+").unwrap();
    static ref GITHUB_RE: Regex =
        Regex::new(r"(?i)(?:https?://)?(?:www\.)?github\.com/[A-Za-z0-9_-]+").unwrap();
    // "Portfolio: https://..." のようにラベル付きで書かれたもの
    static ref PORTFOLIO_LABEL_RE: Regex = Regex::new(
        r"(?i)\bportfolio[ \t]*[:\-][ \t]*((?:https?://)?[A-Za-z0-9.-]+\.[A-Za-z]{2,}(?:/[^\s,;|]*)?)"
    )
    .unwrap();
    // ラベルなしでもポートフォリオとみなすホスト
    static ref PORTFOLIO_HOST_RE: Regex = Regex::new(
        r"(?i)(?:https?://)?(?:www\.)?(?:behance\.net/[\w-]+|dribbble\.com/[\w-]+|[\w-]+\.github\.io(?:/[\w./-]*)?|[\w-]+\.(?:dev|me|design|art|site)\b(?:/[\w./-]*)?)"
    )
    .unwrap();
    static ref URL_RE: Regex = Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).unwrap();

    static ref PHONE_LIKE_RE: Regex = Regex::new(r"\+?\d[\d\s.-]{7,}").unwrap();
    static ref NAME_SKIP_RE: Regex = Regex::new(
        r"(?i)\b(?:resume|cv|curriculum|vitae|phone|email|address|linkedin|github|portfolio|objective|summary|profile|contact)\b"
    )
    .unwrap();
    static ref NAME_LINE_RE: Regex = Regex::new(r"^[A-Za-z][A-Za-z\s.'-]+$").unwrap();
    static ref SIGNATURE_WORD_RE: Regex = Regex::new(r"^[A-Za-z.'-]+$").unwrap();

    // 署名の開始位置。並び順に試して最初に当たったもの
    static ref SIGNATURE_START_RES: Vec<Regex> = [
        r"\n--[ \t]*\n",
        r"\n_{3,}[ \t]*\n",
        r"\n-{3,}[ \t]*\n",
        r"(?i)\nbest[ \t]+regards?[ \t]*[,.]?[ \t]*\n",
        r"(?i)\nkind[ \t]+regards?[ \t]*[,.]?[ \t]*\n",
        r"(?i)\nregards[ \t]*[,.]?[ \t]*\n",
        r"(?i)\nsincerely[ \t]*[,.]?[ \t]*\n",
        r"(?i)\nthanks?[ \t]*[,.]?[ \t]*\n",
        r"(?i)\nthank[ \t]+you[ \t]*[,.]?[ \t]*\n",
        r"(?i)\ncheers[ \t]*[,.]?[ \t]*\n",
        r"(?i)\nwarm[ \t]+regards[ \t]*[,.]?[ \t]*\n",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
}

const MAX_SIGNATURE_CHARS: usize = 1000;

const PHONE_CONTEXT_BLOCKLIST: &[&str] = &["linkedin", "github", "/in/", "profile"];
const SIGN_OFF_WORDS: &[&str] = &["regards", "thanks", "sincerely", "cheers", "--", "best"];

/// 冒頭 20 行から氏名らしい行を探す
///
/// - 空行・3 文字未満・`@` を含む行・電話番号らしい数字列を含む行は飛ばす
/// - resume / email / profile などの見出し語を含む行は飛ばす
/// - 2〜5 語、各語が大文字始まり、英字と空白 . ' - のみ
/// - 全部大文字なら Title Case にして返す
pub fn extract_name(text: &str) -> String {
    for line in text.trim().lines().take(NAME_SCAN_LINES) {
        let line = line.trim();
        if line.chars().count() < 3 {
            continue;
        }
        if line.contains('@') || PHONE_LIKE_RE.is_match(line) {
            continue;
        }
        if NAME_SKIP_RE.is_match(line) {
            continue;
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        if !(2..=5).contains(&words.len()) {
            continue;
        }
        if !words
            .iter()
            .all(|w| w.chars().next().is_some_and(|c| c.is_ascii_uppercase()))
        {
            continue;
        }
        if !NAME_LINE_RE.is_match(line) {
            continue;
        }

        return if is_all_caps(line) {
            to_title_case(line)
        } else {
            line.to_string()
        };
    }
    String::new()
}

fn is_all_caps(text: &str) -> bool {
    let mut letters = text.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(|c| c.is_uppercase())
}

/// 英字の直前が英字でなければ大文字、そうでなければ小文字（"O'BRIEN" → "O'Brien"）
fn to_title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// メールアドレス（出現順・重複除去・最大 3 件）
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut emails: Vec<String> = Vec::new();
    for m in EMAIL_RE.find_iter(text) {
        let email = m.as_str().to_string();
        if !emails.contains(&email) {
            emails.push(email);
        }
        if emails.len() == MAX_EMAILS {
            break;
        }
    }
    emails
}

/// 電話番号（最大 3 件）
///
/// 前後 30 文字に linkedin / github / "/in/" / profile があれば URL の一部とみなして捨てる。
/// 数字だけで 10 桁未満・15 桁超のものも捨てる。
pub fn extract_phones(text: &str) -> Vec<String> {
    let mut phones: Vec<String> = Vec::new();
    let mut accepted_spans: Vec<(usize, usize)> = Vec::new();

    for re in PHONE_RES.iter() {
        for m in re.find_iter(text) {
            let (start, end) = (m.start(), m.end());
            if accepted_spans.iter().any(|&(s, e)| start < e && s < end) {
                continue;
            }

            let context = context_window(text, start, end, PHONE_CONTEXT_CHARS).to_lowercase();
            if PHONE_CONTEXT_BLOCKLIST.iter().any(|word| context.contains(word)) {
                debug!(candidate = m.as_str(), "phone rejected by url context");
                continue;
            }

            let clean = WHITESPACE_RUN_RE.replace_all(m.as_str().trim(), " ").to_string();
            let digits = clean.chars().filter(|c| c.is_ascii_digit()).count();
            if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
                continue;
            }

            accepted_spans.push((start, end));
            if !phones.contains(&clean) {
                phones.push(clean);
            }
            if phones.len() == MAX_PHONES {
                return phones;
            }
        }
    }
    phones
}

pub fn extract_linkedin(text: &str) -> Option<String> {
    LINKEDIN_RE.find(text).map(|m| m.as_str().to_string())
}

pub fn extract_github(text: &str) -> Option<String> {
    GITHUB_RE.find(text).map(|m| m.as_str().to_string())
}

/// ポートフォリオ URL。ラベル付きのものを優先し、なければ既知ホストを探す
pub fn extract_portfolio(text: &str) -> Option<String> {
    if let Some(url) = PORTFOLIO_LABEL_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| trim_url(m.as_str()))
    {
        return Some(url);
    }

    PORTFOLIO_HOST_RE
        .find_iter(text)
        // メールアドレスのドメイン部分（jane@doe.dev）は除外
        .find(|m| !text[..m.start()].ends_with('@'))
        .map(|m| trim_url(m.as_str()))
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches(['.', ',', ';', ':', ')', '/'])
        .to_string()
}

/// 連絡先一式
pub fn extract_contact_info(text: &str) -> ContactInfo {
    ContactInfo {
        emails: extract_emails(text),
        phones: extract_phones(text),
        linkedin: extract_linkedin(text),
        github: extract_github(text),
        portfolio: extract_portfolio(text),
    }
}

/// LinkedIn 以外の http(s) リンク（最大 5 件）
pub fn extract_other_links(text: &str) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for m in URL_RE.find_iter(text) {
        if m.as_str().to_lowercase().contains("linkedin.com") {
            continue;
        }
        let url = trim_url(m.as_str());
        if !links.contains(&url) {
            links.push(url);
        }
        if links.len() == MAX_OTHER_LINKS {
            break;
        }
    }
    links
}

/// 署名の先頭 3 行から氏名を拾う（"Best regards," などの結び行は飛ばす）
pub fn extract_signature_name(signature: &str) -> String {
    for line in signature.trim().lines().take(3) {
        let line = line.trim();
        let lower = line.to_lowercase();
        if SIGN_OFF_WORDS.iter().any(|word| lower.contains(word)) {
            continue;
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        if (2..=4).contains(&words.len()) && words.iter().all(|w| SIGNATURE_WORD_RE.is_match(w)) {
            return line.to_string();
        }
    }
    String::new()
}

/// 本文から署名ブロックを切り出す（最大 1000 文字）。区切りがなければ空文字
///
/// "-- " 区切り・下線・"Best regards," などの結び行から末尾までを署名とみなす。
pub fn split_signature(body: &str) -> String {
    SIGNATURE_START_RES
        .iter()
        .find_map(|re| re.find(body))
        .map(|m| crate::normalize::truncate_chars(body[m.start()..].trim(), MAX_SIGNATURE_CHARS))
        .unwrap_or_default()
}

/// メール本文 + 署名から連絡先を抽出（添付のないメール向け）
pub fn extract_from_email(body: &str, signature: &str) -> EmailContact {
    let combined = format!("{body}\n{signature}");

    EmailContact {
        phones: extract_phones(&combined),
        emails: extract_emails(&combined),
        linkedin: extract_linkedin(&combined),
        other_links: extract_other_links(&combined),
        name: extract_signature_name(signature),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_block_after_sign_off() {
        let body = "Hello,\nPlease find my CV attached.\n\nBest regards,\nMaria Lopez\n+34 612 345 678";
        assert_eq!(split_signature(body), "Best regards,\nMaria Lopez\n+34 612 345 678");
        assert_eq!(extract_signature_name(&split_signature(body)), "Maria Lopez");
    }

    #[test]
    fn signature_delimiter_wins_over_sign_off() {
        let body = "Thanks,\nsee below\n-- \nAna Ruiz\nana@ruiz.dev\nThanks\n";
        assert_eq!(split_signature(body), "-- \nAna Ruiz\nana@ruiz.dev\nThanks");
        assert_eq!(split_signature("no sign-off here"), "");
    }

    #[test]
    fn name_from_header_lines() {
        let text = "RESUME\njohn.smith@example.com\nJohn A. Smith\nSoftware Engineer";
        assert_eq!(extract_name(text), "John A. Smith");
    }

    #[test]
    fn all_caps_name_is_title_cased() {
        assert_eq!(extract_name("PRIYA K. NAIR\nCivil Engineer"), "Priya K. Nair");
        assert_eq!(extract_name("SEAN O'BRIEN"), "Sean O'Brien");
    }

    #[test]
    fn name_skips_phone_and_keyword_lines() {
        let text = "Curriculum Vitae\n+91 98765 43210\nContact Details\nMaria Lopez";
        assert_eq!(extract_name(text), "Maria Lopez");
        assert_eq!(extract_name("john smith\nengineer"), "");
        assert_eq!(extract_name(""), "");
    }

    #[test]
    fn emails_are_deduplicated_and_capped() {
        let text = "a@x.com b@x.com a@x.com c@x.org d@x.net";
        assert_eq!(extract_emails(text), vec!["a@x.com", "b@x.com", "c@x.org"]);
    }

    #[test]
    fn phones_keep_formatting_and_skip_overlaps() {
        let phones = extract_phones("Call +1 415-555-0100 or (212) 555-0199");
        assert_eq!(phones, vec!["+1 415-555-0100", "(212) 555-0199"]);

        let phones = extract_phones("Mobile: +91  98765 43210");
        assert_eq!(phones, vec!["+91 98765 43210"]);
    }

    #[test]
    fn trailing_short_number_is_not_swallowed() {
        assert_eq!(extract_phones("Call +1 415 555 0100 12 times"), vec!["+1 415 555 0100"]);
        assert_eq!(extract_phones("+971501234567"), vec!["+971501234567"]);
        assert!(extract_phones("+44 12345 67890 12345 67890").is_empty());
    }

    #[test]
    fn phone_inside_profile_url_is_rejected() {
        assert!(extract_phones("Check my profile linkedin.com/in/1234567890").is_empty());
        assert!(extract_phones("github.com/4155550100").is_empty());
    }

    #[test]
    fn short_numbers_are_not_phones() {
        assert!(extract_phones("Order 12345 shipped 2021-03-04").is_empty());
    }

    #[test]
    fn phones_are_capped_at_three() {
        let text = "4155550100, 4155550101, 4155550102, 4155550103";
        assert_eq!(extract_phones(text).len(), MAX_PHONES);
    }

    #[test]
    fn profile_urls() {
        let text = "LinkedIn: https://www.linkedin.com/in/jane-doe | GitHub: github.com/janedoe";
        assert_eq!(
            extract_linkedin(text).as_deref(),
            Some("https://www.linkedin.com/in/jane-doe")
        );
        assert_eq!(extract_github(text).as_deref(), Some("github.com/janedoe"));
        assert_eq!(extract_linkedin("no links"), None);
    }

    #[test]
    fn portfolio_prefers_labelled_url() {
        assert_eq!(
            extract_portfolio("Portfolio: https://janedoe.com/work.").as_deref(),
            Some("https://janedoe.com/work")
        );
        assert_eq!(
            extract_portfolio("see behance.net/janedoe for renders").as_deref(),
            Some("behance.net/janedoe")
        );
        assert_eq!(extract_portfolio("mail jane@doe.dev"), None);
    }

    #[test]
    fn email_variant_reads_body_and_signature() {
        let body = "LinkedIn https://www.linkedin.com/in/jane, site https://janedoe.dev/cv.\nLooking forward to hearing from you.";
        let signature = "Best regards,\nJane Doe\n+971 50 123 4567";
        let contact = extract_from_email(body, signature);

        assert_eq!(contact.name, "Jane Doe");
        assert_eq!(contact.phones, vec!["+971 50 123 4567"]);
        assert_eq!(
            contact.linkedin.as_deref(),
            Some("https://www.linkedin.com/in/jane")
        );
        assert_eq!(contact.other_links, vec!["https://janedoe.dev/cv"]);
    }

    #[test]
    fn signature_name_needs_two_to_four_words() {
        assert_eq!(extract_signature_name("Thanks\nJane\n"), "");
        assert_eq!(extract_signature_name("--\nMary-Jane O'Neil"), "Mary-Jane O'Neil");
        assert_eq!(extract_signature_name(""), "");
    }
}
