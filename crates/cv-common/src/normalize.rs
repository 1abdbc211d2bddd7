use once_cell::sync::Lazy;
use regex::Regex;

static RE_CRLF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n?").unwrap());

// 行頭の箇条書き記号（連続していても全部剥がす）
static RE_BULLETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[^\S\n]*(?:[•●○■□▪▫–—→›][^\S\n]*)+").unwrap());

static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

static RE_TRAILING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m) +$").unwrap());

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// 本文テキストの正規化（パターンマッチ前の共通前処理）
///
/// 契約:
/// 1. CRLF / CR を LF に揃える
/// 2. 行頭の箇条書き記号（•●○■□▪▫–—→›）を後続の空白ごと除去
/// 3. 改行以外の空白の連続を半角スペース1つにまとめ、行末の空白は落とす
/// 4. 3 行以上の改行は空行 1 つ（`\n\n`）にまとめる。改行そのものは消さない
/// 5. 全体を trim。空入力は空文字を返す
///
/// `normalize(normalize(x)) == normalize(x)` が常に成り立つ。
pub fn normalize_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let unified = RE_CRLF.replace_all(text, "\n");
    let unbulleted = RE_BULLETS.replace_all(&unified, "");
    let collapsed = RE_HSPACE.replace_all(&unbulleted, " ");
    let trimmed_lines = RE_TRAILING.replace_all(&collapsed, "");
    let paragraphs = RE_BLANK_RUN.replace_all(&trimmed_lines, "\n\n");

    paragraphs.trim().to_string()
}

/// `text[start..]` から最大 `max_chars` 文字ぶんの部分文字列（UTF-8 境界安全）
pub(crate) fn window_after(text: &str, start: usize, max_chars: usize) -> &str {
    let tail = &text[start..];
    match tail.char_indices().nth(max_chars) {
        Some((idx, _)) => &tail[..idx],
        None => tail,
    }
}

/// マッチ位置 `[start, end)` の前後 `radius` 文字を含む文脈ウィンドウ
pub(crate) fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(radius.saturating_sub(1))
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let from = if radius == 0 { start } else { from };

    let to = end + window_after(text, end, radius).len();
    &text[from..to]
}

/// 先頭 `max_chars` 文字に切り詰める
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
