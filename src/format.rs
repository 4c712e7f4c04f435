//! Small text helpers shared by the check-run and comment builders.

use std::sync::OnceLock;

use regex::Regex;

/// Appended when text is cut short.
pub const ELLIPSIS: &str = "…";

static ANSI_REGEX: OnceLock<Regex> = OnceLock::new();

fn ansi_regex() -> &'static Regex {
    // CSI sequences (colors, cursor movement) and OSC sequences (hyperlinks,
    // titles) terminated by BEL or ST.
    ANSI_REGEX.get_or_init(|| {
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)")
            .expect("ansi regex")
    })
}

/// Remove terminal color and control escape sequences.
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    ansi_regex().replace_all(text, "").into_owned()
}

/// Wrap text in a markdown code fence.
#[must_use]
pub fn code_fence(text: &str) -> String {
    format!("```\n{}\n```", text.trim_end())
}

/// Keep at most `limit` characters from the start of `text`, appending
/// [`ELLIPSIS`] when anything was dropped.
#[must_use]
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Keep the last characters of `text` so the result, including a leading
/// [`ELLIPSIS`], is at most `width` characters long.
#[must_use]
pub fn truncate_left(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(ELLIPSIS.chars().count());
    let tail: String = text.chars().skip(len - keep).collect();
    format!("{ELLIPSIS}{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_fence() {
        assert_eq!(code_fence("hello"), "```\nhello\n```");
    }

    #[test]
    fn test_code_fence_trims_trailing_whitespace() {
        assert_eq!(code_fence("hello\n\n  "), "```\nhello\n```");
    }

    #[test]
    fn test_strip_ansi_colors() {
        let colored = "\x1b[31mexpect(\x1b[39m\x1b[1mreceived\x1b[22m).toBe(2)";
        assert_eq!(strip_ansi(colored), "expect(received).toBe(2)");
    }

    #[test]
    fn test_strip_ansi_hyperlink() {
        let linked = "\x1b]8;;file:///a.js\x07a.js\x1b]8;;\x07";
        assert_eq!(strip_ansi(linked), "a.js");
    }

    #[test]
    fn test_strip_ansi_plain_text_unchanged() {
        assert_eq!(strip_ansi("nothing to strip"), "nothing to strip");
    }

    #[test]
    fn test_truncate_at_limit_unchanged() {
        let text = "a".repeat(60_000);
        assert_eq!(truncate(&text, 60_000), text);
    }

    #[test]
    fn test_truncate_over_limit() {
        let text = "a".repeat(60_001);
        let out = truncate(&text, 60_000);
        assert_eq!(out.chars().count(), 60_001);
        assert!(out.ends_with(ELLIPSIS));
        assert_eq!(&out[..60_000], "a".repeat(60_000));
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("héllo", 2), "hé…");
        assert_eq!(truncate("héllo", 5), "héllo");
    }

    #[test]
    fn test_truncate_left() {
        assert_eq!(truncate_left("src/short", 50), "src/short");
        let long = format!("{}/leaf", "x".repeat(60));
        let out = truncate_left(&long, 50);
        assert_eq!(out.chars().count(), 50);
        assert!(out.starts_with('…'));
        assert!(out.ends_with("/leaf"));
    }
}
