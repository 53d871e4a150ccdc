//! Message text to display fragments
//!
//! Splits raw message text into classified lines and escapes every line so
//! no message content can be interpreted as markup. Assistant output is read
//! as semi-structured (bullets, numbered steps); user input is free text.
//!
//! The mapping from [`LineKind`] to markup lives in [`crate::ui::html`].

use once_cell::sync::Lazy;
use regex::Regex;
use shared_types::Role;

static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.").expect("numbered item pattern is valid"));

/// Classification of a single display line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    BulletPoint,
    NumberedItem,
    ParagraphBreak,
    TextLine,
}

/// A classified, escaped unit of display text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: LineKind,
    /// Already escaped; safe to place inside markup
    pub text: String,
}

impl Fragment {
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn paragraph_break() -> Self {
        Self::new(LineKind::ParagraphBreak, "")
    }
}

/// Format a message into display fragments
pub fn format_message(role: Role, text: &str) -> Vec<Fragment> {
    normalize_lines(text)
        .into_iter()
        .map(|line| classify_line(role, line))
        .collect()
}

/// Trim the message, split it into lines and collapse blank-line runs.
///
/// Every run of blank (or whitespace-only) lines becomes one empty line.
pub fn normalize_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut previous_blank = false;

    for line in text.trim().lines() {
        let blank = line.trim().is_empty();
        if blank {
            if !previous_blank {
                lines.push("");
            }
        } else {
            lines.push(line);
        }
        previous_blank = blank;
    }

    lines
}

fn classify_line(role: Role, line: &str) -> Fragment {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Fragment::paragraph_break();
    }

    if role == Role::Assistant {
        if trimmed.starts_with('-') || trimmed.starts_with('*') {
            return Fragment::new(LineKind::BulletPoint, escape_html(trimmed));
        }
        if NUMBERED_ITEM.is_match(trimmed) {
            return Fragment::new(LineKind::NumberedItem, escape_html(trimmed));
        }
    }

    Fragment::new(LineKind::TextLine, escape_html(line))
}

/// Escape `&`, `<` and `>`, ampersand first
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(fragments: &[Fragment]) -> Vec<LineKind> {
        fragments.iter().map(|f| f.kind).collect()
    }

    #[test]
    fn test_assistant_bullets_and_paragraph() {
        let fragments = format_message(
            Role::Assistant,
            "- item one\n- item two\n\nNext paragraph",
        );
        assert_eq!(
            fragments,
            vec![
                Fragment::new(LineKind::BulletPoint, "- item one"),
                Fragment::new(LineKind::BulletPoint, "- item two"),
                Fragment::paragraph_break(),
                Fragment::new(LineKind::TextLine, "Next paragraph"),
            ]
        );
    }

    #[test]
    fn test_numbered_items_are_trimmed() {
        let fragments = format_message(Role::Assistant, "Steps:\n   1. open  \n 12. close\n1x. nope");
        assert_eq!(
            fragments,
            vec![
                Fragment::new(LineKind::TextLine, "Steps:"),
                Fragment::new(LineKind::NumberedItem, "1. open"),
                Fragment::new(LineKind::NumberedItem, "12. close"),
                Fragment::new(LineKind::TextLine, "1x. nope"),
            ]
        );
    }

    #[test]
    fn test_star_bullet() {
        let fragments = format_message(Role::Assistant, "  * starred ");
        assert_eq!(fragments, vec![Fragment::new(LineKind::BulletPoint, "* starred")]);
    }

    #[test]
    fn test_user_text_never_classified_as_list() {
        let fragments = format_message(Role::User, "- not a bullet\n2. not numbered");
        assert_eq!(
            kinds(&fragments),
            vec![LineKind::TextLine, LineKind::TextLine]
        );
        assert_eq!(fragments[0].text, "- not a bullet");
    }

    #[test]
    fn test_blank_runs_collapse_to_one_break() {
        for role in [Role::User, Role::Assistant] {
            let fragments = format_message(role, "first\n\n\n\n\nsecond");
            assert_eq!(
                kinds(&fragments),
                vec![LineKind::TextLine, LineKind::ParagraphBreak, LineKind::TextLine]
            );
        }
    }

    #[test]
    fn test_whitespace_only_lines_count_as_blank() {
        let fragments = format_message(Role::Assistant, "a\n   \n\t\n \nb");
        assert_eq!(
            kinds(&fragments),
            vec![LineKind::TextLine, LineKind::ParagraphBreak, LineKind::TextLine]
        );
    }

    #[test]
    fn test_message_is_trimmed() {
        let fragments = format_message(Role::User, "\n\n  hello  \n\n");
        assert_eq!(fragments, vec![Fragment::new(LineKind::TextLine, "hello")]);
        assert!(format_message(Role::Assistant, " \n\t").is_empty());
    }

    #[test]
    fn test_crlf_lines() {
        let fragments = format_message(Role::Assistant, "- a\r\n- b");
        assert_eq!(
            fragments,
            vec![
                Fragment::new(LineKind::BulletPoint, "- a"),
                Fragment::new(LineKind::BulletPoint, "- b"),
            ]
        );
    }

    #[test]
    fn test_markup_is_escaped_in_every_kind() {
        let text = "<script>alert(1)</script>\n- a & <b>\n3. x > y\n\nplain &amp;";
        for role in [Role::User, Role::Assistant] {
            for fragment in format_message(role, text) {
                assert!(!fragment.text.contains('<'), "{fragment:?}");
                assert!(!fragment.text.contains('>'), "{fragment:?}");
                let stripped = fragment
                    .text
                    .replace("&amp;", "")
                    .replace("&lt;", "")
                    .replace("&gt;", "");
                assert!(!stripped.contains('&'), "{fragment:?}");
            }
        }
    }

    #[test]
    fn test_ampersand_escaped_first() {
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
        assert_eq!(escape_html("a<b>&c"), "a&lt;b&gt;&amp;c");
    }
}
