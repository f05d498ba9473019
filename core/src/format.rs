use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BOLD: Regex = Regex::new(r"\*\*(.*?)\*\*").unwrap();
    static ref ITALIC: Regex = Regex::new(r"\*(.*?)\*").unwrap();
    static ref LEFTOVER_MARKERS: Regex = Regex::new(r"[`*]").unwrap();
}

/// Converts model text into the markup shown for a reply.
///
/// Bold and italic markers are rewritten first so the symbol stripping that
/// follows only removes markers left unpaired.
pub fn to_markup(text: &str) -> String {
    let bolded = BOLD.replace_all(text, "<b>${1}</b>");
    let italicized = ITALIC.replace_all(&bolded, "<i>${1}</i>");
    let stripped = LEFTOVER_MARKERS.replace_all(&italicized, "");
    stripped.replace('\n', "<br>").trim().to_string()
}

/// Markup for a reply, substituting `fallback` when the model gave nothing usable
pub fn format_reply(text: Option<&str>, fallback: &str) -> String {
    let markup = text.map(to_markup).unwrap_or_default();
    if markup.is_empty() {
        fallback.to_string()
    } else {
        markup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FALLBACK_REPLY;

    #[test]
    fn test_bold_italic_and_line_breaks() {
        assert_eq!(
            to_markup("**bold** and *italic*\nline2"),
            "<b>bold</b> and <i>italic</i><br>line2"
        );
    }

    #[test]
    fn test_plain_text_only_trimmed() {
        assert_eq!(to_markup("  plain answer, no markers.  "), "plain answer, no markers.");
    }

    #[test]
    fn test_leftover_markers_are_stripped() {
        assert_eq!(to_markup("use `cargo` here"), "use cargo here");
        assert_eq!(to_markup("a lone * star"), "a lone  star");
    }

    #[test]
    fn test_markers_do_not_span_lines() {
        assert_eq!(to_markup("*one\ntwo*"), "one<br>two");
    }

    #[test]
    fn test_fallback_for_missing_or_blank_text() {
        assert_eq!(format_reply(None, DEFAULT_FALLBACK_REPLY), DEFAULT_FALLBACK_REPLY);
        assert_eq!(format_reply(Some("  "), DEFAULT_FALLBACK_REPLY), DEFAULT_FALLBACK_REPLY);
        assert_eq!(format_reply(Some("``"), DEFAULT_FALLBACK_REPLY), DEFAULT_FALLBACK_REPLY);
        assert_eq!(format_reply(Some("ok"), DEFAULT_FALLBACK_REPLY), "ok");
    }
}
