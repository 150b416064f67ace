//! Helpers for CQ-coded chat text.

/// Undo CQ escaping: `&#91;` `[`, `&#93;` `]`, `&#44;` `,`, `&amp;` `&`.
pub fn unescape(text: &str) -> String {
    text.replace("&#91;", "[")
        .replace("&#93;", "]")
        .replace("&#44;", ",")
        .replace("&amp;", "&")
}

/// Whether `text` carries an inline image code.
pub fn has_inline_image(text: &str) -> bool {
    text.contains("[CQ:image")
}
