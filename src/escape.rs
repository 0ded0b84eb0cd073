//! Text sanitization for the two output contexts a message passes through:
//! the engine's command line and Telegram's HTML parse mode.

/// Character substituted for every double quote in shell-bound text.
pub const QUOTE_SUBSTITUTE: char = '”';

/// Escape text for use as a quoted engine argument.
///
/// Double quotes are replaced with [`QUOTE_SUBSTITUTE`] so the text cannot
/// terminate the quoted prompt argument early.
pub fn escape_for_shell(text: &str) -> String {
    text.replace('"', &QUOTE_SUBSTITUTE.to_string())
}

/// Escape `&`, `<` and `>` for HTML parse mode.
pub fn escape_for_html(text: &str) -> String {
    // `&` goes first so the entities produced below are left intact.
    text.replace('&', "&amp;")
        .replace('>', "&gt;")
        .replace('<', "&lt;")
}
