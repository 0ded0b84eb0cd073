//! Prompt construction: literal placeholder substitution in the model's template.

use crate::config::UsableModel;
use crate::request::TextPayload;

/// Replace every occurrence of the model's placeholder with the payload text.
///
/// No escaping happens here; the payload was sanitized for the shell when
/// the request was built.
pub fn render_prompt(model: &UsableModel<'_>, payload: &TextPayload) -> String {
    model
        .prompt_pattern
        .replace(model.placeholder, &payload.prompt_text())
}
