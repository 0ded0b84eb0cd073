//! Result formatting: turns a generation outcome into Telegram HTML.

use crate::config::Misconfiguration;
use crate::error::EngineError;
use crate::escape::escape_for_html;
use std::time::Duration;

/// Render a parameter list as `[a b c]`.
pub fn format_params(params: &[String]) -> String {
    format!("[{}]", params.join(" "))
}

/// Render a duration as `<seconds>.<millis>` with three millisecond digits.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    format!("{}.{:03}", millis / 1000, millis % 1000)
}

/// Generated text in a preformatted block, followed by the model and timing line.
pub fn format_success(generated: &str, model_name: &str, elapsed: Duration) -> String {
    format!(
        "<pre><code>\n{}\n</code></pre>\n\n{}",
        escape_for_html(generated),
        generation_info(model_name, elapsed)
    )
}

fn generation_info(model_name: &str, elapsed: Duration) -> String {
    format!(
        "<em>(request was processed by <strong>{}</strong> in {} seconds)</em>",
        model_name,
        format_elapsed(elapsed)
    )
}

/// Error line for a failed invocation, carrying prompt and parameters verbatim.
///
/// Only the error text is HTML-escaped. A prompt template containing markup
/// such as `</s>` yields a reply Telegram refuses to parse.
pub fn format_failure(prompt: &str, params: &[String], error: &EngineError) -> String {
    format!(
        "Failed to generate from prompt '{}' and parameters: {}: <em>{}</em>",
        prompt,
        format_params(params),
        escape_for_html(&error.to_string())
    )
}

/// Reply for a model that cannot be run.
pub fn format_misconfiguration(misconfiguration: &Misconfiguration) -> String {
    format!("Error: {}", escape_for_html(&misconfiguration.to_string()))
}
