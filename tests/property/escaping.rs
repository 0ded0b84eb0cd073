//! Property-based tests for shell and HTML escaping

use llamarelay::escape::{escape_for_html, escape_for_shell, QUOTE_SUBSTITUTE};
use proptest::prelude::*;

/// Shell escaping removes every double quote and changes nothing else
#[test]
fn test_shell_escape_replaces_only_quotes() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&any::<String>(), |text| {
            let escaped = escape_for_shell(&text);
            prop_assert!(!escaped.contains('"'));
            prop_assert_eq!(escaped.chars().count(), text.chars().count());

            for (before, after) in text.chars().zip(escaped.chars()) {
                if before == '"' {
                    prop_assert_eq!(after, QUOTE_SUBSTITUTE);
                } else {
                    prop_assert_eq!(after, before);
                }
            }
            Ok(())
        })
        .unwrap();
}

/// HTML escaping leaves no raw angle brackets and is undone by decoding
#[test]
fn test_html_escape_is_reversible() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&any::<String>(), |text| {
            let escaped = escape_for_html(&text);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('>'));

            let decoded = escaped
                .replace("&lt;", "<")
                .replace("&gt;", ">")
                .replace("&amp;", "&");
            prop_assert_eq!(decoded, text);
            Ok(())
        })
        .unwrap();
}
