pub mod download;
pub mod edit;
pub mod health;
pub mod pages;
pub mod upload;

use crate::api::error::ApiError;
use crate::save::converter::SaveConverter;
use crate::save::error::ConvertError;
use serde::de::IgnoredAny;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

/// Validates JSON text and re-indents it with two spaces per level.
///
/// Only whitespace changes. Key order, string escapes and number lexemes stay as
/// written, so integers wider than 64 bits and out-of-range exponents survive.
pub fn pretty_json(text: &str) -> Result<String, serde_json::Error> {
    serde_json::from_str::<IgnoredAny>(text)?;
    Ok(reindent(text))
}

/// Lays out well-formed JSON the same way `serde_json::to_string_pretty` does.
fn reindent(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut depth = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                out.push(c);
                copy_string_tail(&mut chars, &mut out);
            }
            '{' | '[' => {
                out.push(c);
                skip_whitespace(&mut chars);
                if let Some(close) = chars.next_if(|next| matches!(*next, '}' | ']')) {
                    out.push(close);
                } else {
                    depth += 1;
                    push_newline(&mut out, depth);
                }
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                push_newline(&mut out, depth);
                out.push(c);
            }
            ',' => {
                out.push(c);
                push_newline(&mut out, depth);
            }
            ':' => out.push_str(": "),
            c if c.is_ascii_whitespace() => {}
            c => out.push(c),
        }
    }
    out
}

/// Copies a string literal up to and including its closing quote.
fn copy_string_tail(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '\\' => out.extend(chars.next()),
            '"' => return,
            _ => {}
        }
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_ascii_whitespace()).is_some() {}
}

fn push_newline(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// Runs a CPU-bound conversion off the async workers.
async fn run_conversion<T, F>(
    converter: &Arc<dyn SaveConverter>,
    job: F,
) -> Result<Result<T, ConvertError>, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn SaveConverter) -> Result<T, ConvertError> + Send + 'static,
{
    let converter = Arc::clone(converter);
    tokio::task::spawn_blocking(move || job(&*converter))
        .await
        .map_err(|error| {
            ApiError::Internal(anyhow::anyhow!("conversion task failed: {}", error))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_json_uses_two_space_indent() {
        assert_eq!(
            pretty_json("{\"hello\":\"world\"}").unwrap(),
            "{\n  \"hello\": \"world\"\n}"
        );
    }

    #[test]
    fn pretty_json_keeps_key_order_and_unicode() {
        let pretty = pretty_json("{\"z\":1,\"a\":\"ツ\"}").unwrap();
        assert_eq!(pretty, "{\n  \"z\": 1,\n  \"a\": \"ツ\"\n}");
    }

    #[test]
    fn pretty_json_rejects_malformed_input() {
        assert!(pretty_json("{oops").is_err());
        assert!(pretty_json("").is_err());
        assert!(pretty_json("[1, 2").is_err());
        assert!(pretty_json("{} trailing").is_err());
    }

    #[test]
    fn pretty_json_keeps_number_text() {
        let pretty = pretty_json(
            "{\"id\":123456789012345678901234567890,\"huge\":1e400,\"z\":-444.07928466796875}",
        )
        .unwrap();
        assert_eq!(
            pretty,
            "{\n  \"id\": 123456789012345678901234567890,\n  \"huge\": 1e400,\n  \"z\": -444.07928466796875\n}"
        );
    }

    #[test]
    fn pretty_json_handles_nesting_and_structural_characters_in_strings() {
        let pretty =
            pretty_json("{\"a\":[1,{\"b\":[ ]}],\"s\":\"x, {y}: \\\"q\\\"\",\"e\":{}}").unwrap();
        assert_eq!(
            pretty,
            "{\n  \"a\": [\n    1,\n    {\n      \"b\": []\n    }\n  ],\n  \"s\": \"x, {y}: \\\"q\\\"\",\n  \"e\": {}\n}"
        );
    }

    #[test]
    fn pretty_json_matches_serde_json_layout() {
        let value = serde_json::json!({
            "header": {"type": "Version3", "save_game_version": 3},
            "properties": [
                {"type": "FloatProperty", "value": 0.5},
                {"type": "ArrayProperty", "values": []},
                {"type": "MapProperty", "entries": {}}
            ],
            "name": "Pal \u{30c4}",
        });
        let expected = serde_json::to_string_pretty(&value).unwrap();

        assert_eq!(pretty_json(&value.to_string()).unwrap(), expected);
        assert_eq!(pretty_json(&expected).unwrap(), expected);
    }
}
