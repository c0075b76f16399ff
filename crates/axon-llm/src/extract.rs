//! Probing decoded payloads for text, usage, and provider errors
//!
//! Providers disagree on where they put the answer. Rather than one serde
//! struct per dialect, payloads are probed with JSON pointers in priority
//! order: the first location holding a non-empty string wins.

use serde_json::Value;

use crate::types::UsageSummary;

/// Locations of answer text, highest priority first
const CONTENT_LOCATIONS: &[&str] = &[
    "/choices/0/delta/content",
    "/choices/0/message/content",
    "/choices/0/text",
    "/message/content",
    "/output/0/content",
    "/output/0/content/0/text",
];

const USAGE: &str = "/usage";

const INPUT_TOKENS: &[&str] = &["/prompt_tokens", "/input_tokens"];
const OUTPUT_TOKENS: &[&str] = &["/completion_tokens", "/output_tokens"];
const CACHE_WRITE_TOKENS: &[&str] = &["/cache_creation_input_tokens", "/prompt_cache_miss_tokens"];
const CACHE_READ_TOKENS: &[&str] = &[
    "/cache_read_input_tokens",
    "/prompt_cache_hit_tokens",
    "/prompt_tokens_details/cached_tokens",
];

/// Answer text carried by the payload, if any
pub fn extract_content(payload: &Value) -> Option<&str> {
    CONTENT_LOCATIONS
        .iter()
        .filter_map(|pointer| payload.pointer(pointer).and_then(Value::as_str))
        .find(|text| !text.is_empty())
}

/// Token usage carried by the payload, if it has a `usage` object
///
/// Missing counters default to zero; cache counters stay unset unless the
/// provider reports one of their synonyms.
pub fn extract_usage(payload: &Value) -> Option<UsageSummary> {
    let usage = payload.pointer(USAGE).filter(|usage| usage.is_object())?;

    Some(UsageSummary {
        input_tokens: first_count(usage, INPUT_TOKENS).unwrap_or(0),
        output_tokens: first_count(usage, OUTPUT_TOKENS).unwrap_or(0),
        cache_write_tokens: first_count(usage, CACHE_WRITE_TOKENS),
        cache_read_tokens: first_count(usage, CACHE_READ_TOKENS),
    })
}

/// Message of an explicit `error` member, if the payload carries one
///
/// Accepts both `{"error": {"message": ...}}` and `{"error": "..."}`; an
/// error object without a message is reported by its JSON text.
pub fn extract_error(payload: &Value) -> Option<String> {
    let error = payload.get("error").filter(|error| !error.is_null())?;

    let message = match error {
        Value::String(message) => message.clone(),
        Value::Object(_) => error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), ToOwned::to_owned),
        other => other.to_string(),
    };

    Some(message)
}

fn first_count(usage: &Value, pointers: &[&str]) -> Option<u64> {
    pointers
        .iter()
        .find_map(|pointer| usage.pointer(pointer).and_then(Value::as_u64))
}
