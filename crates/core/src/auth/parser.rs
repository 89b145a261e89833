//! Auth config parser
//!
//! Stored credential text comes in several historical encodings:
//!
//! 1. Structured JSON: `{"basic": {"config_value": "..."}, ...}`
//! 2. Delimited pairs: `apiKey:abc123,basic:{"username":"u","password":"p"}`
//!
//! Parsing never fails. Input that matches neither encoding yields an empty or
//! partial [`CredentialSet`] so a malformed credential cannot block startup or
//! a client lookup for an otherwise healthy instance.

use std::collections::HashMap;

use opsdeck_domain::{AuthEncoding, CredentialRecord, CredentialSet};
use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct StructuredEntry {
    config_value: String,
}

/// Parse raw credential text into a credential set.
///
/// The structured JSON encoding is tried first and, when it matches, is
/// returned as-is even if it holds no entries. Otherwise the text is split
/// into comma separated `key:value` segments (commas nested in brackets or
/// quotes do not split) and each segment is split on its first colon.
pub fn parse_auth_config(raw: &str) -> CredentialSet {
    if raw.trim().is_empty() {
        return CredentialSet::empty();
    }

    if let Some(set) = parse_structured(raw) {
        return set;
    }

    parse_delimited(raw)
}

fn parse_structured(raw: &str) -> Option<CredentialSet> {
    let entries: HashMap<String, StructuredEntry> = serde_json::from_str(raw).ok()?;

    let mut set = CredentialSet::new(AuthEncoding::Structured);
    for (scheme, entry) in entries {
        let record = CredentialRecord::new(scheme.clone(), entry.config_value);
        set.insert(scheme, record);
    }
    Some(set)
}

fn parse_delimited(raw: &str) -> CredentialSet {
    let mut set = CredentialSet::new(AuthEncoding::Delimited);
    let mut discarded = 0usize;

    for segment in split_top_level(raw) {
        let Some((key, value)) = segment.split_once(':') else {
            if !segment.trim().is_empty() {
                discarded += 1;
            }
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            discarded += 1;
            continue;
        }

        // Nested objects are stored raw; CredentialRecord::new tags them.
        set.insert(key, CredentialRecord::new(key, value.trim()));
    }

    if discarded > 0 {
        debug!(discarded, kept = set.len(), "ignored malformed credential segments");
    }

    set
}

/// Split on commas that sit outside any `{}`, `[]`, `()` pair and outside
/// double quotes. Unbalanced brackets keep the remainder in one segment.
fn split_top_level(raw: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut closers: Vec<char> = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (idx, ch) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            _ if in_quotes => {}
            '{' => closers.push('}'),
            '[' => closers.push(']'),
            '(' => closers.push(')'),
            '}' | ']' | ')' => {
                if closers.last() == Some(&ch) {
                    closers.pop();
                }
            }
            ',' if closers.is_empty() => {
                segments.push(&raw[start..idx]);
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }

    segments.push(&raw[start..]);
    segments
}
