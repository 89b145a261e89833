//! Credential records produced by the auth config parser
//!
//! Instances store credentials as free text in one of several historical
//! encodings. The parser (in `opsdeck-core`) turns that text into a
//! [`CredentialSet`]; the client factory then selects one [`AuthScheme`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which encoding the raw credential text was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEncoding {
    /// Empty input.
    Empty,
    /// JSON object of `{ "<scheme>": { "config_value": "..." } }` entries.
    Structured,
    /// Comma separated `key:value` pairs.
    Delimited,
}

/// Value half of a credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "raw", rename_all = "snake_case")]
pub enum CredentialValue {
    /// Opaque text used as-is.
    Plain(String),
    /// Raw JSON object text, left undecoded for the consumer.
    Nested(String),
}

impl CredentialValue {
    /// Classify raw text: anything whose trimmed form opens with `{` is nested.
    pub fn classify(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.trim_start().starts_with('{') {
            Self::Nested(raw)
        } else {
            Self::Plain(raw)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(raw) | Self::Nested(raw) => raw,
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, Self::Nested(_))
    }
}

/// One credential entry: a scheme key and its scheme-specific value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub key: String,
    pub value: CredentialValue,
}

impl CredentialRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: CredentialValue::classify(value) }
    }
}

/// Scheme name to credential record mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    encoding: AuthEncoding,
    records: HashMap<String, CredentialRecord>,
}

impl CredentialSet {
    pub fn new(encoding: AuthEncoding) -> Self {
        Self { encoding, records: HashMap::new() }
    }

    pub fn empty() -> Self {
        Self::new(AuthEncoding::Empty)
    }

    pub fn encoding(&self) -> AuthEncoding {
        self.encoding
    }

    /// Insert a record under `scheme`, replacing any earlier one.
    pub fn insert(&mut self, scheme: impl Into<String>, record: CredentialRecord) {
        self.records.insert(scheme.into(), record);
    }

    pub fn get(&self, scheme: &str) -> Option<&CredentialRecord> {
        self.records.get(scheme)
    }

    /// Look up a scheme tolerating case and `_`/`-` spelling differences, so
    /// `apiKey`, `api-key` and `api_key` all resolve to the same scheme.
    /// Exact matches win over normalised ones.
    pub fn find_scheme(&self, scheme: &str) -> Option<(&str, &CredentialRecord)> {
        if let Some((name, record)) = self.records.get_key_value(scheme) {
            return Some((name.as_str(), record));
        }

        let wanted = normalize_scheme(scheme);
        let mut matches: Vec<_> = self
            .records
            .iter()
            .filter(|(name, _)| normalize_scheme(name) == wanted)
            .collect();
        // Deterministic pick when several spellings are present.
        matches.sort_by(|a, b| a.0.cmp(b.0));
        matches.into_iter().next().map(|(name, record)| (name.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CredentialRecord)> {
        self.records.iter().map(|(name, record)| (name.as_str(), record))
    }
}

impl Default for CredentialSet {
    fn default() -> Self {
        Self::empty()
    }
}

fn normalize_scheme(name: &str) -> String {
    name.chars().filter(|c| *c != '_' && *c != '-').flat_map(char::to_lowercase).collect()
}

/// The single authentication scheme applied to an outgoing client.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthScheme {
    Basic { username: String, password: String },
    ApiKey(String),
}

impl AuthScheme {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::ApiKey(_) => "api_key",
        }
    }
}

impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::ApiKey(_) => f.debug_tuple("ApiKey").field(&"<redacted>").finish(),
        }
    }
}
