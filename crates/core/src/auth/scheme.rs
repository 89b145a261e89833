//! Credential scheme selection
//!
//! A client is configured with exactly one authentication scheme. When a
//! credential set carries several, the first entry of
//! [`CREDENTIAL_SCHEME_PRECEDENCE`] that is present and usable wins, so the
//! outcome never depends on map iteration order.

use opsdeck_domain::constants::CREDENTIAL_SCHEME_PRECEDENCE;
use opsdeck_domain::{AuthScheme, CredentialRecord, CredentialSet};
use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct BasicPayload {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Pick the authentication scheme to apply, if any.
pub fn select_auth_scheme(credentials: &CredentialSet) -> Option<AuthScheme> {
    for scheme in CREDENTIAL_SCHEME_PRECEDENCE {
        let Some((name, record)) = credentials.find_scheme(scheme) else {
            continue;
        };

        let resolved = match scheme {
            "basic" => basic_from_record(name, record),
            "api_key" => api_key_from_record(record),
            _ => None,
        };

        match resolved {
            Some(auth) => return Some(auth),
            None => debug!(scheme = name, "credential scheme present but unusable, skipping"),
        }
    }

    None
}

/// Decode basic credentials.
///
/// - JSON object value: `username` / `password` fields.
/// - Record key names a user (anything other than the scheme label): key is
///   the username, value the password.
/// - Record key is the scheme label itself: value is `user[:password]`.
fn basic_from_record(scheme_name: &str, record: &CredentialRecord) -> Option<AuthScheme> {
    let value = record.value.as_str();

    let (username, password) = if record.value.is_nested() {
        let payload: BasicPayload = serde_json::from_str(value).ok()?;
        (payload.username, payload.password)
    } else if record.key != scheme_name {
        (record.key.clone(), value.to_string())
    } else {
        match value.split_once(':') {
            Some((user, pass)) => (user.to_string(), pass.to_string()),
            None => (value.to_string(), String::new()),
        }
    };

    if username.trim().is_empty() {
        return None;
    }

    Some(AuthScheme::Basic { username, password })
}

fn api_key_from_record(record: &CredentialRecord) -> Option<AuthScheme> {
    let value = record.value.as_str();
    if value.is_empty() {
        return None;
    }
    Some(AuthScheme::ApiKey(value.to_string()))
}
