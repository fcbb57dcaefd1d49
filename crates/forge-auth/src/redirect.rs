//! One-time identity payloads carried on the OAuth callback URL.
//!
//! The proxy finishes Google sign-in by redirecting back to the client with
//! `?user=<url-encoded JSON>&token=<jwt>` (or `?error=<reason>`). Whoever reads
//! the payload must strip it from the location straight away so that going
//! back, reloading, or sharing the link cannot replay the sign-in.

use forge_api::AuthUser;
use parking_lot::Mutex;
use url::Url;

use crate::error::Error;
use crate::identity::Session;

/// The current client location, replaceable in place (no new history entry).
pub trait Location: Send + Sync {
    fn href(&self) -> Url;
    fn replace(&self, url: Url);
}

/// A [`Location`] held in memory: the launch URL of a desktop client, or the
/// URL captured by a local OAuth callback listener.
#[derive(Debug)]
pub struct MemoryLocation {
    url: Mutex<Url>,
}

impl MemoryLocation {
    pub fn new(url: Url) -> Self {
        Self {
            url: Mutex::new(url),
        }
    }

    pub fn parse(input: &str) -> Result<Self, Error> {
        let url = Url::parse(input).map_err(|err| Error::Other(format!("invalid url: {err}")))?;
        Ok(Self::new(url))
    }
}

impl Location for MemoryLocation {
    fn href(&self) -> Url {
        self.url.lock().clone()
    }

    fn replace(&self, url: Url) {
        *self.url.lock() = url;
    }
}

/// What a callback URL carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectPayload {
    Session(Session),
    Rejected(String),
}

/// Read and strip the redirect payload from `location`.
///
/// Returns `Ok(None)` when the URL carries none. A malformed payload is still
/// stripped before the error is returned.
pub fn take_redirect_payload(location: &dyn Location) -> Result<Option<RedirectPayload>, Error> {
    let url = location.href();

    let mut user = None;
    let mut token = None;
    let mut error = None;
    let mut kept: Vec<(String, String)> = Vec::new();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "user" => user = Some(value.into_owned()),
            "token" => token = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => kept.push((key.into_owned(), value.into_owned())),
        }
    }

    if user.is_none() && token.is_none() && error.is_none() {
        return Ok(None);
    }

    location.replace(strip_query(url, &kept));

    if let Some(reason) = error {
        return Ok(Some(RedirectPayload::Rejected(reason)));
    }

    let user = user.ok_or_else(|| {
        Error::InvalidRedirectPayload("token present without a user record".to_string())
    })?;
    let mut parsed: AuthUser = serde_json::from_str(&user)
        .map_err(|err| Error::InvalidRedirectPayload(err.to_string()))?;
    if let Some(token) = token
        && !token.is_empty()
    {
        parsed.token = token;
    }
    if parsed.token.is_empty() {
        return Err(Error::InvalidRedirectPayload(
            "redirect payload is missing a token".to_string(),
        ));
    }

    Ok(Some(RedirectPayload::Session(parsed.into())))
}

fn strip_query(mut url: Url, kept: &[(String, String)]) -> Url {
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback_url(user_json: &str, token: &str) -> String {
        let mut url = Url::parse("http://127.0.0.1:5173/?tab=photo").expect("base url");
        url.query_pairs_mut()
            .append_pair("user", user_json)
            .append_pair("token", token);
        url.to_string()
    }

    #[test]
    fn payload_is_consumed_and_other_params_survive() {
        let location = MemoryLocation::parse(&callback_url(
            r#"{"_id":"u7","name":"Grace","email":"grace@example.com","token":"jwt-7"}"#,
            "jwt-7",
        ))
        .expect("location");

        let session = match take_redirect_payload(&location).expect("parse payload") {
            Some(RedirectPayload::Session(session)) => session,
            other => panic!("expected a session payload, got {other:?}"),
        };
        assert_eq!(session.identity.id, "u7");
        assert_eq!(session.token, "jwt-7");
        assert_eq!(location.href().as_str(), "http://127.0.0.1:5173/?tab=photo");

        assert_eq!(take_redirect_payload(&location).expect("second read"), None);
    }

    #[test]
    fn error_param_is_reported_and_stripped() {
        let location =
            MemoryLocation::parse("http://127.0.0.1:5173/?error=google-auth-failed").expect("loc");

        assert_eq!(
            take_redirect_payload(&location).expect("parse"),
            Some(RedirectPayload::Rejected("google-auth-failed".to_string()))
        );
        assert_eq!(location.href().query(), None);
    }

    #[test]
    fn malformed_user_is_stripped_before_failing() {
        let location = MemoryLocation::parse(&callback_url("{not json", "t")).expect("loc");

        assert!(matches!(
            take_redirect_payload(&location),
            Err(Error::InvalidRedirectPayload(_))
        ));
        assert_eq!(location.href().query(), Some("tab=photo"));
        assert_eq!(take_redirect_payload(&location).expect("second read"), None);
    }
}
