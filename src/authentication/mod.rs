use std::time::Duration;

use log::debug;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::ApiClientError;

mod session;

pub use session::Session;

/// Path of the login endpoint, relative to the API base URL.
pub const LOGIN_PATH: &str = "/auth/login";

/// Account credentials for the registrar. They are sent to the login endpoint
/// on every call; nothing is cached between calls.
#[derive(Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Credentials {
    email: String,
    password: String,
}

/// The body of a login request. The registrar expects a `token` field, which
/// is always empty for password logins.
#[derive(serde::Serialize)]
struct LoginPayload<'a> {
    email: &'a str,
    password: &'a str,
    token: &'a str,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// The serialized login payload.
    pub fn payload(&self) -> String {
        serde_json::to_string(&LoginPayload {
            email: &self.email,
            password: &self.password,
            token: "",
        })
        .unwrap_or_default()
    }

    /// Strings that must never reach a log in plaintext: the account email,
    /// the password, and the serialized login payload.
    pub fn secrets(&self) -> Vec<String> {
        vec![self.payload(), self.email.clone(), self.password.clone()]
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"********")
            .finish()
    }
}

/// Logs in to the registrar by posting the serialized login payload to
/// `base_url + LOGIN_PATH`, and captures the session from the response.
///
/// Only transport failures are errors here: the login body is opaque and is
/// not inspected for a failure message.
pub fn login(
    http_client: &reqwest::blocking::Client,
    base_url: &Url,
    payload: &str,
    timeout: Duration,
) -> Result<Session, ApiClientError> {
    let url = endpoint_url(base_url, LOGIN_PATH);
    debug!("Logging in at {url}");
    let response = http_client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(payload.to_owned())
        .timeout(timeout)
        .send()?;
    debug!("Login answered with status {}", response.status());
    Ok(Session::from_response(response)?)
}

/// Appends an endpoint path to the base URL. The base may carry a path of its
/// own (e.g. a mock server mounted under a prefix), so this is a textual join
/// rather than `Url::join`, which would replace that path.
pub(crate) fn endpoint_url(base_url: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::{Credentials, endpoint_url};

    #[test]
    fn payload_has_empty_token() {
        let credentials = Credentials::new("me@example.am", "hunter2");
        let payload: serde_json::Value = serde_json::from_str(&credentials.payload()).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({"email": "me@example.am", "password": "hunter2", "token": ""})
        );
    }

    #[test]
    fn debug_masks_password() {
        let credentials = Credentials::new("me@example.am", "hunter2");
        let text = format!("{credentials:?}");
        assert!(text.contains("me@example.am"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn secrets_cover_all_credential_forms() {
        let credentials = Credentials::new("me@example.am", "hunter2");
        let secrets = credentials.secrets();
        assert!(secrets.contains(&"hunter2".to_owned()));
        assert!(secrets.contains(&"me@example.am".to_owned()));
        assert!(secrets.contains(&credentials.payload()));
    }

    #[test]
    fn endpoint_url_joins_slashes() {
        let base = Url::parse("https://api.name.am").unwrap();
        assert_eq!(
            endpoint_url(&base, "/client/domains"),
            "https://api.name.am/client/domains"
        );
        let prefixed = Url::parse("http://127.0.0.1:1234/mock/").unwrap();
        assert_eq!(
            endpoint_url(&prefixed, "/auth/login"),
            "http://127.0.0.1:1234/mock/auth/login"
        );
    }
}
