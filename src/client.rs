//! The registrar API client. One `call` performs a login request followed by
//! the operation request, and decodes the JSON reply.

use std::time::Duration;

use log::debug;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde_json::{Value, json};
use url::Url;

use crate::{
    audit::{AuditEntry, AuditLog, Masker},
    authentication::{self, Credentials, Session, endpoint_url},
    envelope::RequestEnvelope,
    error::ApiClientError,
    method::Method,
};

pub const DEFAULT_BASE_URL: &str = "https://api.name.am";
/// Bound on the login request.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(30);
/// Bound on the operation request. Registrations can take a while.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(100);

pub(crate) static NULL: Value = Value::Null;

/// Connection settings shared by all calls made from one configuration.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: Url,
    pub auth_timeout: Duration,
    pub request_timeout: Duration,
    /// Headers sent with both the login and the operation request.
    pub default_headers: HeaderMap,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            default_headers: HeaderMap::new(),
        }
    }
}

/// Performs authenticated calls against the registrar API and keeps the most
/// recent decoded response for `field` lookups.
///
/// A client holds no session between calls: every `call` logs in again, and
/// the session obtained is dropped when the call returns.
pub struct RegistrarApiClient<'a> {
    settings: ClientSettings,
    http_client: reqwest::blocking::Client,
    audit: &'a dyn AuditLog,
    results: Value,
}

impl<'a> RegistrarApiClient<'a> {
    pub fn new(settings: ClientSettings, audit: &'a dyn AuditLog) -> Result<Self, ApiClientError> {
        let http_client = reqwest::blocking::Client::builder()
            .default_headers(settings.default_headers.clone())
            .build()?;
        Ok(Self {
            settings,
            http_client,
            audit,
            results: Value::Null,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Logs in without performing an operation, returning the session.
    pub fn login(&self, credentials: &Credentials) -> Result<Session, ApiClientError> {
        authentication::login(
            &self.http_client,
            &self.settings.base_url,
            &credentials.payload(),
            self.settings.auth_timeout,
        )
    }

    /// Logs in with the envelope's credentials, sends the envelope's operation
    /// body to `base_url + path` using `method`, and returns the decoded reply.
    ///
    /// An empty reply decodes to null. The call fails with
    /// - `ApiClientError::Transport` if either request could not be completed;
    ///   a failed login means the operation request is never sent,
    /// - `ApiClientError::Api` if the reply carries a non-empty `message`,
    /// - `ApiClientError::Protocol` if the reply is not JSON.
    ///
    /// Every call is recorded in the audit log with the credentials masked.
    pub fn call(
        &mut self,
        path: &str,
        envelope: &RequestEnvelope,
        method: Method,
    ) -> Result<Value, ApiClientError> {
        let masker = Masker::new(envelope.credentials().secrets());
        let request = json!({
            "authentication": envelope.authentication(),
            "post_data": envelope.operation(),
        });
        let mut entry = AuditEntry {
            action: path.to_owned(),
            method,
            request: masker.mask(&request.to_string()),
            response: None,
            decoded: None,
            error: None,
        };
        self.results = Value::Null;

        let raw = match self.exchange(path, envelope, method) {
            Ok(raw) => raw,
            Err(err) => {
                entry.error = Some(masker.mask(&err.to_string()));
                self.audit.record(&entry);
                return Err(err);
            }
        };
        entry.response = Some(masker.mask(&raw));

        let outcome = decode_response(&raw).and_then(|decoded| {
            entry.decoded = Some(masker.mask(&decoded.to_string()));
            self.results = decoded;
            match failure_message(&self.results) {
                Some(message) => Err(ApiClientError::Api(message)),
                None => Ok(self.results.clone()),
            }
        });
        if let Err(err) = &outcome {
            entry.error = Some(masker.mask(&err.to_string()));
        }
        self.audit.record(&entry);
        outcome
    }

    /// The value at `key` in the most recent decoded response, or null if the
    /// key is absent or the response was not an object.
    pub fn field(&self, key: &str) -> &Value {
        self.results.get(key).unwrap_or(&NULL)
    }

    /// The most recent decoded response.
    pub fn results(&self) -> &Value {
        &self.results
    }

    fn exchange(
        &self,
        path: &str,
        envelope: &RequestEnvelope,
        method: Method,
    ) -> Result<String, ApiClientError> {
        let session = self.login(envelope.credentials())?;
        debug!("Logged in, session {session:?}");

        let url = endpoint_url(&self.settings.base_url, path);
        debug!("{method} {url}");
        let mut request = self
            .http_client
            .request(method.into(), url)
            .headers(session.headers())
            .timeout(self.settings.request_timeout);
        if let Some(body) = envelope.operation() {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_owned());
        }
        let response = request.send()?;
        debug!("{method} {path} answered with status {}", response.status());
        Ok(response.text()?)
    }
}

/// Decodes a reply body. Blank bodies are not an error here; they decode to
/// null and show up as absent fields.
pub(crate) fn decode_response(raw: &str) -> Result<Value, ApiClientError> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw).map_err(|_| ApiClientError::Protocol)
}

/// The registrar signals failure through a `message` field. Values that are
/// empty or falsy do not count as a message.
fn failure_message(decoded: &Value) -> Option<String> {
    match decoded.get("message")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.is_empty() => None,
        Value::String(message) => Some(message.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(fields) if fields.is_empty() => None,
        other => Some(other.to_string()),
    }
}
