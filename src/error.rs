use std::{error::Error, fmt::Display};

/// The broad class of a transport failure, derived from the underlying
/// `reqwest::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The request or the response body did not complete within the timeout.
    Timeout,
    /// No connection could be made: DNS failure, refused connection, TLS
    /// handshake failure.
    Connect,
    /// Too many redirects, or a redirect loop.
    Redirect,
    /// The response body could not be read.
    Body,
    /// The request could not be built or sent for another reason.
    Request,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Redirect => "redirect",
            Self::Body => "body",
            Self::Request => "request",
        }
    }
}

impl Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ApiClientError is returned by `RegistrarApiClient::call` when a call does
/// not yield a decoded response. Every variant is terminal for the call: the
/// client never retries.
#[derive(Debug)]
pub enum ApiClientError {
    /// The HTTP layer failed before a response was received, on either the
    /// login or the operation request. If the login failed, the operation
    /// request was never sent.
    Transport { kind: TransportKind, message: String },

    /// The registrar answered, but flagged the operation as failed by putting
    /// a non-empty `message` in its reply. The message is carried verbatim.
    /// The HTTP status code does not matter.
    Api(String),

    /// The registrar answered with a body that is not JSON.
    Protocol,
}

impl From<reqwest::Error> for ApiClientError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_connect() {
            TransportKind::Connect
        } else if err.is_redirect() {
            TransportKind::Redirect
        } else if err.is_body() || err.is_decode() {
            TransportKind::Body
        } else {
            TransportKind::Request
        };
        // The Display of reqwest::Error omits the cause, which is usually the
        // interesting part (e.g. "Connection refused").
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Transport { kind, message }
    }
}

impl Display for ApiClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { kind, message } => {
                write!(f, "Connection error ({kind}): {message}")
            }
            Self::Api(message) => f.write_str(message),
            Self::Protocol => f.write_str("Bad response received from API"),
        }
    }
}

impl Error for ApiClientError {}
