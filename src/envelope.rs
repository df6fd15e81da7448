use serde::Serialize;

use crate::authentication::Credentials;

/// The two parts of a registrar call: the credentials for the login request
/// and the body of the operation request. An envelope is built for a single
/// call and has no identity beyond it.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    credentials: Credentials,
    operation: Option<String>,
}

impl RequestEnvelope {
    /// An envelope for an operation without a request body (most reads).
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            operation: None,
        }
    }

    /// An envelope whose operation body is `payload` serialized as JSON.
    pub fn with_payload<T: Serialize + ?Sized>(
        credentials: Credentials,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            credentials,
            operation: Some(serde_json::to_string(payload)?),
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The serialized login payload.
    pub fn authentication(&self) -> String {
        self.credentials.payload()
    }

    /// The serialized operation body, if any.
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::RequestEnvelope;
    use crate::authentication::Credentials;

    #[test]
    fn operation_body_is_serialized_once() {
        let envelope = RequestEnvelope::with_payload(
            Credentials::new("me@example.am", "pw"),
            &json!({"transferLock": true}),
        )
        .unwrap();
        assert_eq!(envelope.operation(), Some(r#"{"transferLock":true}"#));
        assert!(envelope.authentication().contains("\"token\":\"\""));
    }

    #[test]
    fn reads_have_no_body() {
        let envelope = RequestEnvelope::new(Credentials::new("me@example.am", "pw"));
        assert_eq!(envelope.operation(), None);
    }
}
