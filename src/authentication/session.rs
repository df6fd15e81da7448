use cookie_store::RawCookie;
use itertools::Itertools;
use reqwest::header::{AUTHORIZATION, COOKIE, HeaderMap, SET_COOKIE};
use serde_json::Value;

/// The session artifact produced by logging in. It lives exactly as long as
/// the client call that created it and is never written to disk.
///
/// The registrar hands out its session as a cookie, and some deployments also
/// return a token in the login body. Both are captured here and attached
/// explicitly to the operation request, so continuity does not depend on a
/// cookie jar matching paths between `/auth/login` and `/client/...`.
#[derive(Clone, Default)]
pub struct Session {
    decoded: Value,
    cookies: Vec<(String, String)>,
    bearer: Option<String>,
}

impl Session {
    /// Captures the cookies and body of a login response.
    pub fn from_response(response: reqwest::blocking::Response) -> Result<Self, reqwest::Error> {
        let cookies = extract_cookies(response.headers());
        let raw = response.text()?;
        Ok(Self::from_parts(&raw, cookies))
    }

    pub(crate) fn from_parts(raw: &str, cookies: Vec<(String, String)>) -> Self {
        // A login body that is not JSON is not an error; it only lacks the
        // optional fields.
        let decoded = serde_json::from_str(raw).unwrap_or(Value::Null);
        let bearer = ["token", "accessToken"]
            .iter()
            .filter_map(|key| decoded.get(*key).and_then(Value::as_str))
            .find(|token| !token.is_empty())
            .map(str::to_owned);
        Self {
            decoded,
            cookies,
            bearer,
        }
    }

    /// Value of a top-level field of the login response, or null.
    pub fn field(&self, key: &str) -> &Value {
        self.decoded.get(key).unwrap_or(&crate::client::NULL)
    }

    /// Headers that carry this session on a follow-up request.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if !self.cookies.is_empty() {
            let cookie_line = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .join("; ");
            if let Ok(value) = cookie_line.parse() {
                headers.insert(COOKIE, value);
            }
        }
        if let Some(token) = &self.bearer {
            if let Ok(value) = format!("Bearer {token}").parse() {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field(
                "cookies",
                &self.cookies.iter().map(|(name, _)| name).collect_vec(),
            )
            .field("bearer", &self.bearer.as_ref().map(|_| "********"))
            .finish()
    }
}

/// Collects the name and value of every `Set-Cookie` header, dropping the
/// cookie attributes. Headers that do not parse as a cookie are skipped.
fn extract_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|header_value| header_value.to_str().ok())
        .filter_map(|cookie_data| RawCookie::parse(cookie_data).ok())
        .map(|cookie| (cookie.name().to_owned(), cookie.value().to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use reqwest::header::{AUTHORIZATION, COOKIE, HeaderMap, HeaderValue, SET_COOKIE};

    use super::{Session, extract_cookies};

    #[test]
    fn cookies_drop_attributes() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("sid=abc123; Path=/auth; HttpOnly"),
        );
        headers.append(SET_COOKIE, HeaderValue::from_static("lang=hy"));
        assert_eq!(
            extract_cookies(&headers),
            vec![
                ("sid".to_owned(), "abc123".to_owned()),
                ("lang".to_owned(), "hy".to_owned())
            ]
        );
    }

    #[test]
    fn cookie_values_may_contain_equals() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("data=a=b; Secure"));
        assert_eq!(
            extract_cookies(&headers),
            vec![("data".to_owned(), "a=b".to_owned())]
        );
    }

    #[test]
    fn malformed_set_cookie_is_skipped() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("no-equals-sign"));
        headers.append(SET_COOKIE, HeaderValue::from_static("sid=1"));
        assert_eq!(
            extract_cookies(&headers),
            vec![("sid".to_owned(), "1".to_owned())]
        );
    }

    #[test]
    fn bearer_token_from_body() {
        let session = Session::from_parts(r#"{"token":"t0k","balance":1500}"#, vec![]);
        assert_eq!(session.field("balance"), &serde_json::json!(1500));
        assert_eq!(
            session.headers().get(AUTHORIZATION).unwrap(),
            "Bearer t0k"
        );
    }

    #[test]
    fn empty_token_is_ignored() {
        let session = Session::from_parts(
            r#"{"token":"","accessToken":"xyz"}"#,
            vec![("sid".to_owned(), "1".to_owned()), ("u".to_owned(), "2".to_owned())],
        );
        assert_eq!(session.headers().get(AUTHORIZATION).unwrap(), "Bearer xyz");
        assert_eq!(session.headers().get(COOKIE).unwrap(), "sid=1; u=2");
    }

    #[test]
    fn non_json_login_body_has_no_fields() {
        let session = Session::from_parts("OK", vec![]);
        assert!(session.field("balance").is_null());
        assert!(session.headers().is_empty());
    }

    #[test]
    fn debug_hides_secrets() {
        let session = Session::from_parts(
            r#"{"token":"secret-token"}"#,
            vec![("sid".to_owned(), "secret-cookie".to_owned())],
        );
        let text = format!("{session:?}");
        assert!(!text.contains("secret-token"));
        assert!(!text.contains("secret-cookie"));
        assert!(text.contains("sid"));
    }
}
