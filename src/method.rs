use std::{convert::TryFrom, fmt::Display};

const GET: &str = "GET";
const POST: &str = "POST";
const PUT: &str = "PUT";

#[derive(
    Debug, Default, PartialEq, Eq, Clone, Copy, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
/// The HTTP methods used against the registrar API. Reads use GET, purchases
/// and checks use POST, and updates to a domain use PUT. POST is the default
/// for an operation call.
pub enum Method {
    Get,
    #[default]
    Post,
    Put,
}

impl Method {
    /// Returns a static str reference naming the current method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => GET,
            Method::Post => POST,
            Method::Put => PUT,
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        }
    }
}

impl Display for Method {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Method {
    type Error = InvalidMethodError;

    /// Converts the given string reference to a Method, if possible.
    /// The comparison is case insensitive, but superfluous whitespace will
    /// always result in an error.
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.len() {
            3 if s.eq_ignore_ascii_case(GET) => Ok(Self::Get),
            3 if s.eq_ignore_ascii_case(PUT) => Ok(Self::Put),
            4 if s.eq_ignore_ascii_case(POST) => Ok(Self::Post),
            _ => Err(InvalidMethodError(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Method {
    type Error = InvalidMethodError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        <Method as TryFrom<&str>>::try_from(&s)
    }
}

/// Error type returned from `Method::try_from(_: &str)` if the given string
/// does not name a supported method.
#[derive(Debug, Clone)]
pub struct InvalidMethodError(String);

impl Display for InvalidMethodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid method: {}", self.0)
    }
}

impl std::error::Error for InvalidMethodError {}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::Method;

    #[test]
    fn default_is_post() {
        assert_eq!(Method::default(), Method::Post);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Method::try_from("put").unwrap(), Method::Put);
        assert_eq!(Method::try_from("Get").unwrap(), Method::Get);
        assert!(Method::try_from(" GET").is_err());
        assert!(Method::try_from("TRACE").is_err());
        assert!(Method::try_from("DELETE").is_err());
    }

    #[test]
    fn converts_to_reqwest() {
        assert_eq!(reqwest::Method::from(Method::Put), reqwest::Method::PUT);
        assert_eq!(Method::Get.to_string(), "GET");
    }
}
