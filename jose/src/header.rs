//! # JOSE Header
//!
//! The JOSE header is the JSON object describing how a JWS or JWE is
//! secured. [`Header`] keeps parameters in the order they were added or
//! parsed, so a received header re-encodes to the same JSON.
//!
//! Registered parameters ([RFC7515] §4.1, [RFC7516] §4.1, [RFC7518] §4.6,
//! §4.7 and §4.8) are checked against their value kind when a header is
//! parsed. Unregistered (private) parameters pass through unchanged.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use std::fmt::{self, Display};
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result, base64url};

/// `typ` and `cty` value identifying a JWT.
pub const CONTENT_TYPE_JWT: &str = "JWT";

/// The kind of value a registered header parameter holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterKind {
    /// A JSON string.
    String,

    /// A base64url encoded octet sequence.
    Base64Url,

    /// A non-negative JSON integer.
    Integer,

    /// A JSON object.
    Object,

    /// A JSON array.
    Array,
}

impl ParameterKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Base64Url => value.as_str().is_some_and(base64url::is_valid),
            Self::Integer => value.is_u64(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

const REGISTERED: [(&str, ParameterKind); 20] = [
    ("alg", ParameterKind::String),
    ("enc", ParameterKind::String),
    ("zip", ParameterKind::String),
    ("jku", ParameterKind::String),
    ("jwk", ParameterKind::Object),
    ("kid", ParameterKind::String),
    ("x5u", ParameterKind::String),
    ("x5c", ParameterKind::Array),
    ("x5t", ParameterKind::Base64Url),
    ("x5t#S256", ParameterKind::Base64Url),
    ("typ", ParameterKind::String),
    ("cty", ParameterKind::String),
    ("crit", ParameterKind::Array),
    ("epk", ParameterKind::Object),
    ("apu", ParameterKind::Base64Url),
    ("apv", ParameterKind::Base64Url),
    ("iv", ParameterKind::Base64Url),
    ("tag", ParameterKind::Base64Url),
    ("p2s", ParameterKind::Base64Url),
    ("p2c", ParameterKind::Integer),
];

/// The value kind of a registered header parameter, or `None` for
/// unregistered parameters.
#[must_use]
pub fn parameter_kind(name: &str) -> Option<ParameterKind> {
    REGISTERED.iter().find(|(registered, _)| *registered == name).map(|(_, kind)| *kind)
}

/// A JOSE header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Header {
    params: Map<String, Value>,
}

impl Header {
    /// Create an empty header.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a header from JSON.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when the input is not a JSON object or a
    /// registered parameter has a value of the wrong kind.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(params) = value else {
            return Err(Error::Format("header must be a JSON object".into()));
        };
        Self::try_from(params)
    }

    /// Parse a header from its base64url encoded JSON, as found in a compact
    /// serialization.
    ///
    /// # Errors
    /// Returns [`Error::Format`] for invalid base64url or an invalid header.
    pub fn from_b64url(encoded: &str) -> Result<Self> {
        let decoded = base64url::decode(encoded)?;
        let json = std::str::from_utf8(&decoded)
            .map_err(|e| Error::Format(format!("header is not UTF-8: {e}")))?;
        Self::from_json(json)
    }

    /// Serialize the header to JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.params.clone()).to_string()
    }

    /// Serialize the header to base64url encoded JSON.
    #[must_use]
    pub fn to_b64url(&self) -> String {
        base64url::encode(self.to_json())
    }

    /// Get a parameter value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Get a string parameter value.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// Whether the parameter is present.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Iterate over parameters in order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.params.iter()
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the header has no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Return a copy of the header with the parameter added (or replaced).
    #[must_use]
    pub fn with_parameter(&self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut params = self.params.clone();
        params.insert(name.into(), value.into());
        Self { params }
    }

    /// Return a copy of the header with all parameters of `other` added.
    /// Where both headers have a parameter, the value from `other` is kept.
    #[must_use]
    pub fn with_parameters(&self, other: &Self) -> Self {
        let mut params = self.params.clone();
        for (name, value) in &other.params {
            params.insert(name.clone(), value.clone());
        }
        Self { params }
    }

    /// Combine two headers that must not share a parameter.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when a parameter is present in both.
    pub fn merge(&self, other: &Self) -> Result<Self> {
        if let Some(name) = other.params.keys().find(|name| self.has(name)) {
            return Err(Error::Format(format!("duplicate header parameter `{name}`")));
        }
        Ok(self.with_parameters(other))
    }

    /// The algorithm (`alg`).
    #[must_use]
    pub fn algorithm(&self) -> Option<&str> {
        self.get_str("alg")
    }

    /// The content encryption algorithm (`enc`).
    #[must_use]
    pub fn encryption_algorithm(&self) -> Option<&str> {
        self.get_str("enc")
    }

    /// The compression algorithm (`zip`).
    #[must_use]
    pub fn compression_algorithm(&self) -> Option<&str> {
        self.get_str("zip")
    }

    /// The content type (`cty`).
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.get_str("cty")
    }

    /// The media type (`typ`).
    #[must_use]
    pub fn type_(&self) -> Option<&str> {
        self.get_str("typ")
    }

    /// The key ID (`kid`).
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.get_str("kid")
    }

    /// Reject headers carrying critical extensions. No extension parameters
    /// are understood, so any `crit` makes the header unprocessable.
    pub(crate) fn check_critical(&self) -> Result<()> {
        match self.get("crit") {
            Some(crit) => Err(Error::Format(format!("unsupported critical parameters: {crit}"))),
            None => Ok(()),
        }
    }

    pub(crate) fn required_str(&self, name: &str) -> Result<&str> {
        self.get_str(name).ok_or_else(|| Error::Format(format!("missing `{name}` header")))
    }

    /// Decode an optional base64url parameter.
    pub(crate) fn bytes(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.get_str(name).map(base64url::decode).transpose()
    }

    pub(crate) fn required_bytes(&self, name: &str) -> Result<Vec<u8>> {
        base64url::decode(self.required_str(name)?)
    }
}

impl TryFrom<Map<String, Value>> for Header {
    type Error = Error;

    fn try_from(params: Map<String, Value>) -> Result<Self> {
        for (name, value) in &params {
            if let Some(kind) = parameter_kind(name)
                && !kind.matches(value)
            {
                return Err(Error::Format(format!("header `{name}` must be {kind:?}")));
            }
        }
        Ok(Self { params })
    }
}

impl From<Header> for Map<String, Value> {
    fn from(header: Header) -> Self {
        header.params
    }
}

impl FromStr for Header {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

/// The JOSE header of a JWS or JWE: the protected header and, optionally, an
/// unprotected header, read through a single merged view.
///
/// Compact serialization only carries the protected header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoseHeader {
    protected: Header,
    unprotected: Option<Header>,
    merged: Header,
}

impl JoseHeader {
    /// Create a JOSE header.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when a parameter appears in both headers.
    pub fn new(protected: Header, unprotected: Option<Header>) -> Result<Self> {
        let merged = match &unprotected {
            Some(unprotected) => protected.merge(unprotected)?,
            None => protected.clone(),
        };
        Ok(Self {
            protected,
            unprotected,
            merged,
        })
    }

    /// The integrity protected header.
    #[must_use]
    pub const fn protected(&self) -> &Header {
        &self.protected
    }

    /// The unprotected header, if any.
    #[must_use]
    pub const fn unprotected(&self) -> Option<&Header> {
        self.unprotected.as_ref()
    }
}

impl From<Header> for JoseHeader {
    fn from(protected: Header) -> Self {
        Self {
            merged: protected.clone(),
            protected,
            unprotected: None,
        }
    }
}

impl Deref for JoseHeader {
    type Target = Header;

    fn deref(&self) -> &Header {
        &self.merged
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parameter_kinds() {
        assert!(Header::from_json(r#"{"alg":"HS256","p2c":4096,"x-custom":[1]}"#).is_ok());
        assert!(matches!(Header::from_json(r#"{"alg":256}"#), Err(Error::Format(_))));
        assert!(matches!(Header::from_json(r#"{"p2c":"4096"}"#), Err(Error::Format(_))));
        assert!(matches!(Header::from_json(r#"{"p2c":-1}"#), Err(Error::Format(_))));
        assert!(matches!(Header::from_json(r#"{"iv":"a+b/"}"#), Err(Error::Format(_))));
        assert!(matches!(Header::from_json(r#"{"epk":"key"}"#), Err(Error::Format(_))));
        assert!(matches!(Header::from_json(r#"["alg"]"#), Err(Error::Format(_))));
    }

    #[test]
    fn order_preserved() {
        let json = r#"{"typ":"JWT","zzz":true,"alg":"HS256"}"#;
        let header = Header::from_json(json).expect("should parse");
        assert_eq!(header.to_json(), json);

        let reparsed = Header::from_b64url(&header.to_b64url()).expect("should decode");
        assert_eq!(reparsed, header);
    }

    #[test]
    fn copies() {
        let header = Header::new().with_parameter("alg", "HS256").with_parameter("kid", "a");
        let other = Header::new().with_parameter("kid", "b").with_parameter("typ", "JWT");

        let combined = header.with_parameters(&other);
        assert_eq!(combined.key_id(), Some("b"));
        assert_eq!(combined.type_(), Some("JWT"));
        assert_eq!(header.key_id(), Some("a"));

        assert!(matches!(header.merge(&other), Err(Error::Format(_))));
        let merged = header
            .merge(&Header::new().with_parameter("cty", CONTENT_TYPE_JWT))
            .expect("should merge");
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn jose_header() {
        let protected = Header::new().with_parameter("alg", "RSA-OAEP");
        let unprotected = Header::new().with_parameter("jku", "https://example.com/keys");
        let header =
            JoseHeader::new(protected.clone(), Some(unprotected)).expect("should combine");
        assert_eq!(header.algorithm(), Some("RSA-OAEP"));
        assert!(header.has("jku"));
        assert_eq!(header.protected(), &protected);

        assert!(JoseHeader::new(protected.clone(), Some(protected)).is_err());
    }

    #[test]
    fn critical() {
        let header = Header::from_json(r#"{"alg":"HS256","crit":["exp"],"exp":1}"#)
            .expect("should parse");
        assert!(matches!(header.check_critical(), Err(Error::Format(_))));
        assert!(Header::new().check_critical().is_ok());
    }
}
