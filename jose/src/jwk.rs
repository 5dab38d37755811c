//! # JSON Web Key (JWK)
//!
//! A JWK ([RFC7517]) is a JSON object that represents a cryptographic key.
//! [`Jwk`] keeps the parameters of the object in their original order; the
//! typed views ([`SymmetricKeyJwk`], [`RsaPublicKeyJwk`],
//! [`RsaPrivateKeyJwk`], [`EcPublicKeyJwk`], [`EcPrivateKeyJwk`],
//! [`OkpPublicKeyJwk`] and [`OkpPrivateKeyJwk`]) check that the parameters
//! required by a key type are present and decode the key material.
//!
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517

mod ec;
mod rsa;
mod symmetric;

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

pub(crate) use self::ec::{decode_curve_key, encode_curve_key};
pub use self::ec::{EcPrivateKeyJwk, EcPublicKeyJwk, OkpPrivateKeyJwk, OkpPublicKeyJwk};
pub use self::rsa::{RsaPrivateKeyJwk, RsaPublicKeyJwk};
pub use self::symmetric::SymmetricKeyJwk;
use crate::{Error, Result, base64url};

/// Parameters that hold private or secret key material.
const PRIVATE_PARAMETERS: [&str; 8] = ["d", "p", "q", "dp", "dq", "qi", "oth", "k"];

/// Cryptographic key type (`kty`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyType {
    /// Octet sequence (symmetric key).
    Oct,

    /// RSA key pair.
    Rsa,

    /// Elliptic curve key pair.
    Ec,

    /// Octet key pair (Edwards and Montgomery curves).
    Okp,
}

impl KeyType {
    const ALL: [Self; 4] = [Self::Oct, Self::Rsa, Self::Ec, Self::Okp];

    /// The registered `kty` value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Oct => "oct",
            Self::Rsa => "RSA",
            Self::Ec => "EC",
            Self::Okp => "OKP",
        }
    }

    // Members used to compute the RFC 7638 thumbprint, in lexicographic order.
    const fn thumbprint_members(self) -> &'static [&'static str] {
        match self {
            Self::Oct => &["k", "kty"],
            Self::Rsa => &["e", "kty", "n"],
            Self::Ec => &["crv", "kty", "x", "y"],
            Self::Okp => &["crv", "kty", "x"],
        }
    }
}

impl Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kty| kty.as_str() == s)
            .ok_or_else(|| Error::InvalidKey(format!("unsupported key type: {s}")))
    }
}

/// A JSON Web Key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Jwk {
    params: Map<String, Value>,
}

impl Jwk {
    /// Parse a JWK from its JSON representation.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when the input is not a JSON object and
    /// [`Error::InvalidKey`] when it has no `kty`.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Create a JWK from a JSON value.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when the value is not a JSON object and
    /// [`Error::InvalidKey`] when it has no `kty`.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(params) = value else {
            return Err(Error::Format("JWK must be a JSON object".into()));
        };
        Self::try_from(params)
    }

    /// Serialize the JWK to JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.params.clone()).to_string()
    }

    /// The JWK as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.params.clone())
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

    /// Return a copy of the JWK with the parameter added (or replaced).
    #[must_use]
    pub fn with_parameter(&self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut params = self.params.clone();
        params.insert(name.into(), value.into());
        Self { params }
    }

    /// Return a copy of the JWK with a key ID.
    #[must_use]
    pub fn with_key_id(&self, kid: impl Into<String>) -> Self {
        self.with_parameter("kid", kid.into())
    }

    /// The key type.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when `kty` is not a supported key type.
    pub fn key_type(&self) -> Result<KeyType> {
        self.get_str("kty").unwrap_or_default().parse()
    }

    /// The key ID (`kid`).
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.get_str("kid")
    }

    /// The intended algorithm (`alg`).
    #[must_use]
    pub fn algorithm(&self) -> Option<&str> {
        self.get_str("alg")
    }

    /// The intended use (`use`).
    #[must_use]
    pub fn key_use(&self) -> Option<&str> {
        self.get_str("use")
    }

    /// Whether the JWK holds private (or secret) key material.
    #[must_use]
    pub fn is_private(&self) -> bool {
        PRIVATE_PARAMETERS.iter().any(|name| self.has(name))
    }

    /// A copy of the JWK without private key material.
    ///
    /// # Errors
    /// Returns [`Error::NotPermitted`] for symmetric keys, which have no
    /// public part.
    pub fn to_public(&self) -> Result<Self> {
        if self.key_type()? == KeyType::Oct {
            return Err(Error::NotPermitted("symmetric keys have no public part".into()));
        }
        let mut params = self.params.clone();
        params.retain(|name, _| !PRIVATE_PARAMETERS.contains(&name.as_str()));
        Ok(Self { params })
    }

    /// The JWK SHA-256 thumbprint ([RFC7638]), base64url encoded.
    ///
    /// [RFC7638]: https://www.rfc-editor.org/rfc/rfc7638
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when a required member is missing.
    pub fn thumbprint(&self) -> Result<String> {
        let mut members = Map::new();
        for name in self.key_type()?.thumbprint_members() {
            let value = self.required(name)?;
            members.insert((*name).to_string(), value.clone());
        }
        let digest = Sha256::digest(Value::Object(members).to_string().as_bytes());
        Ok(base64url::encode(digest))
    }

    /// Check the JWK is usable with `alg` when it declares an algorithm.
    pub(crate) fn check_algorithm(&self, alg: &str) -> Result<()> {
        match self.algorithm() {
            Some(declared) if declared != alg => Err(Error::InvalidKey(format!(
                "key is for `{declared}`, not `{alg}`"
            ))),
            _ => Ok(()),
        }
    }

    pub(crate) fn check_key_type(&self, kty: KeyType) -> Result<()> {
        let actual = self.key_type()?;
        if actual != kty {
            return Err(Error::InvalidKey(format!("expected `{kty}` key, found `{actual}`")));
        }
        Ok(())
    }

    pub(crate) fn required(&self, name: &str) -> Result<&Value> {
        self.get(name).ok_or_else(|| Error::InvalidKey(format!("missing `{name}` parameter")))
    }

    pub(crate) fn required_str(&self, name: &str) -> Result<&str> {
        self.required(name)?
            .as_str()
            .ok_or_else(|| Error::InvalidKey(format!("`{name}` must be a string")))
    }

    pub(crate) fn required_bytes(&self, name: &str) -> Result<Vec<u8>> {
        base64url::decode(self.required_str(name)?)
    }
}

impl TryFrom<Map<String, Value>> for Jwk {
    type Error = Error;

    fn try_from(params: Map<String, Value>) -> Result<Self> {
        if !params.get("kty").is_some_and(Value::is_string) {
            return Err(Error::InvalidKey("missing `kty` parameter".into()));
        }
        Ok(Self { params })
    }
}

impl From<Jwk> for Map<String, Value> {
    fn from(jwk: Jwk) -> Self {
        jwk.params
    }
}

impl FromStr for Jwk {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}

impl Display for Jwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

/// A JWK Set: `{"keys": [...]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    /// The keys in the set.
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Create a set from a list of keys.
    #[must_use]
    pub const fn new(keys: Vec<Jwk>) -> Self {
        Self { keys }
    }

    /// Parse a JWK Set from JSON.
    ///
    /// # Errors
    /// Returns [`Error::Format`] for malformed JSON or when a member key has
    /// no `kty`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the set to JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::json!({ "keys": self.keys }).to_string()
    }

    /// Find a key by its key ID.
    #[must_use]
    pub fn by_key_id(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|jwk| jwk.key_id() == Some(kid))
    }

    /// The first key in the set.
    #[must_use]
    pub fn first(&self) -> Option<&Jwk> {
        self.keys.first()
    }

    /// Number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
