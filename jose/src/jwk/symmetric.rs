use jwx_primitives::random_bytes;
use zeroize::Zeroizing;

use crate::jwk::{Jwk, KeyType};
use crate::{Error, Result, base64url};

/// A symmetric key JWK (`kty` of `oct`).
#[derive(Clone, Debug)]
pub struct SymmetricKeyJwk {
    jwk: Jwk,
    key: Zeroizing<Vec<u8>>,
}

impl SymmetricKeyJwk {
    /// Create a JWK for the key bytes.
    #[must_use]
    pub fn from_key(key: &[u8]) -> Self {
        let jwk = Jwk {
            params: serde_json::Map::from_iter([
                ("kty".to_string(), KeyType::Oct.as_str().into()),
                ("k".to_string(), base64url::encode(key).into()),
            ]),
        };
        Self {
            jwk,
            key: Zeroizing::new(key.to_vec()),
        }
    }

    /// Generate a random key of `len` bytes.
    #[must_use]
    pub fn generate(len: usize) -> Self {
        let key = Zeroizing::new(random_bytes(len));
        Self::from_key(&key)
    }

    /// The key bytes.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The underlying JWK.
    #[must_use]
    pub const fn jwk(&self) -> &Jwk {
        &self.jwk
    }

    /// Return a copy with a key ID.
    #[must_use]
    pub fn with_key_id(&self, kid: impl Into<String>) -> Self {
        Self {
            jwk: self.jwk.with_key_id(kid),
            key: self.key.clone(),
        }
    }
}

impl TryFrom<&Jwk> for SymmetricKeyJwk {
    type Error = Error;

    fn try_from(jwk: &Jwk) -> Result<Self> {
        jwk.check_key_type(KeyType::Oct)?;
        let key = Zeroizing::new(jwk.required_bytes("k")?);
        Ok(Self {
            jwk: jwk.clone(),
            key,
        })
    }
}

impl TryFrom<Jwk> for SymmetricKeyJwk {
    type Error = Error;

    fn try_from(jwk: Jwk) -> Result<Self> {
        Self::try_from(&jwk)
    }
}

impl From<SymmetricKeyJwk> for Jwk {
    fn from(key: SymmetricKeyJwk) -> Self {
        key.jwk
    }
}
