use jwx_primitives::{Curve, PublicKey, SecretKey};

use crate::jwa::Algorithm;
use crate::jwk::{Jwk, KeyType, OkpPrivateKeyJwk, OkpPublicKeyJwk};
use crate::jws::SignatureAlgorithm;
use crate::jws::algorithm::check_jwk;
use crate::{Error, Result};

/// Edwards-curve signatures with Ed25519 (`EdDSA`, [RFC8037]).
///
/// [RFC8037]: https://www.rfc-editor.org/rfc/rfc8037
#[derive(Clone, Debug)]
pub struct EdDsa {
    public: PublicKey,
    secret: Option<SecretKey>,
    key_id: Option<String>,
}

impl EdDsa {
    /// Create a signing (and verifying) algorithm from a secret key.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when the key is not an Ed25519 key.
    pub fn from_secret_key(key: SecretKey) -> Result<Self> {
        let public = key.public_key().map_err(|e| Error::InvalidKey(e.to_string()))?;
        let mut algorithm = Self::from_public_key(public)?;
        algorithm.secret = Some(key);
        Ok(algorithm)
    }

    /// Create a verifying algorithm from a public key.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when the key is not an Ed25519 key.
    pub fn from_public_key(key: PublicKey) -> Result<Self> {
        if key.curve() != Curve::Ed25519 {
            return Err(Error::InvalidKey("EdDSA requires an Ed25519 key".into()));
        }
        Ok(Self {
            public: key,
            secret: None,
            key_id: None,
        })
    }

    /// Create the algorithm from an `OKP` JWK.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when the JWK is not an Ed25519 key.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
        check_jwk(jwk, KeyType::Okp, Algorithm::EdDsa)?;
        let mut algorithm = if jwk.has("d") {
            let key = OkpPrivateKeyJwk::try_from(jwk)?;
            Self::from_secret_key(key.secret_key().clone())?
        } else {
            let key = OkpPublicKeyJwk::try_from(jwk)?;
            Self::from_public_key(key.public_key().clone())?
        };
        algorithm.key_id = jwk.key_id().map(ToString::to_string);
        Ok(algorithm)
    }
}

impl SignatureAlgorithm for EdDsa {
    fn identifier(&self) -> Algorithm {
        Algorithm::EdDsa
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let Some(secret) = &self.secret else {
            return Err(Error::NotPermitted("signing requires a private key".into()));
        };
        secret.try_sign(message).map_err(|e| Error::Crypto(e.to_string()))
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool> {
        Ok(self.public.verify(message, signature).is_ok())
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }
}
