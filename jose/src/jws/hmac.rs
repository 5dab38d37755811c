use jwx_primitives::{Hash, hmac_sign, hmac_verify};
use zeroize::Zeroizing;

use crate::jwa::Algorithm;
use crate::jwk::{Jwk, KeyType, SymmetricKeyJwk};
use crate::jws::SignatureAlgorithm;
use crate::jws::algorithm::check_jwk;
use crate::{Error, Result};

/// HMAC with SHA-2 (`HS256`, `HS384`, `HS512`).
///
/// The key must be at least as long as the hash output.
#[derive(Clone, Debug)]
pub struct Hmac {
    alg: Algorithm,
    hash: Hash,
    key: Zeroizing<Vec<u8>>,
    key_id: Option<String>,
}

impl Hmac {
    /// Create the algorithm from a shared secret.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedAlgorithm`] when `alg` is not an HMAC
    /// algorithm and [`Error::InvalidKey`] when the key is too short.
    pub fn new(alg: Algorithm, key: &[u8]) -> Result<Self> {
        let hash = match alg {
            Algorithm::Hs256 => Hash::Sha256,
            Algorithm::Hs384 => Hash::Sha384,
            Algorithm::Hs512 => Hash::Sha512,
            _ => return Err(Error::UnsupportedAlgorithm(format!("{alg} is not HMAC"))),
        };
        if key.len() < hash.output_len() {
            return Err(Error::InvalidKey(format!(
                "{alg} requires a key of at least {} bytes",
                hash.output_len()
            )));
        }

        Ok(Self {
            alg,
            hash,
            key: Zeroizing::new(key.to_vec()),
            key_id: None,
        })
    }

    /// Create the algorithm from an `oct` JWK.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when the JWK is not a usable symmetric
    /// key for `alg`.
    pub fn from_jwk(alg: Algorithm, jwk: &Jwk) -> Result<Self> {
        check_jwk(jwk, KeyType::Oct, alg)?;
        let key = SymmetricKeyJwk::try_from(jwk)?;
        let mut hmac = Self::new(alg, key.key())?;
        hmac.key_id = jwk.key_id().map(ToString::to_string);
        Ok(hmac)
    }
}

impl SignatureAlgorithm for Hmac {
    fn identifier(&self) -> Algorithm {
        self.alg
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        hmac_sign(self.hash, &self.key, message).map_err(|e| Error::Crypto(e.to_string()))
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool> {
        hmac_verify(self.hash, &self.key, message, signature)
            .map_err(|e| Error::Crypto(e.to_string()))
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }
}
