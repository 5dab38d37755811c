use jwx_primitives::{Curve, PublicKey, SecretKey};

use crate::jwa::Algorithm;
use crate::jwk::{EcPrivateKeyJwk, EcPublicKeyJwk, Jwk, KeyType};
use crate::jws::SignatureAlgorithm;
use crate::jws::algorithm::check_jwk;
use crate::{Error, Result};

/// ECDSA (`ES256`, `ES384`, `ES512`, `ES256K`).
///
/// Signatures are the fixed-size concatenation `r || s`.
#[derive(Clone, Debug)]
pub struct Ecdsa {
    alg: Algorithm,
    public: PublicKey,
    secret: Option<SecretKey>,
    key_id: Option<String>,
}

impl Ecdsa {
    /// Create a signing (and verifying) algorithm from a secret key.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when the key is not on the algorithm's
    /// curve.
    pub fn from_secret_key(alg: Algorithm, key: SecretKey) -> Result<Self> {
        let public = key.public_key().map_err(|e| Error::InvalidKey(e.to_string()))?;
        let mut algorithm = Self::from_public_key(alg, public)?;
        algorithm.secret = Some(key);
        Ok(algorithm)
    }

    /// Create a verifying algorithm from a public key.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedAlgorithm`] when `alg` is not ECDSA and
    /// [`Error::InvalidKey`] when the key is not on the algorithm's curve.
    pub fn from_public_key(alg: Algorithm, key: PublicKey) -> Result<Self> {
        let curve = curve(alg)?;
        if key.curve() != curve {
            return Err(Error::InvalidKey(format!("{alg} requires a {curve} key")));
        }
        Ok(Self {
            alg,
            public: key,
            secret: None,
            key_id: None,
        })
    }

    /// Create the algorithm from an `EC` JWK. A JWK with `d` gives an
    /// algorithm that can sign.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when the JWK is not a usable key for
    /// `alg`.
    pub fn from_jwk(alg: Algorithm, jwk: &Jwk) -> Result<Self> {
        check_jwk(jwk, KeyType::Ec, alg)?;
        let mut algorithm = if jwk.has("d") {
            let key = EcPrivateKeyJwk::try_from(jwk)?;
            Self::from_secret_key(alg, key.secret_key().clone())?
        } else {
            let key = EcPublicKeyJwk::try_from(jwk)?;
            Self::from_public_key(alg, key.public_key().clone())?
        };
        algorithm.key_id = jwk.key_id().map(ToString::to_string);
        Ok(algorithm)
    }
}

// The curve (and so digest) of each ECDSA algorithm.
fn curve(alg: Algorithm) -> Result<Curve> {
    match alg {
        Algorithm::Es256 => Ok(Curve::P256),
        Algorithm::Es384 => Ok(Curve::P384),
        Algorithm::Es512 => Ok(Curve::P521),
        Algorithm::Es256K => Ok(Curve::Es256K),
        _ => Err(Error::UnsupportedAlgorithm(format!("{alg} is not ECDSA"))),
    }
}

impl SignatureAlgorithm for Ecdsa {
    fn identifier(&self) -> Algorithm {
        self.alg
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let Some(secret) = &self.secret else {
            return Err(Error::NotPermitted("signing requires a private key".into()));
        };
        secret.try_sign(message).map_err(|e| Error::Crypto(e.to_string()))
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool> {
        if signature.len() != 2 * self.public.curve().coordinate_len() {
            return Ok(false);
        }
        Ok(self.public.verify(message, signature).is_ok())
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn curve_must_match() {
        let key = Curve::P384.generate();
        assert!(Ecdsa::from_secret_key(Algorithm::Es384, key.clone()).is_ok());
        assert!(matches!(Ecdsa::from_secret_key(Algorithm::Es256, key), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn verify_only() {
        let key = Curve::P256.generate();
        let signer = Ecdsa::from_secret_key(Algorithm::Es256, key.clone()).expect("should create");
        let verifier = Ecdsa::from_public_key(
            Algorithm::Es256,
            key.public_key().expect("should derive public key"),
        )
        .expect("should create");

        let signature = signer.sign(b"message").expect("should sign");
        assert!(verifier.verify(b"message", &signature).expect("should verify"));
        assert!(!verifier.verify(b"message", &signature[..63]).expect("should verify"));
        assert!(matches!(verifier.sign(b"message"), Err(Error::NotPermitted(_))));
    }
}
