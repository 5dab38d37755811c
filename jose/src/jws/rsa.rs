use jwx_primitives::{
    Hash, PublicKeyParts, RsaPrivateKey, RsaPublicKey, RsaSignaturePadding, rsa_sign, rsa_verify,
};

use crate::jwa::Algorithm;
use crate::jwk::{Jwk, KeyType, RsaPrivateKeyJwk, RsaPublicKeyJwk};
use crate::jws::SignatureAlgorithm;
use crate::jws::algorithm::check_jwk;
use crate::{Error, Result};

/// Smallest RSA modulus accepted for signing or verification.
pub const MIN_RSA_BITS: usize = 2048;

/// RSASSA-PKCS1-v1_5 (`RS256`, `RS384`, `RS512`) and RSASSA-PSS (`PS256`,
/// `PS384`, `PS512`).
///
/// Created from a public key the algorithm can only verify.
#[derive(Clone, Debug)]
pub struct RsaSignature {
    alg: Algorithm,
    padding: RsaSignaturePadding,
    hash: Hash,
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
    key_id: Option<String>,
}

impl RsaSignature {
    /// Create a signing (and verifying) algorithm from a private key.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedAlgorithm`] when `alg` is not an RSA
    /// signature algorithm and [`Error::InvalidKey`] for a modulus under
    /// 2048 bits.
    pub fn from_private_key(alg: Algorithm, key: RsaPrivateKey) -> Result<Self> {
        let mut algorithm = Self::from_public_key(alg, key.to_public_key())?;
        algorithm.private = Some(key);
        Ok(algorithm)
    }

    /// Create a verifying algorithm from a public key.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedAlgorithm`] when `alg` is not an RSA
    /// signature algorithm and [`Error::InvalidKey`] for a modulus under
    /// 2048 bits.
    pub fn from_public_key(alg: Algorithm, key: RsaPublicKey) -> Result<Self> {
        let (padding, hash) = match alg {
            Algorithm::Rs256 => (RsaSignaturePadding::Pkcs1v15, Hash::Sha256),
            Algorithm::Rs384 => (RsaSignaturePadding::Pkcs1v15, Hash::Sha384),
            Algorithm::Rs512 => (RsaSignaturePadding::Pkcs1v15, Hash::Sha512),
            Algorithm::Ps256 => (RsaSignaturePadding::Pss, Hash::Sha256),
            Algorithm::Ps384 => (RsaSignaturePadding::Pss, Hash::Sha384),
            Algorithm::Ps512 => (RsaSignaturePadding::Pss, Hash::Sha512),
            _ => return Err(Error::UnsupportedAlgorithm(format!("{alg} is not RSA"))),
        };
        if key.size() * 8 < MIN_RSA_BITS {
            return Err(Error::InvalidKey(format!(
                "{alg} requires a modulus of at least {MIN_RSA_BITS} bits"
            )));
        }

        Ok(Self {
            alg,
            padding,
            hash,
            public: key,
            private: None,
            key_id: None,
        })
    }

    /// Create the algorithm from an `RSA` JWK. A JWK holding private key
    /// parameters gives an algorithm that can sign.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when the JWK is not a usable RSA key for
    /// `alg`.
    pub fn from_jwk(alg: Algorithm, jwk: &Jwk) -> Result<Self> {
        check_jwk(jwk, KeyType::Rsa, alg)?;
        let mut algorithm = if jwk.has("d") {
            let key = RsaPrivateKeyJwk::try_from(jwk)?;
            Self::from_private_key(alg, key.private_key().clone())?
        } else {
            let key = RsaPublicKeyJwk::try_from(jwk)?;
            Self::from_public_key(alg, key.public_key().clone())?
        };
        algorithm.key_id = jwk.key_id().map(ToString::to_string);
        Ok(algorithm)
    }
}

impl SignatureAlgorithm for RsaSignature {
    fn identifier(&self) -> Algorithm {
        self.alg
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let Some(private) = &self.private else {
            return Err(Error::NotPermitted("signing requires a private key".into()));
        };
        rsa_sign(self.padding, self.hash, private, message)
            .map_err(|e| Error::Crypto(e.to_string()))
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool> {
        Ok(rsa_verify(self.padding, self.hash, &self.public, message, signature).is_ok())
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }
}
