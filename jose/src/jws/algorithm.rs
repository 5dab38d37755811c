use crate::header::Header;
use crate::jwa::Algorithm;
use crate::jwk::{Jwk, KeyType};
use crate::jws::{EdDsa, Ecdsa, Hmac, RsaSignature};
use crate::{Error, Result};

/// A JWS signature (or MAC) algorithm bound to a key.
pub trait SignatureAlgorithm: Send + Sync {
    /// The registered algorithm identifier.
    fn identifier(&self) -> Algorithm;

    /// Sign (or MAC) the message.
    ///
    /// # Errors
    /// Returns [`Error::NotPermitted`] when the algorithm holds only a public
    /// key and [`Error::Crypto`] when the primitive fails.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;

    /// Check the signature over the message. A well-formed but incorrect
    /// signature yields `Ok(false)`.
    ///
    /// # Errors
    /// Returns an error when verification cannot be attempted.
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool>;

    /// The ID of the key, when known.
    fn key_id(&self) -> Option<&str> {
        None
    }

    /// Header parameters describing the algorithm: `alg`, and `kid` when the
    /// key has an ID.
    fn header_parameters(&self) -> Header {
        let header = Header::new().with_parameter("alg", self.identifier().as_str());
        match self.key_id() {
            Some(kid) => header.with_parameter("kid", kid),
            None => header,
        }
    }
}

/// Create the signature algorithm `alg` using the JWK.
///
/// The key type (and curve) must suit the algorithm, and a JWK that names an
/// algorithm can only be used with that algorithm.
///
/// # Errors
/// Returns [`Error::InvalidKey`] for an unsuitable key and
/// [`Error::NotPermitted`] for `none`, which takes no key.
pub fn signature_algorithm(alg: Algorithm, jwk: &Jwk) -> Result<Box<dyn SignatureAlgorithm>> {
    tracing::debug!(alg = %alg, kty = ?jwk.get_str("kty"), "signature_algorithm");

    let algorithm: Box<dyn SignatureAlgorithm> = match alg {
        Algorithm::Hs256 | Algorithm::Hs384 | Algorithm::Hs512 => {
            Box::new(Hmac::from_jwk(alg, jwk)?)
        }
        Algorithm::Rs256
        | Algorithm::Rs384
        | Algorithm::Rs512
        | Algorithm::Ps256
        | Algorithm::Ps384
        | Algorithm::Ps512 => Box::new(RsaSignature::from_jwk(alg, jwk)?),
        Algorithm::Es256 | Algorithm::Es384 | Algorithm::Es512 | Algorithm::Es256K => {
            Box::new(Ecdsa::from_jwk(alg, jwk)?)
        }
        Algorithm::EdDsa => Box::new(EdDsa::from_jwk(jwk)?),
        Algorithm::None => {
            return Err(Error::NotPermitted("`none` cannot be created from a key".into()));
        }
    };
    Ok(algorithm)
}

/// Check a JWK is of the expected type and, if it names one, for `alg`.
pub(super) fn check_jwk(jwk: &Jwk, kty: KeyType, alg: Algorithm) -> Result<()> {
    jwk.check_key_type(kty)?;
    jwk.check_algorithm(alg.as_str())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jwk::{EcPrivateKeyJwk, SymmetricKeyJwk};

    #[test]
    fn key_type_checked() {
        let oct = SymmetricKeyJwk::generate(64).jwk().clone();
        let ec = EcPrivateKeyJwk::generate(jwx_primitives::Curve::P256)
            .expect("should generate")
            .jwk()
            .clone();

        assert!(signature_algorithm(Algorithm::Hs512, &oct).is_ok());
        assert!(signature_algorithm(Algorithm::Es256, &ec).is_ok());

        // an EC key is not an HMAC secret, nor an RSA key
        assert!(matches!(signature_algorithm(Algorithm::Hs256, &ec), Err(Error::InvalidKey(_))));
        assert!(matches!(signature_algorithm(Algorithm::Rs256, &ec), Err(Error::InvalidKey(_))));
        assert!(matches!(signature_algorithm(Algorithm::Es384, &ec), Err(Error::InvalidKey(_))));
        assert!(matches!(signature_algorithm(Algorithm::None, &oct), Err(Error::NotPermitted(_))));
    }

    #[test]
    fn jwk_algorithm_respected() {
        let jwk = SymmetricKeyJwk::generate(64).jwk().with_parameter("alg", "HS512");
        assert!(signature_algorithm(Algorithm::Hs512, &jwk).is_ok());
        assert!(matches!(signature_algorithm(Algorithm::Hs256, &jwk), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn header_parameters() {
        let jwk = SymmetricKeyJwk::generate(32).with_key_id("hmac-key");
        let algorithm =
            signature_algorithm(Algorithm::Hs256, jwk.jwk()).expect("should create algorithm");
        let header = algorithm.header_parameters();
        assert_eq!(header.to_json(), r#"{"alg":"HS256","kid":"hmac-key"}"#);
    }
}
