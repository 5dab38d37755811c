//! Key management: how the content encryption key (CEK) is produced,
//! protected for the recipient and recovered.

mod aes_gcm_kw;
mod aes_kw;
mod direct;
mod ecdh_es;
mod pbes2;
mod rsaes;

use jwx_primitives::random_bytes;
use zeroize::Zeroizing;

pub use self::aes_gcm_kw::AesGcmKw;
pub use self::aes_kw::AesKw;
pub use self::direct::Direct;
pub use self::ecdh_es::EcdhEs;
pub use self::pbes2::{DEFAULT_ITERATIONS, MAX_ITERATIONS, Pbes2};
pub use self::rsaes::Rsaes;
use crate::header::Header;
use crate::jwa::KeyAlgorithm;
use crate::jwe::content::ContentEncryptionAlgorithm;
use crate::jwk::Jwk;
use crate::{Error, Result};

/// The CEK for a new JWE, the key as sent to the recipient and any header
/// parameters the recipient needs to recover it.
pub struct KeyEncryption {
    /// Content encryption key.
    pub cek: Zeroizing<Vec<u8>>,

    /// JWE Encrypted Key. Empty for direct encryption and direct key
    /// agreement.
    pub encrypted_key: Vec<u8>,

    /// Header parameters produced by the algorithm (`iv`, `tag`, `epk`,
    /// `p2s`, `p2c`).
    pub header: Header,
}

/// A JWE key management algorithm (`alg`) bound to a key.
pub trait KeyManagementAlgorithm: Send + Sync {
    /// The registered algorithm identifier.
    fn identifier(&self) -> KeyAlgorithm;

    /// The ID of the key, when known.
    fn key_id(&self) -> Option<&str> {
        None
    }

    /// Protect the CEK for the recipient, returning the encrypted key and
    /// any header parameters produced.
    ///
    /// `header` is the JWE header built so far.
    ///
    /// # Errors
    /// Returns an error when the CEK cannot be protected, or
    /// [`Error::NotPermitted`] for algorithms that do not encrypt a CEK.
    fn encrypt(&self, cek: &[u8], header: &Header) -> Result<(Vec<u8>, Header)>;

    /// Recover the CEK from the encrypted key.
    ///
    /// # Errors
    /// Returns [`Error::Decryption`] when the key cannot be recovered,
    /// [`Error::Format`] when a header parameter the algorithm needs is
    /// missing or invalid, and [`Error::NotPermitted`] when the algorithm
    /// has no private key.
    fn decrypt(&self, encrypted_key: &[u8], header: &Header) -> Result<Zeroizing<Vec<u8>>>;

    /// Produce the CEK for a new JWE. Unless the algorithm determines the CEK
    /// itself, a random CEK of the content algorithm's key size is
    /// encrypted.
    ///
    /// # Errors
    /// Returns the error of [`KeyManagementAlgorithm::encrypt`].
    fn cek_for_encryption(
        &self, enc: &dyn ContentEncryptionAlgorithm, header: &Header,
    ) -> Result<KeyEncryption> {
        let cek = Zeroizing::new(random_bytes(enc.key_size()));
        let (encrypted_key, header) = self.encrypt(&cek, header)?;
        Ok(KeyEncryption {
            cek,
            encrypted_key,
            header,
        })
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

/// Create the key management algorithm `alg` using the JWK.
///
/// Symmetric algorithms (`dir`, AES key wrap and PBES2) take an `oct` JWK,
/// RSAES an `RSA` JWK, and ECDH-ES an `EC` or `OKP` JWK. A JWK that names an
/// algorithm can only be used with that algorithm.
///
/// # Errors
/// Returns [`Error::InvalidKey`] for an unsuitable key.
pub fn key_algorithm(alg: KeyAlgorithm, jwk: &Jwk) -> Result<Box<dyn KeyManagementAlgorithm>> {
    tracing::debug!(alg = %alg, kty = ?jwk.get_str("kty"), "key_algorithm");

    let algorithm: Box<dyn KeyManagementAlgorithm> = match alg {
        KeyAlgorithm::Dir => Box::new(Direct::from_jwk(jwk)?),
        KeyAlgorithm::A128Kw | KeyAlgorithm::A192Kw | KeyAlgorithm::A256Kw => {
            Box::new(AesKw::from_jwk(alg, jwk)?)
        }
        KeyAlgorithm::A128GcmKw | KeyAlgorithm::A192GcmKw | KeyAlgorithm::A256GcmKw => {
            Box::new(AesGcmKw::from_jwk(alg, jwk)?)
        }
        KeyAlgorithm::Rsa1_5 | KeyAlgorithm::RsaOaep | KeyAlgorithm::RsaOaep256 => {
            Box::new(Rsaes::from_jwk(alg, jwk)?)
        }
        KeyAlgorithm::EcdhEs
        | KeyAlgorithm::EcdhEsA128Kw
        | KeyAlgorithm::EcdhEsA192Kw
        | KeyAlgorithm::EcdhEsA256Kw => Box::new(EcdhEs::from_jwk(alg, jwk)?),
        KeyAlgorithm::Pbes2Hs256A128Kw
        | KeyAlgorithm::Pbes2Hs384A192Kw
        | KeyAlgorithm::Pbes2Hs512A256Kw => Box::new(Pbes2::from_jwk(alg, jwk)?),
    };
    Ok(algorithm)
}

/// Check the JWK can be used with `alg` when it names an algorithm.
fn check_jwk_algorithm(jwk: &Jwk, alg: KeyAlgorithm) -> Result<()> {
    jwk.check_algorithm(alg.as_str())
}

/// The key wrapping key size for an AES-based algorithm.
fn wrapping_key_size(alg: KeyAlgorithm) -> Result<usize> {
    alg.wrapping_key_size()
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("{alg} does not wrap with AES")))
}
