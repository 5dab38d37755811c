//! Content encryption: authenticated encryption of the JWE plaintext under
//! the CEK.

mod aes_cbc;
mod aes_gcm;

pub use jwx_primitives::Sealed;

pub use self::aes_cbc::AesCbcHmac;
pub use self::aes_gcm::AesGcm;
use crate::Result;
use crate::jwa::EncAlgorithm;

/// A JWE content encryption algorithm (`enc`).
pub trait ContentEncryptionAlgorithm: Send + Sync {
    /// The registered algorithm identifier.
    fn identifier(&self) -> EncAlgorithm;

    /// Required CEK size in bytes.
    fn key_size(&self) -> usize {
        self.identifier().key_size()
    }

    /// Initialization vector size in bytes.
    fn iv_size(&self) -> usize;

    /// Encrypt the plaintext with a fresh initialization vector.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidKey`] when the CEK has the wrong size.
    fn encrypt(&self, plaintext: &[u8], cek: &[u8], aad: &[u8]) -> Result<Sealed>;

    /// Authenticate and decrypt the ciphertext.
    ///
    /// # Errors
    /// Returns [`crate::Error::Decryption`] on any failure, including a CEK,
    /// IV or tag of the wrong size.
    fn decrypt(
        &self, ciphertext: &[u8], cek: &[u8], iv: &[u8], tag: &[u8], aad: &[u8],
    ) -> Result<Vec<u8>>;
}

/// The content encryption algorithm for `enc`.
#[must_use]
pub fn content_algorithm(enc: EncAlgorithm) -> Box<dyn ContentEncryptionAlgorithm> {
    match enc {
        EncAlgorithm::A128CbcHs256 => Box::new(AesCbcHmac::a128cbc_hs256()),
        EncAlgorithm::A192CbcHs384 => Box::new(AesCbcHmac::a192cbc_hs384()),
        EncAlgorithm::A256CbcHs512 => Box::new(AesCbcHmac::a256cbc_hs512()),
        EncAlgorithm::A128Gcm => Box::new(AesGcm::a128gcm()),
        EncAlgorithm::A192Gcm => Box::new(AesGcm::a192gcm()),
        EncAlgorithm::A256Gcm => Box::new(AesGcm::a256gcm()),
    }
}
