use jwx_primitives::{GCM_IV_LEN, Sealed, aes_gcm_decrypt, aes_gcm_encrypt};

use crate::jwa::EncAlgorithm;
use crate::jwe::content::ContentEncryptionAlgorithm;
use crate::{Error, Result};

/// AES in Galois/Counter Mode (`A128GCM`, `A192GCM`, `A256GCM`) with a
/// 96-bit IV and 128-bit tag.
#[derive(Clone, Copy, Debug)]
pub struct AesGcm {
    enc: EncAlgorithm,
}

impl AesGcm {
    /// Create the algorithm for `enc`.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedAlgorithm`] when `enc` is not an AES-GCM
    /// algorithm.
    pub fn new(enc: EncAlgorithm) -> Result<Self> {
        match enc {
            EncAlgorithm::A128Gcm | EncAlgorithm::A192Gcm | EncAlgorithm::A256Gcm => {
                Ok(Self { enc })
            }
            _ => Err(Error::UnsupportedAlgorithm(format!("{enc} is not AES-GCM"))),
        }
    }

    /// `A128GCM`
    #[must_use]
    pub const fn a128gcm() -> Self {
        Self {
            enc: EncAlgorithm::A128Gcm,
        }
    }

    /// `A192GCM`
    #[must_use]
    pub const fn a192gcm() -> Self {
        Self {
            enc: EncAlgorithm::A192Gcm,
        }
    }

    /// `A256GCM`
    #[must_use]
    pub const fn a256gcm() -> Self {
        Self {
            enc: EncAlgorithm::A256Gcm,
        }
    }
}

impl ContentEncryptionAlgorithm for AesGcm {
    fn identifier(&self) -> EncAlgorithm {
        self.enc
    }

    fn iv_size(&self) -> usize {
        GCM_IV_LEN
    }

    fn encrypt(&self, plaintext: &[u8], cek: &[u8], aad: &[u8]) -> Result<Sealed> {
        if cek.len() != self.key_size() {
            return Err(Error::InvalidKey(format!(
                "{} requires a {}-byte key",
                self.enc,
                self.key_size()
            )));
        }
        aes_gcm_encrypt(cek, plaintext, aad).map_err(|e| Error::Crypto(e.to_string()))
    }

    fn decrypt(
        &self, ciphertext: &[u8], cek: &[u8], iv: &[u8], tag: &[u8], aad: &[u8],
    ) -> Result<Vec<u8>> {
        if cek.len() != self.key_size() {
            return Err(Error::Decryption);
        }
        let plaintext =
            aes_gcm_decrypt(cek, iv, ciphertext, aad, tag).map_err(|_| Error::Decryption)?;
        Ok(plaintext.to_vec())
    }
}
