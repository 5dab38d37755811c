use jwx_primitives::constant_time_eq;
use zeroize::Zeroizing;

use crate::header::Header;
use crate::jwa::KeyAlgorithm;
use crate::jwe::content::ContentEncryptionAlgorithm;
use crate::jwe::key::{KeyEncryption, KeyManagementAlgorithm, check_jwk_algorithm};
use crate::jwk::{Jwk, SymmetricKeyJwk};
use crate::{Error, Result};

/// Direct encryption with a shared symmetric key (`dir`): the key is the
/// CEK and the JWE Encrypted Key is empty.
#[derive(Clone, Debug)]
pub struct Direct {
    key: Zeroizing<Vec<u8>>,
    key_id: Option<String>,
}

impl Direct {
    /// Use `key` as the CEK.
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        Self {
            key: Zeroizing::new(key.to_vec()),
            key_id: None,
        }
    }

    /// Use the key of an `oct` JWK as the CEK.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when the JWK is not a symmetric key for
    /// `dir`.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
        check_jwk_algorithm(jwk, KeyAlgorithm::Dir)?;
        let key = SymmetricKeyJwk::try_from(jwk)?;
        Ok(Self {
            key: Zeroizing::new(key.key().to_vec()),
            key_id: jwk.key_id().map(ToString::to_string),
        })
    }
}

impl KeyManagementAlgorithm for Direct {
    fn identifier(&self) -> KeyAlgorithm {
        KeyAlgorithm::Dir
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: &[u8], _: &Header) -> Result<(Vec<u8>, Header)> {
        if !constant_time_eq(cek, &self.key) {
            return Err(Error::NotPermitted("direct encryption uses the shared key as CEK".into()));
        }
        Ok((Vec::new(), Header::new()))
    }

    fn decrypt(&self, encrypted_key: &[u8], _: &Header) -> Result<Zeroizing<Vec<u8>>> {
        if !encrypted_key.is_empty() {
            return Err(Error::Format("encrypted key must be empty for `dir`".into()));
        }
        Ok(self.key.clone())
    }

    fn cek_for_encryption(
        &self, enc: &dyn ContentEncryptionAlgorithm, _: &Header,
    ) -> Result<KeyEncryption> {
        if self.key.len() != enc.key_size() {
            return Err(Error::InvalidKey(format!(
                "{} requires a {}-byte key",
                enc.identifier(),
                enc.key_size()
            )));
        }
        Ok(KeyEncryption {
            cek: self.key.clone(),
            encrypted_key: Vec::new(),
            header: Header::new(),
        })
    }
}
