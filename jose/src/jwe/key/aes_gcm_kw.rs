use jwx_primitives::{aes_gcm_decrypt, aes_gcm_encrypt};
use zeroize::Zeroizing;

use crate::header::Header;
use crate::jwa::KeyAlgorithm;
use crate::jwe::key::{KeyManagementAlgorithm, check_jwk_algorithm, wrapping_key_size};
use crate::jwk::{Jwk, SymmetricKeyJwk};
use crate::{Error, Result, base64url};

/// Key wrapping with AES-GCM: `A128GCMKW`, `A192GCMKW` and `A256GCMKW`.
///
/// The CEK is encrypted with empty AAD and the IV and tag travel in the `iv`
/// and `tag` header parameters.
#[derive(Clone, Debug)]
pub struct AesGcmKw {
    alg: KeyAlgorithm,
    kek: Zeroizing<Vec<u8>>,
    key_id: Option<String>,
}

impl AesGcmKw {
    /// Create the algorithm with a key encryption key.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedAlgorithm`] when `alg` is not an AES-GCM
    /// key wrap algorithm and [`Error::InvalidKey`] when the KEK is the wrong
    /// size.
    pub fn new(alg: KeyAlgorithm, kek: &[u8]) -> Result<Self> {
        if !matches!(
            alg,
            KeyAlgorithm::A128GcmKw | KeyAlgorithm::A192GcmKw | KeyAlgorithm::A256GcmKw
        ) {
            return Err(Error::UnsupportedAlgorithm(format!("{alg} is not AES-GCM key wrap")));
        }
        let size = wrapping_key_size(alg)?;
        if kek.len() != size {
            return Err(Error::InvalidKey(format!("{alg} requires a {size}-byte key")));
        }
        Ok(Self {
            alg,
            kek: Zeroizing::new(kek.to_vec()),
            key_id: None,
        })
    }

    /// Create the algorithm from an `oct` JWK.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when the JWK is not a usable symmetric
    /// key for `alg`.
    pub fn from_jwk(alg: KeyAlgorithm, jwk: &Jwk) -> Result<Self> {
        check_jwk_algorithm(jwk, alg)?;
        let key = SymmetricKeyJwk::try_from(jwk)?;
        let mut aes_gcm_kw = Self::new(alg, key.key())?;
        aes_gcm_kw.key_id = jwk.key_id().map(ToString::to_string);
        Ok(aes_gcm_kw)
    }
}

impl KeyManagementAlgorithm for AesGcmKw {
    fn identifier(&self) -> KeyAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: &[u8], _: &Header) -> Result<(Vec<u8>, Header)> {
        let sealed =
            aes_gcm_encrypt(&self.kek, cek, &[]).map_err(|e| Error::Crypto(e.to_string()))?;
        let header = Header::new()
            .with_parameter("iv", base64url::encode(&sealed.iv))
            .with_parameter("tag", base64url::encode(&sealed.tag));
        Ok((sealed.ciphertext, header))
    }

    fn decrypt(&self, encrypted_key: &[u8], header: &Header) -> Result<Zeroizing<Vec<u8>>> {
        let iv = header.required_bytes("iv")?;
        let tag = header.required_bytes("tag")?;
        aes_gcm_decrypt(&self.kek, &iv, encrypted_key, &[], &tag).map_err(|_| Error::Decryption)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_carries_iv_and_tag() {
        let aes_gcm_kw = AesGcmKw::new(KeyAlgorithm::A128GcmKw, &[3; 16]).expect("should create");
        let (wrapped, header) = aes_gcm_kw.encrypt(&[9; 32], &Header::new()).expect("should wrap");
        assert_eq!(wrapped.len(), 32);
        assert_eq!(header.get_str("iv").map(str::len), Some(16));
        assert_eq!(header.get_str("tag").map(str::len), Some(22));

        let cek = aes_gcm_kw.decrypt(&wrapped, &header).expect("should unwrap");
        assert_eq!(cek.as_slice(), &[9; 32]);

        let tampered = header.with_parameter("tag", base64url::encode([0; 16]));
        assert!(matches!(aes_gcm_kw.decrypt(&wrapped, &tampered), Err(Error::Decryption)));

        let missing = Header::new().with_parameter("iv", header.get_str("iv").unwrap_or_default());
        assert!(matches!(aes_gcm_kw.decrypt(&wrapped, &missing), Err(Error::Format(_))));
    }
}
