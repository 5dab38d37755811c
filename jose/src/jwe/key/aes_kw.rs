use jwx_primitives::{aes_kw_unwrap, aes_kw_wrap};
use zeroize::Zeroizing;

use crate::header::Header;
use crate::jwa::KeyAlgorithm;
use crate::jwe::key::{KeyManagementAlgorithm, check_jwk_algorithm, wrapping_key_size};
use crate::jwk::{Jwk, SymmetricKeyJwk};
use crate::{Error, Result};

/// AES Key Wrap ([RFC3394]) with a shared key: `A128KW`, `A192KW` and
/// `A256KW`.
///
/// [RFC3394]: https://www.rfc-editor.org/rfc/rfc3394
#[derive(Clone, Debug)]
pub struct AesKw {
    alg: KeyAlgorithm,
    kek: Zeroizing<Vec<u8>>,
    key_id: Option<String>,
}

impl AesKw {
    /// Create the algorithm with a key encryption key.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedAlgorithm`] when `alg` is not an AES key
    /// wrap algorithm and [`Error::InvalidKey`] when the KEK is the wrong
    /// size.
    pub fn new(alg: KeyAlgorithm, kek: &[u8]) -> Result<Self> {
        if !matches!(alg, KeyAlgorithm::A128Kw | KeyAlgorithm::A192Kw | KeyAlgorithm::A256Kw) {
            return Err(Error::UnsupportedAlgorithm(format!("{alg} is not AES key wrap")));
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
        let mut aes_kw = Self::new(alg, key.key())?;
        aes_kw.key_id = jwk.key_id().map(ToString::to_string);
        Ok(aes_kw)
    }
}

impl KeyManagementAlgorithm for AesKw {
    fn identifier(&self) -> KeyAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: &[u8], _: &Header) -> Result<(Vec<u8>, Header)> {
        let wrapped = aes_kw_wrap(&self.kek, cek).map_err(|e| Error::Crypto(e.to_string()))?;
        Ok((wrapped, Header::new()))
    }

    fn decrypt(&self, encrypted_key: &[u8], _: &Header) -> Result<Zeroizing<Vec<u8>>> {
        aes_kw_unwrap(&self.kek, encrypted_key).map_err(|_| Error::Decryption)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // RFC 3394 §4.1
    #[test]
    fn known_answer() {
        let kek: Vec<u8> = (0..16).collect();
        let cek: Vec<u8> = (0..16).map(|i| i * 0x11).collect();

        let aes_kw = AesKw::new(KeyAlgorithm::A128Kw, &kek).expect("should create");
        let (wrapped, header) = aes_kw.encrypt(&cek, &Header::new()).expect("should wrap");
        assert!(header.is_empty());
        assert_eq!(crate::base64url::encode(&wrapped), "H6aLCoEStEeu80vY-1p7gp0-hiNx0s_l");

        let unwrapped = aes_kw.decrypt(&wrapped, &Header::new()).expect("should unwrap");
        assert_eq!(unwrapped.as_slice(), cek);
    }

    #[test]
    fn integrity() {
        let aes_kw = AesKw::new(KeyAlgorithm::A256Kw, &[7; 32]).expect("should create");
        let (mut wrapped, _) = aes_kw.encrypt(&[1; 32], &Header::new()).expect("should wrap");
        wrapped[0] ^= 1;
        assert!(matches!(aes_kw.decrypt(&wrapped, &Header::new()), Err(Error::Decryption)));

        assert!(matches!(AesKw::new(KeyAlgorithm::A192Kw, &[7; 32]), Err(Error::InvalidKey(_))));
    }
}
