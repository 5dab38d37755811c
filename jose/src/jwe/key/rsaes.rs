use jwx_primitives::{
    PublicKeyParts, RsaEncryptionPadding, RsaPrivateKey, RsaPublicKey, rsa_decrypt, rsa_encrypt,
};
use zeroize::Zeroizing;

use crate::header::Header;
use crate::jwa::KeyAlgorithm;
use crate::jwe::key::{KeyManagementAlgorithm, check_jwk_algorithm};
use crate::jwk::{Jwk, KeyType, RsaPrivateKeyJwk, RsaPublicKeyJwk};
use crate::jws::MIN_RSA_BITS;
use crate::{Error, Result};

/// RSA key encryption: `RSA1_5`, `RSA-OAEP` (SHA-1) and `RSA-OAEP-256`.
///
/// Created from a public key the algorithm can only encrypt.
#[derive(Clone, Debug)]
pub struct Rsaes {
    alg: KeyAlgorithm,
    padding: RsaEncryptionPadding,
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
    key_id: Option<String>,
}

impl Rsaes {
    /// Create an encrypting (and decrypting) algorithm from a private key.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedAlgorithm`] when `alg` is not an RSAES
    /// algorithm and [`Error::InvalidKey`] for a modulus under 2048 bits.
    pub fn from_private_key(alg: KeyAlgorithm, key: RsaPrivateKey) -> Result<Self> {
        let mut rsaes = Self::from_public_key(alg, key.to_public_key())?;
        rsaes.private = Some(key);
        Ok(rsaes)
    }

    /// Create an encrypting algorithm from a public key.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedAlgorithm`] when `alg` is not an RSAES
    /// algorithm and [`Error::InvalidKey`] for a modulus under 2048 bits.
    pub fn from_public_key(alg: KeyAlgorithm, key: RsaPublicKey) -> Result<Self> {
        let padding = match alg {
            KeyAlgorithm::Rsa1_5 => RsaEncryptionPadding::Pkcs1v15,
            KeyAlgorithm::RsaOaep => RsaEncryptionPadding::OaepSha1,
            KeyAlgorithm::RsaOaep256 => RsaEncryptionPadding::OaepSha256,
            _ => return Err(Error::UnsupportedAlgorithm(format!("{alg} is not RSAES"))),
        };
        if key.size() * 8 < MIN_RSA_BITS {
            return Err(Error::InvalidKey(format!(
                "{alg} requires a modulus of at least {MIN_RSA_BITS} bits"
            )));
        }

        Ok(Self {
            alg,
            padding,
            public: key,
            private: None,
            key_id: None,
        })
    }

    /// Create the algorithm from an `RSA` JWK. A JWK holding private key
    /// parameters gives an algorithm that can decrypt.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when the JWK is not a usable RSA key for
    /// `alg`.
    pub fn from_jwk(alg: KeyAlgorithm, jwk: &Jwk) -> Result<Self> {
        jwk.check_key_type(KeyType::Rsa)?;
        check_jwk_algorithm(jwk, alg)?;

        let mut rsaes = if jwk.has("d") {
            let key = RsaPrivateKeyJwk::try_from(jwk)?;
            Self::from_private_key(alg, key.private_key().clone())?
        } else {
            let key = RsaPublicKeyJwk::try_from(jwk)?;
            Self::from_public_key(alg, key.public_key().clone())?
        };
        rsaes.key_id = jwk.key_id().map(ToString::to_string);
        Ok(rsaes)
    }
}

impl KeyManagementAlgorithm for Rsaes {
    fn identifier(&self) -> KeyAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: &[u8], _: &Header) -> Result<(Vec<u8>, Header)> {
        let encrypted = rsa_encrypt(self.padding, &self.public, cek)
            .map_err(|e| Error::Crypto(e.to_string()))?;
        Ok((encrypted, Header::new()))
    }

    // A padding failure surfaces as `Error::Decryption` and nothing else so
    // the JWE layer can substitute a random CEK.
    fn decrypt(&self, encrypted_key: &[u8], _: &Header) -> Result<Zeroizing<Vec<u8>>> {
        let Some(private) = &self.private else {
            return Err(Error::NotPermitted("decryption requires a private key".into()));
        };
        rsa_decrypt(self.padding, private, encrypted_key).map_err(|_| Error::Decryption)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn private_jwk() -> Jwk {
        Jwk::from_value(test_utils::rsa_jwk("rsaes")).expect("should parse")
    }

    #[test]
    fn encrypt_decrypt() {
        let jwk = private_jwk();
        for alg in [KeyAlgorithm::Rsa1_5, KeyAlgorithm::RsaOaep, KeyAlgorithm::RsaOaep256] {
            let rsaes = Rsaes::from_jwk(alg, &jwk).expect("should create");
            let (encrypted, _) = rsaes.encrypt(&[5; 32], &Header::new()).expect("should encrypt");
            assert_eq!(encrypted.len(), 256);

            let cek = rsaes.decrypt(&encrypted, &Header::new()).expect("should decrypt");
            assert_eq!(cek.as_slice(), &[5; 32]);

            let result = rsaes.decrypt(&encrypted[1..], &Header::new());
            assert!(matches!(result, Err(Error::Decryption)));
        }
    }

    #[test]
    fn public_only() {
        let public = private_jwk().to_public().expect("should strip private parameters");
        let rsaes = Rsaes::from_jwk(KeyAlgorithm::RsaOaep256, &public).expect("should create");
        let (encrypted, _) = rsaes.encrypt(&[5; 16], &Header::new()).expect("should encrypt");

        let result = rsaes.decrypt(&encrypted, &Header::new());
        assert!(matches!(result, Err(Error::NotPermitted(_))));
    }
}
