use jwx_primitives::{
    Curve, PublicKey, SecretKey, SharedSecret, aes_kw_unwrap, aes_kw_wrap, concat_kdf,
    random_bytes,
};
use zeroize::Zeroizing;

use crate::header::Header;
use crate::jwa::{EncAlgorithm, KeyAlgorithm};
use crate::jwe::content::ContentEncryptionAlgorithm;
use crate::jwe::key::{
    KeyEncryption, KeyManagementAlgorithm, check_jwk_algorithm, wrapping_key_size,
};
use crate::jwk::{Jwk, decode_curve_key, encode_curve_key};
use crate::{Error, Result};

/// Ephemeral-static Elliptic Curve Diffie-Hellman key agreement
/// ([RFC7518] §4.6) on P-256, P-384, P-521 and X25519.
///
/// `ECDH-ES` uses the agreed key as the CEK; `ECDH-ES+A128KW`,
/// `ECDH-ES+A192KW` and `ECDH-ES+A256KW` use it to wrap a random CEK. The
/// sender's ephemeral public key travels in the `epk` header parameter.
///
/// [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518#section-4.6
#[derive(Clone, Debug)]
pub struct EcdhEs {
    alg: KeyAlgorithm,
    public: PublicKey,
    secret: Option<SecretKey>,
    key_id: Option<String>,
}

impl EcdhEs {
    /// Create an encrypting (and decrypting) algorithm from the recipient's
    /// secret key.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedAlgorithm`] when `alg` is not an ECDH-ES
    /// algorithm and [`Error::InvalidKey`] when the curve does not support
    /// key agreement.
    pub fn from_secret_key(alg: KeyAlgorithm, key: SecretKey) -> Result<Self> {
        let public = key.public_key().map_err(|e| Error::InvalidKey(e.to_string()))?;
        let mut ecdh_es = Self::from_public_key(alg, public)?;
        ecdh_es.secret = Some(key);
        Ok(ecdh_es)
    }

    /// Create an encrypting algorithm from the recipient's public key.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedAlgorithm`] when `alg` is not an ECDH-ES
    /// algorithm and [`Error::InvalidKey`] when the curve does not support
    /// key agreement.
    pub fn from_public_key(alg: KeyAlgorithm, key: PublicKey) -> Result<Self> {
        if !matches!(
            alg,
            KeyAlgorithm::EcdhEs
                | KeyAlgorithm::EcdhEsA128Kw
                | KeyAlgorithm::EcdhEsA192Kw
                | KeyAlgorithm::EcdhEsA256Kw
        ) {
            return Err(Error::UnsupportedAlgorithm(format!("{alg} is not ECDH-ES")));
        }
        if !matches!(key.curve(), Curve::P256 | Curve::P384 | Curve::P521 | Curve::X25519) {
            return Err(Error::InvalidKey(format!(
                "{alg} is not supported on {}",
                key.curve()
            )));
        }

        Ok(Self {
            alg,
            public: key,
            secret: None,
            key_id: None,
        })
    }

    /// Create the algorithm from an `EC` or `OKP` JWK. A JWK holding `d`
    /// gives an algorithm that can decrypt.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when the JWK is not a usable key for
    /// `alg`.
    pub fn from_jwk(alg: KeyAlgorithm, jwk: &Jwk) -> Result<Self> {
        check_jwk_algorithm(jwk, alg)?;
        let (public, secret) = decode_curve_key(jwk)?;
        let mut ecdh_es = Self::from_public_key(alg, public)?;
        ecdh_es.secret = secret;
        ecdh_es.key_id = jwk.key_id().map(ToString::to_string);
        Ok(ecdh_es)
    }

    const fn is_direct(&self) -> bool {
        matches!(self.alg, KeyAlgorithm::EcdhEs)
    }

    // ephemeral key pair and the secret agreed with the recipient
    fn agree(&self) -> Result<(Header, SharedSecret)> {
        let (epk, shared) =
            self.public.ephemeral_agreement().map_err(|e| Error::Crypto(e.to_string()))?;
        let header = Header::new().with_parameter("epk", encode_curve_key(&epk).to_value());
        Ok((header, shared))
    }

    // The sender's `epk` must be on the recipient's curve.
    fn received_agreement(&self, header: &Header) -> Result<SharedSecret> {
        let Some(secret) = &self.secret else {
            return Err(Error::NotPermitted("decryption requires a private key".into()));
        };
        let epk = header.get("epk").ok_or_else(|| Error::Format("missing `epk` header".into()))?;
        let epk = Jwk::from_value(epk.clone())?;
        let (epk, _) = decode_curve_key(&epk)?;
        if epk.curve() != self.public.curve() {
            return Err(Error::InvalidKey(format!(
                "`epk` is on {}, expected {}",
                epk.curve(),
                self.public.curve()
            )));
        }
        secret.shared_secret(&epk).map_err(|_| Error::Decryption)
    }
}

impl KeyManagementAlgorithm for EcdhEs {
    fn identifier(&self) -> KeyAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: &[u8], header: &Header) -> Result<(Vec<u8>, Header)> {
        if self.is_direct() {
            return Err(Error::NotPermitted("ECDH-ES agrees the CEK directly".into()));
        }
        let (epk, shared) = self.agree()?;
        let kek = derive_key(&shared, self.alg.as_str(), wrapping_key_size(self.alg)?, header)?;
        let wrapped = aes_kw_wrap(&kek, cek).map_err(|e| Error::Crypto(e.to_string()))?;
        Ok((wrapped, epk))
    }

    fn decrypt(&self, encrypted_key: &[u8], header: &Header) -> Result<Zeroizing<Vec<u8>>> {
        let shared = self.received_agreement(header)?;

        if self.is_direct() {
            if !encrypted_key.is_empty() {
                return Err(Error::Format("encrypted key must be empty for `ECDH-ES`".into()));
            }
            let enc: EncAlgorithm = header.required_str("enc")?.parse()?;
            return derive_key(&shared, enc.as_str(), enc.key_size(), header);
        }

        let kek = derive_key(&shared, self.alg.as_str(), wrapping_key_size(self.alg)?, header)?;
        aes_kw_unwrap(&kek, encrypted_key).map_err(|_| Error::Decryption)
    }

    fn cek_for_encryption(
        &self, enc: &dyn ContentEncryptionAlgorithm, header: &Header,
    ) -> Result<KeyEncryption> {
        if !self.is_direct() {
            let cek = Zeroizing::new(random_bytes(enc.key_size()));
            let (encrypted_key, header) = self.encrypt(&cek, header)?;
            return Ok(KeyEncryption {
                cek,
                encrypted_key,
                header,
            });
        }

        let (epk, shared) = self.agree()?;
        let cek = derive_key(&shared, enc.identifier().as_str(), enc.key_size(), header)?;
        Ok(KeyEncryption {
            cek,
            encrypted_key: Vec::new(),
            header: epk,
        })
    }
}

// Concat KDF over the agreed secret with PartyUInfo and PartyVInfo taken
// from `apu` and `apv`.
fn derive_key(
    shared: &SharedSecret, algorithm_id: &str, key_len: usize, header: &Header,
) -> Result<Zeroizing<Vec<u8>>> {
    let apu = header.bytes("apu")?.unwrap_or_default();
    let apv = header.bytes("apv")?.unwrap_or_default();
    concat_kdf(shared.as_bytes(), key_len, algorithm_id.as_bytes(), &apu, &apv)
        .map_err(|e| Error::Crypto(e.to_string()))
}
