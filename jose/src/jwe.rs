//! # JSON Web Encryption (JWE)
//!
//! JWE ([RFC7516]) represents encrypted content using JSON-based data
//! structures. See JWA ([RFC7518]) for the cryptographic algorithms and
//! identifiers used.
//!
//! Only the compact serialization is supported:
//!
//! ```text
//! BASE64URL(header) '.' BASE64URL(encrypted key) '.' BASE64URL(iv) '.'
//!     BASE64URL(ciphertext) '.' BASE64URL(tag)
//! ```
//!
//! Encryption is split between a key management algorithm ([`key`]), which
//! produces the content encryption key (CEK) and protects it for the
//! recipient, and a content encryption algorithm ([`content`]), which
//! encrypts the plaintext under the CEK. The encoded header is the
//! additional authenticated data.
//!
//! Reference header for ECDH-ES with A256GCM
//! (<https://www.rfc-editor.org/rfc/rfc7518#appendix-C>):
//!
//!```json
//! {
//!     "alg":"ECDH-ES",
//!     "enc":"A256GCM",
//!     "apu":"QWxpY2U",
//!     "apv":"Qm9i",
//!     "epk": {
//!          "kty":"EC",
//!          "crv":"P-256",
//!          "x":"gI0GAILBdu7T53akrFmMyGcsF3n5dO7MmwNBHKW5SV0",
//!          "y":"SLW_xSffzlPWrHEVI30DHM_4egVwt3NQqeUD7nMFpps"
//!     }
//! }
//! ```
//!
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

pub mod content;
pub mod key;
mod zip;

use std::fmt::{self, Display};
use std::str::FromStr;

use jwx_primitives::random_bytes;
use zeroize::Zeroizing;

use self::content::ContentEncryptionAlgorithm;
use self::key::{KeyEncryption, KeyManagementAlgorithm};
use crate::header::{Header, JoseHeader};
use crate::jwa::Zip;
use crate::{Error, Result, base64url};

pub use self::zip::MAX_DECOMPRESSED_LEN;

/// A JWE in compact serialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jwe {
    header: JoseHeader,
    encoded_header: String,
    encrypted_key: Vec<u8>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

impl Jwe {
    /// Encrypt the payload, optionally compressing it first.
    ///
    /// The header is the caller's header (if any) with `alg`, `enc` and
    /// `zip` set from the arguments, plus any parameters the key management
    /// algorithm produces.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when the header carries critical parameters
    /// or already holds a parameter the key management algorithm produces,
    /// and the algorithms' errors when encryption fails.
    pub fn encrypt(
        payload: &[u8], key_alg: &dyn KeyManagementAlgorithm,
        enc_alg: &dyn ContentEncryptionAlgorithm, zip: Option<Zip>, header: Option<&Header>,
    ) -> Result<Self> {
        tracing::debug!(alg = %key_alg.identifier(), enc = %enc_alg.identifier(), "encrypt");

        let mut header = header
            .cloned()
            .unwrap_or_default()
            .with_parameters(&key_alg.header_parameters())
            .with_parameter("enc", enc_alg.identifier().as_str());
        if let Some(zip) = zip {
            header = header.with_parameter("zip", zip.as_str());
        }
        header.check_critical()?;

        // key management may add parameters (`epk`, `iv`, `tag`, `p2s`, `p2c`)
        let KeyEncryption {
            cek,
            encrypted_key,
            header: params,
        } = key_alg.cek_for_encryption(enc_alg, &header)?;
        let header = header.merge(&params)?;

        // the encoded header is the AAD
        let encoded_header = header.to_b64url();
        let plaintext = match zip {
            Some(zip) => zip.compress(payload)?,
            None => payload.to_vec(),
        };
        let sealed = enc_alg.encrypt(&plaintext, &cek, encoded_header.as_bytes())?;

        Ok(Self {
            header: JoseHeader::from(header),
            encoded_header,
            encrypted_key,
            iv: sealed.iv,
            ciphertext: sealed.ciphertext,
            tag: sealed.tag,
        })
    }

    /// Decrypt the JWE, decompressing the plaintext when `zip` is set.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when the header has no `alg` or `enc` and
    /// [`Error::AlgorithmMismatch`] when they are not the identifiers of the
    /// supplied algorithms; no key is used in either case. Any failure to
    /// recover the CEK or authenticate the ciphertext is
    /// [`Error::Decryption`].
    pub fn decrypt(
        &self, key_alg: &dyn KeyManagementAlgorithm, enc_alg: &dyn ContentEncryptionAlgorithm,
    ) -> Result<Vec<u8>> {
        let (alg, enc) = (key_alg.identifier(), enc_alg.identifier());
        tracing::debug!(alg = %alg, enc = %enc, "decrypt");

        check_identifier("alg", self.header.algorithm(), alg.as_str())?;
        check_identifier("enc", self.header.encryption_algorithm(), enc.as_str())?;
        let zip = self.header.compression_algorithm().map(Zip::from_str).transpose()?;

        // a CEK that cannot be recovered, or has the wrong size, is replaced
        // by a random one so the failure surfaces at the tag check
        // (RFC 7516 §11.5)
        let cek = match key_alg.decrypt(&self.encrypted_key, &self.header) {
            Ok(cek) if cek.len() == enc_alg.key_size() => cek,
            Ok(_) | Err(Error::Decryption) => Zeroizing::new(random_bytes(enc_alg.key_size())),
            Err(e) => return Err(e),
        };

        let plaintext = enc_alg.decrypt(
            &self.ciphertext,
            &cek,
            &self.iv,
            &self.tag,
            self.encoded_header.as_bytes(),
        )?;
        match zip {
            Some(zip) => zip.decompress(&plaintext),
            None => Ok(plaintext),
        }
    }

    /// Parse a compact serialization.
    ///
    /// # Errors
    /// Returns [`Error::Format`] unless the token has exactly five parts of
    /// valid base64url, the first holding a valid header without critical
    /// parameters.
    pub fn from_compact(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.split('.').collect();
        let [encoded_header, encrypted_key, iv, ciphertext, tag] = parts.as_slice() else {
            return Err(Error::Format(format!("JWE must have 5 parts, found {}", parts.len())));
        };

        let header = Header::from_b64url(encoded_header)?;
        header.check_critical()?;

        Ok(Self {
            header: JoseHeader::from(header),
            encoded_header: (*encoded_header).to_string(),
            encrypted_key: base64url::decode(encrypted_key)?,
            iv: base64url::decode(iv)?,
            ciphertext: base64url::decode(ciphertext)?,
            tag: base64url::decode(tag)?,
        })
    }

    /// The compact serialization.
    #[must_use]
    pub fn to_compact(&self) -> String {
        format!(
            "{}.{}.{}.{}.{}",
            self.encoded_header,
            base64url::encode(&self.encrypted_key),
            base64url::encode(&self.iv),
            base64url::encode(&self.ciphertext),
            base64url::encode(&self.tag)
        )
    }

    /// The JOSE header.
    #[must_use]
    pub const fn header(&self) -> &JoseHeader {
        &self.header
    }

    /// The base64url encoded header, as authenticated.
    #[must_use]
    pub fn encoded_header(&self) -> &str {
        &self.encoded_header
    }

    /// The JWE Encrypted Key.
    #[must_use]
    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    /// The initialization vector.
    #[must_use]
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// The ciphertext.
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// The authentication tag.
    #[must_use]
    pub fn tag(&self) -> &[u8] {
        &self.tag
    }
}

fn check_identifier(name: &str, found: Option<&str>, expected: &str) -> Result<()> {
    let Some(found) = found else {
        return Err(Error::Format(format!("missing `{name}` header")));
    };
    if found != expected {
        tracing::warn!(expected, found, "{name} mismatch");
        return Err(Error::AlgorithmMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

impl FromStr for Jwe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_compact(s)
    }
}

impl Display for Jwe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_compact())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jwa::KeyAlgorithm;
    use crate::jwe::content::{AesCbcHmac, AesGcm};
    use crate::jwe::key::{AesGcmKw, AesKw, Direct};

    #[test]
    fn encrypt_decrypt() {
        let aes_kw = AesKw::new(KeyAlgorithm::A128Kw, &[1; 16]).expect("should create");
        let header = Header::new().with_parameter("typ", "JWT");
        let jwe = Jwe::encrypt(
            b"attack at dawn",
            &aes_kw,
            &AesGcm::a128gcm(),
            Some(Zip::Deflate),
            Some(&header),
        )
        .expect("should encrypt");

        assert_eq!(
            jwe.header().to_json(),
            r#"{"typ":"JWT","alg":"A128KW","enc":"A128GCM","zip":"DEF"}"#
        );
        assert_eq!(jwe.encrypted_key().len(), 24);

        let parsed: Jwe = jwe.to_string().parse().expect("should parse");
        assert_eq!(parsed, jwe);
        let plaintext = parsed.decrypt(&aes_kw, &AesGcm::a128gcm()).expect("should decrypt");
        assert_eq!(plaintext, b"attack at dawn");
    }

    #[test]
    fn algorithm_mismatch() {
        let direct = Direct::new(&[2; 32]);
        let jwe =
            Jwe::encrypt(b"", &direct, &AesGcm::a256gcm(), None, None).expect("should encrypt");

        let result = jwe.decrypt(&direct, &AesCbcHmac::a128cbc_hs256());
        let Err(Error::AlgorithmMismatch { expected, found }) = result else {
            panic!("should be an algorithm mismatch");
        };
        assert_eq!(expected, "A128CBC-HS256");
        assert_eq!(found, "A256GCM");

        let aes_kw = AesKw::new(KeyAlgorithm::A256Kw, &[2; 32]).expect("should create");
        let result = jwe.decrypt(&aes_kw, &AesGcm::a256gcm());
        assert!(matches!(result, Err(Error::AlgorithmMismatch { .. })));
    }

    #[test]
    fn wrong_key() {
        let aes_kw = AesKw::new(KeyAlgorithm::A128Kw, &[1; 16]).expect("should create");
        let jwe = Jwe::encrypt(b"payload", &aes_kw, &AesCbcHmac::a128cbc_hs256(), None, None)
            .expect("should encrypt");

        // an unwrap failure looks the same as a tag failure
        let other = AesKw::new(KeyAlgorithm::A128Kw, &[9; 16]).expect("should create");
        let result = jwe.decrypt(&other, &AesCbcHmac::a128cbc_hs256());
        assert!(matches!(result, Err(Error::Decryption)));
    }

    #[test]
    fn malformed() {
        for token in ["", "a.b.c", "a.b.c.d", "a.b.c.d.e.f", "e30.@.AA.AA.AA", "AA.AA.AA.AA.AA"] {
            let result = Jwe::from_compact(token);
            assert!(matches!(result, Err(Error::Format(_))), "token `{token}`");
        }

        let header = Header::new().with_parameter("alg", "dir").with_parameter("enc", "A128GCM");
        let token = format!("{}..AA.AA.AA", header.with_parameter("zip", "LZW").to_b64url());
        let jwe = Jwe::from_compact(&token).expect("should parse");
        let result = jwe.decrypt(&Direct::new(&[0; 16]), &AesGcm::a128gcm());
        assert!(matches!(result, Err(Error::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn duplicate_parameter() {
        let aes_gcm_kw = AesGcmKw::new(KeyAlgorithm::A128GcmKw, &[4; 16]).expect("should create");
        let header = Header::new().with_parameter("iv", "AAAAAAAAAAAAAAAA");
        let result = Jwe::encrypt(b"", &aes_gcm_kw, &AesGcm::a128gcm(), None, Some(&header));
        assert!(matches!(result, Err(Error::Format(_))));
    }
}
