use jwx_primitives::{
    AES_BLOCK_LEN, Hash, Sealed, aes_cbc_decrypt, aes_cbc_encrypt, constant_time_eq, hmac_sign,
    random_bytes,
};

use crate::jwa::EncAlgorithm;
use crate::jwe::content::ContentEncryptionAlgorithm;
use crate::{Error, Result};

/// AES-CBC with HMAC-SHA-2 authentication ([RFC7518] §5.2):
/// `A128CBC-HS256`, `A192CBC-HS384` and `A256CBC-HS512`.
///
/// The first half of the CEK is the MAC key and the second half the
/// encryption key. The tag is the first half of
/// `HMAC(MAC_KEY, AAD || IV || ciphertext || AL)`, where `AL` is the AAD
/// length in bits as a 64-bit big-endian integer.
///
/// [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518#section-5.2
#[derive(Clone, Copy, Debug)]
pub struct AesCbcHmac {
    enc: EncAlgorithm,
    hash: Hash,
}

impl AesCbcHmac {
    /// Create the algorithm for `enc`.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedAlgorithm`] when `enc` is not a CBC-HMAC
    /// algorithm.
    pub fn new(enc: EncAlgorithm) -> Result<Self> {
        match enc {
            EncAlgorithm::A128CbcHs256 => Ok(Self::a128cbc_hs256()),
            EncAlgorithm::A192CbcHs384 => Ok(Self::a192cbc_hs384()),
            EncAlgorithm::A256CbcHs512 => Ok(Self::a256cbc_hs512()),
            _ => Err(Error::UnsupportedAlgorithm(format!("{enc} is not AES-CBC-HMAC"))),
        }
    }

    /// `A128CBC-HS256`
    #[must_use]
    pub const fn a128cbc_hs256() -> Self {
        Self {
            enc: EncAlgorithm::A128CbcHs256,
            hash: Hash::Sha256,
        }
    }

    /// `A192CBC-HS384`
    #[must_use]
    pub const fn a192cbc_hs384() -> Self {
        Self {
            enc: EncAlgorithm::A192CbcHs384,
            hash: Hash::Sha384,
        }
    }

    /// `A256CBC-HS512`
    #[must_use]
    pub const fn a256cbc_hs512() -> Self {
        Self {
            enc: EncAlgorithm::A256CbcHs512,
            hash: Hash::Sha512,
        }
    }

    // MAC and encryption keys, and the tag, are each half the CEK.
    const fn half(self) -> usize {
        self.enc.key_size() / 2
    }

    fn seal(&self, plaintext: &[u8], cek: &[u8], iv: Vec<u8>, aad: &[u8]) -> Result<Sealed> {
        let (mac_key, enc_key) = cek.split_at(self.half());
        let ciphertext =
            aes_cbc_encrypt(enc_key, &iv, plaintext).map_err(|e| Error::Crypto(e.to_string()))?;
        let tag = self.tag(mac_key, aad, &iv, &ciphertext)?;
        Ok(Sealed { ciphertext, iv, tag })
    }

    fn tag(&self, mac_key: &[u8], aad: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let al = (aad.len() as u64 * 8).to_be_bytes();
        let input = [aad, iv, ciphertext, &al[..]].concat();
        let mut mac = hmac_sign(self.hash, mac_key, &input).map_err(|_| Error::Decryption)?;
        mac.truncate(self.half());
        Ok(mac)
    }
}

impl ContentEncryptionAlgorithm for AesCbcHmac {
    fn identifier(&self) -> EncAlgorithm {
        self.enc
    }

    fn iv_size(&self) -> usize {
        AES_BLOCK_LEN
    }

    fn encrypt(&self, plaintext: &[u8], cek: &[u8], aad: &[u8]) -> Result<Sealed> {
        if cek.len() != self.key_size() {
            return Err(Error::InvalidKey(format!(
                "{} requires a {}-byte key",
                self.enc,
                self.key_size()
            )));
        }
        self.seal(plaintext, cek, random_bytes(AES_BLOCK_LEN), aad)
    }

    fn decrypt(
        &self, ciphertext: &[u8], cek: &[u8], iv: &[u8], tag: &[u8], aad: &[u8],
    ) -> Result<Vec<u8>> {
        if cek.len() != self.key_size() || iv.len() != AES_BLOCK_LEN || tag.len() != self.half() {
            return Err(Error::Decryption);
        }
        let (mac_key, enc_key) = cek.split_at(self.half());

        // authenticate before touching the ciphertext
        let expected = self.tag(mac_key, aad, iv, ciphertext)?;
        if !constant_time_eq(&expected, tag) {
            return Err(Error::Decryption);
        }

        let plaintext = aes_cbc_decrypt(enc_key, iv, ciphertext).map_err(|_| Error::Decryption)?;
        Ok(plaintext.to_vec())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).expect("should be hex"))
            .collect()
    }

    // RFC 7518 Appendix B.1
    #[test]
    fn known_answer() {
        let cek: Vec<u8> = (0..32).collect();
        let plaintext = b"A cipher system must not be required to be secret, and it must be able \
            to fall into the hands of the enemy without inconvenience";
        let iv = hex("1af38c2dc2b96ffdd86694092341bc04");
        let aad = b"The second principle of Auguste Kerckhoffs";

        let cbc = AesCbcHmac::a128cbc_hs256();
        let sealed = cbc.seal(plaintext, &cek, iv.clone(), aad).expect("should encrypt");
        assert_eq!(
            sealed.ciphertext,
            hex("c80edfa32ddf39d5ef00c0b468834279a2e46a1b8049f792f76bfe54b903a9c9\
                 a94ac9b47ad2655c5f10f9aef71427e2fc6f9b3f399a221489f16362c7032336\
                 09d45ac69864e3321cf82935ac4096c86e133314c54019e8ca7980dfa4b9cf1b\
                 384c486f3a54c51078158ee5d79de59fbd34d848b3d69550a67646344427ade5\
                 4b8851ffb598f7f80074b9473c82e2db")
        );
        assert_eq!(sealed.tag, hex("652c3fa36b0a7c5b3219fab3a30bc1c4"));

        let decrypted =
            cbc.decrypt(&sealed.ciphertext, &cek, &iv, &sealed.tag, aad).expect("should decrypt");
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn fails_closed() {
        let cbc = AesCbcHmac::a256cbc_hs512();
        let cek = random_bytes(64);
        let sealed = cbc.encrypt(b"attack at dawn", &cek, b"aad").expect("should encrypt");
        assert_eq!(sealed.tag.len(), 32);

        let mut ciphertext = sealed.ciphertext.clone();
        ciphertext[0] ^= 1;
        let mut iv = sealed.iv.clone();
        iv[15] ^= 1;

        for (ciphertext, iv, tag, aad) in [
            (&ciphertext[..], &sealed.iv[..], &sealed.tag[..], &b"aad"[..]),
            (&sealed.ciphertext[..], &iv[..], &sealed.tag[..], &b"aad"[..]),
            (&sealed.ciphertext[..], &sealed.iv[..], &sealed.tag[..31], &b"aad"[..]),
            (&sealed.ciphertext[..], &sealed.iv[..], &sealed.tag[..], &b"aae"[..]),
        ] {
            let result = cbc.decrypt(ciphertext, &cek, iv, tag, aad);
            assert!(matches!(result, Err(Error::Decryption)));
        }

        assert!(matches!(cbc.encrypt(b"", &cek[..32], b""), Err(Error::InvalidKey(_))));
    }
}
