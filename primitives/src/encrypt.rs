//! # Encryption
//!
//! Block cipher, AEAD, key wrapping and key derivation primitives.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{self, AeadInPlace, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use aes_kw::{KekAes128, KekAes192, KekAes256};
use anyhow::{Result, anyhow, bail};
use rand::rngs::OsRng;
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::core::{Hash, random_bytes};

type Aes192Gcm = AesGcm<Aes192, U12>;

/// AES-GCM nonce length in bytes.
pub const GCM_IV_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const GCM_TAG_LEN: usize = 16;

/// AES block (and CBC IV) length in bytes.
pub const AES_BLOCK_LEN: usize = 16;

/// Output of an AEAD encryption.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sealed {
    /// The ciphertext.
    pub ciphertext: Vec<u8>,

    /// The initialization vector (nonce) used.
    pub iv: Vec<u8>,

    /// The authentication tag.
    pub tag: Vec<u8>,
}

/// Wrap `key` under `kek` using AES Key Wrap ([RFC3394]). The AES variant is
/// selected by the KEK length (16, 24 or 32 bytes).
///
/// [RFC3394]: https://www.rfc-editor.org/rfc/rfc3394
///
/// # Errors
/// Returns an error for an unsupported KEK length or a key that is not a
/// multiple of 8 bytes.
pub fn aes_kw_wrap(kek: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let wrapped = match kek.len() {
        16 => KekAes128::from(<[u8; 16]>::try_from(kek)?).wrap_vec(key),
        24 => KekAes192::from(<[u8; 24]>::try_from(kek)?).wrap_vec(key),
        32 => KekAes256::from(<[u8; 32]>::try_from(kek)?).wrap_vec(key),
        len => bail!("invalid AES key wrap KEK length: {len}"),
    };
    wrapped.map_err(|e| anyhow!("issue wrapping key: {e}"))
}

/// Unwrap a key wrapped with [`aes_kw_wrap`], checking its integrity value.
///
/// # Errors
/// Returns an error when the KEK length is unsupported or the integrity check
/// fails.
pub fn aes_kw_unwrap(kek: &[u8], wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let unwrapped = match kek.len() {
        16 => KekAes128::from(<[u8; 16]>::try_from(kek)?).unwrap_vec(wrapped),
        24 => KekAes192::from(<[u8; 24]>::try_from(kek)?).unwrap_vec(wrapped),
        32 => KekAes256::from(<[u8; 32]>::try_from(kek)?).unwrap_vec(wrapped),
        len => bail!("invalid AES key wrap KEK length: {len}"),
    };
    unwrapped.map(Zeroizing::new).map_err(|e| anyhow!("issue unwrapping key: {e}"))
}

/// Encrypt `plaintext` with AES-GCM under a fresh random 96-bit IV. The AES
/// variant is selected by the key length.
///
/// # Errors
/// Returns an error for an unsupported key length.
pub fn aes_gcm_encrypt(key: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Sealed> {
    let iv = random_bytes(GCM_IV_LEN);
    let (ciphertext, tag) = match key.len() {
        16 => gcm_seal::<Aes128Gcm>(key, &iv, plaintext, aad)?,
        24 => gcm_seal::<Aes192Gcm>(key, &iv, plaintext, aad)?,
        32 => gcm_seal::<Aes256Gcm>(key, &iv, plaintext, aad)?,
        len => bail!("invalid AES-GCM key length: {len}"),
    };
    Ok(Sealed { ciphertext, iv, tag })
}

/// Decrypt and authenticate AES-GCM ciphertext.
///
/// # Errors
/// Returns an error when the key, IV or tag have the wrong length or when
/// authentication fails.
pub fn aes_gcm_decrypt(
    key: &[u8], iv: &[u8], ciphertext: &[u8], aad: &[u8], tag: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if iv.len() != GCM_IV_LEN {
        bail!("invalid AES-GCM IV length");
    }
    if tag.len() != GCM_TAG_LEN {
        bail!("invalid AES-GCM tag length");
    }
    match key.len() {
        16 => gcm_open::<Aes128Gcm>(key, iv, ciphertext, aad, tag),
        24 => gcm_open::<Aes192Gcm>(key, iv, ciphertext, aad, tag),
        32 => gcm_open::<Aes256Gcm>(key, iv, ciphertext, aad, tag),
        len => bail!("invalid AES-GCM key length: {len}"),
    }
}

fn gcm_seal<C: KeyInit + AeadInPlace>(
    key: &[u8], iv: &[u8], plaintext: &[u8], aad: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let cipher = C::new_from_slice(key).map_err(|e| anyhow!("invalid AES-GCM key: {e}"))?;
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(aead::Nonce::<C>::from_slice(iv), aad, &mut buffer)
        .map_err(|e| anyhow!("issue encrypting: {e}"))?;
    Ok((buffer, tag.to_vec()))
}

fn gcm_open<C: KeyInit + AeadInPlace>(
    key: &[u8], iv: &[u8], ciphertext: &[u8], aad: &[u8], tag: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = C::new_from_slice(key).map_err(|e| anyhow!("invalid AES-GCM key: {e}"))?;
    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(
            aead::Nonce::<C>::from_slice(iv),
            aad,
            buffer.as_mut_slice(),
            aead::Tag::<C>::from_slice(tag),
        )
        .map_err(|e| anyhow!("issue decrypting: {e}"))?;
    Ok(buffer)
}

/// Encrypt `plaintext` with AES in CBC mode and PKCS#7 padding. The AES
/// variant is selected by the key length.
///
/// # Errors
/// Returns an error for an unsupported key length or an IV that is not one
/// block long.
pub fn aes_cbc_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let ciphertext = match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|e| anyhow!("invalid AES-CBC key or IV: {e}"))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(|e| anyhow!("invalid AES-CBC key or IV: {e}"))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|e| anyhow!("invalid AES-CBC key or IV: {e}"))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        len => bail!("invalid AES-CBC key length: {len}"),
    };
    Ok(ciphertext)
}

/// Decrypt AES-CBC ciphertext and remove PKCS#7 padding. Callers must
/// authenticate the ciphertext first.
///
/// # Errors
/// Returns an error for an unsupported key length, a bad IV, or invalid
/// padding.
pub fn aes_cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let plaintext = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|e| anyhow!("invalid AES-CBC key or IV: {e}"))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(|e| anyhow!("invalid AES-CBC key or IV: {e}"))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|e| anyhow!("invalid AES-CBC key or IV: {e}"))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        len => bail!("invalid AES-CBC key length: {len}"),
    };
    plaintext.map(Zeroizing::new).map_err(|_| anyhow!("invalid AES-CBC padding"))
}

/// RSA encryption padding schemes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RsaEncryptionPadding {
    /// RSAES-PKCS1-v1_5.
    Pkcs1v15,

    /// RSAES-OAEP with SHA-1 and MGF1-SHA-1.
    OaepSha1,

    /// RSAES-OAEP with SHA-256 and MGF1-SHA-256.
    OaepSha256,
}

/// Encrypt `data` with an RSA public key.
///
/// # Errors
/// Returns an error when the data is too long for the key.
pub fn rsa_encrypt(
    padding: RsaEncryptionPadding, key: &RsaPublicKey, data: &[u8],
) -> Result<Vec<u8>> {
    let encrypted = match padding {
        RsaEncryptionPadding::Pkcs1v15 => key.encrypt(&mut OsRng, Pkcs1v15Encrypt, data),
        RsaEncryptionPadding::OaepSha1 => key.encrypt(&mut OsRng, Oaep::new::<sha1::Sha1>(), data),
        RsaEncryptionPadding::OaepSha256 => key.encrypt(&mut OsRng, Oaep::new::<Sha256>(), data),
    };
    encrypted.map_err(|e| anyhow!("issue encrypting: {e}"))
}

/// Decrypt `data` with an RSA private key, using blinding.
///
/// # Errors
/// Returns an error when decryption or padding removal fails.
pub fn rsa_decrypt(
    padding: RsaEncryptionPadding, key: &RsaPrivateKey, data: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let decrypted = match padding {
        RsaEncryptionPadding::Pkcs1v15 => key.decrypt_blinded(&mut OsRng, Pkcs1v15Encrypt, data),
        RsaEncryptionPadding::OaepSha1 => {
            key.decrypt_blinded(&mut OsRng, Oaep::new::<sha1::Sha1>(), data)
        }
        RsaEncryptionPadding::OaepSha256 => {
            key.decrypt_blinded(&mut OsRng, Oaep::new::<Sha256>(), data)
        }
    };
    decrypted.map(Zeroizing::new).map_err(|e| anyhow!("issue decrypting: {e}"))
}

/// Derive a key of `len` bytes from a password with PBKDF2-HMAC.
///
/// # Errors
/// Returns an error when the iteration count is zero.
pub fn derive_password_key(
    hash: Hash, password: &[u8], salt: &[u8], iterations: u32, len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    if iterations == 0 {
        bail!("PBKDF2 iteration count must be positive");
    }

    let mut key = Zeroizing::new(vec![0u8; len]);
    match hash {
        Hash::Sha256 => pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key),
        Hash::Sha384 => pbkdf2::pbkdf2_hmac::<Sha384>(password, salt, iterations, &mut key),
        Hash::Sha512 => pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut key),
    }
    Ok(key)
}

#[cfg(test)]
mod test {
    use super::*;

    const PLAINTEXT: &[u8] = b"The true sign of intelligence is not knowledge but imagination.";

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap()).collect()
    }

    // RFC 3394 §4.1
    #[test]
    fn key_wrap_vector() {
        let kek = hex("000102030405060708090A0B0C0D0E0F");
        let key = hex("00112233445566778899AABBCCDDEEFF");

        let wrapped = aes_kw_wrap(&kek, &key).expect("should wrap");
        assert_eq!(wrapped, hex("1fa68b0a8112b447aef34bd8fb5a7b829d3e862371d2cfe5"));

        let unwrapped = aes_kw_unwrap(&kek, &wrapped).expect("should unwrap");
        assert_eq!(unwrapped.as_slice(), key.as_slice());
    }

    #[test]
    fn key_wrap_integrity() {
        let kek = random_bytes(24);
        let mut wrapped = aes_kw_wrap(&kek, &random_bytes(32)).expect("should wrap");
        wrapped[3] ^= 0x80;
        assert!(aes_kw_unwrap(&kek, &wrapped).is_err());
        assert!(aes_kw_wrap(&random_bytes(20), &random_bytes(32)).is_err());
    }

    #[test]
    fn gcm_round_trip() {
        for len in [16, 24, 32] {
            let key = random_bytes(len);
            let sealed = aes_gcm_encrypt(&key, PLAINTEXT, b"aad").expect("should encrypt");
            assert_eq!(sealed.iv.len(), GCM_IV_LEN);
            assert_eq!(sealed.tag.len(), GCM_TAG_LEN);

            let opened =
                aes_gcm_decrypt(&key, &sealed.iv, &sealed.ciphertext, b"aad", &sealed.tag)
                    .expect("should decrypt");
            assert_eq!(opened.as_slice(), PLAINTEXT);

            assert!(
                aes_gcm_decrypt(&key, &sealed.iv, &sealed.ciphertext, b"aae", &sealed.tag)
                    .is_err()
            );
            assert!(
                aes_gcm_decrypt(&key, &sealed.iv[..11], &sealed.ciphertext, b"aad", &sealed.tag)
                    .is_err()
            );
        }
    }

    #[test]
    fn cbc_round_trip() {
        let key = random_bytes(32);
        let iv = random_bytes(AES_BLOCK_LEN);
        let ciphertext = aes_cbc_encrypt(&key, &iv, PLAINTEXT).expect("should encrypt");
        assert_eq!(ciphertext.len() % AES_BLOCK_LEN, 0);

        let plaintext = aes_cbc_decrypt(&key, &iv, &ciphertext).expect("should decrypt");
        assert_eq!(plaintext.as_slice(), PLAINTEXT);
        assert!(aes_cbc_encrypt(&key, &iv[..8], PLAINTEXT).is_err());
    }

    #[test]
    fn rsa_encryption() {
        let key = RsaPrivateKey::new(&mut OsRng, 2048).expect("should generate");
        let public = key.to_public_key();
        let cek = random_bytes(32);

        for padding in [
            RsaEncryptionPadding::Pkcs1v15,
            RsaEncryptionPadding::OaepSha1,
            RsaEncryptionPadding::OaepSha256,
        ] {
            let encrypted = rsa_encrypt(padding, &public, &cek).expect("should encrypt");
            let decrypted = rsa_decrypt(padding, &key, &encrypted).expect("should decrypt");
            assert_eq!(decrypted.as_slice(), cek.as_slice());
        }
    }

    // RFC 6070 (adapted to SHA-256)
    #[test]
    fn password_key() {
        let key = derive_password_key(Hash::Sha256, b"password", b"salt", 1, 32)
            .expect("should derive");
        assert_eq!(
            key.as_slice(),
            hex("120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b")
        );
        assert!(derive_password_key(Hash::Sha256, b"password", b"salt", 0, 32).is_err());
    }
}
