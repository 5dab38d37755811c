//! # Signing
//!
//! Digital signatures (ECDSA, EdDSA, RSASSA) and HMAC.

use anyhow::{Result, anyhow, bail};
use ecdsa::signature::{Signer, Verifier};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rsa::{Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};

use crate::core::{Curve, Hash, PublicKey, SecretKey};

impl SecretKey {
    /// Sign the message. ECDSA signatures are returned as the fixed-size
    /// `r || s` concatenation; the digest is implied by the curve (SHA-256
    /// for P-256 and secp256k1, SHA-384 for P-384, SHA-512 for P-521).
    ///
    /// # Errors
    /// Returns an error when the key is invalid or the curve cannot sign.
    pub fn try_sign(&self, msg: &[u8]) -> Result<Vec<u8>> {
        let signature = match self.curve {
            Curve::P256 => {
                let signing_key = p256::ecdsa::SigningKey::from_slice(&self.bytes)
                    .map_err(|e| anyhow!("issue parsing P-256 key: {e}"))?;
                let signature: p256::ecdsa::Signature = signing_key.try_sign(msg)?;
                signature.to_bytes().to_vec()
            }
            Curve::P384 => {
                let signing_key = p384::ecdsa::SigningKey::from_slice(&self.bytes)
                    .map_err(|e| anyhow!("issue parsing P-384 key: {e}"))?;
                let signature: p384::ecdsa::Signature = signing_key.try_sign(msg)?;
                signature.to_bytes().to_vec()
            }
            Curve::P521 => {
                let signing_key = p521::ecdsa::SigningKey::from_slice(&self.bytes)
                    .map_err(|e| anyhow!("issue parsing P-521 key: {e}"))?;
                let signature: p521::ecdsa::Signature = signing_key.try_sign(msg)?;
                signature.to_bytes().to_vec()
            }
            Curve::Es256K => {
                let signing_key = k256::ecdsa::SigningKey::from_slice(&self.bytes)
                    .map_err(|e| anyhow!("issue parsing secp256k1 key: {e}"))?;
                let signature: k256::ecdsa::Signature = signing_key.try_sign(msg)?;
                signature.to_bytes().to_vec()
            }
            Curve::Ed25519 => {
                let signing_key = ed25519_dalek::SigningKey::from_bytes(&self.to_array()?);
                signing_key.try_sign(msg)?.to_bytes().to_vec()
            }
            Curve::X25519 => bail!("X25519 keys cannot sign"),
        };

        Ok(signature)
    }
}

impl PublicKey {
    /// Verify a signature produced by [`SecretKey::try_sign`].
    ///
    /// # Errors
    /// Returns an error when the signature is malformed or does not verify.
    pub fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<()> {
        let sec1 = self.to_sec1();
        match self.curve() {
            Curve::P256 => {
                let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)?;
                let signature = p256::ecdsa::Signature::from_slice(sig)?;
                verifying_key.verify(msg, &signature)?;
            }
            Curve::P384 => {
                let verifying_key = p384::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)?;
                let signature = p384::ecdsa::Signature::from_slice(sig)?;
                verifying_key.verify(msg, &signature)?;
            }
            Curve::P521 => {
                let verifying_key = p521::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)?;
                let signature = p521::ecdsa::Signature::from_slice(sig)?;
                verifying_key.verify(msg, &signature)?;
            }
            Curve::Es256K => {
                let verifying_key = k256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)?;
                let signature = k256::ecdsa::Signature::from_slice(sig)?;
                let normalised = signature.normalize_s().unwrap_or(signature);
                verifying_key.verify(msg, &normalised)?;
            }
            Curve::Ed25519 => {
                let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&self.to_array()?)
                    .map_err(|e| anyhow!("unable to build verifying key: {e}"))?;
                let signature = ed25519_dalek::Signature::from_slice(sig)
                    .map_err(|e| anyhow!("unable to build signature: {e}"))?;
                verifying_key.verify(msg, &signature)?;
            }
            Curve::X25519 => bail!("X25519 keys cannot verify"),
        }
        Ok(())
    }
}

/// Compute the HMAC of `msg` under `key`.
///
/// # Errors
/// Returns an error if the MAC cannot be initialised with the key.
pub fn hmac_sign(hash: Hash, key: &[u8], msg: &[u8]) -> Result<Vec<u8>> {
    let tag = match hash {
        Hash::Sha256 => keyed::<Hmac<Sha256>>(key, msg)?.finalize().into_bytes().to_vec(),
        Hash::Sha384 => keyed::<Hmac<Sha384>>(key, msg)?.finalize().into_bytes().to_vec(),
        Hash::Sha512 => keyed::<Hmac<Sha512>>(key, msg)?.finalize().into_bytes().to_vec(),
    };
    Ok(tag)
}

/// Verify the HMAC `tag` of `msg` in constant time.
///
/// # Errors
/// Returns an error if the MAC cannot be initialised with the key.
pub fn hmac_verify(hash: Hash, key: &[u8], msg: &[u8], tag: &[u8]) -> Result<bool> {
    let verified = match hash {
        Hash::Sha256 => keyed::<Hmac<Sha256>>(key, msg)?.verify_slice(tag).is_ok(),
        Hash::Sha384 => keyed::<Hmac<Sha384>>(key, msg)?.verify_slice(tag).is_ok(),
        Hash::Sha512 => keyed::<Hmac<Sha512>>(key, msg)?.verify_slice(tag).is_ok(),
    };
    Ok(verified)
}

fn keyed<M: Mac + hmac::digest::KeyInit>(key: &[u8], msg: &[u8]) -> Result<M> {
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|e| anyhow!("invalid HMAC key: {e}"))?;
    mac.update(msg);
    Ok(mac)
}

/// RSA signature padding schemes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RsaSignaturePadding {
    /// RSASSA-PKCS1-v1_5.
    Pkcs1v15,

    /// RSASSA-PSS with MGF1 and a salt the length of the digest.
    Pss,
}

/// Generate an RSA private key with a modulus of `bits` bits and public
/// exponent 65537.
///
/// # Errors
/// Returns an error if key generation fails.
pub fn rsa_generate(bits: usize) -> Result<RsaPrivateKey> {
    RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| anyhow!("issue generating RSA key: {e}"))
}

/// Sign `msg` with an RSA private key.
///
/// # Errors
/// Returns an error if the signing operation fails.
pub fn rsa_sign(
    padding: RsaSignaturePadding, hash: Hash, key: &RsaPrivateKey, msg: &[u8],
) -> Result<Vec<u8>> {
    let hashed = hash.digest(msg);
    let signature = match padding {
        RsaSignaturePadding::Pkcs1v15 => key.sign_with_rng(&mut OsRng, pkcs1v15(hash), &hashed),
        RsaSignaturePadding::Pss => key.sign_with_rng(&mut OsRng, pss(hash), &hashed),
    };
    signature.map_err(|e| anyhow!("issue signing: {e}"))
}

/// Verify an RSA signature over `msg`.
///
/// # Errors
/// Returns an error when the signature does not verify.
pub fn rsa_verify(
    padding: RsaSignaturePadding, hash: Hash, key: &RsaPublicKey, msg: &[u8], sig: &[u8],
) -> Result<()> {
    let hashed = hash.digest(msg);
    let verified = match padding {
        RsaSignaturePadding::Pkcs1v15 => key.verify(pkcs1v15(hash), &hashed, sig),
        RsaSignaturePadding::Pss => key.verify(pss(hash), &hashed, sig),
    };
    verified.map_err(|e| anyhow!("issue verifying signature: {e}"))
}

fn pkcs1v15(hash: Hash) -> Pkcs1v15Sign {
    match hash {
        Hash::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        Hash::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        Hash::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

fn pss(hash: Hash) -> Pss {
    match hash {
        Hash::Sha256 => Pss::new::<Sha256>(),
        Hash::Sha384 => Pss::new::<Sha384>(),
        Hash::Sha512 => Pss::new::<Sha512>(),
    }
}
