//! # Key Agreement
//!
//! Elliptic Curve Diffie-Hellman over the NIST curves and X25519, plus the
//! Concat KDF ([NIST SP 800-56A] §5.8.1) used by JOSE to turn the agreed
//! secret into key material.
//!
//! [NIST SP 800-56A]: https://nvlpubs.nist.gov/nistpubs/SpecialPublications/NIST.SP.800-56Ar3.pdf

use anyhow::{Result, anyhow, bail};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::core::{Curve, PublicKey, SecretKey, SharedSecret};

impl SecretKey {
    /// Derive a shared secret from this secret key and the other party's
    /// public key.
    ///
    /// # Errors
    /// Returns an error when the keys are on different curves, when the curve
    /// does not support key agreement, or when the agreement is degenerate.
    pub fn shared_secret(&self, public: &PublicKey) -> Result<SharedSecret> {
        if public.curve() != self.curve {
            bail!("cannot agree a key between {} and {}", self.curve, public.curve());
        }

        let shared = match self.curve {
            Curve::P256 => {
                let secret = p256::SecretKey::from_slice(&self.bytes)
                    .map_err(|e| anyhow!("invalid P-256 secret key: {e}"))?;
                let public = p256::PublicKey::from_sec1_bytes(&public.to_sec1())
                    .map_err(|e| anyhow!("invalid P-256 public key: {e}"))?;
                let shared =
                    p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                shared.raw_secret_bytes().to_vec()
            }
            Curve::P384 => {
                let secret = p384::SecretKey::from_slice(&self.bytes)
                    .map_err(|e| anyhow!("invalid P-384 secret key: {e}"))?;
                let public = p384::PublicKey::from_sec1_bytes(&public.to_sec1())
                    .map_err(|e| anyhow!("invalid P-384 public key: {e}"))?;
                let shared =
                    p384::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                shared.raw_secret_bytes().to_vec()
            }
            Curve::P521 => {
                let secret = p521::SecretKey::from_slice(&self.bytes)
                    .map_err(|e| anyhow!("invalid P-521 secret key: {e}"))?;
                let public = p521::PublicKey::from_sec1_bytes(&public.to_sec1())
                    .map_err(|e| anyhow!("invalid P-521 public key: {e}"))?;
                let shared =
                    p521::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                shared.raw_secret_bytes().to_vec()
            }
            Curve::X25519 => {
                let secret = x25519_dalek::StaticSecret::from(self.to_array()?);
                let public = x25519_dalek::PublicKey::from(public.to_array()?);
                let shared = secret.diffie_hellman(&public);
                if !shared.was_contributory() {
                    bail!("non-contributory X25519 key agreement");
                }
                shared.as_bytes().to_vec()
            }
            Curve::Es256K | Curve::Ed25519 => {
                bail!("key agreement is not supported on {}", self.curve)
            }
        };

        Ok(SharedSecret(shared))
    }
}

impl PublicKey {
    /// Perform an ephemeral-static agreement with this (static) public key,
    /// returning the ephemeral public key to send to the key's owner and the
    /// shared secret.
    ///
    /// # Errors
    /// Returns an error when the curve does not support key agreement.
    pub fn ephemeral_agreement(&self) -> Result<(Self, SharedSecret)> {
        let ephemeral = self.curve().generate();
        let shared = ephemeral.shared_secret(self)?;
        Ok((ephemeral.public_key()?, shared))
    }
}

/// Concat KDF with SHA-256 as profiled by [RFC7518] §4.6.2.
///
/// `OtherInfo` is `AlgorithmID || PartyUInfo || PartyVInfo || SuppPubInfo`
/// where the first three are length-prefixed and `SuppPubInfo` is the key
/// length in bits.
///
/// [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518#section-4.6.2
///
/// # Errors
/// Returns an error when an input is too long to be length-prefixed.
pub fn concat_kdf(
    secret: &[u8], key_len: usize, algorithm_id: &[u8], apu: &[u8], apv: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let mut other_info = Vec::new();
    for field in [algorithm_id, apu, apv] {
        other_info.extend_from_slice(&u32::try_from(field.len())?.to_be_bytes());
        other_info.extend_from_slice(field);
    }
    other_info.extend_from_slice(&u32::try_from(key_len * 8)?.to_be_bytes());

    let mut derived = Zeroizing::new(Vec::with_capacity(key_len));
    let mut counter = 1u32;
    while derived.len() < key_len {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(secret);
        hasher.update(&other_info);
        derived.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    derived.truncate(key_len);

    Ok(derived)
}
