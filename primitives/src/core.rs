//! # Primitive Cryptography Types

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Prefix byte (tag) to indicate an uncompressed SEC1 public key.
pub const TAG_PUBKEY_FULL: u8 = 0x04;

/// SHA-2 hash functions used by the signing, MAC and key derivation
/// primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hash {
    /// SHA-256
    Sha256,

    /// SHA-384
    Sha384,

    /// SHA-512
    Sha512,
}

impl Hash {
    /// Digest output length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Hash the provided data.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

/// Cryptographic curve type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Curve {
    /// NIST P-256 (secp256r1).
    P256,

    /// NIST P-384 (secp384r1).
    P384,

    /// NIST P-521 (secp521r1).
    P521,

    /// secp256k1 curve.
    Es256K,

    /// Ed25519 signature (DSA) key pairs.
    Ed25519,

    /// X25519 function (key agreement) key pairs.
    X25519,
}

impl Curve {
    /// Length, in bytes, of a coordinate (and of a private key) on the curve.
    #[must_use]
    pub const fn coordinate_len(self) -> usize {
        match self {
            Self::P384 => 48,
            Self::P521 => 66,
            Self::P256 | Self::Es256K | Self::Ed25519 | Self::X25519 => 32,
        }
    }

    /// Whether public keys on the curve carry a `y` coordinate.
    #[must_use]
    pub const fn has_y(self) -> bool {
        !matches!(self, Self::Ed25519 | Self::X25519)
    }

    /// Generate a new secret key on the curve.
    #[must_use]
    pub fn generate(self) -> SecretKey {
        let bytes = match self {
            Self::P256 => p256::SecretKey::random(&mut OsRng).to_bytes().to_vec(),
            Self::P384 => p384::SecretKey::random(&mut OsRng).to_bytes().to_vec(),
            Self::P521 => p521::SecretKey::random(&mut OsRng).to_bytes().to_vec(),
            Self::Es256K => k256::SecretKey::random(&mut OsRng).to_bytes().to_vec(),
            Self::Ed25519 => {
                let signing_key = ed25519_dalek::SigningKey::generate(&mut OsRng);
                signing_key.as_bytes().to_vec()
            }
            Self::X25519 => {
                let secret_key = x25519_dalek::StaticSecret::random_from_rng(OsRng);
                secret_key.to_bytes().to_vec()
            }
        };
        SecretKey { curve: self, bytes }
    }
}

impl Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P256 => write!(f, "P-256"),
            Self::P384 => write!(f, "P-384"),
            Self::P521 => write!(f, "P-521"),
            Self::Es256K => write!(f, "secp256k1"),
            Self::Ed25519 => write!(f, "Ed25519"),
            Self::X25519 => write!(f, "X25519"),
        }
    }
}

impl FromStr for Curve {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "P-256" => Ok(Self::P256),
            "P-384" => Ok(Self::P384),
            "P-521" => Ok(Self::P521),
            "secp256k1" => Ok(Self::Es256K),
            "Ed25519" => Ok(Self::Ed25519),
            "X25519" => Ok(Self::X25519),
            _ => Err(anyhow!("unsupported curve: {s}")),
        }
    }
}

/// A secret (private) key on one of the supported curves.
///
/// Key bytes are wiped when the key is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    #[zeroize(skip)]
    pub(crate) curve: Curve,
    pub(crate) bytes: Vec<u8>,
}

impl SecretKey {
    /// Create a secret key from its raw bytes.
    ///
    /// # Errors
    /// Returns an error when the key length does not match the curve.
    pub fn new(curve: Curve, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != curve.coordinate_len() {
            bail!("invalid {curve} secret key length");
        }
        Ok(Self {
            curve,
            bytes: bytes.to_vec(),
        })
    }

    /// The curve the key belongs to.
    #[must_use]
    pub const fn curve(&self) -> Curve {
        self.curve
    }

    /// Return the secret key as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Derive the public key for this secret key.
    ///
    /// # Errors
    /// Returns an error when the secret is not a valid scalar for the curve.
    pub fn public_key(&self) -> Result<PublicKey> {
        let sec1 = match self.curve {
            Curve::P256 => p256::SecretKey::from_slice(&self.bytes)
                .map_err(|e| anyhow!("invalid P-256 secret key: {e}"))?
                .public_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
            Curve::P384 => p384::SecretKey::from_slice(&self.bytes)
                .map_err(|e| anyhow!("invalid P-384 secret key: {e}"))?
                .public_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
            Curve::P521 => p521::SecretKey::from_slice(&self.bytes)
                .map_err(|e| anyhow!("invalid P-521 secret key: {e}"))?
                .public_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
            Curve::Es256K => k256::SecretKey::from_slice(&self.bytes)
                .map_err(|e| anyhow!("invalid secp256k1 secret key: {e}"))?
                .public_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
            Curve::Ed25519 => {
                let signing_key = ed25519_dalek::SigningKey::from_bytes(&self.to_array()?);
                let verifying_key = signing_key.verifying_key();
                return PublicKey::new(self.curve, verifying_key.to_bytes().to_vec(), None);
            }
            Curve::X25519 => {
                let secret = x25519_dalek::StaticSecret::from(self.to_array()?);
                let public = x25519_dalek::PublicKey::from(&secret);
                return PublicKey::new(self.curve, public.to_bytes().to_vec(), None);
            }
        };
        PublicKey::from_sec1(self.curve, &sec1)
    }

    pub(crate) fn to_array(&self) -> Result<[u8; 32]> {
        self.bytes
            .as_slice()
            .try_into()
            .map_err(|_| anyhow!("invalid {} secret key length", self.curve))
    }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey").field("curve", &self.curve).finish_non_exhaustive()
    }
}

/// A shared secret resulting from key agreement.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret(pub(crate) Vec<u8>);

impl SharedSecret {
    /// Return the shared secret as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A public key on one of the supported curves. Weierstrass curve keys carry
/// both affine coordinates; Edwards and Montgomery keys carry only `x`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    curve: Curve,
    x: Vec<u8>,
    y: Option<Vec<u8>>,
}

impl PublicKey {
    /// Create a public key from its coordinates. The point is checked to lie
    /// on the curve.
    ///
    /// # Errors
    /// Returns an error when the coordinates have the wrong length, when `y`
    /// is missing (or unexpected) for the curve, or when the point is not on
    /// the curve.
    pub fn new(curve: Curve, x: Vec<u8>, y: Option<Vec<u8>>) -> Result<Self> {
        let len = curve.coordinate_len();
        if x.len() != len {
            bail!("invalid {curve} public key: `x` must be {len} bytes");
        }
        match (&y, curve.has_y()) {
            (Some(y), true) if y.len() != len => {
                bail!("invalid {curve} public key: `y` must be {len} bytes")
            }
            (None, true) => bail!("invalid {curve} public key: missing `y`"),
            (Some(_), false) => bail!("invalid {curve} public key: unexpected `y`"),
            _ => {}
        }

        let key = Self { curve, x, y };
        key.check_point()?;
        Ok(key)
    }

    /// Parse an uncompressed SEC1 encoded point (`0x04 || x || y`).
    ///
    /// # Errors
    /// Returns an error when the encoding is not an uncompressed point of the
    /// expected size.
    pub fn from_sec1(curve: Curve, bytes: &[u8]) -> Result<Self> {
        let len = curve.coordinate_len();
        if !curve.has_y() || bytes.len() != 1 + 2 * len || bytes[0] != TAG_PUBKEY_FULL {
            bail!("invalid {curve} SEC1 public key");
        }
        Self::new(curve, bytes[1..=len].to_vec(), Some(bytes[len + 1..].to_vec()))
    }

    /// The curve the key belongs to.
    #[must_use]
    pub const fn curve(&self) -> Curve {
        self.curve
    }

    /// The `x` coordinate (or the whole key for Edwards and Montgomery keys).
    #[must_use]
    pub fn x(&self) -> &[u8] {
        &self.x
    }

    /// The `y` coordinate, when the curve has one.
    #[must_use]
    pub fn y(&self) -> Option<&[u8]> {
        self.y.as_deref()
    }

    /// Return the public key as uncompressed SEC1 bytes, or the raw key for
    /// Edwards and Montgomery curves.
    #[must_use]
    pub fn to_sec1(&self) -> Vec<u8> {
        let Some(y) = &self.y else {
            return self.x.clone();
        };

        let mut key = Vec::with_capacity(1 + self.x.len() + y.len());
        key.push(TAG_PUBKEY_FULL);
        key.extend_from_slice(&self.x);
        key.extend_from_slice(y);
        key
    }

    pub(crate) fn to_array(&self) -> Result<[u8; 32]> {
        self.x
            .as_slice()
            .try_into()
            .map_err(|_| anyhow!("invalid {} public key length", self.curve))
    }

    fn check_point(&self) -> Result<()> {
        let sec1 = self.to_sec1();
        match self.curve {
            Curve::P256 => {
                p256::PublicKey::from_sec1_bytes(&sec1)
                    .map_err(|_| anyhow!("point is not on P-256"))?;
            }
            Curve::P384 => {
                p384::PublicKey::from_sec1_bytes(&sec1)
                    .map_err(|_| anyhow!("point is not on P-384"))?;
            }
            Curve::P521 => {
                p521::PublicKey::from_sec1_bytes(&sec1)
                    .map_err(|_| anyhow!("point is not on P-521"))?;
            }
            Curve::Es256K => {
                k256::PublicKey::from_sec1_bytes(&sec1)
                    .map_err(|_| anyhow!("point is not on secp256k1"))?;
            }
            Curve::Ed25519 => {
                ed25519_dalek::VerifyingKey::from_bytes(&self.to_array()?)
                    .map_err(|e| anyhow!("invalid Ed25519 public key: {e}"))?;
            }
            Curve::X25519 => {}
        }
        Ok(())
    }
}

/// Generate `len` bytes from the operating system's secure random source.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Compare two byte strings in constant time. Slices of differing length
/// compare unequal.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn generated_keys() {
        for curve in
            [Curve::P256, Curve::P384, Curve::P521, Curve::Es256K, Curve::Ed25519, Curve::X25519]
        {
            let secret = curve.generate();
            assert_eq!(secret.as_bytes().len(), curve.coordinate_len());

            let public = secret.public_key().expect("should derive public key");
            assert_eq!(public.x().len(), curve.coordinate_len());
            assert_eq!(public.y().is_some(), curve.has_y());
        }
    }

    #[test]
    fn curve_names() {
        let curve: Curve = "P-521".parse().expect("should parse");
        assert_eq!(curve, Curve::P521);
        assert_eq!(curve.to_string(), "P-521");
        assert!("P-192".parse::<Curve>().is_err());
    }

    #[test]
    fn point_off_curve() {
        let public = Curve::P256.generate().public_key().expect("should derive public key");
        let mut y = public.y().expect("should have y").to_vec();
        y[31] ^= 0x01;
        PublicKey::new(Curve::P256, public.x().to_vec(), Some(y))
            .expect_err("should reject point off the curve");
    }

    #[test]
    fn sec1_round_trip() {
        let public = Curve::P384.generate().public_key().expect("should derive public key");
        let parsed = PublicKey::from_sec1(Curve::P384, &public.to_sec1()).expect("should parse");
        assert_eq!(parsed, public);
    }

    #[test]
    fn constant_time() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
