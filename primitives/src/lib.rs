//! # JWX Primitives
//!
//! Narrow adapters over the RustCrypto primitives used by the `jwx` crate:
//! elliptic curve keys, key agreement, signatures, MACs, RSA, AES key wrap,
//! AES-GCM, AES-CBC and PBKDF2.
//!
//! This crate is not intended to be used directly.

mod agree;
mod core;
mod encrypt;
mod sign;

pub use rsa::traits::{PrivateKeyParts, PublicKeyParts};
pub use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

pub use self::agree::*;
pub use self::core::*;
pub use self::encrypt::*;
pub use self::sign::*;
