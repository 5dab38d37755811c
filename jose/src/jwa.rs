//! # JSON Web Algorithms (JWA)
//!
//! Registered algorithm identifiers ([RFC7518], [RFC8037], [RFC8812]). Each
//! registry is a closed enum with a static table of its identifiers; parsing
//! an identifier that is not in the table fails with
//! [`Error::UnsupportedAlgorithm`].
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518
//! [RFC8037]: https://www.rfc-editor.org/rfc/rfc8037
//! [RFC8812]: https://www.rfc-editor.org/rfc/rfc8812

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::{Error, Result};

macro_rules! registry {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($what:literal) {
            $($(#[$variant_meta:meta])* $variant:ident => $id:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub enum $name {
            $($(#[$variant_meta])* $variant,)+
        }

        impl $name {
            /// Every registered variant, in registry order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The registered identifier.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $id,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|alg| alg.as_str() == s)
                    .ok_or_else(|| Error::UnsupportedAlgorithm(format!("{} `{s}`", $what)))
            }
        }
    };
}

registry! {
    /// Digital signature and MAC algorithms for JWS (`alg`).
    pub enum Algorithm ("signature algorithm") {
        /// HMAC using SHA-256.
        Hs256 => "HS256",
        /// HMAC using SHA-384.
        Hs384 => "HS384",
        /// HMAC using SHA-512.
        Hs512 => "HS512",
        /// RSASSA-PKCS1-v1_5 using SHA-256.
        Rs256 => "RS256",
        /// RSASSA-PKCS1-v1_5 using SHA-384.
        Rs384 => "RS384",
        /// RSASSA-PKCS1-v1_5 using SHA-512.
        Rs512 => "RS512",
        /// RSASSA-PSS using SHA-256 and MGF1 with SHA-256.
        Ps256 => "PS256",
        /// RSASSA-PSS using SHA-384 and MGF1 with SHA-384.
        Ps384 => "PS384",
        /// RSASSA-PSS using SHA-512 and MGF1 with SHA-512.
        Ps512 => "PS512",
        /// ECDSA using P-256 and SHA-256.
        Es256 => "ES256",
        /// ECDSA using P-384 and SHA-384.
        Es384 => "ES384",
        /// ECDSA using P-521 and SHA-512.
        Es512 => "ES512",
        /// ECDSA using secp256k1 and SHA-256.
        Es256K => "ES256K",
        /// Edwards-curve signatures (Ed25519).
        EdDsa => "EdDSA",
        /// No digital signature or MAC (unsecured JWS).
        None => "none",
    }
}

registry! {
    /// Key management algorithms for JWE (`alg`).
    pub enum KeyAlgorithm ("key management algorithm") {
        /// Direct use of a shared symmetric key as the CEK.
        Dir => "dir",
        /// AES Key Wrap with a 128-bit key.
        A128Kw => "A128KW",
        /// AES Key Wrap with a 192-bit key.
        A192Kw => "A192KW",
        /// AES Key Wrap with a 256-bit key.
        A256Kw => "A256KW",
        /// Key wrapping with AES-GCM using a 128-bit key.
        A128GcmKw => "A128GCMKW",
        /// Key wrapping with AES-GCM using a 192-bit key.
        A192GcmKw => "A192GCMKW",
        /// Key wrapping with AES-GCM using a 256-bit key.
        A256GcmKw => "A256GCMKW",
        /// RSAES-PKCS1-v1_5.
        Rsa1_5 => "RSA1_5",
        /// RSAES OAEP using default parameters (SHA-1).
        RsaOaep => "RSA-OAEP",
        /// RSAES OAEP using SHA-256 and MGF1 with SHA-256.
        RsaOaep256 => "RSA-OAEP-256",
        /// ECDH-ES using Concat KDF (direct key agreement).
        EcdhEs => "ECDH-ES",
        /// ECDH-ES using Concat KDF and CEK wrapped with A128KW.
        EcdhEsA128Kw => "ECDH-ES+A128KW",
        /// ECDH-ES using Concat KDF and CEK wrapped with A192KW.
        EcdhEsA192Kw => "ECDH-ES+A192KW",
        /// ECDH-ES using Concat KDF and CEK wrapped with A256KW.
        EcdhEsA256Kw => "ECDH-ES+A256KW",
        /// PBES2 with HMAC SHA-256 and A128KW wrapping.
        Pbes2Hs256A128Kw => "PBES2-HS256+A128KW",
        /// PBES2 with HMAC SHA-384 and A192KW wrapping.
        Pbes2Hs384A192Kw => "PBES2-HS384+A192KW",
        /// PBES2 with HMAC SHA-512 and A256KW wrapping.
        Pbes2Hs512A256Kw => "PBES2-HS512+A256KW",
    }
}

registry! {
    /// Content encryption algorithms for JWE (`enc`).
    pub enum EncAlgorithm ("content encryption algorithm") {
        /// AES-128-CBC with HMAC SHA-256 (first 128 bits) authentication.
        A128CbcHs256 => "A128CBC-HS256",
        /// AES-192-CBC with HMAC SHA-384 (first 192 bits) authentication.
        A192CbcHs384 => "A192CBC-HS384",
        /// AES-256-CBC with HMAC SHA-512 (first 256 bits) authentication.
        A256CbcHs512 => "A256CBC-HS512",
        /// AES-GCM using a 128-bit key.
        A128Gcm => "A128GCM",
        /// AES-GCM using a 192-bit key.
        A192Gcm => "A192GCM",
        /// AES-GCM using a 256-bit key.
        A256Gcm => "A256GCM",
    }
}

registry! {
    /// JWE compression algorithms (`zip`).
    pub enum Zip ("compression algorithm") {
        /// DEFLATE ([RFC1951]).
        ///
        /// [RFC1951]: https://www.rfc-editor.org/rfc/rfc1951
        Deflate => "DEF",
    }
}

impl EncAlgorithm {
    /// Content encryption key size in bytes.
    #[must_use]
    pub const fn key_size(self) -> usize {
        match self {
            Self::A128Gcm => 16,
            Self::A192Gcm => 24,
            Self::A128CbcHs256 | Self::A256Gcm => 32,
            Self::A192CbcHs384 => 48,
            Self::A256CbcHs512 => 64,
        }
    }
}

impl KeyAlgorithm {
    /// Size in bytes of the key used to wrap the CEK, for algorithms that
    /// wrap with AES.
    #[must_use]
    pub const fn wrapping_key_size(self) -> Option<usize> {
        match self {
            Self::A128Kw | Self::A128GcmKw | Self::EcdhEsA128Kw | Self::Pbes2Hs256A128Kw => {
                Some(16)
            }
            Self::A192Kw | Self::A192GcmKw | Self::EcdhEsA192Kw | Self::Pbes2Hs384A192Kw => {
                Some(24)
            }
            Self::A256Kw | Self::A256GcmKw | Self::EcdhEsA256Kw | Self::Pbes2Hs512A256Kw => {
                Some(32)
            }
            Self::Dir | Self::Rsa1_5 | Self::RsaOaep | Self::RsaOaep256 | Self::EcdhEs => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identifiers() {
        for alg in Algorithm::ALL {
            assert_eq!(alg.as_str().parse::<Algorithm>().expect("should parse"), *alg);
        }
        for alg in KeyAlgorithm::ALL {
            assert_eq!(alg.to_string().parse::<KeyAlgorithm>().expect("should parse"), *alg);
        }
        assert_eq!(Algorithm::ALL.len(), 15);
        assert_eq!(KeyAlgorithm::ALL.len(), 17);
        assert_eq!(EncAlgorithm::ALL.len(), 6);
    }

    #[test]
    fn unsupported() {
        assert!(matches!("HS1".parse::<Algorithm>(), Err(Error::UnsupportedAlgorithm(_))));
        assert!(matches!("hs256".parse::<Algorithm>(), Err(Error::UnsupportedAlgorithm(_))));
        assert!(matches!("GZIP".parse::<Zip>(), Err(Error::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn sizes() {
        assert_eq!(EncAlgorithm::A192CbcHs384.key_size(), 48);
        assert_eq!(KeyAlgorithm::Pbes2Hs384A192Kw.wrapping_key_size(), Some(24));
        assert_eq!(KeyAlgorithm::RsaOaep.wrapping_key_size(), None);
    }
}
