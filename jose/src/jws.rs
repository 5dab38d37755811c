//! # JSON Web Signature (JWS)
//!
//! JWS ([RFC7515]) represents content secured with digital signatures or MACs
//! using JSON-based data structures. Cryptographic algorithms and identifiers
//! are described in JWA ([RFC7518]).
//!
//! Only the compact serialization is supported:
//!
//! ```text
//! BASE64URL(header) '.' BASE64URL(payload) '.' BASE64URL(signature)
//! ```
//!
//! Before a signature is checked, the `alg` of the header must equal the
//! identifier of the algorithm supplied by the caller. A token cannot
//! choose the algorithm used to verify it.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

mod algorithm;
mod ecdsa;
mod eddsa;
mod hmac;
mod none;
mod rsa;

use std::fmt::{self, Display};
use std::str::FromStr;

pub use self::algorithm::{SignatureAlgorithm, signature_algorithm};
pub use self::ecdsa::Ecdsa;
pub use self::eddsa::EdDsa;
pub use self::hmac::Hmac;
pub use self::none::NoneAlgorithm;
pub use self::rsa::{MIN_RSA_BITS, RsaSignature};
use crate::header::{Header, JoseHeader};
use crate::{Error, Result, base64url};

/// A JWS in compact serialization.
///
/// Parsed tokens keep the received encoding of the header and payload, so
/// the signature is checked over exactly the bytes that were signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jws {
    header: JoseHeader,
    encoded_header: String,
    payload: Vec<u8>,
    encoded_payload: String,
    signature: Vec<u8>,
}

impl Jws {
    /// Sign the payload.
    ///
    /// The header is the caller's header (if any) with the algorithm's
    /// parameters added; `alg` and `kid` from the algorithm take precedence.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when the header carries critical parameters
    /// and the algorithm's error when signing fails.
    pub fn sign(
        payload: &[u8], algorithm: &dyn SignatureAlgorithm, header: Option<&Header>,
    ) -> Result<Self> {
        tracing::debug!(alg = %algorithm.identifier(), "sign");

        let header = header.cloned().unwrap_or_default();
        let header = header.with_parameters(&algorithm.header_parameters());
        header.check_critical()?;

        let encoded_header = header.to_b64url();
        let encoded_payload = base64url::encode(payload);
        let input = signing_input(&encoded_header, &encoded_payload);
        let signature = algorithm.sign(input.as_bytes())?;

        Ok(Self {
            header: JoseHeader::from(header),
            encoded_header,
            payload: payload.to_vec(),
            encoded_payload,
            signature,
        })
    }

    /// Create an unsecured JWS (`alg` of `none`, empty signature).
    ///
    /// # Errors
    /// Returns [`Error::Format`] when the header carries critical parameters.
    pub fn unsecured(payload: &[u8], header: Option<&Header>) -> Result<Self> {
        Self::sign(payload, &NoneAlgorithm, header)
    }

    /// Check the signature using `algorithm`.
    ///
    /// Returns `Ok(false)` when the signature does not verify.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when the header has no `alg` and
    /// [`Error::AlgorithmMismatch`] when `alg` is not the identifier of
    /// `algorithm`. No key is used in either case.
    pub fn verify(&self, algorithm: &dyn SignatureAlgorithm) -> Result<bool> {
        let expected = algorithm.identifier();
        tracing::debug!(alg = %expected, "verify");

        let Some(found) = self.header.algorithm() else {
            return Err(Error::Format("missing `alg` header".into()));
        };
        if found != expected.as_str() {
            tracing::warn!(expected = %expected, found, "algorithm mismatch");
            return Err(Error::AlgorithmMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }

        algorithm.verify(self.signing_input().as_bytes(), &self.signature)
    }

    /// Parse a compact serialization.
    ///
    /// # Errors
    /// Returns [`Error::Format`] unless the token has exactly three parts of
    /// valid base64url, the first holding a valid header without critical
    /// parameters.
    pub fn from_compact(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.split('.').collect();
        let [encoded_header, encoded_payload, signature] = parts.as_slice() else {
            return Err(Error::Format(format!("JWS must have 3 parts, found {}", parts.len())));
        };

        let header = Header::from_b64url(encoded_header)?;
        header.check_critical()?;

        Ok(Self {
            header: JoseHeader::from(header),
            encoded_header: (*encoded_header).to_string(),
            payload: base64url::decode(encoded_payload)?,
            encoded_payload: (*encoded_payload).to_string(),
            signature: base64url::decode(signature)?,
        })
    }

    /// The compact serialization.
    #[must_use]
    pub fn to_compact(&self) -> String {
        format!("{}.{}", self.signing_input(), base64url::encode(&self.signature))
    }

    /// The JOSE header.
    #[must_use]
    pub const fn header(&self) -> &JoseHeader {
        &self.header
    }

    /// The payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The signature.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The base64url encoded header, as signed.
    #[must_use]
    pub fn encoded_header(&self) -> &str {
        &self.encoded_header
    }

    /// The input to the signature: `BASE64URL(header) '.' BASE64URL(payload)`.
    #[must_use]
    pub fn signing_input(&self) -> String {
        signing_input(&self.encoded_header, &self.encoded_payload)
    }
}

fn signing_input(header: &str, payload: &str) -> String {
    format!("{header}.{payload}")
}

impl FromStr for Jws {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_compact(s)
    }
}

impl Display for Jws {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_compact())
    }
}
