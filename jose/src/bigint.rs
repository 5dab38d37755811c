//! # Big Integers
//!
//! Arbitrary precision unsigned integers for the "Base64urlUInt" JWK
//! parameters of RSA keys ([RFC7518] §2).
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518#section-2

use std::fmt::{self, Display};
use std::str::FromStr;

use jwx_primitives::BigUint;

use crate::{Error, Result, base64url};

/// An unsigned big integer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BigInt(BigUint);

impl BigInt {
    /// Create from big-endian octets.
    #[must_use]
    pub fn from_base256(octets: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(octets))
    }

    /// Parse a decimal string.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when the string is not a non-negative
    /// decimal integer.
    pub fn from_base10(number: &str) -> Result<Self> {
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Format(format!("invalid decimal integer: {number}")));
        }
        BigUint::parse_bytes(number.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| Error::Format(format!("invalid decimal integer: {number}")))
    }

    /// Decode a base64url encoded big-endian integer.
    ///
    /// # Errors
    /// Returns [`Error::Format`] for invalid base64url.
    pub fn from_base64url(encoded: &str) -> Result<Self> {
        Ok(Self::from_base256(&base64url::decode(encoded)?))
    }

    /// Minimal big-endian octets. Zero is a single zero octet.
    #[must_use]
    pub fn base256(&self) -> Vec<u8> {
        self.0.to_bytes_be()
    }

    /// Decimal representation.
    #[must_use]
    pub fn base10(&self) -> String {
        self.0.to_str_radix(10)
    }

    /// Lower-case hexadecimal representation.
    #[must_use]
    pub fn base16(&self) -> String {
        self.0.to_str_radix(16)
    }

    /// Base64url encoding of the minimal big-endian octets.
    #[must_use]
    pub fn to_base64url(&self) -> String {
        base64url::encode(self.base256())
    }

    /// Borrow the underlying integer.
    #[must_use]
    pub const fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base10())
    }
}

impl FromStr for BigInt {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base10(s)
    }
}

impl From<BigUint> for BigInt {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl From<&BigUint> for BigInt {
    fn from(value: &BigUint) -> Self {
        Self(value.clone())
    }
}

impl From<BigInt> for BigUint {
    fn from(value: BigInt) -> Self {
        value.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn conversions() {
        let n = BigInt::from_base10("65537").expect("should parse");
        assert_eq!(n.base256(), [0x01, 0x00, 0x01]);
        assert_eq!(n.base16(), "10001");
        assert_eq!(n.to_base64url(), "AQAB");
        assert_eq!(BigInt::from_base64url("AQAB").expect("should decode"), n);
        assert_eq!(n.to_string(), "65537");
    }

    #[test]
    fn leading_zeros() {
        let n = BigInt::from_base256(&[0, 0, 1, 0]);
        assert_eq!(n.base256(), [1, 0]);
        assert_eq!(BigInt::from_base256(&[]).base256(), [0]);
    }

    #[test]
    fn invalid_decimal() {
        assert!(BigInt::from_base10("12a").is_err());
        assert!(BigInt::from_base10("-1").is_err());
        assert!("".parse::<BigInt>().is_err());
    }
}
