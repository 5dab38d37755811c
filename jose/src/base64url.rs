//! # Base64url
//!
//! URL-safe base64 without padding ([RFC4648] §5), as used by every JOSE
//! serialization.
//!
//! [RFC4648]: https://www.rfc-editor.org/rfc/rfc4648#section-5

use base64ct::{Base64UrlUnpadded, Encoding};

use crate::{Error, Result};

/// Encode bytes as unpadded base64url.
#[must_use]
pub fn encode(data: impl AsRef<[u8]>) -> String {
    Base64UrlUnpadded::encode_string(data.as_ref())
}

/// Decode unpadded base64url.
///
/// # Errors
/// Returns [`Error::Format`] when the input contains characters outside the
/// base64url alphabet (including `=` padding), has a length that leaves one
/// dangling character, or has non-zero trailing bits.
pub fn decode(data: &str) -> Result<Vec<u8>> {
    if data.len() % 4 == 1 {
        return Err(Error::Format("invalid base64url length".into()));
    }
    Base64UrlUnpadded::decode_vec(data)
        .map_err(|e| Error::Format(format!("invalid base64url: {e}")))
}

/// Whether the string only contains base64url alphabet characters.
#[must_use]
pub fn is_valid(data: &str) -> bool {
    data.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
