//! # Errors

use thiserror::Error;

/// Result type for JOSE operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by JOSE operations.
///
/// Verification and decryption failures are deliberately opaque: they do not
/// say whether a key, a tag or the ciphertext was at fault.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed compact serialization, base64url, JSON or header parameter.
    #[error("format error: {0}")]
    Format(String),

    /// The algorithm declared in a header is not the algorithm supplied to
    /// process it.
    #[error("algorithm mismatch: expected `{expected}`, found `{found}`")]
    AlgorithmMismatch {
        /// Identifier of the supplied algorithm.
        expected: String,

        /// Identifier declared by the header.
        found: String,
    },

    /// The algorithm identifier is not registered or not supported.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The key is malformed or not usable with the algorithm.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Signature or MAC verification failed.
    #[error("signature verification failed")]
    Verification,

    /// Key unwrapping or authenticated decryption failed.
    #[error("decryption failed")]
    Decryption,

    /// A claim failed validation.
    #[error("validation of claim '{0}' failed")]
    ClaimValidation(String),

    /// The operation is not permitted in this state, such as decrypting
    /// without a private key.
    #[error("operation not permitted: {0}")]
    NotPermitted(String),

    /// A cryptographic primitive failed while producing output.
    #[error("cryptographic operation failed: {0}")]
    Crypto(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Format(format!("issue with JSON: {e}"))
    }
}
