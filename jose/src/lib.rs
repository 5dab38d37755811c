//! # JSON Object Signing and Encryption
//!
//! JWS, JWE, JWK and JWT in compact serialization, with the algorithms of
//! JWA ([RFC7518]).
//!
//! Every operation that processes a token takes the algorithm (bound to a
//! key) from the caller and checks it against the token's header. Tokens
//! never select the algorithm used to verify or decrypt them.
//!
//! ```rust,ignore
//! use jwx::jwa::Algorithm;
//! use jwx::jws::Hmac;
//! use jwx::jwt::{Claim, Claims, Jwt, ValidationContext};
//!
//! let hmac = Hmac::new(Algorithm::Hs256, &key)?;
//! let claims = Claims::new().with_claim(Claim::issuer("joe"));
//! let jwt = Jwt::signed_from_claims(&claims, &hmac, None)?;
//!
//! let ctx = ValidationContext::new().with_issuer("joe");
//! let claims = jwt.claims_from_jws(&hmac, &ctx)?;
//! ```
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

pub mod base64url;
pub mod bigint;
mod error;
pub mod header;
pub mod jwa;
pub mod jwe;
pub mod jwk;
pub mod jws;
pub mod jwt;

pub use crate::error::{Error, Result};
pub use crate::jwe::Jwe;
pub use crate::jwk::{Jwk, JwkSet};
pub use crate::jws::Jws;
pub use crate::jwt::Jwt;
