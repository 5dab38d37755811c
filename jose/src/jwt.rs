//! # JSON Web Token (JWT)
//!
//! A JWT ([RFC7519]) is a set of claims carried as the payload of a JWS
//! (three parts) or a JWE (five parts). The kind of token is fixed when it
//! is parsed.
//!
//! A nested JWT is a JWT encrypted as the payload of a JWE whose header has
//! `cty` set to `JWT`.
//!
//! [RFC7519]: https://www.rfc-editor.org/rfc/rfc7519

mod claims;
mod validation;

use std::fmt::{self, Display};
use std::str::FromStr;

pub use self::claims::{
    AUDIENCE, Claim, Claims, EXPIRATION_TIME, ISSUED_AT, ISSUER, JWT_ID, NOT_BEFORE, SUBJECT,
    Validator,
};
pub use self::validation::{DEFAULT_LEEWAY_SECONDS, ValidationContext};
use crate::header::{CONTENT_TYPE_JWT, Header, JoseHeader};
use crate::jwa::{Algorithm, EncAlgorithm, KeyAlgorithm, Zip};
use crate::jwe::Jwe;
use crate::jwe::content::{ContentEncryptionAlgorithm, content_algorithm};
use crate::jwe::key::{KeyManagementAlgorithm, key_algorithm};
use crate::jwk::{Jwk, JwkSet};
use crate::jws::{Jws, SignatureAlgorithm, signature_algorithm};
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Jws(Jws),
    Jwe(Jwe),
}

/// A JWT in compact serialization, signed (JWS) or encrypted (JWE).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jwt {
    token: Token,
}

impl Jwt {
    /// Parse a compact token: three parts make a JWS, five a JWE.
    ///
    /// # Errors
    /// Returns [`Error::Format`] for any other number of parts, or when the
    /// parts are malformed.
    pub fn new(token: &str) -> Result<Self> {
        let token = match token.split('.').count() {
            3 => Token::Jws(Jws::from_compact(token)?),
            5 => Token::Jwe(Jwe::from_compact(token)?),
            n => return Err(Error::Format(format!("not a JWT: {n} parts"))),
        };
        Ok(Self { token })
    }

    /// Create an unsecured JWT (`alg` of `none`).
    ///
    /// # Errors
    /// Returns [`Error::Format`] when the header carries critical parameters.
    pub fn unsecured_from_claims(claims: &Claims, header: Option<&Header>) -> Result<Self> {
        let jws = Jws::unsecured(claims.to_json().as_bytes(), header)?;
        Ok(Self {
            token: Token::Jws(jws),
        })
    }

    /// Create a signed JWT.
    ///
    /// # Errors
    /// Returns the error of [`Jws::sign`].
    pub fn signed_from_claims(
        claims: &Claims, algorithm: &dyn SignatureAlgorithm, header: Option<&Header>,
    ) -> Result<Self> {
        let jws = Jws::sign(claims.to_json().as_bytes(), algorithm, header)?;
        Ok(Self {
            token: Token::Jws(jws),
        })
    }

    /// Create an encrypted JWT.
    ///
    /// # Errors
    /// Returns the error of [`Jwe::encrypt`].
    pub fn encrypted_from_claims(
        claims: &Claims, key_alg: &dyn KeyManagementAlgorithm,
        enc_alg: &dyn ContentEncryptionAlgorithm, zip: Option<Zip>, header: Option<&Header>,
    ) -> Result<Self> {
        let jwe = Jwe::encrypt(claims.to_json().as_bytes(), key_alg, enc_alg, zip, header)?;
        Ok(Self {
            token: Token::Jwe(jwe),
        })
    }

    /// Whether the token is a JWS.
    #[must_use]
    pub const fn is_jws(&self) -> bool {
        matches!(self.token, Token::Jws(_))
    }

    /// Whether the token is a JWE.
    #[must_use]
    pub const fn is_jwe(&self) -> bool {
        matches!(self.token, Token::Jwe(_))
    }

    /// The token as a JWS.
    ///
    /// # Errors
    /// Returns [`Error::NotPermitted`] when the token is a JWE.
    pub fn jws(&self) -> Result<&Jws> {
        match &self.token {
            Token::Jws(jws) => Ok(jws),
            Token::Jwe(_) => Err(Error::NotPermitted("token is not a JWS".into())),
        }
    }

    /// The token as a JWE.
    ///
    /// # Errors
    /// Returns [`Error::NotPermitted`] when the token is a JWS.
    pub fn jwe(&self) -> Result<&Jwe> {
        match &self.token {
            Token::Jwe(jwe) => Ok(jwe),
            Token::Jws(_) => Err(Error::NotPermitted("token is not a JWE".into())),
        }
    }

    /// The token's JOSE header.
    #[must_use]
    pub const fn header(&self) -> &JoseHeader {
        match &self.token {
            Token::Jws(jws) => jws.header(),
            Token::Jwe(jwe) => jwe.header(),
        }
    }

    /// The compact serialization.
    #[must_use]
    pub fn token(&self) -> String {
        match &self.token {
            Token::Jws(jws) => jws.to_compact(),
            Token::Jwe(jwe) => jwe.to_compact(),
        }
    }

    /// Whether the token is a nested JWT: `cty` is present and is `JWT`.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.header().content_type() == Some(CONTENT_TYPE_JWT)
    }

    /// Verify the signature and validate the claims.
    ///
    /// # Errors
    /// Returns [`Error::NotPermitted`] when the token is not a JWS,
    /// [`Error::Verification`] when the signature is invalid and
    /// [`Error::ClaimValidation`] when a claim fails validation.
    pub fn claims_from_jws(
        &self, algorithm: &dyn SignatureAlgorithm, ctx: &ValidationContext,
    ) -> Result<Claims> {
        let jws = self.jws()?;
        tracing::debug!(alg = %algorithm.identifier(), "claims_from_jws");

        if !jws.verify(algorithm)? {
            return Err(Error::Verification);
        }
        let claims = Claims::from_json(jws.payload())?;
        ctx.validate(&claims)?;
        Ok(claims)
    }

    /// Decrypt the token and validate the claims.
    ///
    /// # Errors
    /// Returns [`Error::NotPermitted`] when the token is not a JWE,
    /// [`Error::Decryption`] when it cannot be decrypted and
    /// [`Error::ClaimValidation`] when a claim fails validation.
    pub fn claims_from_jwe(
        &self, key_alg: &dyn KeyManagementAlgorithm, enc_alg: &dyn ContentEncryptionAlgorithm,
        ctx: &ValidationContext,
    ) -> Result<Claims> {
        let jwe = self.jwe()?;
        tracing::debug!(
            alg = %key_alg.identifier(), enc = %enc_alg.identifier(), "claims_from_jwe"
        );

        let claims = Claims::from_json(&jwe.decrypt(key_alg, enc_alg)?)?;
        ctx.validate(&claims)?;
        Ok(claims)
    }

    /// Verify or decrypt the token with a key from the set, then validate
    /// the claims.
    ///
    /// The key is the one matching the header's `kid`, or the only key in
    /// the set when the header has none. Algorithms are taken from the
    /// header and checked against the key: its type, and its `alg` when
    /// present. `none` is never accepted.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when no suitable key is found, and the
    /// errors of [`Jwt::claims_from_jws`] and [`Jwt::claims_from_jwe`].
    pub fn claims(&self, keys: &JwkSet, ctx: &ValidationContext) -> Result<Claims> {
        let header = self.header();
        let jwk = select_key(keys, header.key_id())?;
        let alg = header.required_str("alg")?;

        match &self.token {
            Token::Jws(_) => {
                let algorithm = signature_algorithm(alg.parse::<Algorithm>()?, jwk)?;
                self.claims_from_jws(algorithm.as_ref(), ctx)
            }
            Token::Jwe(_) => {
                let enc: EncAlgorithm = header.required_str("enc")?.parse()?;
                let key_alg = key_algorithm(alg.parse::<KeyAlgorithm>()?, jwk)?;
                self.claims_from_jwe(key_alg.as_ref(), content_algorithm(enc).as_ref(), ctx)
            }
        }
    }

    /// Encrypt this token as the payload of a JWE with `cty` set to `JWT`.
    ///
    /// # Errors
    /// Returns the error of [`Jwe::encrypt`].
    pub fn encrypt_nested(
        &self, key_alg: &dyn KeyManagementAlgorithm, enc_alg: &dyn ContentEncryptionAlgorithm,
        zip: Option<Zip>, header: Option<&Header>,
    ) -> Result<Self> {
        let header = header.cloned().unwrap_or_default().with_parameter("cty", CONTENT_TYPE_JWT);
        let jwe = Jwe::encrypt(self.token().as_bytes(), key_alg, enc_alg, zip, Some(&header))?;
        Ok(Self {
            token: Token::Jwe(jwe),
        })
    }

    /// Decrypt a nested JWT, returning the inner token.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when the token is not nested or the payload
    /// is not a JWT, and the error of [`Jwe::decrypt`].
    pub fn nested_from_jwe(
        &self, key_alg: &dyn KeyManagementAlgorithm, enc_alg: &dyn ContentEncryptionAlgorithm,
    ) -> Result<Self> {
        if !self.is_nested() {
            return Err(Error::Format("not a nested JWT".into()));
        }
        let payload = self.jwe()?.decrypt(key_alg, enc_alg)?;
        let token = String::from_utf8(payload)
            .map_err(|e| Error::Format(format!("nested JWT is not UTF-8: {e}")))?;
        Self::new(&token)
    }
}

fn select_key<'a>(keys: &'a JwkSet, kid: Option<&str>) -> Result<&'a Jwk> {
    let jwk = match kid {
        Some(kid) => keys.by_key_id(kid),
        None if keys.len() == 1 => keys.first(),
        None => None,
    };
    jwk.ok_or_else(|| match kid {
        Some(kid) => Error::InvalidKey(format!("no key with ID `{kid}`")),
        None => Error::InvalidKey("token has no `kid` and the set has several keys".into()),
    })
}

impl From<Jws> for Jwt {
    fn from(jws: Jws) -> Self {
        Self {
            token: Token::Jws(jws),
        }
    }
}

impl From<Jwe> for Jwt {
    fn from(jwe: Jwe) -> Self {
        Self {
            token: Token::Jwe(jwe),
        }
    }
}

impl FromStr for Jwt {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl Display for Jwt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}
