use jwx_primitives::{BigUint, PrivateKeyParts, PublicKeyParts, RsaPrivateKey, RsaPublicKey};
use serde_json::{Map, Value};

use crate::bigint::BigInt;
use crate::jwk::{Jwk, KeyType};
use crate::{Error, Result};

/// An RSA public key JWK (`kty` of `RSA` with `n` and `e`).
#[derive(Clone, Debug)]
pub struct RsaPublicKeyJwk {
    jwk: Jwk,
    key: RsaPublicKey,
}

impl RsaPublicKeyJwk {
    /// The modulus (`n`).
    #[must_use]
    pub fn modulus(&self) -> BigInt {
        BigInt::from(self.key.n())
    }

    /// The public exponent (`e`).
    #[must_use]
    pub fn exponent(&self) -> BigInt {
        BigInt::from(self.key.e())
    }

    /// The decoded public key.
    #[must_use]
    pub const fn public_key(&self) -> &RsaPublicKey {
        &self.key
    }

    /// The underlying JWK.
    #[must_use]
    pub const fn jwk(&self) -> &Jwk {
        &self.jwk
    }
}

impl TryFrom<&Jwk> for RsaPublicKeyJwk {
    type Error = Error;

    fn try_from(jwk: &Jwk) -> Result<Self> {
        jwk.check_key_type(KeyType::Rsa)?;
        let n = uint(jwk, "n")?;
        let e = uint(jwk, "e")?;
        let key = RsaPublicKey::new(n, e)
            .map_err(|e| Error::InvalidKey(format!("invalid RSA public key: {e}")))?;
        Ok(Self {
            jwk: jwk.clone(),
            key,
        })
    }
}

impl TryFrom<Jwk> for RsaPublicKeyJwk {
    type Error = Error;

    fn try_from(jwk: Jwk) -> Result<Self> {
        Self::try_from(&jwk)
    }
}

impl From<&RsaPublicKey> for RsaPublicKeyJwk {
    fn from(key: &RsaPublicKey) -> Self {
        let mut params = Map::new();
        params.insert("kty".into(), KeyType::Rsa.as_str().into());
        params.insert("n".into(), BigInt::from(key.n()).to_base64url().into());
        params.insert("e".into(), BigInt::from(key.e()).to_base64url().into());
        Self {
            jwk: Jwk { params },
            key: key.clone(),
        }
    }
}

impl From<RsaPublicKeyJwk> for Jwk {
    fn from(key: RsaPublicKeyJwk) -> Self {
        key.jwk
    }
}

/// An RSA private key JWK: `n`, `e`, `d`, the CRT parameters `p`, `q`,
/// `dp`, `dq`, `qi` and, for multi-prime keys, `oth`.
#[derive(Clone, Debug)]
pub struct RsaPrivateKeyJwk {
    jwk: Jwk,
    key: RsaPrivateKey,
}

impl RsaPrivateKeyJwk {
    /// Generate a new key with a modulus of `bits` bits.
    ///
    /// # Errors
    /// Returns [`Error::Crypto`] if key generation fails.
    pub fn generate(bits: usize) -> Result<Self> {
        let key = jwx_primitives::rsa_generate(bits).map_err(|e| Error::Crypto(e.to_string()))?;
        Self::from_private_key(key)
    }

    /// Create a JWK from an RSA private key.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] if the key does not have at least two
    /// primes.
    pub fn from_private_key(key: RsaPrivateKey) -> Result<Self> {
        let [p, q, others @ ..] = key.primes() else {
            return Err(Error::InvalidKey("RSA key must have at least two primes".into()));
        };
        let d = key.d();

        let mut params = Map::new();
        params.insert("kty".into(), KeyType::Rsa.as_str().into());
        params.insert("n".into(), encode(key.n()));
        params.insert("e".into(), encode(key.e()));
        params.insert("d".into(), encode(d));
        params.insert("p".into(), encode(p));
        params.insert("q".into(), encode(q));
        params.insert("dp".into(), encode(&crt_exponent(d, p)));
        params.insert("dq".into(), encode(&crt_exponent(d, q)));
        params.insert("qi".into(), encode(&crt_coefficient(q, p)));

        if !others.is_empty() {
            let mut product = p * q;
            let mut oth = Vec::with_capacity(others.len());
            for r in others {
                let mut info = Map::new();
                info.insert("r".into(), encode(r));
                info.insert("d".into(), encode(&crt_exponent(d, r)));
                info.insert("t".into(), encode(&crt_coefficient(&product, r)));
                oth.push(Value::Object(info));
                product *= r;
            }
            params.insert("oth".into(), Value::Array(oth));
        }

        Ok(Self {
            jwk: Jwk { params },
            key,
        })
    }

    /// The public part of the key.
    #[must_use]
    pub fn public_key(&self) -> RsaPublicKeyJwk {
        RsaPublicKeyJwk::from(&self.key.to_public_key())
    }

    /// The decoded private key.
    #[must_use]
    pub const fn private_key(&self) -> &RsaPrivateKey {
        &self.key
    }

    /// The underlying JWK.
    #[must_use]
    pub const fn jwk(&self) -> &Jwk {
        &self.jwk
    }

    /// Return a copy with a key ID.
    #[must_use]
    pub fn with_key_id(&self, kid: impl Into<String>) -> Self {
        Self {
            jwk: self.jwk.with_key_id(kid),
            key: self.key.clone(),
        }
    }
}

impl TryFrom<&Jwk> for RsaPrivateKeyJwk {
    type Error = Error;

    fn try_from(jwk: &Jwk) -> Result<Self> {
        jwk.check_key_type(KeyType::Rsa)?;
        let n = uint(jwk, "n")?;
        let e = uint(jwk, "e")?;
        let d = uint(jwk, "d")?;
        let p = uint(jwk, "p")?;
        let q = uint(jwk, "q")?;

        let mut checks = vec![
            (uint(jwk, "dp")?, crt_exponent(&d, &p)),
            (uint(jwk, "dq")?, crt_exponent(&d, &q)),
            (uint(jwk, "qi")?, crt_coefficient(&q, &p)),
        ];

        let mut primes = vec![p.clone(), q.clone()];
        if let Some(oth) = jwk.get("oth") {
            let Some(oth) = oth.as_array() else {
                return Err(Error::InvalidKey("`oth` must be an array".into()));
            };
            let mut product = &p * &q;
            for info in oth {
                let r = uint_member(info, "r")?;
                checks.push((uint_member(info, "d")?, crt_exponent(&d, &r)));
                checks.push((uint_member(info, "t")?, crt_coefficient(&product, &r)));
                product *= &r;
                primes.push(r);
            }
        }

        if checks.iter().any(|(given, computed)| given != computed) {
            return Err(Error::InvalidKey("inconsistent RSA CRT parameters".into()));
        }

        let key = RsaPrivateKey::from_components(n, e, d, primes)
            .map_err(|e| Error::InvalidKey(format!("invalid RSA private key: {e}")))?;
        key.validate().map_err(|e| Error::InvalidKey(format!("invalid RSA private key: {e}")))?;

        Ok(Self {
            jwk: jwk.clone(),
            key,
        })
    }
}

impl TryFrom<Jwk> for RsaPrivateKeyJwk {
    type Error = Error;

    fn try_from(jwk: Jwk) -> Result<Self> {
        Self::try_from(&jwk)
    }
}

impl From<RsaPrivateKeyJwk> for Jwk {
    fn from(key: RsaPrivateKeyJwk) -> Self {
        key.jwk
    }
}

fn uint(jwk: &Jwk, name: &str) -> Result<BigUint> {
    Ok(BigInt::from_base64url(jwk.required_str(name)?)?.into())
}

fn uint_member(info: &Value, name: &str) -> Result<BigUint> {
    let Some(encoded) = info.get(name).and_then(Value::as_str) else {
        return Err(Error::InvalidKey(format!("`oth` member missing `{name}`")));
    };
    Ok(BigInt::from_base64url(encoded)?.into())
}

fn encode(value: &BigUint) -> Value {
    BigInt::from(value).to_base64url().into()
}

// d mod (r - 1)
fn crt_exponent(d: &BigUint, r: &BigUint) -> BigUint {
    d % &(r - &BigUint::from(1u32))
}

// factor^-1 mod r, for prime r
fn crt_coefficient(factor: &BigUint, r: &BigUint) -> BigUint {
    (factor % r).modpow(&(r - &BigUint::from(2u32)), r)
}

#[cfg(test)]
mod test {
    use super::*;

    // RFC 7517 Appendix A.2
    const PRIVATE_JWK: &str = r#"{
        "kty":"RSA",
        "n":"0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
        "e":"AQAB",
        "d":"X4cTteJY_gn4FYPsXB8rdXix5vwsg1FLN5E3EaG6RJoVH-HLLKD9M7dx5oo7GURknchnrRweUkC7hT5fJLM0WbFAKNLWY2vv7B6NqXSzUvxT0_YSfqijwp3RTzlBaCxWp4doFk5N2o8Gy_nHNKroADIkJ46pRUohsXywbReAdYaMwFs9tv8d_cPVY3i07a3t8MN6TNwm0dSawm9v47UiCl3Sk5ZiG7xojPLu4sbg1U2jx4IBTNBznbJSzFHK66jT8bgkuqsk0GjskDJk19Z4qwjwbsnn4j2WBii3RL-Us2lGVkY8fkFzme1z0HbIkfz0Y6mqnOYtqc0X4jfcKoAC8Q",
        "p":"83i-7IvMGXoMXCskv73TKr8637FiO7Z27zv8oj6pbWUQyLPQBQxtPVnwD20R-60eTDmD2ujnMt5PoqMrm8RfmNhVWDtjjMmCMjOpSXicFHj7XOuVIYQyqVWlWEh6dN36GVZYk93N8Bc9vY41xy8B9RzzOGVQzXvNEvn7O0nVbfs",
        "q":"3dfOR9cuYq-0S-mkFLzgItgMEfFzB2q3hWehMuG0oCuqnb3vobLyumqjVZQO1dIrdwgTnCdpYzBcOfW5r370AFXjiWft_NGEiovonizhKpo9VVS78TzFgxkIdrecRezsZ-1kYd_s1qDbxtkDEgfAITAG9LUnADun4vIcb6yelxk",
        "dp":"G4sPXkc6Ya9y8oJW9_ILj4xuppu0lzi_H7VTkS8xj5SdX3coE0oimYwxIi2emTAue0UOa5dpgFGyBJ4c8tQ2VF402XRugKDTP8akYhFo5tAA77Qe_NmtuYZc3C3m3I24G2GvR5sSDxUyAN2zq8Lfn9EUms6rY3Ob8YeiKkTiBj0",
        "dq":"s9lAH9fggBsoFR8Oac2R_E2gw282rT2kGOAhvIllETE1efrA6huUUvMfBcMpn8lqeW6vzznYY5SSQF7pMdC_agI3nG8Ibp1BUb0JUiraRNqUfLhcQb_d9GF4Dh7e74WbRsobRonujTYN1xCaP6TO61jvWrX-L18txXw494Q_cgk",
        "qi":"GyM_p6JrXySiz1toFgKbWV-JdI3jQ4ypu9rbMWx3rQJBfmt0FoYzgUIZEVFEcOqwemRN81zoDAaa-Bk0KWNGDjJHZDdDmFhW3AN7lI-puxk_mHZGJ11rxyR8O55XLSe3SPmRfKwZI6yU24ZxvQKFYItdldUKGzO6Ia6zTKhAVRU",
        "alg":"RS256",
        "kid":"2011-04-29"
    }"#;

    #[test]
    fn private_jwk() {
        let jwk = Jwk::from_json(PRIVATE_JWK).expect("should parse");
        let key = RsaPrivateKeyJwk::try_from(&jwk).expect("should be a private key");
        assert_eq!(key.public_key().exponent().base10(), "65537");
        assert_eq!(key.public_key().modulus().base256().len(), 256);

        // re-encoding produces the same key parameters
        let encoded = RsaPrivateKeyJwk::from_private_key(key.private_key().clone())
            .expect("should encode");
        for name in ["n", "e", "d", "p", "q", "dp", "dq", "qi"] {
            assert_eq!(encoded.jwk().get(name), jwk.get(name), "parameter {name}");
        }
    }

    #[test]
    fn inconsistent_crt() {
        let jwk = Jwk::from_json(PRIVATE_JWK).expect("should parse").with_parameter("qi", "AQAB");
        assert!(matches!(RsaPrivateKeyJwk::try_from(&jwk), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn missing_parameters() {
        let jwk = Jwk::from_json(PRIVATE_JWK).expect("should parse");
        let public = jwk.to_public().expect("should strip");
        assert!(RsaPublicKeyJwk::try_from(&public).is_ok());
        assert!(matches!(RsaPrivateKeyJwk::try_from(&public), Err(Error::InvalidKey(_))));

        let jwk = Jwk::from_json(r#"{"kty":"RSA","e":"AQAB"}"#).expect("should parse");
        assert!(matches!(RsaPublicKeyJwk::try_from(jwk), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn public_from_key() {
        let jwk = Jwk::from_json(PRIVATE_JWK).expect("should parse");
        let key = RsaPrivateKeyJwk::try_from(&jwk).expect("should be a private key");
        let public = key.public_key();
        assert_eq!(public.jwk().get("n"), jwk.get("n"));
        assert!(!public.jwk().is_private());
    }
}
