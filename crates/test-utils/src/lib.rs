//! # Test Utilities
//!
//! Key fixtures, as JWK JSON, for tests. Keys are generated on first use and
//! cached by name so tests sharing a name share a key.

use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use base64ct::{Base64UrlUnpadded, Encoding};
use dashmap::DashMap;
use jwx_primitives::{BigUint, Curve, PrivateKeyParts, PublicKeyParts, random_bytes, rsa_generate};
use serde_json::{Value, json};

const RSA_BITS: usize = 2048;

static KEYS: LazyLock<DashMap<String, Value>> = LazyLock::new(DashMap::new);

/// A 2048-bit RSA private key JWK.
///
/// # Panics
/// Panics if the key cannot be generated.
#[must_use]
pub fn rsa_jwk(name: &str) -> Value {
    cached(&format!("rsa:{name}"), generate_rsa).expect("should generate RSA key")
}

/// An `EC` (or, for Ed25519 and X25519, `OKP`) private key JWK on `curve`.
///
/// # Panics
/// Panics if the key cannot be generated.
#[must_use]
pub fn ec_jwk(name: &str, curve: Curve) -> Value {
    cached(&format!("{curve}:{name}"), || generate_ec(curve)).expect("should generate EC key")
}

/// An `oct` JWK holding a random key of `len` bytes.
#[must_use]
pub fn oct_jwk(name: &str, len: usize) -> Value {
    let key = KEYS.entry(format!("oct{len}:{name}")).or_insert_with(|| {
        json!({
            "kty": "oct",
            "k": Base64UrlUnpadded::encode_string(&random_bytes(len)),
        })
    });
    key.value().clone()
}

/// Remove the private parameters from a private key JWK.
#[must_use]
pub fn public_jwk(jwk: &Value) -> Value {
    let mut public = jwk.clone();
    if let Some(params) = public.as_object_mut() {
        for name in ["d", "p", "q", "dp", "dq", "qi", "oth"] {
            params.remove(name);
        }
    }
    public
}

fn cached(id: &str, generate: impl FnOnce() -> Result<Value>) -> Result<Value> {
    if let Some(key) = KEYS.get(id) {
        return Ok(key.value().clone());
    }
    let key = generate()?;
    Ok(KEYS.entry(id.to_string()).or_insert(key).value().clone())
}

fn generate_rsa() -> Result<Value> {
    let key = rsa_generate(RSA_BITS)?;
    let [p, q, ..] = key.primes() else {
        return Err(anyhow!("RSA key should have two primes"));
    };
    let d = key.d();
    let one = BigUint::from(1u32);
    let two = BigUint::from(2u32);

    // p is prime, so q^(p-2) is the inverse of q mod p
    let qi = q.modpow(&(p - &two), p);

    Ok(json!({
        "kty": "RSA",
        "n": encode(key.n()),
        "e": encode(key.e()),
        "d": encode(d),
        "p": encode(p),
        "q": encode(q),
        "dp": encode(&(d % (p - &one))),
        "dq": encode(&(d % (q - &one))),
        "qi": encode(&qi),
    }))
}

fn generate_ec(curve: Curve) -> Result<Value> {
    let secret = curve.generate();
    let public = secret.public_key()?;

    let mut jwk = json!({
        "kty": if curve.has_y() { "EC" } else { "OKP" },
        "crv": curve.to_string(),
        "x": Base64UrlUnpadded::encode_string(public.x()),
        "d": Base64UrlUnpadded::encode_string(secret.as_bytes()),
    });
    if let Some(y) = public.y() {
        jwk["y"] = Base64UrlUnpadded::encode_string(y).into();
    }
    Ok(jwk)
}

fn encode(n: &BigUint) -> String {
    Base64UrlUnpadded::encode_string(&n.to_bytes_be())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cached_by_name() {
        assert_eq!(oct_jwk("a", 16), oct_jwk("a", 16));
        assert_ne!(oct_jwk("a", 16), oct_jwk("b", 16));

        let jwk = ec_jwk("a", Curve::X25519);
        assert_eq!(jwk["kty"], "OKP");
        assert!(jwk.get("y").is_none());
        assert_eq!(ec_jwk("a", Curve::P256)["kty"], "EC");
        assert!(public_jwk(&jwk).get("d").is_none());
    }
}
