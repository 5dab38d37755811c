use jwx_primitives::{Curve, PublicKey, SecretKey};
use serde_json::Map;
use zeroize::Zeroizing;

use crate::jwk::{Jwk, KeyType};
use crate::{Error, Result, base64url};

/// A public key JWK on a Weierstrass curve (`kty` of `EC`): P-256, P-384,
/// P-521 or secp256k1.
#[derive(Clone, Debug)]
pub struct EcPublicKeyJwk {
    jwk: Jwk,
    key: PublicKey,
}

impl EcPublicKeyJwk {
    /// Create a JWK from a public key.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] if the key is not on a Weierstrass curve.
    pub fn from_public_key(key: PublicKey) -> Result<Self> {
        check_curve(key.curve(), KeyType::Ec)?;
        Ok(Self {
            jwk: encode_public(KeyType::Ec, &key),
            key,
        })
    }

    /// The key's curve.
    #[must_use]
    pub const fn curve(&self) -> Curve {
        self.key.curve()
    }

    /// The decoded public key.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.key
    }

    /// The underlying JWK.
    #[must_use]
    pub const fn jwk(&self) -> &Jwk {
        &self.jwk
    }
}

impl TryFrom<&Jwk> for EcPublicKeyJwk {
    type Error = Error;

    fn try_from(jwk: &Jwk) -> Result<Self> {
        Ok(Self {
            jwk: jwk.clone(),
            key: decode_public(jwk, KeyType::Ec)?,
        })
    }
}

/// A private key JWK on a Weierstrass curve.
#[derive(Clone, Debug)]
pub struct EcPrivateKeyJwk {
    jwk: Jwk,
    key: SecretKey,
    public: EcPublicKeyJwk,
}

impl EcPrivateKeyJwk {
    /// Generate a new key on the curve.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] if the curve is not a Weierstrass curve.
    pub fn generate(curve: Curve) -> Result<Self> {
        check_curve(curve, KeyType::Ec)?;
        Self::from_secret_key(curve.generate())
    }

    /// Create a JWK from a secret key.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] if the key is not on a Weierstrass curve.
    pub fn from_secret_key(key: SecretKey) -> Result<Self> {
        let public = EcPublicKeyJwk::from_public_key(derive_public(&key)?)?;
        Ok(Self {
            jwk: public.jwk.with_parameter("d", base64url::encode(key.as_bytes())),
            key,
            public,
        })
    }

    /// The public part of the key.
    #[must_use]
    pub const fn public_key(&self) -> &EcPublicKeyJwk {
        &self.public
    }

    /// The decoded secret key.
    #[must_use]
    pub const fn secret_key(&self) -> &SecretKey {
        &self.key
    }

    /// The underlying JWK.
    #[must_use]
    pub const fn jwk(&self) -> &Jwk {
        &self.jwk
    }
}

impl TryFrom<&Jwk> for EcPrivateKeyJwk {
    type Error = Error;

    fn try_from(jwk: &Jwk) -> Result<Self> {
        let (key, public) = decode_secret(jwk, KeyType::Ec)?;
        Ok(Self {
            jwk: jwk.clone(),
            key,
            public: EcPublicKeyJwk {
                jwk: jwk.to_public()?,
                key: public,
            },
        })
    }
}

/// A public key JWK on an Edwards or Montgomery curve (`kty` of `OKP`):
/// Ed25519 or X25519.
#[derive(Clone, Debug)]
pub struct OkpPublicKeyJwk {
    jwk: Jwk,
    key: PublicKey,
}

impl OkpPublicKeyJwk {
    /// Create a JWK from a public key.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] if the key is not an octet key pair.
    pub fn from_public_key(key: PublicKey) -> Result<Self> {
        check_curve(key.curve(), KeyType::Okp)?;
        Ok(Self {
            jwk: encode_public(KeyType::Okp, &key),
            key,
        })
    }

    /// The key's curve.
    #[must_use]
    pub const fn curve(&self) -> Curve {
        self.key.curve()
    }

    /// The decoded public key.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.key
    }

    /// The underlying JWK.
    #[must_use]
    pub const fn jwk(&self) -> &Jwk {
        &self.jwk
    }
}

impl TryFrom<&Jwk> for OkpPublicKeyJwk {
    type Error = Error;

    fn try_from(jwk: &Jwk) -> Result<Self> {
        Ok(Self {
            jwk: jwk.clone(),
            key: decode_public(jwk, KeyType::Okp)?,
        })
    }
}

/// A private octet key pair JWK.
#[derive(Clone, Debug)]
pub struct OkpPrivateKeyJwk {
    jwk: Jwk,
    key: SecretKey,
    public: OkpPublicKeyJwk,
}

impl OkpPrivateKeyJwk {
    /// Generate a new key on the curve.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] if the curve is not Ed25519 or X25519.
    pub fn generate(curve: Curve) -> Result<Self> {
        check_curve(curve, KeyType::Okp)?;
        Self::from_secret_key(curve.generate())
    }

    /// Create a JWK from a secret key.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] if the key is not an octet key pair.
    pub fn from_secret_key(key: SecretKey) -> Result<Self> {
        let public = OkpPublicKeyJwk::from_public_key(derive_public(&key)?)?;
        Ok(Self {
            jwk: public.jwk.with_parameter("d", base64url::encode(key.as_bytes())),
            key,
            public,
        })
    }

    /// The public part of the key.
    #[must_use]
    pub const fn public_key(&self) -> &OkpPublicKeyJwk {
        &self.public
    }

    /// The decoded secret key.
    #[must_use]
    pub const fn secret_key(&self) -> &SecretKey {
        &self.key
    }

    /// The underlying JWK.
    #[must_use]
    pub const fn jwk(&self) -> &Jwk {
        &self.jwk
    }
}

impl TryFrom<&Jwk> for OkpPrivateKeyJwk {
    type Error = Error;

    fn try_from(jwk: &Jwk) -> Result<Self> {
        let (key, public) = decode_secret(jwk, KeyType::Okp)?;
        Ok(Self {
            jwk: jwk.clone(),
            key,
            public: OkpPublicKeyJwk {
                jwk: jwk.to_public()?,
                key: public,
            },
        })
    }
}

impl From<EcPublicKeyJwk> for Jwk {
    fn from(key: EcPublicKeyJwk) -> Self {
        key.jwk
    }
}

impl From<EcPrivateKeyJwk> for Jwk {
    fn from(key: EcPrivateKeyJwk) -> Self {
        key.jwk
    }
}

impl From<OkpPublicKeyJwk> for Jwk {
    fn from(key: OkpPublicKeyJwk) -> Self {
        key.jwk
    }
}

impl From<OkpPrivateKeyJwk> for Jwk {
    fn from(key: OkpPrivateKeyJwk) -> Self {
        key.jwk
    }
}

/// Decode an `EC` or `OKP` JWK into its public key and, when the JWK holds
/// `d`, its secret key.
pub(crate) fn decode_curve_key(jwk: &Jwk) -> Result<(PublicKey, Option<SecretKey>)> {
    let kty = jwk.key_type()?;
    if !matches!(kty, KeyType::Ec | KeyType::Okp) {
        return Err(Error::InvalidKey(format!("expected `EC` or `OKP` key, found `{kty}`")));
    }
    if jwk.has("d") {
        let (secret, public) = decode_secret(jwk, kty)?;
        return Ok((public, Some(secret)));
    }
    Ok((decode_public(jwk, kty)?, None))
}

/// Encode a public key as an `EC` or `OKP` JWK, depending on its curve.
pub(crate) fn encode_curve_key(key: &PublicKey) -> Jwk {
    let kty = if key.curve().has_y() { KeyType::Ec } else { KeyType::Okp };
    encode_public(kty, key)
}

// Weierstrass curves belong to `EC` keys, the others to `OKP` keys.
fn check_curve(curve: Curve, kty: KeyType) -> Result<()> {
    if curve.has_y() != (kty == KeyType::Ec) {
        return Err(Error::InvalidKey(format!("`{curve}` is not a `{kty}` curve")));
    }
    Ok(())
}

fn decode_public(jwk: &Jwk, kty: KeyType) -> Result<PublicKey> {
    jwk.check_key_type(kty)?;
    let crv = jwk.required_str("crv")?;
    let curve: Curve =
        crv.parse().map_err(|_| Error::InvalidKey(format!("unsupported curve `{crv}`")))?;
    check_curve(curve, kty)?;

    let x = jwk.required_bytes("x")?;
    let y = if curve.has_y() { Some(jwk.required_bytes("y")?) } else { None };
    PublicKey::new(curve, x, y).map_err(|e| Error::InvalidKey(e.to_string()))
}

fn decode_secret(jwk: &Jwk, kty: KeyType) -> Result<(SecretKey, PublicKey)> {
    let public = decode_public(jwk, kty)?;
    let d = Zeroizing::new(jwk.required_bytes("d")?);
    let key = SecretKey::new(public.curve(), &d).map_err(|e| Error::InvalidKey(e.to_string()))?;
    if derive_public(&key)? != public {
        return Err(Error::InvalidKey("`d` does not match the public key".into()));
    }
    Ok((key, public))
}

fn derive_public(key: &SecretKey) -> Result<PublicKey> {
    key.public_key().map_err(|e| Error::InvalidKey(e.to_string()))
}

fn encode_public(kty: KeyType, key: &PublicKey) -> Jwk {
    let mut params = Map::new();
    params.insert("kty".into(), kty.as_str().into());
    params.insert("crv".into(), key.curve().to_string().into());
    params.insert("x".into(), base64url::encode(key.x()).into());
    if let Some(y) = key.y() {
        params.insert("y".into(), base64url::encode(y).into());
    }
    Jwk { params }
}

#[cfg(test)]
mod test {
    use super::*;

    // RFC 7517 Appendix A.2
    const EC_JWK: &str = r#"{
        "kty":"EC",
        "crv":"P-256",
        "x":"MKBCTNIcKUSDii11ySs3526iDZ8AiTo7Tu6KPAqv7D4",
        "y":"4Etl6SRW2YiLUrN5vfvVHuhp7x8PxltmWWlbbM4IFyM",
        "d":"870MB6gfuTJ4HtUnUvYMyJpr5eUZNP4Bk43bVdj3eAE",
        "use":"enc",
        "kid":"1"
    }"#;

    // RFC 8037 Appendix A.1
    const OKP_JWK: &str = r#"{
        "kty":"OKP",
        "crv":"Ed25519",
        "d":"nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A",
        "x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
    }"#;

    #[test]
    fn ec_private() {
        let jwk = Jwk::from_json(EC_JWK).expect("should parse");
        let key = EcPrivateKeyJwk::try_from(&jwk).expect("should be a private key");
        assert_eq!(key.public_key().curve(), Curve::P256);
        assert!(!key.public_key().jwk().is_private());
        assert_eq!(key.public_key().jwk().key_id(), Some("1"));
    }

    #[test]
    fn okp_private() {
        let jwk = Jwk::from_json(OKP_JWK).expect("should parse");
        let key = OkpPrivateKeyJwk::try_from(&jwk).expect("should be a private key");
        assert_eq!(key.public_key().curve(), Curve::Ed25519);

        // an OKP key is not an EC key
        assert!(matches!(EcPublicKeyJwk::try_from(&jwk), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn mismatched_d() {
        let other = EcPrivateKeyJwk::generate(Curve::P256).expect("should generate");
        let jwk = Jwk::from_json(EC_JWK)
            .expect("should parse")
            .with_parameter("d", other.jwk().get_str("d").expect("should have d"));
        assert!(matches!(EcPrivateKeyJwk::try_from(&jwk), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn wrong_curve_for_type() {
        assert!(EcPrivateKeyJwk::generate(Curve::X25519).is_err());
        assert!(OkpPrivateKeyJwk::generate(Curve::P384).is_err());

        let jwk = Jwk::from_json(r#"{"kty":"EC","crv":"P-192","x":"AA","y":"AA"}"#)
            .expect("should parse");
        assert!(matches!(EcPublicKeyJwk::try_from(&jwk), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn generated() {
        for curve in [Curve::P256, Curve::P384, Curve::P521, Curve::Es256K] {
            let key = EcPrivateKeyJwk::generate(curve).expect("should generate");
            let parsed = EcPrivateKeyJwk::try_from(key.jwk()).expect("should parse");
            assert_eq!(parsed.public_key().public_key(), key.public_key().public_key());
        }
        for curve in [Curve::Ed25519, Curve::X25519] {
            let key = OkpPrivateKeyJwk::generate(curve).expect("should generate");
            assert!(!key.jwk().has("y"));
            OkpPrivateKeyJwk::try_from(key.jwk()).expect("should parse");
        }
    }
}
