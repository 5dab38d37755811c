use jwx_primitives::{Hash, aes_kw_unwrap, aes_kw_wrap, derive_password_key, random_bytes};
use zeroize::Zeroizing;

use crate::header::Header;
use crate::jwa::KeyAlgorithm;
use crate::jwe::key::{KeyManagementAlgorithm, check_jwk_algorithm, wrapping_key_size};
use crate::jwk::{Jwk, SymmetricKeyJwk};
use crate::{Error, Result, base64url};

/// PBKDF2 iteration count used unless one is set explicitly.
pub const DEFAULT_ITERATIONS: u32 = 4096;

/// Largest `p2c` accepted when decrypting.
pub const MAX_ITERATIONS: u32 = 1_000_000;

const SALT_LEN: usize = 16;

/// Password-based key wrapping ([RFC7518] §4.8): `PBES2-HS256+A128KW`,
/// `PBES2-HS384+A192KW` and `PBES2-HS512+A256KW`.
///
/// The KEK is `PBKDF2(password, UTF8(alg) || 0x00 || p2s, p2c)`. Salt input
/// (`p2s`) and count (`p2c`) are sent in the header.
///
/// [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518#section-4.8
#[derive(Clone, Debug)]
pub struct Pbes2 {
    alg: KeyAlgorithm,
    hash: Hash,
    password: Zeroizing<Vec<u8>>,
    salt: Option<Vec<u8>>,
    iterations: u32,
    key_id: Option<String>,
}

impl Pbes2 {
    /// Create the algorithm for a password. Each encryption uses a fresh
    /// random salt and [`DEFAULT_ITERATIONS`] unless set otherwise.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedAlgorithm`] when `alg` is not a PBES2
    /// algorithm.
    pub fn new(alg: KeyAlgorithm, password: &[u8]) -> Result<Self> {
        let hash = match alg {
            KeyAlgorithm::Pbes2Hs256A128Kw => Hash::Sha256,
            KeyAlgorithm::Pbes2Hs384A192Kw => Hash::Sha384,
            KeyAlgorithm::Pbes2Hs512A256Kw => Hash::Sha512,
            _ => return Err(Error::UnsupportedAlgorithm(format!("{alg} is not PBES2"))),
        };
        Ok(Self {
            alg,
            hash,
            password: Zeroizing::new(password.to_vec()),
            salt: None,
            iterations: DEFAULT_ITERATIONS,
            key_id: None,
        })
    }

    /// Create the algorithm using the key of an `oct` JWK as the password.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when the JWK is not a symmetric key for
    /// `alg`.
    pub fn from_jwk(alg: KeyAlgorithm, jwk: &Jwk) -> Result<Self> {
        check_jwk_algorithm(jwk, alg)?;
        let key = SymmetricKeyJwk::try_from(jwk)?;
        let mut pbes2 = Self::new(alg, key.key())?;
        pbes2.key_id = jwk.key_id().map(ToString::to_string);
        Ok(pbes2)
    }

    /// Use a fixed salt input for every encryption.
    #[must_use]
    pub fn with_salt(mut self, salt: &[u8]) -> Self {
        self.salt = Some(salt.to_vec());
        self
    }

    /// Set the iteration count used for encryption.
    ///
    /// # Errors
    /// Returns [`Error::Format`] for a count of zero or above
    /// [`MAX_ITERATIONS`].
    pub fn with_iterations(mut self, iterations: u32) -> Result<Self> {
        check_iterations(iterations)?;
        self.iterations = iterations;
        Ok(self)
    }

    fn derive_key(&self, salt_input: &[u8], iterations: u32) -> Result<Zeroizing<Vec<u8>>> {
        let mut salt = self.alg.as_str().as_bytes().to_vec();
        salt.push(0x00);
        salt.extend_from_slice(salt_input);
        derive_password_key(
            self.hash,
            &self.password,
            &salt,
            iterations,
            wrapping_key_size(self.alg)?,
        )
        .map_err(|e| Error::Crypto(e.to_string()))
    }
}

impl KeyManagementAlgorithm for Pbes2 {
    fn identifier(&self) -> KeyAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: &[u8], _: &Header) -> Result<(Vec<u8>, Header)> {
        let salt = self.salt.clone().unwrap_or_else(|| random_bytes(SALT_LEN));
        let kek = self.derive_key(&salt, self.iterations)?;
        let wrapped = aes_kw_wrap(&kek, cek).map_err(|e| Error::Crypto(e.to_string()))?;

        let header = Header::new()
            .with_parameter("p2s", base64url::encode(&salt))
            .with_parameter("p2c", self.iterations);
        Ok((wrapped, header))
    }

    fn decrypt(&self, encrypted_key: &[u8], header: &Header) -> Result<Zeroizing<Vec<u8>>> {
        let salt = header.required_bytes("p2s")?;
        let iterations = header
            .get("p2c")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| Error::Format("missing `p2c` header".into()))?;
        let iterations = u32::try_from(iterations)
            .map_err(|_| Error::Format(format!("`p2c` of {iterations} is too large")))?;
        check_iterations(iterations)?;

        // a KEK that cannot be derived is indistinguishable from a wrong one
        let kek = self.derive_key(&salt, iterations).map_err(|_| Error::Decryption)?;
        aes_kw_unwrap(&kek, encrypted_key).map_err(|_| Error::Decryption)
    }
}

fn check_iterations(iterations: u32) -> Result<()> {
    if iterations == 0 || iterations > MAX_ITERATIONS {
        return Err(Error::Format(format!(
            "`p2c` must be between 1 and {MAX_ITERATIONS}, found {iterations}"
        )));
    }
    Ok(())
}
