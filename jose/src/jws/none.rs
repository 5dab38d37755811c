use crate::Result;
use crate::jwa::Algorithm;
use crate::jws::SignatureAlgorithm;

/// The `none` algorithm of an unsecured JWS: the signature is empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoneAlgorithm;

impl SignatureAlgorithm for NoneAlgorithm {
    fn identifier(&self) -> Algorithm {
        Algorithm::None
    }

    fn sign(&self, _: &[u8]) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    fn verify(&self, _: &[u8], signature: &[u8]) -> Result<bool> {
        Ok(signature.is_empty())
    }
}
