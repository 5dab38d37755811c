use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::jwa::Zip;
use crate::{Error, Result};

/// Largest plaintext, in bytes, a compressed JWE may inflate to.
pub const MAX_DECOMPRESSED_LEN: usize = 1024 * 1024;

impl Zip {
    /// Compress the plaintext before encryption.
    ///
    /// # Errors
    /// Returns [`Error::Crypto`] if the compressor fails.
    pub fn compress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder
                    .write_all(data)
                    .map_err(|e| Error::Crypto(format!("issue deflating: {e}")))?;
                encoder.finish().map_err(|e| Error::Crypto(format!("issue deflating: {e}")))
            }
        }
    }

    /// Decompress decrypted plaintext.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when the data is not a valid DEFLATE stream
    /// or inflates to more than [`MAX_DECOMPRESSED_LEN`] bytes.
    pub fn decompress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Deflate => {
                let mut inflated = Vec::new();
                DeflateDecoder::new(data)
                    .take(MAX_DECOMPRESSED_LEN as u64 + 1)
                    .read_to_end(&mut inflated)
                    .map_err(|e| Error::Format(format!("issue inflating: {e}")))?;
                if inflated.len() > MAX_DECOMPRESSED_LEN {
                    return Err(Error::Format(format!(
                        "inflated plaintext exceeds {MAX_DECOMPRESSED_LEN} bytes"
                    )));
                }
                Ok(inflated)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deflate() {
        let data = "You can trust us to stick with you through thick and thin".repeat(20);
        let compressed = Zip::Deflate.compress(data.as_bytes()).expect("should compress");
        assert!(compressed.len() < data.len());

        let inflated = Zip::Deflate.decompress(&compressed).expect("should decompress");
        assert_eq!(inflated, data.as_bytes());

        assert!(matches!(Zip::Deflate.decompress(&[0xff; 8]), Err(Error::Format(_))));
    }

    #[test]
    fn inflate_limit() {
        let at_limit = vec![0; MAX_DECOMPRESSED_LEN];
        let compressed = Zip::Deflate.compress(&at_limit).expect("should compress");
        let inflated = Zip::Deflate.decompress(&compressed).expect("should decompress");
        assert_eq!(inflated.len(), MAX_DECOMPRESSED_LEN);

        let over = vec![0; MAX_DECOMPRESSED_LEN + 1];
        let compressed = Zip::Deflate.compress(&over).expect("should compress");
        assert!(matches!(Zip::Deflate.decompress(&compressed), Err(Error::Format(_))));
    }
}
