//! Tests for JWE encryption and decryption across key management and
//! content encryption algorithms.

use jwx::header::Header;
use jwx::jwa::{EncAlgorithm, KeyAlgorithm, Zip};
use jwx::jwe::MAX_DECOMPRESSED_LEN;
use jwx::jwe::content::{AesCbcHmac, AesGcm, content_algorithm};
use jwx::jwe::key::{AesKw, Direct, KeyManagementAlgorithm, Pbes2, key_algorithm};
use jwx::{Error, Jwe, Jwk, base64url};
use jwx_primitives::Curve;
use serde_json::json;

// RFC 7516 Appendix A.3
const RFC7516_KEY: &str = "GawgguFyGrWKav7AX4VKUg";
const RFC7516_TOKEN: &str = concat!(
    "eyJhbGciOiJBMTI4S1ciLCJlbmMiOiJBMTI4Q0JDLUhTMjU2In0.",
    "6KB707dM9YTIgHtLvtgWQ8mKwboJW3of9locizkDTHzBC2IlrT1oOQ.",
    "AxY8DCtDaGlsbGljb3RoZQ.",
    "KDlTtXchhZTGufMYmOYGS4HffxPSUrfmqCHXaI9wOGY.",
    "U0m_YmjN04DJvceFICbCVQ",
);

fn jwk(value: serde_json::Value) -> Jwk {
    Jwk::from_value(value).expect("should be a valid JWK")
}

// A JWK suitable for the key management algorithm (and, for `dir`, the
// content encryption algorithm).
fn key_for(alg: KeyAlgorithm, enc: EncAlgorithm) -> Jwk {
    let value = match alg {
        KeyAlgorithm::Dir => test_utils::oct_jwk("dir", enc.key_size()),
        KeyAlgorithm::Rsa1_5 | KeyAlgorithm::RsaOaep | KeyAlgorithm::RsaOaep256 => {
            test_utils::rsa_jwk("encryption")
        }
        KeyAlgorithm::EcdhEs
        | KeyAlgorithm::EcdhEsA128Kw
        | KeyAlgorithm::EcdhEsA192Kw
        | KeyAlgorithm::EcdhEsA256Kw => test_utils::ec_jwk("agreement", Curve::P256),
        KeyAlgorithm::Pbes2Hs256A128Kw
        | KeyAlgorithm::Pbes2Hs384A192Kw
        | KeyAlgorithm::Pbes2Hs512A256Kw => {
            json!({"kty": "oct", "k": base64url::encode("Thus from my lips, by yours")})
        }
        _ => {
            let size = alg.wrapping_key_size().expect("should wrap with AES");
            test_utils::oct_jwk("wrap", size)
        }
    };
    jwk(value)
}

fn replace_part(token: &str, index: usize, part: &str) -> String {
    let mut parts: Vec<&str> = token.split('.').collect();
    parts[index] = part;
    parts.join(".")
}

#[test]
fn rfc7516_a128kw() {
    let kek = base64url::decode(RFC7516_KEY).expect("should decode");
    let key_alg = AesKw::new(KeyAlgorithm::A128Kw, &kek).expect("should create");
    let enc_alg = AesCbcHmac::a128cbc_hs256();

    let jwe: Jwe = RFC7516_TOKEN.parse().expect("should parse");
    assert_eq!(jwe.header().algorithm(), Some("A128KW"));
    assert_eq!(jwe.to_compact(), RFC7516_TOKEN);

    let plaintext = jwe.decrypt(&key_alg, &enc_alg).expect("should decrypt");
    assert_eq!(plaintext, b"Live long and prosper.");
}

// Every key management algorithm, created from a JWK, with every content
// encryption algorithm: empty, single byte and multi-block payloads, with and
// without DEFLATE.
#[test]
fn key_management() {
    let payloads: [&[u8]; 3] = [b"", b"x", b"The quick brown fox jumps over the lazy dog"];

    for alg in KeyAlgorithm::ALL.iter().copied() {
        for enc in EncAlgorithm::ALL.iter().copied() {
            let key_alg = key_algorithm(alg, &key_for(alg, enc)).expect("should create");
            let enc_alg = content_algorithm(enc);

            for payload in payloads {
                for zip in [None, Some(Zip::Deflate)] {
                    let jwe =
                        Jwe::encrypt(payload, key_alg.as_ref(), enc_alg.as_ref(), zip, None)
                            .expect("should encrypt");
                    assert_eq!(jwe.header().algorithm(), Some(alg.as_str()));
                    assert_eq!(jwe.header().encryption_algorithm(), Some(enc.as_str()));
                    if alg == KeyAlgorithm::Dir || alg == KeyAlgorithm::EcdhEs {
                        assert!(jwe.encrypted_key().is_empty(), "{alg}");
                    }

                    let parsed = Jwe::from_compact(&jwe.to_compact()).expect("should parse");
                    let plaintext = parsed
                        .decrypt(key_alg.as_ref(), enc_alg.as_ref())
                        .expect("should decrypt");
                    assert_eq!(plaintext, payload, "{alg} with {enc}, {} bytes", payload.len());
                }
            }
        }
    }
}

// A compressed payload that inflates past the limit is rejected after it
// authenticates.
#[test]
fn inflate_limit() {
    let key_alg = Direct::new(&[3; 16]);
    let enc_alg = AesGcm::a128gcm();

    let payload = vec![0; MAX_DECOMPRESSED_LEN];
    let jwe = Jwe::encrypt(&payload, &key_alg, &enc_alg, Some(Zip::Deflate), None)
        .expect("should encrypt");
    assert!(jwe.to_compact().len() < payload.len() / 100);
    assert_eq!(jwe.decrypt(&key_alg, &enc_alg).expect("should decrypt").len(), payload.len());

    let payload = vec![0; MAX_DECOMPRESSED_LEN + 1];
    let jwe = Jwe::encrypt(&payload, &key_alg, &enc_alg, Some(Zip::Deflate), None)
        .expect("should encrypt");
    assert!(matches!(jwe.decrypt(&key_alg, &enc_alg), Err(Error::Format(_))));
}

// Any change to the header, IV, ciphertext or tag fails decryption.
#[test]
fn tampering() {
    let enc = EncAlgorithm::A128CbcHs256;
    let key_alg = key_algorithm(KeyAlgorithm::A128Kw, &key_for(KeyAlgorithm::A128Kw, enc))
        .expect("should create");
    let enc_alg = content_algorithm(enc);
    let token = Jwe::encrypt(b"Hold the door", key_alg.as_ref(), enc_alg.as_ref(), None, None)
        .expect("should encrypt")
        .to_compact();

    let header = base64url::encode(r#"{"alg":"A128KW","enc":"A128CBC-HS256","kid":"x"}"#);
    let zeros = base64url::encode([0u8; 16]);
    let tampered = [
        replace_part(&token, 0, &header),
        replace_part(&token, 2, &zeros),
        replace_part(&token, 3, &zeros),
        replace_part(&token, 4, &zeros),
    ];
    for token in tampered {
        let jwe = Jwe::from_compact(&token).expect("should parse");
        let result = jwe.decrypt(key_alg.as_ref(), enc_alg.as_ref());
        assert!(matches!(result, Err(Error::Decryption)), "{token}");
    }
}

// A corrupted RSA1_5 encrypted key fails at the tag check like any other
// wrong key.
#[test]
fn rsa1_5_wrong_key() {
    let enc = EncAlgorithm::A128Gcm;
    let key_alg = key_algorithm(KeyAlgorithm::Rsa1_5, &key_for(KeyAlgorithm::Rsa1_5, enc))
        .expect("should create");
    let enc_alg = content_algorithm(enc);
    let token = Jwe::encrypt(b"payload", key_alg.as_ref(), enc_alg.as_ref(), None, None)
        .expect("should encrypt")
        .to_compact();

    let corrupted = replace_part(&token, 1, &base64url::encode([1u8; 256]));
    let jwe = Jwe::from_compact(&corrupted).expect("should parse");
    let result = jwe.decrypt(key_alg.as_ref(), enc_alg.as_ref());
    assert!(matches!(result, Err(Error::Decryption)));

    // a recovered CEK of the wrong size for `enc` fails the same way
    let (encrypted_key, _) = key_alg.encrypt(&[7; 16], &Header::new()).expect("should encrypt");
    let header = base64url::encode(r#"{"alg":"RSA1_5","enc":"A256GCM"}"#);
    let token = replace_part(&token, 0, &header);
    let token = replace_part(&token, 1, &base64url::encode(encrypted_key));
    let jwe = Jwe::from_compact(&token).expect("should parse");
    let a256gcm = content_algorithm(EncAlgorithm::A256Gcm);
    let result = jwe.decrypt(key_alg.as_ref(), a256gcm.as_ref());
    assert!(matches!(result, Err(Error::Decryption)));
}

#[test]
fn algorithm_mismatch() {
    let enc = EncAlgorithm::A256Gcm;
    let key_alg = key_algorithm(KeyAlgorithm::A128Kw, &key_for(KeyAlgorithm::A128Kw, enc))
        .expect("should create");
    let enc_alg = content_algorithm(enc);
    let jwe = Jwe::encrypt(b"payload", key_alg.as_ref(), enc_alg.as_ref(), None, None)
        .expect("should encrypt");

    let other = key_algorithm(KeyAlgorithm::A256Kw, &key_for(KeyAlgorithm::A256Kw, enc))
        .expect("should create");
    let result = jwe.decrypt(other.as_ref(), enc_alg.as_ref());
    assert!(matches!(result, Err(Error::AlgorithmMismatch { .. })));

    let a128gcm = content_algorithm(EncAlgorithm::A128Gcm);
    let result = jwe.decrypt(key_alg.as_ref(), a128gcm.as_ref());
    let Err(Error::AlgorithmMismatch { expected, found }) = result else {
        panic!("should be an algorithm mismatch");
    };
    assert_eq!((expected.as_str(), found.as_str()), ("A128GCM", "A256GCM"));
}

// The iteration count is read from the token, so it is bounded.
#[test]
fn pbes2_iterations() {
    let enc = EncAlgorithm::A128CbcHs256;
    let key_alg = Pbes2::new(KeyAlgorithm::Pbes2Hs256A128Kw, b"Thus from my lips")
        .expect("should create")
        .with_iterations(1000)
        .expect("should set iterations");
    let enc_alg = content_algorithm(enc);
    let jwe = Jwe::encrypt(b"payload", &key_alg, enc_alg.as_ref(), None, None)
        .expect("should encrypt");
    assert_eq!(jwe.header().get("p2c"), Some(&json!(1000)));
    assert!(jwe.header().get_str("p2s").is_some());
    assert_eq!(key_alg.header_parameters().get_str("alg"), Some("PBES2-HS256+A128KW"));

    let mut header = jwe.header().protected().clone();
    for p2c in [0, 10_000_000] {
        header = header.with_parameter("p2c", p2c);
        let token = replace_part(&jwe.to_compact(), 0, &header.to_b64url());
        let tampered = Jwe::from_compact(&token).expect("should parse");
        let result = tampered.decrypt(&key_alg, enc_alg.as_ref());
        assert!(matches!(result, Err(Error::Format(_))), "{p2c}");
    }
}

// ECDH-ES puts the ephemeral public key in the header; the recipient needs
// the private key.
#[test]
fn ecdh_es_recipient() {
    let enc = EncAlgorithm::A256Gcm;
    let private = key_for(KeyAlgorithm::EcdhEsA256Kw, enc);
    let public = jwk(test_utils::public_jwk(&private.to_value()));

    let sender = key_algorithm(KeyAlgorithm::EcdhEsA256Kw, &public).expect("should create");
    let header = Header::new()
        .with_parameter("apu", base64url::encode("Alice"))
        .with_parameter("apv", base64url::encode("Bob"));
    let enc_alg = content_algorithm(enc);
    let jwe = Jwe::encrypt(b"payload", sender.as_ref(), enc_alg.as_ref(), None, Some(&header))
        .expect("should encrypt");

    let epk = jwe.header().get("epk").expect("should have `epk`");
    assert_eq!(epk["crv"], "P-256");
    assert!(epk.get("d").is_none());

    let result = jwe.decrypt(sender.as_ref(), enc_alg.as_ref());
    assert!(matches!(result, Err(Error::NotPermitted(_))));

    let recipient = key_algorithm(KeyAlgorithm::EcdhEsA256Kw, &private).expect("should create");
    let plaintext = jwe.decrypt(recipient.as_ref(), enc_alg.as_ref()).expect("should decrypt");
    assert_eq!(plaintext, b"payload");
}

#[test]
fn malformed() {
    assert!(matches!(Jwe::from_compact("a.b.c"), Err(Error::Format(_))));
    assert!(matches!(Jwe::from_compact("a.b.c.d.e.f"), Err(Error::Format(_))));
    assert!(matches!(Jwe::from_compact("a!.b.c.d.e"), Err(Error::Format(_))));

    let crit = base64url::encode(r#"{"alg":"dir","enc":"A128GCM","crit":["exp"]}"#);
    let token = replace_part(RFC7516_TOKEN, 0, &crit);
    assert!(matches!(Jwe::from_compact(&token), Err(Error::Format(_))));
}
