// ServerKeyExchange signing
use crate::error::{Error, Result};
use ring::{rand, signature};

/// Seam for the externally supplied private key. The engine only ever asks it
/// to produce one RSA-PKCS#1-v1.5/SHA-256 signature over the key exchange
/// parameters.
pub trait Signer: Send + Sync {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// RSA signer backed by a PKCS#8-encoded private key.
pub struct RsaSigner {
    key_pair: signature::RsaKeyPair,
    rng: rand::SystemRandom,
}

impl RsaSigner {
    pub fn from_pkcs8(pkcs8_der: &[u8]) -> Result<Self> {
        let key_pair = signature::RsaKeyPair::from_pkcs8(pkcs8_der)
            .map_err(|e| Error::CryptoFailure(format!("Failed to parse RSA key: {}", e)))?;

        Ok(Self {
            key_pair,
            rng: rand::SystemRandom::new(),
        })
    }
}

impl Signer for RsaSigner {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let mut sig = vec![0u8; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(&signature::RSA_PKCS1_SHA256, &self.rng, message, &mut sig)
            .map_err(|_| Error::CryptoFailure("RSA signing failed".to_string()))?;
        Ok(sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::signature::KeyPair as _;

    const TEST_KEY: &[u8] = include_bytes!("../../tests/testdata/server_key.p8");

    #[test]
    fn test_sign_and_verify() {
        let signer = RsaSigner::from_pkcs8(TEST_KEY).unwrap();
        let message = b"client random server random ec params";

        let sig = signer.sign(message).unwrap();
        assert_eq!(sig.len(), 256); // 2048-bit modulus

        let public_key = signature::UnparsedPublicKey::new(
            &signature::RSA_PKCS1_2048_8192_SHA256,
            signer.key_pair.public_key().as_ref(),
        );
        public_key.verify(message, &sig).unwrap();
    }

    #[test]
    fn test_garbage_key_rejected() {
        assert!(RsaSigner::from_pkcs8(&[0u8; 16]).is_err());
    }
}
