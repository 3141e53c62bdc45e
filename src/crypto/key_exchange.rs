// Ephemeral ECDHE key agreement over P-256
use crate::crypto::prf::PreMasterSecret;
use crate::error::{Error, Result};
use ring::{agreement, rand};

/// Uncompressed X9.62 point length for P-256: 0x04 || X(32) || Y(32).
pub const P256_POINT_LEN: usize = 65;

/// One ephemeral P-256 key pair, generated at ServerKeyExchange time and
/// consumed by a single agreement. Never reused across connections.
pub struct EcdheKeyPair {
    private_key: agreement::EphemeralPrivateKey,
    public_key: Vec<u8>,
}

impl EcdheKeyPair {
    pub fn generate() -> Result<Self> {
        let rng = rand::SystemRandom::new();

        let private_key = agreement::EphemeralPrivateKey::generate(&agreement::ECDH_P256, &rng)
            .map_err(|_| Error::CryptoFailure("Failed to generate P-256 private key".to_string()))?;

        let public_key = private_key
            .compute_public_key()
            .map_err(|_| Error::CryptoFailure("Failed to compute P-256 public key".to_string()))?
            .as_ref()
            .to_vec();

        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// The 65-byte uncompressed public point, as sent in ServerKeyExchange.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Perform the agreement with the client's public point, consuming the
    /// private key. The 32-byte shared X coordinate is the pre-master secret.
    pub fn agree(self, peer_public: &[u8]) -> Result<PreMasterSecret> {
        if peer_public.len() != P256_POINT_LEN || peer_public[0] != 0x04 {
            return Err(Error::CryptoFailure(format!(
                "Peer public key is not an uncompressed P-256 point ({} bytes)",
                peer_public.len()
            )));
        }

        let peer = agreement::UnparsedPublicKey::new(&agreement::ECDH_P256, peer_public);

        agreement::agree_ephemeral(self.private_key, &peer, |shared| {
            PreMasterSecret(shared.to_vec())
        })
        .map_err(|_| Error::CryptoFailure("ECDH key agreement failed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_public_key_is_uncompressed_point() {
        let pair = EcdheKeyPair::generate().unwrap();
        assert_eq!(pair.public_key().len(), P256_POINT_LEN);
        assert_eq!(pair.public_key()[0], 0x04);
    }

    #[test]
    fn test_agreement_matches_both_sides() {
        let server = EcdheKeyPair::generate().unwrap();
        let client = EcdheKeyPair::generate().unwrap();

        let server_public = server.public_key().to_vec();
        let client_public = client.public_key().to_vec();

        let server_secret = server.agree(&client_public).unwrap();
        let client_secret = client.agree(&server_public).unwrap();

        assert_eq!(server_secret.0, client_secret.0);
        assert_eq!(server_secret.0.len(), 32);
    }

    #[test]
    fn test_agreement_rejects_compressed_point() {
        let pair = EcdheKeyPair::generate().unwrap();
        let bogus = vec![0x02; 33];
        assert!(pair.agree(&bogus).is_err());
    }
}
