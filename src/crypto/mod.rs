// Cryptographic operations module
use crate::error::{Error, Result};
use ring::rand::{SecureRandom, SystemRandom};

pub mod aead;
pub mod key_exchange;
pub mod prf;
pub mod signature;
pub mod transcript;

pub use aead::{AeadKey, RecordOpener, RecordSealer};
pub use key_exchange::EcdheKeyPair;
pub use prf::{MasterSecret, PreMasterSecret};
pub use signature::{RsaSigner, Signer};
pub use transcript::HandshakeTranscript;

/// Connection-scoped security parameters for the single supported suite,
/// TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256: SHA-256 PRF, AES-128 AEAD with a
/// 4-byte fixed IV and an 8-byte explicit nonce, no separate MAC.
pub struct SecurityParameters {
    pub client_random: [u8; 32],
    pub server_random: [u8; 32],
    pub master_secret: Option<MasterSecret>,
}

impl SecurityParameters {
    /// Generate the server random immediately; the client random and master
    /// secret are filled in as the handshake progresses.
    pub fn new() -> Result<Self> {
        let rng = SystemRandom::new();
        let mut server_random = [0u8; 32];
        rng.fill(&mut server_random)
            .map_err(|_| Error::CryptoFailure("Failed to generate server random".to_string()))?;

        Ok(Self {
            client_random: [0u8; 32],
            server_random,
            master_secret: None,
        })
    }
}

/// Per-direction write keys and fixed IVs split out of the key block.
/// Created once after key derivation; never regenerated.
pub struct SessionKeys {
    pub client_write_key: AeadKey,
    pub server_write_key: AeadKey,
    pub client_iv: [u8; aead::FIXED_IV_LEN],
    pub server_iv: [u8; aead::FIXED_IV_LEN],
}

impl SessionKeys {
    /// Split `client_key(16) | server_key(16) | client_iv(4) | server_iv(4)`.
    pub fn from_key_block(key_block: &[u8]) -> Result<Self> {
        if key_block.len() != prf::KEY_BLOCK_LEN {
            return Err(Error::CryptoFailure(format!(
                "Key block must be {} bytes, got {}",
                prf::KEY_BLOCK_LEN,
                key_block.len()
            )));
        }

        let (client_key, rest) = key_block.split_at(aead::KEY_LEN);
        let (server_key, rest) = rest.split_at(aead::KEY_LEN);
        let (client_iv_bytes, server_iv_bytes) = rest.split_at(aead::FIXED_IV_LEN);

        let mut client_iv = [0u8; aead::FIXED_IV_LEN];
        let mut server_iv = [0u8; aead::FIXED_IV_LEN];
        client_iv.copy_from_slice(client_iv_bytes);
        server_iv.copy_from_slice(server_iv_bytes);

        Ok(Self {
            client_write_key: AeadKey::new(client_key)?,
            server_write_key: AeadKey::new(server_key)?,
            client_iv,
            server_iv,
        })
    }
}
