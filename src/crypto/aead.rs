// AES-128-GCM record protection with TLS 1.2 explicit nonces
use crate::error::{Error, Result};
use crate::record::ContentType;
use ring::aead;
use ring::rand::{SecureRandom, SystemRandom};

pub const KEY_LEN: usize = 16;
pub const FIXED_IV_LEN: usize = 4;
pub const EXPLICIT_NONCE_LEN: usize = 8;
pub const TAG_LEN: usize = 16;

/// An AES-128-GCM key restricted to seal/open use.
pub struct AeadKey {
    key: aead::LessSafeKey,
}

impl AeadKey {
    pub fn new(key_material: &[u8]) -> Result<Self> {
        if key_material.len() != KEY_LEN {
            return Err(Error::CryptoFailure(format!(
                "Invalid AES-128-GCM key length {}, expected {}",
                key_material.len(),
                KEY_LEN
            )));
        }

        let unbound_key = aead::UnboundKey::new(&aead::AES_128_GCM, key_material)
            .map_err(|_| Error::CryptoFailure("Failed to create AEAD key".to_string()))?;

        Ok(Self {
            key: aead::LessSafeKey::new(unbound_key),
        })
    }

    fn seal(&self, nonce: [u8; 12], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = aead::Nonce::assume_unique_for_key(nonce);

        let mut in_out = plaintext.to_vec();
        let tag = self
            .key
            .seal_in_place_separate_tag(nonce, aead::Aad::from(aad), &mut in_out)
            .map_err(|_| Error::CryptoFailure("AEAD encryption failed".to_string()))?;

        in_out.extend_from_slice(tag.as_ref());
        Ok(in_out)
    }

    fn open(&self, nonce: [u8; 12], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let nonce = aead::Nonce::assume_unique_for_key(nonce);

        let mut in_out = ciphertext.to_vec();
        let plaintext_len = self
            .key
            .open_in_place(nonce, aead::Aad::from(aad), &mut in_out)
            .map_err(|_| Error::CryptoFailure("AEAD authentication failed".to_string()))?
            .len();

        in_out.truncate(plaintext_len);
        Ok(in_out)
    }
}

/// additional_data = seq_num(8, BE) || content_type(1) || 0x03 0x03 || length(2)
fn additional_data(sequence_number: u64, content_type: ContentType, length: usize) -> Vec<u8> {
    let mut aad = Vec::with_capacity(13);
    aad.extend_from_slice(&sequence_number.to_be_bytes());
    aad.push(content_type as u8);
    aad.push(0x03);
    aad.push(0x03);
    aad.extend_from_slice(&(length as u16).to_be_bytes());
    aad
}

/// Outbound record protection. Sequence number starts at zero and increments
/// exactly once per sealed record.
pub struct RecordSealer {
    key: AeadKey,
    fixed_iv: [u8; FIXED_IV_LEN],
    sequence_number: u64,
    rng: SystemRandom,
}

impl RecordSealer {
    pub fn new(key: AeadKey, fixed_iv: [u8; FIXED_IV_LEN]) -> Self {
        Self {
            key,
            fixed_iv,
            sequence_number: 0,
            rng: SystemRandom::new(),
        }
    }

    /// Seal a plaintext fragment: `explicit_nonce(8) || ciphertext || tag(16)`.
    pub fn seal(&mut self, content_type: ContentType, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut explicit_nonce = [0u8; EXPLICIT_NONCE_LEN];
        self.rng
            .fill(&mut explicit_nonce)
            .map_err(|_| Error::CryptoFailure("Failed to generate explicit nonce".to_string()))?;

        let mut nonce = [0u8; 12];
        nonce[..FIXED_IV_LEN].copy_from_slice(&self.fixed_iv);
        nonce[FIXED_IV_LEN..].copy_from_slice(&explicit_nonce);

        let aad = additional_data(self.sequence_number, content_type, plaintext.len());
        let sealed = self.key.seal(nonce, &aad, plaintext)?;
        self.sequence_number += 1;

        let mut payload = Vec::with_capacity(EXPLICIT_NONCE_LEN + sealed.len());
        payload.extend_from_slice(&explicit_nonce);
        payload.extend_from_slice(&sealed);
        Ok(payload)
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }
}

/// Inbound record protection. The sequence number increments once per opened
/// record, on failure as well; a failed open is fatal and never retried.
pub struct RecordOpener {
    key: AeadKey,
    fixed_iv: [u8; FIXED_IV_LEN],
    sequence_number: u64,
}

impl RecordOpener {
    pub fn new(key: AeadKey, fixed_iv: [u8; FIXED_IV_LEN]) -> Self {
        Self {
            key,
            fixed_iv,
            sequence_number: 0,
        }
    }

    /// Open an inbound payload laid out as `explicit_nonce(8) || ciphertext || tag(16)`.
    pub fn open(&mut self, content_type: ContentType, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() < EXPLICIT_NONCE_LEN + TAG_LEN {
            return Err(Error::CryptoFailure(format!(
                "Encrypted fragment too short: {} bytes",
                payload.len()
            )));
        }

        let mut nonce = [0u8; 12];
        nonce[..FIXED_IV_LEN].copy_from_slice(&self.fixed_iv);
        nonce[FIXED_IV_LEN..].copy_from_slice(&payload[..EXPLICIT_NONCE_LEN]);

        let plaintext_len = payload.len() - EXPLICIT_NONCE_LEN - TAG_LEN;
        let aad = additional_data(self.sequence_number, content_type, plaintext_len);

        let result = self
            .key
            .open(nonce, &aad, &payload[EXPLICIT_NONCE_LEN..]);
        self.sequence_number += 1;
        result
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }
}
