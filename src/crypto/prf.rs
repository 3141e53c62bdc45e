// TLS 1.2 key schedule: PRF (P_SHA256), master secret and key block (RFC 5246)
use crate::error::{Error, Result};
use ring::hmac;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const MASTER_SECRET_LEN: usize = 48;
pub const KEY_BLOCK_LEN: usize = 40; // 2 * (16B AES-128 key + 4B fixed IV)
pub const VERIFY_DATA_LEN: usize = 12;

const LABEL_MASTER_SECRET: &[u8] = b"master secret";
const LABEL_KEY_EXPANSION: &[u8] = b"key expansion";
pub const LABEL_CLIENT_FINISHED: &[u8] = b"client finished";
pub const LABEL_SERVER_FINISHED: &[u8] = b"server finished";

/// Raw ECDH output. Zeroized as soon as the master secret is derived.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PreMasterSecret(pub Vec<u8>);

#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterSecret(pub [u8; MASTER_SECRET_LEN]);

/// TLS 1.2 PRF with the SHA-256 P_hash, expanded to an arbitrary length.
///
/// P_hash(secret, seed) = HMAC(secret, A(1) + seed) + HMAC(secret, A(2) + seed) + ...
/// where A(0) = seed and A(i) = HMAC(secret, A(i-1)).
pub fn prf_sha256(secret: &[u8], label: &[u8], seed: &[u8], output_len: usize) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);

    let mut label_and_seed = Vec::with_capacity(label.len() + seed.len());
    label_and_seed.extend_from_slice(label);
    label_and_seed.extend_from_slice(seed);

    let mut a = hmac::sign(&key, &label_and_seed).as_ref().to_vec();
    let mut output = Vec::with_capacity(output_len + 31);

    while output.len() < output_len {
        let mut context = hmac::Context::with_key(&key);
        context.update(&a);
        context.update(&label_and_seed);
        output.extend_from_slice(context.sign().as_ref());

        a = hmac::sign(&key, &a).as_ref().to_vec();
    }

    output.truncate(output_len);
    output
}

/// master_secret = PRF(pre_master_secret, "master secret", client_random || server_random)
pub fn derive_master_secret(
    pre_master_secret: &PreMasterSecret,
    client_random: &[u8; 32],
    server_random: &[u8; 32],
) -> MasterSecret {
    let mut seed = Vec::with_capacity(64);
    seed.extend_from_slice(client_random);
    seed.extend_from_slice(server_random);

    let expanded = prf_sha256(&pre_master_secret.0, LABEL_MASTER_SECRET, &seed, MASTER_SECRET_LEN);

    let mut master = [0u8; MASTER_SECRET_LEN];
    master.copy_from_slice(&expanded);
    MasterSecret(master)
}

/// key_block = PRF(master_secret, "key expansion", server_random || client_random).
/// Note the random order is reversed relative to the master secret derivation.
pub fn derive_key_block(
    master_secret: &MasterSecret,
    client_random: &[u8; 32],
    server_random: &[u8; 32],
) -> Vec<u8> {
    let mut seed = Vec::with_capacity(64);
    seed.extend_from_slice(server_random);
    seed.extend_from_slice(client_random);

    prf_sha256(&master_secret.0, LABEL_KEY_EXPANSION, &seed, KEY_BLOCK_LEN)
}

/// verify_data = PRF(master_secret, label, SHA256(transcript))[0..12]
pub fn compute_verify_data(
    master_secret: &MasterSecret,
    label: &[u8],
    transcript_hash: &[u8],
) -> Result<Vec<u8>> {
    if transcript_hash.len() != 32 {
        return Err(Error::CryptoFailure(format!(
            "Transcript hash must be 32 bytes, got {}",
            transcript_hash.len()
        )));
    }

    Ok(prf_sha256(&master_secret.0, label, transcript_hash, VERIFY_DATA_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Published TLS 1.2 PRF test vector (SHA-256, "test label", 100 bytes).
    #[test]
    fn test_prf_sha256_known_vector() {
        let secret = hex::decode("9bbe436ba940f017b17652849a71db35").unwrap();
        let seed = hex::decode("a0ba9f936cda311827a6f796ffd5198c").unwrap();

        let output = prf_sha256(&secret, b"test label", &seed, 100);

        let expected = hex::decode(
            "e3f229ba727be17b8d122620557cd453c2aab21d07c3d495329b52d4e61edb5a\
             6b301791e90d35c9c9a46b4e14baf9af0fa022f7077def17abfd3797c0564bab\
             4fbc91666e9def9b97fce34f796789baa48082d122ee42c5a72e5a5110fff701\
             87347b66",
        )
        .unwrap();
        assert_eq!(output, expected);
    }

    #[test]
    fn test_master_secret_fixture() {
        let pms = PreMasterSecret((0u8..32).collect());
        let client_random = [0x11u8; 32];
        let server_random = [0x22u8; 32];

        let master = derive_master_secret(&pms, &client_random, &server_random);

        let expected = hex::decode(
            "f6550fc97649b6cb29f5d4d5006cbf69edacc80c5af55f7cf19db4e3e3b90ca2\
             a198457b64a6ed72c4b524d822cefc59",
        )
        .unwrap();
        assert_eq!(master.0.to_vec(), expected);
    }

    #[test]
    fn test_key_block_fixture() {
        let pms = PreMasterSecret((0u8..32).collect());
        let client_random = [0x11u8; 32];
        let server_random = [0x22u8; 32];
        let master = derive_master_secret(&pms, &client_random, &server_random);

        let key_block = derive_key_block(&master, &client_random, &server_random);

        let expected = hex::decode(
            "eaa6f8f3aa10fcdd334aa6ce53560ab5f060b8dd60f95f726da9630c23482f35\
             6752cc847a8065f7",
        )
        .unwrap();
        assert_eq!(key_block, expected);
        assert_eq!(key_block.len(), KEY_BLOCK_LEN);
    }

    #[test]
    fn test_server_finished_fixture() {
        let pms = PreMasterSecret((0u8..32).collect());
        let master = derive_master_secret(&pms, &[0x11u8; 32], &[0x22u8; 32]);

        let transcript = b"handshake transcript bytes for regression";
        let hash = ring::digest::digest(&ring::digest::SHA256, transcript);

        let verify_data =
            compute_verify_data(&master, LABEL_SERVER_FINISHED, hash.as_ref()).unwrap();

        assert_eq!(verify_data, hex::decode("a5beb017cb461e060831af3c").unwrap());
    }

    #[test]
    fn test_verify_data_rejects_bad_hash_length() {
        let master = MasterSecret([0u8; MASTER_SECRET_LEN]);
        assert!(compute_verify_data(&master, LABEL_SERVER_FINISHED, &[0u8; 20]).is_err());
    }
}
