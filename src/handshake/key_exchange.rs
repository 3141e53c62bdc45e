use crate::crypto::Signer;
use crate::error::{Error, Result};
use crate::handshake::extensions::{HASH_SHA256, NAMED_CURVE_SECP256R1, SIGNATURE_RSA};
use crate::utils;

const CURVE_TYPE_NAMED_CURVE: u8 = 3;

/// ServerKeyExchange for ECDHE_RSA, encode-only: the named-curve parameters
/// followed by a detached RSA-PKCS#1-v1.5/SHA-256 signature over
/// `client_random || server_random || params`.
#[derive(Debug)]
pub struct ServerKeyExchange {
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl ServerKeyExchange {
    pub fn sign(
        public_key: &[u8],
        client_random: &[u8; 32],
        server_random: &[u8; 32],
        signer: &dyn Signer,
    ) -> Result<Self> {
        let params = Self::encode_params(public_key);

        let mut signed_content = Vec::with_capacity(64 + params.len());
        signed_content.extend_from_slice(client_random);
        signed_content.extend_from_slice(server_random);
        signed_content.extend_from_slice(&params);

        let signature = signer.sign(&signed_content)?;

        Ok(Self {
            public_key: public_key.to_vec(),
            signature,
        })
    }

    fn encode_params(public_key: &[u8]) -> Vec<u8> {
        let mut params = Vec::with_capacity(4 + public_key.len());
        utils::write_u8(&mut params, CURVE_TYPE_NAMED_CURVE);
        utils::write_u16(&mut params, NAMED_CURVE_SECP256R1);
        utils::write_vector_u8(&mut params, public_key);
        params
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut body = Self::encode_params(&self.public_key);
        utils::write_u8(&mut body, HASH_SHA256);
        utils::write_u8(&mut body, SIGNATURE_RSA);
        utils::write_vector_u16(&mut body, &self.signature);
        body
    }
}

/// ClientKeyExchange: a u8-length-prefixed uncompressed EC point.
#[derive(Debug)]
pub struct ClientKeyExchange {
    pub public_key: Vec<u8>,
}

impl ClientKeyExchange {
    pub fn parse(data: &[u8], pos: &mut usize) -> Result<Self> {
        let public_key = utils::read_vector_u8(data, pos)?.to_vec();

        if public_key.is_empty() {
            return Err(Error::ParseError("ClientKeyExchange public key is empty".to_string()));
        }

        Ok(Self { public_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSigner;

    impl Signer for FixedSigner {
        fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
            // Echo the first bytes so the test can check what was signed.
            Ok(message[..4].to_vec())
        }
    }

    #[test]
    fn test_server_key_exchange_layout() {
        let public_key = vec![0x04; 65];
        let client_random = [0x01; 32];
        let server_random = [0x02; 32];

        let ske =
            ServerKeyExchange::sign(&public_key, &client_random, &server_random, &FixedSigner)
                .unwrap();
        let body = ske.serialize();

        assert_eq!(body[0], CURVE_TYPE_NAMED_CURVE);
        assert_eq!(&body[1..3], &[0x00, 0x17]); // secp256r1
        assert_eq!(body[3], 65); // point length
        assert_eq!(&body[4..69], &[0x04; 65]);
        assert_eq!(body[69], HASH_SHA256);
        assert_eq!(body[70], SIGNATURE_RSA);
        assert_eq!(&body[71..73], &[0x00, 0x04]); // signature length
        // The signed content begins with the client random.
        assert_eq!(&body[73..77], &[0x01; 4]);
    }

    #[test]
    fn test_client_key_exchange_parsing() {
        let mut data = vec![65u8];
        data.extend_from_slice(&[0x04; 65]);

        let mut pos = 0;
        let cke = ClientKeyExchange::parse(&data, &mut pos).unwrap();
        assert_eq!(cke.public_key.len(), 65);
        assert_eq!(pos, 66);
    }

    #[test]
    fn test_empty_public_key_rejected() {
        let data = [0x00];
        let mut pos = 0;
        assert!(ClientKeyExchange::parse(&data, &mut pos).is_err());
    }

    #[test]
    fn test_truncated_public_key_rejected() {
        let data = [65u8, 0x04, 0x05];
        let mut pos = 0;
        assert!(ClientKeyExchange::parse(&data, &mut pos).is_err());
    }
}
