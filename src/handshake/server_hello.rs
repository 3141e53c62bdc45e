use crate::handshake::extensions::{build_response_extensions, Extension};
use crate::handshake::CipherSuite;
use crate::utils;

pub const COMPRESSION_NULL: u8 = 0;

/// Encode-only on the server side: version 0x0303, the server random, the
/// echoed session id, the single negotiated suite and the response
/// extensions derived from the client's requests.
#[derive(Debug)]
pub struct ServerHello {
    pub server_random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suite: CipherSuite,
    pub extensions: Vec<Extension>,
}

impl ServerHello {
    pub fn new(server_random: [u8; 32], session_id: Vec<u8>, requested: &[Extension]) -> Self {
        Self {
            server_random,
            session_id,
            cipher_suite: CipherSuite::EcdheRsaAes128GcmSha256,
            extensions: build_response_extensions(requested),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut body = Vec::new();

        utils::write_u16(&mut body, 0x0303);
        body.extend_from_slice(&self.server_random);
        utils::write_vector_u8(&mut body, &self.session_id);
        utils::write_u16(&mut body, self.cipher_suite as u16);
        utils::write_u8(&mut body, COMPRESSION_NULL);

        if !self.extensions.is_empty() {
            let mut block = Vec::new();
            for ext in &self.extensions {
                block.extend_from_slice(&ext.serialize());
            }
            utils::write_vector_u16(&mut body, &block);
        }

        body
    }
}
