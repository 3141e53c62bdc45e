use crate::error::{Error, Result};
use crate::handshake::extensions::{self, Extension};
use crate::handshake::CipherSuite;
use crate::utils;

#[derive(Debug, Clone)]
pub struct ClientHello {
    pub client_version: u16,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    /// Suites we recognize; unknown codes are skipped during parsing.
    pub cipher_suites: Vec<CipherSuite>,
    pub compression_methods: Vec<u8>,
    pub extensions: Vec<Extension>,
}

impl ClientHello {
    pub fn parse(data: &[u8], pos: &mut usize) -> Result<Self> {
        let client_version = utils::read_u16(data, pos)?;

        if *pos + 32 > data.len() {
            return Err(Error::ParseError("ClientHello random field truncated".to_string()));
        }
        let mut random = [0u8; 32];
        random.copy_from_slice(utils::read_bytes(data, pos, 32)?);

        let session_id = utils::read_vector_u8(data, pos)?.to_vec();
        if session_id.len() > 32 {
            return Err(Error::ParseError(format!(
                "ClientHello session id too long: {} bytes",
                session_id.len()
            )));
        }

        let cipher_suites_bytes = utils::read_vector_u16(data, pos)?;
        if cipher_suites_bytes.len() % 2 != 0 {
            return Err(Error::ParseError("Cipher suites length must be even".to_string()));
        }

        let mut cipher_suites = Vec::with_capacity(cipher_suites_bytes.len() / 2);
        for entry in cipher_suites_bytes.chunks_exact(2) {
            let code = u16::from_be_bytes([entry[0], entry[1]]);
            match CipherSuite::try_from(code) {
                Ok(suite) => cipher_suites.push(suite),
                Err(_) => log::warn!("skipping unknown cipher suite {:#06x}", code),
            }
        }

        let compression_methods = utils::read_vector_u8(data, pos)?.to_vec();

        let mut parsed_extensions = Vec::new();
        if *pos < data.len() {
            let block = utils::read_vector_u16(data, pos)?;
            parsed_extensions = extensions::parse_extension_block(block)?;
        }

        Ok(Self {
            client_version,
            random,
            session_id,
            cipher_suites,
            compression_methods,
            extensions: parsed_extensions,
        })
    }
}
