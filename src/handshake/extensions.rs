// Extension registry: parses the ClientHello extension block and maps each
// requested extension type to its server-side response encoder.
use crate::error::{Error, Result};
use crate::utils;

pub const SERVER_NAME: u16 = 0;
pub const SUPPORTED_GROUPS: u16 = 10;
pub const EC_POINT_FORMATS: u16 = 11;
pub const SIGNATURE_ALGORITHMS: u16 = 13;

pub const NAMED_CURVE_SECP256R1: u16 = 0x0017;
pub const POINT_FORMAT_UNCOMPRESSED: u8 = 0;
pub const HASH_SHA256: u8 = 4;
pub const SIGNATURE_RSA: u8 = 1;

/// One raw extension as it appeared on the wire. Types we do not recognize
/// are carried opaquely so the response builder can drop them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub extension_type: u16,
    pub data: Vec<u8>,
}

impl Extension {
    pub fn new(extension_type: u16, data: Vec<u8>) -> Self {
        Self {
            extension_type,
            data,
        }
    }

    pub fn parse(data: &[u8], pos: &mut usize) -> Result<Self> {
        if *pos + 4 > data.len() {
            return Err(Error::ParseError("Extension too short".to_string()));
        }

        let extension_type = utils::read_u16(data, pos)?;
        let extension_data = utils::read_vector_u16(data, pos)?;

        Ok(Self {
            extension_type,
            data: extension_data.to_vec(),
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(4 + self.data.len());
        utils::write_u16(&mut result, self.extension_type);
        utils::write_vector_u16(&mut result, &self.data);
        result
    }
}

/// Parse a complete extension block (without its outer 2-byte length).
pub fn parse_extension_block(block: &[u8]) -> Result<Vec<Extension>> {
    let mut extensions = Vec::new();
    let mut pos = 0;

    while pos < block.len() {
        extensions.push(Extension::parse(block, &mut pos)?);
    }

    Ok(extensions)
}

/// Encode the server's response for one requested extension type, or None if
/// the type has no registered encoder and must be dropped from the response.
fn respond(extension_type: u16) -> Option<Vec<u8>> {
    match extension_type {
        // Empty acknowledgement that the requested name was accepted.
        SERVER_NAME => Some(Vec::new()),
        SUPPORTED_GROUPS => {
            let mut data = Vec::with_capacity(4);
            utils::write_u16(&mut data, 2);
            utils::write_u16(&mut data, NAMED_CURVE_SECP256R1);
            Some(data)
        }
        EC_POINT_FORMATS => Some(vec![1, POINT_FORMAT_UNCOMPRESSED]),
        SIGNATURE_ALGORITHMS => {
            let mut data = Vec::with_capacity(4);
            utils::write_u16(&mut data, 2);
            data.push(HASH_SHA256);
            data.push(SIGNATURE_RSA);
            Some(data)
        }
        _ => None,
    }
}

/// Build the ServerHello response-extension list for the client's requests.
pub fn build_response_extensions(requested: &[Extension]) -> Vec<Extension> {
    requested
        .iter()
        .filter_map(|ext| match respond(ext.extension_type) {
            Some(data) => Some(Extension::new(ext.extension_type, data)),
            None => {
                log::debug!(
                    "dropping unrecognized extension type {} from response",
                    ext.extension_type
                );
                None
            }
        })
        .collect()
}
