use crate::error::{Error, Result};
use crate::utils;
use std::convert::TryFrom;

pub mod certificate;
pub mod client_hello;
pub mod extensions;
pub mod finished;
pub mod key_exchange;
pub mod server_hello;

pub use certificate::CertificateChain;
pub use client_hello::ClientHello;
pub use extensions::Extension;
pub use finished::Finished;
pub use key_exchange::{ClientKeyExchange, ServerKeyExchange};
pub use server_hello::ServerHello;

pub const HANDSHAKE_HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeType {
    HelloRequest = 0,
    ClientHello = 1,
    ServerHello = 2,
    Certificate = 11,
    ServerKeyExchange = 12,
    ServerHelloDone = 14,
    ClientKeyExchange = 16,
    Finished = 20,
}

impl TryFrom<u8> for HandshakeType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(HandshakeType::HelloRequest),
            1 => Ok(HandshakeType::ClientHello),
            2 => Ok(HandshakeType::ServerHello),
            11 => Ok(HandshakeType::Certificate),
            12 => Ok(HandshakeType::ServerKeyExchange),
            14 => Ok(HandshakeType::ServerHelloDone),
            16 => Ok(HandshakeType::ClientKeyExchange),
            20 => Ok(HandshakeType::Finished),
            _ => Err(Error::ProtocolError(format!(
                "Unrecognized handshake message type: {}",
                value
            ))),
        }
    }
}

/// The single cipher suite this engine negotiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherSuite {
    EcdheRsaAes128GcmSha256 = 0xC02F,
}

impl TryFrom<u16> for CipherSuite {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0xC02F => Ok(CipherSuite::EcdheRsaAes128GcmSha256),
            _ => Err(Error::ParseError(format!(
                "Unsupported cipher suite: {:#06x}",
                value
            ))),
        }
    }
}

/// Decoded inbound handshake bodies. Server-to-client messages are
/// encode-only and have no variant here.
#[derive(Debug)]
pub enum HandshakeBody {
    HelloRequest,
    ClientHello(ClientHello),
    ClientKeyExchange(ClientKeyExchange),
    Finished(Finished),
}

impl HandshakeBody {
    pub fn message_type(&self) -> HandshakeType {
        match self {
            HandshakeBody::HelloRequest => HandshakeType::HelloRequest,
            HandshakeBody::ClientHello(_) => HandshakeType::ClientHello,
            HandshakeBody::ClientKeyExchange(_) => HandshakeType::ClientKeyExchange,
            HandshakeBody::Finished(_) => HandshakeType::Finished,
        }
    }
}

/// Frame a message body as `msg_type(1) || length(3, BE) || body`.
pub fn encode_message(msg_type: HandshakeType, body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HANDSHAKE_HEADER_LEN + body.len());
    utils::write_u8(&mut message, msg_type as u8);
    utils::write_u24(&mut message, body.len() as u32);
    message.extend_from_slice(body);
    message
}

/// ServerHelloDone carries an empty body.
pub fn encode_server_hello_done() -> Vec<u8> {
    encode_message(HandshakeType::ServerHelloDone, &[])
}

/// Decode one complete handshake message (header included, exactly
/// `4 + declared_length` bytes, as delivered by the reassembler).
pub fn decode_message(message: &[u8]) -> Result<HandshakeBody> {
    let mut pos = 0;

    let msg_type = HandshakeType::try_from(utils::read_u8(message, &mut pos)?)?;
    let length = utils::read_u24(message, &mut pos)? as usize;

    if message.len() != HANDSHAKE_HEADER_LEN + length {
        return Err(Error::ParseError(format!(
            "Handshake message length mismatch: declared {}, got {}",
            length,
            message.len() - HANDSHAKE_HEADER_LEN
        )));
    }

    let body = &message[pos..];
    let mut body_pos = 0;

    let decoded = match msg_type {
        HandshakeType::HelloRequest => {
            if !body.is_empty() {
                return Err(Error::ParseError("HelloRequest body must be empty".to_string()));
            }
            HandshakeBody::HelloRequest
        }
        HandshakeType::ClientHello => {
            HandshakeBody::ClientHello(ClientHello::parse(body, &mut body_pos)?)
        }
        HandshakeType::ClientKeyExchange => {
            HandshakeBody::ClientKeyExchange(ClientKeyExchange::parse(body, &mut body_pos)?)
        }
        HandshakeType::Finished => HandshakeBody::Finished(Finished::parse(body, &mut body_pos)?),
        other => {
            return Err(Error::ProtocolError(format!(
                "Unexpected inbound handshake message: {:?}",
                other
            )))
        }
    };

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_framing() {
        let message = encode_message(HandshakeType::Finished, &[0xAA, 0xBB, 0xCC]);
        assert_eq!(message, [0x14, 0x00, 0x00, 0x03, 0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_server_hello_done_is_empty() {
        assert_eq!(encode_server_hello_done(), [0x0E, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_decode_finished() {
        let message = encode_message(HandshakeType::Finished, &[0x11; 12]);
        match decode_message(&message).unwrap() {
            HandshakeBody::Finished(finished) => {
                assert_eq!(finished.verify_data, vec![0x11; 12]);
            }
            other => panic!("expected Finished, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_hello_request() {
        let message = encode_message(HandshakeType::HelloRequest, &[]);
        assert!(matches!(
            decode_message(&message).unwrap(),
            HandshakeBody::HelloRequest
        ));
    }

    #[test]
    fn test_decode_rejects_server_side_message() {
        let message = encode_message(HandshakeType::ServerHello, &[0x00; 8]);
        assert!(matches!(
            decode_message(&message),
            Err(Error::ProtocolError(_))
        ));
    }

    #[test]
    fn test_decode_rejects_length_mismatch() {
        let mut message = encode_message(HandshakeType::Finished, &[0x11; 12]);
        message.push(0xFF);
        assert!(decode_message(&message).is_err());
    }

    #[test]
    fn test_unknown_handshake_type_is_protocol_error() {
        let message = [0x63, 0x00, 0x00, 0x00];
        assert!(matches!(
            decode_message(&message),
            Err(Error::ProtocolError(_))
        ));
    }
}
