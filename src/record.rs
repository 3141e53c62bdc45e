use crate::buffer::IngressBuffer;
use crate::error::{Error, Result};
use crate::utils;
use std::sync::Arc;

pub const RECORD_HEADER_LEN: usize = 5;

/// Largest inbound fragment we will buffer: the 2^14 protocol ceiling plus
/// the AEAD expansion allowance. Anything larger is treated as hostile.
pub const MAX_FRAGMENT_LEN: usize = 16384 + 2048;

/// Wire version for every record this engine emits.
pub const VERSION_TLS12: ProtocolVersion = ProtocolVersion { major: 3, minor: 3 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    ChangeCipherSpec = 20,
    Alert = 21,
    Handshake = 22,
    ApplicationData = 23,
}

impl TryFrom<u8> for ContentType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            20 => Ok(ContentType::ChangeCipherSpec),
            21 => Ok(ContentType::Alert),
            22 => Ok(ContentType::Handshake),
            23 => Ok(ContentType::ApplicationData),
            _ => Err(Error::ProtocolError(format!(
                "Unrecognized record content type: {}",
                value
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

#[derive(Debug, Clone)]
pub struct TlsRecord {
    pub content_type: ContentType,
    pub version: ProtocolVersion,
    pub fragment: Vec<u8>,
}

impl TlsRecord {
    pub fn new(content_type: ContentType, fragment: Vec<u8>) -> Self {
        Self {
            content_type,
            version: VERSION_TLS12,
            fragment,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(RECORD_HEADER_LEN + self.fragment.len());
        utils::write_u8(&mut result, self.content_type as u8);
        utils::write_u8(&mut result, self.version.major);
        utils::write_u8(&mut result, self.version.minor);
        utils::write_u16(&mut result, self.fragment.len() as u16);
        result.extend_from_slice(&self.fragment);
        result
    }
}

/// Slices the raw inbound byte stream into TLS records.
///
/// Both reads suspend on the ingress buffer, so a partially delivered record
/// waits for its remaining bytes instead of erroring.
pub struct RecordReader {
    buffer: Arc<IngressBuffer>,
}

impl RecordReader {
    pub fn new(buffer: Arc<IngressBuffer>) -> Self {
        Self { buffer }
    }

    pub fn next_record(&self) -> Result<TlsRecord> {
        let header = self.buffer.read_exact(RECORD_HEADER_LEN)?;

        let mut pos = 0;
        let content_type = ContentType::try_from(utils::read_u8(&header, &mut pos)?)?;
        let major = utils::read_u8(&header, &mut pos)?;
        let minor = utils::read_u8(&header, &mut pos)?;
        let length = utils::read_u16(&header, &mut pos)? as usize;

        if length > MAX_FRAGMENT_LEN {
            return Err(Error::ProtocolError(format!(
                "Record fragment length {} exceeds maximum allowed {}",
                length, MAX_FRAGMENT_LEN
            )));
        }

        let fragment = self.buffer.read_exact(length)?;
        log::debug!(
            "received {:?} record, version {}.{}, {} byte fragment",
            content_type,
            major,
            minor,
            fragment.len()
        );

        Ok(TlsRecord {
            content_type,
            version: ProtocolVersion { major, minor },
            fragment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization() {
        let record = TlsRecord::new(ContentType::Handshake, vec![0x01, 0x02, 0x03, 0x04, 0x05]);
        let serialized = record.serialize();

        let expected = [
            22, // Handshake record type
            0x03, 0x03, // TLS 1.2 version
            0x00, 0x05, // Length 5
            0x01, 0x02, 0x03, 0x04, 0x05, // Fragment data
        ];

        assert_eq!(serialized, expected);
    }

    #[test]
    fn test_record_reading() {
        let buffer = Arc::new(IngressBuffer::new());
        buffer.receive(&[22, 0x03, 0x03, 0x00, 0x05, 0x01, 0x02, 0x03, 0x04, 0x05]);

        let reader = RecordReader::new(buffer);
        let record = reader.next_record().unwrap();

        assert_eq!(record.content_type, ContentType::Handshake);
        assert_eq!(record.version, VERSION_TLS12);
        assert_eq!(record.fragment, vec![0x01, 0x02, 0x03, 0x04, 0x05]);
    }

    #[test]
    fn test_record_reading_across_partial_delivery() {
        let buffer = Arc::new(IngressBuffer::new());
        // Whole record delivered in three pieces, splitting the header too.
        buffer.receive(&[21, 0x03]);
        buffer.receive(&[0x03, 0x00]);
        buffer.receive(&[0x02, 0x01, 0x00]);

        let reader = RecordReader::new(buffer);
        let record = reader.next_record().unwrap();

        assert_eq!(record.content_type, ContentType::Alert);
        assert_eq!(record.fragment, vec![0x01, 0x00]);
    }

    #[test]
    fn test_invalid_content_type() {
        let buffer = Arc::new(IngressBuffer::new());
        buffer.receive(&[25, 0x03, 0x03, 0x00, 0x01, 0xFF]);

        let reader = RecordReader::new(buffer);
        assert!(matches!(reader.next_record(), Err(Error::ProtocolError(_))));
    }

    #[test]
    fn test_oversized_record_rejected() {
        let buffer = Arc::new(IngressBuffer::new());
        buffer.receive(&[23, 0x03, 0x03, 0xFF, 0xFF]);

        let reader = RecordReader::new(buffer);
        assert!(matches!(reader.next_record(), Err(Error::ProtocolError(_))));
    }
}
