use crate::alert::Alert;
use crate::crypto::RecordOpener;
use crate::error::{Error, Result};
use crate::handshake::HANDSHAKE_HEADER_LEN;
use crate::record::{ContentType, RecordReader};
use crate::utils;
use bytes::BytesMut;

/// One complete logical inbound message. Alerts never appear here: they are
/// resolved into `Error::AlertReceived` at the point they complete.
#[derive(Debug)]
pub enum InboundMessage {
    /// Raw handshake message bytes, 4-byte header included.
    Handshake(Vec<u8>),
    ChangeCipherSpec(Vec<u8>),
    ApplicationData(Vec<u8>),
}

impl InboundMessage {
    pub fn content_type(&self) -> ContentType {
        match self {
            InboundMessage::Handshake(_) => ContentType::Handshake,
            InboundMessage::ChangeCipherSpec(_) => ContentType::ChangeCipherSpec,
            InboundMessage::ApplicationData(_) => ContentType::ApplicationData,
        }
    }
}

/// Joins record fragments into complete logical messages.
///
/// Handshake and alert payloads may span records and a single record may
/// carry several handshake messages; a buffered complete message is always
/// served before another record is read from the wire, so per-type FIFO
/// order is preserved. ChangeCipherSpec and application data pass through at
/// single-record granularity.
pub struct RecordReassembler {
    reader: RecordReader,
    handshake_buffer: BytesMut,
    alert_buffer: BytesMut,
    opener: Option<RecordOpener>,
}

impl RecordReassembler {
    pub fn new(reader: RecordReader) -> Self {
        Self {
            reader,
            handshake_buffer: BytesMut::new(),
            alert_buffer: BytesMut::new(),
            opener: None,
        }
    }

    /// Decrypt every subsequent inbound record with the client write key.
    /// Called once the client's ChangeCipherSpec has been consumed.
    pub fn enable_decryption(&mut self, opener: RecordOpener) {
        self.opener = Some(opener);
    }

    pub fn received_sequence_number(&self) -> u64 {
        self.opener.as_ref().map_or(0, |o| o.sequence_number())
    }

    /// Return the next complete logical message, reading (and if enabled,
    /// decrypting) as many records as needed. Suspends on the ingress buffer.
    pub fn next_message(&mut self) -> Result<InboundMessage> {
        loop {
            if let Some(message) = self.take_buffered_handshake()? {
                return Ok(InboundMessage::Handshake(message));
            }

            let record = self.reader.next_record()?;
            let fragment = match &mut self.opener {
                Some(opener) => opener.open(record.content_type, &record.fragment)?,
                None => record.fragment,
            };

            match record.content_type {
                ContentType::Handshake => {
                    self.handshake_buffer.extend_from_slice(&fragment);
                }
                ContentType::Alert => {
                    self.alert_buffer.extend_from_slice(&fragment);
                    if self.alert_buffer.len() >= 2 {
                        let alert_bytes = self.alert_buffer.split_to(2);
                        let mut pos = 0;
                        let alert = Alert::parse(&alert_bytes, &mut pos)?;
                        log::warn!(
                            "received {} alert: {}",
                            alert.level.name(),
                            alert.description.name()
                        );
                        return Err(alert.into_error());
                    }
                }
                ContentType::ChangeCipherSpec => {
                    return Ok(InboundMessage::ChangeCipherSpec(fragment));
                }
                ContentType::ApplicationData => {
                    return Ok(InboundMessage::ApplicationData(fragment));
                }
            }
        }
    }

    /// Consume one logical handshake message from the accumulator if a whole
    /// one is buffered: `4 + declared_length` bytes. Leftover bytes stay for
    /// the next call.
    fn take_buffered_handshake(&mut self) -> Result<Option<Vec<u8>>> {
        if self.handshake_buffer.len() < HANDSHAKE_HEADER_LEN {
            return Ok(None);
        }

        let mut pos = 1; // skip msg_type
        let declared = utils::read_u24(&self.handshake_buffer, &mut pos)? as usize;
        let total = HANDSHAKE_HEADER_LEN + declared;

        if self.handshake_buffer.len() < total {
            return Ok(None);
        }

        Ok(Some(self.handshake_buffer.split_to(total).to_vec()))
    }
}
