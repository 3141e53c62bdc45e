use crate::buffer::IngressBuffer;
use crate::crypto::{
    prf, EcdheKeyPair, HandshakeTranscript, RecordOpener, RecordSealer, SecurityParameters,
    SessionKeys, Signer,
};
use crate::error::{Error, Result};
use crate::handshake::{
    self, CertificateChain, HandshakeBody, HandshakeType, ServerHello, ServerKeyExchange,
};
use crate::reassembly::{InboundMessage, RecordReassembler};
use crate::record::{ContentType, RecordReader, TlsRecord};
use std::sync::{Arc, Mutex};

/// Largest plaintext fragment per outbound record (the 2^14 protocol ceiling).
const MAX_PLAINTEXT_LEN: usize = 16384;

/// Sink for the connection's two outbound event streams, registered at
/// construction: fully framed TLS records for the peer, and decrypted
/// application data for the host.
pub trait ConnectionEvents: Send {
    fn transmit(&mut self, record: &[u8]);
    fn application_data(&mut self, plaintext: &[u8]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Start,
    AwaitClientHello,
    AwaitClientKeyExchange,
    AwaitChangeCipherSpec,
    AwaitClientFinished,
    Established,
    Closed,
    Failed,
}

struct Inbound {
    reassembler: RecordReassembler,
    transcript: HandshakeTranscript,
    params: SecurityParameters,
}

struct Outbound {
    events: Box<dyn ConnectionEvents>,
    sealer: Option<RecordSealer>,
}

/// A single server-side TLS 1.2 connection.
///
/// All protocol work happens inside `run()`, which drives the handshake to
/// completion and then loops decrypting application data until the peer's
/// bytes stop or `close()` is called. `receive_bytes`, `close` and
/// `send_application_data` may be called from any thread.
///
/// The client's Finished message is parsed and its framing validated, but
/// its verify_data is not compared against a recomputed transcript hash:
/// this engine does not authenticate clients.
pub struct ServerConnection {
    buffer: Arc<IngressBuffer>,
    inbound: Mutex<Inbound>,
    outbound: Mutex<Outbound>,
    state: Mutex<ConnectionState>,
    signer: Box<dyn Signer>,
    certificate_chain: Vec<Vec<u8>>,
}

impl ServerConnection {
    /// `certificate_chain` is the leaf-first DER chain; `signer` wraps the
    /// matching private key. Both come from the host's certificate store.
    pub fn new(
        signer: Box<dyn Signer>,
        certificate_chain: Vec<Vec<u8>>,
        events: Box<dyn ConnectionEvents>,
    ) -> Result<Self> {
        let buffer = Arc::new(IngressBuffer::new());
        let reader = RecordReader::new(Arc::clone(&buffer));

        Ok(Self {
            buffer,
            inbound: Mutex::new(Inbound {
                reassembler: RecordReassembler::new(reader),
                transcript: HandshakeTranscript::new(),
                params: SecurityParameters::new()?,
            }),
            outbound: Mutex::new(Outbound {
                events,
                sealer: None,
            }),
            state: Mutex::new(ConnectionState::Start),
            signer,
            certificate_chain,
        })
    }

    /// Feed raw bytes from the transport. Never blocks, never fails.
    pub fn receive_bytes(&self, data: &[u8]) {
        self.buffer.receive(data);
    }

    /// Set the cancellation flag: every pending or future inbound read fails
    /// with `ConnectionClosed`.
    pub fn close(&self) {
        self.buffer.close();
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: ConnectionState) {
        log::info!("connection state -> {:?}", state);
        *self.state.lock().unwrap() = state;
    }

    /// Drive the handshake, then the application-data loop. Returns `Ok` when
    /// the connection ends cleanly via `close()`; every protocol, crypto or
    /// alert failure is terminal and propagates.
    pub fn run(&self) -> Result<()> {
        let mut inbound = self.inbound.lock().unwrap();

        if let Err(e) = self.run_handshake(&mut inbound) {
            self.set_state(match e {
                Error::ConnectionClosed => ConnectionState::Closed,
                _ => ConnectionState::Failed,
            });
            return Err(Self::host_error(e));
        }

        match self.run_application_loop(&mut inbound) {
            Ok(()) => {
                self.set_state(ConnectionState::Closed);
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionState::Failed);
                Err(Self::host_error(e))
            }
        }
    }

    /// The host sees malformed message bodies as protocol errors; the parse
    /// variant stays internal to the codecs.
    fn host_error(e: Error) -> Error {
        match e {
            Error::ParseError(msg) => Error::ProtocolError(msg),
            other => other,
        }
    }

    /// Encrypt (once the handshake is complete) and emit application data,
    /// fragmented at the record-size ceiling.
    pub fn send_application_data(&self, data: &[u8]) -> Result<()> {
        let mut outbound = self.outbound.lock().unwrap();
        if outbound.sealer.is_none() {
            return Err(Error::ProtocolError(
                "Cannot send application data before handshake completion".to_string(),
            ));
        }

        for chunk in data.chunks(MAX_PLAINTEXT_LEN) {
            Self::emit_record(&mut outbound, ContentType::ApplicationData, chunk)?;
        }
        Ok(())
    }

    /// The fixed ECDHE-RSA message sequence. No branching, no resumption;
    /// any unexpected message unwinds the whole handshake.
    fn run_handshake(&self, inbound: &mut Inbound) -> Result<()> {
        self.set_state(ConnectionState::AwaitClientHello);
        let client_hello_raw = Self::expect_handshake_message(inbound)?;
        let client_hello = match handshake::decode_message(&client_hello_raw)? {
            HandshakeBody::ClientHello(hello) => hello,
            other => {
                return Err(Error::ProtocolError(format!(
                    "Expected ClientHello, got {:?}",
                    other.message_type()
                )))
            }
        };
        inbound.transcript.append(&client_hello_raw);

        if client_hello.cipher_suites.is_empty() {
            // Reject before a single response byte goes out.
            return Err(Error::NegotiationFailure(
                "ClientHello offered no usable cipher suites".to_string(),
            ));
        }
        inbound.params.client_random = client_hello.random;
        log::debug!(
            "negotiated {:?} with {} extension(s) requested",
            client_hello.cipher_suites[0],
            client_hello.extensions.len()
        );

        // ServerHello, Certificate, ServerKeyExchange, ServerHelloDone.
        let server_hello = ServerHello::new(
            inbound.params.server_random,
            client_hello.session_id.clone(),
            &client_hello.extensions,
        );
        self.send_handshake_message(
            inbound,
            handshake::encode_message(HandshakeType::ServerHello, &server_hello.serialize()),
        )?;

        let chain = CertificateChain::new(self.certificate_chain.clone());
        self.send_handshake_message(
            inbound,
            handshake::encode_message(HandshakeType::Certificate, &chain.serialize()),
        )?;

        let ecdhe = EcdheKeyPair::generate()?;
        let key_exchange = ServerKeyExchange::sign(
            ecdhe.public_key(),
            &inbound.params.client_random,
            &inbound.params.server_random,
            self.signer.as_ref(),
        )?;
        self.send_handshake_message(
            inbound,
            handshake::encode_message(HandshakeType::ServerKeyExchange, &key_exchange.serialize()),
        )?;

        self.send_handshake_message(inbound, handshake::encode_server_hello_done())?;

        self.set_state(ConnectionState::AwaitClientKeyExchange);
        let client_kx_raw = Self::expect_handshake_message(inbound)?;
        let client_kx = match handshake::decode_message(&client_kx_raw)? {
            HandshakeBody::ClientKeyExchange(kx) => kx,
            other => {
                return Err(Error::ProtocolError(format!(
                    "Expected ClientKeyExchange, got {:?}",
                    other.message_type()
                )))
            }
        };
        inbound.transcript.append(&client_kx_raw);

        self.set_state(ConnectionState::AwaitChangeCipherSpec);
        match inbound.reassembler.next_message()? {
            InboundMessage::ChangeCipherSpec(payload) => {
                if payload != [1] {
                    return Err(Error::ProtocolError(format!(
                        "Malformed ChangeCipherSpec payload: {:02x?}",
                        payload
                    )));
                }
            }
            other => {
                return Err(Error::ProtocolError(format!(
                    "Expected ChangeCipherSpec, got {:?}",
                    other.content_type()
                )))
            }
        }

        // Both public keys are known: run the key schedule and switch the
        // inbound direction to the client write key.
        let pre_master_secret = ecdhe.agree(&client_kx.public_key)?;
        let master_secret = prf::derive_master_secret(
            &pre_master_secret,
            &inbound.params.client_random,
            &inbound.params.server_random,
        );
        let key_block = prf::derive_key_block(
            &master_secret,
            &inbound.params.client_random,
            &inbound.params.server_random,
        );
        let keys = SessionKeys::from_key_block(&key_block)?;
        inbound
            .reassembler
            .enable_decryption(RecordOpener::new(keys.client_write_key, keys.client_iv));
        inbound.params.master_secret = Some(master_secret);
        log::debug!("session keys derived, inbound decryption active");

        self.set_state(ConnectionState::AwaitClientFinished);
        let finished_raw = Self::expect_handshake_message(inbound)?;
        match handshake::decode_message(&finished_raw)? {
            // verify_data is intentionally not cross-checked, see type docs.
            HandshakeBody::Finished(_) => {}
            other => {
                return Err(Error::ProtocolError(format!(
                    "Expected Finished, got {:?}",
                    other.message_type()
                )))
            }
        }
        inbound.transcript.append(&finished_raw);

        let master_secret = inbound
            .params
            .master_secret
            .as_ref()
            .ok_or_else(|| Error::CryptoFailure("Master secret missing".to_string()))?;
        let verify_data = prf::compute_verify_data(
            master_secret,
            prf::LABEL_SERVER_FINISHED,
            &inbound.transcript.current_hash(),
        )?;

        // ChangeCipherSpec goes out in the clear; the Finished that follows
        // is the first record under the server write key.
        let mut outbound = self.outbound.lock().unwrap();
        Self::emit_record(&mut outbound, ContentType::ChangeCipherSpec, &[1])?;
        outbound.sealer = Some(RecordSealer::new(keys.server_write_key, keys.server_iv));

        let finished = handshake::encode_message(HandshakeType::Finished, &verify_data);
        inbound.transcript.append(&finished);
        Self::emit_record(&mut outbound, ContentType::Handshake, &finished)?;
        drop(outbound);

        self.set_state(ConnectionState::Established);
        Ok(())
    }

    /// Post-handshake loop: one suspending read, one decrypt, one event per
    /// iteration. A cancelled read is the clean shutdown signal.
    fn run_application_loop(&self, inbound: &mut Inbound) -> Result<()> {
        loop {
            match inbound.reassembler.next_message() {
                Ok(InboundMessage::ApplicationData(plaintext)) => {
                    let mut outbound = self.outbound.lock().unwrap();
                    outbound.events.application_data(&plaintext);
                }
                Ok(other) => {
                    return Err(Error::ProtocolError(format!(
                        "Unexpected {:?} message after handshake",
                        other.content_type()
                    )))
                }
                Err(Error::ConnectionClosed) => {
                    log::info!("connection closed, leaving application data loop");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Read the next complete message and require it to be a handshake
    /// message; the raw bytes (header included) are returned for both
    /// decoding and the transcript.
    fn expect_handshake_message(inbound: &mut Inbound) -> Result<Vec<u8>> {
        match inbound.reassembler.next_message()? {
            InboundMessage::Handshake(raw) => Ok(raw),
            other => Err(Error::ProtocolError(format!(
                "Expected handshake message, got {:?} record",
                other.content_type()
            ))),
        }
    }

    /// Send one handshake message and append it to the transcript.
    fn send_handshake_message(&self, inbound: &mut Inbound, message: Vec<u8>) -> Result<()> {
        inbound.transcript.append(&message);
        let mut outbound = self.outbound.lock().unwrap();
        Self::emit_record(&mut outbound, ContentType::Handshake, &message)
    }

    /// Frame (and after the server ChangeCipherSpec, encrypt) one record and
    /// hand it to the transmit sink.
    fn emit_record(outbound: &mut Outbound, content_type: ContentType, payload: &[u8]) -> Result<()> {
        let fragment = match &mut outbound.sealer {
            Some(sealer) => sealer.seal(content_type, payload)?,
            None => payload.to_vec(),
        };

        let record = TlsRecord::new(content_type, fragment);
        log::debug!(
            "sending {:?} record, {} byte fragment",
            content_type,
            record.fragment.len()
        );
        outbound.events.transmit(&record.serialize());
        Ok(())
    }
}
