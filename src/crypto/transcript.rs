use ring::digest::{Context, SHA256};

/// Running hash of every handshake message exchanged, in exact wire order.
///
/// Messages are appended with their 4-byte handshake header the moment they
/// are fully sent or received; record headers and ChangeCipherSpec never
/// enter the transcript.
pub struct HandshakeTranscript {
    context: Context,
    bytes_hashed: usize,
}

impl HandshakeTranscript {
    pub fn new() -> Self {
        Self {
            context: Context::new(&SHA256),
            bytes_hashed: 0,
        }
    }

    pub fn append(&mut self, message: &[u8]) {
        self.context.update(message);
        self.bytes_hashed += message.len();
    }

    /// SHA-256 over everything appended so far. Does not finalize the
    /// transcript; later messages keep accumulating.
    pub fn current_hash(&self) -> Vec<u8> {
        self.context.clone().finish().as_ref().to_vec()
    }

    pub fn bytes_hashed(&self) -> usize {
        self.bytes_hashed
    }
}

impl Default for HandshakeTranscript {
    fn default() -> Self {
        Self::new()
    }
}
