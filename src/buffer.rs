use crate::error::{Error, Result};
use bytes::BytesMut;
use std::sync::{Condvar, Mutex};

/// Accumulates raw inbound bytes and hands them out in exact-sized chunks.
///
/// `receive` never blocks and never fails. `read_exact` is the engine's only
/// suspension point: it waits until enough bytes are queued, observing the
/// `closed` flag on every wakeup so cancellation is seen promptly. A closed
/// buffer never returns a partial read.
pub struct IngressBuffer {
    state: Mutex<BufferState>,
    available: Condvar,
}

struct BufferState {
    queued: BytesMut,
    closed: bool,
}

impl IngressBuffer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BufferState {
                queued: BytesMut::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Append raw bytes from the transport and wake any pending reader.
    pub fn receive(&self, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.queued.extend_from_slice(data);
        self.available.notify_all();
    }

    /// Remove and return exactly `len` bytes, waiting until they are queued.
    pub fn read_exact(&self, len: usize) -> Result<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.closed {
                return Err(Error::ConnectionClosed);
            }
            if state.queued.len() >= len {
                return Ok(state.queued.split_to(len).to_vec());
            }
            state = self.available.wait(state).unwrap();
        }
    }

    /// Set the cancellation flag and wake all waiters.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn queued_len(&self) -> usize {
        self.state.lock().unwrap().queued.len()
    }
}

impl Default for IngressBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_read_exact_preserves_order() {
        let buffer = IngressBuffer::new();
        buffer.receive(&[1, 2, 3]);
        buffer.receive(&[4, 5]);

        assert_eq!(buffer.read_exact(2).unwrap(), vec![1, 2]);
        assert_eq!(buffer.read_exact(3).unwrap(), vec![3, 4, 5]);
        assert_eq!(buffer.queued_len(), 0);
    }

    #[test]
    fn test_read_waits_for_bytes() {
        let buffer = Arc::new(IngressBuffer::new());
        let writer = Arc::clone(&buffer);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            writer.receive(&[0xAA; 4]);
        });

        // Blocks until the writer thread delivers all four bytes.
        assert_eq!(buffer.read_exact(4).unwrap(), vec![0xAA; 4]);
        handle.join().unwrap();
    }

    #[test]
    fn test_close_fails_pending_read() {
        let buffer = Arc::new(IngressBuffer::new());
        let closer = Arc::clone(&buffer);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            closer.close();
        });

        match buffer.read_exact(1) {
            Err(Error::ConnectionClosed) => {}
            other => panic!("expected ConnectionClosed, got {:?}", other.map(|_| ())),
        }
        handle.join().unwrap();
    }

    #[test]
    fn test_closed_buffer_never_returns_partial() {
        let buffer = IngressBuffer::new();
        buffer.receive(&[1, 2]);
        assert!(!buffer.is_closed());
        buffer.close();
        assert!(buffer.is_closed());

        // Two bytes are queued but the flag wins; no partial data comes back.
        assert!(matches!(buffer.read_exact(4), Err(Error::ConnectionClosed)));
        assert!(matches!(buffer.read_exact(1), Err(Error::ConnectionClosed)));
    }
}
