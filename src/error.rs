use crate::alert::{AlertDescription, AlertLevel};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A pending or future read observed the connection's cancellation flag.
    #[error("connection closed")]
    ConnectionClosed,

    /// The peer sent a TLS alert. Always fatal for the connection.
    #[error("received {} alert: {}", level.name(), description.name())]
    AlertReceived {
        level: AlertLevel,
        description: AlertDescription,
    },

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("negotiation failure: {0}")]
    NegotiationFailure(String),

    #[error("crypto failure: {0}")]
    CryptoFailure(String),

    /// Malformed message body inside a codec. Never crosses `run()`: the
    /// connection remaps it to `ProtocolError` before the host sees it.
    #[error("parse error: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
