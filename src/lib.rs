pub mod alert;
pub mod buffer;
pub mod connection;
pub mod crypto;
pub mod error;
pub mod handshake;
pub mod reassembly;
pub mod record;
pub mod utils;

pub use connection::{ConnectionEvents, ConnectionState, ServerConnection};
pub use crypto::{RsaSigner, Signer};
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn init_logging() {
    let _ = env_logger::builder().try_init();
}
