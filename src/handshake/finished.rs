use crate::crypto::prf::VERIFY_DATA_LEN;
use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Finished {
    pub verify_data: Vec<u8>,
}

impl Finished {
    pub fn new(verify_data: Vec<u8>) -> Self {
        Self { verify_data }
    }

    /// Framing is validated (12 bytes under the SHA-256 PRF); the value
    /// itself is not checked against a recomputed transcript hash, see the
    /// connection documentation.
    pub fn parse(data: &[u8], pos: &mut usize) -> Result<Self> {
        let verify_data = data[*pos..].to_vec();
        *pos = data.len();

        if verify_data.len() != VERIFY_DATA_LEN {
            return Err(Error::ParseError(format!(
                "Finished verify_data must be {} bytes, got {}",
                VERIFY_DATA_LEN,
                verify_data.len()
            )));
        }

        Ok(Self { verify_data })
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.verify_data.clone()
    }
}
