use crate::utils;

/// Certificate chain message, encode-only: each DER certificate is framed by
/// a 3-byte length, and the concatenation is wrapped in an outer 3-byte
/// length. The chain is supplied leaf-first by the host.
#[derive(Debug)]
pub struct CertificateChain {
    pub certificates: Vec<Vec<u8>>,
}

impl CertificateChain {
    pub fn new(certificates: Vec<Vec<u8>>) -> Self {
        Self { certificates }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut list = Vec::new();
        for cert in &self.certificates {
            utils::write_vector_u24(&mut list, cert);
        }

        let mut body = Vec::with_capacity(3 + list.len());
        utils::write_vector_u24(&mut body, &list);
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_framing() {
        let chain = CertificateChain::new(vec![vec![0xAA, 0xBB], vec![0xCC]]);
        let body = chain.serialize();

        assert_eq!(
            body,
            [
                0x00, 0x00, 0x09, // outer length
                0x00, 0x00, 0x02, 0xAA, 0xBB, // leaf
                0x00, 0x00, 0x01, 0xCC, // issuer
            ]
        );
    }

    #[test]
    fn test_empty_chain() {
        let chain = CertificateChain::new(vec![]);
        assert_eq!(chain.serialize(), [0x00, 0x00, 0x00]);
    }
}
