use std::fmt;

/// Public key identifying one signatory.
///
/// The key is opaque to the state engine: signature verification is the
/// transport layer's responsibility, performed before a batch reaches the
/// state.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0[..8]))
    }
}

/// A single `(public key, signed data)` pair attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub public_key: PublicKey,
    pub signed_data: Vec<u8>,
}
