use std::collections::BTreeMap;

use crate::model::signature::{PublicKey, Signature};

/// A single command-carrying transaction inside a multi-signature batch.
///
/// The payload is an opaque command blob; this crate only cares about the
/// signature set and the quorum it has to reach. Signatures are keyed by
/// public key, so a signatory contributes at most one signature per
/// transaction and the set grows monotonically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// The peer that authored the transaction
    creator: PublicKey,
    /// Creation time in unix milliseconds, stamped by the creating peer
    created_at: u64,
    /// Number of distinct signatures required before the transaction is
    /// considered fully signed
    quorum: u32,
    /// Opaque command bytes
    payload: Vec<u8>,
    /// Collected signatures, keyed by signatory public key
    signatures: BTreeMap<PublicKey, Vec<u8>>,
    /// Content hash of everything except the signatures
    payload_hash: [u8; blake3::OUT_LEN],
}

impl Transaction {
    pub fn new(creator: PublicKey, created_at: u64, quorum: u32, payload: Vec<u8>) -> Self {
        let payload_hash = Self::compute_payload_hash(&creator, created_at, quorum, &payload);
        Self {
            creator,
            created_at,
            quorum,
            payload,
            signatures: BTreeMap::new(),
            payload_hash,
        }
    }

    fn compute_payload_hash(
        creator: &PublicKey,
        created_at: u64,
        quorum: u32,
        payload: &[u8],
    ) -> [u8; blake3::OUT_LEN] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(creator.as_bytes());
        hasher.update(&created_at.to_le_bytes());
        hasher.update(&quorum.to_le_bytes());
        hasher.update(payload);
        hasher.finalize().into()
    }

    /// Attaches a signature to the transaction.
    ///
    /// Returns `false` (and leaves the set untouched) when the public key
    /// already signed this transaction; duplicates from gossip are absorbed
    /// silently this way.
    pub fn add_signature(&mut self, signed_data: Vec<u8>, public_key: PublicKey) -> bool {
        if self.signatures.contains_key(&public_key) {
            return false;
        }
        self.signatures.insert(public_key, signed_data);
        true
    }

    pub fn creator(&self) -> &PublicKey {
        &self.creator
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn quorum(&self) -> u32 {
        self.quorum
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Hash over the transaction contents excluding signatures. Signature
    /// growth never changes it.
    pub fn payload_hash(&self) -> &[u8; blake3::OUT_LEN] {
        &self.payload_hash
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// Collected signatures in public-key order.
    pub fn signatures(&self) -> impl Iterator<Item = Signature> + '_ {
        self.signatures
            .iter()
            .map(|(public_key, signed_data)| Signature {
                public_key: *public_key,
                signed_data: signed_data.clone(),
            })
    }

    pub fn has_signature_from(&self, public_key: &PublicKey) -> bool {
        self.signatures.contains_key(public_key)
    }
}
