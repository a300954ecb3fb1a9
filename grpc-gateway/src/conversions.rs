//! Conversions between wire (protobuf) and model types.
//!
//! The fallible direction is wire → model: field shapes are validated here
//! so malformed peer input surfaces as `INVALID_ARGUMENT` at the RPC
//! boundary instead of an unhandled fault deeper in the node.

use mst::model::{PublicKey, Transaction};
use ordering::Proposal;

use crate::error::{GatewayError, GatewayResult};
use crate::proto;

pub fn transaction_from_wire(wire: proto::Transaction) -> GatewayResult<Transaction> {
    let creator = public_key_from_wire(&wire.creator, "creator")?;
    if wire.quorum == 0 {
        return Err(GatewayError::Decode("quorum must be positive".into()));
    }

    let mut tx = Transaction::new(creator, wire.created_at_ms, wire.quorum, wire.payload);
    for signature in wire.signatures {
        let public_key = public_key_from_wire(&signature.public_key, "signature public key")?;
        // Duplicate keys on the wire are absorbed, mirroring merge semantics.
        let _ = tx.add_signature(signature.signed_data, public_key);
    }
    Ok(tx)
}

pub fn transaction_to_wire(tx: &Transaction) -> proto::Transaction {
    proto::Transaction {
        creator: tx.creator().as_bytes().to_vec(),
        created_at_ms: tx.created_at(),
        quorum: tx.quorum(),
        payload: tx.payload().to_vec(),
        signatures: tx
            .signatures()
            .map(|signature| proto::Signature {
                public_key: signature.public_key.as_bytes().to_vec(),
                signed_data: signature.signed_data,
            })
            .collect(),
    }
}

pub fn proposal_from_wire(wire: proto::Proposal) -> GatewayResult<Proposal> {
    if wire.transactions.is_empty() {
        return Err(GatewayError::Decode("proposal carries no transactions".into()));
    }
    let transactions = wire
        .transactions
        .into_iter()
        .map(transaction_from_wire)
        .collect::<GatewayResult<Vec<_>>>()?;
    Ok(Proposal {
        height: wire.height,
        created_at: wire.created_at_ms,
        transactions,
    })
}

pub fn proposal_to_wire(proposal: &Proposal) -> proto::Proposal {
    proto::Proposal {
        height: proposal.height,
        created_at_ms: proposal.created_at,
        transactions: proposal
            .transactions
            .iter()
            .map(transaction_to_wire)
            .collect(),
    }
}

fn public_key_from_wire(bytes: &[u8], field: &str) -> GatewayResult<PublicKey> {
    let raw: [u8; 32] = bytes.try_into().map_err(|_| {
        GatewayError::Decode(format!("{field} must be 32 bytes, got {}", bytes.len()))
    })?;
    Ok(PublicKey(raw))
}
