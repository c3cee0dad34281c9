//! Canonical wire codec for proposal envelopes.
//!
//! Envelopes are Borsh-encoded: the encoding is deterministic, so the same
//! logical batch always serializes to the same bytes regardless of who built
//! it, and the payload hash is stable across the sender and executor sides.
//! Decoding fails closed: truncated or trailing bytes reject the whole
//! payload.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::Serialize;
use sha3::{Digest, Keccak256};

use crate::types::{Address, Envelope};

/// Deterministic identifier correlating one delivery for off-chain tracking.
/// Computed fresh on every delivery, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutionId(pub [u8; 32]);

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for ExecutionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Borsh image of the execution-id preimage. Field order is part of the wire
/// format; do not reorder.
#[derive(BorshSerialize)]
struct ExecutionSeed {
    source_chain: String,
    source_address: String,
    caller: Address,
    payload: Vec<u8>,
}

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Encodes an envelope into its canonical wire form.
pub fn encode_envelope(envelope: &Envelope) -> Vec<u8> {
    envelope
        .try_to_vec()
        .expect("in-memory serialization cannot fail")
}

/// Decodes an envelope from its canonical wire form. Rejects truncated input
/// and trailing bytes.
pub fn decode_envelope(payload: &[u8]) -> Result<Envelope, std::io::Error> {
    Envelope::try_from_slice(payload)
}

/// Hash identifying a payload for fee tagging and dispatch correlation.
pub fn payload_hash(payload: &[u8]) -> [u8; 32] {
    keccak256(payload)
}

/// Derives the execution identifier for one delivery.
pub fn execution_id(
    source_chain: &str,
    source_address: &str,
    caller: Address,
    payload: &[u8],
) -> ExecutionId {
    let seed = ExecutionSeed {
        source_chain: source_chain.to_string(),
        source_address: source_address.to_string(),
        caller,
        payload: payload.to_vec(),
    };
    let encoded = seed
        .try_to_vec()
        .expect("in-memory serialization cannot fail");
    ExecutionId(keccak256(&encoded))
}
