//! Core wire and invocation types shared by the sender and executor sides.
//!
//! Addresses are 20-byte values rendered as 0x-prefixed hex. Chain names are
//! plain strings: the transport authenticates them, this crate only routes
//! and compares them.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AddressParseError;

// ============================================================================
// ADDRESSES
// ============================================================================

/// A 20-byte contract or account address.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BorshSerialize, BorshDeserialize,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zeroes address. Never a valid collaborator address.
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    /// Parses a hex address, with or without 0x prefix. Shorter strings are
    /// left-padded with zeroes, the same restoration the relay applies to
    /// addresses whose leading zeroes were stripped upstream.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s.strip_prefix("0x").unwrap_or(s);
        if hex_part.is_empty() || hex_part.len() > 40 {
            return Err(AddressParseError::InvalidLength(hex_part.len()));
        }

        let padded = format!("{:0>40}", hex_part);
        let bytes = hex::decode(&padded).map_err(|_| AddressParseError::InvalidHex)?;

        let mut addr = [0u8; 20];
        addr.copy_from_slice(&bytes);
        Ok(Address(addr))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Qualified: BorshDeserialize is in scope and also has `deserialize`
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// PROPOSAL STRUCTURES
// ============================================================================

/// One low-level invocation to perform on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Call {
    /// Target contract address on the destination chain
    pub target: Address,
    /// Native value forwarded with the call
    pub value: u128,
    /// Opaque call data interpreted by the target
    pub call_data: Vec<u8>,
}

/// The logical unit dispatched and delivered: the initiating caller on the
/// source chain plus an ordered batch of calls. Built once at send time,
/// consumed exactly once at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Envelope {
    /// The address that invoked the sender on the source chain (the logical
    /// initiator, e.g. a timelock), not the sender component itself
    pub caller: Address,
    /// Calls to execute strictly in order
    pub calls: Vec<Call>,
}

/// One destination of a multi-chain fan-out. Each dispatch is independent and
/// carries its own relay gas budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainDispatch {
    /// Destination chain name
    pub destination_chain: String,
    /// Executor contract on the destination chain
    pub destination_contract: Address,
    /// Relay gas budget for this destination, in native units
    pub gas: u128,
    /// Calls to execute on the destination chain
    pub calls: Vec<Call>,
}

// ============================================================================
// INVOCATION CONTEXT
// ============================================================================

/// Explicit invocation context threaded into every entry point: the immediate
/// caller and the native value attached to the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationContext {
    /// Immediate caller address
    pub caller: Address,
    /// Attached native value
    pub value: u128,
}

impl InvocationContext {
    pub fn new(caller: Address, value: u128) -> Self {
        Self { caller, value }
    }

    /// Context for a plain call with no attached value.
    pub fn from_caller(caller: Address) -> Self {
        Self { caller, value: 0 }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip() {
        let addr: Address = "0x00000000000000000000000000000000000000ab"
            .parse()
            .unwrap();
        assert_eq!(addr.0[19], 0xab);
        assert_eq!(
            addr.to_string(),
            "0x00000000000000000000000000000000000000ab"
        );
    }

    #[test]
    fn test_address_restores_leading_zeros() {
        let addr: Address = "0x7".parse().unwrap();
        assert_eq!(addr.0[19], 0x07);
        for byte in &addr.0[..19] {
            assert_eq!(*byte, 0x00);
        }
    }

    #[test]
    fn test_address_without_prefix() {
        let with_prefix: Address = "0xdeadbeef".parse().unwrap();
        let without_prefix: Address = "deadbeef".parse().unwrap();
        assert_eq!(with_prefix, without_prefix);
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!("".parse::<Address>().is_err());
        assert!("0x".parse::<Address>().is_err());
        assert!("0xzz".parse::<Address>().is_err());
        // 41 hex chars, one over the 20-byte limit
        assert!("0x10000000000000000000000000000000000000000"
            .parse::<Address>()
            .is_err());
    }

    #[test]
    fn test_address_deserializes_from_toml_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            addr: Address,
        }

        let w: Wrapper = toml::from_str(r#"addr = "0x07""#).unwrap();
        assert_eq!(w.addr, "0x07".parse().unwrap());
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        let addr: Address = "0x1".parse().unwrap();
        assert!(!addr.is_zero());
    }
}
