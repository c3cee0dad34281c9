//! Error definitions for the proposal sender, executor and transport layers.

use thiserror::Error;

use crate::types::Address;

/// Failure to parse a textual address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("address hex must be 1..=40 chars, got {0}")]
    InvalidLength(usize),

    #[error("address is not valid hex")]
    InvalidHex,
}

/// Errors raised on the source side by the proposal sender.
#[derive(Error, Debug)]
pub enum SenderError {
    #[error("invalid address: transport and gas service addresses must be non-zero")]
    InvalidAddress,

    #[error("invalid fee: attached value {attached} does not match total dispatch gas {required}")]
    InvalidFee { attached: u128, required: u128 },

    #[error(transparent)]
    GasPayment(#[from] GasPaymentError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors raised on the destination side by the proposal executor.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("unauthorized: deliver may only be invoked by the transport, got {caller}")]
    NotAuthorizedTransport { caller: Address },

    #[error("source address {source_address} is not a whitelisted proposal sender for chain {source_chain}")]
    NotWhitelistedSourceAddress {
        source_chain: String,
        source_address: String,
    },

    #[error("caller {caller} is not a whitelisted proposal caller for chain {source_chain}")]
    NotWhitelistedCaller {
        source_chain: String,
        caller: Address,
    },

    #[error("malformed proposal payload: {0}")]
    MalformedPayload(String),

    /// A call failed and the callee supplied a revert reason; the reason is
    /// propagated verbatim.
    #[error("{reason}")]
    CallReverted { target: Address, reason: String },

    /// A call failed without a reason; target, value and call data are
    /// carried for diagnostics.
    #[error("proposal execution failed at target {target} (value {value}, call data 0x{})", hex::encode(.call_data))]
    ProposalExecuteFailed {
        target: Address,
        value: u128,
        call_data: Vec<u8>,
    },

    #[error("unauthorized: caller {caller} is not the owner")]
    NotOwner { caller: Address },
}

/// Errors raised by the message transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no executor registered for destination {chain}:{contract}")]
    UnknownDestination { chain: String, contract: Address },

    #[error("replay detected: nonce {nonce} already delivered on route {route}")]
    ReplayDetected { route: String, nonce: u64 },

    #[error("delivery rejected by executor: {0}")]
    Delivery(#[from] ExecutorError),
}

/// Rejection from the gas fee collector.
#[derive(Error, Debug)]
#[error("gas payment rejected: {reason}")]
pub struct GasPaymentError {
    pub reason: String,
}

/// Outcome of a failed target call inside the host. Mirrors a revert: the
/// callee may or may not supply a reason string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFailure {
    pub reason: Option<String>,
}

impl CallFailure {
    /// Failure carrying a callee-supplied reason.
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }

    /// Failure without a reason, e.g. an out-of-funds value transfer.
    pub fn silent() -> Self {
        Self { reason: None }
    }
}
