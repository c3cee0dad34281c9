//! Interchain Proposals Library
//!
//! This crate relays governance-style proposals, batches of arbitrary
//! contract calls, from a source chain to destination chains over a generic
//! message-passing transport, and executes them there only if both the
//! relaying contract and the logical initiator are explicitly whitelisted.

pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod host;
pub mod sender;
pub mod transport;
pub mod types;
pub mod whitelist;

// Re-export commonly used types
pub use codec::ExecutionId;
pub use config::{ChainConfig, RelayConfig};
pub use error::{CallFailure, ExecutorError, SenderError, TransportError};
pub use events::{Event, EventLog};
pub use executor::ProposalExecutor;
pub use host::{AccountState, InMemoryHost, TargetProgram};
pub use sender::ProposalSender;
pub use transport::{
    GasEstimator, GasLedger, GasService, LocalGmpNetwork, RelaySummary, StaticGasEstimator,
    Transport,
};
pub use types::{Address, Call, CrossChainDispatch, Envelope, InvocationContext};
pub use whitelist::WhitelistRegistry;
