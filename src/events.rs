//! Append-only observable event log.
//!
//! Every protocol-visible state change lands here: whitelist mutations, gas
//! payments, outbound dispatches and the delivery lifecycle. The log is the
//! crate's equivalent of an on-chain event stream; tests and operators read
//! it, nothing in the protocol ever reads it back.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::debug;

use crate::codec::ExecutionId;
use crate::types::Address;

/// One observable protocol event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Event {
    /// A sender contract was whitelisted or de-whitelisted for a source chain.
    WhitelistedProposalSenderSet {
        chain: String,
        address: Address,
        enabled: bool,
    },
    /// A logical caller was whitelisted or de-whitelisted for a source chain.
    WhitelistedProposalCallerSet {
        chain: String,
        address: Address,
        enabled: bool,
    },
    /// The gas collector received a relay fee for an outbound payload.
    NativeGasPaid {
        payer: Address,
        destination_chain: String,
        destination_contract: Address,
        payload_hash: [u8; 32],
        amount: u128,
    },
    /// The transport accepted an outbound envelope for delivery.
    ProposalDispatched {
        destination_chain: String,
        destination_contract: Address,
        payload_hash: [u8; 32],
        payload: Vec<u8>,
    },
    /// A delivery passed authorization; emitted once before any call runs.
    BeforeProposalExecuted {
        source_chain: String,
        source_address: String,
        payload: Vec<u8>,
    },
    /// One call of a batch completed.
    TargetExecuted {
        target: Address,
        value: u128,
        call_data: Vec<u8>,
    },
    /// A delivery completed in full.
    ProposalExecuted { execution_id: ExecutionId },
}

/// Shared handle to the append-only event log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    inner: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single event.
    pub fn emit(&self, event: Event) {
        debug!(?event, "event emitted");
        self.inner.lock().expect("event log lock poisoned").push(event);
    }

    /// Appends a batch of events as one unit, preserving order. Used by the
    /// executor to commit the buffered lifecycle events of a successful
    /// delivery.
    pub fn emit_all(&self, events: Vec<Event>) {
        let mut log = self.inner.lock().expect("event log lock poisoned");
        for event in events {
            debug!(?event, "event emitted");
            log.push(event);
        }
    }

    /// Snapshot of all events emitted so far.
    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().expect("event log lock poisoned").clone()
    }

    /// Number of events emitted so far.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("event log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_preserves_order() {
        let log = EventLog::new();
        log.emit(Event::ProposalExecuted {
            execution_id: ExecutionId([1u8; 32]),
        });
        log.emit_all(vec![
            Event::ProposalExecuted {
                execution_id: ExecutionId([2u8; 32]),
            },
            Event::ProposalExecuted {
                execution_id: ExecutionId([3u8; 32]),
            },
        ]);

        let ids: Vec<u8> = log
            .events()
            .iter()
            .map(|e| match e {
                Event::ProposalExecuted { execution_id } => execution_id.0[0],
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_clones_share_the_log() {
        let log = EventLog::new();
        let handle = log.clone();
        handle.emit(Event::ProposalExecuted {
            execution_id: ExecutionId([0u8; 32]),
        });
        assert_eq!(log.len(), 1);
    }
}
