//! Transport and fee-collection collaborators.
//!
//! The protocol core only sees two seams: a `Transport` that accepts outbound
//! envelopes and a `GasService` that collects relay fees. `LocalGmpNetwork`
//! is the bundled in-memory transport: it authenticates source metadata the
//! way a GMP gateway would, assigns per-route sequential nonces, and drives
//! deliveries through an async relay pump. Production deployments replace it
//! behind the same traits.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::codec;
use crate::error::{GasPaymentError, TransportError};
use crate::events::{Event, EventLog};
use crate::executor::ProposalExecutor;
use crate::types::{Address, InvocationContext};

// ============================================================================
// COLLABORATOR TRAITS
// ============================================================================

/// Outbound side of a GMP transport.
pub trait Transport: Send + Sync {
    /// The address the transport's gateway is known by on the local chain.
    fn address(&self) -> Address;

    /// Accepts an encoded envelope for asynchronous delivery to
    /// `(destination_chain, destination_contract)`.
    fn dispatch(
        &self,
        destination_chain: &str,
        destination_contract: Address,
        payload: Vec<u8>,
    ) -> Result<(), TransportError>;
}

/// Relay fee collector.
pub trait GasService: Send + Sync {
    fn address(&self) -> Address;

    /// Collects `amount` from `payer` for relaying the payload identified by
    /// `payload_hash` to the given destination.
    fn pay_gas(
        &self,
        payer: Address,
        destination_chain: &str,
        destination_contract: Address,
        payload_hash: [u8; 32],
        amount: u128,
    ) -> Result<(), GasPaymentError>;
}

/// Off-chain relay fee estimator: a pure pricing function.
pub trait GasEstimator: Send + Sync {
    /// Native-token fee for relaying from `source_chain_id` to
    /// `destination_chain`, priced in `token_symbol`. `None` when the route
    /// is unknown.
    fn estimate_gas_fee(
        &self,
        source_chain_id: u64,
        destination_chain: &str,
        token_symbol: &str,
    ) -> Option<u128>;
}

// ============================================================================
// GAS LEDGER
// ============================================================================

/// Fee collector that records every payment in the event log.
pub struct GasLedger {
    address: Address,
    collected: Mutex<u128>,
    events: EventLog,
}

impl GasLedger {
    pub fn new(address: Address, events: EventLog) -> Self {
        Self {
            address,
            collected: Mutex::new(0),
            events,
        }
    }

    /// Total native value collected so far.
    pub fn total_collected(&self) -> u128 {
        *self.collected.lock().expect("gas ledger lock poisoned")
    }
}

impl GasService for GasLedger {
    fn address(&self) -> Address {
        self.address
    }

    fn pay_gas(
        &self,
        payer: Address,
        destination_chain: &str,
        destination_contract: Address,
        payload_hash: [u8; 32],
        amount: u128,
    ) -> Result<(), GasPaymentError> {
        if amount == 0 {
            return Err(GasPaymentError {
                reason: "zero gas payment".to_string(),
            });
        }
        *self.collected.lock().expect("gas ledger lock poisoned") += amount;
        info!(
            payer = %payer,
            destination_chain,
            amount,
            "relay gas paid"
        );
        self.events.emit(Event::NativeGasPaid {
            payer,
            destination_chain: destination_chain.to_string(),
            destination_contract,
            payload_hash,
            amount,
        });
        Ok(())
    }
}

/// Fixed fee table, keyed by destination chain and token symbol.
#[derive(Default)]
pub struct StaticGasEstimator {
    fees: HashMap<(String, String), u128>,
}

impl StaticGasEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fee(&mut self, destination_chain: &str, token_symbol: &str, fee: u128) {
        self.fees.insert(
            (destination_chain.to_string(), token_symbol.to_string()),
            fee,
        );
    }
}

impl GasEstimator for StaticGasEstimator {
    fn estimate_gas_fee(
        &self,
        _source_chain_id: u64,
        destination_chain: &str,
        token_symbol: &str,
    ) -> Option<u128> {
        self.fees
            .get(&(destination_chain.to_string(), token_symbol.to_string()))
            .copied()
    }
}

// ============================================================================
// LOCAL GMP NETWORK
// ============================================================================

/// One in-flight cross-chain message.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub source_chain: String,
    pub source_address: Address,
    pub destination_chain: String,
    pub destination_contract: Address,
    pub payload: Vec<u8>,
    /// Per-route sequence number; the network's anti-replay key.
    pub nonce: u64,
}

impl OutboundMessage {
    fn route(&self) -> String {
        format!("{}:{}", self.source_chain, self.destination_chain)
    }
}

#[derive(Default)]
struct NetworkState {
    executors: HashMap<(String, Address), Arc<ProposalExecutor>>,
    outbound: VecDeque<OutboundMessage>,
    next_nonce: HashMap<String, u64>,
    processed: HashMap<String, HashSet<u64>>,
}

/// Counters for one relay pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelaySummary {
    pub delivered: usize,
    pub failed: usize,
    pub replays: usize,
}

/// In-memory GMP network connecting senders and executors across chains.
///
/// Dispatch is a synchronous enqueue, the way a gateway call returns before
/// anything crosses chains; delivery happens later when the relay pump runs.
/// Messages that fail delivery stay queued and each later pass retries them
/// as a brand-new attempt. Successfully delivered nonces are never delivered
/// again.
pub struct LocalGmpNetwork {
    address: Address,
    events: EventLog,
    state: Mutex<NetworkState>,
}

impl LocalGmpNetwork {
    pub fn new(address: Address, events: EventLog) -> Arc<Self> {
        Arc::new(Self {
            address,
            events,
            state: Mutex::new(NetworkState::default()),
        })
    }

    /// The gateway address executors must trust as their delivery caller.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Registers the executor reachable at `(chain, executor.address())`.
    pub fn register_executor(&self, chain: &str, executor: Arc<ProposalExecutor>) {
        let mut state = self.state.lock().expect("network lock poisoned");
        state
            .executors
            .insert((chain.to_string(), executor.address()), executor);
    }

    /// Creates the outbound endpoint a sender contract at `source_address`
    /// on `source_chain` dispatches through. The endpoint stamps outbound
    /// messages with that authenticated source metadata.
    pub fn endpoint(self: &Arc<Self>, source_chain: &str, source_address: Address) -> LocalEndpoint {
        LocalEndpoint {
            network: Arc::clone(self),
            source_chain: source_chain.to_string(),
            source_address,
        }
    }

    /// Number of messages waiting for delivery.
    pub fn pending(&self) -> usize {
        self.state.lock().expect("network lock poisoned").outbound.len()
    }

    /// Operator hook: re-injects a message for another delivery attempt.
    /// A message whose nonce was already delivered is dropped as a replay on
    /// the next relay pass.
    pub fn inject(&self, message: OutboundMessage) {
        let mut state = self.state.lock().expect("network lock poisoned");
        state.outbound.push_back(message);
    }

    /// Snapshot of the queued messages, oldest first.
    pub fn outbound_snapshot(&self) -> Vec<OutboundMessage> {
        self.state
            .lock()
            .expect("network lock poisoned")
            .outbound
            .iter()
            .cloned()
            .collect()
    }

    fn enqueue(
        &self,
        source_chain: &str,
        source_address: Address,
        destination_chain: &str,
        destination_contract: Address,
        payload: Vec<u8>,
    ) {
        let payload_hash = codec::payload_hash(&payload);
        let mut state = self.state.lock().expect("network lock poisoned");
        let route = format!("{}:{}", source_chain, destination_chain);
        let nonce_entry = state.next_nonce.entry(route).or_insert(0);
        let nonce = *nonce_entry;
        *nonce_entry += 1;

        info!(
            source_chain,
            destination_chain,
            destination_contract = %destination_contract,
            nonce,
            "outbound message accepted"
        );
        state.outbound.push_back(OutboundMessage {
            source_chain: source_chain.to_string(),
            source_address,
            destination_chain: destination_chain.to_string(),
            destination_contract,
            payload: payload.clone(),
            nonce,
        });
        drop(state);

        self.events.emit(Event::ProposalDispatched {
            destination_chain: destination_chain.to_string(),
            destination_contract,
            payload_hash,
            payload,
        });
    }

    /// One relay pass: attempts delivery of every message currently queued.
    /// Failed messages are requeued for a later pass; already-delivered
    /// nonces are dropped as replays.
    pub async fn relay_all(&self) -> RelaySummary {
        let mut summary = RelaySummary::default();
        let batch = {
            let mut state = self.state.lock().expect("network lock poisoned");
            state.outbound.drain(..).collect::<Vec<_>>()
        };

        for message in batch {
            match self.deliver(&message) {
                Ok(()) => summary.delivered += 1,
                Err(TransportError::ReplayDetected { route, nonce }) => {
                    warn!(route = %route, nonce, "dropping replayed message");
                    summary.replays += 1;
                }
                Err(e) => {
                    error!(error = %e, nonce = message.nonce, "delivery failed, requeueing");
                    summary.failed += 1;
                    let mut state = self.state.lock().expect("network lock poisoned");
                    state.outbound.push_back(message);
                }
            }
        }
        summary
    }

    /// Runs relay passes until a pass delivers nothing, yielding between
    /// passes. Deliveries may themselves enqueue follow-up messages, so a
    /// single pass is not always enough to settle the network.
    pub async fn run_until_idle(&self) -> RelaySummary {
        let mut total = RelaySummary::default();
        loop {
            let pass = self.relay_all().await;
            total.delivered += pass.delivered;
            total.failed += pass.failed;
            total.replays += pass.replays;
            if pass.delivered == 0 {
                return total;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn deliver(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let route = message.route();
        let executor = {
            let state = self.state.lock().expect("network lock poisoned");

            if state
                .processed
                .get(&route)
                .map(|set| set.contains(&message.nonce))
                .unwrap_or(false)
            {
                return Err(TransportError::ReplayDetected {
                    route,
                    nonce: message.nonce,
                });
            }

            let key = (
                message.destination_chain.clone(),
                message.destination_contract,
            );
            state.executors.get(&key).cloned().ok_or_else(|| {
                TransportError::UnknownDestination {
                    chain: message.destination_chain.clone(),
                    contract: message.destination_contract,
                }
            })?
        };

        let ctx = InvocationContext::from_caller(self.address);
        executor.deliver(
            &ctx,
            &message.source_chain,
            &message.source_address.to_string(),
            &message.payload,
        )?;

        let mut state = self.state.lock().expect("network lock poisoned");
        state
            .processed
            .entry(route)
            .or_default()
            .insert(message.nonce);
        Ok(())
    }
}

/// Outbound gateway handle bound to one sender contract on one chain.
pub struct LocalEndpoint {
    network: Arc<LocalGmpNetwork>,
    source_chain: String,
    source_address: Address,
}

impl Transport for LocalEndpoint {
    fn address(&self) -> Address {
        self.network.address()
    }

    fn dispatch(
        &self,
        destination_chain: &str,
        destination_contract: Address,
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        self.network.enqueue(
            &self.source_chain,
            self.source_address,
            destination_chain,
            destination_contract,
            payload,
        );
        Ok(())
    }
}
