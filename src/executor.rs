//! Destination-side proposal executor.
//!
//! Receives transport-delivered `(source_chain, source_address, payload)`
//! triples, authorizes them against the two whitelists, then executes the
//! decoded envelope's calls in order inside one host transaction. A delivery
//! either commits in full, with its complete event sequence, or leaves no
//! trace: no account state, no events.
//!
//! The executor performs no deduplication. Re-delivery of an identical triple
//! re-executes it; anti-replay is the transport's job.

use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::codec::{self, ExecutionId};
use crate::config::WhitelistSeed;
use crate::error::{CallFailure, ExecutorError};
use crate::events::{Event, EventLog};
use crate::host::InMemoryHost;
use crate::types::{Address, InvocationContext};
use crate::whitelist::WhitelistRegistry;

pub struct ProposalExecutor {
    /// The executor's own address: the destination contract proposals are
    /// routed to, and the payer of value-bearing calls.
    address: Address,
    /// Only this address may invoke `deliver`.
    transport: Address,
    registry: RwLock<WhitelistRegistry>,
    host: Arc<InMemoryHost>,
    events: EventLog,
}

impl ProposalExecutor {
    pub fn new(
        address: Address,
        transport: Address,
        owner: Address,
        host: Arc<InMemoryHost>,
        events: EventLog,
    ) -> Self {
        Self {
            address,
            transport,
            registry: RwLock::new(WhitelistRegistry::new(owner, events.clone())),
            host,
            events,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.registry.read().expect("registry lock poisoned").owner()
    }

    // ------------------------------------------------------------------
    // Whitelist surface (owner-only)
    // ------------------------------------------------------------------

    pub fn set_whitelisted_proposal_sender(
        &self,
        ctx: &InvocationContext,
        chain: &str,
        address: Address,
        enabled: bool,
    ) -> Result<(), ExecutorError> {
        self.registry
            .write()
            .expect("registry lock poisoned")
            .set_whitelisted_sender(ctx, chain, address, enabled)
    }

    pub fn set_whitelisted_proposal_caller(
        &self,
        ctx: &InvocationContext,
        chain: &str,
        address: Address,
        enabled: bool,
    ) -> Result<(), ExecutorError> {
        self.registry
            .write()
            .expect("registry lock poisoned")
            .set_whitelisted_caller(ctx, chain, address, enabled)
    }

    pub fn is_whitelisted_proposal_sender(&self, chain: &str, address: Address) -> bool {
        self.registry
            .read()
            .expect("registry lock poisoned")
            .is_whitelisted_sender(chain, address)
    }

    pub fn is_whitelisted_proposal_caller(&self, chain: &str, address: Address) -> bool {
        self.registry
            .read()
            .expect("registry lock poisoned")
            .is_whitelisted_caller(chain, address)
    }

    /// Applies a deployment's startup whitelist seeds, acting as the owner.
    /// Emits the same events as individual whitelist mutations.
    pub fn apply_whitelist_seeds(
        &self,
        senders: &[WhitelistSeed],
        callers: &[WhitelistSeed],
    ) -> Result<(), ExecutorError> {
        let owner = InvocationContext::from_caller(self.owner());
        for seed in senders {
            self.set_whitelisted_proposal_sender(&owner, &seed.source_chain, seed.address, true)?;
        }
        for seed in callers {
            self.set_whitelisted_proposal_caller(&owner, &seed.source_chain, seed.address, true)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delivery
    // ------------------------------------------------------------------

    /// Executes one transport-delivered proposal.
    ///
    /// Authorization runs before anything else: the delivering source
    /// contract must be sender-whitelisted and the envelope's caller must be
    /// caller-whitelisted, both for the reported source chain. The checks are
    /// independent; neither implies the other.
    pub fn deliver(
        &self,
        ctx: &InvocationContext,
        source_chain: &str,
        source_address: &str,
        payload: &[u8],
    ) -> Result<ExecutionId, ExecutorError> {
        if ctx.caller != self.transport {
            warn!(caller = %ctx.caller, "deliver invoked by non-transport caller");
            return Err(ExecutorError::NotAuthorizedTransport { caller: ctx.caller });
        }

        let (envelope, caller) = {
            let registry = self.registry.read().expect("registry lock poisoned");

            let whitelisted_sender = source_address
                .parse::<Address>()
                .map(|addr| registry.is_whitelisted_sender(source_chain, addr))
                .unwrap_or(false);
            if !whitelisted_sender {
                warn!(source_chain, source_address, "source address not whitelisted");
                return Err(ExecutorError::NotWhitelistedSourceAddress {
                    source_chain: source_chain.to_string(),
                    source_address: source_address.to_string(),
                });
            }

            let envelope = codec::decode_envelope(payload)
                .map_err(|e| ExecutorError::MalformedPayload(e.to_string()))?;

            if !registry.is_whitelisted_caller(source_chain, envelope.caller) {
                warn!(source_chain, caller = %envelope.caller, "proposal caller not whitelisted");
                return Err(ExecutorError::NotWhitelistedCaller {
                    source_chain: source_chain.to_string(),
                    caller: envelope.caller,
                });
            }

            let caller = envelope.caller;
            (envelope, caller)
        };

        info!(
            source_chain,
            source_address,
            caller = %caller,
            calls = envelope.calls.len(),
            "executing proposal"
        );

        // Lifecycle events are buffered alongside the host transaction and
        // only become observable if the whole batch commits.
        let mut pending = vec![Event::BeforeProposalExecuted {
            source_chain: source_chain.to_string(),
            source_address: source_address.to_string(),
            payload: payload.to_vec(),
        }];

        let mut tx = self.host.begin();
        for call in &envelope.calls {
            match tx.invoke(self.address, call) {
                Ok(()) => pending.push(Event::TargetExecuted {
                    target: call.target,
                    value: call.value,
                    call_data: call.call_data.clone(),
                }),
                Err(CallFailure {
                    reason: Some(reason),
                }) => {
                    warn!(target_addr = %call.target, reason = %reason, "call reverted");
                    return Err(ExecutorError::CallReverted {
                        target: call.target,
                        reason,
                    });
                }
                Err(CallFailure { reason: None }) => {
                    warn!(target_addr = %call.target, "call failed without reason");
                    return Err(ExecutorError::ProposalExecuteFailed {
                        target: call.target,
                        value: call.value,
                        call_data: call.call_data.clone(),
                    });
                }
            }
        }

        let execution_id = codec::execution_id(source_chain, source_address, caller, payload);
        pending.push(Event::ProposalExecuted { execution_id });

        tx.commit();
        self.events.emit_all(pending);

        info!(%execution_id, "proposal executed");
        Ok(execution_id)
    }
}
