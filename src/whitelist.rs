//! Owner-gated whitelist registries for proposal senders and callers.
//!
//! Two independent allow-lists, both keyed by source chain name: one for the
//! sender contracts a delivery may originate from, one for the logical
//! callers inside the envelope. Whitelisting one never implies the other.

use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::error::ExecutorError;
use crate::events::{Event, EventLog};
use crate::types::{Address, InvocationContext};

/// The executor's whitelist state. Only the owner mutates it; every delivery
/// being authorized reads it.
pub struct WhitelistRegistry {
    owner: Address,
    senders: HashMap<String, HashSet<Address>>,
    callers: HashMap<String, HashSet<Address>>,
    events: EventLog,
}

impl WhitelistRegistry {
    pub fn new(owner: Address, events: EventLog) -> Self {
        Self {
            owner,
            senders: HashMap::new(),
            callers: HashMap::new(),
            events,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Whitelists or de-whitelists a sender contract for a source chain.
    /// Idempotent; re-setting the same value re-emits the event.
    pub fn set_whitelisted_sender(
        &mut self,
        ctx: &InvocationContext,
        chain: &str,
        address: Address,
        enabled: bool,
    ) -> Result<(), ExecutorError> {
        self.require_owner(ctx)?;
        apply(&mut self.senders, chain, address, enabled);
        info!(chain, address = %address, enabled, "proposal sender whitelist updated");
        self.events.emit(Event::WhitelistedProposalSenderSet {
            chain: chain.to_string(),
            address,
            enabled,
        });
        Ok(())
    }

    /// Whitelists or de-whitelists a logical caller for a source chain.
    pub fn set_whitelisted_caller(
        &mut self,
        ctx: &InvocationContext,
        chain: &str,
        address: Address,
        enabled: bool,
    ) -> Result<(), ExecutorError> {
        self.require_owner(ctx)?;
        apply(&mut self.callers, chain, address, enabled);
        info!(chain, address = %address, enabled, "proposal caller whitelist updated");
        self.events.emit(Event::WhitelistedProposalCallerSet {
            chain: chain.to_string(),
            address,
            enabled,
        });
        Ok(())
    }

    pub fn is_whitelisted_sender(&self, chain: &str, address: Address) -> bool {
        self.senders
            .get(chain)
            .map(|set| set.contains(&address))
            .unwrap_or(false)
    }

    pub fn is_whitelisted_caller(&self, chain: &str, address: Address) -> bool {
        self.callers
            .get(chain)
            .map(|set| set.contains(&address))
            .unwrap_or(false)
    }

    fn require_owner(&self, ctx: &InvocationContext) -> Result<(), ExecutorError> {
        if ctx.caller != self.owner {
            return Err(ExecutorError::NotOwner { caller: ctx.caller });
        }
        Ok(())
    }
}

fn apply(map: &mut HashMap<String, HashSet<Address>>, chain: &str, address: Address, enabled: bool) {
    let set = map.entry(chain.to_string()).or_default();
    if enabled {
        set.insert(address);
    } else {
        set.remove(&address);
    }
}
