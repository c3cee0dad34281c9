//! Shared fixtures for the integration test suites: a multi-chain in-memory
//! network wired with a sender on the source chain and a whitelisted
//! executor plus a `DummyState` target on every destination chain.

#![allow(dead_code)]

use std::sync::Arc;

use borsh::{BorshDeserialize, BorshSerialize};
use interchain_proposals::{
    Address, CallFailure, EventLog, GasLedger, InMemoryHost, InvocationContext, LocalGmpNetwork,
    ProposalExecutor, ProposalSender, TargetProgram,
};

pub const SOURCE_CHAIN: &str = "ethereum";

pub fn addr(n: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = n;
    Address(bytes)
}

pub fn gateway_addr() -> Address {
    addr(0x10)
}

pub fn gas_collector_addr() -> Address {
    addr(0x11)
}

/// Address of the sender contract on the source chain; destinations
/// whitelist it as a proposal sender.
pub fn sender_contract_addr() -> Address {
    addr(0x20)
}

/// The logical initiator, e.g. a timelock; destinations whitelist it as a
/// proposal caller.
pub fn caller_addr() -> Address {
    addr(0x21)
}

pub fn owner_addr() -> Address {
    addr(0x0a)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

// ============================================================================
// DUMMY STATE TARGET
// ============================================================================

/// Call data understood by `DummyState`.
#[derive(BorshSerialize, BorshDeserialize)]
pub enum DummyStateInstruction {
    /// Replaces the stored message
    SetState(String),
    /// Always reverts with "kaboom"
    TestRevert,
}

/// Minimal stateful target: stores one string message. Not payable.
pub struct DummyState;

impl TargetProgram for DummyState {
    fn execute(
        &self,
        data: &mut Vec<u8>,
        value: u128,
        call_data: &[u8],
    ) -> Result<(), CallFailure> {
        if value > 0 {
            return Err(CallFailure::silent());
        }
        let instruction = DummyStateInstruction::try_from_slice(call_data)
            .map_err(|_| CallFailure::silent())?;
        match instruction {
            DummyStateInstruction::SetState(message) => {
                *data = message
                    .try_to_vec()
                    .expect("in-memory serialization cannot fail");
                Ok(())
            }
            DummyStateInstruction::TestRevert => Err(CallFailure::with_reason("kaboom")),
        }
    }
}

pub fn set_state_call_data(message: &str) -> Vec<u8> {
    DummyStateInstruction::SetState(message.to_string())
        .try_to_vec()
        .expect("in-memory serialization cannot fail")
}

pub fn test_revert_call_data() -> Vec<u8> {
    DummyStateInstruction::TestRevert
        .try_to_vec()
        .expect("in-memory serialization cannot fail")
}

/// Reads the message a `DummyState` account currently stores.
pub fn dummy_message(host: &InMemoryHost, dummy: Address) -> Option<String> {
    let data = host.account_data(dummy)?;
    if data.is_empty() {
        return Some(String::new());
    }
    String::try_from_slice(&data).ok()
}

// ============================================================================
// NETWORK FIXTURE
// ============================================================================

pub struct DestChain {
    pub name: String,
    pub host: Arc<InMemoryHost>,
    pub executor: Arc<ProposalExecutor>,
    pub dummy: Address,
}

pub struct TestNet {
    pub events: EventLog,
    pub network: Arc<LocalGmpNetwork>,
    pub gas: Arc<GasLedger>,
    pub sender: ProposalSender,
    pub dests: Vec<DestChain>,
}

/// Builds a network with a sender on `ethereum` and one executor plus one
/// `DummyState` per destination chain, with the sender contract and the
/// caller whitelisted everywhere.
pub fn build_network(dest_chains: &[&str]) -> TestNet {
    init_tracing();

    let events = EventLog::new();
    let network = LocalGmpNetwork::new(gateway_addr(), events.clone());
    let gas = Arc::new(GasLedger::new(gas_collector_addr(), events.clone()));

    let endpoint = network.endpoint(SOURCE_CHAIN, sender_contract_addr());
    let sender = ProposalSender::new(Arc::new(endpoint), gas.clone())
        .expect("fixture collaborators are non-zero");

    let owner = InvocationContext::from_caller(owner_addr());
    let mut dests = Vec::new();
    for (i, chain) in dest_chains.iter().enumerate() {
        let host = Arc::new(InMemoryHost::new());
        let executor_addr = addr(0x30 + i as u8);
        let dummy = addr(0x40 + i as u8);
        host.deploy(dummy, Arc::new(DummyState));

        let executor = Arc::new(ProposalExecutor::new(
            executor_addr,
            gateway_addr(),
            owner_addr(),
            host.clone(),
            events.clone(),
        ));
        executor
            .set_whitelisted_proposal_sender(&owner, SOURCE_CHAIN, sender_contract_addr(), true)
            .expect("owner context");
        executor
            .set_whitelisted_proposal_caller(&owner, SOURCE_CHAIN, caller_addr(), true)
            .expect("owner context");
        network.register_executor(chain, executor.clone());

        dests.push(DestChain {
            name: chain.to_string(),
            host,
            executor,
            dummy,
        });
    }

    TestNet {
        events,
        network,
        gas,
        sender,
        dests,
    }
}
