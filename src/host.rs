//! Destination-side call substrate.
//!
//! Targets are modeled the way chain programs are: stateless program logic
//! (`TargetProgram`) operating on per-address account state owned by the
//! host. The host hands out transaction scopes that work on a working copy
//! of account state while holding the account write lock, so scopes execute
//! one at a time; nothing is visible to other readers until `commit`, and a
//! dropped transaction leaves no trace. This is what makes a delivery's call
//! batch atomic.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use tracing::debug;

use crate::error::CallFailure;
use crate::types::{Address, Call};

/// Program logic bound to a target address. `data` is the target's mutable
/// account data; `value` is the native amount transferred in with the call.
pub trait TargetProgram: Send + Sync {
    fn execute(&self, data: &mut Vec<u8>, value: u128, call_data: &[u8])
        -> Result<(), CallFailure>;
}

/// Native balance plus opaque program data for one address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountState {
    pub balance: u128,
    pub data: Vec<u8>,
}

/// In-memory account and program registry for one chain.
#[derive(Default)]
pub struct InMemoryHost {
    programs: RwLock<HashMap<Address, Arc<dyn TargetProgram>>>,
    accounts: RwLock<HashMap<Address, AccountState>>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds program logic to an address and creates its account.
    pub fn deploy(&self, address: Address, program: Arc<dyn TargetProgram>) {
        self.programs
            .write()
            .expect("host lock poisoned")
            .insert(address, program);
        self.accounts
            .write()
            .expect("host lock poisoned")
            .entry(address)
            .or_default();
    }

    /// Credits native funds to an address, creating the account if needed.
    pub fn credit(&self, address: Address, amount: u128) {
        let mut accounts = self.accounts.write().expect("host lock poisoned");
        accounts.entry(address).or_default().balance += amount;
    }

    pub fn balance_of(&self, address: Address) -> u128 {
        self.accounts
            .read()
            .expect("host lock poisoned")
            .get(&address)
            .map(|a| a.balance)
            .unwrap_or(0)
    }

    /// Committed account data for an address, if the account exists.
    pub fn account_data(&self, address: Address) -> Option<Vec<u8>> {
        self.accounts
            .read()
            .expect("host lock poisoned")
            .get(&address)
            .map(|a| a.data.clone())
    }

    /// Opens a transaction scope over current account state. The scope owns
    /// the account write lock until it commits or drops; concurrent `begin`,
    /// `credit` and balance reads block until then.
    pub fn begin(&self) -> HostTransaction<'_> {
        let guard = self.accounts.write().expect("host lock poisoned");
        let accounts = guard.clone();
        HostTransaction {
            host: self,
            guard,
            accounts,
        }
    }
}

/// One transaction scope. All call effects accumulate in a working copy of
/// account state; dropping the scope discards them, `commit` publishes them.
/// The scope holds the account write lock, so at most one is live at a time.
pub struct HostTransaction<'a> {
    host: &'a InMemoryHost,
    guard: RwLockWriteGuard<'a, HashMap<Address, AccountState>>,
    accounts: HashMap<Address, AccountState>,
}

impl HostTransaction<'_> {
    /// Invokes one call, drawing `call.value` from `from`'s balance.
    ///
    /// Fails without a reason when the target has no program bound or the
    /// payer cannot cover the value; program-level failures pass through
    /// unchanged. Any failure is terminal for the whole scope: callers are
    /// expected to drop the transaction.
    pub fn invoke(&mut self, from: Address, call: &Call) -> Result<(), CallFailure> {
        let program = {
            let programs = self.host.programs.read().expect("host lock poisoned");
            programs.get(&call.target).cloned()
        };
        let Some(program) = program else {
            debug!(target_addr = %call.target, "call to address with no program");
            return Err(CallFailure::silent());
        };

        if call.value > 0 {
            let payer = self.accounts.entry(from).or_default();
            if payer.balance < call.value {
                debug!(
                    payer = %from,
                    balance = payer.balance,
                    value = call.value,
                    "insufficient balance for value transfer"
                );
                return Err(CallFailure::silent());
            }
            payer.balance -= call.value;
            self.accounts.entry(call.target).or_default().balance += call.value;
        }

        let account = self.accounts.entry(call.target).or_default();
        let mut data = account.data.clone();
        program.execute(&mut data, call.value, &call.call_data)?;
        account.data = data;
        Ok(())
    }

    /// Publishes the working state, making all buffered effects visible.
    pub fn commit(mut self) {
        *self.guard = std::mem::take(&mut self.accounts);
    }
}
