//! Service configuration.
//!
//! Deployments describe their chain topology, trusted collaborator addresses
//! and relay fee table in a TOML file. Keys and addresses live in the file as
//! hex strings and parse into typed addresses at load time.

use serde::{Deserialize, Serialize};

use crate::transport::StaticGasEstimator;
use crate::types::Address;

/// Top-level configuration for a proposal relay deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Chains participating in the relay
    pub chains: Vec<ChainConfig>,
    /// Trusted transport gateway
    pub transport: TransportConfig,
    /// Relay fee collection
    pub gas_service: GasServiceConfig,
    /// Sender contracts to whitelist at startup
    #[serde(default)]
    pub whitelisted_senders: Vec<WhitelistSeed>,
    /// Logical callers to whitelist at startup
    #[serde(default)]
    pub whitelisted_callers: Vec<WhitelistSeed>,
}

/// One chain participating in the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Human-readable name, the key used in whitelists and routing
    pub name: String,
    /// Unique chain identifier
    pub chain_id: u64,
    /// Executor contract on this chain, if it receives proposals
    #[serde(default)]
    pub executor_addr: Option<Address>,
    /// Owner of the executor's whitelists
    #[serde(default)]
    pub owner_addr: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Gateway address; executors accept deliveries only from it
    pub gateway_addr: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasServiceConfig {
    /// Fee collector address
    pub collector_addr: Address,
    /// Native token symbol fees are priced in
    pub token_symbol: String,
    /// Flat per-destination relay fees
    #[serde(default)]
    pub fees: Vec<FeeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeEntry {
    pub destination_chain: String,
    /// Flat fee in native units. TOML integers are 64-bit; widened to
    /// `u128` where it feeds the estimator.
    pub fee: u64,
}

/// One whitelist entry to apply at startup: `address` is authorized for
/// proposals arriving from `source_chain`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistSeed {
    pub source_chain: String,
    pub address: Address,
}

impl RelayConfig {
    /// Loads configuration from the TOML file. The path defaults to
    /// `config/interchain-proposals.toml` and can be overridden via the
    /// `INTERCHAIN_PROPOSALS_CONFIG_PATH` environment variable (used by
    /// tests).
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("INTERCHAIN_PROPOSALS_CONFIG_PATH")
            .unwrap_or_else(|_| "config/interchain-proposals.toml".to_string());

        if !std::path::Path::new(&config_path).exists() {
            return Err(anyhow::anyhow!(
                "Configuration file '{}' not found",
                config_path
            ));
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: RelayConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration: chain names and IDs must be unique, and
    /// the trusted collaborator addresses must be non-zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, chain) in self.chains.iter().enumerate() {
            for other in &self.chains[i + 1..] {
                if chain.name == other.name {
                    return Err(anyhow::anyhow!(
                        "Configuration error: duplicate chain name '{}'",
                        chain.name
                    ));
                }
                if chain.chain_id == other.chain_id {
                    return Err(anyhow::anyhow!(
                        "Configuration error: chains '{}' and '{}' share chain ID {}",
                        chain.name,
                        other.name,
                        chain.chain_id
                    ));
                }
            }
        }

        if self.transport.gateway_addr.is_zero() {
            return Err(anyhow::anyhow!(
                "Configuration error: transport gateway address must be non-zero"
            ));
        }
        if self.gas_service.collector_addr.is_zero() {
            return Err(anyhow::anyhow!(
                "Configuration error: gas collector address must be non-zero"
            ));
        }

        Ok(())
    }

    /// Builds the fee estimator backing this deployment's fee table.
    pub fn gas_estimator(&self) -> StaticGasEstimator {
        let mut estimator = StaticGasEstimator::new();
        for entry in &self.gas_service.fees {
            estimator.set_fee(
                &entry.destination_chain,
                &self.gas_service.token_symbol,
                u128::from(entry.fee),
            );
        }
        estimator
    }

    /// Chain config by name, if present.
    pub fn chain(&self, name: &str) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.name == name)
    }
}
