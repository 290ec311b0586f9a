//! Configuration types for the FX1 ledger service

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Address, Error, Result, Timestamp};

/// Marketing/liquidity fee pair, in units of the ledger's rate denominator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    pub marketing_rate: u32,
    pub liquidity_rate: u32,
}

impl FeeSchedule {
    pub fn new(marketing_rate: u32, liquidity_rate: u32) -> Self {
        Self {
            marketing_rate,
            liquidity_rate,
        }
    }

    /// Combined rate charged on a taxed transfer
    pub fn total(&self) -> u32 {
        self.marketing_rate.saturating_add(self.liquidity_rate)
    }
}

/// Exchange router connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Router service URL (e.g., "http://127.0.0.1:8545/router")
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_venue_timeout")]
    pub timeout_secs: u64,
}

fn default_venue_timeout() -> u64 {
    30
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8545/router".to_string(),
            timeout_secs: default_venue_timeout(),
        }
    }
}

/// Parameters used the first time the ledger is created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    /// Administrator; receives the full initial supply
    pub admin: Address,
    /// Address of the ledger itself (holds accrued fees)
    pub token_address: Address,
    /// Receives the marketing share of distributed proceeds
    pub treasury: Address,
    /// Exchange router used for conversions
    pub router: Address,
    #[serde(default = "default_fee_schedule")]
    pub buy_fee: FeeSchedule,
    #[serde(default = "default_fee_schedule")]
    pub sell_fee: FeeSchedule,
    /// Whitelist window length after launch, in seconds
    #[serde(default = "default_whitelist_period")]
    pub whitelist_period: Timestamp,
}

fn default_fee_schedule() -> FeeSchedule {
    FeeSchedule::new(50, 0)
}

fn default_whitelist_period() -> Timestamp {
    300
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            admin: Address::ZERO,
            token_address: Address::ZERO,
            treasury: Address::ZERO,
            router: Address::ZERO,
            buy_fee: default_fee_schedule(),
            sell_fee: default_fee_schedule(),
            whitelist_period: default_whitelist_period(),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Ledger snapshot location
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Exchange router settings
    #[serde(default)]
    pub venue: VenueConfig,

    /// First-run deployment parameters
    #[serde(default)]
    pub deploy: DeployConfig,

    /// Addresses known to hold contract code (router, pair, wrapped native, ...)
    #[serde(default)]
    pub contracts: Vec<Address>,
}

fn default_api_port() -> u16 {
    18545
}

fn default_state_path() -> PathBuf {
    PathBuf::from("fx1-ledger.json")
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            state_path: default_state_path(),
            venue: VenueConfig::default(),
            deploy: DeployConfig::default(),
            contracts: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}
