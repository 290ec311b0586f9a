//! Execution environment: clock and contract-code lookups

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use fx1_core::{Address, Timestamp};

pub trait Environment {
    /// Current time in unix seconds
    fn now(&self) -> Timestamp;

    /// Whether `address` holds contract code
    fn is_contract(&self, address: &Address) -> bool;
}

/// Wall-clock time and a fixed set of known contract addresses
#[derive(Debug, Clone, Default)]
pub struct SystemEnvironment {
    contracts: HashSet<Address>,
}

impl SystemEnvironment {
    pub fn new(contracts: impl IntoIterator<Item = Address>) -> Self {
        Self {
            contracts: contracts.into_iter().collect(),
        }
    }

    pub fn register_contract(&mut self, address: Address) {
        self.contracts.insert(address);
    }
}

impl Environment for SystemEnvironment {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn is_contract(&self, address: &Address) -> bool {
        self.contracts.contains(address)
    }
}
