//! Shared fixtures for the service tests

use std::path::PathBuf;

use fx1_core::{Address, DeployConfig, FeeSchedule, NativeAmount, ServiceConfig};
use fx1_token::{
    ExchangeVenue, LiquidityReceipt, LiquidityRequest, SwapRequest, TokenPort, VenueError,
};

/// Venue that binds a pair but refuses every conversion
pub struct ClosedVenue;

impl ExchangeVenue for ClosedVenue {
    fn pair_for(&mut self, _router: &Address, _token: &Address) -> Result<Address, VenueError> {
        Ok(Address::from_low_u64(4))
    }

    fn wrapped_native(&self, _router: &Address) -> Result<Address, VenueError> {
        Ok(Address::from_low_u64(5))
    }

    fn swap_tokens_for_native(
        &mut self,
        _router: &Address,
        _port: &mut dyn TokenPort,
        _request: &SwapRequest,
    ) -> Result<NativeAmount, VenueError> {
        Err(VenueError::Rejected("closed".into()))
    }

    fn add_liquidity(
        &mut self,
        _router: &Address,
        _port: &mut dyn TokenPort,
        _request: &LiquidityRequest,
    ) -> Result<LiquidityReceipt, VenueError> {
        Err(VenueError::Rejected("closed".into()))
    }
}

/// Config with its snapshot under a fresh per-test temp directory
pub fn service_config(name: &str) -> (ServiceConfig, PathBuf) {
    let dir = std::env::temp_dir().join(format!("fx1-api-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_dir_all(&dir);
    let config = ServiceConfig {
        state_path: dir.join("ledger.json"),
        deploy: DeployConfig {
            admin: Address::from_low_u64(1),
            token_address: Address::from_low_u64(0xf1),
            treasury: Address::from_low_u64(2),
            router: Address::from_low_u64(3),
            buy_fee: FeeSchedule::new(50, 0),
            sell_fee: FeeSchedule::new(50, 0),
            whitelist_period: 1,
        },
        contracts: vec![Address::from_low_u64(3), Address::from_low_u64(4)],
        ..ServiceConfig::default()
    };
    (config, dir)
}
