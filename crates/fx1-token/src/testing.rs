//! Test doubles: a hand-driven clock and a fixed-rate exchange venue

use std::collections::{BTreeMap, HashSet};

use fx1_core::constants::TOKEN_UNIT;
use fx1_core::{Address, Amount, DeployConfig, FeeSchedule, NativeAmount, Timestamp};

use crate::env::Environment;
use crate::token::Token;
use crate::venue::{
    ExchangeVenue, LiquidityReceipt, LiquidityRequest, SwapRequest, TokenPort, VenueError,
};

pub type TestToken = Token<FixedRateVenue, ManualEnvironment>;

pub mod ids {
    use fx1_core::Address;

    pub const ADMIN: Address = low(1);
    pub const TREASURY: Address = low(2);
    pub const ROUTER: Address = low(3);
    pub const PAIR: Address = low(4);
    pub const WRAPPED: Address = low(5);
    pub const TOKEN: Address = low(0xf1);

    const fn low(n: u8) -> Address {
        Address([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, n])
    }

    pub fn user(n: u64) -> Address {
        Address::from_low_u64(1_000 + n)
    }
}

pub fn tokens(n: u128) -> Amount {
    n * TOKEN_UNIT
}

pub const START: Timestamp = 1_700_000_000;

#[derive(Debug, Clone)]
pub struct ManualEnvironment {
    now: Timestamp,
    contracts: HashSet<Address>,
}

impl ManualEnvironment {
    pub fn new() -> Self {
        Self {
            now: START,
            contracts: [ids::ROUTER, ids::PAIR, ids::WRAPPED].into_iter().collect(),
        }
    }

    pub fn advance(&mut self, secs: Timestamp) {
        self.now += secs;
    }

    pub fn register_contract(&mut self, address: Address) {
        self.contracts.insert(address);
    }
}

impl Environment for ManualEnvironment {
    fn now(&self) -> Timestamp {
        self.now
    }

    fn is_contract(&self, address: &Address) -> bool {
        self.contracts.contains(address)
    }
}

/// Router that prices every token at `rate_num / rate_den` native units and
/// parks pulled tokens in the pair
#[derive(Debug)]
pub struct FixedRateVenue {
    pub rate_num: u128,
    pub rate_den: u128,
    pub fail_swaps: bool,
    pub fail_liquidity: bool,
    /// Panic mid-swap, after the tokens were pulled
    pub panic_swaps: bool,
    /// Transfer performed through the port during the next swap
    pub reenter: Option<(Address, Address, Amount)>,
    pub swaps: Vec<SwapRequest>,
    pub deposits: Vec<LiquidityRequest>,
    native_sent: BTreeMap<Address, NativeAmount>,
    lp_minted: BTreeMap<Address, Amount>,
}

impl FixedRateVenue {
    pub fn new() -> Self {
        Self {
            rate_num: 1,
            rate_den: 1_000,
            fail_swaps: false,
            fail_liquidity: false,
            panic_swaps: false,
            reenter: None,
            swaps: Vec::new(),
            deposits: Vec::new(),
            native_sent: BTreeMap::new(),
            lp_minted: BTreeMap::new(),
        }
    }

    pub fn quote(&self, amount: Amount) -> NativeAmount {
        amount * self.rate_num / self.rate_den
    }

    pub fn native_sent_to(&self, address: &Address) -> NativeAmount {
        self.native_sent.get(address).copied().unwrap_or(0)
    }

    pub fn lp_minted_to(&self, address: &Address) -> Amount {
        self.lp_minted.get(address).copied().unwrap_or(0)
    }

    fn check_router(router: &Address) -> Result<(), VenueError> {
        if *router != ids::ROUTER {
            return Err(VenueError::Rejected(format!("unknown router {}", router)));
        }
        Ok(())
    }
}

impl ExchangeVenue for FixedRateVenue {
    fn pair_for(&mut self, router: &Address, _token: &Address) -> Result<Address, VenueError> {
        Self::check_router(router)?;
        Ok(ids::PAIR)
    }

    fn wrapped_native(&self, router: &Address) -> Result<Address, VenueError> {
        Self::check_router(router)?;
        Ok(ids::WRAPPED)
    }

    fn swap_tokens_for_native(
        &mut self,
        router: &Address,
        port: &mut dyn TokenPort,
        request: &SwapRequest,
    ) -> Result<NativeAmount, VenueError> {
        Self::check_router(router)?;
        if self.fail_swaps {
            return Err(VenueError::Rejected("INSUFFICIENT_OUTPUT_AMOUNT".into()));
        }
        let token = port.token_address();
        port.transfer_from(router, &token, &ids::PAIR, request.amount_in)?;
        if self.panic_swaps {
            panic!("router crashed mid-swap");
        }
        if let Some((from, to, amount)) = self.reenter.take() {
            port.transfer(&from, &to, amount)?;
        }

        let out = self.quote(request.amount_in);
        self.swaps.push(request.clone());
        *self.native_sent.entry(request.recipient).or_default() += out;
        Ok(out)
    }

    fn add_liquidity(
        &mut self,
        router: &Address,
        port: &mut dyn TokenPort,
        request: &LiquidityRequest,
    ) -> Result<LiquidityReceipt, VenueError> {
        Self::check_router(router)?;
        if self.fail_liquidity {
            return Err(VenueError::Transport("connection reset".into()));
        }
        let token = port.token_address();
        port.transfer_from(router, &token, &ids::PAIR, request.token_amount)?;

        let liquidity = request.token_amount;
        self.deposits.push(request.clone());
        *self.lp_minted.entry(request.recipient).or_default() += liquidity;
        Ok(LiquidityReceipt {
            token_used: request.token_amount,
            native_used: request.native_amount,
            liquidity,
        })
    }
}

pub fn deploy_params() -> DeployConfig {
    DeployConfig {
        admin: ids::ADMIN,
        token_address: ids::TOKEN,
        treasury: ids::TREASURY,
        router: ids::ROUTER,
        buy_fee: FeeSchedule::new(50, 0),
        sell_fee: FeeSchedule::new(50, 0),
        whitelist_period: 3_600,
    }
}

/// Freshly deployed, not launched
pub fn deployed() -> TestToken {
    Token::deploy(&deploy_params(), FixedRateVenue::new(), ManualEnvironment::new())
        .expect("test deployment")
}

/// Launched with the whitelist window already over; events drained
pub fn launched() -> TestToken {
    let mut token = deployed();
    token.begin_launch(ids::ADMIN).expect("launch");
    let period = token.whitelist_period();
    token.env_mut().advance(period);
    token.take_events();
    token
}
