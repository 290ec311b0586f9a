//! HTTP client for an external exchange router service
//!
//! The ledger calls the venue synchronously while holding its lock, so every
//! request is driven to completion on the runtime handle captured at
//! construction. Only call the venue from a blocking worker thread.

use std::collections::HashMap;
use std::time::Duration;

use fx1_core::{Address, NativeAmount, Timestamp, VenueConfig};
use fx1_token::{
    ExchangeVenue, LiquidityReceipt, LiquidityRequest, SwapRequest, TokenPort, VenueError,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::runtime::Handle;

#[derive(Serialize)]
struct PairQuery<'a> {
    router: &'a Address,
    token: &'a Address,
}

#[derive(Deserialize)]
struct PairReply {
    pair: Address,
}

#[derive(Serialize)]
struct WrappedQuery<'a> {
    router: &'a Address,
}

#[derive(Deserialize)]
struct WrappedReply {
    wrapped: Address,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapCall<'a> {
    router: &'a Address,
    amount_in: String,
    min_out: String,
    path: &'a [Address],
    recipient: &'a Address,
    deadline: Timestamp,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapReply {
    amount_out: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LiquidityCall<'a> {
    router: &'a Address,
    token: Address,
    token_amount: String,
    native_amount: String,
    min_token: String,
    min_native: String,
    recipient: &'a Address,
    deadline: Timestamp,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiquidityReply {
    token_used: String,
    native_used: String,
    liquidity: String,
}

/// Exchange router reached over JSON/HTTP
pub struct RouterClient {
    http: reqwest::Client,
    base_url: String,
    runtime: Handle,
    pairs: HashMap<(Address, Address), Address>,
}

impl RouterClient {
    /// Build a client for `config.url`. Must be called inside a Tokio runtime.
    pub fn new(config: &VenueConfig) -> Result<Self, VenueError> {
        let runtime = Handle::try_current()
            .map_err(|e| VenueError::Transport(format!("no async runtime: {}", e)))?;
        let http = reqwest::Client::builder()
            .user_agent("fx1-ledger")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VenueError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            runtime,
            pairs: HashMap::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<B, T>(&self, path: &str, body: &B) -> Result<T, VenueError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);

        self.runtime.block_on(async {
            let response = self
                .http
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| VenueError::Transport(format!("{}: {}", url, e)))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(VenueError::Rejected(format!("{} {}", status, text)));
            }

            response
                .json::<T>()
                .await
                .map_err(|e| VenueError::Protocol(format!("{}: {}", path, e)))
        })
    }

    /// Pair address, cached after the first lookup
    fn cached_pair(&mut self, router: &Address, token: &Address) -> Result<Address, VenueError> {
        if let Some(pair) = self.pairs.get(&(*router, *token)) {
            return Ok(*pair);
        }
        let reply: PairReply = self.post("/pair", &PairQuery { router, token })?;
        self.pairs.insert((*router, *token), reply.pair);
        Ok(reply.pair)
    }
}

fn parse_wire_amount(field: &str, raw: &str) -> Result<u128, VenueError> {
    fx1_core::parse_amount(raw)
        .map_err(|e| VenueError::Protocol(format!("{} {:?}: {}", field, raw, e)))
}

impl ExchangeVenue for RouterClient {
    fn pair_for(&mut self, router: &Address, token: &Address) -> Result<Address, VenueError> {
        self.cached_pair(router, token)
    }

    fn wrapped_native(&self, router: &Address) -> Result<Address, VenueError> {
        let reply: WrappedReply = self.post("/wrapped-native", &WrappedQuery { router })?;
        Ok(reply.wrapped)
    }

    fn swap_tokens_for_native(
        &mut self,
        router: &Address,
        port: &mut dyn TokenPort,
        request: &SwapRequest,
    ) -> Result<NativeAmount, VenueError> {
        let token = port.token_address();
        let pair = self.cached_pair(router, &token)?;
        port.transfer_from(router, &token, &pair, request.amount_in)?;

        let reply: SwapReply = self.post(
            "/swap",
            &SwapCall {
                router,
                amount_in: request.amount_in.to_string(),
                min_out: request.min_out.to_string(),
                path: &request.path,
                recipient: &request.recipient,
                deadline: request.deadline,
            },
        )?;
        let amount_out = parse_wire_amount("amountOut", &reply.amount_out)?;
        if amount_out < request.min_out {
            return Err(VenueError::Rejected(format!(
                "swap returned {} below minimum {}",
                amount_out, request.min_out
            )));
        }
        Ok(amount_out)
    }

    fn add_liquidity(
        &mut self,
        router: &Address,
        port: &mut dyn TokenPort,
        request: &LiquidityRequest,
    ) -> Result<LiquidityReceipt, VenueError> {
        let token = port.token_address();
        let pair = self.cached_pair(router, &token)?;

        let reply: LiquidityReply = self.post(
            "/liquidity",
            &LiquidityCall {
                router,
                token,
                token_amount: request.token_amount.to_string(),
                native_amount: request.native_amount.to_string(),
                min_token: request.min_token.to_string(),
                min_native: request.min_native.to_string(),
                recipient: &request.recipient,
                deadline: request.deadline,
            },
        )?;
        let receipt = LiquidityReceipt {
            token_used: parse_wire_amount("tokenUsed", &reply.token_used)?,
            native_used: parse_wire_amount("nativeUsed", &reply.native_used)?,
            liquidity: parse_wire_amount("liquidity", &reply.liquidity)?,
        };
        if receipt.token_used > request.token_amount {
            return Err(VenueError::Protocol(format!(
                "router used {} tokens, offered {}",
                receipt.token_used, request.token_amount
            )));
        }

        if receipt.token_used > 0 {
            port.transfer_from(router, &token, &pair, receipt.token_used)?;
        }
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use fx1_core::Amount;
    use fx1_token::TokenError;
    use serde_json::{json, Value};

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    /// Records router pulls instead of moving balances
    struct RecordingPort {
        pulls: Vec<(Address, Address, Address, Amount)>,
        refuse: bool,
    }

    impl TokenPort for RecordingPort {
        fn token_address(&self) -> Address {
            addr(0xf1)
        }

        fn balance_of(&self, _holder: &Address) -> Amount {
            0
        }

        fn transfer_from(
            &mut self,
            spender: &Address,
            from: &Address,
            to: &Address,
            amount: Amount,
        ) -> Result<(), TokenError> {
            if self.refuse {
                return Err(TokenError::AllowanceExceeded {
                    required: amount,
                    allowed: 0,
                });
            }
            self.pulls.push((*spender, *from, *to, amount));
            Ok(())
        }

        fn transfer(
            &mut self,
            _from: &Address,
            _to: &Address,
            _amount: Amount,
        ) -> Result<(), TokenError> {
            Ok(())
        }
    }

    async fn mock_router() -> String {
        let app = Router::new()
            .route("/pair", post(|| async { Json(json!({ "pair": addr(4) })) }))
            .route(
                "/wrapped-native",
                post(|| async { Json(json!({ "wrapped": addr(5) })) }),
            )
            .route(
                "/swap",
                post(|Json(body): Json<Value>| async move {
                    let amount_in: u128 = body["amountIn"].as_str().unwrap().parse().unwrap();
                    Json(json!({ "amountOut": (amount_in / 1000).to_string() }))
                }),
            )
            .route(
                "/liquidity",
                post(|Json(body): Json<Value>| async move {
                    let offered: u128 = body["tokenAmount"].as_str().unwrap().parse().unwrap();
                    Json(json!({
                        "tokenUsed": (offered / 2).to_string(),
                        "nativeUsed": body["nativeAmount"],
                        "liquidity": "7",
                    }))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let local = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", local)
    }

    fn swap_request(amount_in: Amount) -> SwapRequest {
        SwapRequest {
            amount_in,
            min_out: 0,
            path: vec![addr(0xf1), addr(5)],
            recipient: addr(2),
            deadline: 1_700_000_000,
        }
    }

    #[test]
    fn test_new_requires_runtime() {
        let result = RouterClient::new(&VenueConfig::default());
        assert!(matches!(result, Err(VenueError::Transport(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_router_round_trip() {
        let config = VenueConfig {
            url: mock_router().await,
            timeout_secs: 5,
        };

        tokio::task::spawn_blocking(move || {
            let mut client = RouterClient::new(&config).unwrap();
            assert!(!client.base_url().ends_with('/'));

            let router = addr(3);
            assert_eq!(client.pair_for(&router, &addr(0xf1)).unwrap(), addr(4));
            assert_eq!(client.wrapped_native(&router).unwrap(), addr(5));

            let mut port = RecordingPort {
                pulls: Vec::new(),
                refuse: false,
            };
            let out = client
                .swap_tokens_for_native(&router, &mut port, &swap_request(7_000))
                .unwrap();
            assert_eq!(out, 7);
            assert_eq!(port.pulls, vec![(router, addr(0xf1), addr(4), 7_000)]);

            let receipt = client
                .add_liquidity(
                    &router,
                    &mut port,
                    &LiquidityRequest {
                        token_amount: 1_000,
                        native_amount: 3,
                        min_token: 0,
                        min_native: 0,
                        recipient: addr(1),
                        deadline: 1_700_000_000,
                    },
                )
                .unwrap();
            assert_eq!(receipt.token_used, 500);
            assert_eq!(receipt.native_used, 3);
            assert_eq!(receipt.liquidity, 7);
            assert_eq!(port.pulls[1], (router, addr(0xf1), addr(4), 500));
        })
        .await
        .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_refused_pull_skips_the_swap_call() {
        let config = VenueConfig {
            url: mock_router().await,
            timeout_secs: 5,
        };

        tokio::task::spawn_blocking(move || {
            let mut client = RouterClient::new(&config).unwrap();
            let mut port = RecordingPort {
                pulls: Vec::new(),
                refuse: true,
            };
            let result = client.swap_tokens_for_native(&addr(3), &mut port, &swap_request(10));
            assert!(matches!(result, Err(VenueError::Ledger(_))));
        })
        .await
        .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unreachable_router() {
        let config = VenueConfig {
            url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
        };

        tokio::task::spawn_blocking(move || {
            let client = RouterClient::new(&config).unwrap();
            let result = client.wrapped_native(&addr(3));
            assert!(matches!(result, Err(VenueError::Transport(_))));
        })
        .await
        .unwrap();
    }
}
