//! Token endpoints: reads, transfers, approvals

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use fx1_token::{AddressFlags, Environment};

use super::{parse_address, parse_amount, service_error, ErrorResponse};
use crate::dto::{
    AllowanceResponse, ApproveRequest, BalanceResponse, PolicyResponse, TokenInfoResponse,
    TransferFromRequest, TransferRequest, TransferResponse,
};
use crate::AppState;

/// Create token routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_info))
        .route("/policy", get(get_policy))
        .route("/balance/:address", get(get_balance))
        .route("/allowance/:owner/:spender", get(get_allowance))
        .route("/flags/:address", get(get_flags))
        .route("/transfer", post(transfer))
        .route("/transfer-from", post(transfer_from))
        .route("/approve", post(approve))
}

/// GET /token - Metadata and live state
pub async fn get_info(State(state): State<AppState>) -> Json<TokenInfoResponse> {
    let info = state
        .read(|token| {
            let policy = token.policy();
            TokenInfoResponse {
                name: token.name().to_string(),
                symbol: token.symbol().to_string(),
                decimals: token.decimals(),
                total_supply: token.total_supply().to_string(),
                token_address: token.token_address(),
                owner: policy.owner,
                pair: policy.pair,
                router: policy.router,
                treasury: policy.treasury,
                accrued_fees: token.accrued_fees().to_string(),
                native_balance: token.native_balance().to_string(),
                launched: policy.launch.launched,
                launch_timestamp: policy.launch.launch_timestamp,
                whitelist_period: policy.launch.whitelist_period,
                in_whitelist_window: policy.launch.in_whitelist_window(token.env().now()),
                distributing: token.is_distributing(),
            }
        })
        .await;
    Json(info)
}

/// GET /token/policy - Current policy snapshot
pub async fn get_policy(State(state): State<AppState>) -> Json<PolicyResponse> {
    Json(state.read(|token| PolicyResponse::from(token.policy())).await)
}

/// GET /token/balance/:address
pub async fn get_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, ErrorResponse> {
    let address = parse_address("address", &address)?;
    let balance = state.read(|token| token.balance_of(&address)).await;
    Ok(Json(BalanceResponse {
        address,
        balance: balance.to_string(),
    }))
}

/// GET /token/allowance/:owner/:spender
pub async fn get_allowance(
    State(state): State<AppState>,
    Path((owner, spender)): Path<(String, String)>,
) -> Result<Json<AllowanceResponse>, ErrorResponse> {
    let owner = parse_address("owner", &owner)?;
    let spender = parse_address("spender", &spender)?;
    let allowance = state.read(|token| token.allowance(&owner, &spender)).await;
    Ok(Json(AllowanceResponse {
        owner,
        spender,
        allowance: allowance.to_string(),
    }))
}

/// GET /token/flags/:address
pub async fn get_flags(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<AddressFlags>, ErrorResponse> {
    let address = parse_address("address", &address)?;
    Ok(Json(state.read(|token| token.flags(&address)).await))
}

/// POST /token/transfer
pub async fn transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, ErrorResponse> {
    let amount = parse_amount("amount", &request.amount)?;
    let receipt = state
        .mutate("transfer", move |token| {
            token.transfer(request.from, request.to, amount)
        })
        .await
        .map_err(service_error)?;
    Ok(Json(receipt.into()))
}

/// POST /token/transfer-from
pub async fn transfer_from(
    State(state): State<AppState>,
    Json(request): Json<TransferFromRequest>,
) -> Result<Json<TransferResponse>, ErrorResponse> {
    let amount = parse_amount("amount", &request.amount)?;
    let receipt = state
        .mutate("transfer_from", move |token| {
            token.transfer_from(request.spender, request.from, request.to, amount)
        })
        .await
        .map_err(service_error)?;
    Ok(Json(receipt.into()))
}

/// POST /token/approve
pub async fn approve(
    State(state): State<AppState>,
    Json(request): Json<ApproveRequest>,
) -> Result<Json<AllowanceResponse>, ErrorResponse> {
    let amount = parse_amount("amount", &request.amount)?;
    let (owner, spender) = (request.owner, request.spender);
    state
        .mutate("approve", move |token| token.approve(owner, spender, amount))
        .await
        .map_err(service_error)?;
    Ok(Json(AllowanceResponse {
        owner,
        spender,
        allowance: amount.to_string(),
    }))
}
