//! Administrator endpoints
//!
//! The caller address travels in the request body; the ledger rejects any
//! caller other than the current owner.

use axum::{extract::State, routing::post, Json, Router};
use fx1_core::FeeSchedule;
use fx1_token::Result as TokenResult;

use super::{parse_amount, service_error, ErrorResponse};
use crate::dto::{
    AddressRequest, AdminResponse, AmountRequest, BindingRequest, BotRequest, CallerRequest,
    CapRequest, FeeScheduleRequest, FlagsRequest, LiquidityRecipientRequest, MultiSendRequest,
    PeriodRequest,
};
use crate::state::ServiceToken;
use crate::AppState;

/// Create administrator routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/fees", post(set_fee_schedule))
        .route("/caps", post(set_cap))
        .route("/flags", post(set_flags))
        .route("/bot", post(set_bot))
        .route("/treasury", post(set_treasury))
        .route("/binding", post(set_exchange_binding))
        .route("/launch", post(begin_launch))
        .route("/whitelist-period", post(set_whitelist_period))
        .route("/swap-threshold", post(set_swap_threshold))
        .route("/liquidity-recipient", post(set_liquidity_recipient))
        .route("/ownership", post(transfer_ownership))
        .route("/multi-send", post(multi_send))
}

/// Run an administrator operation and report the resulting policy version
async fn run_admin<F>(
    state: &AppState,
    operation: &'static str,
    change: F,
) -> Result<Json<AdminResponse>, ErrorResponse>
where
    F: FnOnce(&mut ServiceToken) -> TokenResult<()> + Send + 'static,
{
    let policy_version = state
        .mutate(operation, move |token| {
            change(token)?;
            Ok(token.policy().version)
        })
        .await
        .map_err(service_error)?;
    Ok(Json(AdminResponse {
        ok: true,
        policy_version,
    }))
}

/// POST /admin/fees - Replace the buy or sell schedule
pub async fn set_fee_schedule(
    State(state): State<AppState>,
    Json(request): Json<FeeScheduleRequest>,
) -> Result<Json<AdminResponse>, ErrorResponse> {
    let schedule = FeeSchedule::new(request.marketing_rate, request.liquidity_rate);
    run_admin(&state, "set_fee_schedule", move |token| {
        token.set_fee_schedule(request.caller, request.kind, schedule)
    })
    .await
}

/// POST /admin/caps - Replace the wallet or transfer cap
pub async fn set_cap(
    State(state): State<AppState>,
    Json(request): Json<CapRequest>,
) -> Result<Json<AdminResponse>, ErrorResponse> {
    let amount = parse_amount("amount", &request.amount)?;
    run_admin(&state, "set_cap", move |token| {
        token.set_cap(request.caller, request.kind, amount)
    })
    .await
}

/// POST /admin/flags - Set one flag on a list of addresses
pub async fn set_flags(
    State(state): State<AppState>,
    Json(request): Json<FlagsRequest>,
) -> Result<Json<AdminResponse>, ErrorResponse> {
    run_admin(&state, "set_flags", move |token| {
        token.set_flags(request.caller, &request.addresses, request.flag, request.value)
    })
    .await
}

/// POST /admin/bot - Flag or clear a single bot
pub async fn set_bot(
    State(state): State<AppState>,
    Json(request): Json<BotRequest>,
) -> Result<Json<AdminResponse>, ErrorResponse> {
    run_admin(&state, "set_bot", move |token| {
        if request.bot {
            token.set_bot(request.caller, request.address)
        } else {
            token.clear_bot(request.caller, request.address)
        }
    })
    .await
}

/// POST /admin/treasury
pub async fn set_treasury(
    State(state): State<AppState>,
    Json(request): Json<AddressRequest>,
) -> Result<Json<AdminResponse>, ErrorResponse> {
    run_admin(&state, "set_treasury", move |token| {
        token.set_treasury(request.caller, request.address)
    })
    .await
}

/// POST /admin/binding - Rebind the pair or router
pub async fn set_exchange_binding(
    State(state): State<AppState>,
    Json(request): Json<BindingRequest>,
) -> Result<Json<AdminResponse>, ErrorResponse> {
    run_admin(&state, "set_exchange_binding", move |token| {
        token.set_exchange_binding(request.caller, request.kind, request.address)
    })
    .await
}

/// POST /admin/launch - Open trading
pub async fn begin_launch(
    State(state): State<AppState>,
    Json(request): Json<CallerRequest>,
) -> Result<Json<AdminResponse>, ErrorResponse> {
    run_admin(&state, "begin_launch", move |token| token.begin_launch(request.caller)).await
}

/// POST /admin/whitelist-period
pub async fn set_whitelist_period(
    State(state): State<AppState>,
    Json(request): Json<PeriodRequest>,
) -> Result<Json<AdminResponse>, ErrorResponse> {
    run_admin(&state, "set_whitelist_period", move |token| {
        token.set_whitelist_period(request.caller, request.period)
    })
    .await
}

/// POST /admin/swap-threshold
pub async fn set_swap_threshold(
    State(state): State<AppState>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AdminResponse>, ErrorResponse> {
    let amount = parse_amount("amount", &request.amount)?;
    run_admin(&state, "set_swap_threshold", move |token| {
        token.set_swap_threshold(request.caller, amount)
    })
    .await
}

/// POST /admin/liquidity-recipient
pub async fn set_liquidity_recipient(
    State(state): State<AppState>,
    Json(request): Json<LiquidityRecipientRequest>,
) -> Result<Json<AdminResponse>, ErrorResponse> {
    run_admin(&state, "set_liquidity_recipient", move |token| {
        token.set_liquidity_recipient(request.caller, request.recipient)
    })
    .await
}

/// POST /admin/ownership - Hand over the administrator role
pub async fn transfer_ownership(
    State(state): State<AppState>,
    Json(request): Json<AddressRequest>,
) -> Result<Json<AdminResponse>, ErrorResponse> {
    run_admin(&state, "transfer_ownership", move |token| {
        token.transfer_ownership(request.caller, request.address)
    })
    .await
}

/// POST /admin/multi-send - Batch transfer from the administrator
pub async fn multi_send(
    State(state): State<AppState>,
    Json(request): Json<MultiSendRequest>,
) -> Result<Json<AdminResponse>, ErrorResponse> {
    let amounts = request
        .amounts
        .iter()
        .enumerate()
        .map(|(i, raw)| parse_amount(&format!("amounts[{}]", i), raw))
        .collect::<Result<Vec<_>, _>>()?;
    run_admin(&state, "multi_send", move |token| {
        token.multi_send(request.caller, &request.recipients, &amounts)
    })
    .await
}
