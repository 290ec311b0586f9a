//! Data Transfer Objects for API requests and responses
//!
//! Token and coin amounts cross the API as decimal strings; they routinely
//! exceed the range a JSON number can carry exactly.

use fx1_core::{Address, Amount, Timestamp};
use fx1_token::{
    AddressFlag, BindingKind, CapKind, Direction, DistributionOutcome, FeeKind, LiquidityRecipient,
    PolicyConfig, TransferReceipt,
};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Version of the live policy snapshot
    pub policy_version: u64,
    pub launched: bool,
    pub distributing: bool,
}

impl HealthResponse {
    pub fn ok(policy_version: u64, launched: bool, distributing: bool) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            policy_version,
            launched,
            distributing,
        }
    }
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}

// =============================================================================
// Token reads
// =============================================================================

/// Token metadata and live state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfoResponse {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
    pub token_address: Address,
    pub owner: Address,
    pub pair: Address,
    pub router: Address,
    pub treasury: Address,
    /// Fee tokens held by the contract, awaiting distribution
    pub accrued_fees: String,
    pub native_balance: String,
    pub launched: bool,
    pub launch_timestamp: Timestamp,
    pub whitelist_period: Timestamp,
    pub in_whitelist_window: bool,
    pub distributing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeScheduleDto {
    pub marketing_rate: u32,
    pub liquidity_rate: u32,
    pub total_rate: u32,
}

/// Current policy snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyResponse {
    pub version: u64,
    pub owner: Address,
    pub buy_fee: FeeScheduleDto,
    pub sell_fee: FeeScheduleDto,
    pub max_wallet_amount: String,
    pub max_transfer_amount: String,
    pub swap_threshold: String,
    pub treasury: Address,
    pub pair: Address,
    pub router: Address,
    pub liquidity_recipient: LiquidityRecipient,
    pub launched: bool,
    pub launch_timestamp: Timestamp,
    pub whitelist_period: Timestamp,
}

impl From<&PolicyConfig> for PolicyResponse {
    fn from(config: &PolicyConfig) -> Self {
        let fee = |kind| {
            let schedule = config.fee_schedule(kind);
            FeeScheduleDto {
                marketing_rate: schedule.marketing_rate,
                liquidity_rate: schedule.liquidity_rate,
                total_rate: schedule.total(),
            }
        };
        Self {
            version: config.version,
            owner: config.owner,
            buy_fee: fee(FeeKind::Buy),
            sell_fee: fee(FeeKind::Sell),
            max_wallet_amount: config.max_wallet_amount.to_string(),
            max_transfer_amount: config.max_transfer_amount.to_string(),
            swap_threshold: config.swap_threshold.to_string(),
            treasury: config.treasury,
            pair: config.pair,
            router: config.router,
            liquidity_recipient: config.liquidity_recipient,
            launched: config.launch.launched,
            launch_timestamp: config.launch.launch_timestamp,
            whitelist_period: config.launch.whitelist_period,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub address: Address,
    pub balance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceResponse {
    pub owner: Address,
    pub spender: Address,
    pub allowance: String,
}

// =============================================================================
// Token writes
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from: Address,
    pub to: Address,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFromRequest {
    pub spender: Address,
    pub from: Address,
    pub to: Address,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub owner: Address,
    pub spender: Address,
    pub amount: String,
}

/// Outcome of a distribution triggered by a transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionDto {
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub marketing: String,
    pub liquidity_swap: String,
    pub liquidity_pair: String,
    pub native_to_treasury: String,
    pub native_to_pool: String,
    pub liquidity_minted: String,
}

impl From<&DistributionOutcome> for DistributionDto {
    fn from(outcome: &DistributionOutcome) -> Self {
        match outcome {
            DistributionOutcome::Completed(report) => Self {
                completed: true,
                reason: None,
                marketing: report.split.marketing.to_string(),
                liquidity_swap: report.split.liquidity_swap.to_string(),
                liquidity_pair: report.split.liquidity_pair.to_string(),
                native_to_treasury: report.native_to_treasury.to_string(),
                native_to_pool: report.native_to_pool.to_string(),
                liquidity_minted: report.liquidity_minted.to_string(),
            },
            DistributionOutcome::Failed { reason } => Self {
                completed: false,
                reason: Some(reason.clone()),
                marketing: "0".to_string(),
                liquidity_swap: "0".to_string(),
                liquidity_pair: "0".to_string(),
                native_to_treasury: "0".to_string(),
                native_to_pool: "0".to_string(),
                liquidity_minted: "0".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub direction: Direction,
    pub amount: String,
    pub fee: String,
    pub credited: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<DistributionDto>,
}

impl From<TransferReceipt> for TransferResponse {
    fn from(receipt: TransferReceipt) -> Self {
        Self {
            direction: receipt.direction,
            amount: receipt.amount.to_string(),
            fee: receipt.fee.to_string(),
            credited: receipt.credited.to_string(),
            distribution: receipt.distribution.as_ref().map(DistributionDto::from),
        }
    }
}

// =============================================================================
// Administrator operations
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeScheduleRequest {
    pub caller: Address,
    pub kind: FeeKind,
    pub marketing_rate: u32,
    pub liquidity_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapRequest {
    pub caller: Address,
    pub kind: CapKind,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagsRequest {
    pub caller: Address,
    pub addresses: Vec<Address>,
    pub flag: AddressFlag,
    pub value: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotRequest {
    pub caller: Address,
    pub address: Address,
    pub bot: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub caller: Address,
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingRequest {
    pub caller: Address,
    pub kind: BindingKind,
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerRequest {
    pub caller: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRequest {
    pub caller: Address,
    pub period: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountRequest {
    pub caller: Address,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityRecipientRequest {
    pub caller: Address,
    pub recipient: LiquidityRecipient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSendRequest {
    pub caller: Address,
    pub recipients: Vec<Address>,
    pub amounts: Vec<String>,
}

/// Acknowledgement of an administrator operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminResponse {
    pub ok: bool,
    /// Policy version after the change
    pub policy_version: u64,
}

/// Parse a decimal amount field, naming the field in the error
pub fn parse_amount_field(field: &str, value: &str) -> Result<Amount, ApiError> {
    fx1_core::parse_amount(value)
        .map_err(|e| ApiError::bad_request(format!("Invalid {}: {} ({})", field, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fx1_token::{DistributionReport, ProceedsSplit};

    #[test]
    fn test_parse_amount_field() {
        assert_eq!(
            parse_amount_field("amount", "300000000000000000000000000").unwrap(),
            300_000_000u128 * 10u128.pow(18)
        );
        let err = parse_amount_field("amount", "12abc").unwrap_err();
        assert_eq!(err.code, "bad_request");
        assert!(err.message.contains("amount"));
    }

    #[test]
    fn test_transfer_response_uses_strings() {
        let receipt = TransferReceipt {
            direction: Direction::Sell,
            amount: 100,
            fee: 5,
            credited: 95,
            distribution: Some(DistributionOutcome::Completed(DistributionReport {
                split: ProceedsSplit {
                    marketing: 700,
                    liquidity_swap: 150,
                    liquidity_pair: 150,
                },
                ..DistributionReport::default()
            })),
        };
        let json = serde_json::to_value(TransferResponse::from(receipt)).unwrap();
        assert_eq!(json["direction"], "sell");
        assert_eq!(json["fee"], "5");
        assert_eq!(json["distribution"]["completed"], true);
        assert_eq!(json["distribution"]["marketing"], "700");
        assert!(json["distribution"].get("reason").is_none());
    }

    #[test]
    fn test_request_parses_addresses() {
        let raw = r#"{"from":"0x0000000000000000000000000000000000000001","to":"0x00000000000000000000000000000000000003e9","amount":"10"}"#;
        let request: TransferRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.from, Address::from_low_u64(1));
        assert_eq!(request.to, Address::from_low_u64(1001));
    }

    #[test]
    fn test_health_serializes_camel_case() {
        let json = serde_json::to_value(HealthResponse::ok(3, true, false)).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["policyVersion"], 3);
        assert_eq!(json["launched"], true);
    }
}
