//! API Routes
//!
//! HTTP endpoint definitions.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Account, Amount, LedgerEntry, OpType};
use crate::error::{AppError, AppResult};
use crate::wallet::{WalletError, WalletStore};

/// Shared handle every endpoint works through
pub type SharedWallet = Arc<dyn WalletStore>;

const DEFAULT_PAGE_LIMIT: i64 = 10;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct BalanceChangeRequest {
    pub op_type: String,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_wallet_id: i64,
    pub to_wallet_id: i64,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub id: i64,
    pub balance: Decimal,
}

/// Raw paging parameters, validated by the handler
#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub transactions: Vec<LedgerEntry>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<SharedWallet> {
    Router::new()
        .route("/balance/:id", get(get_balance).put(change_balance))
        .route("/transfer", post(transfer))
        .route("/transaction/:id", get(get_transactions))
}

// =========================================================================
// PUT /balance/:id
// =========================================================================

/// Deposit into or withdraw from one account
async fn change_balance(
    State(wallet): State<SharedWallet>,
    Path(account_id): Path<i64>,
    Json(request): Json<BalanceChangeRequest>,
) -> AppResult<Json<MessageResponse>> {
    let op_type = parse_single_account_op(&request.op_type)?;
    let amount = parse_amount(request.amount)?;

    // A missing account is a plain 404; the balance gates withdrawals
    let account = wallet.get_account(account_id).await?;

    let delta = match op_type {
        OpType::Deposit => amount.credit(),
        OpType::Withdraw => {
            ensure_covered(&account, amount)?;
            amount.debit()
        }
        OpType::Transfer => return Err(WalletError::UnsupportedOperation(op_type).into()),
    };
    wallet.apply_delta(account_id, op_type, delta).await?;

    tracing::info!(
        account_id,
        op_type = %op_type,
        amount = %amount,
        "Balance changed"
    );

    Ok(Json(MessageResponse {
        message: format!("{} successful", op_type),
    }))
}

// =========================================================================
// GET /balance/:id
// =========================================================================

async fn get_balance(
    State(wallet): State<SharedWallet>,
    Path(account_id): Path<i64>,
) -> AppResult<Json<BalanceResponse>> {
    let account = wallet.get_account(account_id).await?;

    Ok(Json(BalanceResponse {
        id: account.id,
        balance: account.balance,
    }))
}

// =========================================================================
// POST /transfer
// =========================================================================

/// Move funds between two accounts
async fn transfer(
    State(wallet): State<SharedWallet>,
    Json(request): Json<TransferRequest>,
) -> AppResult<Json<MessageResponse>> {
    let amount = parse_amount(request.amount)?;

    if request.from_wallet_id <= 0
        || request.to_wallet_id <= 0
        || request.from_wallet_id == request.to_wallet_id
    {
        return Err(AppError::invalid_request("invalid wallet id"));
    }

    let sender = wallet.get_account(request.from_wallet_id).await?;
    ensure_covered(&sender, amount)?;

    wallet
        .transfer(request.from_wallet_id, request.to_wallet_id, amount)
        .await?;

    tracing::info!(
        from_id = request.from_wallet_id,
        to_id = request.to_wallet_id,
        amount = %amount,
        "Transfer completed"
    );

    Ok(Json(MessageResponse {
        message: "transfer successful".to_string(),
    }))
}

// =========================================================================
// GET /transaction/:id
// =========================================================================

/// One page of an account's ledger, newest first
async fn get_transactions(
    State(wallet): State<SharedWallet>,
    Path(account_id): Path<i64>,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<LedgerResponse>> {
    let (limit, offset) = parse_page(&query)?;

    wallet.get_account(account_id).await?;
    let transactions = wallet.get_ledger(account_id, limit, offset).await?;

    Ok(Json(LedgerResponse { transactions }))
}

// =========================================================================
// Validation helpers
// =========================================================================

fn parse_single_account_op(raw: &str) -> AppResult<OpType> {
    match raw.parse::<OpType>() {
        Ok(op) if op.is_single_account() => Ok(op),
        _ => Err(AppError::invalid_request("invalid operation type")),
    }
}

/// Reject a debit the account's current balance does not cover. The core
/// repeats the check under the row lock unless funds enforcement is off.
fn ensure_covered(account: &Account, amount: Amount) -> AppResult<()> {
    if amount.is_covered_by(account.balance) {
        Ok(())
    } else {
        Err(WalletError::insufficient_funds(account.id, amount.value(), account.balance).into())
    }
}

fn parse_amount(value: Decimal) -> AppResult<Amount> {
    Amount::new(value).map_err(|e| AppError::invalid_request(e.to_string()))
}

fn parse_page(query: &LedgerQuery) -> AppResult<(i64, i64)> {
    let limit = match query.limit.as_deref() {
        None => DEFAULT_PAGE_LIMIT,
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|limit| *limit > 0)
            .ok_or_else(|| AppError::invalid_request("invalid limit"))?,
    };

    let offset = match query.offset.as_deref() {
        None => 0,
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|offset| *offset >= 0)
            .ok_or_else(|| AppError::invalid_request("invalid offset"))?,
    };

    Ok((limit, offset))
}
