use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::info;
use validator::Validate;

use crate::agent::{format, Outcome};
use crate::intent::{IntentKind, RecipientRef};
use crate::middleware::RequireSession;
use crate::models::{
    AddressResponse, AppState, BalanceResponse, TransactionsResponse, TransferRequest, TransferResponse,
};
use crate::payment::{ExecutionResult, Failure};
use crate::types::AppResult;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/wallet/address", get(get_address))
        .route("/api/wallet/balance", get(get_balance))
        .route("/api/wallet/transactions", get(get_transactions))
}

/// Form-based transfers; rate limited together with chat
pub fn transfer_router() -> Router<AppState> {
    Router::new().route("/api/wallet/transfer", post(post_transfer))
}

async fn get_address(RequireSession(session): RequireSession) -> Json<AddressResponse> {
    Json(AddressResponse {
        wallet_id: session.account.wallet_id,
        address: session.account.address,
    })
}

async fn get_balance(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> AppResult<Json<BalanceResponse>> {
    let balance = state.services.balances.balance(&session.account.wallet_id).await?;
    Ok(Json(BalanceResponse {
        balance,
        token: state.config.circle.token_symbol.clone(),
    }))
}

async fn get_transactions(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> AppResult<Json<TransactionsResponse>> {
    let transactions = state.services.history.transactions(&session.account.wallet_id).await?;
    Ok(Json(TransactionsResponse { transactions }))
}

fn failure_status(failure: &Failure) -> StatusCode {
    match failure {
        Failure::NotAuthenticated => StatusCode::UNAUTHORIZED,
        Failure::InvalidAmount(_) | Failure::InvalidRecipient { .. } => StatusCode::BAD_REQUEST,
        Failure::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
        Failure::UpstreamError { .. } => StatusCode::BAD_GATEWAY,
    }
}

/// Same recipient resolution and executor as a chat payment, fields given explicitly
async fn post_transfer(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Json(request): Json<TransferRequest>,
) -> AppResult<(StatusCode, Json<TransferResponse>)> {
    request.validate()?;

    let recipient = RecipientRef::parse(&request.recipient);
    info!(username = %session.username, recipient = %recipient, amount = %request.amount, "Form transfer");

    let result = state
        .agent
        .pay(&session, &recipient, &request.amount, request.memo)
        .await;

    let status = match &result {
        ExecutionResult::Success { .. } => StatusCode::OK,
        ExecutionResult::Failure(failure) => failure_status(failure),
    };
    let reference = result.reference().map(str::to_string);
    let outcome = Outcome::Executed(result);

    Ok((
        status,
        Json(TransferResponse {
            status: outcome.status(),
            message: format(IntentKind::SendPayment, &outcome),
            reference,
            failure: outcome.failure().cloned(),
        }),
    ))
}
