//! Transactions API endpoints

use api_types::transaction::{
    PurchaseNew, TransactionKind as ApiKind, TransactionList, TransactionListResponse,
    TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use engine::User;

use crate::{ServerError, server::ServerState};

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Purchase => ApiKind::Purchase,
        engine::TransactionKind::FairyDonation => ApiKind::FairyDonation,
    }
}

fn transaction_view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: map_kind(tx.kind),
        amount_minor: tx.amount_minor,
        location: tx.location,
        description: tx.description,
        occurred_at: tx.occurred_at,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let page = state
        .engine
        .list_transactions(user.id, query.limit, query.offset.unwrap_or(0))
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: page.transactions.into_iter().map(transaction_view).collect(),
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    }))
}

pub async fn purchase_new(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<PurchaseNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let tx = state
        .engine
        .record_purchase(
            user.id,
            payload.amount_minor,
            &payload.location,
            payload.description.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(transaction_view(tx))))
}
