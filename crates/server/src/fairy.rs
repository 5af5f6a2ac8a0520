//! Flexi Fairy API endpoints: the directory, the request lifecycle and the
//! leaderboard.

use api_types::fairy::{
    ActiveFairiesQuery, ActiveFairiesResponse, FairyProfileView, FairySort as ApiSort, FairyStats,
    FairyStatusView, FairyToggle, LeaderboardEntry, LeaderboardQuery, LeaderboardResponse,
    RequestAction, RequestListResponse, RequestNew, RequestRate, RequestStatus, RequestView,
    Timeframe as ApiTimeframe,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use engine::{FairyRequest, FairyRequestStatus, FairySort, Timeframe, User};

use crate::{ServerError, server::ServerState};

fn stats_view(stats: engine::FairyStats) -> FairyStats {
    FairyStats {
        total_helped_minor: stats.total_helped_minor,
        total_requests_fulfilled: stats.total_requests_fulfilled,
        rating_average: stats.rating_average,
        rating_count: stats.rating_count,
    }
}

fn status_view(status: engine::FairyStatus) -> FairyStatusView {
    FairyStatusView {
        is_active: status.is_active,
        max_transaction_minor: status.max_transaction_minor,
        stats: stats_view(status.stats),
    }
}

fn map_status(status: FairyRequestStatus) -> RequestStatus {
    match status {
        FairyRequestStatus::Pending => RequestStatus::Pending,
        FairyRequestStatus::Accepted => RequestStatus::Accepted,
        FairyRequestStatus::Completed => RequestStatus::Completed,
        FairyRequestStatus::Cancelled => RequestStatus::Cancelled,
    }
}

fn map_sort(sort: ApiSort) -> FairySort {
    match sort {
        ApiSort::Rating => FairySort::Rating,
        ApiSort::Amount => FairySort::Amount,
        ApiSort::Count => FairySort::Count,
    }
}

fn map_timeframe(timeframe: ApiTimeframe) -> Timeframe {
    match timeframe {
        ApiTimeframe::All => Timeframe::All,
        ApiTimeframe::Week => Timeframe::Week,
        ApiTimeframe::Month => Timeframe::Month,
        ApiTimeframe::Semester => Timeframe::Semester,
    }
}

fn request_view(request: FairyRequest) -> RequestView {
    RequestView {
        id: request.id,
        requestor_id: request.requestor_id,
        fairy_id: request.fairy_id,
        location: request.location.as_str().to_string(),
        amount_minor: request.amount_minor,
        description: request.description,
        status: map_status(request.status),
        requestor_confirmed: request.requestor_confirmed,
        fairy_confirmed: request.fairy_confirmed,
        rating: request.rating,
        rating_comment: request.rating_comment,
        created_at: request.created_at,
        accepted_at: request.accepted_at,
        completed_at: request.completed_at,
    }
}

fn request_list(requests: Vec<FairyRequest>) -> Json<RequestListResponse> {
    Json(RequestListResponse {
        requests: requests.into_iter().map(request_view).collect(),
    })
}

pub async fn toggle(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<FairyToggle>,
) -> Result<Json<FairyStatusView>, ServerError> {
    let status = state
        .engine
        .set_fairy_status(user.id, payload.is_active, payload.max_transaction_minor)
        .await?;
    Ok(Json(status_view(status)))
}

pub async fn status(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<FairyStatusView>, ServerError> {
    let status = state.engine.fairy_status(user.id).await?;
    Ok(Json(status_view(status)))
}

pub async fn active(
    Extension(_user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<ActiveFairiesQuery>,
) -> Result<Json<ActiveFairiesResponse>, ServerError> {
    let active = state
        .engine
        .list_active_fairies(
            query.limit,
            query.offset.unwrap_or(0),
            map_sort(query.sort_by.unwrap_or_default()),
        )
        .await?;
    Ok(Json(ActiveFairiesResponse {
        fairies: active
            .fairies
            .into_iter()
            .map(|fairy| FairyProfileView {
                user_id: fairy.user_id,
                name: fairy.name,
                max_transaction_minor: fairy.max_transaction_minor,
                stats: stats_view(fairy.stats),
            })
            .collect(),
        total: active.total,
    }))
}

pub async fn request_new(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<RequestNew>,
) -> Result<(StatusCode, Json<RequestView>), ServerError> {
    let request = state
        .engine
        .create_request(
            user.id,
            &payload.location,
            payload.amount_minor,
            payload.description.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(request_view(request))))
}

pub async fn my_requests(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<RequestListResponse>, ServerError> {
    Ok(request_list(state.engine.list_my_requests(user.id).await?))
}

/// Pending requests the caller could take, filtered by their own ceiling.
pub async fn pending_requests(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<RequestListResponse>, ServerError> {
    let status = state.engine.fairy_status(user.id).await?;
    let requests = state
        .engine
        .list_pending_requests(user.id, status.max_transaction_minor)
        .await?;
    Ok(request_list(requests))
}

pub async fn accepted_requests(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<RequestListResponse>, ServerError> {
    Ok(request_list(
        state.engine.list_accepted_by_fairy(user.id).await?,
    ))
}

pub async fn accept(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<RequestAction>,
) -> Result<Json<RequestView>, ServerError> {
    let request = state
        .engine
        .accept_request(payload.request_id, user.id)
        .await?;
    Ok(Json(request_view(request)))
}

pub async fn cancel(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<RequestAction>,
) -> Result<Json<RequestView>, ServerError> {
    let request = state
        .engine
        .cancel_request(payload.request_id, user.id)
        .await?;
    Ok(Json(request_view(request)))
}

/// The fairy's confirmation.
pub async fn confirm(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<RequestAction>,
) -> Result<Json<RequestView>, ServerError> {
    let request = state
        .engine
        .confirm_as_fairy(payload.request_id, user.id)
        .await?;
    Ok(Json(request_view(request)))
}

/// The requestor's confirmation, carrying the rating.
pub async fn rate(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<RequestRate>,
) -> Result<Json<RequestView>, ServerError> {
    let request = state
        .engine
        .confirm_and_rate_as_requestor(
            payload.request_id,
            user.id,
            payload.rating,
            payload.comment.as_deref(),
        )
        .await?;
    Ok(Json(request_view(request)))
}

pub async fn leaderboard(
    Extension(_user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ServerError> {
    let timeframe = query.timeframe.unwrap_or_default();
    let entries = state.engine.leaderboard(map_timeframe(timeframe)).await?;
    Ok(Json(LeaderboardResponse {
        timeframe,
        entries: entries
            .into_iter()
            .map(|entry| LeaderboardEntry {
                fairy_id: entry.fairy_id,
                name: entry.name,
                requests_fulfilled: entry.requests_fulfilled,
                amount_helped_minor: entry.amount_helped_minor,
                rating: entry.rating,
            })
            .collect(),
    }))
}
