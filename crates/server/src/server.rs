use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{budget, fairy, transactions, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolves HTTP Basic credentials (`student_id:password`) to a user and
/// stores it in the request extensions.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user = state
        .engine
        .authenticate(auth_header.username(), auth_header.password())
        .await
        .map_err(|err| {
            tracing::error!("authentication lookup failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/api/users/me", get(user::me))
        .route("/api/users/me/balance", get(user::balance))
        .route("/api/transactions", get(transactions::list))
        .route("/api/transactions/new", post(transactions::purchase_new))
        .route("/api/budget", get(budget::get))
        .route("/api/budget/update", post(budget::update))
        .route("/api/budget/summary", get(budget::summary))
        .route("/api/fairy/toggle", post(fairy::toggle))
        .route("/api/fairy/status", get(fairy::status))
        .route("/api/fairy/active", get(fairy::active))
        .route("/api/fairy/request", post(fairy::request_new))
        .route("/api/fairy/requests", get(fairy::my_requests))
        .route("/api/fairy/requests/pending", get(fairy::pending_requests))
        .route("/api/fairy/requests/accepted", get(fairy::accepted_requests))
        .route("/api/fairy/request/accept", post(fairy::accept))
        .route("/api/fairy/request/cancel", post(fairy::cancel))
        .route("/api/fairy/request/confirm", post(fairy::confirm))
        .route("/api/fairy/request/rate", post(fairy::rate))
        .route("/api/fairy/leaderboard", get(fairy::leaderboard))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/api/register", post(user::register))
        .merge(protected)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }
    tracing::info!("shutting down");
}

/// Serves until Ctrl-C, then closes the engine's database pool.
pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let engine = Arc::new(engine);
    let state = ServerState {
        engine: Arc::clone(&engine),
    };

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(engine) = Arc::into_inner(engine)
        && let Err(err) = engine.close().await
    {
        tracing::error!("failed to close database: {err}");
    }
    Ok(())
}
