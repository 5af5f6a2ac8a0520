//! Registration and the caller's own profile.

use api_types::user::{BalanceView, Register, UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{NewUser, User};

use crate::{ServerError, server::ServerState};

pub(crate) fn user_view(user: User) -> UserView {
    UserView {
        id: user.id,
        student_id: user.student_id,
        name: user.name,
        email: user.email,
        created_at: user.created_at,
    }
}

/// Creates an account with the default starting balance.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Register>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let user = state
        .engine
        .register_user(NewUser {
            student_id: payload.student_id,
            name: payload.name,
            email: payload.email,
            password_hash: payload.password,
            starting_balance_minor: None,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user_view(user))))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserView> {
    Json(user_view(user))
}

pub async fn balance(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<BalanceView>, ServerError> {
    let balance = state.engine.balance(user.id).await?;
    Ok(Json(BalanceView {
        starting_balance_minor: balance.starting_balance_minor,
        current_balance_minor: balance.current_balance_minor,
        spent_minor: balance.spent_minor(),
    }))
}
