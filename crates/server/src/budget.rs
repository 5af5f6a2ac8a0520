//! Budget API endpoints

use api_types::budget::{BudgetSettings, WeeklySummary};
use axum::{Extension, Json, extract::State};
use engine::{BudgetSettingsUpdate, User};

use crate::{ServerError, server::ServerState};

fn settings_view(settings: engine::BudgetSettings) -> BudgetSettings {
    BudgetSettings {
        weekly_budget_minor: settings.weekly_budget_minor,
        budget_warnings: settings.budget_warnings,
        strict_budget: settings.strict_budget,
        transaction_notifications: settings.transaction_notifications,
        weekly_reports: settings.weekly_reports,
    }
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<BudgetSettings>, ServerError> {
    let settings = state.engine.budget_settings(user.id).await?;
    Ok(Json(settings_view(settings)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetSettings>,
) -> Result<Json<BudgetSettings>, ServerError> {
    let settings = state
        .engine
        .update_budget_settings(
            user.id,
            BudgetSettingsUpdate {
                weekly_budget_minor: payload.weekly_budget_minor,
                budget_warnings: payload.budget_warnings,
                strict_budget: payload.strict_budget,
                transaction_notifications: payload.transaction_notifications,
                weekly_reports: payload.weekly_reports,
            },
        )
        .await?;
    Ok(Json(settings_view(settings)))
}

pub async fn summary(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<WeeklySummary>, ServerError> {
    let summary = state.engine.weekly_summary(user.id).await?;
    Ok(Json(WeeklySummary {
        weekly_budget_minor: summary.weekly_budget_minor,
        spent_minor: summary.spent_minor,
        remaining_minor: summary.remaining_minor,
        over_budget: summary.over_budget,
        warning: summary.warning,
    }))
}
