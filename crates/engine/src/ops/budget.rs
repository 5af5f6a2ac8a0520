use chrono::Utc;
use sea_orm::prelude::*;
use uuid::Uuid;

use crate::{
    BudgetSettings, BudgetSettingsUpdate, EngineError, ResultEngine, WeeklySummary,
    budget_settings, util::ensure_positive_amount,
};

use super::{
    Engine,
    ledger::{spent_since, week_start},
    with_tx,
};

/// Share of the weekly budget (in percent) that triggers a warning.
const WARNING_THRESHOLD_PERCENT: i64 = 80;

impl Engine {
    pub async fn budget_settings(&self, user_id: Uuid) -> ResultEngine<BudgetSettings> {
        budget_settings::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(BudgetSettings::from)
            .ok_or_else(|| EngineError::KeyNotFound("budget settings not exists".to_string()))
    }

    /// Replaces the editable budget settings of `user_id`.
    pub async fn update_budget_settings(
        &self,
        user_id: Uuid,
        update: BudgetSettingsUpdate,
    ) -> ResultEngine<BudgetSettings> {
        ensure_positive_amount(update.weekly_budget_minor, "weekly budget")?;
        let now = Utc::now();

        let settings = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let exists = budget_settings::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .is_some();
            let settings = BudgetSettings {
                user_id,
                weekly_budget_minor: update.weekly_budget_minor,
                budget_warnings: update.budget_warnings,
                strict_budget: update.strict_budget,
                transaction_notifications: update.transaction_notifications,
                weekly_reports: update.weekly_reports,
                updated_at: now,
            };
            let active = budget_settings::ActiveModel::from(&settings);
            let model = if exists {
                active.update(&db_tx).await?
            } else {
                active.insert(&db_tx).await?
            };
            Ok(BudgetSettings::from(model))
        })?;

        tracing::info!(user_id = %user_id, strict = settings.strict_budget, "budget settings updated");
        Ok(settings)
    }

    /// Compares spending over the rolling last seven days with the weekly budget.
    pub async fn weekly_summary(&self, user_id: Uuid) -> ResultEngine<WeeklySummary> {
        let settings = self.budget_settings(user_id).await?;
        let spent_minor = spent_since(&self.database, user_id, week_start(Utc::now())).await?;
        Ok(summarize(&settings, spent_minor))
    }
}

fn summarize(settings: &BudgetSettings, spent_minor: i64) -> WeeklySummary {
    let budget = settings.weekly_budget_minor;
    WeeklySummary {
        weekly_budget_minor: budget,
        spent_minor,
        remaining_minor: budget - spent_minor,
        over_budget: spent_minor > budget,
        warning: settings.budget_warnings
            && spent_minor * 100 >= budget * WARNING_THRESHOLD_PERCENT,
    }
}
