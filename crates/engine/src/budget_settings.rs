//! Weekly budget preferences.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Weekly budget granted on registration (100.00).
pub const DEFAULT_WEEKLY_BUDGET_MINOR: i64 = 10_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSettings {
    pub user_id: Uuid,
    pub weekly_budget_minor: i64,
    /// Show a warning once most of the weekly budget is spent.
    pub budget_warnings: bool,
    /// Reject purchases that would overrun the weekly budget.
    pub strict_budget: bool,
    pub transaction_notifications: bool,
    pub weekly_reports: bool,
    pub updated_at: DateTime<Utc>,
}

impl BudgetSettings {
    pub(crate) fn defaults(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            weekly_budget_minor: DEFAULT_WEEKLY_BUDGET_MINOR,
            budget_warnings: true,
            strict_budget: false,
            transaction_notifications: true,
            weekly_reports: true,
            updated_at: now,
        }
    }
}

/// Full replacement of the editable settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSettingsUpdate {
    pub weekly_budget_minor: i64,
    pub budget_warnings: bool,
    pub strict_budget: bool,
    pub transaction_notifications: bool,
    pub weekly_reports: bool,
}

/// Spending over the rolling last seven days compared with the budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub weekly_budget_minor: i64,
    pub spent_minor: i64,
    pub remaining_minor: i64,
    pub over_budget: bool,
    pub warning: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "budget_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub weekly_budget_minor: i64,
    pub budget_warnings: bool,
    pub strict_budget: bool,
    pub transaction_notifications: bool,
    pub weekly_reports: bool,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BudgetSettings> for ActiveModel {
    fn from(settings: &BudgetSettings) -> Self {
        Self {
            user_id: ActiveValue::Set(settings.user_id),
            weekly_budget_minor: ActiveValue::Set(settings.weekly_budget_minor),
            budget_warnings: ActiveValue::Set(settings.budget_warnings),
            strict_budget: ActiveValue::Set(settings.strict_budget),
            transaction_notifications: ActiveValue::Set(settings.transaction_notifications),
            weekly_reports: ActiveValue::Set(settings.weekly_reports),
            updated_at: ActiveValue::Set(settings.updated_at),
        }
    }
}

impl From<Model> for BudgetSettings {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            weekly_budget_minor: model.weekly_budget_minor,
            budget_warnings: model.budget_warnings,
            strict_budget: model.strict_budget,
            transaction_notifications: model.transaction_notifications,
            weekly_reports: model.weekly_reports,
            updated_at: model.updated_at,
        }
    }
}
