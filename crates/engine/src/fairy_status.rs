//! Fairy directory: per-user opt-in status.
//!
//! Lifetime statistics are not stored here. They are aggregated from
//! completed requests on every read (see [`FairyStats`]).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime numbers of a fairy, derived from completed requests.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FairyStats {
    pub total_helped_minor: i64,
    pub total_requests_fulfilled: u64,
    pub rating_average: Option<f64>,
    pub rating_count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FairyStatus {
    pub user_id: Uuid,
    pub is_active: bool,
    /// `None` accepts requests of any amount.
    pub max_transaction_minor: Option<i64>,
    pub stats: FairyStats,
    pub updated_at: DateTime<Utc>,
}

impl FairyStatus {
    pub(crate) fn from_parts(model: Model, stats: FairyStats) -> Self {
        Self {
            user_id: model.user_id,
            is_active: model.is_active,
            max_transaction_minor: model.max_transaction_minor,
            stats,
            updated_at: model.updated_at,
        }
    }
}

/// An active fairy as listed to requestors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FairyProfile {
    pub user_id: Uuid,
    pub name: String,
    pub max_transaction_minor: Option<i64>,
    pub stats: FairyStats,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveFairies {
    pub fairies: Vec<FairyProfile>,
    pub total: u64,
}

/// Ordering of [`ActiveFairies`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FairySort {
    #[default]
    Rating,
    Amount,
    Count,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "fairy_status")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub is_active: bool,
    pub max_transaction_minor: Option<i64>,
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

impl ActiveModel {
    pub(crate) fn new_row(
        user_id: Uuid,
        is_active: bool,
        max_transaction_minor: Option<i64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: ActiveValue::Set(user_id),
            is_active: ActiveValue::Set(is_active),
            max_transaction_minor: ActiveValue::Set(max_transaction_minor),
            updated_at: ActiveValue::Set(now),
        }
    }
}
