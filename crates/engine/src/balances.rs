//! Per-user flexi-dollar balance.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Starting balance granted on registration (1500.00).
pub const DEFAULT_STARTING_BALANCE_MINOR: i64 = 150_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub user_id: Uuid,
    pub starting_balance_minor: i64,
    pub current_balance_minor: i64,
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// How much of the starting balance has left the account.
    pub fn spent_minor(&self) -> i64 {
        self.starting_balance_minor - self.current_balance_minor
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub starting_balance_minor: i64,
    pub current_balance_minor: i64,
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

impl From<Model> for Balance {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            starting_balance_minor: model.starting_balance_minor,
            current_balance_minor: model.current_balance_minor,
            updated_at: model.updated_at,
        }
    }
}
