//! Ledger transactions.
//!
//! A `Transaction` is the audit record of one balance change. Amounts are
//! signed minor units: purchases and fairy donations are negative.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    FairyDonation,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::FairyDonation => "fairy_donation",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "purchase" => Ok(Self::Purchase),
            "fairy_donation" => Ok(Self::FairyDonation),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub location: String,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds a debit of `amount_minor` (which must be > 0).
    pub fn debit(
        user_id: Uuid,
        kind: TransactionKind,
        amount_minor: i64,
        location: String,
        description: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount_minor: -amount_minor,
            location,
            description,
            occurred_at,
        })
    }
}

/// One page of a user's transaction history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub amount_minor: i64,
    pub location: String,
    pub description: Option<String>,
    pub occurred_at: DateTimeUtc,
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

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            user_id: ActiveValue::Set(tx.user_id),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            location: ActiveValue::Set(tx.location.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            location: model.location,
            description: model.description,
            occurred_at: model.occurred_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_is_stored_negative() {
        let tx = Transaction::debit(
            Uuid::new_v4(),
            TransactionKind::Purchase,
            1250,
            "Market Cafe".to_string(),
            None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(tx.amount_minor, -1250);
    }

    #[test]
    fn debit_rejects_non_positive_amounts() {
        let err = Transaction::debit(
            Uuid::new_v4(),
            TransactionKind::FairyDonation,
            0,
            "Market Cafe".to_string(),
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("amount_minor must be > 0".to_string())
        );
    }
}
