//! Flexi Fairy help requests.
//!
//! A request moves through a small state machine:
//!
//! ```text
//! pending ──accept──▶ accepted ──(fairy + requestor confirm)──▶ completed
//!    │
//!    └──cancel──▶ cancelled
//! ```
//!
//! `fairy_id` is set exactly when the request is `accepted` or `completed`,
//! and `completed` is reached exactly when both confirmation flags are set.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Location, ResultEngine};

/// Maximum number of simultaneously pending requests per requestor.
pub const MAX_PENDING_REQUESTS: u64 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FairyRequestStatus {
    Pending,
    Accepted,
    Completed,
    Cancelled,
}

impl FairyRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for FairyRequestStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidInput(format!(
                "invalid request status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FairyRequest {
    pub id: Uuid,
    pub requestor_id: Uuid,
    pub fairy_id: Option<Uuid>,
    pub location: Location,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub status: FairyRequestStatus,
    pub requestor_confirmed: bool,
    pub fairy_confirmed: bool,
    pub rating: Option<i32>,
    pub rating_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl FairyRequest {
    pub(crate) fn new(
        requestor_id: Uuid,
        location: Location,
        amount_minor: i64,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            requestor_id,
            fairy_id: None,
            location,
            amount_minor,
            description,
            status: FairyRequestStatus::Pending,
            requestor_confirmed: false,
            fairy_confirmed: false,
            rating: None,
            rating_comment: None,
            created_at,
            accepted_at: None,
            completed_at: None,
        })
    }

    pub fn both_confirmed(&self) -> bool {
        self.requestor_confirmed && self.fairy_confirmed
    }
}

/// Validates a requestor rating.
pub(crate) fn validate_rating(rating: i32) -> ResultEngine<()> {
    if !(1..=5).contains(&rating) {
        return Err(EngineError::InvalidRating(rating));
    }
    Ok(())
}

/// Rolling window of the leaderboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    #[default]
    All,
    Week,
    Month,
    Semester,
}

impl Timeframe {
    /// Oldest `created_at` still inside the window, `None` when unbounded.
    pub fn window_start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            Self::All => return None,
            Self::Week => 7,
            Self::Month => 30,
            Self::Semester => 120,
        };
        Some(now - Duration::days(days))
    }
}

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub fairy_id: Uuid,
    pub name: String,
    pub requests_fulfilled: u64,
    pub amount_helped_minor: i64,
    pub rating: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "fairy_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub requestor_id: Uuid,
    pub fairy_id: Option<Uuid>,
    pub location: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub status: String,
    pub requestor_confirmed: bool,
    pub fairy_confirmed: bool,
    pub rating: Option<i32>,
    pub rating_comment: Option<String>,
    pub created_at: DateTimeUtc,
    pub accepted_at: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RequestorId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Requestor,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::FairyId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Fairy,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&FairyRequest> for ActiveModel {
    fn from(request: &FairyRequest) -> Self {
        Self {
            id: ActiveValue::Set(request.id),
            requestor_id: ActiveValue::Set(request.requestor_id),
            fairy_id: ActiveValue::Set(request.fairy_id),
            location: ActiveValue::Set(request.location.as_str().to_string()),
            amount_minor: ActiveValue::Set(request.amount_minor),
            description: ActiveValue::Set(request.description.clone()),
            status: ActiveValue::Set(request.status.as_str().to_string()),
            requestor_confirmed: ActiveValue::Set(request.requestor_confirmed),
            fairy_confirmed: ActiveValue::Set(request.fairy_confirmed),
            rating: ActiveValue::Set(request.rating),
            rating_comment: ActiveValue::Set(request.rating_comment.clone()),
            created_at: ActiveValue::Set(request.created_at),
            accepted_at: ActiveValue::Set(request.accepted_at),
            completed_at: ActiveValue::Set(request.completed_at),
            updated_at: ActiveValue::Set(request.created_at),
        }
    }
}

impl TryFrom<Model> for FairyRequest {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            requestor_id: model.requestor_id,
            fairy_id: model.fairy_id,
            location: Location::try_from(model.location.as_str())?,
            amount_minor: model.amount_minor,
            description: model.description,
            status: FairyRequestStatus::try_from(model.status.as_str())?,
            requestor_confirmed: model.requestor_confirmed,
            fairy_confirmed: model.fairy_confirmed,
            rating: model.rating,
            rating_comment: model.rating_comment,
            created_at: model.created_at,
            accepted_at: model.accepted_at,
            completed_at: model.completed_at,
        })
    }
}
