use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub student_id: String,
        pub name: String,
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub student_id: String,
        pub name: String,
        pub email: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub starting_balance_minor: i64,
        pub current_balance_minor: i64,
        /// `starting - current`.
        pub spent_minor: i64,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Purchase,
        FairyDonation,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        /// Defaults to 10, capped at 100.
        pub limit: Option<u64>,
        pub offset: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseNew {
        /// Must be > 0.
        pub amount_minor: i64,
        pub location: String,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        /// Signed: debits are negative.
        pub amount_minor: i64,
        pub location: String,
        pub description: Option<String>,
        pub occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        pub total: u64,
        pub limit: u64,
        pub offset: u64,
    }
}

pub mod budget {
    use super::*;

    /// Budget settings, both as returned by `GET /api/budget` and as sent to
    /// `POST /api/budget/update` (full replacement).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetSettings {
        pub weekly_budget_minor: i64,
        pub budget_warnings: bool,
        pub strict_budget: bool,
        pub transaction_notifications: bool,
        pub weekly_reports: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WeeklySummary {
        pub weekly_budget_minor: i64,
        pub spent_minor: i64,
        pub remaining_minor: i64,
        pub over_budget: bool,
        pub warning: bool,
    }
}

pub mod fairy {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FairyToggle {
        pub is_active: bool,
        /// Absent or null accepts requests of any amount.
        pub max_transaction_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FairyStats {
        pub total_helped_minor: i64,
        pub total_requests_fulfilled: u64,
        pub rating_average: Option<f64>,
        pub rating_count: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FairyStatusView {
        pub is_active: bool,
        pub max_transaction_minor: Option<i64>,
        pub stats: FairyStats,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FairySort {
        #[default]
        Rating,
        Amount,
        Count,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ActiveFairiesQuery {
        /// Defaults to 20, capped at 100.
        pub limit: Option<u64>,
        pub offset: Option<u64>,
        pub sort_by: Option<FairySort>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FairyProfileView {
        pub user_id: Uuid,
        pub name: String,
        pub max_transaction_minor: Option<i64>,
        pub stats: FairyStats,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ActiveFairiesResponse {
        pub fairies: Vec<FairyProfileView>,
        pub total: u64,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RequestStatus {
        Pending,
        Accepted,
        Completed,
        Cancelled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RequestNew {
        /// One of the campus locations, by display name (e.g. `Market Cafe`).
        pub location: String,
        pub amount_minor: i64,
        pub description: Option<String>,
    }

    /// Body of accept, cancel and fairy-confirm calls.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RequestAction {
        pub request_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RequestRate {
        pub request_id: Uuid,
        /// 1 to 5.
        pub rating: i32,
        pub comment: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RequestView {
        pub id: Uuid,
        pub requestor_id: Uuid,
        pub fairy_id: Option<Uuid>,
        pub location: String,
        pub amount_minor: i64,
        pub description: Option<String>,
        pub status: RequestStatus,
        pub requestor_confirmed: bool,
        pub fairy_confirmed: bool,
        pub rating: Option<i32>,
        pub rating_comment: Option<String>,
        pub created_at: DateTime<Utc>,
        pub accepted_at: Option<DateTime<Utc>>,
        pub completed_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RequestListResponse {
        pub requests: Vec<RequestView>,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Timeframe {
        #[default]
        All,
        Week,
        Month,
        Semester,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LeaderboardQuery {
        pub timeframe: Option<Timeframe>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LeaderboardEntry {
        pub fairy_id: Uuid,
        pub name: String,
        pub requests_fulfilled: u64,
        pub amount_helped_minor: i64,
        pub rating: Option<f64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LeaderboardResponse {
        pub timeframe: Timeframe,
        pub entries: Vec<LeaderboardEntry>,
    }
}
