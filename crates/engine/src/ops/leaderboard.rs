use chrono::Utc;
use sea_orm::{
    FromQueryResult, JoinType, QueryOrder, QuerySelect, RelationTrait,
    sea_query::{Expr, Order},
};
use uuid::Uuid;

use crate::{LeaderboardEntry, ResultEngine, Timeframe, fairy_requests, users};

use super::{Engine, fairies::completed_by_fairy};

/// Rows returned by [`Engine::leaderboard`].
const LEADERBOARD_SIZE: u64 = 25;

#[derive(Debug, FromQueryResult)]
struct LeaderboardRow {
    fairy_id: Uuid,
    name: String,
    requests_fulfilled: i64,
    amount_helped_minor: Option<i64>,
    rating_average: Option<f64>,
}

impl From<LeaderboardRow> for LeaderboardEntry {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            fairy_id: row.fairy_id,
            name: row.name,
            requests_fulfilled: u64::try_from(row.requests_fulfilled).unwrap_or(0),
            amount_helped_minor: row.amount_helped_minor.unwrap_or(0),
            rating: row.rating_average,
        }
    }
}

impl Engine {
    /// Top fairies over completed requests created inside `timeframe`.
    ///
    /// Ranked by amount helped, then request count, then fairy id.
    pub async fn leaderboard(&self, timeframe: Timeframe) -> ResultEngine<Vec<LeaderboardEntry>> {
        let rows = completed_by_fairy(timeframe.window_start(Utc::now()))
            .column(users::Column::Name)
            .join(JoinType::InnerJoin, fairy_requests::Relation::Fairy.def())
            .group_by(users::Column::Name)
            .order_by(Expr::cust("amount_helped_minor"), Order::Desc)
            .order_by(Expr::cust("requests_fulfilled"), Order::Desc)
            .order_by_asc(fairy_requests::Column::FairyId)
            .limit(LEADERBOARD_SIZE)
            .into_model::<LeaderboardRow>()
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(LeaderboardEntry::from).collect())
    }
}
