use std::{cmp::Ordering, collections::HashMap};

use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectionTrait, FromQueryResult, QueryFilter, QuerySelect, Select,
    prelude::*,
    sea_query::{Expr, Func, OnConflict, SimpleExpr},
};
use uuid::Uuid;

use crate::{
    ActiveFairies, EngineError, FairyProfile, FairyRequestStatus, FairySort, FairyStats,
    FairyStatus, ResultEngine, fairy_requests, fairy_status, users, util::page_limit,
};

use super::{Engine, with_tx};

const DEFAULT_PAGE_LIMIT: u64 = 20;
const MAX_PAGE_LIMIT: u64 = 100;

/// Aggregated numbers of one fairy over completed requests.
#[derive(Debug, FromQueryResult)]
pub(crate) struct FairyStatsRow {
    pub fairy_id: Uuid,
    pub requests_fulfilled: i64,
    pub amount_helped_minor: Option<i64>,
    pub rating_average: Option<f64>,
    pub rating_count: i64,
}

impl From<FairyStatsRow> for FairyStats {
    fn from(row: FairyStatsRow) -> Self {
        Self {
            total_helped_minor: row.amount_helped_minor.unwrap_or(0),
            total_requests_fulfilled: u64::try_from(row.requests_fulfilled).unwrap_or(0),
            rating_average: row.rating_average,
            rating_count: u64::try_from(row.rating_count).unwrap_or(0),
        }
    }
}

/// Completed requests grouped by fairy, optionally limited to those created
/// at or after `since`.
///
/// Status reads, the active-fairy listing and the leaderboard all start from
/// this query so that they agree on the numbers.
pub(crate) fn completed_by_fairy(since: Option<DateTime<Utc>>) -> Select<fairy_requests::Entity> {
    let mut query = fairy_requests::Entity::find()
        .select_only()
        .column(fairy_requests::Column::FairyId)
        .column_as(fairy_requests::Column::Id.count(), "requests_fulfilled")
        .column_as(
            fairy_requests::Column::AmountMinor.sum(),
            "amount_helped_minor",
        )
        .column_as(
            SimpleExpr::from(Func::avg(Expr::col((
                fairy_requests::Entity,
                fairy_requests::Column::Rating,
            )))),
            "rating_average",
        )
        .column_as(fairy_requests::Column::Rating.count(), "rating_count")
        .filter(fairy_requests::Column::Status.eq(FairyRequestStatus::Completed.as_str()))
        .filter(fairy_requests::Column::FairyId.is_not_null());
    if let Some(since) = since {
        query = query.filter(fairy_requests::Column::CreatedAt.gte(since));
    }
    query.group_by(fairy_requests::Column::FairyId)
}

async fn stats_for<C: ConnectionTrait>(db: &C, fairy_id: Uuid) -> ResultEngine<FairyStats> {
    let row = completed_by_fairy(None)
        .filter(fairy_requests::Column::FairyId.eq(fairy_id))
        .into_model::<FairyStatsRow>()
        .one(db)
        .await?;
    Ok(row.map(FairyStats::from).unwrap_or_default())
}

/// Inserts an inactive directory row for `user_id` unless one exists.
pub(crate) async fn ensure_fairy_row<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> ResultEngine<fairy_status::Model> {
    let res = fairy_status::Entity::insert(fairy_status::ActiveModel::new_row(
        user_id, false, None, now,
    ))
    .on_conflict(
        OnConflict::column(fairy_status::Column::UserId)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await;
    match res {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(err) => return Err(err.into()),
    }
    fairy_status::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("fairy status not exists".to_string()))
}

impl Engine {
    /// Opts `user_id` in or out of being a fairy.
    ///
    /// `max_transaction_minor = None` removes the ceiling.
    pub async fn set_fairy_status(
        &self,
        user_id: Uuid,
        is_active: bool,
        max_transaction_minor: Option<i64>,
    ) -> ResultEngine<FairyStatus> {
        let now = Utc::now();
        let status = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let res = fairy_status::Entity::insert(fairy_status::ActiveModel::new_row(
                user_id,
                is_active,
                max_transaction_minor,
                now,
            ))
            .on_conflict(
                OnConflict::column(fairy_status::Column::UserId)
                    .update_columns([
                        fairy_status::Column::IsActive,
                        fairy_status::Column::MaxTransactionMinor,
                        fairy_status::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&db_tx)
            .await;
            match res {
                Ok(_) | Err(DbErr::RecordNotInserted) => {}
                Err(err) => return Err(err.into()),
            }

            let model = fairy_status::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("fairy status not exists".to_string()))?;
            let stats = stats_for(&db_tx, user_id).await?;
            Ok(FairyStatus::from_parts(model, stats))
        })?;

        tracing::info!(
            user_id = %user_id,
            is_active = status.is_active,
            max = ?status.max_transaction_minor,
            "fairy status changed"
        );
        Ok(status)
    }

    /// Returns the directory entry of `user_id`, creating an inactive one on
    /// first read.
    pub async fn fairy_status(&self, user_id: Uuid) -> ResultEngine<FairyStatus> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let model = ensure_fairy_row(&db_tx, user_id, now).await?;
            let stats = stats_for(&db_tx, user_id).await?;
            Ok(FairyStatus::from_parts(model, stats))
        })
    }

    /// Lists active fairies with their lifetime stats.
    ///
    /// Sorted descending by `sort_by`; ties fall back to request count, then
    /// amount helped, then name and user id ascending.
    pub async fn list_active_fairies(
        &self,
        limit: Option<u64>,
        offset: u64,
        sort_by: FairySort,
    ) -> ResultEngine<ActiveFairies> {
        let limit = page_limit(limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);

        let active = fairy_status::Entity::find()
            .filter(fairy_status::Column::IsActive.eq(true))
            .find_also_related(users::Entity)
            .all(&self.database)
            .await?;
        let mut stats: HashMap<Uuid, FairyStats> = completed_by_fairy(None)
            .into_model::<FairyStatsRow>()
            .all(&self.database)
            .await?
            .into_iter()
            .map(|row| (row.fairy_id, FairyStats::from(row)))
            .collect();

        let mut fairies: Vec<FairyProfile> = active
            .into_iter()
            .filter_map(|(status, user)| {
                let user = user?;
                Some(FairyProfile {
                    user_id: status.user_id,
                    name: user.name,
                    max_transaction_minor: status.max_transaction_minor,
                    stats: stats.remove(&status.user_id).unwrap_or_default(),
                })
            })
            .collect();
        fairies.sort_by(|a, b| compare_profiles(a, b, sort_by));

        let total = fairies.len() as u64;
        let fairies = fairies
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();
        Ok(ActiveFairies { fairies, total })
    }
}

fn compare_profiles(a: &FairyProfile, b: &FairyProfile, sort_by: FairySort) -> Ordering {
    let primary = match sort_by {
        FairySort::Rating => {
            let rating = |p: &FairyProfile| p.stats.rating_average.unwrap_or(-1.0);
            rating(b).total_cmp(&rating(a))
        }
        FairySort::Amount => b.stats.total_helped_minor.cmp(&a.stats.total_helped_minor),
        FairySort::Count => b
            .stats
            .total_requests_fulfilled
            .cmp(&a.stats.total_requests_fulfilled),
    };
    primary
        .then_with(|| {
            b.stats
                .total_requests_fulfilled
                .cmp(&a.stats.total_requests_fulfilled)
        })
        .then_with(|| b.stats.total_helped_minor.cmp(&a.stats.total_helped_minor))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, count: u64, amount: i64, rating: Option<f64>) -> FairyProfile {
        FairyProfile {
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            max_transaction_minor: None,
            stats: FairyStats {
                total_helped_minor: amount,
                total_requests_fulfilled: count,
                rating_average: rating,
                rating_count: u64::from(rating.is_some()),
            },
        }
    }

    #[test]
    fn unrated_fairies_sort_after_rated_ones() {
        let mut fairies = vec![
            profile("Bea", 0, 0, None),
            profile("Ada", 1, 500, Some(3.0)),
            profile("Cy", 2, 900, Some(4.5)),
        ];
        fairies.sort_by(|a, b| compare_profiles(a, b, FairySort::Rating));
        let names: Vec<&str> = fairies.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Cy", "Ada", "Bea"]);
    }

    #[test]
    fn ties_fall_back_to_count_then_name() {
        let mut fairies = vec![
            profile("Zed", 1, 1000, None),
            profile("Amy", 1, 1000, None),
            profile("Kai", 3, 1000, None),
        ];
        fairies.sort_by(|a, b| compare_profiles(a, b, FairySort::Amount));
        let names: Vec<&str> = fairies.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Kai", "Amy", "Zed"]);
    }
}
