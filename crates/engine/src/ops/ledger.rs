use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Balance, EngineError, MoneyCents, ResultEngine, Transaction, TransactionKind, TransactionPage,
    balances, budget_settings, transactions,
    util::{ensure_positive_amount, normalize_optional_text, normalize_required_text, page_limit},
};

use super::{Engine, with_tx};

const DEFAULT_PAGE_LIMIT: u64 = 10;
const MAX_PAGE_LIMIT: u64 = 100;

/// Start of the rolling seven-day spending window ending at `now`.
pub(crate) fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(7)
}

impl Engine {
    /// Returns the balance of `user_id`.
    pub async fn balance(&self, user_id: Uuid) -> ResultEngine<Balance> {
        balances::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(Balance::from)
            .ok_or_else(|| EngineError::KeyNotFound("balance not exists".to_string()))
    }

    /// Records a purchase and debits the balance.
    ///
    /// With `strict_budget` on, the purchase must fit both the current balance
    /// and what is left of the rolling weekly budget.
    pub async fn record_purchase(
        &self,
        user_id: Uuid,
        amount_minor: i64,
        location: &str,
        description: Option<&str>,
    ) -> ResultEngine<Transaction> {
        ensure_positive_amount(amount_minor, "amount")?;
        let location = normalize_required_text(location, "location")?;
        let description = normalize_optional_text(description);
        let now = Utc::now();

        let tx = with_tx!(self, |db_tx| {
            let balance = self.require_balance(&db_tx, user_id).await?;
            let settings = budget_settings::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?;

            if let Some(settings) = settings.filter(|s| s.strict_budget) {
                if balance.current_balance_minor < amount_minor {
                    return Err(EngineError::InsufficientFunds(format!(
                        "balance {} is below {}",
                        MoneyCents::new(balance.current_balance_minor),
                        MoneyCents::new(amount_minor)
                    )));
                }
                let spent = spent_since(&db_tx, user_id, week_start(now)).await?;
                if spent + amount_minor > settings.weekly_budget_minor {
                    return Err(EngineError::BudgetExceeded(format!(
                        "spent {} of {} this week",
                        MoneyCents::new(spent),
                        MoneyCents::new(settings.weekly_budget_minor)
                    )));
                }
            }

            debit_balance(&db_tx, user_id, amount_minor, now).await?;
            let tx = Transaction::debit(
                user_id,
                TransactionKind::Purchase,
                amount_minor,
                location.clone(),
                description.clone(),
                now,
            )?;
            record_transaction(&db_tx, &tx).await?;
            Ok(tx)
        })?;

        tracing::info!(
            user_id = %user_id,
            amount = %MoneyCents::new(amount_minor),
            location = %tx.location,
            "purchase recorded"
        );
        Ok(tx)
    }

    /// Lists the transactions of `user_id`, newest first.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        limit: Option<u64>,
        offset: u64,
    ) -> ResultEngine<TransactionPage> {
        let limit = page_limit(limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
        let query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id));

        let total = query.clone().count(&self.database).await?;
        let models = query
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.database)
            .await?;

        let transactions = models
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(TransactionPage {
            transactions,
            total,
            limit,
            offset,
        })
    }
}

/// Atomically decrements the current balance of `user_id` by `amount_minor`.
///
/// Runs on the caller's transaction. The balance may go negative.
pub(crate) async fn debit_balance<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    amount_minor: i64,
    now: DateTime<Utc>,
) -> ResultEngine<()> {
    let res = balances::Entity::update_many()
        .col_expr(
            balances::Column::CurrentBalanceMinor,
            Expr::col(balances::Column::CurrentBalanceMinor).sub(amount_minor),
        )
        .col_expr(balances::Column::UpdatedAt, Expr::value(now))
        .filter(balances::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(EngineError::KeyNotFound("balance not exists".to_string()));
    }
    Ok(())
}

/// Inserts one ledger row on the caller's transaction.
pub(crate) async fn record_transaction<C: ConnectionTrait>(
    db: &C,
    tx: &Transaction,
) -> ResultEngine<()> {
    transactions::Entity::insert(transactions::ActiveModel::from(tx))
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Total debited from `user_id` since `since`, as a positive amount.
pub(crate) async fn spent_since<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> ResultEngine<i64> {
    let total: Option<Option<i64>> = transactions::Entity::find()
        .select_only()
        .column_as(transactions::Column::AmountMinor.sum(), "total")
        .filter(transactions::Column::UserId.eq(user_id))
        .filter(transactions::Column::AmountMinor.lt(0))
        .filter(transactions::Column::OccurredAt.gte(since))
        .into_tuple()
        .one(db)
        .await?;
    Ok(-total.flatten().unwrap_or(0))
}
