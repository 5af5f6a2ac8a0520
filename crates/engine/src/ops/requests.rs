use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, FairyRequest, FairyRequestStatus, Location, MAX_PENDING_REQUESTS, MoneyCents,
    ResultEngine, Transaction, TransactionKind,
    fairy_requests::{self, validate_rating},
    fairy_status,
    util::{ensure_positive_amount, normalize_optional_text},
};

use super::{
    Engine,
    ledger::{debit_balance, record_transaction},
    with_tx,
};

/// Moves a pending request to `accepted` for `fairy_id`.
///
/// Zero affected rows means another caller changed the request after it was
/// read.
pub(crate) async fn claim_pending_request<C: ConnectionTrait>(
    db: &C,
    request_id: Uuid,
    fairy_id: Uuid,
    now: DateTime<Utc>,
) -> ResultEngine<()> {
    let res = fairy_requests::Entity::update_many()
        .set(fairy_requests::ActiveModel {
            fairy_id: ActiveValue::Set(Some(fairy_id)),
            status: ActiveValue::Set(FairyRequestStatus::Accepted.as_str().to_string()),
            accepted_at: ActiveValue::Set(Some(now)),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        })
        .filter(fairy_requests::Column::Id.eq(request_id))
        .filter(fairy_requests::Column::Status.eq(FairyRequestStatus::Pending.as_str()))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(EngineError::Conflict("request no longer pending".to_string()));
    }
    Ok(())
}

/// Finalizes a request once both sides confirmed: status, fairy debit and
/// donation record go through the caller's transaction together.
async fn complete_request<C: ConnectionTrait>(
    db: &C,
    request: &FairyRequest,
    now: DateTime<Utc>,
) -> ResultEngine<()> {
    let fairy_id = request.fairy_id.ok_or(EngineError::NotAccepted)?;
    let res = fairy_requests::Entity::update_many()
        .set(fairy_requests::ActiveModel {
            status: ActiveValue::Set(FairyRequestStatus::Completed.as_str().to_string()),
            completed_at: ActiveValue::Set(Some(now)),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        })
        .filter(fairy_requests::Column::Id.eq(request.id))
        .filter(fairy_requests::Column::Status.eq(FairyRequestStatus::Accepted.as_str()))
        .filter(fairy_requests::Column::FairyConfirmed.eq(true))
        .filter(fairy_requests::Column::RequestorConfirmed.eq(true))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(EngineError::Conflict("request already completed".to_string()));
    }

    debit_balance(db, fairy_id, request.amount_minor, now).await?;
    let donation = Transaction::debit(
        fairy_id,
        TransactionKind::FairyDonation,
        request.amount_minor,
        format!("Flexi Fairy · {}", request.location.as_str()),
        Some(
            request
                .description
                .clone()
                .unwrap_or_else(|| "Flexi Fairy help".to_string()),
        ),
        now,
    )?;
    record_transaction(db, &donation).await
}

async fn load_request<C: ConnectionTrait>(db: &C, request_id: Uuid) -> ResultEngine<FairyRequest> {
    let model = fairy_requests::Entity::find_by_id(request_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("request not exists".to_string()))?;
    FairyRequest::try_from(model)
}

fn into_requests(models: Vec<fairy_requests::Model>) -> ResultEngine<Vec<FairyRequest>> {
    models.into_iter().map(FairyRequest::try_from).collect()
}

impl Engine {
    /// Opens a new pending request on behalf of `requestor_id`.
    pub async fn create_request(
        &self,
        requestor_id: Uuid,
        location: &str,
        amount_minor: i64,
        description: Option<&str>,
    ) -> ResultEngine<FairyRequest> {
        let location = Location::try_from(location)?;
        ensure_positive_amount(amount_minor, "amount")?;
        let description = normalize_optional_text(description);
        let now = Utc::now();

        let request = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, requestor_id).await?;
            let pending = fairy_requests::Entity::find()
                .filter(fairy_requests::Column::RequestorId.eq(requestor_id))
                .filter(fairy_requests::Column::Status.eq(FairyRequestStatus::Pending.as_str()))
                .count(&db_tx)
                .await?;
            if pending >= MAX_PENDING_REQUESTS {
                return Err(EngineError::TooManyPending(MAX_PENDING_REQUESTS));
            }

            let request =
                FairyRequest::new(requestor_id, location, amount_minor, description.clone(), now)?;
            fairy_requests::Entity::insert(fairy_requests::ActiveModel::from(&request))
                .exec_without_returning(&db_tx)
                .await?;
            Ok(request)
        })?;

        tracing::info!(
            request_id = %request.id,
            requestor_id = %requestor_id,
            location = request.location.as_str(),
            amount = %MoneyCents::new(amount_minor),
            "fairy request created"
        );
        Ok(request)
    }

    /// Claims a pending request for `fairy_id`.
    ///
    /// The caller must be an active fairy, must not be the requestor, must
    /// hold at least the requested amount and the amount must fit their
    /// ceiling. Those checks read a snapshot; the claim itself is conditional
    /// on the request still being pending, so a caller that lost the race to
    /// another fairy gets a `Conflict`.
    pub async fn accept_request(
        &self,
        request_id: Uuid,
        fairy_id: Uuid,
    ) -> ResultEngine<FairyRequest> {
        let request = load_request(&self.database, request_id).await?;
        if request.requestor_id == fairy_id {
            return Err(EngineError::SelfAccept);
        }
        if request.status != FairyRequestStatus::Pending {
            return Err(EngineError::NotPending);
        }

        let status = fairy_status::Entity::find_by_id(fairy_id)
            .one(&self.database)
            .await?
            .filter(|s| s.is_active)
            .ok_or(EngineError::FairyInactive)?;
        if let Some(max) = status.max_transaction_minor
            && request.amount_minor > max
        {
            return Err(EngineError::ExceedsMaxAmount(format!(
                "{} > {}",
                MoneyCents::new(request.amount_minor),
                MoneyCents::new(max)
            )));
        }

        let balance = self.require_balance(&self.database, fairy_id).await?;
        if balance.current_balance_minor < request.amount_minor {
            return Err(EngineError::InsufficientFunds(format!(
                "balance {} is below {}",
                MoneyCents::new(balance.current_balance_minor),
                MoneyCents::new(request.amount_minor)
            )));
        }

        let now = Utc::now();
        let request = with_tx!(self, |db_tx| {
            claim_pending_request(&db_tx, request_id, fairy_id, now).await?;
            load_request(&db_tx, request_id).await
        })?;

        tracing::info!(request_id = %request_id, fairy_id = %fairy_id, "fairy request accepted");
        Ok(request)
    }

    /// Withdraws a pending request. Only the requestor may cancel.
    pub async fn cancel_request(
        &self,
        request_id: Uuid,
        requestor_id: Uuid,
    ) -> ResultEngine<FairyRequest> {
        let now = Utc::now();
        let request = with_tx!(self, |db_tx| {
            let request = load_request(&db_tx, request_id).await?;
            if request.requestor_id != requestor_id {
                return Err(EngineError::NotOwner);
            }
            if request.status != FairyRequestStatus::Pending {
                return Err(EngineError::NotPending);
            }

            let res = fairy_requests::Entity::update_many()
                .set(fairy_requests::ActiveModel {
                    status: ActiveValue::Set(FairyRequestStatus::Cancelled.as_str().to_string()),
                    updated_at: ActiveValue::Set(now),
                    ..Default::default()
                })
                .filter(fairy_requests::Column::Id.eq(request_id))
                .filter(fairy_requests::Column::Status.eq(FairyRequestStatus::Pending.as_str()))
                .exec(&db_tx)
                .await?;
            if res.rows_affected == 0 {
                return Err(EngineError::Conflict("request no longer pending".to_string()));
            }
            load_request(&db_tx, request_id).await
        })?;

        tracing::info!(request_id = %request_id, "fairy request cancelled");
        Ok(request)
    }

    /// Records the fairy's side of the hand-off, completing the request when
    /// the requestor already confirmed.
    pub async fn confirm_as_fairy(
        &self,
        request_id: Uuid,
        fairy_id: Uuid,
    ) -> ResultEngine<FairyRequest> {
        let now = Utc::now();
        let request = with_tx!(self, |db_tx| {
            let request = load_request(&db_tx, request_id).await?;
            let Some(assigned) = request.fairy_id else {
                return Err(EngineError::NotAccepted);
            };
            if assigned != fairy_id {
                return Err(EngineError::NotFairy);
            }
            if request.fairy_confirmed {
                return Err(EngineError::AlreadyConfirmed("fairy".to_string()));
            }
            if request.status != FairyRequestStatus::Accepted {
                return Err(EngineError::NotAccepted);
            }

            let res = fairy_requests::Entity::update_many()
                .set(fairy_requests::ActiveModel {
                    fairy_confirmed: ActiveValue::Set(true),
                    updated_at: ActiveValue::Set(now),
                    ..Default::default()
                })
                .filter(fairy_requests::Column::Id.eq(request_id))
                .filter(fairy_requests::Column::Status.eq(FairyRequestStatus::Accepted.as_str()))
                .filter(fairy_requests::Column::FairyConfirmed.eq(false))
                .exec(&db_tx)
                .await?;
            if res.rows_affected == 0 {
                return Err(EngineError::Conflict("request changed concurrently".to_string()));
            }

            let mut request = load_request(&db_tx, request_id).await?;
            if request.both_confirmed() {
                complete_request(&db_tx, &request, now).await?;
                request = load_request(&db_tx, request_id).await?;
            }
            Ok(request)
        })?;

        log_confirmation(&request, "fairy");
        Ok(request)
    }

    /// Records the requestor's confirmation together with their rating of the
    /// fairy, completing the request when the fairy already confirmed.
    pub async fn confirm_and_rate_as_requestor(
        &self,
        request_id: Uuid,
        requestor_id: Uuid,
        rating: i32,
        comment: Option<&str>,
    ) -> ResultEngine<FairyRequest> {
        validate_rating(rating)?;
        let comment = normalize_optional_text(comment);
        let now = Utc::now();

        let request = with_tx!(self, |db_tx| {
            let request = load_request(&db_tx, request_id).await?;
            if request.requestor_id != requestor_id {
                return Err(EngineError::NotOwner);
            }
            if request.requestor_confirmed {
                return Err(EngineError::AlreadyConfirmed("requestor".to_string()));
            }
            if request.status != FairyRequestStatus::Accepted {
                return Err(EngineError::NotAccepted);
            }

            let res = fairy_requests::Entity::update_many()
                .set(fairy_requests::ActiveModel {
                    requestor_confirmed: ActiveValue::Set(true),
                    rating: ActiveValue::Set(Some(rating)),
                    rating_comment: ActiveValue::Set(comment.clone()),
                    updated_at: ActiveValue::Set(now),
                    ..Default::default()
                })
                .filter(fairy_requests::Column::Id.eq(request_id))
                .filter(fairy_requests::Column::Status.eq(FairyRequestStatus::Accepted.as_str()))
                .filter(fairy_requests::Column::RequestorConfirmed.eq(false))
                .exec(&db_tx)
                .await?;
            if res.rows_affected == 0 {
                return Err(EngineError::Conflict("request changed concurrently".to_string()));
            }

            let mut request = load_request(&db_tx, request_id).await?;
            if request.both_confirmed() {
                complete_request(&db_tx, &request, now).await?;
                request = load_request(&db_tx, request_id).await?;
            }
            Ok(request)
        })?;

        log_confirmation(&request, "requestor");
        Ok(request)
    }

    /// Pending requests other than `user_id`'s own, oldest first.
    ///
    /// With `max_amount_minor` set, larger requests are left out.
    pub async fn list_pending_requests(
        &self,
        user_id: Uuid,
        max_amount_minor: Option<i64>,
    ) -> ResultEngine<Vec<FairyRequest>> {
        let mut query = fairy_requests::Entity::find()
            .filter(fairy_requests::Column::Status.eq(FairyRequestStatus::Pending.as_str()))
            .filter(fairy_requests::Column::RequestorId.ne(user_id));
        if let Some(max) = max_amount_minor {
            query = query.filter(fairy_requests::Column::AmountMinor.lte(max));
        }
        let models = query
            .order_by_asc(fairy_requests::Column::CreatedAt)
            .order_by_asc(fairy_requests::Column::Id)
            .all(&self.database)
            .await?;
        into_requests(models)
    }

    /// Requests opened by `user_id`, newest first.
    pub async fn list_my_requests(&self, user_id: Uuid) -> ResultEngine<Vec<FairyRequest>> {
        let models = fairy_requests::Entity::find()
            .filter(fairy_requests::Column::RequestorId.eq(user_id))
            .order_by_desc(fairy_requests::Column::CreatedAt)
            .order_by_desc(fairy_requests::Column::Id)
            .all(&self.database)
            .await?;
        into_requests(models)
    }

    /// Accepted and completed requests fulfilled by `fairy_id`, newest first.
    pub async fn list_accepted_by_fairy(&self, fairy_id: Uuid) -> ResultEngine<Vec<FairyRequest>> {
        let models = fairy_requests::Entity::find()
            .filter(fairy_requests::Column::FairyId.eq(fairy_id))
            .filter(fairy_requests::Column::Status.is_in([
                FairyRequestStatus::Accepted.as_str(),
                FairyRequestStatus::Completed.as_str(),
            ]))
            .order_by_desc(fairy_requests::Column::AcceptedAt)
            .order_by_desc(fairy_requests::Column::Id)
            .all(&self.database)
            .await?;
        into_requests(models)
    }

    pub async fn fairy_request(&self, request_id: Uuid) -> ResultEngine<FairyRequest> {
        load_request(&self.database, request_id).await
    }
}

fn log_confirmation(request: &FairyRequest, side: &str) {
    if request.status == FairyRequestStatus::Completed {
        tracing::info!(
            request_id = %request.id,
            fairy_id = ?request.fairy_id,
            amount = %MoneyCents::new(request.amount_minor),
            "fairy request completed"
        );
    } else {
        tracing::info!(request_id = %request.id, side, "fairy request confirmed");
    }
}

#[cfg(test)]
mod tests {
    use migration::MigratorTrait;
    use sea_orm::{Database, TransactionTrait};

    use super::*;
    use crate::NewUser;

    async fn engine() -> Engine {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        Engine::builder().database(db).build().await.unwrap()
    }

    async fn student(engine: &Engine, student_id: &str) -> Uuid {
        engine
            .register_user(NewUser {
                student_id: student_id.to_string(),
                name: student_id.to_string(),
                email: format!("{student_id}@dons.usfca.edu"),
                password_hash: "secret".to_string(),
                starting_balance_minor: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn stale_claim_is_a_conflict() {
        let engine = engine().await;
        let requestor = student(&engine, "req").await;
        let first = student(&engine, "fairy1").await;
        let second = student(&engine, "fairy2").await;
        let request = engine
            .create_request(requestor, "Market Cafe", 1000, None)
            .await
            .unwrap();

        let db_tx = engine.database.begin().await.unwrap();
        claim_pending_request(&db_tx, request.id, first, Utc::now())
            .await
            .unwrap();
        let err = claim_pending_request(&db_tx, request.id, second, Utc::now())
            .await
            .unwrap_err();
        db_tx.commit().await.unwrap();

        assert_eq!(
            err,
            EngineError::Conflict("request no longer pending".to_string())
        );
        let stored = engine.fairy_request(request.id).await.unwrap();
        assert_eq!(stored.fairy_id, Some(first));
    }
}
