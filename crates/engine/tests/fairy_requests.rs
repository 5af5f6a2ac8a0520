use sea_orm::{ConnectionTrait, Statement};

use engine::{
    EngineError, ErrorKind, FairyRequestStatus, MAX_PENDING_REQUESTS, NewUser, TransactionKind,
};

mod common;
use common::{engine_with_db, fairy, student};

#[tokio::test]
async fn market_cafe_request_completes_and_debits_fairy() {
    let (engine, _db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;
    let helper = fairy(&engine, "f1", "Fern").await;

    let request = engine
        .create_request(requestor.id, "Market Cafe", 1000, Some("lunch"))
        .await
        .unwrap();
    assert_eq!(request.status, FairyRequestStatus::Pending);

    let accepted = engine.accept_request(request.id, helper.id).await.unwrap();
    assert_eq!(accepted.status, FairyRequestStatus::Accepted);
    assert_eq!(accepted.fairy_id, Some(helper.id));
    assert!(accepted.accepted_at.is_some());

    let confirmed = engine.confirm_as_fairy(request.id, helper.id).await.unwrap();
    assert_eq!(confirmed.status, FairyRequestStatus::Accepted);
    assert!(confirmed.fairy_confirmed);

    let completed = engine
        .confirm_and_rate_as_requestor(request.id, requestor.id, 5, Some("thanks!"))
        .await
        .unwrap();
    assert_eq!(completed.status, FairyRequestStatus::Completed);
    assert_eq!(completed.rating, Some(5));
    assert_eq!(completed.rating_comment.as_deref(), Some("thanks!"));
    assert!(completed.completed_at.is_some());

    let status = engine.fairy_status(helper.id).await.unwrap();
    assert_eq!(status.stats.total_requests_fulfilled, 1);
    assert_eq!(status.stats.total_helped_minor, 1000);
    assert_eq!(status.stats.rating_average, Some(5.0));

    let balance = engine.balance(helper.id).await.unwrap();
    assert_eq!(balance.current_balance_minor, 150_000 - 1000);
    let untouched = engine.balance(requestor.id).await.unwrap();
    assert_eq!(untouched.current_balance_minor, 150_000);

    let page = engine
        .list_transactions(helper.id, None, 0)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    let donation = &page.transactions[0];
    assert_eq!(donation.kind, TransactionKind::FairyDonation);
    assert_eq!(donation.amount_minor, -1000);
    assert_eq!(donation.location, "Flexi Fairy · Market Cafe");
}

#[tokio::test]
async fn completion_does_not_depend_on_confirmation_order() {
    let (engine, _db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;
    let helper = fairy(&engine, "f1", "Fern").await;

    let request = engine
        .create_request(requestor.id, "Crossroads Cafe", 750, None)
        .await
        .unwrap();
    engine.accept_request(request.id, helper.id).await.unwrap();

    let rated = engine
        .confirm_and_rate_as_requestor(request.id, requestor.id, 4, None)
        .await
        .unwrap();
    assert_eq!(rated.status, FairyRequestStatus::Accepted);
    assert!(rated.requestor_confirmed);

    let completed = engine.confirm_as_fairy(request.id, helper.id).await.unwrap();
    assert_eq!(completed.status, FairyRequestStatus::Completed);

    let page = engine.list_transactions(helper.id, None, 0).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(
        engine.balance(helper.id).await.unwrap().current_balance_minor,
        150_000 - 750
    );

    let err = engine
        .confirm_as_fairy(request.id, helper.id)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::AlreadyConfirmed("fairy".to_string()));
    let err = engine
        .confirm_and_rate_as_requestor(request.id, requestor.id, 4, None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::AlreadyConfirmed("requestor".to_string()));

    // Re-confirmation must not debit twice.
    assert_eq!(
        engine.list_transactions(helper.id, None, 0).await.unwrap().total,
        1
    );
}

#[tokio::test]
async fn cancelled_request_cannot_be_accepted() {
    let (engine, _db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;
    let helper = fairy(&engine, "f1", "Fern").await;

    let request = engine
        .create_request(requestor.id, "Lone Mountain", 500, None)
        .await
        .unwrap();
    let cancelled = engine.cancel_request(request.id, requestor.id).await.unwrap();
    assert_eq!(cancelled.status, FairyRequestStatus::Cancelled);
    assert_eq!(cancelled.fairy_id, None);

    let err = engine.accept_request(request.id, helper.id).await.unwrap_err();
    assert_eq!(err, EngineError::NotPending);
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    let err = engine
        .cancel_request(request.id, requestor.id)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotPending);
}

#[tokio::test]
async fn only_requestor_may_cancel() {
    let (engine, _db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;
    let other = student(&engine, "o1", "Oli").await;

    let request = engine
        .create_request(requestor.id, "Lone Mountain", 500, None)
        .await
        .unwrap();
    let err = engine.cancel_request(request.id, other.id).await.unwrap_err();
    assert_eq!(err, EngineError::NotOwner);
    assert!(err.is_role_violation());
}

#[tokio::test]
async fn fourth_pending_request_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;

    for _ in 0..MAX_PENDING_REQUESTS {
        engine
            .create_request(requestor.id, "Wolf & Kettle", 300, None)
            .await
            .unwrap();
    }
    let err = engine
        .create_request(requestor.id, "Wolf & Kettle", 300, None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::TooManyPending(3));

    // Cancelling one frees a slot.
    let mine = engine.list_my_requests(requestor.id).await.unwrap();
    engine
        .cancel_request(mine[0].id, requestor.id)
        .await
        .unwrap();
    engine
        .create_request(requestor.id, "Wolf & Kettle", 300, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn self_accept_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let both = fairy(&engine, "f1", "Fern").await;

    let request = engine
        .create_request(both.id, "Market Cafe", 1000, None)
        .await
        .unwrap();
    let err = engine.accept_request(request.id, both.id).await.unwrap_err();
    assert_eq!(err, EngineError::SelfAccept);
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

#[tokio::test]
async fn out_of_range_ratings_are_validation_errors() {
    let (engine, _db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;
    let helper = fairy(&engine, "f1", "Fern").await;

    let request = engine
        .create_request(requestor.id, "Market Cafe", 1000, None)
        .await
        .unwrap();
    engine.accept_request(request.id, helper.id).await.unwrap();

    for rating in [0, 6] {
        let err = engine
            .confirm_and_rate_as_requestor(request.id, requestor.id, rating, None)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidRating(rating));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    let stored = engine.fairy_request(request.id).await.unwrap();
    assert!(!stored.requestor_confirmed);
    assert_eq!(stored.rating, None);
}

#[tokio::test]
async fn accept_checks_fairy_status_ceiling_and_funds() {
    let (engine, _db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;
    let idle = student(&engine, "i1", "Ivy").await;
    let capped = student(&engine, "c1", "Cal").await;
    engine
        .set_fairy_status(capped.id, true, Some(500))
        .await
        .unwrap();
    let broke = engine
        .register_user(NewUser {
            student_id: "b1".to_string(),
            name: "Bo".to_string(),
            email: "b1@dons.usfca.edu".to_string(),
            password_hash: "password".to_string(),
            starting_balance_minor: Some(200),
        })
        .await
        .unwrap();
    engine.set_fairy_status(broke.id, true, None).await.unwrap();

    let request = engine
        .create_request(requestor.id, "Koret Health Center", 1000, None)
        .await
        .unwrap();

    let err = engine.accept_request(request.id, idle.id).await.unwrap_err();
    assert_eq!(err, EngineError::FairyInactive);
    assert!(err.is_role_violation());

    let err = engine.accept_request(request.id, capped.id).await.unwrap_err();
    assert!(matches!(err, EngineError::ExceedsMaxAmount(_)));

    let err = engine.accept_request(request.id, broke.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    let stored = engine.fairy_request(request.id).await.unwrap();
    assert_eq!(stored.status, FairyRequestStatus::Pending);
    assert_eq!(stored.fairy_id, None);
}

#[tokio::test]
async fn confirmations_check_roles_and_state() {
    let (engine, _db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;
    let helper = fairy(&engine, "f1", "Fern").await;
    let other = fairy(&engine, "f2", "Finn").await;

    let request = engine
        .create_request(requestor.id, "Market Cafe", 1000, None)
        .await
        .unwrap();

    let err = engine
        .confirm_as_fairy(request.id, helper.id)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotAccepted);
    let err = engine
        .confirm_and_rate_as_requestor(request.id, requestor.id, 5, None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotAccepted);

    engine.accept_request(request.id, helper.id).await.unwrap();

    let err = engine
        .confirm_as_fairy(request.id, other.id)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFairy);
    let err = engine
        .confirm_and_rate_as_requestor(request.id, other.id, 5, None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotOwner);

    let err = engine.accept_request(request.id, other.id).await.unwrap_err();
    assert_eq!(err, EngineError::NotPending);
}

#[tokio::test]
async fn concurrent_accepts_have_one_winner() {
    let (engine, _db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;
    let first = fairy(&engine, "f1", "Fern").await;
    let second = fairy(&engine, "f2", "Finn").await;

    let request = engine
        .create_request(requestor.id, "Market Cafe", 1000, None)
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        engine.accept_request(request.id, first.id),
        engine.accept_request(request.id, second.id)
    );
    let outcomes = [a, b];
    let winners: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    let loser = outcomes
        .iter()
        .find_map(|r| r.as_ref().err())
        .unwrap();
    assert_eq!(loser.kind(), ErrorKind::Conflict);
    assert_eq!(
        *loser,
        EngineError::Conflict("request no longer pending".to_string())
    );

    let stored = engine.fairy_request(request.id).await.unwrap();
    assert_eq!(stored.fairy_id, winners[0].fairy_id);
}

#[tokio::test]
async fn failed_debit_leaves_request_accepted() {
    let (engine, db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;
    let helper = fairy(&engine, "f1", "Fern").await;

    let request = engine
        .create_request(requestor.id, "Market Cafe", 1000, None)
        .await
        .unwrap();
    engine.accept_request(request.id, helper.id).await.unwrap();
    engine.confirm_as_fairy(request.id, helper.id).await.unwrap();

    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "DELETE FROM balances WHERE user_id = ?",
        vec![helper.id.into()],
    ))
    .await
    .unwrap();

    let err = engine
        .confirm_and_rate_as_requestor(request.id, requestor.id, 5, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let stored = engine.fairy_request(request.id).await.unwrap();
    assert_eq!(stored.status, FairyRequestStatus::Accepted);
    assert!(!stored.requestor_confirmed);
    assert_eq!(stored.rating, None);
    assert_eq!(
        engine.list_transactions(helper.id, None, 0).await.unwrap().total,
        0
    );
}

#[tokio::test]
async fn fairy_is_set_only_while_accepted_or_completed() {
    let (engine, _db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;
    let helper = fairy(&engine, "f1", "Fern").await;

    let kept = engine
        .create_request(requestor.id, "Market Cafe", 400, None)
        .await
        .unwrap();
    let dropped = engine
        .create_request(requestor.id, "Market Cafe", 400, None)
        .await
        .unwrap();
    engine.accept_request(kept.id, helper.id).await.unwrap();
    engine.cancel_request(dropped.id, requestor.id).await.unwrap();
    engine.confirm_as_fairy(kept.id, helper.id).await.unwrap();
    engine
        .confirm_and_rate_as_requestor(kept.id, requestor.id, 3, None)
        .await
        .unwrap();

    for request in engine.list_my_requests(requestor.id).await.unwrap() {
        let has_fairy = request.fairy_id.is_some();
        let expected = matches!(
            request.status,
            FairyRequestStatus::Accepted | FairyRequestStatus::Completed
        );
        assert_eq!(has_fairy, expected, "{:?}", request.status);
    }
}

#[tokio::test]
async fn request_listings() {
    let (engine, _db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;
    let helper = fairy(&engine, "f1", "Fern").await;

    let small = engine
        .create_request(requestor.id, "Market Cafe", 300, None)
        .await
        .unwrap();
    let big = engine
        .create_request(requestor.id, "Market Cafe", 3000, None)
        .await
        .unwrap();
    let own = engine
        .create_request(helper.id, "Market Cafe", 100, None)
        .await
        .unwrap();

    let pending = engine.list_pending_requests(helper.id, None).await.unwrap();
    let ids: Vec<_> = pending.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![small.id, big.id]);
    assert!(!ids.contains(&own.id));

    let capped = engine
        .list_pending_requests(helper.id, Some(1000))
        .await
        .unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].id, small.id);

    let mine = engine.list_my_requests(requestor.id).await.unwrap();
    assert_eq!(mine.first().map(|r| r.id), Some(big.id));

    engine.accept_request(small.id, helper.id).await.unwrap();
    let accepted = engine.list_accepted_by_fairy(helper.id).await.unwrap();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].id, small.id);
}

#[tokio::test]
async fn bad_request_input() {
    let (engine, _db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;

    let err = engine
        .create_request(requestor.id, "Mars", 1000, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidLocation(_)));

    let err = engine
        .create_request(requestor.id, "Market Cafe", 0, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = engine.fairy_request(uuid::Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("request not exists".to_string()));
}
