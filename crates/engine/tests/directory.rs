use engine::{ErrorKind, FairySort};

mod common;
use common::{engine_with_db, fairy, student};

#[tokio::test]
async fn first_read_creates_inactive_entry() {
    let (engine, _db) = engine_with_db().await;
    let user = student(&engine, "s1", "Sam").await;

    let status = engine.fairy_status(user.id).await.unwrap();
    assert!(!status.is_active);
    assert_eq!(status.max_transaction_minor, None);
    assert_eq!(status.stats.total_requests_fulfilled, 0);
    assert_eq!(status.stats.rating_average, None);

    // A second read finds the same row.
    let again = engine.fairy_status(user.id).await.unwrap();
    assert_eq!(again.updated_at, status.updated_at);
}

#[tokio::test]
async fn toggle_upserts_status_and_ceiling() {
    let (engine, _db) = engine_with_db().await;
    let user = student(&engine, "s1", "Sam").await;

    let on = engine
        .set_fairy_status(user.id, true, Some(2_500))
        .await
        .unwrap();
    assert!(on.is_active);
    assert_eq!(on.max_transaction_minor, Some(2_500));

    let off = engine.set_fairy_status(user.id, false, None).await.unwrap();
    assert!(!off.is_active);
    assert_eq!(off.max_transaction_minor, None);

    let err = engine
        .set_fairy_status(uuid::Uuid::new_v4(), true, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn active_fairies_sorted_and_paged() {
    let (engine, _db) = engine_with_db().await;
    let requestor = student(&engine, "r1", "Riley").await;
    let ada = fairy(&engine, "f1", "Ada").await;
    let bea = fairy(&engine, "f2", "Bea").await;
    let cy = fairy(&engine, "f3", "Cy").await;
    let idle = student(&engine, "i1", "Ivy").await;
    engine.set_fairy_status(idle.id, false, None).await.unwrap();

    // Bea helps twice (small, rated 3), Cy once (large, rated 5).
    for (helper, amount, rating) in [(&bea, 200, 3), (&bea, 300, 3), (&cy, 2_000, 5)] {
        let request = engine
            .create_request(requestor.id, "Market Cafe", amount, None)
            .await
            .unwrap();
        engine.accept_request(request.id, helper.id).await.unwrap();
        engine.confirm_as_fairy(request.id, helper.id).await.unwrap();
        engine
            .confirm_and_rate_as_requestor(request.id, requestor.id, rating, None)
            .await
            .unwrap();
    }

    let names = |fairies: &engine::ActiveFairies| {
        fairies
            .fairies
            .iter()
            .map(|f| f.name.clone())
            .collect::<Vec<_>>()
    };

    let by_rating = engine
        .list_active_fairies(None, 0, FairySort::Rating)
        .await
        .unwrap();
    assert_eq!(by_rating.total, 3);
    assert_eq!(names(&by_rating), ["Cy", "Bea", "Ada"]);

    let by_count = engine
        .list_active_fairies(None, 0, FairySort::Count)
        .await
        .unwrap();
    assert_eq!(names(&by_count), ["Bea", "Cy", "Ada"]);
    assert_eq!(by_count.fairies[0].stats.total_helped_minor, 500);
    assert_eq!(by_count.fairies[0].stats.rating_count, 2);

    let by_amount = engine
        .list_active_fairies(Some(1), 1, FairySort::Amount)
        .await
        .unwrap();
    assert_eq!(by_amount.total, 3);
    assert_eq!(names(&by_amount), ["Bea"]);

    assert_eq!(ada.name, "Ada");
}
