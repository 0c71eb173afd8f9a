mod helpers;

use helpers::*;
use parlay_settlement::models::*;
use parlay_settlement::AppError;
use rust_decimal_macros::dec;
use tokio_test::assert_ok;
use uuid::Uuid;

#[tokio::test]
async fn test_place_wager_debits_risk() {
    let h = Harness::new().await;
    let e1 = h.single().await;
    let e2 = h.event(EventType::MultiSelectOutcome, &["X", "Y", "Z"]).await;

    let wager = h
        .wager(ALICE, &[(e1.id, "A"), (e2.id, "Z")], dec!(250), dec!(4))
        .await;

    assert_eq!(wager.status, WagerStatus::Active);
    assert_eq!(wager.payout, None);
    assert_eq!(wager.placed_at, start_time());
    assert_eq!(wager.event_ids, vec![e1.id, e2.id]);
    assert_eq!(h.balance(ALICE).await, dec!(750));
    assert_eq!(
        assert_ok!(h.state.wager_service.member_balance(h.group.id, ALICE).await),
        dec!(750)
    );
}

#[tokio::test]
async fn test_insufficient_balance() {
    let h = Harness::new().await;
    let e1 = h.single().await;

    let err = h
        .try_wager(BOB, &[(e1.id, "A")], dec!(1000.01), dec!(2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientBalance(_)));
    assert_eq!(h.balance(BOB).await, dec!(1000));

    // Exactly the full balance is allowed.
    assert_ok!(h.try_wager(BOB, &[(e1.id, "A")], dec!(1000), dec!(2)).await);
    assert_eq!(h.balance(BOB).await, dec!(0));
}

#[tokio::test]
async fn test_non_positive_amounts_rejected() {
    let h = Harness::new().await;
    let e1 = h.single().await;

    for (risk, multiplier) in [(dec!(0), dec!(2)), (dec!(-5), dec!(2)), (dec!(10), dec!(0))] {
        let err = h
            .try_wager(ALICE, &[(e1.id, "A")], risk, multiplier)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

#[tokio::test]
async fn test_malformed_picks_rejected() {
    let h = Harness::new().await;
    let e1 = h.single().await;

    let err = h.try_wager(ALICE, &[], dec!(10), dec!(2)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = h
        .try_wager(ALICE, &[(e1.id, "A"), (e1.id, "B")], dec!(10), dec!(2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = h.try_wager(ALICE, &[(e1.id, "Q")], dec!(10), dec!(2)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = h
        .try_wager(ALICE, &[(Uuid::new_v4(), "A")], dec!(10), dec!(2))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(h.balance(ALICE).await, dec!(1000));
}

#[tokio::test]
async fn test_unknown_member_rejected() {
    let h = Harness::new().await;
    let e1 = h.single().await;

    let err = h.try_wager("mallory", &[(e1.id, "A")], dec!(10), dec!(2)).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_event_from_other_group_rejected() {
    let h = Harness::new().await;
    let other = Harness::new().await;
    let foreign = other.single().await;

    // Make the foreign event visible to this harness's store.
    h.store.put_event(foreign.clone()).await;

    let err = h
        .try_wager(ALICE, &[(foreign.id, "A")], dec!(10), dec!(2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_closed_event_rejected() {
    let h = Harness::new().await;
    let e1 = h.single().await;
    let e2 = h.single().await;
    assert_ok!(h.state.event_service.update_event(e2.id, EventUpdate::close()).await);

    let err = h
        .try_wager(CAROL, &[(e1.id, "A"), (e2.id, "A")], dec!(10), dec!(2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(h.balance(CAROL).await, dec!(1000));
}

#[tokio::test]
async fn test_list_user_wagers_newest_first() {
    let h = Harness::new().await;
    let e1 = h.single().await;

    let first = h.wager(ALICE, &[(e1.id, "A")], dec!(10), dec!(2)).await;
    h.clock.advance(chrono::Duration::minutes(5));
    let second = h.wager(ALICE, &[(e1.id, "B")], dec!(10), dec!(2)).await;
    h.wager(BOB, &[(e1.id, "B")], dec!(10), dec!(2)).await;

    let wagers = assert_ok!(h.state.wager_service.list_user_wagers(ALICE).await);
    let ids: Vec<Uuid> = wagers.iter().map(|w| w.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    assert!(h.state.wager_service.get_wager(Uuid::new_v4()).await.unwrap_err().is_not_found());
}
