mod helpers;

use chrono::Duration;
use helpers::*;
use parlay_settlement::models::*;
use parlay_settlement::AppError;
use rust_decimal_macros::dec;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

fn status(status: EventStatus) -> EventUpdate {
    EventUpdate {
        status: Some(status),
        ..EventUpdate::default()
    }
}

#[tokio::test]
async fn test_create_event_defaults() {
    let h = Harness::new().await;
    let event = h.single().await;

    assert_eq!(event.status, EventStatus::Open);
    assert!(event.accepting_wagers);
    assert!(event.results.is_empty());
    assert_eq!(event.lock_date, start_time() + Duration::hours(1));
    assert_eq!(event.group_id, h.group.id);

    let stored = assert_ok!(h.state.event_service.get_event(event.id).await);
    assert_eq!(stored, event);
}

#[tokio::test]
async fn test_create_event_validation() {
    let h = Harness::new().await;
    let service = &h.state.event_service;

    let err = service
        .create_event(NewEvent {
            group_id: Uuid::new_v4(),
            event_type: EventType::SingleOutcome,
            options: labels(&["A"]),
            lock_date: None,
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    for options in [labels(&[]), labels(&["A", "A"]), labels(&[" "])] {
        let err = service
            .create_event(NewEvent {
                group_id: h.group.id,
                event_type: EventType::SingleOutcome,
                options,
                lock_date: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    let err = service
        .create_event(NewEvent {
            group_id: h.group.id,
            event_type: EventType::SingleOutcome,
            options: labels(&["A", "B"]),
            lock_date: Some(start_time() - Duration::minutes(1)),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_custom_lock_date_and_other_event_type() {
    let h = Harness::new().await;
    let lock = start_time() + Duration::days(2);

    let event = assert_ok!(
        h.state
            .event_service
            .create_event(NewEvent {
                group_id: h.group.id,
                event_type: EventType::Other("over_under".into()),
                options: labels(&["over", "under"]),
                lock_date: Some(lock),
            })
            .await
    );
    assert_eq!(event.lock_date, lock);
    assert_eq!(event.event_type.as_str(), "over_under");
}

#[tokio::test]
async fn test_forward_transitions() {
    let h = Harness::new().await;
    let event = h.single().await;

    let closed = assert_ok!(h.state.event_service.update_event(event.id, EventUpdate::close()).await);
    assert_eq!(closed.event.status, EventStatus::Closed);
    assert!(!closed.event.accepting_wagers);
    assert!(closed.settlement.is_none());

    let settled = assert_ok!(h.settle(event.id, &["B"]).await);
    assert_eq!(settled.event.status, EventStatus::Settled);
    assert_eq!(settled.event.results, labels(&["B"]));
    assert!(settled.settlement.is_some());
}

#[tokio::test]
async fn test_open_settles_directly() {
    let h = Harness::new().await;
    let event = h.single().await;

    let outcome = assert_ok!(h.settle(event.id, &["A"]).await);
    assert!(!outcome.event.accepting_wagers);
    assert!(outcome.event.is_consistent());
}

#[tokio::test]
async fn test_backward_transitions_rejected() {
    let h = Harness::new().await;
    let service = &h.state.event_service;
    let event = h.single().await;

    assert_ok!(service.update_event(event.id, EventUpdate::close()).await);
    let err = service
        .update_event(event.id, status(EventStatus::Open))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    assert_ok!(h.settle(event.id, &["A"]).await);
    for target in [EventStatus::Open, EventStatus::Closed, EventStatus::Settled] {
        let err = service.update_event(event.id, status(target)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    // Results cannot be rewritten either.
    assert_err!(h.settle(event.id, &["B"]).await);
    let stored = assert_ok!(service.get_event(event.id).await);
    assert_eq!(stored.results, labels(&["A"]));
}

#[tokio::test]
async fn test_settle_requires_valid_results() {
    let h = Harness::new().await;
    let service = &h.state.event_service;
    let event = h.single().await;

    let err = service
        .update_event(event.id, status(EventStatus::Settled))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = h.settle(event.id, &[]).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = h.settle(event.id, &["Z"]).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = h.settle(event.id, &["A", "B"]).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Nothing was persisted.
    let stored = assert_ok!(service.get_event(event.id).await);
    assert_eq!(stored.status, EventStatus::Open);
    assert!(stored.results.is_empty());
}

#[tokio::test]
async fn test_results_without_settle_rejected() {
    let h = Harness::new().await;
    let event = h.single().await;

    let update = EventUpdate {
        status: Some(EventStatus::Closed),
        results: Some(labels(&["A"])),
        accepting_wagers: None,
    };
    let err = h.state.event_service.update_event(event.id, update).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let update = EventUpdate {
        results: Some(labels(&["A"])),
        ..EventUpdate::default()
    };
    assert_err!(h.state.event_service.update_event(event.id, update).await);
}

#[tokio::test]
async fn test_empty_update_rejected() {
    let h = Harness::new().await;
    let event = h.single().await;

    let err = h
        .state
        .event_service
        .update_event(event.id, EventUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_accepting_wagers_override() {
    let h = Harness::new().await;
    let service = &h.state.event_service;
    let event = h.single().await;

    let pause = EventUpdate {
        accepting_wagers: Some(false),
        ..EventUpdate::default()
    };
    let outcome = assert_ok!(service.update_event(event.id, pause).await);
    assert_eq!(outcome.event.status, EventStatus::Open);
    assert!(!outcome.event.accepting_wagers);

    let err = h.try_wager(ALICE, &[(event.id, "A")], dec!(10), dec!(2)).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    let resume = EventUpdate {
        accepting_wagers: Some(true),
        ..EventUpdate::default()
    };
    let outcome = assert_ok!(service.update_event(event.id, resume.clone()).await);
    assert!(outcome.event.accepting_wagers);

    assert_ok!(service.update_event(event.id, EventUpdate::close()).await);
    let err = service.update_event(event.id, resume).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn test_update_unknown_event() {
    let h = Harness::new().await;
    let err = h
        .state
        .event_service
        .update_event(Uuid::new_v4(), EventUpdate::close())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_group_events_only_admitting() {
    let h = Harness::new().await;
    let service = &h.state.event_service;
    let open = h.single().await;
    let closed = h.single().await;
    let settled = h.single().await;

    assert_ok!(service.update_event(closed.id, EventUpdate::close()).await);
    assert_ok!(h.settle(settled.id, &["A"]).await);

    let listed = assert_ok!(service.list_group_events(h.group.id).await);
    let ids: Vec<Uuid> = listed.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![open.id]);

    assert!(service.list_group_events(Uuid::new_v4()).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_event() {
    let h = Harness::new().await;
    let service = &h.state.event_service;
    let event = h.single().await;

    assert_ok!(service.delete_event(event.id).await);
    assert!(service.get_event(event.id).await.unwrap_err().is_not_found());
    assert!(service.delete_event(event.id).await.unwrap_err().is_not_found());
}
