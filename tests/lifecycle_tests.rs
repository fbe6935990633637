use payqueue::domain::order::OrderStatus;
use payqueue::error::OrderError;
use uuid::Uuid;

mod common;
use common::{Harness, TERMINAL_X, TERMINAL_Y, new_order};

#[tokio::test]
async fn test_begin_processing_on_queued_is_invalid() {
    let h = Harness::new();
    h.engine.create(TERMINAL_X, new_order("1.00")).await.unwrap();
    let queued = h.engine.create(TERMINAL_X, new_order("2.00")).await.unwrap();

    let result = h.engine.begin_processing(TERMINAL_X, queued.id).await;
    assert!(matches!(
        result,
        Err(OrderError::InvalidTransition {
            status: OrderStatus::Queued,
            ..
        })
    ));
}

#[tokio::test]
async fn test_begin_processing_on_expired_active_expires_it() {
    let h = Harness::new();
    let a = h.engine.create(TERMINAL_X, new_order("1.00")).await.unwrap();
    let b = h.engine.create(TERMINAL_X, new_order("2.00")).await.unwrap();
    h.advance_secs(121);

    let result = h.engine.begin_processing(TERMINAL_X, a.id).await;
    assert!(matches!(
        result,
        Err(OrderError::InvalidTransition {
            status: OrderStatus::Expired,
            ..
        })
    ));
    assert_eq!(h.engine.get(a.id).await.unwrap().status, OrderStatus::Expired);
    assert_eq!(h.engine.get(b.id).await.unwrap().status, OrderStatus::Active);
}

#[tokio::test]
async fn test_begin_processing_checks_terminal() {
    let h = Harness::new();
    let a = h.engine.create(TERMINAL_X, new_order("1.00")).await.unwrap();

    assert!(matches!(
        h.engine.begin_processing(TERMINAL_Y, a.id).await,
        Err(OrderError::NotFound(_))
    ));
    assert!(matches!(
        h.engine.begin_processing(TERMINAL_X, Uuid::now_v7()).await,
        Err(OrderError::NotFound(_))
    ));

    let started = h.engine.begin_processing(TERMINAL_X, a.id).await.unwrap();
    assert_eq!(started.status, OrderStatus::InProgress);
    assert!(started.expires_at.is_none());
}

#[tokio::test]
async fn test_complete_from_in_progress_and_queued() {
    let h = Harness::new();
    let a = h.engine.create(TERMINAL_X, new_order("1.00")).await.unwrap();
    let b = h.engine.create(TERMINAL_X, new_order("2.00")).await.unwrap();

    h.engine.begin_processing(TERMINAL_X, a.id).await.unwrap();
    let a = h.engine.complete(a.id).await.unwrap();
    assert_eq!(a.status, OrderStatus::Completed);
    assert!(a.completed_at.is_some());

    let b = h.engine.complete(b.id).await.unwrap();
    assert_eq!(b.status, OrderStatus::Completed);
}

#[tokio::test]
async fn test_final_states_reject_transitions() {
    let h = Harness::new();
    let completed = h.engine.create(TERMINAL_X, new_order("1.00")).await.unwrap();
    h.engine.complete(completed.id).await.unwrap();

    let cancelled = h.engine.create(TERMINAL_X, new_order("2.00")).await.unwrap();
    h.engine.cancel(cancelled.id).await.unwrap();

    let expired = h.engine.create(TERMINAL_Y, new_order("3.00")).await.unwrap();
    h.advance_secs(121);
    h.engine.sweeper().sweep().await.unwrap();

    for (order_id, terminal, status) in [
        (completed.id, TERMINAL_X, OrderStatus::Completed),
        (cancelled.id, TERMINAL_X, OrderStatus::Cancelled),
        (expired.id, TERMINAL_Y, OrderStatus::Expired),
    ] {
        let is_refused = |r: Result<_, OrderError>| {
            matches!(r, Err(OrderError::InvalidTransition { status: s, .. }) if s == status)
        };
        assert!(is_refused(h.engine.complete(order_id).await));
        assert!(is_refused(h.engine.cancel(order_id).await));
        assert!(is_refused(h.engine.begin_processing(terminal, order_id).await));
        assert_eq!(h.engine.get(order_id).await.unwrap().status, status);
    }
}

#[tokio::test]
async fn test_cancel_in_progress_is_invalid() {
    let h = Harness::new();
    let a = h.engine.create(TERMINAL_X, new_order("1.00")).await.unwrap();
    h.engine.begin_processing(TERMINAL_X, a.id).await.unwrap();

    assert!(matches!(
        h.engine.cancel(a.id).await,
        Err(OrderError::InvalidTransition {
            status: OrderStatus::InProgress,
            ..
        })
    ));
}

#[tokio::test]
async fn test_complete_unswept_stale_active_settles() {
    let h = Harness::new();
    let a = h.engine.create(TERMINAL_X, new_order("3.00")).await.unwrap();
    h.advance_secs(121);

    let a = h.engine.complete(a.id).await.unwrap();
    assert_eq!(a.status, OrderStatus::Completed);
    assert!(a.expires_at.is_none());
    assert_eq!(h.notifier.requests().len(), 1);
}
