use payqueue::domain::order::OrderStatus;
use payqueue::domain::ports::OrderStore;
use payqueue::error::OrderError;

mod common;
use common::{Harness, TERMINAL_X, TERMINAL_Y, new_order};

#[tokio::test]
async fn test_expired_active_promotes_queued_on_read() {
    let h = Harness::new();

    let a = h.engine.create(TERMINAL_X, new_order("10.00")).await.unwrap();
    assert_eq!(a.status, OrderStatus::Active);

    let b = h.engine.create(TERMINAL_X, new_order("20.00")).await.unwrap();
    assert_eq!(b.status, OrderStatus::Queued);
    assert!(b.expires_at.is_none());

    h.advance_secs(121);
    let current = h.engine.current(TERMINAL_X).await.unwrap();

    assert_eq!(current.order.id, b.id);
    assert_eq!(current.order.status, OrderStatus::Active);
    assert_eq!(current.order.amount.display(), "20.00");
    assert_eq!(
        current.order.expires_at,
        Some(h.clock_now() + chrono::Duration::seconds(120))
    );
    assert_eq!(current.expires_in_ms, 120_000);
    assert_eq!(current.terminal.merchant_name, "Acme Coffee");

    let a = h.store.get(a.id).await.unwrap().unwrap();
    assert_eq!(a.status, OrderStatus::Expired);
    assert!(a.expires_at.is_none());
}

#[tokio::test]
async fn test_fifo_promotion_across_expirations() {
    let h = Harness::new();
    let mut ids = Vec::new();
    for amount in ["1.00", "2.00", "3.00", "4.00"] {
        ids.push(h.engine.create(TERMINAL_X, new_order(amount)).await.unwrap().id);
    }

    let mut promoted = vec![h.engine.current(TERMINAL_X).await.unwrap().order.id];
    for _ in 0..3 {
        h.advance_secs(121);
        promoted.push(h.engine.current(TERMINAL_X).await.unwrap().order.id);
    }
    assert_eq!(promoted, ids);

    h.advance_secs(121);
    assert!(matches!(
        h.engine.current(TERMINAL_X).await,
        Err(OrderError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_ttl_arithmetic() {
    let h = Harness::new();
    let order = h.engine.create(TERMINAL_X, new_order("5.00")).await.unwrap();
    let expires_at = order.expires_at.unwrap();
    let drift = (expires_at - (order.created_at + chrono::Duration::milliseconds(120_000)))
        .num_milliseconds()
        .abs();
    assert!(drift <= 2000);
}

#[tokio::test]
async fn test_repeated_reads_are_idempotent() {
    let h = Harness::new();
    h.engine.create(TERMINAL_X, new_order("1.00")).await.unwrap();
    h.engine.create(TERMINAL_X, new_order("2.00")).await.unwrap();

    let first = h.engine.current(TERMINAL_X).await.unwrap();
    let second = h.engine.current(TERMINAL_X).await.unwrap();
    assert_eq!(first.order, second.order);

    let queued = h
        .store
        .find_by_terminal_and_status(TERMINAL_X, OrderStatus::Queued)
        .await
        .unwrap();
    assert_eq!(queued.len(), 1, "no second promotion happened");
}

#[tokio::test]
async fn test_terminals_are_independent_queues() {
    let h = Harness::new();
    let x = h.engine.create(TERMINAL_X, new_order("1.00")).await.unwrap();
    let y = h.engine.create(TERMINAL_Y, new_order("2.00")).await.unwrap();
    assert_eq!(x.status, OrderStatus::Active);
    assert_eq!(y.status, OrderStatus::Active);
    assert_eq!(y.branch_id, "branch-2");
}

#[tokio::test]
async fn test_in_progress_and_completed_are_not_current() {
    let h = Harness::new();
    let a = h.engine.create(TERMINAL_X, new_order("1.00")).await.unwrap();
    h.engine.begin_processing(TERMINAL_X, a.id).await.unwrap();
    assert!(matches!(
        h.engine.current(TERMINAL_X).await,
        Err(OrderError::NotFound(_))
    ));

    h.engine.complete(a.id).await.unwrap();
    assert!(matches!(
        h.engine.current(TERMINAL_X).await,
        Err(OrderError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_completion_lets_next_order_through() {
    let h = Harness::new();
    let a = h.engine.create(TERMINAL_X, new_order("1.00")).await.unwrap();
    let b = h.engine.create(TERMINAL_X, new_order("2.00")).await.unwrap();

    h.engine.complete(a.id).await.unwrap();
    let current = h.engine.current(TERMINAL_X).await.unwrap();
    assert_eq!(current.order.id, b.id);
    assert_eq!(current.order.status, OrderStatus::Active);
}

#[tokio::test]
async fn test_cancelled_queued_order_is_skipped() {
    let h = Harness::new();
    h.engine.create(TERMINAL_X, new_order("1.00")).await.unwrap();
    let b = h.engine.create(TERMINAL_X, new_order("2.00")).await.unwrap();
    let c = h.engine.create(TERMINAL_X, new_order("3.00")).await.unwrap();

    h.engine.cancel(b.id).await.unwrap();
    h.advance_secs(121);
    assert_eq!(h.engine.current(TERMINAL_X).await.unwrap().order.id, c.id);
}

#[tokio::test]
async fn test_unknown_terminal_is_not_found() {
    let h = Harness::new();
    assert!(matches!(
        h.engine.create("pos-404", new_order("1.00")).await,
        Err(OrderError::NotFound(_))
    ));
    assert!(matches!(
        h.engine.current("pos-404").await,
        Err(OrderError::NotFound(_))
    ));
    assert!(matches!(
        h.engine.orders_for_terminal("pos-404").await,
        Err(OrderError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_history_is_never_deleted() {
    let h = Harness::new();
    let a = h.engine.create(TERMINAL_X, new_order("1.00")).await.unwrap();
    let b = h.engine.create(TERMINAL_X, new_order("2.00")).await.unwrap();
    h.engine.cancel(a.id).await.unwrap();
    h.engine.cancel(b.id).await.unwrap();

    let history = h.engine.orders_for_terminal(TERMINAL_X).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|o| o.status == OrderStatus::Cancelled));
    assert!(history.iter().all(|o| o.deactivated_at.is_some()));
}
