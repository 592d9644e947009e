//! Delivery and accounting behaviour of the event bus

use biblioteca_events::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

fn forward_to(tx: mpsc::UnboundedSender<Event>) -> impl Fn(&Event) -> Result<(), EventHandlerError> {
    move |event: &Event| {
        tx.send(event.clone())
            .map_err(|e| EventHandlerError::HandlerFailed(e.to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn five_events_in_one_window_add_five_processed() {
    let bus = EventBus::new();
    let mut metrics = bus.metrics();
    let before = metrics.current();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = bus.subscribe(LoanEventType::Created, forward_to(tx));

    for id in 0..5 {
        bus.publish_loan(
            LoanEventType::Created,
            &LoanPayload {
                loan_id: Some(id),
                ..Default::default()
            },
        );
    }

    let snapshot = metrics.next().await.unwrap();
    assert_eq!(snapshot.processed, before.processed + 5);
    assert_eq!(snapshot.errors, before.errors);

    for id in 0..5 {
        let event = rx.recv().await.unwrap();
        assert_eq!(event.payload_as::<LoanPayload>().unwrap().loan_id, Some(id));
    }
}

#[tokio::test(start_paused = true)]
async fn empty_window_publishes_nothing() {
    let bus = EventBus::new();
    let mut metrics = bus.metrics();

    let waited = tokio::time::timeout(Duration::from_secs(5), metrics.next()).await;
    assert!(waited.is_err());
    assert_eq!(bus.current_metrics().total(), 0);
}

#[tokio::test(start_paused = true)]
async fn counts_never_decrease() {
    let bus = EventBus::new();
    let mut metrics = bus.metrics();
    let _ok = bus.subscribe("BOOK_CREATED", |_: &Event| Ok(()));
    let _bad = bus.subscribe("BOOK_DELETED", |_: &Event| {
        Err(EventHandlerError::ProcessingError("rejected".into()))
    });

    let mut last = metrics.current();
    for round in 0..4 {
        for _ in 0..=round {
            bus.publish_entity(EntityKind::Book, EntityAction::Created, json!({"bookId": round}));
        }
        bus.publish_entity(EntityKind::Book, EntityAction::Deleted, json!({"bookId": round}));

        let snapshot = metrics.next().await.unwrap();
        assert!(snapshot.processed >= last.processed);
        assert!(snapshot.errors >= last.errors);
        assert!(snapshot.last_update >= last.last_update);
        last = snapshot;
    }

    assert_eq!(last.processed, 1 + 2 + 3 + 4);
    assert_eq!(last.errors, 4);
}

#[tokio::test(start_paused = true)]
async fn batch_size_closes_window_early() {
    let bus = EventBus::builder()
        .batch_size(2)
        .buffer_time(Duration::from_secs(10))
        .build();
    let mut metrics = bus.metrics();
    let start = Instant::now();

    for _ in 0..5 {
        bus.publish(NewEvent::new("SYSTEM_METRICS", json!({})));
    }

    let first = metrics.next().await.unwrap();
    assert!(first.processed >= 2);
    assert!(start.elapsed() < Duration::from_secs(10));

    let mut latest = first;
    while latest.processed < 5 {
        latest = metrics.next().await.unwrap();
    }
    assert_eq!(latest.processed, 5);
}

#[tokio::test(start_paused = true)]
async fn failing_subscriber_is_isolated() {
    let bus = EventBus::new();
    let mut metrics = bus.metrics();

    let _failing = bus.subscribe("SYSTEM_ERROR", |_: &Event| {
        Err(EventHandlerError::HandlerFailed("boom".into()))
    });
    let _panicking = bus.subscribe("SYSTEM_ERROR", |_: &Event| -> Result<(), EventHandlerError> {
        panic!("subscriber panicked")
    });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _healthy = bus.subscribe("SYSTEM_ERROR", forward_to(tx));

    for n in 0..3 {
        bus.publish_system(format!("failure {n}"), EventLevel::Error, None);
    }

    for n in 0..3 {
        let event = rx.recv().await.unwrap();
        let payload: SystemPayload = event.payload_as().unwrap();
        assert_eq!(payload.message, format!("failure {n}"));
    }

    // one error per event, however many of its subscribers failed
    let snapshot = metrics.next().await.unwrap();
    assert_eq!(snapshot.errors, 3);
    assert_eq!(snapshot.processed, 0);
}

#[tokio::test(start_paused = true)]
async fn events_reach_only_matching_subscribers_once() {
    let bus = EventBus::new();
    let mut metrics = bus.metrics();

    let (created_tx, mut created_rx) = mpsc::unbounded_channel();
    let (returned_tx, mut returned_rx) = mpsc::unbounded_channel();
    let _created = bus.subscribe(LoanEventType::Created, forward_to(created_tx));
    let _returned = bus.subscribe(LoanEventType::Returned, forward_to(returned_tx));

    let published = bus.publish_loan(LoanEventType::Returned, &LoanPayload::default());
    bus.publish(NewEvent::new("LOAN_CREATED_LATER", json!(null)));

    metrics.next().await.unwrap();

    assert_eq!(returned_rx.try_recv().unwrap(), published);
    assert!(returned_rx.try_recv().is_err());
    assert!(created_rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn unsubscribed_during_dispatch_receives_nothing() {
    let bus = EventBus::new();
    let mut metrics = bus.metrics();

    let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
    let late_calls = Arc::new(AtomicUsize::new(0));

    let remover = {
        let slot = slot.clone();
        bus.subscribe("AUTHOR_UPDATED", move |_: &Event| {
            slot.lock().unwrap().take();
            Ok(())
        })
    };
    let removed = {
        let late_calls = late_calls.clone();
        bus.subscribe("AUTHOR_UPDATED", move |_: &Event| {
            late_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    };
    *slot.lock().unwrap() = Some(removed);

    bus.publish_entity(EntityKind::Author, EntityAction::Updated, json!({"authorId": 1}));
    bus.publish_entity(EntityKind::Author, EntityAction::Updated, json!({"authorId": 1}));

    let snapshot = metrics.next().await.unwrap();
    assert_eq!(snapshot.processed, 2);
    assert_eq!(late_calls.load(Ordering::SeqCst), 0);
    assert_eq!(bus.subscriber_count("AUTHOR_UPDATED"), 1);

    remover.unsubscribe();
}

#[tokio::test(start_paused = true)]
async fn config_change_applies_to_later_windows() {
    let bus = EventBus::builder()
        .buffer_time(Duration::from_secs(60))
        .build();
    let mut metrics = bus.metrics();
    let opened = Instant::now();

    bus.publish(NewEvent::new("SYSTEM_WARNING", json!({})));
    tokio::time::sleep(Duration::from_secs(1)).await;
    bus.update_config(EventBusConfigUpdate::default().batch_size(1));
    bus.publish(NewEvent::new("SYSTEM_WARNING", json!({})));

    // the cap must not cut the window that was already open
    let early = tokio::time::timeout(Duration::from_secs(30), metrics.next()).await;
    assert!(early.is_err());

    let snapshot = metrics.next().await.unwrap();
    assert_eq!(snapshot.processed, 2);
    assert!(opened.elapsed() >= Duration::from_secs(60));

    let next_opened = Instant::now();
    bus.publish(NewEvent::new("SYSTEM_WARNING", json!({})));
    let snapshot = metrics.next().await.unwrap();
    assert_eq!(snapshot.processed, 3);
    assert!(next_opened.elapsed() < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn default_window_is_purely_timed() {
    let bus = EventBus::new();
    let mut metrics = bus.metrics();
    let opened = Instant::now();

    for _ in 0..15 {
        bus.publish(NewEvent::new("SYSTEM_METRICS", json!({})));
    }

    let snapshot = metrics.next().await.unwrap();
    assert_eq!(snapshot.processed, 15);
    assert!(opened.elapsed() >= Duration::from_secs(1));

    let second = tokio::time::timeout(Duration::from_secs(5), metrics.next()).await;
    assert!(second.is_err());
}
