//! Retry, timeout and telemetry behaviour of the reactive call wrapper

use biblioteca_client::{CallPolicy, ClientError, ReactiveCaller};
use biblioteca_events::{Event, EventBus, EventBusConfigUpdate, EventHandlerError, SystemPayload};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

struct Harness {
    bus: EventBus,
    caller: ReactiveCaller,
    info: mpsc::UnboundedReceiver<Event>,
    errors: mpsc::UnboundedReceiver<Event>,
    _subs: Vec<biblioteca_events::Subscription>,
}

impl Harness {
    fn new(policy: CallPolicy) -> Self {
        let bus = EventBus::new();
        let (info_tx, info) = mpsc::unbounded_channel();
        let (error_tx, errors) = mpsc::unbounded_channel();

        let subs = vec![
            bus.subscribe("SYSTEM_METRICS", move |e: &Event| {
                info_tx
                    .send(e.clone())
                    .map_err(|e| EventHandlerError::HandlerFailed(e.to_string()))
            }),
            bus.subscribe("SYSTEM_ERROR", move |e: &Event| {
                error_tx
                    .send(e.clone())
                    .map_err(|e| EventHandlerError::HandlerFailed(e.to_string()))
            }),
        ];

        Self {
            caller: ReactiveCaller::new(bus.clone(), policy),
            bus,
            info,
            errors,
            _subs: subs,
        }
    }

    /// Wait until everything published so far has been dispatched.
    async fn settle(&self) {
        self.bus.metrics().next().await;
    }
}

#[tokio::test(start_paused = true)]
async fn always_failing_call_makes_four_attempts() {
    let mut harness = Harness::new(CallPolicy::default());
    let attempts = AtomicU32::new(0);
    let counter = &attempts;

    let result: Result<(), ClientError> = harness
        .caller
        .call("GET_LOANS", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Connection("connection refused".into()))
        })
        .await;

    assert!(matches!(result, Err(ClientError::Connection(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 4);

    harness.settle().await;
    let event = harness.errors.try_recv().unwrap();
    let payload: SystemPayload = event.payload_as().unwrap();
    assert_eq!(payload.message, "Error in operation GET_LOANS");
    assert_eq!(payload.data.as_ref().unwrap()["operation"], "GET_LOANS");
    assert_eq!(payload.data.as_ref().unwrap()["error"], "Connection error: connection refused");

    assert!(harness.errors.try_recv().is_err());
    assert!(harness.info.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn success_on_second_attempt_publishes_one_success() {
    let mut harness = Harness::new(CallPolicy::default());
    let attempts = AtomicU32::new(0);
    let counter = &attempts;

    let value = harness
        .caller
        .call("CREATE_LOAN", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ClientError::Connection("reset".into()))
            } else {
                Ok(42)
            }
        })
        .await
        .unwrap();

    assert_eq!(value, 42);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);

    harness.settle().await;
    let event = harness.info.try_recv().unwrap();
    let payload: SystemPayload = event.payload_as().unwrap();
    assert_eq!(payload.message, "Operation CREATE_LOAN completed");
    assert!(harness.info.try_recv().is_err());
    assert!(harness.errors.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn slow_attempt_times_out() {
    let policy = CallPolicy::default()
        .timeout(Duration::from_secs(5))
        .max_retries(0);
    let mut harness = Harness::new(policy);
    let start = Instant::now();

    let result: Result<(), ClientError> = harness
        .caller
        .call("GET_BOOKS", || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(ClientError::Timeout(t)) if t == Duration::from_secs(5)));
    assert!(result.unwrap_err().is_timeout());
    assert!(start.elapsed() < Duration::from_secs(6));

    harness.settle().await;
    assert!(harness.errors.try_recv().is_ok());
}

#[tokio::test(start_paused = true)]
async fn delay_precedes_every_attempt() {
    let policy = CallPolicy::default()
        .delay(Duration::from_millis(250))
        .max_retries(2);
    let harness = Harness::new(policy);
    let start = Instant::now();

    let _ = harness
        .caller
        .call("DELETE_BOOK", || async {
            Err::<(), _>(ClientError::Connection("down".into()))
        })
        .await;

    assert!(start.elapsed() >= Duration::from_millis(750));
}

#[tokio::test(start_paused = true)]
async fn metrics_can_be_disabled_but_errors_still_report() {
    let policy = CallPolicy {
        enable_metrics: false,
        ..CallPolicy::default().max_retries(0)
    };
    let mut harness = Harness::new(policy);

    harness.caller.call("GET_USERS", || async { Ok(()) }).await.unwrap();
    let _ = harness
        .caller
        .call("GET_AUTHORS", || async {
            Err::<(), _>(ClientError::Json("unexpected token".into()))
        })
        .await;

    harness.settle().await;
    assert!(harness.info.try_recv().is_err());
    assert!(harness.errors.try_recv().is_ok());
}

#[tokio::test(start_paused = true)]
async fn policy_updates_apply_to_later_calls() {
    let harness = Harness::new(CallPolicy::default());
    harness.caller.update_policy(CallPolicy::default().max_retries(1));

    let attempts = AtomicU32::new(0);
    let counter = &attempts;
    let _ = harness
        .caller
        .call("GET_LOANS", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(ClientError::Connection("down".into()))
        })
        .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(harness.caller.policy().max_retries, Some(1));
}

#[tokio::test(start_paused = true)]
async fn bus_config_changes_reach_the_next_call() {
    let harness = Harness::new(CallPolicy::default());
    harness
        .bus
        .update_config(EventBusConfigUpdate::default().max_retries(1));

    let attempts = AtomicU32::new(0);
    let counter = &attempts;
    let _ = harness
        .caller
        .call("GET_USERS", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(ClientError::Connection("down".into()))
        })
        .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn bus_timeout_change_bounds_the_next_call() {
    let harness = Harness::new(CallPolicy::default().max_retries(0));
    harness
        .bus
        .update_config(EventBusConfigUpdate::default().timeout(Duration::from_secs(1)));

    let result: Result<(), ClientError> = harness
        .caller
        .call("GET_BOOKS", || async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(ClientError::Timeout(t)) if t == Duration::from_secs(1)));
}
