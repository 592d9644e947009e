//! Relay behaviour against an in-process WebSocket server

use biblioteca_events::{
    Event, EventBus, EventHandlerError, EventLevel, LoanEventType, LoanPayload, Subscription,
    SystemPayload,
};
use biblioteca_realtime::{
    RealtimeError, RealtimeMessage, RealtimeRelay, ReadyState, RelayConfig, RelayStatus,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    (listener, url)
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();
    accept_async(stream).await.unwrap()
}

async fn send_json(ws: &mut WebSocketStream<TcpStream>, value: serde_json::Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

async fn drain(mut ws: WebSocketStream<TcpStream>) {
    while let Some(Ok(_)) = ws.next().await {}
}

fn forward(bus: &EventBus, event_type: &str) -> (Subscription, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sub = bus.subscribe(event_type, move |e: &Event| {
        tx.send(e.clone())
            .map_err(|e| EventHandlerError::HandlerFailed(e.to_string()))
    });
    (sub, rx)
}

fn fast(url: String) -> RelayConfig {
    RelayConfig::new(url)
        .reconnect_interval(Duration::from_millis(20))
        .connect_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn routes_server_frames_into_bus() {
    let (listener, url) = listen().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        ws.send(Message::Text("not json".into())).await.unwrap();
        send_json(
            &mut ws,
            json!({"type": "LOAN_CREATED", "payload": {"loanId": 7, "userId": 1, "bookId": 2}, "timestamp": 1, "id": "srv-1"}),
        )
        .await;
        send_json(
            &mut ws,
            json!({"type": "SYSTEM_WARNING", "payload": {"message": "disk low", "level": "warning"}, "timestamp": 2, "id": "srv-2"}),
        )
        .await;
        drain(ws).await;
    });

    let bus = EventBus::new();
    let (_loan_sub, mut loans) = forward(&bus, "LOAN_CREATED");
    let (_warn_sub, mut warnings) = forward(&bus, "SYSTEM_WARNING");

    let relay = RealtimeRelay::new(fast(url), bus.clone());
    relay.connect().await.unwrap();

    let loan = timeout(WAIT, loans.recv()).await.unwrap().unwrap();
    assert_eq!(loan.payload_as::<LoanPayload>().unwrap().loan_id, Some(7));
    assert!(loan.id.starts_with("evt_"));

    let warning = timeout(WAIT, warnings.recv()).await.unwrap().unwrap();
    let payload: SystemPayload = warning.payload_as().unwrap();
    assert_eq!(payload.message, "disk low");
    assert_eq!(payload.level, EventLevel::Warning);

    // the unparseable frame did not close the connection
    assert!(relay.is_connected());
    assert_eq!(relay.ready_state(), ReadyState::Open);

    relay.disconnect().await;
    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn send_stamps_frames_and_local_subscribers_see_replies() {
    let (listener, url) = listen().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let received = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    break serde_json::from_str::<RealtimeMessage>(text.as_str()).unwrap();
                }
                Some(Ok(_)) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        };
        send_json(
            &mut ws,
            json!({"type": "LOAN_RETURNED", "payload": {"loanId": 3}, "timestamp": 5, "id": "srv-3"}),
        )
        .await;
        drain(ws).await;
        received
    });

    let bus = EventBus::new();
    let relay = RealtimeRelay::new(fast(url), bus);

    assert!(relay.send("LOAN_CREATED", json!({})).is_none());
    assert_eq!(relay.ready_state(), ReadyState::Closed);

    relay.connect().await.unwrap();
    relay.connect().await.unwrap();

    let (tx, mut replies) = mpsc::unbounded_channel();
    let _local = relay.subscribe("LOAN_RETURNED", move |message: &RealtimeMessage| {
        let _ = tx.send(message.clone());
    });
    assert_eq!(relay.subscriber_count("LOAN_RETURNED"), 1);

    let sent = relay
        .send_loan_event(
            LoanEventType::Created,
            &LoanPayload {
                loan_id: Some(3),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(sent.id.starts_with("ws_"));

    let reply = timeout(WAIT, replies.recv()).await.unwrap().unwrap();
    assert_eq!(reply.payload["loanId"], 3);

    relay.disconnect().await;
    assert_eq!(relay.status(), RelayStatus::Disconnected);
    assert_eq!(relay.subscriber_count("LOAN_RETURNED"), 0);
    assert!(relay.send_system_event("bye", EventLevel::Info, None).is_none());

    let received = timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(received, sent);
}

#[tokio::test]
async fn gives_up_after_max_attempts_and_resumes_on_connect() {
    let refused = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let bus = EventBus::new();
    let (_errors_sub, mut errors) = forward(&bus, "SYSTEM_ERROR");

    let relay = RealtimeRelay::new(
        fast(format!("ws://{refused}")).max_reconnect_attempts(2),
        bus.clone(),
    );
    let mut status = relay.watch_status();

    assert!(relay.connect().await.is_err());
    timeout(WAIT, status.wait_for(|s| *s == RelayStatus::Exhausted))
        .await
        .unwrap()
        .unwrap();

    // first attempt plus two reconnects, then one terminal event
    let mut messages = Vec::new();
    for _ in 0..4 {
        let event = timeout(WAIT, errors.recv()).await.unwrap().unwrap();
        messages.push(event.payload_as::<SystemPayload>().unwrap());
    }
    for failure in &messages[..3] {
        assert_eq!(failure.message, "WebSocket connection error");
    }
    assert_eq!(messages[3].data.as_ref().unwrap()["attempts"], 2);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(errors.try_recv().is_err());
    assert_eq!(relay.status(), RelayStatus::Exhausted);

    let (listener, url) = listen().await;
    let server = tokio::spawn(async move { drain(accept(&listener).await).await });

    relay.update_config(|config| config.url = url);
    relay.connect().await.unwrap();
    assert!(relay.is_connected());

    relay.disconnect().await;
    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn reconnects_after_server_closes() {
    let (listener, url) = listen().await;
    let server = tokio::spawn(async move {
        let mut first = accept(&listener).await;
        first.close(None).await.unwrap();

        let mut second = accept(&listener).await;
        send_json(
            &mut second,
            json!({"type": "LOAN_ANALYSIS_COMPLETED", "payload": {"metrics": {"processed": 4, "errors": 0, "batch": 1}}, "timestamp": 9, "id": "srv-9"}),
        )
        .await;
        drain(second).await;
    });

    let bus = EventBus::new();
    let (_sub, mut analysis) = forward(&bus, "LOAN_ANALYSIS_COMPLETED");

    let relay = RealtimeRelay::new(fast(url), bus);
    relay.connect().await.unwrap();

    let event = timeout(WAIT, analysis.recv()).await.unwrap().unwrap();
    let payload: LoanPayload = event.payload_as().unwrap();
    assert_eq!(payload.metrics.unwrap().processed, 4);

    relay.disconnect().await;
    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn concurrent_connects_share_one_attempt() {
    let (listener, url) = listen().await;
    let server = tokio::spawn(async move {
        drain(accept(&listener).await).await;
        // a second socket would still be queued on the listener
        timeout(Duration::from_millis(200), listener.accept()).await.is_err()
    });

    let relay = RealtimeRelay::new(fast(url), EventBus::new());
    let (first, second) = tokio::join!(relay.connect(), relay.connect());

    first.unwrap();
    second.unwrap();
    assert!(relay.is_connected());

    relay.disconnect().await;
    let single_socket = timeout(WAIT, server).await.unwrap().unwrap();
    assert!(single_socket);
}

#[tokio::test]
async fn connect_joining_a_failed_attempt_reports_the_failure() {
    let refused = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let relay = RealtimeRelay::new(
        fast(format!("ws://{refused}")).max_reconnect_attempts(0),
        EventBus::new(),
    );
    let (first, second) = tokio::join!(relay.connect(), relay.connect());

    assert!(!matches!(first, Err(RealtimeError::Cancelled)));
    assert!(first.is_err());
    assert!(matches!(
        second,
        Err(RealtimeError::AttemptFailed(RelayStatus::Exhausted))
    ));
}
