//! Watch command - stream bus events and metrics to the terminal.

use biblioteca::AdminApp;
use biblioteca::events::{
    EntityAction, EntityKind, Event, EventHandlerError, LoanEventType, SystemEventType,
    SystemMetrics,
};
use biblioteca::realtime::RelayStatus;
use colored::Colorize;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::{CliError, CliResult};
use crate::output::{info, warn};

/// Every event type the admin client publishes or relays.
fn watched_types() -> Vec<String> {
    let mut types: Vec<String> = LoanEventType::ALL
        .iter()
        .map(|t| t.as_str().to_string())
        .chain(SystemEventType::ALL.iter().map(|t| t.as_str().to_string()))
        .collect();
    for kind in EntityKind::ALL {
        for action in EntityAction::ALL {
            types.push(kind.event_type(action));
        }
    }
    types
}

/// Print events and metrics until Ctrl-C or `seconds` elapse.
pub async fn run(app: &AdminApp, seconds: Option<u64>, realtime: bool) -> CliResult<()> {
    if seconds == Some(0) {
        return Err(CliError::InvalidArgument(
            "--seconds must be greater than zero".to_string(),
        ));
    }

    let bus = app.bus();
    let (tx, mut events) = mpsc::unbounded_channel::<Event>();
    let _subscriptions: Vec<_> = watched_types()
        .into_iter()
        .map(|event_type| {
            let tx = tx.clone();
            bus.subscribe(event_type, move |event: &Event| {
                tx.send(event.clone())
                    .map_err(|e| EventHandlerError::HandlerFailed(e.to_string()))
            })
        })
        .collect();
    drop(tx);

    let relay = app.relay();
    let mut status = relay.watch_status();
    if realtime {
        info(&format!("Connecting to {}", relay.config().url.cyan()));
        if let Err(e) = app.start_realtime().await {
            warn(&format!("Realtime unavailable: {e}"));
        }
    }

    let mut metrics = bus.metrics();
    let mut previous = metrics.current();

    let deadline = async {
        match seconds {
            Some(s) => tokio::time::sleep(Duration::from_secs(s)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    info("Watching events (Ctrl-C to stop)");
    println!();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = &mut deadline => break,
            Some(event) = events.recv() => print_event(&event),
            Some(snapshot) = metrics.next() => {
                print_metrics(&snapshot, &previous);
                previous = snapshot;
            }
            Ok(()) = status.changed(), if realtime => {
                let current = *status.borrow_and_update();
                print_status(&current);
            }
        }
    }

    app.shutdown().await;
    println!();
    info("Stopped");
    Ok(())
}

fn clock(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn print_event(event: &Event) {
    let label = if event.event_type.ends_with("_ERROR") {
        event.event_type.red().bold()
    } else if event.event_type.ends_with("_WARNING") {
        event.event_type.yellow().bold()
    } else if event.event_type.starts_with("LOAN_") {
        event.event_type.green().bold()
    } else {
        event.event_type.cyan()
    };
    println!(
        "  {} {} {}",
        clock(event.timestamp).dimmed(),
        label,
        event.payload.to_string().dimmed()
    );
}

fn print_metrics(current: &SystemMetrics, previous: &SystemMetrics) {
    println!(
        "  {} {} processed={} errors={} error_rate={:.1}% throughput={:.2}/s",
        clock(current.last_update).dimmed(),
        "METRICS".bright_white().bold(),
        current.processed,
        current.errors,
        current.error_rate() * 100.0,
        current.throughput_since(previous)
    );
}

fn print_status(status: &RelayStatus) {
    let text = status.to_string();
    let text = match status {
        RelayStatus::Connected => text.green(),
        RelayStatus::Exhausted | RelayStatus::Disconnected => text.red(),
        _ => text.yellow(),
    };
    println!(
        "  {} {} {}",
        "REALTIME".bright_white().bold(),
        text,
        format!("(ready state {})", status.ready_state().as_u8()).dimmed()
    );
}
