//! Event Bus implementation

use crate::config::{EventBusConfig, EventBusConfigUpdate};
use crate::event::{
    EntityAction, EntityKind, Event, EventHandler, EventHandlerError, EventLevel, LoanEventType,
    LoanPayload, NewEvent, SystemPayload,
};
use crate::metrics::{MetricsStream, SystemMetrics, WindowTally};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

type Registry = DashMap<String, Vec<Arc<Subscriber>>>;

struct Subscriber {
    id: u64,
    handler: Arc<dyn EventHandler>,
    active: AtomicBool,
}

impl Subscriber {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Event bus for in-process event publishing and handling
///
/// Publishing never blocks: events are queued to a dispatcher task which
/// delivers each one to the subscribers of its type immediately, in publish
/// order, and accounts the outcome into the current batch window. A window
/// lasts `buffer_time`; with a non-zero `batch_size` it also closes once that
/// many events have been accounted. Closing a non-empty window publishes a
/// new [`SystemMetrics`] snapshot.
///
/// Clones share the same dispatcher. The dispatcher stops once every clone
/// has been dropped.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    tx: mpsc::UnboundedSender<Event>,
    registry: Arc<Registry>,
    config: Arc<RwLock<EventBusConfig>>,
    metrics: Arc<watch::Sender<SystemMetrics>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create new event bus
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create event bus with custom config
    pub fn with_config(config: EventBusConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = Arc::new(Registry::new());
        let config = Arc::new(RwLock::new(config));
        let (metrics, _) = watch::channel(SystemMetrics::new());
        let metrics = Arc::new(metrics);

        let dispatcher = Dispatcher {
            rx,
            registry: registry.clone(),
            config: config.clone(),
            metrics: metrics.clone(),
        };
        tokio::spawn(dispatcher.run());

        Self {
            inner: Arc::new(BusInner {
                tx,
                registry,
                config,
                metrics,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Start building a bus
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::new()
    }

    /// Publish an event
    ///
    /// Assigns the id and timestamp and returns the stamped event. Delivery
    /// happens on the dispatcher task, so subscribers have not necessarily
    /// run when this returns.
    pub fn publish(&self, event: NewEvent) -> Event {
        let event = event.stamp();
        debug!(event_type = %event.event_type, id = %event.id, "Publishing event");

        if self.inner.tx.send(event.clone()).is_err() {
            warn!(event_type = %event.event_type, "Event bus dispatcher has stopped; event dropped");
        }
        event
    }

    /// Publish a `SYSTEM_*` event whose type follows `level`.
    pub fn publish_system(
        &self,
        message: impl Into<String>,
        level: EventLevel,
        data: Option<Value>,
    ) -> Event {
        self.publish(NewEvent::system(&SystemPayload::new(message, level, data)))
    }

    /// Publish a `LOAN_*` event.
    pub fn publish_loan(&self, kind: LoanEventType, payload: &LoanPayload) -> Event {
        self.publish(NewEvent::loan(kind, payload))
    }

    /// Publish a `<KIND>_<ACTION>` entity event.
    pub fn publish_entity(&self, kind: EntityKind, action: EntityAction, payload: Value) -> Event {
        self.publish(NewEvent::entity(kind, action, payload))
    }

    /// Subscribe a closure to an event type
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let subscription = bus.subscribe("LOAN_CREATED", |event: &Event| {
    ///     println!("loan created: {}", event.payload);
    ///     Ok(())
    /// });
    /// ```
    pub fn subscribe<F>(&self, event_type: impl AsRef<str>, callback: F) -> Subscription
    where
        F: Fn(&Event) -> Result<(), EventHandlerError> + Send + Sync + 'static,
    {
        self.subscribe_handler(event_type, callback)
    }

    /// Subscribe a handler to an event type
    ///
    /// The handler receives every event of exactly this type published after
    /// this call, until the returned [`Subscription`] is dropped.
    pub fn subscribe_handler<H>(&self, event_type: impl AsRef<str>, handler: H) -> Subscription
    where
        H: EventHandler + 'static,
    {
        let event_type = event_type.as_ref().to_string();
        let subscriber = Arc::new(Subscriber {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            handler: Arc::new(handler),
            active: AtomicBool::new(true),
        });

        self.inner
            .registry
            .entry(event_type.clone())
            .or_default()
            .push(subscriber.clone());

        debug!(event_type = %event_type, subscriber = subscriber.id, "Subscribed handler");

        Subscription {
            event_type,
            subscriber,
            registry: Arc::downgrade(&self.inner.registry),
        }
    }

    /// Remove every subscriber of every type
    pub fn unsubscribe_all(&self) {
        for entry in self.inner.registry.iter() {
            entry.value().iter().for_each(|s| s.deactivate());
        }
        self.inner.registry.clear();
        info!("Cleared all event subscribers");
    }

    /// Number of live subscribers for an event type
    pub fn subscriber_count(&self, event_type: impl AsRef<str>) -> usize {
        self.inner
            .registry
            .get(event_type.as_ref())
            .map(|subs| subs.iter().filter(|s| s.is_active()).count())
            .unwrap_or(0)
    }

    /// Live metrics, starting at the current snapshot
    pub fn metrics(&self) -> MetricsStream {
        MetricsStream::new(self.inner.metrics.subscribe())
    }

    /// Latest metrics snapshot
    pub fn current_metrics(&self) -> SystemMetrics {
        *self.inner.metrics.borrow()
    }

    /// Current configuration
    pub fn config(&self) -> EventBusConfig {
        self.inner.config.read().clone()
    }

    /// Merge a partial update into the configuration
    ///
    /// Takes effect from the next batch window. Returns the merged config.
    pub fn update_config(&self, update: EventBusConfigUpdate) -> EventBusConfig {
        let mut config = self.inner.config.write();
        config.apply(update);
        info!(?config, "Event bus configuration updated");
        config.clone()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one subscriber
///
/// Dropping it, or calling [`Subscription::unsubscribe`], removes the
/// subscriber. Events not yet delivered to it are skipped.
#[must_use = "dropping a Subscription unsubscribes it"]
pub struct Subscription {
    event_type: String,
    subscriber: Arc<Subscriber>,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Event type this subscription listens to
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Whether the subscriber still receives events
    pub fn is_active(&self) -> bool {
        self.subscriber.is_active()
    }

    /// Stop receiving events
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.subscriber.deactivate();

        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if let Some(mut subs) = registry.get_mut(&self.event_type) {
            subs.retain(|s| !Arc::ptr_eq(s, &self.subscriber));
        }
        registry.remove_if(&self.event_type, |_, subs| subs.is_empty());

        debug!(
            event_type = %self.event_type,
            subscriber = self.subscriber.id,
            "Unsubscribed handler"
        );
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event_type", &self.event_type)
            .field("id", &self.subscriber.id)
            .field("active", &self.is_active())
            .finish()
    }
}

struct Dispatcher {
    rx: mpsc::UnboundedReceiver<Event>,
    registry: Arc<Registry>,
    config: Arc<RwLock<EventBusConfig>>,
    metrics: Arc<watch::Sender<SystemMetrics>>,
}

impl Dispatcher {
    async fn run(mut self) {
        let mut window = WindowTally::default();
        let (mut deadline, mut cap) = self.open_window();

        loop {
            tokio::select! {
                received = self.rx.recv() => {
                    let Some(event) = received else {
                        self.close_window(&mut window);
                        break;
                    };

                    window.record(self.dispatch(&event));

                    if cap > 0 && window.len() >= cap as u64 {
                        self.close_window(&mut window);
                        (deadline, cap) = self.open_window();
                    }
                }
                _ = sleep_until(deadline) => {
                    self.close_window(&mut window);
                    (deadline, cap) = self.open_window();
                }
            }
        }

        debug!("Event bus dispatcher stopped");
    }

    /// Deadline and event cap of the window starting now. Both stay fixed
    /// until that window closes.
    fn open_window(&self) -> (Instant, usize) {
        let config = self.config.read();
        (Instant::now() + config.window(), config.batch_size)
    }

    /// Deliver to every active subscriber; `true` when none of them failed.
    fn dispatch(&self, event: &Event) -> bool {
        let subscribers = match self.registry.get(&event.event_type) {
            Some(subs) => subs.value().clone(),
            None => return true,
        };

        let mut succeeded = true;
        for subscriber in subscribers.iter().filter(|s| s.is_active()) {
            match catch_unwind(AssertUnwindSafe(|| subscriber.handler.handle(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(event_type = %event.event_type, id = %event.id, "Handler failed: {}", e);
                    succeeded = false;
                }
                Err(_) => {
                    error!(event_type = %event.event_type, id = %event.id, "Handler panicked");
                    succeeded = false;
                }
            }
        }
        succeeded
    }

    fn close_window(&self, window: &mut WindowTally) {
        if window.is_empty() {
            return;
        }
        let tally = std::mem::take(window);
        self.metrics.send_modify(|metrics| *metrics = metrics.absorb(&tally));
        debug!(
            processed = tally.processed,
            errors = tally.errors,
            "Batch window closed"
        );
    }
}

/// Event bus builder
pub struct EventBusBuilder {
    config: EventBusConfig,
}

impl EventBusBuilder {
    /// Create new event bus builder
    pub fn new() -> Self {
        Self {
            config: EventBusConfig::default(),
        }
    }

    /// Events per window before it closes early (0 disables the cap)
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Batch window length
    pub fn buffer_time(mut self, buffer_time: Duration) -> Self {
        self.config.buffer_time = buffer_time;
        self
    }

    /// Per-attempt timeout for wrapped calls
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Retries for wrapped calls
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Build the event bus
    pub fn build(self) -> EventBus {
        EventBus::with_config(self.config)
    }
}

impl Default for EventBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}
