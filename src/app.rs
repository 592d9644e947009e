//! Application root.

use crate::alerts::AlertCenter;
use crate::error::Result;
use biblioteca_client::{CallPolicy, HttpClient, HttpClientConfig, ReactiveApi};
use biblioteca_config::AppConfig;
use biblioteca_events::EventBus;
use biblioteca_realtime::{RealtimeRelay, RelayConfig};
use std::sync::Arc;
use tracing::info;

/// Owns the event bus, REST client, wrapped API, realtime relay and alerts.
///
/// Every component is constructed once here and handed out by clone, so all
/// parts of the application publish into and read from the same bus.
/// Construction spawns the bus dispatcher and must happen inside a Tokio
/// runtime.
#[derive(Clone)]
pub struct AdminApp {
    config: Arc<AppConfig>,
    bus: EventBus,
    client: HttpClient,
    api: ReactiveApi,
    relay: RealtimeRelay,
    alerts: AlertCenter,
}

impl AdminApp {
    /// Build the application from an explicit configuration.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let bus = EventBus::builder()
            .batch_size(config.event_batch_size)
            .buffer_time(config.event_buffer_time)
            .timeout(config.event_timeout)
            .max_retries(config.event_max_retries)
            .build();

        let client = HttpClient::new(HttpClientConfig::new(config.api_url.clone()))?;

        let api = ReactiveApi::new(client.clone(), bus.clone(), CallPolicy::default());

        let relay = RealtimeRelay::new(
            RelayConfig::new(config.ws_url.clone())
                .reconnect_interval(config.ws_reconnect_interval)
                .max_reconnect_attempts(config.ws_max_reconnect_attempts)
                .connect_timeout(config.ws_timeout),
            bus.clone(),
        );

        info!(api = %config.api_url, ws = %config.ws_url, "admin app initialized");

        Ok(Self {
            config: Arc::new(config),
            bus,
            client,
            api,
            relay,
            alerts: AlertCenter::new(),
        })
    }

    /// Build the application from `.env` and `BIBLIOTECA_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::new(AppConfig::from_env()?)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    pub fn client(&self) -> HttpClient {
        self.client.clone()
    }

    pub fn api(&self) -> ReactiveApi {
        self.api.clone()
    }

    pub fn relay(&self) -> RealtimeRelay {
        self.relay.clone()
    }

    pub fn alerts(&self) -> AlertCenter {
        self.alerts.clone()
    }

    /// Open the realtime connection.
    ///
    /// A failed first attempt is returned, and the relay keeps reconnecting
    /// in the background until its attempts run out.
    pub async fn start_realtime(&self) -> Result<()> {
        self.relay.connect().await?;
        Ok(())
    }

    /// Close the realtime connection and drop all bus subscribers.
    pub async fn shutdown(&self) {
        self.relay.disconnect().await;
        self.bus.unsubscribe_all();
        info!("admin app shut down");
    }
}

impl std::fmt::Debug for AdminApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminApp")
            .field("config", &self.config)
            .field("relay_status", &self.relay.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppError;
    use std::time::Duration;

    #[tokio::test]
    async fn components_follow_configuration() {
        let config = AppConfig {
            api_url: "http://api.test:9000/api".to_string(),
            ws_url: "ws://api.test:9000".to_string(),
            event_batch_size: 25,
            event_buffer_time: Duration::from_millis(250),
            event_max_retries: 1,
            ws_max_reconnect_attempts: 2,
            ..AppConfig::default()
        };
        let app = AdminApp::new(config).unwrap();

        let bus_config = app.bus().config();
        assert_eq!(bus_config.batch_size, 25);
        assert_eq!(bus_config.buffer_time, Duration::from_millis(250));

        assert_eq!(app.api().effective_policy().max_retries, 1);
        assert_eq!(app.client().config().base_url, "http://api.test:9000/api");

        let relay = app.relay().config();
        assert_eq!(relay.url, "ws://api.test:9000");
        assert_eq!(relay.max_reconnect_attempts, 2);
        assert!(!app.relay().is_connected());
    }

    #[tokio::test]
    async fn bus_updates_reach_wrapped_calls() {
        let app = AdminApp::new(AppConfig::default()).unwrap();
        app.bus().update_config(
            biblioteca_events::EventBusConfigUpdate::default()
                .max_retries(0)
                .timeout(Duration::from_secs(2)),
        );

        let policy = app.api().effective_policy();
        assert_eq!(policy.attempts(), 1);
        assert_eq!(policy.timeout, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn clones_share_one_bus() {
        let app = AdminApp::new(AppConfig::default()).unwrap();
        let _sub = app.bus().subscribe("LOAN_CREATED", |_| Ok(()));
        assert_eq!(app.clone().bus().subscriber_count("LOAN_CREATED"), 1);

        app.shutdown().await;
        assert_eq!(app.bus().subscriber_count("LOAN_CREATED"), 0);
    }

    #[tokio::test]
    async fn invalid_configuration_is_rejected() {
        let config = AppConfig {
            ws_url: "http://not-a-socket".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(AdminApp::new(config), Err(AppError::Config(_))));
    }
}
