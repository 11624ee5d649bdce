use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Thread-safe metrics collector for the exchange connector.
#[derive(Debug)]
pub struct ConnectorMetrics {
    // Counters
    messages_received: AtomicU64,
    events_dispatched: AtomicU64,
    parse_errors: AtomicU64,
    websocket_errors: AtomicU64,
    auth_failures: AtomicU64,
    reconnect_attempts: AtomicU64,
    reconnect_successes: AtomicU64,
    rest_polls: AtomicU64,

    // Timestamps
    inner: RwLock<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    start_time: Instant,
    last_message_time: Option<Instant>,
    last_error_time: Option<Instant>,
}

impl Default for ConnectorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            events_dispatched: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            websocket_errors: AtomicU64::new(0),
            auth_failures: AtomicU64::new(0),
            reconnect_attempts: AtomicU64::new(0),
            reconnect_successes: AtomicU64::new(0),
            rest_polls: AtomicU64::new(0),
            inner: RwLock::new(MetricsInner {
                start_time: Instant::now(),
                last_message_time: None,
                last_error_time: None,
            }),
        }
    }

    // --- Increment methods ---

    pub fn inc_messages_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_message_time = Some(Instant::now());
    }

    pub fn inc_events_dispatched(&self) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_parse_errors(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_error_time = Some(Instant::now());
    }

    pub fn inc_websocket_errors(&self) {
        self.websocket_errors.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_error_time = Some(Instant::now());
    }

    pub fn inc_auth_failures(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_error_time = Some(Instant::now());
    }

    pub fn inc_reconnect_attempts(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reconnect_successes(&self) {
        self.reconnect_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rest_polls(&self) {
        self.rest_polls.fetch_add(1, Ordering::Relaxed);
    }

    // --- Getter methods ---

    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    pub fn events_dispatched(&self) -> u64 {
        self.events_dispatched.load(Ordering::Relaxed)
    }

    pub fn parse_errors(&self) -> u64 {
        self.parse_errors.load(Ordering::Relaxed)
    }

    pub fn websocket_errors(&self) -> u64 {
        self.websocket_errors.load(Ordering::Relaxed)
    }

    pub fn auth_failures(&self) -> u64 {
        self.auth_failures.load(Ordering::Relaxed)
    }

    pub fn reconnect_attempts(&self) -> u64 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }

    pub fn reconnect_successes(&self) -> u64 {
        self.reconnect_successes.load(Ordering::Relaxed)
    }

    pub fn rest_polls(&self) -> u64 {
        self.rest_polls.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> f64 {
        self.inner.read().start_time.elapsed().as_secs_f64()
    }

    pub fn secs_since_last_message(&self) -> Option<f64> {
        self.inner
            .read()
            .last_message_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    pub fn secs_since_last_error(&self) -> Option<f64> {
        self.inner
            .read()
            .last_error_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    /// Generate a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received(),
            events_dispatched: self.events_dispatched(),
            parse_errors: self.parse_errors(),
            websocket_errors: self.websocket_errors(),
            auth_failures: self.auth_failures(),
            reconnect_attempts: self.reconnect_attempts(),
            reconnect_successes: self.reconnect_successes(),
            rest_polls: self.rest_polls(),
            uptime_secs: self.uptime_secs(),
            secs_since_last_message: self.secs_since_last_message(),
            secs_since_last_error: self.secs_since_last_error(),
        }
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub events_dispatched: u64,
    pub parse_errors: u64,
    pub websocket_errors: u64,
    pub auth_failures: u64,
    pub reconnect_attempts: u64,
    pub reconnect_successes: u64,
    pub rest_polls: u64,
    pub uptime_secs: f64,
    pub secs_since_last_message: Option<f64>,
    pub secs_since_last_error: Option<f64>,
}

/// Health status of the connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Connector is healthy and receiving data.
    Healthy,
    /// Connector is degraded (stale user stream).
    Degraded,
    /// Connector is unhealthy (no stream data for an extended period).
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "HEALTHY"),
            HealthStatus::Degraded => write!(f, "DEGRADED"),
            HealthStatus::Unhealthy => write!(f, "UNHEALTHY"),
        }
    }
}

impl MetricsSnapshot {
    /// Threshold in seconds for considering the stream stale (degraded).
    const STALE_THRESHOLD_SECS: f64 = 60.0;
    /// Threshold in seconds for considering the connector unhealthy.
    const UNHEALTHY_THRESHOLD_SECS: f64 = 300.0;

    /// Determine the health status based on stream activity.
    pub fn health_status(&self) -> HealthStatus {
        let secs_since_message = match self.secs_since_last_message {
            Some(secs) => secs,
            None => {
                // No messages yet - if uptime is short, we're still starting up
                if self.uptime_secs < Self::STALE_THRESHOLD_SECS {
                    return HealthStatus::Healthy;
                } else if self.uptime_secs < Self::UNHEALTHY_THRESHOLD_SECS {
                    return HealthStatus::Degraded;
                } else {
                    return HealthStatus::Unhealthy;
                }
            }
        };

        if secs_since_message > Self::UNHEALTHY_THRESHOLD_SECS {
            HealthStatus::Unhealthy
        } else if secs_since_message > Self::STALE_THRESHOLD_SECS {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Connector Metrics ===")?;
        writeln!(f, "Uptime:              {:.1}s", self.uptime_secs)?;
        writeln!(f, "Messages received:   {}", self.messages_received)?;
        writeln!(f, "Events dispatched:   {}", self.events_dispatched)?;
        writeln!(f, "Parse errors:        {}", self.parse_errors)?;
        writeln!(f, "WebSocket errors:    {}", self.websocket_errors)?;
        writeln!(f, "Auth failures:       {}", self.auth_failures)?;
        writeln!(f, "Reconnect attempts:  {}", self.reconnect_attempts)?;
        writeln!(f, "Reconnect successes: {}", self.reconnect_successes)?;
        writeln!(f, "REST polls:          {}", self.rest_polls)?;
        if let Some(secs) = self.secs_since_last_message {
            writeln!(f, "Since last message:  {:.1}s", secs)?;
        }
        if let Some(secs) = self.secs_since_last_error {
            writeln!(f, "Since last error:    {:.1}s", secs)?;
        }
        Ok(())
    }
}

/// Shared handle to metrics.
pub type SharedMetrics = Arc<ConnectorMetrics>;

pub fn create_metrics() -> SharedMetrics {
    Arc::new(ConnectorMetrics::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(
        uptime_secs: f64,
        secs_since_last_message: Option<f64>,
    ) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: 0,
            events_dispatched: 0,
            parse_errors: 0,
            websocket_errors: 0,
            auth_failures: 0,
            reconnect_attempts: 0,
            reconnect_successes: 0,
            rest_polls: 0,
            uptime_secs,
            secs_since_last_message,
            secs_since_last_error: None,
        }
    }

    #[test]
    fn test_metrics_increment() {
        let metrics = ConnectorMetrics::new();

        metrics.inc_messages_received();
        metrics.inc_messages_received();
        metrics.inc_events_dispatched();
        metrics.inc_parse_errors();
        metrics.inc_rest_polls();

        assert_eq!(metrics.messages_received(), 2);
        assert_eq!(metrics.events_dispatched(), 1);
        assert_eq!(metrics.parse_errors(), 1);
        assert_eq!(metrics.rest_polls(), 1);
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = ConnectorMetrics::new();

        metrics.inc_auth_failures();
        metrics.inc_websocket_errors();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.auth_failures, 1);
        assert_eq!(snapshot.websocket_errors, 1);
        assert!(snapshot.uptime_secs >= 0.0);
    }

    #[test]
    fn test_last_message_time() {
        let metrics = ConnectorMetrics::new();

        assert!(metrics.secs_since_last_message().is_none());

        metrics.inc_messages_received();

        let secs = metrics.secs_since_last_message();
        assert!(secs.is_some());
        assert!(secs.unwrap() < 1.0);
    }

    #[test]
    fn test_health_status_healthy_with_recent_message() {
        assert_eq!(
            snapshot_with(600.0, Some(5.0)).health_status(),
            HealthStatus::Healthy
        );
    }

    #[test]
    fn test_health_status_healthy_during_startup() {
        assert_eq!(
            snapshot_with(10.0, None).health_status(),
            HealthStatus::Healthy
        );
    }

    #[test]
    fn test_health_status_degraded_stale_stream() {
        assert_eq!(
            snapshot_with(600.0, Some(120.0)).health_status(),
            HealthStatus::Degraded
        );
    }

    #[test]
    fn test_health_status_unhealthy_silent_stream() {
        assert_eq!(
            snapshot_with(600.0, Some(400.0)).health_status(),
            HealthStatus::Unhealthy
        );
    }

    #[test]
    fn test_health_status_no_messages_long_uptime() {
        assert_eq!(
            snapshot_with(120.0, None).health_status(),
            HealthStatus::Degraded
        );
        assert_eq!(
            snapshot_with(600.0, None).health_status(),
            HealthStatus::Unhealthy
        );
    }

    #[test]
    fn test_health_status_boundaries() {
        // At exactly the threshold the better status wins
        assert_eq!(
            snapshot_with(600.0, Some(60.0)).health_status(),
            HealthStatus::Healthy
        );
        assert_eq!(
            snapshot_with(600.0, Some(300.0)).health_status(),
            HealthStatus::Degraded
        );
    }
}
