//! Prometheus metrics for the election client.
//!
//! [`ClientMetrics`] owns a dedicated [`Registry`] so an embedding
//! application can encode it into the Prometheus text exposition format
//! alongside its own metrics.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Histogram, HistogramOpts, IntCounter, IntGauge, Opts,
    Registry,
};

pub struct ClientMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Refreshes that published a new snapshot.
    pub refreshes_succeeded: IntCounter,
    /// Refreshes that failed and left the previous snapshot in place.
    pub refreshes_failed: IntCounter,
    /// Transactions accepted by the orchestrator and handed to the provider.
    pub transactions_submitted: IntCounter,
    pub transactions_confirmed: IntCounter,
    /// Transactions that failed to send, reverted, or lost their receipt poll.
    pub transactions_failed: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Candidates in the current snapshot.
    pub candidate_count: IntGauge,
    /// Generation of the current snapshot.
    pub snapshot_generation: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time of a full refresh, in milliseconds.
    pub refresh_duration_ms: Histogram,
}

impl ClientMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let refreshes_succeeded = register_int_counter_with_registry!(
            Opts::new(
                "election_refreshes_succeeded_total",
                "Refreshes that published a new snapshot"
            ),
            registry
        )
        .expect("failed to register refreshes_succeeded counter");

        let refreshes_failed = register_int_counter_with_registry!(
            Opts::new(
                "election_refreshes_failed_total",
                "Refreshes that failed and kept the previous snapshot"
            ),
            registry
        )
        .expect("failed to register refreshes_failed counter");

        let transactions_submitted = register_int_counter_with_registry!(
            Opts::new(
                "election_transactions_submitted_total",
                "Transactions handed to the wallet provider"
            ),
            registry
        )
        .expect("failed to register transactions_submitted counter");

        let transactions_confirmed = register_int_counter_with_registry!(
            Opts::new(
                "election_transactions_confirmed_total",
                "Transactions mined with a successful receipt"
            ),
            registry
        )
        .expect("failed to register transactions_confirmed counter");

        let transactions_failed = register_int_counter_with_registry!(
            Opts::new(
                "election_transactions_failed_total",
                "Transactions that failed or reverted"
            ),
            registry
        )
        .expect("failed to register transactions_failed counter");

        let candidate_count = register_int_gauge_with_registry!(
            Opts::new(
                "election_candidate_count",
                "Candidates in the current snapshot"
            ),
            registry
        )
        .expect("failed to register candidate_count gauge");

        let snapshot_generation = register_int_gauge_with_registry!(
            Opts::new(
                "election_snapshot_generation",
                "Generation of the current snapshot"
            ),
            registry
        )
        .expect("failed to register snapshot_generation gauge");

        // 1 ms to ~16 s.
        let refresh_duration_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "election_refresh_duration_ms",
                "Full refresh time in milliseconds"
            )
            .buckets(
                prometheus::exponential_buckets(1.0, 2.0, 15)
                    .expect("valid exponential bucket parameters")
            ),
            registry
        )
        .expect("failed to register refresh_duration_ms histogram");

        Self {
            registry,
            refreshes_succeeded,
            refreshes_failed,
            transactions_submitted,
            transactions_confirmed,
            transactions_failed,
            candidate_count,
            snapshot_generation,
            refresh_duration_ms,
        }
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_metrics_are_registered() {
        let metrics = ClientMetrics::new();
        metrics.refreshes_succeeded.inc();
        metrics.refresh_duration_ms.observe(3.0);
        let names: Vec<String> = metrics
            .registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert_eq!(names.len(), 8);
        assert!(names.contains(&"election_refreshes_succeeded_total".to_string()));
        assert!(names.contains(&"election_refresh_duration_ms".to_string()));
    }

    #[test]
    fn independent_instances_do_not_collide() {
        let a = ClientMetrics::new();
        let b = ClientMetrics::new();
        a.transactions_submitted.inc();
        assert_eq!(a.transactions_submitted.get(), 1);
        assert_eq!(b.transactions_submitted.get(), 0);
    }
}
