use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntGauge, Opts, Registry, TextEncoder};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
};
use tracing::{debug, instrument};

/// Global singleton for the `Metrics` instance.
pub static METRICS: Lazy<Arc<Mutex<Option<Metrics>>>> = Lazy::new(|| Arc::new(Mutex::new(None)));

/// Metrics struct to manage the pipeline and egress gauges.
#[derive(Debug, Clone)]
pub struct Metrics {
    registry: Registry,
    common_labels: Arc<RwLock<Vec<(String, String)>>>, // Switched to RwLock for read-heavy workloads
    custom_gauges: Arc<Mutex<HashMap<String, IntGauge>>>, // Store custom gauges by name
}

pub struct MetricsBuilder {
    common_labels: Vec<(String, String)>,
}

impl MetricsBuilder {
    /// Create a new `MetricsBuilder`.
    #[instrument(skip_all)]
    pub fn new() -> Self {
        Self { common_labels: Vec::new() }
    }

    /// Add a common label to be applied to all metrics.
    #[instrument(skip_all)]
    pub fn add_label(mut self, key: &str, value: &str) -> Self {
        self.common_labels.push((key.to_string(), value.to_string()));
        self
    }

    /// Build the Metrics struct and register it as the global instance.
    #[instrument(skip_all)]
    pub fn build(self) -> Metrics {
        let metrics = self.build_instance();

        let mut metrics_guard = METRICS.lock().unwrap();
        // Register the instance
        if metrics_guard.is_some() {
            panic!("Metrics instance already initialized.");
        }

        *metrics_guard = Some(metrics);

        // Now return the instance
        (*metrics_guard.as_ref().unwrap()).clone()
    }

    fn build_instance(self) -> Metrics {
        let registry = Registry::new();

        debug!("Metrics successfully built");

        Metrics {
            registry,
            common_labels: Arc::new(RwLock::new(self.common_labels)),
            custom_gauges: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Helper to create metric options with labels.
    #[instrument(skip_all)]
    fn opts_with_labels(name: &str, help: &str, labels: &[(String, String)]) -> Opts {
        let mut opts = Opts::new(name, help);
        for (key, value) in labels {
            opts = opts.const_label(key.clone(), value.clone());
        }
        opts
    }
}

/// Retrieve the global Metrics instance.
#[instrument(skip_all)]
pub fn get_metrics() -> Metrics {
    let metrics_guard = METRICS.lock().unwrap();
    if let Some(ref metrics) = *metrics_guard {
        return metrics.clone();
    }

    panic!("Metrics instance not initialized. Create a MetricsBuilder and call build().");
}

impl Metrics {
    /// Add or get a custom gauge by name.
    #[instrument(skip_all)]
    pub fn get_or_create_gauge(&self, name: &str, description: &str) -> Result<IntGauge, String> {
        let mut gauges = self
            .custom_gauges
            .lock()
            .map_err(|_| "Failed to lock custom gauges".to_string())?;
        if let Some(gauge) = gauges.get(name) {
            return Ok(gauge.clone());
        }

        let labels = self
            .common_labels
            .read()
            .map_err(|_| "Failed to lock common labels".to_string())?;
        let opts = MetricsBuilder::opts_with_labels(name, description, &labels);
        let gauge =
            IntGauge::with_opts(opts).map_err(|e| format!("Failed to create gauge: {}", e))?;
        self.registry
            .register(Box::new(gauge.clone()))
            .map_err(|e| format!("Failed to register gauge: {}", e))?;
        gauges.insert(name.to_string(), gauge.clone());
        Ok(gauge)
    }

    /// Get the Prometheus registry.
    #[instrument(skip_all)]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Handler function for the /metrics endpoint.
pub async fn metrics_handler() -> Result<String, StatusCode> {
    let registry = {
        let metrics = get_metrics();
        metrics.registry().clone()
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    // Handle encoding errors gracefully
    if encoder.encode(&registry.gather(), &mut buffer).is_err() {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    // Handle UTF-8 conversion errors gracefully
    match String::from_utf8(buffer) {
        Ok(metrics) => Ok(metrics),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Tests share one process-wide registry, so initialize it at most once.
#[cfg(test)]
pub fn init_test_metrics() {
    let mut metrics_guard = METRICS.lock().unwrap();
    if metrics_guard.is_none() {
        *metrics_guard = Some(MetricsBuilder::new().add_label("mode", "test").build_instance());
    }
}
