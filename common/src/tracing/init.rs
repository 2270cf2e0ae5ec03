use crate::error::{IntelliSqlError, Result};
use opentelemetry::{trace::TracerProvider as _, KeyValue};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::env;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// where (and whether) spans are exported
#[derive(Debug, Clone, Default)]
pub struct TelemetrySettings {
    pub enabled: bool,
    pub endpoint: Option<String>,
}

impl TelemetrySettings {
    pub fn from_env() -> Self {
        let enabled = env::var("INTELLISQL_ENABLE_TRACING")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        let endpoint = env::var("PHOENIX_COLLECTOR_ENDPOINT")
            .or_else(|_| env::var("OTEL_EXPORTER_OTLP_ENDPOINT"))
            .ok()
            .filter(|s| !s.is_empty());

        Self { enabled, endpoint }
    }

    fn export_endpoint(&self) -> Option<&str> {
        if self.enabled {
            self.endpoint.as_deref()
        } else {
            None
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes")
}

pub struct OtelGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("error shutting down tracer provider: {}", e);
            }
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
}

/// Batch span export over otlp/grpc. The exporter's channel runs on the
/// ambient tokio runtime, which must have worker threads free while the
/// provider shuts down.
fn build_provider(service_name: &str, endpoint: &str) -> Result<SdkTracerProvider> {
    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| IntelliSqlError::Tracing(format!("exporter build failed: {}", e)))?;

    let resource = Resource::builder_empty()
        .with_attribute(KeyValue::new("service.name", service_name.to_string()))
        .build();

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

/// Install the global subscriber. Log lines go to stderr so query output on
/// stdout can be piped.
pub fn init_tracing(service_name: &str, telemetry: &TelemetrySettings) -> Result<OtelGuard> {
    let Some(endpoint) = telemetry.export_endpoint() else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .finish()
            .try_init()
            .map_err(|e| IntelliSqlError::Tracing(e.to_string()))?;

        tracing::debug!("console logging initialized (service={})", service_name);
        return Ok(OtelGuard {
            tracer_provider: None,
        });
    };

    let provider = build_provider(service_name, endpoint)?;

    let telemetry_layer =
        tracing_opentelemetry::layer().with_tracer(provider.tracer(service_name.to_string()));

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter())
        .try_init()
        .map_err(|e| IntelliSqlError::Tracing(e.to_string()))?;

    tracing::info!(
        "opentelemetry export enabled for {} (endpoint: {})",
        service_name,
        endpoint
    );

    Ok(OtelGuard {
        tracer_provider: Some(provider),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn test_export_requires_flag_and_endpoint() {
        let off = TelemetrySettings {
            enabled: false,
            endpoint: Some("http://localhost:4317".to_string()),
        };
        assert!(off.export_endpoint().is_none());

        let no_endpoint = TelemetrySettings {
            enabled: true,
            endpoint: None,
        };
        assert!(no_endpoint.export_endpoint().is_none());

        let on = TelemetrySettings {
            enabled: true,
            endpoint: Some("http://localhost:4317".to_string()),
        };
        assert_eq!(on.export_endpoint(), Some("http://localhost:4317"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_guard_drop_does_not_stall_on_dead_endpoint() {
        use opentelemetry::trace::{Tracer as _, TracerProvider as _};
        use std::time::{Duration, Instant};

        let provider = build_provider("test", "http://127.0.0.1:4399").unwrap();
        provider.tracer("test").in_span("pending", |_| {});

        let started = Instant::now();
        drop(OtelGuard {
            tracer_provider: Some(provider),
        });
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_init_tracing_console_only() {
        // a second global init in the same test binary is reported, not a panic
        let first = init_tracing("test", &TelemetrySettings::default());
        let second = init_tracing("test", &TelemetrySettings::default());
        assert!(first.is_ok() || second.is_err());
    }
}
