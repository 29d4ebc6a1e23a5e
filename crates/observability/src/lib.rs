//! Tracing/logging setup shared by every binary.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize process-wide tracing/logging for `service_name`.
///
/// Flattened JSON lines to stdout, with the current span's fields inlined
/// into each line; the consumer runtime opens a span per inbound message
/// carrying the topic and the propagated tenant/span headers, so every log
/// a handler writes is attributable to the message that caused it.
/// Filtering via `RUST_LOG` (default `info`). Safe to call multiple times;
/// subsequent calls are no-ops.
pub fn init(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_target(false)
                .with_current_span(true)
                .with_span_list(false),
        )
        .try_init();

    tracing::info!(service = service_name, "tracing initialised");
}
