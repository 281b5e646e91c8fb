//! Tracing initialization and console rendering helpers.

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::streaming::StreamEvent;

/// Install the global tracing subscriber: `RUST_LOG`-driven filtering
/// (default `info`), compact fmt output, and span-trace capture for
/// diagnostics. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .with(ErrorLayer::default())
        .try_init();
}

/// Render a stream event as a one-line console string.
///
/// Used by CLI consumers and test output; the wire boundary uses
/// [`StreamEvent::to_json_string`] instead.
pub fn render_event(event: &StreamEvent) -> String {
    match event.attributes.get("tool").and_then(|v| v.as_str()) {
        Some(tool) => format!("[{:?}:{tool}] {}", event.kind, event.payload),
        None => format!("[{:?}] {}", event.kind, event.payload),
    }
}
