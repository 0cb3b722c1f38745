//! Caller-injectable diagnostics sink.

use serde_json::Value;

/// Observer for per-operation diagnostics.
///
/// Clients call this with a short context label and a JSON payload before
/// each outgoing request. The crate never owns a telemetry implementation;
/// callers route the stream to their own sink by injecting an
/// implementation through the client config.
pub trait DebugLogger: Send + Sync {
    fn debug(&self, context: &str, data: &Value);
}

/// Default sink: forwards everything to [`tracing`] at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl DebugLogger for TracingLogger {
    fn debug(&self, context: &str, data: &Value) {
        tracing::debug!(context, %data);
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl DebugLogger for NoopLogger {
    fn debug(&self, _context: &str, _data: &Value) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    struct RecordingLogger {
        entries: Mutex<Vec<String>>,
    }

    impl DebugLogger for RecordingLogger {
        fn debug(&self, context: &str, _data: &Value) {
            self.entries.lock().unwrap().push(context.to_string());
        }
    }

    #[test]
    fn custom_sink_receives_entries() {
        let logger = RecordingLogger {
            entries: Mutex::new(Vec::new()),
        };
        logger.debug("cash_in.request_pay_token", &json!({"endpoint": "x"}));

        assert_eq!(
            logger.entries.lock().unwrap().as_slice(),
            ["cash_in.request_pay_token"]
        );
    }
}
