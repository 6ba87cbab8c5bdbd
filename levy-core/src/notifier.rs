use levy_shared::{Severity, TaxFailureEvent};
use std::sync::Arc;

/// Outbound channel for fail-open events.
///
/// Fire-and-forget: implementations must not block the caller on delivery.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: TaxFailureEvent);
}

/// Writes failure events to the tracing output, at `error` for alerts and `warn` otherwise
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: TaxFailureEvent) {
        match event.severity {
            Severity::Alert => tracing::error!(
                order_id = %event.order_id,
                failure_kind = %event.failure_kind,
                event_id = %event.event_id,
                "{}: {}",
                event.subject(),
                event.detail
            ),
            Severity::Warning => tracing::warn!(
                order_id = %event.order_id,
                failure_kind = %event.failure_kind,
                event_id = %event.event_id,
                "{}: {}",
                event.subject(),
                event.detail
            ),
        }
    }
}

/// Hands every event to each inner notifier in turn
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    targets: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new(targets: Vec<Arc<dyn Notifier>>) -> Self {
        Self { targets }
    }

    pub fn with(mut self, target: Arc<dyn Notifier>) -> Self {
        self.targets.push(target);
        self
    }
}

impl Notifier for FanoutNotifier {
    fn notify(&self, event: TaxFailureEvent) {
        for target in &self.targets {
            target.notify(event.clone());
        }
    }
}
