//! Consumers of engine output.

use std::sync::Arc;

use crate::{Alert, Route};

/// Receives alerts from the monitor.
///
/// Called from the monitor's session tasks; implementations must not block
/// for long.
pub trait AlertSink: Send + Sync {
    /// Take ownership of `alert`.
    fn publish(&self, alert: Alert);
}

impl<T: AlertSink + ?Sized> AlertSink for Arc<T> {
    fn publish(&self, alert: Alert) {
        (**self).publish(alert);
    }
}

/// Presents a finished route to a user.
pub trait DisplayConsumer {
    /// Failure type of the presentation channel.
    type Error;

    /// Present `route`.
    fn display(&mut self, route: &Route) -> Result<(), Self::Error>;
}
