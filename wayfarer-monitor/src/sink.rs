//! Alert sink that forwards into a Tokio channel.

use log::debug;
use tokio::sync::mpsc;
use wayfarer_core::{Alert, AlertSink};

/// [`AlertSink`] feeding an unbounded channel, for hosts that consume alerts
/// asynchronously.
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    sender: mpsc::UnboundedSender<Alert>,
}

impl ChannelAlertSink {
    /// Sink and the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl AlertSink for ChannelAlertSink {
    fn publish(&self, alert: Alert) {
        if let Err(err) = self.sender.send(alert) {
            debug!("alert for route {} dropped: receiver closed", err.0.route_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use wayfarer_core::{AlertKind, AlertSeverity, RouteId};

    fn alert() -> Alert {
        Alert {
            route_id: RouteId::new("trip"),
            leg_indices: vec![0],
            kind: AlertKind::DurationIncrease,
            severity: AlertSeverity::Minor,
            message: "slower".to_owned(),
            delta: 0.5,
            timestamp: Utc::now(),
            proposals: Vec::new(),
        }
    }

    #[rstest]
    fn forwards_alerts_in_order() {
        let (sink, mut receiver) = ChannelAlertSink::channel();
        sink.publish(alert());
        sink.publish(Alert {
            severity: AlertSeverity::Major,
            ..alert()
        });
        let first = receiver.try_recv().expect("first alert");
        let second = receiver.try_recv().expect("second alert");
        assert_eq!(first.severity, AlertSeverity::Minor);
        assert_eq!(second.severity, AlertSeverity::Major);
    }

    #[rstest]
    fn closed_receiver_is_tolerated() {
        let (sink, receiver) = ChannelAlertSink::channel();
        drop(receiver);
        sink.publish(alert());
    }
}
