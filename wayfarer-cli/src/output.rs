//! JSON presentation of routes and alerts.

use std::io::Write;

use wayfarer_core::{Alert, DisplayConsumer, Route};

use crate::CliError;

/// [`DisplayConsumer`] printing a route as pretty JSON.
pub(crate) struct JsonDisplay<W> {
    writer: W,
}

impl<W: Write> JsonDisplay<W> {
    pub(crate) const fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> DisplayConsumer for JsonDisplay<W> {
    type Error = CliError;

    fn display(&mut self, route: &Route) -> Result<(), CliError> {
        let payload = serde_json::to_string_pretty(route).map_err(CliError::SerializeOutput)?;
        self.writer
            .write_all(payload.as_bytes())
            .map_err(CliError::WriteOutput)?;
        self.writer.write_all(b"\n").map_err(CliError::WriteOutput)
    }
}

/// Write `alert` as a single JSON line.
pub(crate) fn write_alert(writer: &mut dyn Write, alert: &Alert) -> Result<(), CliError> {
    let line = serde_json::to_string(alert).map_err(CliError::SerializeOutput)?;
    writeln!(writer, "{line}").map_err(CliError::WriteOutput)?;
    writer.flush().map_err(CliError::WriteOutput)
}
