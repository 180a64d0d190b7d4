//! Archival of cumulative energy readouts.

use std::io::{self, Write};

use tracing::warn;

/// Receiver of per-cycle energy totals, typically a time-series store.
pub trait EnergyArchive {
    /// Records one cumulative total for a named channel.
    fn record(&mut self, channel: &str, watt_hours: u64);
}

/// Appends energy readouts as CSV rows of `channel,watt_hours`.
///
/// A write failure is logged and the row dropped; archival never blocks
/// the polling cycle.
pub struct CsvEnergyArchive<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvEnergyArchive<W> {
    pub fn new(writer: W) -> Self {
        let mut writer = csv::WriterBuilder::new().from_writer(writer);
        if let Err(e) = writer.write_record(["channel", "watt_hours"]) {
            warn!(error = %e, "energy archive header write failed");
        }
        Self { writer }
    }

    /// Flushes buffered rows and returns the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: Write> EnergyArchive for CsvEnergyArchive<W> {
    fn record(&mut self, channel: &str, watt_hours: u64) {
        let row = [channel.to_string(), watt_hours.to_string()];
        if let Err(e) = self.writer.write_record(&row) {
            warn!(channel, error = %e, "energy archive row dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_writes_header_and_rows() {
        let mut archive = CsvEnergyArchive::new(Vec::new());
        archive.record("ActiveChargeEnergy", 1500);
        archive.record("ActiveDischargeEnergy", 0);

        let bytes = archive.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "channel,watt_hours");
        assert_eq!(lines[1], "ActiveChargeEnergy,1500");
        assert_eq!(lines[2], "ActiveDischargeEnergy,0");
    }
}
