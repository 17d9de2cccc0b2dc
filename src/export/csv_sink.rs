//! CSV export under a timestamped file name.
//!
//! Text has no cell formats, so dates and ratios are written already
//! formatted; the discount is rounded here rather than only displayed so.

use std::fs;
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use csv::WriterBuilder;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::info;

use crate::config::{ExportConfig, ExportFormat};
use crate::error::ExportError;
use crate::export::{DATE_FORMAT, DISCOUNT_DECIMALS, OutputSheet, SpreadsheetSink};
use crate::orders::OutputRow;

/// Writes `<dir>/<prefix>_<timestamp>.csv`, one file per run.
pub struct CsvSheetSink {
    config: ExportConfig,
    run_started: NaiveDateTime,
}

impl CsvSheetSink {
    /// Sink stamped with the current local time.
    pub fn new(config: ExportConfig) -> Self {
        Self::with_timestamp(config, Local::now().naive_local())
    }

    pub fn with_timestamp(config: ExportConfig, run_started: NaiveDateTime) -> Self {
        Self {
            config: ExportConfig {
                format: ExportFormat::Csv,
                ..config
            },
            run_started,
        }
    }

    /// Where this run's file goes.
    pub fn file_path(&self) -> PathBuf {
        self.config.file_path(self.run_started)
    }
}

/// `dd/mm/yyyy`, or empty for an unknown date.
pub fn format_date(date: Option<NaiveDateTime>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Two decimals, half away from zero.
pub fn format_discount(ratio: Decimal) -> String {
    let rounded =
        ratio.round_dp_with_strategy(DISCOUNT_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

fn record(row: &OutputRow) -> [String; 5] {
    [
        format_date(row.date),
        row.product.clone(),
        row.customer.clone(),
        format_discount(row.discount_ratio),
        row.payment_method.clone(),
    ]
}

impl SpreadsheetSink for CsvSheetSink {
    fn write_sheet(&mut self, sheet: &OutputSheet) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.config.dir).map_err(|source| ExportError::CreateDir {
            path: self.config.dir.display().to_string(),
            source,
        })?;

        let path = self.file_path();
        let mut writer = WriterBuilder::new().has_headers(false).from_path(&path)?;
        writer.write_record(sheet.header())?;
        for row in sheet.rows() {
            writer.write_record(record(row))?;
        }
        writer.flush()?;

        info!(path = %path.display(), rows = sheet.len(), "Export written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 3)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap()
    }

    fn config(dir: PathBuf) -> ExportConfig {
        ExportConfig {
            dir,
            ..ExportConfig::default()
        }
    }

    // ── Formatting ──────────────────────────────────────────────────

    #[test]
    fn date_is_day_month_year() {
        assert_eq!(format_date(Some(stamp())), "03/06/2025");
        assert_eq!(format_date(None), "");
    }

    #[test]
    fn discount_has_two_decimals() {
        assert_eq!(format_discount(dec!(0.1)), "0.10");
        assert_eq!(format_discount(Decimal::ZERO), "0.00");
        assert_eq!(format_discount(dec!(1) / dec!(3)), "0.33");
        assert_eq!(format_discount(dec!(0.125)), "0.13");
        assert_eq!(format_discount(dec!(2)), "2.00");
    }

    // ── File ────────────────────────────────────────────────────────

    #[test]
    fn file_name_carries_run_timestamp() {
        let sink = CsvSheetSink::with_timestamp(config(PathBuf::from("exports")), stamp());
        assert_eq!(
            sink.file_path(),
            PathBuf::from("exports/PayfastOrders_2025-06-03_07-08-09.csv")
        );
    }

    #[test]
    fn writes_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let export_dir = dir.path().join("exports");
        let mut sink = CsvSheetSink::with_timestamp(config(export_dir.clone()), stamp());

        let mut sheet = OutputSheet::new();
        sheet.append(vec![OutputRow {
            date: Some(stamp()),
            product: "Math, Gr.10".into(),
            customer: "Jane Doe".into(),
            discount_ratio: dec!(0.1),
            payment_method: "PF".into(),
        }]);

        let path = sink.write_sheet(&sheet).unwrap();
        assert!(path.starts_with(&export_dir));

        let written = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "Date,Product,Customer,Discount,Payment Method");
        assert_eq!(lines[1], "03/06/2025,\"Math, Gr.10\",Jane Doe,0.10,PF");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn empty_sheet_still_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSheetSink::with_timestamp(config(dir.path().to_path_buf()), stamp());
        let path = sink.write_sheet(&OutputSheet::new()).unwrap();
        let written = fs::read_to_string(path).unwrap();
        assert_eq!(written.trim_end(), "Date,Product,Customer,Discount,Payment Method");
    }
}
