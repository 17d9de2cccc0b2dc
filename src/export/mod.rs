//! The output sheet and the sinks that persist it.

pub mod csv_sink;
pub mod xlsx_sink;

use std::path::PathBuf;

use crate::config::{ExportConfig, ExportFormat};
use crate::error::ExportError;
use crate::orders::OutputRow;

pub use csv_sink::CsvSheetSink;
pub use xlsx_sink::XlsxSheetSink;

/// Header row of every export.
pub const HEADER: [&str; 5] = ["Date", "Product", "Customer", "Discount", "Payment Method"];

/// Date column rendering for text sinks (day/month/year).
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Decimal places of the discount column in text sinks.
pub const DISCOUNT_DECIMALS: u32 = 2;

/// Rows of one run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSheet {
    rows: Vec<OutputRow>,
}

impl OutputSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> &'static [&'static str] {
        &HEADER
    }

    /// Append one message's rows after everything appended so far.
    pub fn append(&mut self, rows: Vec<OutputRow>) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Persists a finished sheet.
pub trait SpreadsheetSink {
    /// Write header and rows; returns where the sheet went.
    fn write_sheet(&mut self, sheet: &OutputSheet) -> Result<PathBuf, ExportError>;
}

/// Sink for the configured format, stamped with the current local time.
pub fn open_sink(config: ExportConfig) -> Box<dyn SpreadsheetSink> {
    match config.format {
        ExportFormat::Xlsx => Box::new(XlsxSheetSink::new(config)),
        ExportFormat::Csv => Box::new(CsvSheetSink::new(config)),
    }
}
