//! Excel workbook export.
//!
//! Dates and discount ratios are stored as numbers; `dd/mm/yyyy` and
//! `0.00` are cell formats, so the ratio in the file is never rounded.

use std::fs;
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};
use tracing::info;

use crate::config::{ExportConfig, ExportFormat};
use crate::error::ExportError;
use crate::export::{OutputSheet, SpreadsheetSink};
use crate::orders::OutputRow;

/// Title of the single worksheet.
pub const SHEET_NAME: &str = "Payfast Orders";

/// Excel number format of the date column.
pub const DATE_CELL_FORMAT: &str = "dd/mm/yyyy";

/// Excel number format of the discount column.
pub const DISCOUNT_CELL_FORMAT: &str = "0.00";

const DATE_COL: ColNum = 0;
const PRODUCT_COL: ColNum = 1;
const CUSTOMER_COL: ColNum = 2;
const DISCOUNT_COL: ColNum = 3;
const PAYMENT_COL: ColNum = 4;

/// Writes `<dir>/<prefix>_<timestamp>.xlsx`, one file per run.
pub struct XlsxSheetSink {
    config: ExportConfig,
    run_started: NaiveDateTime,
}

impl XlsxSheetSink {
    /// Sink stamped with the current local time.
    pub fn new(config: ExportConfig) -> Self {
        Self::with_timestamp(config, Local::now().naive_local())
    }

    pub fn with_timestamp(config: ExportConfig, run_started: NaiveDateTime) -> Self {
        Self {
            config: ExportConfig {
                format: ExportFormat::Xlsx,
                ..config
            },
            run_started,
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.config.file_path(self.run_started)
    }
}

struct CellFormats {
    date: Format,
    discount: Format,
}

fn write_row(
    worksheet: &mut Worksheet,
    row_num: RowNum,
    row: &OutputRow,
    formats: &CellFormats,
) -> Result<(), XlsxError> {
    // An unparsed date leaves the cell blank.
    if let Some(date) = &row.date {
        worksheet.write_datetime_with_format(row_num, DATE_COL, date, &formats.date)?;
    }
    worksheet.write_string(row_num, PRODUCT_COL, row.product.as_str())?;
    worksheet.write_string(row_num, CUSTOMER_COL, row.customer.as_str())?;
    worksheet.write_number_with_format(
        row_num,
        DISCOUNT_COL,
        row.discount_ratio.to_f64().unwrap_or_default(),
        &formats.discount,
    )?;
    worksheet.write_string(row_num, PAYMENT_COL, row.payment_method.as_str())?;
    Ok(())
}

impl SpreadsheetSink for XlsxSheetSink {
    fn write_sheet(&mut self, sheet: &OutputSheet) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.config.dir).map_err(|source| ExportError::CreateDir {
            path: self.config.dir.display().to_string(),
            source,
        })?;

        let formats = CellFormats {
            date: Format::new().set_num_format(DATE_CELL_FORMAT),
            discount: Format::new().set_num_format(DISCOUNT_CELL_FORMAT),
        };

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, title) in (0..).zip(sheet.header()) {
            worksheet.write_string(0, col, *title)?;
        }
        for (index, row) in sheet.rows().iter().enumerate() {
            let row_num =
                RowNum::try_from(index + 1).map_err(|_| ExportError::TooManyRows(sheet.len()))?;
            write_row(worksheet, row_num, row, &formats)?;
        }

        let path = self.file_path();
        workbook.save(&path)?;

        info!(path = %path.display(), rows = sheet.len(), "Export written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, open_workbook_auto};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 3)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap()
    }

    fn sink_in(dir: PathBuf) -> XlsxSheetSink {
        XlsxSheetSink::with_timestamp(
            ExportConfig {
                dir,
                format: ExportFormat::Csv,
                ..ExportConfig::default()
            },
            stamp(),
        )
    }

    fn row(date: Option<NaiveDateTime>, ratio: rust_decimal::Decimal) -> OutputRow {
        OutputRow {
            date,
            product: "Math Gr.10 Paper".into(),
            customer: "Jane Doe".into(),
            discount_ratio: ratio,
            payment_method: "PF".into(),
        }
    }

    // ── File ────────────────────────────────────────────────────────

    #[test]
    fn file_name_is_xlsx_whatever_the_configured_format() {
        let sink = sink_in(PathBuf::from("exports"));
        assert_eq!(
            sink.file_path(),
            PathBuf::from("exports/PayfastOrders_2025-06-03_07-08-09.xlsx")
        );
    }

    // ── Cells ───────────────────────────────────────────────────────

    #[test]
    fn cells_keep_their_types() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(dir.path().join("exports"));

        let mut sheet = OutputSheet::new();
        sheet.append(vec![
            row(Some(stamp()), dec!(1) / dec!(3)),
            row(None, dec!(0)),
        ]);
        let path = sink.write_sheet(&sheet).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let rows: Vec<&[Data]> = range.rows().collect();
        assert_eq!(rows.len(), 3);

        let header: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(header, vec!["Date", "Product", "Customer", "Discount", "Payment Method"]);

        assert!(matches!(rows[1][0], Data::DateTime(_)));
        assert_eq!(rows[1][1], Data::String("Math Gr.10 Paper".into()));
        assert_eq!(rows[1][2], Data::String("Jane Doe".into()));
        match &rows[1][3] {
            Data::Float(ratio) => assert!((ratio - 1.0 / 3.0).abs() < 1e-12),
            other => panic!("discount cell is {other:?}"),
        }
        assert_eq!(rows[1][4], Data::String("PF".into()));

        assert_eq!(rows[2][0], Data::Empty);
        assert_eq!(rows[2][3], Data::Float(0.0));
    }

    #[test]
    fn empty_sheet_still_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(dir.path().to_path_buf());
        let path = sink.write_sheet(&OutputSheet::new()).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.rows().count(), 1);
    }
}
