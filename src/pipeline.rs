//! Run driver: mailbox → extract → collapse → build → sheet.
//!
//! One message at a time, in mailbox order:
//! 1. `MailboxSource::fetch()`: raw bytes; a per-message failure skips it
//! 2. `RawMessage::from_rfc822()`: HTML body + `Date:` header
//! 3. `OrderPipeline::process_message()`: rows for that message
//! 4. `OutputSheet::append()` then `MailboxSource::acknowledge()`
//!
//! A fatal error mid-run (lost connection) stops the loop. Rows already
//! appended are kept; the remaining messages stay unread for the next run.

use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::error::MailboxError;
use crate::export::OutputSheet;
use crate::mailbox::{MailboxSource, RawMessage};
use crate::orders::{OutputRow, build, extract, parse_email_date};

/// Counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Unread messages listed by the source.
    pub found: usize,
    /// Messages turned into rows (possibly zero rows).
    pub processed: usize,
    /// Messages skipped because they could not be fetched.
    pub skipped: usize,
    /// Rows appended to the sheet.
    pub rows: usize,
    /// Processed messages the source refused to mark read.
    pub unacknowledged: usize,
    /// The source failed fatally before every message was handled.
    pub interrupted: bool,
}

/// Stateless order extraction with the run's configuration.
pub struct OrderPipeline {
    config: PipelineConfig,
}

impl OrderPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Rows for one message. Never fails; a message that cannot be read
    /// as an order yields default fields or no rows at all.
    pub fn process_message(&self, message: &RawMessage) -> Vec<OutputRow> {
        let date = parse_email_date(&message.header_date);
        if date.is_none() {
            debug!(header = %message.header_date, "Unparseable Date header, leaving date empty");
        }
        build(extract(&message.body), date, &self.config.bundle_catalog)
    }

    /// Drain every unread message of `source` into `sheet`.
    ///
    /// Only a failure to list unread messages is returned. Per-message
    /// failures are logged and counted; a fatal failure while draining
    /// ends the run early with `interrupted` set.
    pub fn run<S: MailboxSource + ?Sized>(
        &self,
        source: &mut S,
        sheet: &mut OutputSheet,
    ) -> Result<RunSummary, MailboxError> {
        let ids = source.unread()?;
        let mut summary = RunSummary {
            found: ids.len(),
            ..RunSummary::default()
        };
        info!(source = source.name(), count = ids.len(), "Found unread messages");

        for id in &ids {
            let raw = match source.fetch(id) {
                Ok(raw) => raw,
                Err(e) if e.is_fatal() => {
                    error!(id = %id, error = %e, "Mailbox failed, stopping run");
                    summary.interrupted = true;
                    break;
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Could not fetch message, skipping");
                    summary.skipped += 1;
                    continue;
                }
            };

            let rows = self.process_message(&RawMessage::from_rfc822(&raw));
            debug!(id = %id, rows = rows.len(), "Message processed");
            summary.rows += rows.len();
            summary.processed += 1;
            sheet.append(rows);

            if let Err(e) = source.acknowledge(id) {
                warn!(id = %id, error = %e, "Failed to mark message as read");
                summary.unacknowledged += 1;
                if e.is_fatal() {
                    error!(id = %id, error = %e, "Mailbox failed, stopping run");
                    summary.interrupted = true;
                    break;
                }
            }
        }

        info!(
            processed = summary.processed,
            skipped = summary.skipped,
            rows = summary.rows,
            interrupted = summary.interrupted,
            "Mailbox drained"
        );
        Ok(summary)
    }
}
