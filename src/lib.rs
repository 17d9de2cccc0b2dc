//! PayFast order export — order notification emails to spreadsheet rows.

pub mod config;
pub mod error;
pub mod export;
pub mod mailbox;
pub mod orders;
pub mod pipeline;
