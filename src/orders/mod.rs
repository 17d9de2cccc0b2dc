//! Order extraction core.
//!
//! Turns one payment-gateway order notification into output rows:
//! 1. `extract::extract()` — customer, line items, subtotal, discount
//! 2. `bundle::collapse()` — bundle lines replace their component lines
//! 3. `record::build()` — one `OutputRow` per retained line item
//!
//! Nothing in here performs I/O or returns an error. Malformed input
//! degrades to default values.

pub mod bundle;
pub mod date;
pub mod document;
pub mod extract;
pub mod price;
pub mod record;
pub mod types;

pub use bundle::{BundleCatalog, collapse};
pub use date::parse_email_date;
pub use document::{HtmlOrderDocument, OrderDocument, RowRole};
pub use extract::{OrderHtmlExtractor, extract};
pub use price::parse_price;
pub use record::{OutputRow, PAYMENT_METHOD_TAG, build, discount_ratio};
pub use types::{LineItem, OrderExtraction, UNKNOWN_CUSTOMER};
