//! Reads customer, line items and totals out of an order notification.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::orders::document::{HtmlOrderDocument, OrderDocument, RowRole};
use crate::orders::price::parse_price;
use crate::orders::types::{LineItem, OrderExtraction, UNKNOWN_CUSTOMER};

/// Columns of an order-item row (zero-based).
const PRODUCT_COLUMN: usize = 0;
const PRICE_COLUMN: usize = 2;

fn customer_paragraph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"order from").expect("invalid customer paragraph regex"))
}

fn customer_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"order from (.+):").expect("invalid customer name regex"))
}

/// Extracts an [`OrderExtraction`] from any [`OrderDocument`].
pub struct OrderHtmlExtractor;

impl OrderHtmlExtractor {
    /// Extract from an already-queried document.
    ///
    /// Missing elements fall back to their defaults: customer
    /// `"Unknown"`, no items, zero subtotal, zero discount.
    pub fn extract_from<D: OrderDocument + ?Sized>(doc: &D) -> OrderExtraction {
        OrderExtraction {
            customer: customer(doc),
            items: line_items(doc),
            subtotal: last_cell_amount(doc, RowRole::Subtotal),
            discount: last_cell_amount(doc, RowRole::Discount),
        }
    }
}

/// Parse `html` and extract the order it describes. Never fails.
pub fn extract(html: &str) -> OrderExtraction {
    OrderHtmlExtractor::extract_from(&HtmlOrderDocument::parse(html))
}

/// Only the first plain-text paragraph mentioning an order is considered;
/// if it has no `order from <name>:` shape the customer is unknown.
fn customer<D: OrderDocument + ?Sized>(doc: &D) -> String {
    doc.first_paragraph_matching(customer_paragraph_re())
        .and_then(|text| {
            customer_name_re()
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string())
}

fn line_items<D: OrderDocument + ?Sized>(doc: &D) -> Vec<LineItem> {
    doc.rows_by_role(RowRole::OrderItem)
        .into_iter()
        .filter(|cells| cells.len() > PRICE_COLUMN)
        .map(|cells| {
            LineItem::new(
                cells[PRODUCT_COLUMN].trim(),
                parse_price(cells[PRICE_COLUMN].trim()),
            )
        })
        .collect()
}

/// Amount in the last cell of the first row with `role`, or zero.
fn last_cell_amount<D: OrderDocument + ?Sized>(doc: &D, role: RowRole) -> Decimal {
    doc.rows_by_role(role)
        .first()
        .and_then(|cells| cells.last())
        .map(|text| parse_price(text))
        .unwrap_or(Decimal::ZERO)
}
