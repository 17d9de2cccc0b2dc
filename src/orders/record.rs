//! Output rows built from an extracted order.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::orders::bundle::{BundleCatalog, collapse};
use crate::orders::types::OrderExtraction;

/// Payment method recorded for every order from this gateway.
pub const PAYMENT_METHOD_TAG: &str = "PF";

/// One exported row: a retained line item of one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    /// Email date, `None` when the header did not parse.
    pub date: Option<NaiveDateTime>,
    pub product: String,
    pub customer: String,
    /// Discount over subtotal, unrounded and unclamped.
    pub discount_ratio: Decimal,
    pub payment_method: String,
}

/// `discount / subtotal`, or zero for a zero subtotal.
///
/// No clamping: a malformed pair may land outside `[0, 1]`.
pub fn discount_ratio(discount: Decimal, subtotal: Decimal) -> Decimal {
    if subtotal.is_zero() {
        return Decimal::ZERO;
    }
    discount.checked_div(subtotal).unwrap_or(Decimal::ZERO)
}

/// Turn one extraction into rows, preserving line-item order.
pub fn build(
    extraction: OrderExtraction,
    date: Option<NaiveDateTime>,
    catalog: &BundleCatalog,
) -> Vec<OutputRow> {
    let ratio = discount_ratio(extraction.discount, extraction.subtotal);
    let customer = extraction.customer;

    collapse(extraction.items, catalog)
        .into_iter()
        .map(|item| OutputRow {
            date,
            product: item.product_name,
            customer: customer.clone(),
            discount_ratio: ratio,
            payment_method: PAYMENT_METHOD_TAG.to_string(),
        })
        .collect()
}
