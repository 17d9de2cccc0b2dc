//! Values produced while extracting a single order notification.

use rust_decimal::Decimal;

/// Customer name used when the notification names nobody.
pub const UNKNOWN_CUSTOMER: &str = "Unknown";

/// One purchased product on an order notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product_name: String,
    pub price: Decimal,
}

impl LineItem {
    pub fn new(product_name: impl Into<String>, price: Decimal) -> Self {
        Self {
            product_name: product_name.into(),
            price,
        }
    }
}

/// Everything read out of one order notification.
///
/// `discount <= subtotal` is expected but not enforced; a malformed
/// notification can carry any pair of amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderExtraction {
    /// Customer name, or [`UNKNOWN_CUSTOMER`].
    pub customer: String,
    /// Line items in notification order.
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub discount: Decimal,
}

impl Default for OrderExtraction {
    fn default() -> Self {
        Self {
            customer: UNKNOWN_CUSTOMER.to_string(),
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            discount: Decimal::ZERO,
        }
    }
}
