//! Currency amounts as printed on order notifications.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Parse a printed amount such as `R1 205` or `R115`.
///
/// Every character that is not an ASCII digit is dropped, the decimal
/// separator included, so `"R115.50"` and `"R11550"` parse to the same
/// value. Text without digits, or with more digits than a `Decimal` can
/// hold, parses to zero.
pub fn parse_price(text: &str) -> Decimal {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&digits).unwrap_or(Decimal::ZERO)
}
