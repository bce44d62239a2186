//! Number formatting for report tables.

use num_format::{Locale, ToFormattedString};

/// Formats an amount the way the finance team reads it.
///
/// Rounded to whole units with `,` thousands separators; negatives are
/// wrapped in parentheses and a missing value renders empty.
///
/// ```
/// use balrecon_render::accounting_format;
///
/// assert_eq!(accounting_format(Some(1234567.6)), "1,234,568");
/// assert_eq!(accounting_format(Some(-1234.4)), "(1,234)");
/// assert_eq!(accounting_format(None), "");
/// ```
#[must_use]
pub fn accounting_format(value: Option<f64>) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return String::new();
    };

    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_formatted_string(&Locale::en);
    if rounded < 0 {
        format!("({digits})")
    } else {
        digits
    }
}

/// Signed count of clients, e.g. `+3` or `-2`.
pub(crate) fn signed_count(value: i64) -> String {
    if value > 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}
