use rust_decimal::{Decimal, RoundingStrategy};

/// Renders `amount` with thousands separators and at most two decimals,
/// e.g. `1,050,000.5 EGP`.
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let rounded = amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction} {currency}"),
        None => format!("{sign}{grouped} {currency}"),
    }
}

/// Like [`format_money`] but never shows a negative balance; overpaid
/// amounts read as zero. The stored value is not touched.
pub fn format_outstanding(amount: Decimal, currency: &str) -> String {
    format_money(amount.max(Decimal::ZERO), currency)
}
