//! Display formatting for amounts.

/// Format an amount as `<CUR> <grouped amount>`.
///
/// Whole amounts print without decimals (`PKR 2,000`), fractional ones
/// with exactly two (`PKR 1,234.50`).
pub fn format_amount(currency: &str, amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{} {}", currency, amount);
    }

    // Kept in f64: integer casts saturate long before f64::MAX
    let cents = (amount.abs() * 100.0).round();
    let whole = (cents / 100.0).trunc();
    let frac = (cents - whole * 100.0).round().clamp(0.0, 99.0) as u8;
    let sign = if amount < 0.0 && cents > 0.0 { "-" } else { "" };

    let grouped = group_thousands(&format!("{:.0}", whole));
    if frac == 0 {
        format!("{} {}{}", currency, sign, grouped)
    } else {
        format!("{} {}{}.{:02}", currency, sign, grouped, frac)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
