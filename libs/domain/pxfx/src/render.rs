use crate::{pattern::FractionDigits, Ccy};

/// Render a converted amount in the fixed output convention.
///
/// Output uses space-grouped integer digits, a comma decimal separator and
/// the target currency code as suffix, independent of the separators the
/// source pattern was parsed with. The rendered form matches no source
/// currency pattern, which is what makes a second rewrite pass a no-op.
///
/// ```
/// use pxfx::pattern::FRACTION_DIGITS;
/// use pxfx::render::format_amount;
/// use pxfx::Ccy;
///
/// assert_eq!(format_amount(1234.56, Ccy::USD, FRACTION_DIGITS), "1 234,56 USD");
/// ```
pub fn format_amount(amount: f64, target: Ccy, digits: FractionDigits) -> String {
    let rendered = format!("{:.*}", digits.max as usize, amount.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));

    let mut frac = frac_part.to_owned();
    while frac.len() > digits.min as usize && frac.ends_with('0') {
        frac.pop();
    }

    let mut out = String::new();
    if amount.is_sign_negative() && rendered.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    let digits_len = int_part.len();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (digits_len - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    if !frac.is_empty() {
        out.push(',');
        out.push_str(&frac);
    }
    out.push(' ');
    out.push_str(&target.to_string());
    out
}
