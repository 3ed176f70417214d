//! Text helpers shared by the writers

use std::borrow::Cow;

/// Format a value as C-style scientific notation with 16 fractional digits
/// (`-1.2345678900000000e+02`). Seventeen significant digits read back to the
/// same `f64`. Negative zero is written as zero.
pub(crate) fn fmt_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let value = if value == 0.0 { 0.0 } else { value };
    let raw = format!("{value:.16e}");
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => raw,
    }
}

/// Space-separated values of one tuple
pub(crate) fn fmt_tuple(values: &[f64]) -> String {
    values
        .iter()
        .map(|&v| fmt_float(v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escape XML-reserved characters for attribute or element content
pub(crate) fn escape_xml(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Legacy array names are single tokens
pub(crate) fn legacy_name(name: &str) -> String {
    let token: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if token.is_empty() {
        "FIELD".to_string()
    } else {
        token
    }
}
