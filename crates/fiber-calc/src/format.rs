//! Display formatting for calculator readouts
//!
//! Readouts are compared as strings, so rounding must be exact: values are
//! rounded on their full decimal expansion with ties going away from zero.

/// Enough fractional digits to print any `f64` without rounding.
const EXACT_FRACTION_DIGITS: usize = 1100;

/// Above this magnitude numbers are shown in exponent form.
const EXPONENT_FORM_THRESHOLD: f64 = 1e21;

/// Fixed-point formatting with `digits` decimals.
///
/// Negative values keep their sign even when they round to zero
/// (`-0.001` → `"-0.00"`); negative zero prints unsigned.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return non_finite(value);
    }
    if value.abs() >= EXPONENT_FORM_THRESHOLD {
        return exponent_form(value);
    }

    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, value.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(digits))
        .collect();
    let round_up = frac_part.as_bytes().get(digits).is_some_and(|d| *d >= b'5');
    if round_up {
        increment_decimal(&mut kept);
    }

    let int_len = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    if value < 0.0 {
        out.push('-');
    }
    out.extend(kept[..int_len].iter().map(|b| *b as char));
    if digits > 0 {
        out.push('.');
        out.extend(kept[int_len..].iter().map(|b| *b as char));
    }
    out
}

/// [`to_fixed`] followed by shortest-form printing of the rounded number.
///
/// Trailing zeros disappear (`4.10` → `"4.1"`, `31.00` → `"31"`) and a
/// result that rounds to zero prints as `"0"`.
pub fn to_fixed_trimmed(value: f64, digits: usize) -> String {
    let fixed = to_fixed(value, digits);
    match fixed.parse::<f64>() {
        Ok(v) if !v.is_finite() => fixed,
        Ok(v) if v.abs() >= EXPONENT_FORM_THRESHOLD => exponent_form(v),
        Ok(v) if v == 0.0 => "0".to_string(),
        Ok(v) => format!("{}", v),
        Err(_) => fixed,
    }
}

/// Angle readout: two decimals and a degree sign.
pub fn degrees(value: f64) -> String {
    format!("{}°", to_fixed(value, 2))
}

fn non_finite(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value > 0.0 {
        "Infinity".to_string()
    } else {
        "-Infinity".to_string()
    }
}

/// Shortest round-trip digits with an explicitly signed exponent (`1e+30`).
fn exponent_form(value: f64) -> String {
    let raw = format!("{:e}", value);
    match raw.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => raw,
    }
}

/// Add one unit in the last place to an ASCII digit string.
fn increment_decimal(digits: &mut Vec<u8>) {
    for d in digits.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            return;
        }
    }
    digits.insert(0, b'1');
}
