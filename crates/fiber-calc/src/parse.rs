//! Form field parsing
//!
//! Calculator forms submit free text. A field is read by skipping leading
//! whitespace and taking the longest numeric prefix, so `"1.5 mm"` reads as
//! 1.5 and `".5"` as 0.5. Anything without a leading number is unparsed.
//! Only finite values count as parsed.

use crate::{CalcError, Result};

/// Parse the numeric prefix of a form field.
pub fn parse_number(field: &str) -> Option<f64> {
    let text = field.trim_start();
    let end = numeric_prefix_len(text);
    if end == 0 {
        return None;
    }

    text[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a field, substituting 0 when it has no numeric prefix.
pub fn parse_or_zero(field: &str) -> f64 {
    parse_number(field).unwrap_or(0.0)
}

/// Parse every field of a form, failing with `NotANumber` if any is unparsed.
///
/// `label` names the whole group the way the form's message does
/// (e.g. `"n1 and n2"`).
pub fn parse_required<const N: usize>(fields: [&str; N], label: &'static str) -> Result<[f64; N]> {
    let mut values = [0.0; N];
    for (slot, field) in values.iter_mut().zip(fields) {
        *slot = parse_number(field).ok_or(CalcError::NotANumber(label))?;
    }
    Ok(values)
}

/// Length in bytes of the longest `[+-]digits[.digits][e[+-]digits]` prefix.
///
/// Returns 0 when no mantissa digit is present.
fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        mantissa_digits += j - frac_start;
        if mantissa_digits > 0 {
            i = j;
        }
    }

    if mantissa_digits == 0 {
        return 0;
    }

    // Exponent only counts when at least one digit follows it
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    i
}
