//! Scalar coercions shared by the binder and the normalizer.

/// Boolean spelled as a string: y/yes/on/true and n/no/off/false, any case.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["y", "yes", "on", "true"];
    const FALSE: [&str; 4] = ["n", "no", "off", "false"];
    if TRUE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Some(false)
    } else {
        None
    }
}

pub(crate) fn parse_int(s: &str) -> Option<i64> {
    s.parse().ok()
}

pub(crate) fn parse_float(s: &str) -> Option<f64> {
    s.parse().ok()
}

/// Shortest decimal that reads back as the same float, never in exponent form.
pub(crate) fn format_float(f: f64) -> String {
    f.to_string()
}

/// The integer equal to `f`, if there is one.
pub(crate) fn float_to_int(f: f64) -> Option<i64> {
    // 2^63 is the first float past i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

/// The float equal to `i`, if `i` survives the conversion unchanged.
pub(crate) fn int_to_float(i: i64) -> Option<f64> {
    let f = i as f64;
    match float_to_int(f) {
        Some(back) if back == i => Some(f),
        _ => None,
    }
}
