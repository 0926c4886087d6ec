//! Numeric literal extraction from free text.
//!
//! Lossy on purpose: dates, ids and list ordinals come back as numbers too.
//! Callers only ask "is some number near X", so false positives are tolerated.

use std::sync::LazyLock;

use regex::Regex;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?(?:[0-9]+\.[0-9]+|[0-9]+|\.[0-9]+)(?:[eE][-+]?[0-9]+)?")
        .expect("number regex")
});

/// Remove commas that sit between two digits (`1,234` -> `1234`). Commas
/// used as list separators (`1, 2`) are kept.
pub fn strip_grouping_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|&(i, &c)| {
            !(c == ','
                && i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(char::is_ascii_digit))
        })
        .map(|(_, &c)| c)
        .collect()
}

/// Every numeric literal in `text`, in order of appearance.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    let normalized = strip_grouping_commas(text);
    NUMBER_RE
        .find_iter(&normalized)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// Format `value` with `sig` significant digits, the way printf's `%g` does:
/// scientific notation for very small or large magnitudes, trailing zeros trimmed.
pub fn format_significant(value: f64, sig: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    let sig = sig.max(1);
    let scientific = format!("{:.*e}", sig - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= sig as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction_zeros(mantissa),
            exponent.abs()
        )
    } else {
        let decimals = (sig as i32 - 1 - exponent).max(0) as usize;
        trim_fraction_zeros(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
