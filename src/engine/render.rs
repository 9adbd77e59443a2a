//! Placeholder substitution for question, option, and explanation text.

use crate::engine::value::{Environment, Value};
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid pattern"))
}

/// Replaces `{name}` tokens with formatted variable values. Placeholders
/// without a matching variable are left verbatim so authoring gaps stay
/// visible in the output.
pub fn render_text(template: &str, env: &Environment) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match env.get(name) {
                Some(value) => format_value(value),
                None => {
                    warn!(placeholder = name, "placeholder has no matching variable");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Formats a value for display inside question text.
///
/// Floats get adaptive precision: whole numbers drop the fraction, tiny
/// magnitudes switch to scientific notation, values under one keep three
/// decimals, everything else two, with trailing zeros trimmed.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        Value::Float(v) => format_float(*v),
        Value::Text(s) => s.clone(),
        Value::List(items) => items
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Fault(fault) => format!("#{}", fault.label()),
    }
}

fn format_float(v: f64) -> String {
    if v == v.trunc() && v.abs() < i64::MAX as f64 {
        return (v as i64).to_string();
    }
    if v != 0.0 && v.abs() < 0.0001 {
        return format!("{v:.4e}");
    }
    let formatted = if v.abs() < 1.0 {
        format!("{v:.3}")
    } else {
        format!("{v:.2}")
    };
    trim_trailing_zeros(&formatted)
}

fn trim_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
