//! Built-in Rules
//!
//! `required`, `string`, `number` and `datetime`. Apart from `required`, a
//! rule ignores empty values; pair it with `required` for mandatory fields.

use super::{RuleContext, ValidationResult};
use crate::form::FieldValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Message keys for the four ways a bounded check can fail
struct BoundMessages {
    fixed: &'static str,
    range: &'static str,
    min: &'static str,
    max: &'static str,
}

const STRING_MESSAGES: BoundMessages = BoundMessages {
    fixed: "error.string.fixedLength",
    range: "error.string.minLength-maxLength",
    min: "error.string.minLength",
    max: "error.string.maxLength",
};

const NUMBER_MESSAGES: BoundMessages = BoundMessages {
    fixed: "error.number.fixed",
    range: "error.number.min-max",
    min: "error.number.min",
    max: "error.number.max",
};

const DATETIME_MESSAGES: BoundMessages = BoundMessages {
    fixed: "error.datetime.fixed",
    range: "error.datetime.min-max",
    min: "error.datetime.min",
    max: "error.datetime.max",
};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Invalid when the (joined) value is blank
pub fn required(ctx: &RuleContext<'_>) -> ValidationResult {
    let joined = match ctx.value {
        FieldValue::Text(text) => trim_if(text, ctx.cond.trim).to_string(),
        FieldValue::List(items) => items
            .iter()
            .map(|item| trim_if(item, ctx.cond.trim))
            .collect(),
    };

    if joined.trim().is_empty() {
        ValidationResult::invalid(ctx.message("error.required", &Value::Null))
    } else {
        ValidationResult::valid()
    }
}

/// Length bounds: `{ minLength, maxLength }`
pub fn string(ctx: &RuleContext<'_>) -> ValidationResult {
    let options = ctx.options("string");
    let Some(text) = checked_text(ctx) else {
        return ValidationResult::valid();
    };

    let length = text.chars().count() as f64;
    check_bounds(
        ctx,
        options,
        length,
        option_number(options, "minLength"),
        option_number(options, "maxLength"),
        &STRING_MESSAGES,
    )
}

/// Numeric bounds: `{ min, max }`
pub fn number(ctx: &RuleContext<'_>) -> ValidationResult {
    let options = ctx.options("number");
    let Some(text) = checked_text(ctx) else {
        return ValidationResult::valid();
    };

    let Some(value) = parse_number(text) else {
        return ValidationResult::invalid(ctx.message("error.invalid", options));
    };

    check_bounds(
        ctx,
        options,
        value,
        option_number(options, "min"),
        option_number(options, "max"),
        &NUMBER_MESSAGES,
    )
}

/// Date bounds: `{ min, max }`
pub fn datetime(ctx: &RuleContext<'_>) -> ValidationResult {
    let options = ctx.options("datetime");
    let Some(text) = checked_text(ctx) else {
        return ValidationResult::valid();
    };

    let Some(value) = parse_datetime(text) else {
        return ValidationResult::invalid(ctx.message("error.invalid", options));
    };

    check_bounds(
        ctx,
        options,
        value,
        option_datetime(options, "min"),
        option_datetime(options, "max"),
        &DATETIME_MESSAGES,
    )
}

fn trim_if(text: &str, trim: bool) -> &str {
    if trim { text.trim() } else { text }
}

/// The text a bounded rule should look at; `None` means nothing to check
fn checked_text<'a>(ctx: &RuleContext<'a>) -> Option<&'a str> {
    let text = trim_if(ctx.value.as_text()?, ctx.cond.trim);
    if text.is_empty() { None } else { Some(text) }
}

fn check_bounds<T: PartialOrd>(
    ctx: &RuleContext<'_>,
    options: &Value,
    value: T,
    min: Option<T>,
    max: Option<T>,
    messages: &BoundMessages,
) -> ValidationResult {
    let below = min.as_ref().is_some_and(|min| value < *min);
    let above = max.as_ref().is_some_and(|max| value > *max);
    if !below && !above {
        return ValidationResult::valid();
    }

    let key = match (&min, &max) {
        (Some(min), Some(max)) if min == max => messages.fixed,
        (Some(_), Some(_)) => messages.range,
        (Some(_), None) => messages.min,
        _ => messages.max,
    };
    ValidationResult::invalid(ctx.message(key, options))
}

/// Parse user input as a finite number. Blank text counts as zero and hex
/// literals are accepted, the same way browsers coerce form input.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }

    let hex = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"));
    if let Some(digits) = hex {
        return u64::from_str_radix(digits, 16).ok().map(|n| n as f64);
    }

    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a calendar date or date-time
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Numeric option, declared either as a number or a numeric string
fn option_number(options: &Value, key: &str) -> Option<f64> {
    match options.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        Value::Null => None,
        other => {
            log::warn!("Ignoring non-numeric option {}={}", key, other);
            None
        }
    }
}

fn option_datetime(options: &Value, key: &str) -> Option<NaiveDateTime> {
    let raw = options.get(key)?.as_str()?;
    let parsed = parse_datetime(raw);
    if parsed.is_none() {
        log::warn!("Ignoring unparseable date option {}={}", key, raw);
    }
    parsed
}
