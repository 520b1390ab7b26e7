use crate::field_type::FieldType;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt::Write;

/// An optional adjustment applied to a value between reading it from the
/// source document and writing it into the result.
///
/// On the wire a transformation is an object tagged by `type`:
///
/// ```
/// use json_mapper::Transformation;
/// use serde_json::json;
///
/// let t: Transformation = serde_json::from_value(json!({
///     "type": "convert",
///     "converter": { "name": "toNumber" },
/// })).unwrap();
///
/// assert_eq!(json!(42), t.apply(json!("42")).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Transformation {
    /// Passes the value through unchanged.
    Direct,

    /// Reserved for format-string based reformatting. Currently passes the
    /// value through unchanged; use [`Converter::FormatDate`] to reformat dates.
    Format {
        #[serde(default, rename = "formatString", skip_serializing_if = "Option::is_none")]
        format_string: Option<String>,
    },

    /// Runs a named converter over the value.
    ///
    /// `customFunction` is accepted so that rules written for free-form code
    /// still parse, but such code is never executed: the rule fails with
    /// [`TransformError::CustomFunction`].
    Convert {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        converter: Option<Converter>,

        #[serde(default, rename = "customFunction", skip_serializing_if = "Option::is_none")]
        custom_function: Option<String>,
    },

    /// Anything that does not parse as one of the above, kept verbatim.
    ///
    /// A missing or unknown `type` passes the value through unchanged. A
    /// known `type` with malformed settings fails with
    /// [`TransformError::Malformed`].
    #[serde(untagged)]
    Unspecified(Value),
}

/// The closed set of value conversions a rule may request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum Converter {
    /// Numbers pass through, numeric strings are parsed, booleans become 1 or
    /// 0.
    ToNumber,

    /// Strings pass through, `null` becomes `""`, other scalars are rendered,
    /// and arrays and objects become compact JSON text.
    ToString,

    /// Booleans pass through, `"true"` and `"false"` are parsed ignoring case,
    /// and numbers are true when non-zero.
    ToBoolean,

    /// Parses a date string and renders it with the `to` format.
    ///
    /// Without `from` the input must be RFC 3339. With `from` the input is
    /// parsed as a date-time in that format, falling back to a plain date.
    /// Formats use `chrono`'s strftime syntax.
    FormatDate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        to: String,
    },

    /// Looks the value's text up in `values`, falling back to `default`.
    ConstantMap {
        values: Map<String, Value>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
    },

    /// A converter that is not recognised, kept verbatim. Applying it fails
    /// with [`TransformError::UnknownConverter`].
    #[serde(untagged)]
    Unrecognized(Value),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("cannot convert {found} to {target}")]
    Unconvertible {
        found: FieldType,
        target: &'static str,
    },

    #[error("{value:?} is not a date matching {format}")]
    UnparseableDate { value: String, format: String },

    #[error("invalid date format {0:?}")]
    InvalidDateFormat(String),

    #[error("no constant mapping for {0:?} and no default")]
    Unmapped(String),

    #[error("custom functions are not executed; use a named converter instead")]
    CustomFunction,

    #[error("unknown converter {0}")]
    UnknownConverter(String),

    #[error("malformed {0:?} transformation")]
    Malformed(String),
}

impl Transformation {
    pub fn apply(&self, value: Value) -> Result<Value, TransformError> {
        match self {
            Transformation::Direct | Transformation::Format { .. } => Ok(value),
            Transformation::Convert {
                custom_function: Some(_),
                ..
            } => Err(TransformError::CustomFunction),
            Transformation::Convert {
                converter: Some(converter),
                ..
            } => converter.apply(value),
            Transformation::Convert { .. } => Ok(value),
            Transformation::Unspecified(raw) => match raw.get("type").and_then(Value::as_str) {
                Some(kind @ ("direct" | "format" | "convert")) => {
                    Err(TransformError::Malformed(kind.to_owned()))
                }
                kind => {
                    tracing::debug!(?kind, "passing value through unrecognised transformation");
                    Ok(value)
                }
            },
        }
    }
}

impl Converter {
    pub fn apply(&self, value: Value) -> Result<Value, TransformError> {
        match self {
            Converter::ToNumber => to_number(value),
            Converter::ToString => Ok(Value::String(text_of(value))),
            Converter::ToBoolean => to_boolean(value),
            Converter::FormatDate { from, to } => format_date(value, from.as_deref(), to),
            Converter::ConstantMap { values, default } => {
                let key = text_of(value);
                values
                    .get(&key)
                    .or(default.as_ref())
                    .cloned()
                    .ok_or(TransformError::Unmapped(key))
            }
            Converter::Unrecognized(raw) => Err(TransformError::UnknownConverter(
                raw.get("name")
                    .and_then(Value::as_str)
                    .map_or_else(|| raw.to_string(), |name| format!("{:?}", name)),
            )),
        }
    }
}

fn unconvertible(value: &Value, target: &'static str) -> TransformError {
    TransformError::Unconvertible {
        found: FieldType::of(value),
        target,
    }
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn to_number(value: Value) -> Result<Value, TransformError> {
    match &value {
        Value::Number(_) => Ok(value),
        Value::Bool(b) => Ok(Value::from(if *b { 1 } else { 0 })),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return Ok(Value::from(n));
            }

            s.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| unconvertible(&value, "number"))
        }
        _ => Err(unconvertible(&value, "number")),
    }
}

fn to_boolean(value: Value) -> Result<Value, TransformError> {
    match &value {
        Value::Bool(_) => Ok(value),
        Value::Number(n) => Ok(Value::Bool(n.as_f64().map_or(false, |n| n != 0.0))),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        _ => Err(unconvertible(&value, "boolean")),
    }
}

fn format_date(value: Value, from: Option<&str>, to: &str) -> Result<Value, TransformError> {
    let s = match &value {
        Value::String(s) => s.as_str(),
        _ => return Err(unconvertible(&value, "date")),
    };

    let unparseable = || TransformError::UnparseableDate {
        value: s.to_owned(),
        format: from.unwrap_or("RFC 3339").to_owned(),
    };

    let parsed = match from {
        None => DateTime::parse_from_rfc3339(s)
            .map_err(|_| unparseable())?
            .naive_local(),
        Some(from) => NaiveDateTime::parse_from_str(s, from)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, from)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(unparseable)?,
    };

    // An unknown specifier only surfaces as a fmt::Error while rendering.
    let mut out = String::new();
    write!(out, "{}", parsed.format(to))
        .map_err(|_| TransformError::InvalidDateFormat(to.to_owned()))?;

    Ok(Value::String(out))
}
