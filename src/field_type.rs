use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The type tag attached to a [`Field`][`crate::Field`].
///
/// On the wire a type is a plain string: `string`, `number`, `boolean`,
/// `null`, `object`, `array`, or a parameterized `array<T>` where `T` is the
/// tag of the array's first element (`array<any>` for an empty array).
///
/// ```
/// use json_mapper::FieldType;
/// use serde_json::json;
///
/// assert_eq!("array<object>", FieldType::of(&json!([{ "a": 1 }])).to_string());
/// assert_eq!("array<any>", FieldType::of(&json!([])).to_string());
/// assert_eq!(FieldType::Number, "number".parse::<FieldType>().unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Null,
    Boolean,
    Number,
    String,
    Object,

    /// Only appears as the element of an empty array.
    Any,

    /// An array; `None` is the unparameterized `array` tag.
    Array(Option<Box<FieldType>>),

    /// A tag outside the vocabulary above, as supplied by a caller. Such a tag
    /// is only ever equal to itself.
    Other(String),
}

impl FieldType {
    /// Infers the tag of a JSON value. Arrays are tagged by their first element.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => FieldType::Null,
            Value::Bool(_) => FieldType::Boolean,
            Value::Number(_) => FieldType::Number,
            Value::String(_) => FieldType::String,
            Value::Object(_) => FieldType::Object,
            Value::Array(items) => FieldType::Array(Some(Box::new(
                items.first().map(FieldType::of).unwrap_or(FieldType::Any),
            ))),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, FieldType::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, FieldType::Object)
    }

    /// True for `array<object>`, the shape that becomes its own entity.
    pub fn is_record_array(&self) -> bool {
        match self {
            FieldType::Array(Some(element)) => element.is_object(),
            _ => false,
        }
    }

    /// Whether a JSON value carries this tag. The unparameterized `array`
    /// matches any array, and `any` matches everything.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::Any, _) => true,
            (FieldType::Array(None), Value::Array(_)) => true,
            (expected, value) => *expected == FieldType::of(value),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Null => f.write_str("null"),
            FieldType::Boolean => f.write_str("boolean"),
            FieldType::Number => f.write_str("number"),
            FieldType::String => f.write_str("string"),
            FieldType::Object => f.write_str("object"),
            FieldType::Any => f.write_str("any"),
            FieldType::Array(None) => f.write_str("array"),
            FieldType::Array(Some(element)) => write!(f, "array<{}>", element),
            FieldType::Other(tag) => f.write_str(tag),
        }
    }
}

impl From<&str> for FieldType {
    fn from(tag: &str) -> Self {
        match tag {
            "null" => FieldType::Null,
            "boolean" => FieldType::Boolean,
            "number" => FieldType::Number,
            "string" => FieldType::String,
            "object" => FieldType::Object,
            "any" => FieldType::Any,
            "array" => FieldType::Array(None),
            _ => match tag.strip_prefix("array<").and_then(|t| t.strip_suffix('>')) {
                Some(element) => FieldType::Array(Some(Box::new(FieldType::from(element)))),
                None => FieldType::Other(tag.to_owned()),
            },
        }
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        FieldType::from(tag.as_str())
    }
}

impl From<FieldType> for String {
    fn from(type_: FieldType) -> Self {
        type_.to_string()
    }
}

impl std::str::FromStr for FieldType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FieldType::from(s))
    }
}
