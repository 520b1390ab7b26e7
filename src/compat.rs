use crate::field::Field;
use crate::field_type::FieldType;
use serde::{Deserialize, Serialize};

/// Whether a `(source, target)` pair of distinct types may be crossed with a
/// conversion.
fn convertible(source: &FieldType, target: &FieldType) -> bool {
    use FieldType::*;

    matches!(
        (source, target),
        (String, Number)
            | (Number, String)
            | (String, Boolean)
            | (Boolean, String)
            | (Object, String)
            | (String, Object)
    )
}

/// The outcome of checking whether a source field may be mapped onto a target
/// field. The verdict is advisory: the mapping engine never consults it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Decides whether values of `source`'s type can be written where `target`'s
/// type is expected.
///
/// ```
/// use json_mapper::{check, Field, FieldType, Path};
///
/// let field = |t: &str| Field::new(&Path::root(), FieldType::from(t));
///
/// let verdict = check(&field("string"), &field("number"));
/// assert!(verdict.valid);
/// assert_eq!(Some("Will convert string to number"), verdict.message.as_deref());
///
/// let verdict = check(&field("object"), &field("number"));
/// assert!(!verdict.valid);
/// assert_eq!(Some("Cannot convert object to number"), verdict.message.as_deref());
/// ```
pub fn check(source: &Field, target: &Field) -> Verdict {
    check_types(&source.type_, &target.type_)
}

pub fn check_types(source: &FieldType, target: &FieldType) -> Verdict {
    if source == target {
        return Verdict {
            valid: true,
            message: None,
        };
    }

    if convertible(source, target) {
        Verdict {
            valid: true,
            message: Some(format!("Will convert {} to {}", source, target)),
        }
    } else {
        Verdict {
            valid: false,
            message: Some(format!("Cannot convert {} to {}", source, target)),
        }
    }
}
