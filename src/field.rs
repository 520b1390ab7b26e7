use crate::field_type::FieldType;
use crate::path::Path;
use serde::{Deserialize, Serialize};

/// A description of one addressable location inside a JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub path: String,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "type")]
    pub type_: FieldType,

    #[serde(default)]
    pub is_array: bool,

    #[serde(default)]
    pub is_object: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Field {
    /// Builds a field for `path`, deriving the name, flags and description.
    pub fn new(path: &Path, type_: FieldType) -> Self {
        let name = path.name();
        let description = Some(format!("{} ({})", name, type_));

        Self {
            path: path.to_string(),
            name,
            is_array: type_.is_array(),
            is_object: type_.is_object(),
            type_,
            description,
        }
    }

    /// Overrides the generated description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named group of fields describing one record shape: either the whole
/// document, or the sampled element of a top-level array of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,

    /// Where the record lives in the document; empty for the root.
    pub path: String,

    pub fields: Vec<Field>,
}

impl Entity {
    pub fn field(&self, path: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_new() {
        let field = Field::new(&Path::parse("book.tags").unwrap(), FieldType::from("array<string>"));
        assert_eq!("tags", field.name);
        assert!(field.is_array);
        assert!(!field.is_object);
        assert_eq!(Some("tags (array<string>)"), field.description.as_deref());
    }

    #[test]
    fn field_wire_shape() {
        let field = Field::new(&Path::parse("book").unwrap(), FieldType::Object);
        assert_eq!(
            json!({
                "path": "book",
                "name": "book",
                "type": "object",
                "isArray": false,
                "isObject": true,
                "description": "book (object)",
            }),
            serde_json::to_value(&field).unwrap()
        );

        // Callers may send only a path and a type.
        let field: Field =
            serde_json::from_value(json!({ "path": "a.b", "type": "number" })).unwrap();
        assert_eq!(FieldType::Number, field.type_);
        assert_eq!(None, field.description);
    }
}
