use crate::field::{Entity, Field};
use crate::field_type::FieldType;
use crate::path::Path;
use serde_json::{Map, Value};

/// Nesting levels below the root that are described by default.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Derives flattened field lists from JSON documents.
///
/// Objects are walked key by key in document order. Arrays are *sampled*: the
/// array itself is described, and if its first element is an object that
/// element is walked under an explicit `[0]` segment. Later elements are
/// assumed to share the first element's shape.
///
/// ```
/// use json_mapper::Analyzer;
/// use serde_json::json;
///
/// let fields = Analyzer::default().analyze(&json!({
///     "items": [{ "name": "a" }, { "name": "b", "extra": true }],
/// }));
///
/// let paths: Vec<_> = fields.iter().map(|f| f.path.as_str()).collect();
/// assert_eq!(vec!["items", "items[0].name"], paths);
/// ```
#[derive(Debug, Clone)]
pub struct Analyzer {
    max_depth: usize,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl Analyzer {
    /// Constructs an analyzer that stops describing fields nested more than
    /// `max_depth` levels below the root.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Describes every reachable location of `document`.
    ///
    /// An object root is not described itself, only its children are. Any other
    /// root (a scalar or an array) is described as a single field named `root`
    /// at the empty path.
    pub fn analyze(&self, document: &Value) -> Vec<Field> {
        let mut fields = Vec::new();
        match document {
            Value::Object(map) => self.visit_object(map, &Path::root(), 0, &mut fields),
            _ => self.visit(document, Path::root(), 0, &mut fields),
        }

        tracing::debug!(fields = fields.len(), "analyzed document");
        fields
    }

    /// Groups the fields of `document` into entities.
    ///
    /// The first entity, `Root`, holds every field of the document. Each
    /// top-level array of objects additionally becomes an entity named after
    /// its key, holding the fields of the array's first element as if it were a
    /// document of its own.
    pub fn group_into_entities(&self, document: &Value) -> Vec<Entity> {
        let mut entities = Vec::new();

        let root_fields = self.analyze(document);
        if !root_fields.is_empty() {
            entities.push(Entity {
                name: "Root".to_owned(),
                path: String::new(),
                fields: root_fields,
            });
        }

        if let Value::Object(map) = document {
            for (key, value) in map {
                if !is_addressable(key) || !FieldType::of(value).is_record_array() {
                    continue;
                }

                if let Some(sample) = value.as_array().and_then(|items| items.first()) {
                    entities.push(Entity {
                        name: key.clone(),
                        path: Path::root().key(key).to_string(),
                        fields: self.analyze(sample),
                    });
                }
            }
        }

        entities
    }

    fn visit_object(&self, map: &Map<String, Value>, parent: &Path, depth: usize, out: &mut Vec<Field>) {
        if depth >= self.max_depth {
            return;
        }

        for (key, value) in map {
            if !is_addressable(key) {
                tracing::debug!(parent = %parent, key = %key, "skipping key that cannot be written as a path");
                continue;
            }

            self.visit(value, parent.key(key), depth, out);
        }
    }

    fn visit(&self, value: &Value, path: Path, depth: usize, out: &mut Vec<Field>) {
        let type_ = FieldType::of(value);

        match value {
            Value::Array(items) => {
                let description = format!("{} (array with {} items)", path.name(), items.len());
                out.push(Field::new(&path, type_).with_description(description));

                if let Some(Value::Object(first)) = items.first() {
                    self.visit_object(first, &path.index(0), depth + 1, out);
                }
            }
            Value::Object(map) => {
                out.push(Field::new(&path, type_));
                self.visit_object(map, &path, depth + 1, out);
            }
            _ => out.push(Field::new(&path, type_)),
        }
    }
}

/// Keys that would be misread by the path grammar cannot be given a unique
/// path, so they are left out of field lists.
fn is_addressable(key: &str) -> bool {
    !key.is_empty() && !key.contains(|c: char| c == '.' || c == '[' || c == ']')
}
