use crate::field::{Entity, Field};
use crate::field_type::FieldType;
use crate::path::Path;

/// (group, [(path, type, description)])
const TARGET_GROUPS: &[(&str, &[(&str, &str, &str)])] = &[
    (
        "Basic Information",
        &[
            ("id", "string", "Unique identifier"),
            ("name", "string", "Entity name"),
            ("description", "string", "Entity description"),
            ("created_at", "string", "Creation timestamp"),
            ("updated_at", "string", "Last update timestamp"),
        ],
    ),
    (
        "Classification",
        &[
            ("type", "string", "Entity type"),
            ("category", "string", "Entity category"),
            ("tags", "array", "Entity tags"),
        ],
    ),
    (
        "Relationships",
        &[
            ("parent_id", "string", "Parent entity ID"),
            ("related_entities", "array", "Related entity IDs"),
        ],
    ),
];

/// The built-in target schema that source fields are usually mapped onto,
/// one entity per group.
pub fn target_entities() -> Vec<Entity> {
    TARGET_GROUPS
        .iter()
        .map(|(group, fields)| Entity {
            name: group.to_string(),
            path: String::new(),
            fields: fields
                .iter()
                .map(|(path, type_, description)| {
                    Field::new(&Path::root().key(path), FieldType::from(*type_))
                        .with_description(*description)
                })
                .collect(),
        })
        .collect()
}

/// Looks a target field up by path across every group.
pub fn target_field(path: &str) -> Option<Field> {
    target_entities()
        .into_iter()
        .flat_map(|entity| entity.fields)
        .find(|field| field.path == path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_catalog() {
        let entities = target_entities();
        let names: Vec<_> = entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(vec!["Basic Information", "Classification", "Relationships"], names);
        assert_eq!(10, entities.iter().map(|e| e.fields.len()).sum::<usize>());

        let tags = target_field("tags").unwrap();
        assert!(tags.is_array);
        assert_eq!(Some("Entity tags"), tags.description.as_deref());
        assert_eq!(None, target_field("nope"));
    }
}
