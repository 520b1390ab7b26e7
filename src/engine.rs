use crate::path::{Path, PathError};
use crate::transform::Transformation;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Relocates the value at `source` to `target`, optionally transforming it on
/// the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    /// Accepts either a path string or a field object with a `path` key.
    #[serde(rename = "sourceField", deserialize_with = "path_or_field")]
    pub source: String,

    #[serde(rename = "targetField", deserialize_with = "path_or_field")]
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Transformation>,
}

impl MappingRule {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            transformation: None,
        }
    }

    pub fn with_transformation(mut self, transformation: Transformation) -> Self {
        self.transformation = Some(transformation);
        self
    }
}

fn path_or_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Side {
        Path(String),
        Field { path: String },
    }

    Ok(match Side::deserialize(deserializer)? {
        Side::Path(path) | Side::Field { path } => path,
    })
}

/// Why a rule contributed nothing to a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WarningKind {
    #[error("source path does not resolve")]
    UnresolvableSourcePath,

    #[error("transformation failed: {reason}")]
    TransformationFailed { reason: String },

    #[error("{reason}")]
    InvalidPath { reason: String },
}

/// A problem confined to one rule of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleWarning {
    /// Position of the rule in the batch.
    pub rule: usize,
    pub source_field: String,
    pub target_field: String,

    #[serde(flatten)]
    pub kind: WarningKind,

    pub message: String,
}

impl RuleWarning {
    fn new(index: usize, rule: &MappingRule, kind: WarningKind) -> Self {
        Self {
            rule: index,
            source_field: rule.source.clone(),
            target_field: rule.target.clone(),
            message: format!("rule {} ({} -> {}): {}", index, rule.source, rule.target, kind),
            kind,
        }
    }
}

/// The document built by [`apply`], plus the rules it had to leave out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingOutcome {
    pub result: Value,
    pub warnings: Vec<RuleWarning>,
}

/// Builds a fresh document by applying `rules`, in order, to `document`.
///
/// Each rule reads its source path, runs its transformation if any, and writes
/// the value at its target path, creating intermediate objects as needed.
/// Later rules overwrite whatever earlier rules wrote at the same place. A
/// rule whose source does not resolve, whose paths do not parse, or whose
/// transformation fails is skipped with a warning; the other rules still
/// apply.
///
/// ```
/// use json_mapper::{apply, MappingRule};
/// use serde_json::json;
///
/// let doc = json!({"book":{"title":"Gatsby","author":{"name":"Fitzgerald"}}});
/// let outcome = apply(&doc, &[
///     MappingRule::new("book.title", "name"),
///     MappingRule::new("book.author.name", "creator.fullName"),
/// ]);
///
/// assert_eq!(json!({"name":"Gatsby","creator":{"fullName":"Fitzgerald"}}), outcome.result);
/// assert!(outcome.warnings.is_empty());
/// ```
pub fn apply(document: &Value, rules: &[MappingRule]) -> MappingOutcome {
    let mut result = Value::Object(Map::new());
    let mut warnings = Vec::new();

    for (index, rule) in rules.iter().enumerate() {
        let written = apply_rule(document, rule)
            .and_then(|(target, value)| target.write(&mut result, value).map_err(invalid_path));

        if let Err(kind) = written {
            let warning = RuleWarning::new(index, rule, kind);
            tracing::warn!(rule = index, "{}", warning.message);
            warnings.push(warning);
        }
    }

    tracing::debug!(
        rules = rules.len(),
        skipped = warnings.len(),
        "applied mapping rules"
    );

    MappingOutcome { result, warnings }
}

fn invalid_path(e: PathError) -> WarningKind {
    WarningKind::InvalidPath {
        reason: e.to_string(),
    }
}

fn apply_rule(document: &Value, rule: &MappingRule) -> Result<(Path, Value), WarningKind> {
    let source = Path::parse(&rule.source).map_err(invalid_path)?;
    let target = Path::parse(&rule.target).map_err(invalid_path)?;

    let value = source
        .resolve(document)
        .cloned()
        .ok_or(WarningKind::UnresolvableSourcePath)?;

    let value = match &rule.transformation {
        Some(transformation) => {
            transformation
                .apply(value)
                .map_err(|e| WarningKind::TransformationFailed {
                    reason: e.to_string(),
                })?
        }
        None => value,
    };

    Ok((target, value))
}

/// Whether one rule's source resolves, and to what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCheck {
    pub rule: MappingRule,
    pub valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleReport {
    /// True when every rule's source resolves.
    pub valid: bool,
    pub results: Vec<RuleCheck>,
}

/// Dry-runs the source side of `rules` against `document` without building a
/// result.
pub fn check_rules(document: &Value, rules: &[MappingRule]) -> RuleReport {
    let results: Vec<_> = rules
        .iter()
        .map(|rule| {
            let resolved = Path::parse(&rule.source).map(|path| path.resolve(document).cloned());
            let (value, message) = match resolved {
                Ok(Some(value)) => (Some(value), None),
                Ok(None) => (None, Some(WarningKind::UnresolvableSourcePath.to_string())),
                Err(e) => (None, Some(e.to_string())),
            };

            RuleCheck {
                rule: rule.clone(),
                valid: value.is_some(),
                value,
                message,
            }
        })
        .collect();

    RuleReport {
        valid: results.iter().all(|r| r.valid),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use crate::transform::Converter;
    use serde_json::json;

    fn gatsby() -> Value {
        json!({"book":{"title":"Gatsby","author":{"name":"Fitzgerald"}}})
    }

    #[test]
    fn apply_nested_targets() {
        let outcome = apply(
            &gatsby(),
            &[
                MappingRule::new("book.title", "name"),
                MappingRule::new("book.author.name", "creator.fullName"),
            ],
        );

        assert_eq!(
            json!({"name":"Gatsby","creator":{"fullName":"Fitzgerald"}}),
            outcome.result
        );
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn apply_missing_source_is_skipped() {
        let outcome = apply(
            &gatsby(),
            &[
                MappingRule::new("book.title", "name"),
                MappingRule::new("book.isbn", "isbn"),
            ],
        );

        assert_eq!(json!({ "name": "Gatsby" }), outcome.result);
        assert_eq!(1, outcome.warnings.len());

        let warning = &outcome.warnings[0];
        assert_eq!(1, warning.rule);
        assert_eq!("book.isbn", warning.source_field);
        assert_eq!(WarningKind::UnresolvableSourcePath, warning.kind);
    }

    #[test]
    fn apply_later_rules_win() {
        let doc = json!({ "a": 1, "b": 2 });
        let outcome = apply(
            &doc,
            &[MappingRule::new("a", "x.y"), MappingRule::new("b", "x.y")],
        );

        assert_eq!(json!({ "x": { "y": 2 } }), outcome.result);
    }

    #[test]
    fn apply_prefix_targets_depend_on_order() {
        let doc = json!({ "a": 1, "o": { "k": true } });

        let nested_first = apply(
            &doc,
            &[MappingRule::new("a", "x.y"), MappingRule::new("o", "x")],
        );
        assert_eq!(json!({ "x": { "k": true } }), nested_first.result);

        let nested_last = apply(
            &doc,
            &[MappingRule::new("o", "x"), MappingRule::new("a", "x.y")],
        );
        assert_eq!(json!({ "x": { "k": true, "y": 1 } }), nested_last.result);
    }

    #[test]
    fn apply_indexed_sources() {
        let doc = json!({ "items": [{ "name": "first" }, { "name": "second" }] });
        let outcome = apply(
            &doc,
            &[
                MappingRule::new("items[1].name", "second"),
                MappingRule::new("items.name", "ambiguous"),
            ],
        );

        assert_eq!(json!({ "second": "second" }), outcome.result);
        assert_eq!(WarningKind::UnresolvableSourcePath, outcome.warnings[0].kind);
    }

    #[test]
    fn apply_transformations() {
        let doc = json!({ "count": "12", "status": "A", "note": "hi" });
        let convert = |converter| Transformation::Convert {
            converter: Some(converter),
            custom_function: None,
        };

        let outcome = apply(
            &doc,
            &[
                MappingRule::new("count", "count").with_transformation(convert(Converter::ToNumber)),
                MappingRule::new("note", "bad").with_transformation(convert(Converter::ToNumber)),
                MappingRule::new("note", "note").with_transformation(Transformation::Direct),
                MappingRule::new("status", "code").with_transformation(Transformation::Convert {
                    converter: None,
                    custom_function: Some("return 1".to_owned()),
                }),
            ],
        );

        assert_eq!(json!({ "count": 12, "note": "hi" }), outcome.result);
        assert_eq!(2, outcome.warnings.len());
        assert_eq!(1, outcome.warnings[0].rule);
        assert!(matches!(
            outcome.warnings[0].kind,
            WarningKind::TransformationFailed { .. }
        ));
        assert_eq!(3, outcome.warnings[1].rule);
    }

    #[test]
    fn apply_invalid_paths() {
        let outcome = apply(&gatsby(), &[MappingRule::new("book..title", "name")]);
        assert_eq!(json!({}), outcome.result);
        assert!(matches!(outcome.warnings[0].kind, WarningKind::InvalidPath { .. }));
    }

    #[test]
    fn apply_oversized_target_index_is_skipped() {
        let doc = json!({ "a": 1, "b": 2 });
        let outcome = apply(
            &doc,
            &[
                MappingRule::new("a", "x[18446744073709551615]"),
                MappingRule::new("a", "y.z[4000000000]"),
                MappingRule::new("b", "list[2]"),
                MappingRule::new("a", "list[0]"),
            ],
        );

        assert_eq!(json!({ "list": [1, null, 2] }), outcome.result);
        assert_eq!(
            vec![0, 1],
            outcome.warnings.iter().map(|w| w.rule).collect::<Vec<_>>()
        );
        for warning in &outcome.warnings {
            assert!(matches!(warning.kind, WarningKind::InvalidPath { .. }));
            assert!(warning.message.contains("array index too large"));
        }
    }

    #[test]
    fn apply_key_write_replaces_padded_array() {
        let doc = json!({ "a": 1, "b": 2 });
        let outcome = apply(
            &doc,
            &[MappingRule::new("a", "list[2]"), MappingRule::new("b", "list.x")],
        );

        assert_eq!(json!({ "list": { "x": 2 } }), outcome.result);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn apply_lenient_transformations() {
        let rules: Vec<MappingRule> = serde_json::from_value(json!([
            { "sourceField": "a", "targetField": "empty", "transformation": {} },
            { "sourceField": "a", "targetField": "upper",
              "transformation": { "type": "convert", "converter": { "name": "toUpper" } } },
            { "sourceField": "a", "targetField": "odd", "transformation": { "type": "uppercase" } },
            { "sourceField": "b", "targetField": "num",
              "transformation": { "type": "convert", "converter": { "name": "toNumber" } } },
        ]))
        .unwrap();

        let outcome = apply(&json!({ "a": "x", "b": "3" }), &rules);
        assert_eq!(json!({ "empty": "x", "odd": "x", "num": 3 }), outcome.result);
        assert_eq!(1, outcome.warnings.len());
        assert_eq!(1, outcome.warnings[0].rule);
        assert_eq!(
            WarningKind::TransformationFailed {
                reason: "unknown converter \"toUpper\"".to_owned()
            },
            outcome.warnings[0].kind
        );
    }

    #[test]
    fn apply_round_trips_every_field() {
        let doc = json!({
            "id": 7,
            "tags": ["a", "b"],
            "owner": { "name": "n", "email": null },
            "lines": [{ "sku": "x", "qty": 2 }],
        });

        let fields = Analyzer::default().analyze(&doc);
        let rules: Vec<_> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| {
                MappingRule::new(f.path.clone(), format!("out.f{}", i))
                    .with_transformation(Transformation::Direct)
            })
            .collect();

        let outcome = apply(&doc, &rules);
        assert!(outcome.warnings.is_empty());

        for (i, field) in fields.iter().enumerate() {
            assert_eq!(
                Path::parse(&field.path).unwrap().resolve(&doc),
                outcome.result["out"].get(format!("f{}", i)),
            );
        }

        // No state carries over between calls.
        assert_eq!(outcome, apply(&doc, &rules));
    }

    #[test]
    fn rule_wire_shape() {
        let rules: Vec<MappingRule> = serde_json::from_value(json!([
            { "sourceField": "a.b", "targetField": "c" },
            {
                "sourceField": { "path": "x", "type": "string", "name": "x" },
                "targetField": { "id": "y", "path": "y.z" },
                "transformation": { "type": "direct" },
            },
        ]))
        .unwrap();

        assert_eq!(MappingRule::new("a.b", "c"), rules[0]);
        assert_eq!(
            MappingRule::new("x", "y.z").with_transformation(Transformation::Direct),
            rules[1]
        );

        assert_eq!(
            json!({ "sourceField": "a.b", "targetField": "c" }),
            serde_json::to_value(&rules[0]).unwrap()
        );
    }

    #[test]
    fn warning_wire_shape() {
        let outcome = apply(&gatsby(), &[MappingRule::new("nope", "x")]);
        assert_eq!(
            json!({
                "result": {},
                "warnings": [{
                    "rule": 0,
                    "sourceField": "nope",
                    "targetField": "x",
                    "kind": "unresolvableSourcePath",
                    "message": "rule 0 (nope -> x): source path does not resolve",
                }],
            }),
            serde_json::to_value(&outcome).unwrap()
        );
    }

    #[test]
    fn check_rules_report() {
        let report = check_rules(
            &gatsby(),
            &[
                MappingRule::new("book.title", "name"),
                MappingRule::new("book.year", "year"),
                MappingRule::new("book[", "x"),
            ],
        );

        assert!(!report.valid);
        assert_eq!(Some(json!("Gatsby")), report.results[0].value);
        assert!(report.results[0].valid);
        assert!(!report.results[1].valid);
        assert!(report.results[2].message.as_ref().unwrap().contains("unclosed"));

        assert!(check_rules(&gatsby(), &[MappingRule::new("book", "b")]).valid);
    }
}
