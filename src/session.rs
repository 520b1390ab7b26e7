use crate::analyzer::Analyzer;
use crate::compat::{check, Verdict};
use crate::engine::{apply, MappingOutcome, MappingRule};
use crate::error::{Error, Result};
use crate::field::{Entity, Field};
use crate::transform::Transformation;
use serde_json::Value;

/// The state of one interactive mapping workflow: a loaded document, the
/// entity chosen as the mapping source, and the rules drawn so far.
///
/// A session is owned by its caller. Nothing in it is shared, and the
/// analysis and mapping functions it calls keep no state of their own.
#[derive(Debug, Default)]
pub struct Session {
    analyzer: Analyzer,
    document: Option<Value>,
    entities: Vec<Entity>,
    selected: Option<String>,
    rules: Vec<MappingRule>,
}

impl Session {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            ..Self::default()
        }
    }

    /// Parses `text` and replaces any previously loaded document. On failure
    /// the session is left unchanged.
    pub fn load(&mut self, text: &str) -> Result<&[Entity]> {
        let document: Value = serde_json::from_str(text)?;

        self.entities = self.analyzer.group_into_entities(&document);
        self.document = Some(document);
        self.selected = None;
        self.rules.clear();

        Ok(&self.entities)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Picks the entity whose fields will be mapped, discarding any rules.
    pub fn select_entity(&mut self, name: &str) -> Result<&Entity> {
        let entity = self
            .entities
            .iter()
            .find(|entity| entity.name == name)
            .ok_or_else(|| Error::UnknownEntity(name.to_owned()))?;

        self.selected = Some(entity.name.clone());
        self.rules.clear();
        Ok(entity)
    }

    pub fn selected_entity(&self) -> Option<&Entity> {
        let name = self.selected.as_ref()?;
        self.entities.iter().find(|entity| &entity.name == name)
    }

    /// Records a rule from `source` to `target` and returns the compatibility
    /// verdict for the pair. The rule is kept even when the verdict is
    /// negative.
    ///
    /// When a non-root entity is selected, `source` is relative to that
    /// entity's sampled record and the recorded rule reads from its first
    /// element.
    pub fn propose_rule(
        &mut self,
        source: &Field,
        target: &Field,
        transformation: Option<Transformation>,
    ) -> Verdict {
        let verdict = check(source, target);

        let source_path = match self.selected_entity() {
            Some(entity) if !entity.path.is_empty() => format!("{}[0].{}", entity.path, source.path),
            _ => source.path.clone(),
        };

        self.rules.push(MappingRule {
            source: source_path,
            target: target.path.clone(),
            transformation,
        });

        verdict
    }

    pub fn remove_rule(&mut self, index: usize) -> Result<MappingRule> {
        if index >= self.rules.len() {
            return Err(Error::NoSuchRule(index));
        }

        Ok(self.rules.remove(index))
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    /// Applies the recorded rules to the loaded document.
    pub fn apply(&self) -> Result<MappingOutcome> {
        let document = self.document.as_ref().ok_or(Error::NoDocument)?;
        Ok(apply(document, &self.rules))
    }

    /// Forgets the selection and rules, keeping the loaded document.
    pub fn reset(&mut self) {
        self.selected = None;
        self.rules.clear();
    }
}
