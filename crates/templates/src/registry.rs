use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::definition::Definition;
use crate::merge::{MergePolicy, DEFAULT_POLICY};
use crate::reference::EntityReference;

/// Longest base chain a single resolution will follow.
pub const MAX_BASE_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("base definition '{base}' not found for '{requested_by}'")]
    MissingBaseDefinition {
        base: EntityReference,
        requested_by: EntityReference,
    },
    #[error("cyclic base chain: {}", format_chain(.chain))]
    CyclicBaseDefinition { chain: Vec<EntityReference> },
    #[error("base chain of '{reference}' is deeper than {limit}")]
    BaseChainTooDeep {
        reference: EntityReference,
        limit: usize,
    },
    #[error("invalid base on '{reference}': {message}")]
    InvalidBase {
        reference: EntityReference,
        message: String,
    },
}

fn format_chain(chain: &[EntityReference]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Raw definitions keyed by reference. Resolution never mutates what is stored.
#[derive(Debug, Default, Clone)]
pub struct DefinitionRegistry {
    definitions: HashMap<EntityReference, Definition>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `definition` under `reference` and stamps its `entityReference`.
    /// A previous definition for the same reference is replaced.
    pub fn set_definition(&mut self, reference: EntityReference, mut definition: Definition) {
        definition.stamp_reference(&reference);
        let replaced = self
            .definitions
            .insert(reference.clone(), definition)
            .is_some();
        debug!(entity_reference = %reference, replaced, "definition_registered");
    }

    pub fn raw_definition(&self, reference: &EntityReference) -> Option<&Definition> {
        self.definitions.get(reference)
    }

    pub fn contains(&self, reference: &EntityReference) -> bool {
        self.definitions.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Registered references in sorted order.
    pub fn references(&self) -> Vec<&EntityReference> {
        let mut references = self.definitions.keys().collect::<Vec<_>>();
        references.sort();
        references
    }

    /// Resolves `reference` with shallow-override merging.
    pub fn get_definition(
        &self,
        reference: &EntityReference,
    ) -> Result<Option<Definition>, DefinitionError> {
        self.resolve(reference, &DEFAULT_POLICY)
    }

    pub fn merge_definitions(&self, def: &Definition, base: &Definition) -> Definition {
        DEFAULT_POLICY.merge(def, base)
    }

    /// Flattens the base chain of `reference` under `policy`.
    ///
    /// Bases fold left to right, so a later base wins over an earlier one, and
    /// the definition itself is merged last so it wins over all of its bases.
    /// Returns `Ok(None)` only when `reference` itself is unknown.
    pub fn resolve(
        &self,
        reference: &EntityReference,
        policy: &MergePolicy,
    ) -> Result<Option<Definition>, DefinitionError> {
        let mut resolution = Resolution {
            registry: self,
            policy,
            in_progress: Vec::new(),
            resolved: HashMap::new(),
        };
        resolution.resolve(reference)
    }
}

struct Resolution<'a> {
    registry: &'a DefinitionRegistry,
    policy: &'a MergePolicy,
    in_progress: Vec<EntityReference>,
    resolved: HashMap<EntityReference, Definition>,
}

impl Resolution<'_> {
    fn resolve(
        &mut self,
        reference: &EntityReference,
    ) -> Result<Option<Definition>, DefinitionError> {
        if let Some(done) = self.resolved.get(reference) {
            return Ok(Some(done.clone()));
        }
        let registry = self.registry;
        let Some(raw) = registry.definitions.get(reference) else {
            return Ok(None);
        };
        if let Some(start) = self.in_progress.iter().position(|seen| seen == reference) {
            let mut chain = self.in_progress[start..].to_vec();
            chain.push(reference.clone());
            return Err(DefinitionError::CyclicBaseDefinition { chain });
        }

        let bases = base_references(reference, raw)?;
        if bases.is_empty() {
            return Ok(Some(raw.clone()));
        }
        if self.in_progress.len() >= MAX_BASE_DEPTH {
            return Err(DefinitionError::BaseChainTooDeep {
                reference: self
                    .in_progress
                    .first()
                    .cloned()
                    .unwrap_or_else(|| reference.clone()),
                limit: MAX_BASE_DEPTH,
            });
        }

        self.in_progress.push(reference.clone());
        let mut accumulated = Definition::new();
        for base in &bases {
            let base_def =
                self.resolve(base)?
                    .ok_or_else(|| DefinitionError::MissingBaseDefinition {
                        base: base.clone(),
                        requested_by: reference.clone(),
                    })?;
            accumulated = self.policy.merge(&base_def, &accumulated);
        }
        self.in_progress.pop();

        let merged = self.policy.merge(raw, &accumulated);
        self.resolved.insert(reference.clone(), merged.clone());
        Ok(Some(merged))
    }
}

fn base_references(
    reference: &EntityReference,
    definition: &Definition,
) -> Result<Vec<EntityReference>, DefinitionError> {
    let invalid = |message: String| DefinitionError::InvalidBase {
        reference: reference.clone(),
        message,
    };
    match definition.base() {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(raw)) => EntityReference::parse(raw)
            .map(|base| vec![base])
            .map_err(|error| invalid(error.to_string())),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| match entry {
                Value::String(raw) => {
                    EntityReference::parse(raw).map_err(|error| invalid(error.to_string()))
                }
                other => Err(invalid(format!("base entries must be strings, found {other}"))),
            })
            .collect(),
        Some(other) => Err(invalid(format!(
            "base must be a reference or a list of references, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn reference(id: u32) -> EntityReference {
        EntityReference::new("limbo", id)
    }

    fn def(value: Value) -> Definition {
        Definition::from_value(value).expect("object")
    }

    fn registry_with(entries: &[(u32, Value)]) -> DefinitionRegistry {
        let mut registry = DefinitionRegistry::new();
        for (id, value) in entries {
            registry.set_definition(reference(*id), def(value.clone()));
        }
        registry
    }

    #[test]
    fn set_definition_stamps_reference_and_last_write_wins() {
        let mut registry = DefinitionRegistry::new();
        registry.set_definition(reference(1), def(json!({ "name": "rat" })));
        registry.set_definition(reference(1), def(json!({ "name": "big rat" })));
        let raw = registry.raw_definition(&reference(1)).expect("raw");
        assert_eq!(raw.entity_reference(), Some("limbo:1"));
        assert_eq!(raw.get("name"), Some(&json!("big rat")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_reference_resolves_to_none() {
        let registry = DefinitionRegistry::new();
        assert_eq!(registry.get_definition(&reference(9)), Ok(None));
    }

    #[test]
    fn definition_without_base_is_returned_unchanged() {
        let registry = registry_with(&[(1, json!({ "name": "rat", "keywords": ["rat"] }))]);
        let resolved = registry
            .get_definition(&reference(1))
            .expect("resolve")
            .expect("known");
        assert_eq!(Some(&resolved), registry.raw_definition(&reference(1)));
    }

    #[test]
    fn single_base_is_shallow_overridden_by_child() {
        let registry = registry_with(&[
            (1, json!({ "name": "rat", "attributes": { "hp": 10 } })),
            (2, json!({ "base": "limbo:1", "attributes": { "str": 5 } })),
        ]);
        let resolved = registry
            .get_definition(&reference(2))
            .expect("resolve")
            .expect("known");
        assert_eq!(resolved.get("attributes"), Some(&json!({ "str": 5 })));
        assert_eq!(resolved.get("name"), Some(&json!("rat")));
        assert_eq!(resolved.entity_reference(), Some("limbo:2"));
        assert_eq!(resolved.get("base"), Some(&json!("limbo:1")));
    }

    #[test]
    fn later_bases_win_and_child_wins_over_all() {
        let registry = registry_with(&[
            (1, json!({ "shared": "b1", "both": "b1", "only1": true })),
            (2, json!({ "shared": "b2", "both": "b2", "only2": true })),
            (3, json!({ "base": ["limbo:1", "limbo:2"], "both": "child" })),
        ]);
        let resolved = registry
            .get_definition(&reference(3))
            .expect("resolve")
            .expect("known");
        assert_eq!(resolved.get("shared"), Some(&json!("b2")));
        assert_eq!(resolved.get("both"), Some(&json!("child")));
        assert_eq!(resolved.get("only1"), Some(&json!(true)));
        assert_eq!(resolved.get("only2"), Some(&json!(true)));
    }

    #[test]
    fn three_level_chain_composes() {
        let registry = registry_with(&[
            (1, json!({ "name": "base", "level": 1, "color": "grey" })),
            (2, json!({ "base": "limbo:1", "name": "mid", "level": 2 })),
            (3, json!({ "base": "limbo:2", "name": "leaf" })),
        ]);
        let resolved = registry
            .get_definition(&reference(3))
            .expect("resolve")
            .expect("known");
        assert_eq!(resolved.get("name"), Some(&json!("leaf")));
        assert_eq!(resolved.get("level"), Some(&json!(2)));
        assert_eq!(resolved.get("color"), Some(&json!("grey")));
    }

    #[test]
    fn resolution_does_not_mutate_stored_definitions() {
        let registry = registry_with(&[
            (1, json!({ "name": "rat" })),
            (2, json!({ "base": "limbo:1" })),
        ]);
        let before = registry.raw_definition(&reference(2)).cloned();
        let _ = registry.get_definition(&reference(2)).expect("resolve");
        assert_eq!(registry.raw_definition(&reference(2)).cloned(), before);
        assert!(!registry
            .raw_definition(&reference(2))
            .expect("raw")
            .contains("name"));
    }

    #[test]
    fn chain_of_fifty_resolves() {
        let mut registry = DefinitionRegistry::new();
        registry.set_definition(reference(0), def(json!({ "depth": 0, "root": true })));
        for id in 1..50 {
            registry.set_definition(
                reference(id),
                def(json!({ "base": format!("limbo:{}", id - 1), "depth": id })),
            );
        }
        let resolved = registry
            .get_definition(&reference(49))
            .expect("resolve")
            .expect("known");
        assert_eq!(resolved.get("depth"), Some(&json!(49)));
        assert_eq!(resolved.get("root"), Some(&json!(true)));
    }

    #[test]
    fn chain_beyond_limit_fails() {
        let mut registry = DefinitionRegistry::new();
        registry.set_definition(reference(0), def(json!({})));
        for id in 1..(MAX_BASE_DEPTH as u32 + 5) {
            registry.set_definition(
                reference(id),
                def(json!({ "base": format!("limbo:{}", id - 1) })),
            );
        }
        let top = reference(MAX_BASE_DEPTH as u32 + 4);
        let err = registry.get_definition(&top).expect_err("too deep");
        assert_eq!(
            err,
            DefinitionError::BaseChainTooDeep {
                reference: top,
                limit: MAX_BASE_DEPTH,
            }
        );
    }

    #[test]
    fn missing_base_names_base_and_requester() {
        let registry = registry_with(&[
            (1, json!({ "name": "rat" })),
            (2, json!({ "base": ["limbo:1", "limbo:7"] })),
        ]);
        let err = registry.get_definition(&reference(2)).expect_err("missing");
        assert_eq!(
            err,
            DefinitionError::MissingBaseDefinition {
                base: reference(7),
                requested_by: reference(2),
            }
        );
        assert!(err.to_string().contains("limbo:7"));
        assert!(err.to_string().contains("limbo:2"));
    }

    #[test]
    fn missing_base_deep_in_chain_is_fatal() {
        let registry = registry_with(&[
            (1, json!({ "base": "limbo:99" })),
            (2, json!({ "base": "limbo:1" })),
        ]);
        let err = registry.get_definition(&reference(2)).expect_err("missing");
        assert_eq!(
            err,
            DefinitionError::MissingBaseDefinition {
                base: reference(99),
                requested_by: reference(1),
            }
        );
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let registry = registry_with(&[(1, json!({ "base": "limbo:1" }))]);
        let err = registry.get_definition(&reference(1)).expect_err("cycle");
        assert_eq!(
            err,
            DefinitionError::CyclicBaseDefinition {
                chain: vec![reference(1), reference(1)],
            }
        );
    }

    #[test]
    fn two_node_cycle_reports_chain() {
        let registry = registry_with(&[
            (1, json!({ "base": "limbo:2" })),
            (2, json!({ "base": "limbo:1" })),
            (3, json!({ "base": ["limbo:4", "limbo:1"] })),
            (4, json!({})),
        ]);
        let err = registry.get_definition(&reference(3)).expect_err("cycle");
        assert_eq!(
            err,
            DefinitionError::CyclicBaseDefinition {
                chain: vec![reference(1), reference(2), reference(1)],
            }
        );
        assert_eq!(
            err.to_string(),
            "cyclic base chain: limbo:1 -> limbo:2 -> limbo:1"
        );
    }

    #[test]
    fn diamond_inheritance_is_not_a_cycle() {
        let registry = registry_with(&[
            (1, json!({ "name": "root", "hp": 1 })),
            (2, json!({ "base": "limbo:1", "left": true })),
            (3, json!({ "base": "limbo:1", "right": true })),
            (4, json!({ "base": ["limbo:2", "limbo:3"] })),
        ]);
        let resolved = registry
            .get_definition(&reference(4))
            .expect("resolve")
            .expect("known");
        assert_eq!(resolved.get("left"), Some(&json!(true)));
        assert_eq!(resolved.get("right"), Some(&json!(true)));
        assert_eq!(resolved.get("hp"), Some(&json!(1)));
    }

    #[test]
    fn malformed_base_is_rejected() {
        let registry = registry_with(&[
            (1, json!({ "base": 12 })),
            (2, json!({ "base": ["limbo:1", 3] })),
            (3, json!({ "base": "not-a-reference" })),
        ]);
        for id in 1..=3 {
            let err = registry.get_definition(&reference(id)).expect_err("invalid");
            assert!(matches!(err, DefinitionError::InvalidBase { .. }), "{err}");
        }
    }

    #[test]
    fn empty_base_list_behaves_like_no_base() {
        let registry = registry_with(&[(1, json!({ "base": [], "name": "rat" }))]);
        let resolved = registry
            .get_definition(&reference(1))
            .expect("resolve")
            .expect("known");
        assert_eq!(Some(&resolved), registry.raw_definition(&reference(1)));
    }

    #[test]
    fn references_are_sorted() {
        let registry = registry_with(&[(3, json!({})), (1, json!({})), (2, json!({}))]);
        let ids = registry
            .references()
            .into_iter()
            .map(EntityReference::id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
