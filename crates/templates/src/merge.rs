use serde_json::Value;

use crate::definition::Definition;

/// How one top-level field of a definition is combined with the same field
/// of its resolved base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
    /// Child value replaces the base value wholesale.
    Overwrite,
    /// Base list first, then child entries not already present, in child order.
    Union,
    /// Object merged key by key; child keys win.
    KeyMerge,
}

/// Per-subtype table of field composition rules. Fields absent from the
/// table use [`FieldPolicy::Overwrite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    name: &'static str,
    fields: &'static [(&'static str, FieldPolicy)],
}

pub const DEFAULT_POLICY: MergePolicy = MergePolicy::new("default", &[]);

impl MergePolicy {
    pub const fn new(name: &'static str, fields: &'static [(&'static str, FieldPolicy)]) -> Self {
        Self { name, fields }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &'static [(&'static str, FieldPolicy)] {
        self.fields
    }

    pub fn field_policy(&self, field: &str) -> FieldPolicy {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, policy)| *policy)
            .unwrap_or(FieldPolicy::Overwrite)
    }

    /// Layers `def` on top of `base`, producing a new definition. Neither
    /// input is modified.
    pub fn merge(&self, def: &Definition, base: &Definition) -> Definition {
        let mut merged = base.fields().clone();
        for (field, value) in def.fields() {
            let composed = match (self.field_policy(field), merged.get(field)) {
                (FieldPolicy::Overwrite, _) | (_, None) => value.clone(),
                (FieldPolicy::Union, Some(base_value)) => union_lists(base_value, value),
                (FieldPolicy::KeyMerge, Some(base_value)) => merge_objects(base_value, value),
            };
            merged.insert(field.clone(), composed);
        }
        Definition::from_fields(merged)
    }
}

fn union_lists(base: &Value, child: &Value) -> Value {
    match (base, child) {
        (Value::Array(base_entries), Value::Array(child_entries)) => {
            let mut combined = base_entries.clone();
            for entry in child_entries {
                if !combined.contains(entry) {
                    combined.push(entry.clone());
                }
            }
            Value::Array(combined)
        }
        (Value::Array(_), Value::Null) => base.clone(),
        _ => child.clone(),
    }
}

fn merge_objects(base: &Value, child: &Value) -> Value {
    match (base, child) {
        (Value::Object(base_map), Value::Object(child_map)) => {
            let mut combined = base_map.clone();
            for (key, value) in child_map {
                combined.insert(key.clone(), value.clone());
            }
            Value::Object(combined)
        }
        (Value::Object(_), Value::Null) => base.clone(),
        _ => child.clone(),
    }
}
