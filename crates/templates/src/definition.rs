use serde_json::{Map, Value};

use crate::reference::EntityReference;

pub const FIELD_BASE: &str = "base";
pub const FIELD_ENTITY_REFERENCE: &str = "entityReference";
pub const FIELD_KEYWORDS: &str = "keywords";
pub const FIELD_ATTRIBUTES: &str = "attributes";
pub const FIELD_METADATA: &str = "metadata";
pub const FIELD_BEHAVIORS: &str = "behaviors";

/// Static template data for one entity kind.
///
/// Field values are kept as authored JSON; typed interpretation happens when
/// an entity is built from the definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definition {
    fields: Map<String, Value>,
}

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Returns `None` unless `value` is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn base(&self) -> Option<&Value> {
        self.fields.get(FIELD_BASE)
    }

    pub fn entity_reference(&self) -> Option<&str> {
        self.fields.get(FIELD_ENTITY_REFERENCE).and_then(Value::as_str)
    }

    pub(crate) fn stamp_reference(&mut self, reference: &EntityReference) {
        self.fields.insert(
            FIELD_ENTITY_REFERENCE.to_string(),
            Value::String(reference.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_value_accepts_only_objects() {
        assert!(Definition::from_value(json!({ "name": "rat" })).is_some());
        assert!(Definition::from_value(json!(["rat"])).is_none());
        assert!(Definition::from_value(json!("rat")).is_none());
    }

    #[test]
    fn stamp_reference_overwrites_authored_value() {
        let mut def = Definition::from_value(json!({ "entityReference": "wrong:1" })).expect("def");
        def.stamp_reference(&EntityReference::new("limbo", 2));
        assert_eq!(def.entity_reference(), Some("limbo:2"));
    }
}
