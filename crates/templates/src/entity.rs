use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::area::Area;
use crate::behavior::EventListeners;
use crate::definition::{
    Definition, FIELD_ATTRIBUTES, FIELD_BEHAVIORS, FIELD_KEYWORDS, FIELD_METADATA,
};
use crate::reference::EntityReference;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstantiateError {
    #[error("field '{field}' of '{reference}' must be {expected}")]
    InvalidField {
        reference: EntityReference,
        field: &'static str,
        expected: &'static str,
    },
}

/// Constructor contract every templated entity type satisfies.
///
/// Construction only copies template data; populating default contents is a
/// separate step owned by the entity type. `reference` is the registry key the
/// definition was resolved under and becomes the instance's reference as is.
pub trait EntityInstance: Sized {
    fn from_definition(
        area: &Area,
        reference: &EntityReference,
        definition: Definition,
    ) -> Result<Self, InstantiateError>;

    fn area(&self) -> &Area;

    fn entity_reference(&self) -> &EntityReference;

    fn listeners(&self) -> &EventListeners;

    fn listeners_mut(&mut self) -> &mut EventListeners;

    fn emit(&self, event: &str, payload: &Value) -> usize {
        self.listeners()
            .emit(self.entity_reference(), event, payload)
    }
}

struct FieldReader<'a> {
    reference: EntityReference,
    definition: &'a Definition,
}

impl<'a> FieldReader<'a> {
    fn new(reference: &EntityReference, definition: &'a Definition) -> Self {
        Self {
            reference: reference.clone(),
            definition,
        }
    }

    fn invalid(&self, field: &'static str, expected: &'static str) -> InstantiateError {
        InstantiateError::InvalidField {
            reference: self.reference.clone(),
            field,
            expected,
        }
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.definition.get(field).filter(|value| !value.is_null())
    }

    fn string(&self, field: &'static str) -> Result<Option<String>, InstantiateError> {
        match self.present(field) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(self.invalid(field, "a string")),
        }
    }

    fn string_list(&self, field: &'static str) -> Result<Vec<String>, InstantiateError> {
        match self.present(field) {
            None => Ok(Vec::new()),
            Some(Value::Array(entries)) => entries
                .iter()
                .map(|entry| {
                    entry
                        .as_str()
                        .map(ToString::to_string)
                        .ok_or_else(|| self.invalid(field, "a list of strings"))
                })
                .collect(),
            Some(_) => Err(self.invalid(field, "a list of strings")),
        }
    }

    fn object(&self, field: &'static str) -> Result<Map<String, Value>, InstantiateError> {
        match self.present(field) {
            None => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(self.invalid(field, "an object")),
        }
    }

    fn typed<T: for<'de> Deserialize<'de> + Default>(
        &self,
        field: &'static str,
        expected: &'static str,
    ) -> Result<T, InstantiateError> {
        match self.present(field) {
            None => Ok(T::default()),
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|_| self.invalid(field, expected))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Npc {
    area: Area,
    entity_reference: EntityReference,
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub attributes: Map<String, Value>,
    pub metadata: Map<String, Value>,
    pub behaviors: Map<String, Value>,
    /// Item references the npc starts with once hydrated.
    pub default_items: Vec<String>,
    listeners: EventListeners,
}

impl Npc {
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn has_behavior(&self, name: &str) -> bool {
        self.behaviors.contains_key(name)
    }
}

impl EntityInstance for Npc {
    fn from_definition(
        area: &Area,
        reference: &EntityReference,
        definition: Definition,
    ) -> Result<Self, InstantiateError> {
        let fields = FieldReader::new(reference, &definition);
        Ok(Self {
            area: area.clone(),
            name: fields.string("name")?.unwrap_or_default(),
            description: fields.string("description")?.unwrap_or_default(),
            keywords: fields.string_list(FIELD_KEYWORDS)?,
            attributes: fields.object(FIELD_ATTRIBUTES)?,
            metadata: fields.object(FIELD_METADATA)?,
            behaviors: fields.object(FIELD_BEHAVIORS)?,
            default_items: fields.string_list("items")?,
            listeners: EventListeners::new(),
            entity_reference: fields.reference,
        })
    }

    fn area(&self) -> &Area {
        &self.area
    }

    fn entity_reference(&self) -> &EntityReference {
        &self.entity_reference
    }

    fn listeners(&self) -> &EventListeners {
        &self.listeners
    }

    fn listeners_mut(&mut self) -> &mut EventListeners {
        &mut self.listeners
    }
}

#[derive(Debug, Clone)]
pub struct Item {
    area: Area,
    entity_reference: EntityReference,
    pub name: String,
    pub description: String,
    pub item_type: Option<String>,
    pub keywords: Vec<String>,
    pub metadata: Map<String, Value>,
    pub behaviors: Map<String, Value>,
    /// Contents of a container item once hydrated.
    pub default_items: Vec<String>,
    listeners: EventListeners,
}

impl EntityInstance for Item {
    fn from_definition(
        area: &Area,
        reference: &EntityReference,
        definition: Definition,
    ) -> Result<Self, InstantiateError> {
        let fields = FieldReader::new(reference, &definition);
        Ok(Self {
            area: area.clone(),
            name: fields.string("name")?.unwrap_or_default(),
            description: fields.string("description")?.unwrap_or_default(),
            item_type: fields.string("type")?,
            keywords: fields.string_list(FIELD_KEYWORDS)?,
            metadata: fields.object(FIELD_METADATA)?,
            behaviors: fields.object(FIELD_BEHAVIORS)?,
            default_items: fields.string_list("items")?,
            listeners: EventListeners::new(),
            entity_reference: fields.reference,
        })
    }

    fn area(&self) -> &Area {
        &self.area
    }

    fn entity_reference(&self) -> &EntityReference {
        &self.entity_reference
    }

    fn listeners(&self) -> &EventListeners {
        &self.listeners
    }

    fn listeners_mut(&mut self) -> &mut EventListeners {
        &mut self.listeners
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomExit {
    pub direction: String,
    pub room_id: String,
}

#[derive(Debug, Clone)]
pub struct Room {
    area: Area,
    entity_reference: EntityReference,
    pub title: String,
    pub description: String,
    pub metadata: Map<String, Value>,
    pub behaviors: Map<String, Value>,
    pub exits: Vec<RoomExit>,
    /// Npc references spawned into the room once hydrated.
    pub default_npcs: Vec<String>,
    pub default_items: Vec<String>,
    listeners: EventListeners,
}

impl Room {
    pub fn exit(&self, direction: &str) -> Option<&RoomExit> {
        self.exits.iter().find(|exit| exit.direction == direction)
    }
}

impl EntityInstance for Room {
    fn from_definition(
        area: &Area,
        reference: &EntityReference,
        definition: Definition,
    ) -> Result<Self, InstantiateError> {
        let fields = FieldReader::new(reference, &definition);
        Ok(Self {
            area: area.clone(),
            title: fields.string("title")?.unwrap_or_default(),
            description: fields.string("description")?.unwrap_or_default(),
            metadata: fields.object(FIELD_METADATA)?,
            behaviors: fields.object(FIELD_BEHAVIORS)?,
            exits: fields.typed("exits", "a list of { direction, roomId } objects")?,
            default_npcs: fields.string_list("npcs")?,
            default_items: fields.string_list("items")?,
            listeners: EventListeners::new(),
            entity_reference: fields.reference,
        })
    }

    fn area(&self) -> &Area {
        &self.area
    }

    fn entity_reference(&self) -> &EntityReference {
        &self.entity_reference
    }

    fn listeners(&self) -> &EventListeners {
        &self.listeners
    }

    fn listeners_mut(&mut self) -> &mut EventListeners {
        &mut self.listeners
    }
}
