use crate::area::Area;
use crate::definition::{FIELD_ATTRIBUTES, FIELD_BEHAVIORS, FIELD_KEYWORDS, FIELD_METADATA};
use crate::entity::{Item, Npc, Room};
use crate::factory::{EntityFactory, Factory, FactoryError};
use crate::merge::{FieldPolicy, MergePolicy};
use crate::reference::EntityReference;

pub const MOB_POLICY: MergePolicy = MergePolicy::new(
    "mob",
    &[
        (FIELD_KEYWORDS, FieldPolicy::Union),
        (FIELD_ATTRIBUTES, FieldPolicy::KeyMerge),
        (FIELD_METADATA, FieldPolicy::KeyMerge),
        (FIELD_BEHAVIORS, FieldPolicy::KeyMerge),
    ],
);

pub const ITEM_POLICY: MergePolicy = MergePolicy::new(
    "item",
    &[
        (FIELD_KEYWORDS, FieldPolicy::Union),
        (FIELD_METADATA, FieldPolicy::KeyMerge),
        (FIELD_BEHAVIORS, FieldPolicy::KeyMerge),
    ],
);

// Exits and default contents stay wholesale: a derived room replaces its layout.
pub const ROOM_POLICY: MergePolicy = MergePolicy::new(
    "room",
    &[
        (FIELD_METADATA, FieldPolicy::KeyMerge),
        (FIELD_BEHAVIORS, FieldPolicy::KeyMerge),
    ],
);

/// Builds [`Npc`]s from mob definitions.
#[derive(Debug, Default, Clone)]
pub struct MobFactory {
    core: EntityFactory,
}

impl MobFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Factory for MobFactory {
    type Entity = Npc;

    fn core(&self) -> &EntityFactory {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityFactory {
        &mut self.core
    }

    fn merge_policy(&self) -> &MergePolicy {
        &MOB_POLICY
    }

    fn create(&self, area: &Area, reference: &EntityReference) -> Result<Npc, FactoryError> {
        self.core.create_by_type(area, reference, &MOB_POLICY)
    }
}

#[derive(Debug, Default, Clone)]
pub struct ItemFactory {
    core: EntityFactory,
}

impl ItemFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Factory for ItemFactory {
    type Entity = Item;

    fn core(&self) -> &EntityFactory {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityFactory {
        &mut self.core
    }

    fn merge_policy(&self) -> &MergePolicy {
        &ITEM_POLICY
    }

    fn create(&self, area: &Area, reference: &EntityReference) -> Result<Item, FactoryError> {
        self.core.create_by_type(area, reference, &ITEM_POLICY)
    }
}

#[derive(Debug, Default, Clone)]
pub struct RoomFactory {
    core: EntityFactory,
}

impl RoomFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Factory for RoomFactory {
    type Entity = Room;

    fn core(&self) -> &EntityFactory {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityFactory {
        &mut self.core
    }

    fn merge_policy(&self) -> &MergePolicy {
        &ROOM_POLICY
    }

    fn create(&self, area: &Area, reference: &EntityReference) -> Result<Room, FactoryError> {
        self.core.create_by_type(area, reference, &ROOM_POLICY)
    }
}

/// One isolated set of factories. Separate worlds hold separate values.
#[derive(Debug, Default, Clone)]
pub struct EntityFactories {
    pub mobs: MobFactory,
    pub items: ItemFactory,
    pub rooms: RoomFactory,
}

impl EntityFactories {
    pub fn new() -> Self {
        Self::default()
    }
}
