use std::rc::Rc;

use serde_json::json;
use templates::{
    Area, EntityFactories, EntityInstance, EntityReference, Factory, FactoryError, ListenerEvent,
    MobFactory, ScriptListener,
};
use tracing::{debug, info};

pub(crate) const SPAWN_EVENT: &str = "spawn";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SpawnReport {
    pub(crate) rooms: usize,
    pub(crate) items: usize,
    pub(crate) npcs: usize,
    pub(crate) listeners_fired: usize,
}

/// Registers one spawn listener per behavior named on each mob template.
/// The listener is built once and shared by every npc created from it.
pub(crate) fn register_behavior_listeners(mobs: &mut MobFactory) -> Result<usize, FactoryError> {
    let references = mobs
        .core()
        .definitions()
        .references()
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();

    let mut registered = 0;
    for reference in references {
        let Some(definition) = mobs.get_definition(&reference)? else {
            continue;
        };
        let behavior_names = definition
            .get(templates::FIELD_BEHAVIORS)
            .and_then(|value| value.as_object())
            .map(|behaviors| behaviors.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        for behavior in behavior_names {
            mobs.add_script_listener(reference.clone(), SPAWN_EVENT, behavior_listener(behavior));
            registered += 1;
        }
    }
    Ok(registered)
}

fn behavior_listener(behavior: String) -> ScriptListener {
    Rc::new(move |event: &ListenerEvent<'_>| {
        info!(
            entity_reference = %event.entity_reference,
            behavior = %behavior,
            event = event.event,
            payload = %event.payload,
            "behavior_triggered"
        );
    })
}

fn in_area<'a>(references: Vec<&'a EntityReference>, area: &Area) -> Vec<&'a EntityReference> {
    references
        .into_iter()
        .filter(|reference| reference.area() == area.name())
        .collect()
}

/// Instantiates every room, item and npc template of `area` once and fires
/// the spawn event on each npc.
pub(crate) fn spawn_area(
    factories: &EntityFactories,
    area: &Area,
) -> Result<SpawnReport, FactoryError> {
    let mut report = SpawnReport::default();

    for reference in in_area(factories.rooms.core().definitions().references(), area) {
        let room = factories.rooms.create(area, reference)?;
        debug!(
            entity_reference = %reference,
            title = %room.title,
            exits = room.exits.len(),
            "room_spawned"
        );
        report.rooms += 1;
    }
    for reference in in_area(factories.items.core().definitions().references(), area) {
        let item = factories.items.create(area, reference)?;
        debug!(entity_reference = %reference, name = %item.name, "item_spawned");
        report.items += 1;
    }
    for reference in in_area(factories.mobs.core().definitions().references(), area) {
        let npc = factories.mobs.create(area, reference)?;
        report.listeners_fired += npc.emit(SPAWN_EVENT, &json!({ "area": area.name() }));
        debug!(entity_reference = %reference, name = %npc.name, "npc_spawned");
        report.npcs += 1;
    }

    Ok(report)
}
