use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::area::Area;
use crate::definition::Definition;
use crate::factories::EntityFactories;
use crate::factory::Factory;

use super::discovery::AreaSource;
use super::hashing::hash_bytes_hex;
use super::types::{AreaLoadError, AreaLoadSummary, DefinitionFileSummary};

pub const MOBS_FILE: &str = "mobs.json";
pub const ITEMS_FILE: &str = "items.json";
pub const ROOMS_FILE: &str = "rooms.json";

#[derive(Debug, Deserialize)]
struct AuthoredDefinition {
    id: u32,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Registers every definition in `path` with `factory`, keyed by
/// `<area>:<id>`. A missing file registers nothing.
pub fn load_definitions_file<F: Factory>(
    factory: &mut F,
    area: &Area,
    path: &Path,
) -> Result<DefinitionFileSummary, AreaLoadError> {
    if !path.is_file() {
        return Ok(DefinitionFileSummary::absent(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|source| AreaLoadError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let authored = parse_definition_list(path, &bytes)?;

    let mut seen = HashSet::<u32>::new();
    for entry in &authored {
        if !seen.insert(entry.id) {
            return Err(AreaLoadError::DuplicateId {
                path: path.to_path_buf(),
                id: entry.id,
            });
        }
    }

    let definition_count = authored.len();
    for entry in authored {
        let reference = factory.create_entity_ref(area.name(), entry.id);
        let mut fields = entry.fields;
        fields.insert("id".to_string(), Value::from(entry.id));
        factory.set_definition(reference, Definition::from_fields(fields));
    }

    Ok(DefinitionFileSummary {
        path: path.to_path_buf(),
        present: true,
        definition_count,
        input_hash_sha256_hex: Some(hash_bytes_hex(&bytes)),
    })
}

/// Loads the mob, item and room files of one area into `factories`.
pub fn load_area(
    source: &AreaSource,
    factories: &mut EntityFactories,
) -> Result<AreaLoadSummary, AreaLoadError> {
    let area = &source.area;
    let mobs = load_definitions_file(&mut factories.mobs, area, &source.source_dir.join(MOBS_FILE))?;
    let items =
        load_definitions_file(&mut factories.items, area, &source.source_dir.join(ITEMS_FILE))?;
    let rooms =
        load_definitions_file(&mut factories.rooms, area, &source.source_dir.join(ROOMS_FILE))?;

    let summary = AreaLoadSummary {
        area: area.clone(),
        mobs,
        items,
        rooms,
    };
    info!(
        area = area.name(),
        load_index = source.load_index,
        mob_count = summary.mobs.definition_count,
        item_count = summary.items.definition_count,
        room_count = summary.rooms.definition_count,
        mobs_hash = summary.mobs.input_hash_sha256_hex.as_deref().unwrap_or("-"),
        "area_definitions_loaded"
    );
    Ok(summary)
}

fn parse_definition_list(
    path: &Path,
    bytes: &[u8],
) -> Result<Vec<AuthoredDefinition>, AreaLoadError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, Vec<AuthoredDefinition>>(&mut deserializer).map_err(
        |error| {
            let location = error.path().to_string();
            let source = error.into_inner();
            AreaLoadError::Parse {
                path: path.to_path_buf(),
                location: if location.is_empty() || location == "." {
                    format!("line {} column {}", source.line(), source.column())
                } else {
                    location
                },
                message: source.to_string(),
            }
        },
    )
}
