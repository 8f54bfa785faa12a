use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::area::Area;
use crate::reference::EntityReference;
use crate::AppPaths;

use super::types::AreaLoadError;

#[derive(Debug, Clone)]
pub struct AreaSource {
    pub area: Area,
    pub load_index: u32,
    pub source_dir: PathBuf,
}

/// Areas to load, in load order.
///
/// With no enabled areas every directory under `areas_dir` is loaded in name
/// order; otherwise exactly the enabled areas are loaded in the given order.
pub fn discover_areas(
    app_paths: &AppPaths,
    enabled_areas: &[String],
) -> Result<Vec<AreaSource>, AreaLoadError> {
    let names = if enabled_areas.is_empty() {
        list_area_dirs(&app_paths.areas_dir)?
    } else {
        validate_enabled(app_paths, enabled_areas)?
    };

    Ok(names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| AreaSource {
            source_dir: app_paths.areas_dir.join(&name),
            area: Area::new(name),
            load_index: idx as u32,
        })
        .collect())
}

fn validate_enabled(
    app_paths: &AppPaths,
    enabled_areas: &[String],
) -> Result<Vec<String>, AreaLoadError> {
    let mut seen = HashSet::<String>::new();
    let mut names = Vec::with_capacity(enabled_areas.len());
    for area in enabled_areas {
        let trimmed = area.trim();
        if trimmed.is_empty() {
            return Err(AreaLoadError::EmptyEnabledArea);
        }
        if !seen.insert(trimmed.to_string()) {
            return Err(AreaLoadError::DuplicateEnabledArea {
                area: trimmed.to_string(),
            });
        }
        let area_dir = app_paths.areas_dir.join(trimmed);
        check_area_name(trimmed, &area_dir)?;
        if !area_dir.is_dir() {
            return Err(AreaLoadError::EnabledAreaMissing {
                area: trimmed.to_string(),
                expected_dir: area_dir,
            });
        }
        names.push(trimmed.to_string());
    }
    Ok(names)
}

fn list_area_dirs(areas_dir: &Path) -> Result<Vec<String>, AreaLoadError> {
    if !areas_dir.is_dir() {
        warn!(areas_dir = %areas_dir.display(), "areas_dir_missing");
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(areas_dir).map_err(|source| AreaLoadError::ReadDir {
        path: areas_dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| AreaLoadError::ReadDirEntry {
            path: areas_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        check_area_name(&name, &path)?;
        names.push(name);
    }
    names.sort();
    Ok(names)
}

// Area names become the area half of every entity key loaded from them.
fn check_area_name(name: &str, path: &Path) -> Result<(), AreaLoadError> {
    EntityReference::validate_area(name).map_err(|source| AreaLoadError::InvalidAreaName {
        path: path.to_path_buf(),
        source,
    })
}
