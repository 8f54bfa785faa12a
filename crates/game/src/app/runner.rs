use std::process::ExitCode;

use templates::{
    discover_areas, load_area, resolve_app_paths, AreaLoadError, EntityFactories, FactoryError,
    StartupError,
};
use thiserror::Error;
use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::spawn::{register_behavior_listeners, spawn_area};

#[derive(Debug, Error)]
pub(crate) enum RunError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    AreaLoad(#[from] AreaLoadError),
    #[error(transparent)]
    Factory(#[from] FactoryError),
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_world(&app) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run_world(app: &AppWiring) -> Result<(), RunError> {
    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), areas_dir = %paths.areas_dir.display(), "app_paths_resolved");

    let sources = discover_areas(&paths, &app.enabled_areas)?;
    let mut factories = EntityFactories::new();
    let mut definition_count = 0;
    for source in &sources {
        definition_count += load_area(source, &mut factories)?.definition_count();
    }

    let listener_count = register_behavior_listeners(&mut factories.mobs)?;
    info!(
        area_count = sources.len(),
        definition_count,
        listener_count,
        "world_definitions_ready"
    );

    for source in &sources {
        let report = spawn_area(&factories, &source.area)?;
        info!(
            area = source.area.name(),
            rooms = report.rooms,
            items = report.items,
            npcs = report.npcs,
            listeners_fired = report.listeners_fired,
            "area_spawned"
        );
    }
    Ok(())
}
