use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

mod area;
mod behavior;
mod definition;
mod entity;
mod factories;
mod factory;
pub mod loader;
mod merge;
mod reference;
mod registry;

pub use area::Area;
pub use behavior::{BehaviorManager, EventListeners, ListenerEvent, ScriptListener};
pub use definition::{
    Definition, FIELD_ATTRIBUTES, FIELD_BASE, FIELD_BEHAVIORS, FIELD_ENTITY_REFERENCE,
    FIELD_KEYWORDS, FIELD_METADATA,
};
pub use entity::{EntityInstance, InstantiateError, Item, Npc, Room, RoomExit};
pub use factories::{
    EntityFactories, ItemFactory, MobFactory, RoomFactory, ITEM_POLICY, MOB_POLICY, ROOM_POLICY,
};
pub use factory::{EntityFactory, Factory, FactoryError};
pub use loader::{
    discover_areas, load_area, load_definitions_file, AreaLoadError, AreaLoadSummary, AreaSource,
    DefinitionFileSummary,
};
pub use merge::{FieldPolicy, MergePolicy, DEFAULT_POLICY};
pub use reference::{EntityReference, ReferenceError};
pub use registry::{DefinitionError, DefinitionRegistry, MAX_BASE_DEPTH};

pub const ROOT_ENV_VAR: &str = "TEMPLATES_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub areas_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let areas_dir = root.join("assets").join("areas");
        Self { root, areas_dir }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "TEMPLATES_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/project\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    resolve_root().map(AppPaths::from_root)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
