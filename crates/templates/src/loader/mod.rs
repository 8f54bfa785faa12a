mod discovery;
mod file;
mod hashing;
mod types;

pub use discovery::{discover_areas, AreaSource};
pub use file::{load_area, load_definitions_file, ITEMS_FILE, MOBS_FILE, ROOMS_FILE};
pub use types::{AreaLoadError, AreaLoadSummary, DefinitionFileSummary};
