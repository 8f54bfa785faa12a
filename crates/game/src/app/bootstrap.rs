use tracing::info;
use tracing_subscriber::EnvFilter;

const ENABLED_AREAS_ENV_VAR: &str = "TEMPLATES_AREAS";

pub(crate) struct AppWiring {
    pub(crate) enabled_areas: Vec<String>,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Entity Templates Startup ===");

    AppWiring {
        enabled_areas: parse_enabled_areas(std::env::var(ENABLED_AREAS_ENV_VAR).ok().as_deref()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_enabled_areas(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
    })
    .unwrap_or_default()
}
