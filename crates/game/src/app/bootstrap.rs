use thiserror::Error;
use tileworld::{
    resolve_content_paths, CollisionLayer, ContentPaths, ContentRootError, DefinitionError,
    DefinitionTables, Direction, Hero, MemoryStorage, TilePos, World, WorldConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::services::LoggingScripts;

const START_MAP_ENV_VAR: &str = "TILEWORLD_START_MAP";
const START_TILE_ENV_VAR: &str = "TILEWORLD_START_TILE";
const ROUTE_ENV_VAR: &str = "TILEWORLD_ROUTE";

const DEFAULT_START_MAP: &str = "madra";
const DEFAULT_START_TILE: TilePos = TilePos::new(10, 7);
const DEFAULT_ROUTE: &str = "left,left,up,up,up,down";

pub(crate) struct AppWiring {
    pub(crate) paths: ContentPaths,
    pub(crate) world: World,
    pub(crate) start_map: String,
    pub(crate) route: Vec<Direction>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    ContentRoot(#[from] ContentRootError),
    #[error(transparent)]
    Definitions(#[from] DefinitionError),
    #[error("route has an unknown direction '{entry}' (pass it as the first argument or set {var})")]
    InvalidRoute { var: &'static str, entry: String },
    #[error("{var} must look like 'x,y', got '{raw}'")]
    InvalidStartTile { var: &'static str, raw: String },
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Tileworld Startup ===");

    let paths = resolve_content_paths()?;
    info!(root = %paths.root.display(), "content_root_resolved");

    let config = WorldConfig::load_or_default(&paths.content_dir)?;
    let tables = DefinitionTables::load_dir(&paths.content_dir)?;
    let start_tile = match std::env::var(START_TILE_ENV_VAR) {
        Ok(raw) => parse_tile(&raw).ok_or(BootstrapError::InvalidStartTile {
            var: START_TILE_ENV_VAR,
            raw,
        })?,
        Err(_) => DEFAULT_START_TILE,
    };
    let raw_route = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(ROUTE_ENV_VAR).ok())
        .unwrap_or_else(|| DEFAULT_ROUTE.to_string());
    let route = parse_route(&raw_route).map_err(|entry| BootstrapError::InvalidRoute {
        var: ROUTE_ENV_VAR,
        entry,
    })?;
    let start_map =
        std::env::var(START_MAP_ENV_VAR).unwrap_or_else(|_| DEFAULT_START_MAP.to_string());

    let world = World::new(
        config,
        tables,
        Box::new(MemoryStorage::new()),
        Box::new(LoggingScripts),
        Hero::new(start_tile, CollisionLayer::default()),
    );

    Ok(AppWiring {
        paths,
        world,
        start_map,
        route,
    })
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

/// Splits a comma separated list of direction labels. Returns the first
/// entry that is not a direction.
pub(crate) fn parse_route(raw: &str) -> Result<Vec<Direction>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| Direction::from_label(entry).ok_or_else(|| entry.to_string()))
        .collect()
}

fn parse_tile(raw: &str) -> Option<TilePos> {
    let (x, y) = raw.split_once(',')?;
    Some(TilePos::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_skips_blank_entries() {
        let route = parse_route(" up, ,left,down_right,").expect("route");
        assert_eq!(
            route,
            vec![Direction::Up, Direction::Left, Direction::DownRight]
        );
    }

    #[test]
    fn route_reports_unknown_entry() {
        assert_eq!(parse_route("up,sideways"), Err("sideways".to_string()));
    }

    #[test]
    fn shipped_content_loads() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        let paths = ContentPaths::from_root(root);
        let tables = DefinitionTables::load_dir(&paths.content_dir).expect("tables");
        WorldConfig::load_or_default(&paths.content_dir).expect("config");
        for key in ["madra", "inn"] {
            let raw = std::fs::read_to_string(paths.map_file(key)).expect("read map");
            let map = tileworld::MapDefinition::from_json_str(&raw).expect("parse map");
            for placement in &map.interactable_objects {
                tables
                    .interactable_object(&placement.key_name)
                    .expect("object kind");
            }
            for placement in &map.npcs {
                tables.npc(&placement.key_name).expect("npc kind");
            }
        }
    }

    #[test]
    fn start_tile_parses_pairs() {
        assert_eq!(parse_tile("3, -2"), Some(TilePos::new(3, -2)));
        assert_eq!(parse_tile("3"), None);
        assert_eq!(parse_tile("a,b"), None);
    }
}
