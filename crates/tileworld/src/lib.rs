use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod collision;
pub mod config;
pub mod content;
pub mod events;
pub mod location;
pub mod map;
pub mod objects;
pub mod script;
pub mod session;
pub mod storage;
pub mod tile;
pub mod transition;
pub mod world;

#[cfg(test)]
mod test_support;

pub use collision::{
    BodyId, BodyKind, BodyRecord, CollisionGroupId, CollisionLayer, CollisionLayerSet,
};
pub use config::{WorldConfig, WORLD_CONFIG_FILE};
pub use content::{DefinitionError, DefinitionTables, MapDefinition};
pub use events::{
    ClimbEvent, EventRegistry, EventType, FireOutcome, IgnoreReason, JumpEvent, LayerBinding,
    RopeEvent, RopeRole, TeleportEvent, TileEvent, TileEventId, TileEventIdAllocator,
    TileEventKind, TileEventSpec,
};
pub use location::LocationKey;
pub use map::GameMap;
pub use objects::{InteractableObject, InteractableObjectSpawner, Npc, ObjectId};
pub use script::{ScriptedEvent, ScriptedEventProvider, ToggleEnableBinding};
pub use session::{EventGuard, Hero, SessionGates};
pub use storage::{MemoryStorage, Storage, StorageValue};
pub use tile::{Direction, DirectionSet, TilePos, Vec2};
pub use transition::{
    MapLoadError, MapLoader, MapTransitionCoordinator, TeleportPhase, TeleportPlan,
    TransitionError, TransitionOutcome, WorldServices,
};
pub use world::World;

pub const ROOT_ENV_VAR: &str = "TILEWORLD_ROOT";

/// Directories the content loaders read from.
#[derive(Debug, Clone)]
pub struct ContentPaths {
    pub root: PathBuf,
    pub content_dir: PathBuf,
    pub maps_dir: PathBuf,
}

impl ContentPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let content_dir = root.join("assets").join("content");
        let maps_dir = content_dir.join("maps");
        Self {
            root,
            content_dir,
            maps_dir,
        }
    }

    pub fn map_file(&self, key: &str) -> PathBuf {
        self.maps_dir.join(format!("{key}.json"))
    }
}

#[derive(Debug, Error)]
pub enum ContentRootError {
    #[error("{}={} has no Cargo.toml and assets/ directory", ROOT_ENV_VAR, .path.display())]
    InvalidEnvRoot { path: PathBuf },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error(
        "no directory above {} holds Cargo.toml and assets/; set {}",
        .exe.display(),
        ROOT_ENV_VAR
    )]
    RootNotFound { exe: PathBuf },
}

/// `TILEWORLD_ROOT` when set, otherwise the nearest ancestor of the running
/// binary that holds both `Cargo.toml` and `assets/`.
pub fn resolve_content_paths() -> Result<ContentPaths, ContentRootError> {
    if let Some(root) = env::var_os(ROOT_ENV_VAR) {
        let root = PathBuf::from(root);
        if !has_content(&root) {
            return Err(ContentRootError::InvalidEnvRoot { path: root });
        }
        return Ok(ContentPaths::from_root(root));
    }
    let exe = env::current_exe().map_err(ContentRootError::CurrentExe)?;
    match exe.ancestors().find(|dir| has_content(dir)) {
        Some(root) => Ok(ContentPaths::from_root(root.to_path_buf())),
        None => Err(ContentRootError::RootNotFound { exe }),
    }
}

fn has_content(dir: &Path) -> bool {
    dir.join("Cargo.toml").is_file() && dir.join("assets").is_dir()
}
