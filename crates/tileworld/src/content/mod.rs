mod defs;
mod map_def;
mod tables;

pub use defs::{
    InteractableObjectDef, NpcDef, ObjectEventDescriptor, ObjectEventKind, ObjectEventOverride,
};
pub use map_def::{
    AllowedTile, InteractableObjectPlacement, MapDefinition, MapTileEventDef, MapTileEventKind,
    NpcPlacement, NpcStorageKeys, ObjectStorageKeys, ToggleEnableEventDef,
};
pub(crate) use tables::read_json_file;
pub use tables::{DefinitionError, DefinitionTables, INTERACTABLE_OBJECTS_FILE, NPCS_FILE};
