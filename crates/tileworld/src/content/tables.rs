use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;

use super::defs::{InteractableObjectDef, NpcDef};

pub const INTERACTABLE_OBJECTS_FILE: &str = "interactable_objects.json";
pub const NPCS_FILE: &str = "npcs.json";

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("unknown interactable object key '{key}'")]
    UnknownInteractableObject { key: String },
    #[error("unknown npc key '{key}'")]
    UnknownNpc { key: String },
    #[error("duplicate {table} definition '{key}'")]
    Duplicate { table: &'static str, key: String },
    #[error("malformed definition at '{path}': {message}")]
    Malformed { path: String, message: String },
    #[error("failed to read definition file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read-only definition tables keyed by object/NPC key.
#[derive(Debug, Clone, Default)]
pub struct DefinitionTables {
    interactable_objects: HashMap<String, InteractableObjectDef>,
    npcs: HashMap<String, NpcDef>,
}

impl DefinitionTables {
    pub fn from_defs(
        interactable_objects: Vec<InteractableObjectDef>,
        npcs: Vec<NpcDef>,
    ) -> Result<Self, DefinitionError> {
        let mut tables = Self::default();
        for def in interactable_objects {
            if tables.interactable_objects.contains_key(&def.key_name) {
                return Err(DefinitionError::Duplicate {
                    table: "interactable object",
                    key: def.key_name,
                });
            }
            tables.interactable_objects.insert(def.key_name.clone(), def);
        }
        for def in npcs {
            if tables.npcs.contains_key(&def.key_name) {
                return Err(DefinitionError::Duplicate {
                    table: "npc",
                    key: def.key_name,
                });
            }
            tables.npcs.insert(def.key_name.clone(), def);
        }
        Ok(tables)
    }

    /// Loads both tables from `dir`. A missing NPC table means no NPC kinds.
    pub fn load_dir(dir: &Path) -> Result<Self, DefinitionError> {
        let objects_path = dir.join(INTERACTABLE_OBJECTS_FILE);
        let interactable_objects: Vec<InteractableObjectDef> = read_json_file(&objects_path)?;
        let npcs_path = dir.join(NPCS_FILE);
        let npcs: Vec<NpcDef> = if npcs_path.is_file() {
            read_json_file(&npcs_path)?
        } else {
            Vec::new()
        };
        let tables = Self::from_defs(interactable_objects, npcs)?;
        info!(
            dir = %dir.display(),
            interactable_object_defs = tables.interactable_objects.len(),
            npc_defs = tables.npcs.len(),
            "definition_tables_loaded"
        );
        Ok(tables)
    }

    pub fn interactable_object(&self, key: &str) -> Result<&InteractableObjectDef, DefinitionError> {
        self.interactable_objects
            .get(key)
            .ok_or_else(|| DefinitionError::UnknownInteractableObject {
                key: key.to_string(),
            })
    }

    pub fn npc(&self, key: &str) -> Result<&NpcDef, DefinitionError> {
        self.npcs.get(key).ok_or_else(|| DefinitionError::UnknownNpc {
            key: key.to_string(),
        })
    }
}

pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, DefinitionError> {
    let raw = fs::read_to_string(path).map_err(|source| DefinitionError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(&raw)
}

pub(crate) fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, DefinitionError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        DefinitionError::Malformed {
            path: error.path().to_string(),
            message: error.inner().to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write_file(path: &Path, content: &str) {
        fs::write(path, content).expect("write");
    }

    #[test]
    fn load_dir_reads_both_tables() {
        let temp = TempDir::new().expect("temp");
        write_file(
            &temp.path().join(INTERACTABLE_OBJECTS_FILE),
            r#"[{"key_name": "pillar", "body_radius": 7, "events": [{"type": "jump"}]}]"#,
        );
        write_file(
            &temp.path().join(NPCS_FILE),
            r#"[{"key_name": "guard", "body_radius": 5}]"#,
        );
        let tables = DefinitionTables::load_dir(temp.path()).expect("load");
        assert_eq!(tables.interactable_object("pillar").expect("pillar").events.len(), 1);
        assert!(tables.npc("guard").is_ok());
    }

    #[test]
    fn missing_npc_table_is_empty() {
        let temp = TempDir::new().expect("temp");
        write_file(&temp.path().join(INTERACTABLE_OBJECTS_FILE), "[]");
        let tables = DefinitionTables::load_dir(temp.path()).expect("load");
        assert!(matches!(
            tables.npc("guard"),
            Err(DefinitionError::UnknownNpc { .. })
        ));
    }

    #[test]
    fn unknown_object_key_is_an_error() {
        let tables = DefinitionTables::default();
        let err = tables.interactable_object("ghost").expect_err("err");
        assert_eq!(err.to_string(), "unknown interactable object key 'ghost'");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let def = InteractableObjectDef {
            key_name: "pillar".to_string(),
            body_radius: 0.0,
            events: Vec::new(),
        };
        let err = DefinitionTables::from_defs(vec![def.clone(), def], Vec::new()).expect_err("err");
        assert!(matches!(err, DefinitionError::Duplicate { .. }));
    }

    #[test]
    fn missing_objects_table_reports_path() {
        let temp = TempDir::new().expect("temp");
        let err = DefinitionTables::load_dir(temp.path()).expect_err("err");
        match err {
            DefinitionError::ReadFile { path, .. } => {
                assert!(path.ends_with(INTERACTABLE_OBJECTS_FILE));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn malformed_table_reports_json_path() {
        let temp = TempDir::new().expect("temp");
        write_file(
            &temp.path().join(INTERACTABLE_OBJECTS_FILE),
            r#"[{"key_name": "pillar", "body_radius": "wide"}]"#,
        );
        let err = DefinitionTables::load_dir(temp.path()).expect_err("err");
        match err {
            DefinitionError::Malformed { path, .. } => assert_eq!(path, "[0].body_radius"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
