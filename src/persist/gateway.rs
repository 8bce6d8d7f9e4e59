//! The persistence boundary: the store serialized to a JSON blob and
//! handed to a gateway.
//!
//! The gateway is an external collaborator; the core only fixes the blob
//! contract. Loading merges the blob over the default initial state —
//! every field of the store has a serde default, so a partial or
//! older-format blob still loads, blob fields taking precedence. The
//! color pool is derived state and is rebuilt from the loaded operation
//! records.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use crate::store::Store;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("state blob serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where state blobs go and come from. Implementations decide the medium
/// (file, browser storage bridge, test memory).
pub trait PersistenceGateway {
    fn save(&mut self, blob: &str) -> Result<(), PersistError>;
    /// Returns `None` when no blob has ever been written.
    fn load(&mut self) -> Result<Option<String>, PersistError>;
}

/// Serializes the store into its state blob.
pub fn to_blob(store: &Store) -> Result<String, PersistError> {
    Ok(serde_json::to_string(store)?)
}

/// Loads the store from the gateway, merging over the default state.
///
/// A missing blob yields the default store; a corrupt blob is logged and
/// also falls back to the default rather than failing startup.
pub fn load_store<G: PersistenceGateway>(gateway: &mut G) -> Result<Store, PersistError> {
    let Some(text) = gateway.load()? else {
        return Ok(Store::default());
    };
    let mut store = match serde_json::from_str::<Store>(&text) {
        Ok(store) => store,
        Err(err) => {
            warn!(%err, "state blob is corrupt, starting from defaults");
            Store::default()
        }
    };
    store.rebuild_color_pool();
    Ok(store)
}

/// File-backed gateway. Saves go through a temporary file in the target
/// directory followed by a rename, so a crash mid-write never leaves a
/// truncated blob behind.
#[derive(Debug)]
pub struct FileGateway {
    path: PathBuf,
}

impl FileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PersistenceGateway for FileGateway {
    fn save(&mut self, blob: &str) -> Result<(), PersistError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => std::path::Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(blob.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| PersistError::Io(e.error))?;
        Ok(())
    }

    fn load(&mut self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OP_COLORS;

    fn populated_store() -> Store {
        let mut store = Store::new();
        let a = store.add_scenario();
        let b = store.add_scenario();
        let op = store.add_operation(a, None).unwrap();
        store.update_operation(op, "fee", "2");
        store.attach_node(b, op, None).unwrap();
        store.toggle_collapse(b);
        store
    }

    #[test]
    fn file_gateway_roundtrips_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = FileGateway::new(dir.path().join("state.json"));

        let store = populated_store();
        gateway.save(&to_blob(&store).unwrap()).unwrap();

        let loaded = load_store(&mut gateway).unwrap();
        assert_eq!(loaded.scenario_count(), 2);
        assert_eq!(loaded.operations().len(), 1);
        assert_eq!(loaded.collapsed_ids().len(), 1);
        assert_eq!(loaded.displayed_ids().len(), 2);
        // Derived pool was rebuilt: the shared operation's tag is held.
        assert!(!loaded.colors().is_free(OP_COLORS[0]));
    }

    #[test]
    fn missing_blob_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = FileGateway::new(dir.path().join("absent.json"));
        let store = load_store(&mut gateway).unwrap();
        assert_eq!(store.scenario_count(), 0);
        assert_eq!(store.language(), "ru");
    }

    #[test]
    fn corrupt_blob_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{{{nope").unwrap();
        let mut gateway = FileGateway::new(path);
        let store = load_store(&mut gateway).unwrap();
        assert_eq!(store.scenario_count(), 0);
    }

    #[test]
    fn partial_blob_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"language":"en"}"#).unwrap();
        let mut gateway = FileGateway::new(path);
        let store = load_store(&mut gateway).unwrap();
        assert_eq!(store.language(), "en");
        assert_eq!(store.scenario_count(), 0);
    }

    #[test]
    fn blob_uses_camel_case_list_fields() {
        let store = populated_store();
        let blob = to_blob(&store).unwrap();
        let json: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert!(json.get("collapsedScenariosIds").is_some());
        assert!(json.get("displayedScenariosIds").is_some());
        assert!(json.get("scenarios").is_some());
        assert!(json.get("operations").is_some());
        assert!(json.get("language").is_some());
    }
}
