//! Whole-file JSON persistence for the entity map.
//!
//! One `FileStore` exists per process. It is an identity map keyed by
//! `"<Type>.<id>"` and owns the single persisted document. `all_mut` hands
//! out the live map on purpose: `destroy` removes entries through it and
//! tests clear it for isolation.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::core::error::KardexError;
use crate::core::model::{Entity, ModelKind};
use crate::core::schemas::CLASS_TAG;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    objects: BTreeMap<String, Entity>,
}

impl FileStore {
    /// Opens the store and immediately reloads the persisted document.
    ///
    /// A missing or unreadable file is not an error; the store just starts
    /// empty. Corrupt content (bad JSON, unknown class tag, malformed
    /// timestamp) is fatal.
    pub fn open(path: impl Into<PathBuf>) -> Result<FileStore, KardexError> {
        let mut store = FileStore {
            path: path.into(),
            objects: BTreeMap::new(),
        };
        store.reload()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The live mapping; no copy.
    pub fn all(&self) -> &BTreeMap<String, Entity> {
        &self.objects
    }

    /// The live mapping, mutable. Callers may clear it or remove entries
    /// directly; subsequent store operations see the change.
    pub fn all_mut(&mut self) -> &mut BTreeMap<String, Entity> {
        &mut self.objects
    }

    /// Files `entity` under its composite key, overwriting any previous
    /// occupant of that slot.
    pub fn new(&mut self, entity: Entity) {
        self.objects.insert(entity.key(), entity);
    }

    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.objects.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entity> {
        self.objects.get_mut(key)
    }

    /// Serializes every entity and overwrites the persisted document.
    ///
    /// Before writing, each entity must reproduce the exact key it is filed
    /// under; a mismatch means the map is corrupt and the save aborts with an
    /// integrity error. The write itself is a plain whole-file overwrite, so
    /// an I/O failure here is surfaced, never swallowed.
    pub fn save(&self) -> Result<(), KardexError> {
        let mut document = Map::new();
        for (key, entity) in &self.objects {
            if *key != entity.key() {
                return Err(KardexError::KeyMismatch {
                    key: key.clone(),
                    class_name: entity.kind().as_str().to_string(),
                    id: entity.id().to_string(),
                });
            }
            document.insert(key.clone(), Value::Object(entity.serialize()));
        }
        let text =
            serde_json::to_string(&Value::Object(document)).map_err(KardexError::Serialize)?;
        fs::write(&self.path, text)?;
        Ok(())
    }

    /// Reads the persisted document, if there is one, and rebuilds the map.
    ///
    /// Each record's class tag is resolved against the closed model set; an
    /// unknown tag is fatal rather than skipped, since dropping the record
    /// would silently lose data on the next save. Entries land under the
    /// document's own key, not a recomputed one, bypassing [`FileStore::new`].
    pub fn reload(&mut self) -> Result<(), KardexError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                return Ok(())
            }
            Err(e) => return Err(e.into()),
        };
        let document: BTreeMap<String, Map<String, Value>> =
            serde_json::from_str(&text).map_err(KardexError::Document)?;
        for (key, record) in document {
            let tag = record
                .get(CLASS_TAG)
                .and_then(Value::as_str)
                .unwrap_or_default();
            let kind = ModelKind::from_name(tag)
                .ok_or_else(|| KardexError::UnknownClassTag(tag.to_string()))?;
            let entity = Entity::reconstruct(kind, &record)?;
            self.objects.insert(key, entity);
        }
        Ok(())
    }

    /// Number of entities of one kind.
    pub fn count(&self, kind: ModelKind) -> usize {
        self.objects.values().filter(|e| e.kind() == kind).count()
    }
}
