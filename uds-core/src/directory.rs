//! Catalog of container objects and the local name index.

use crate::error::{Result, UdsError};
use crate::props::{self, ContainerProps, PropertyBag};
use crate::store::{FOLDER_MIME, NewObject, ObjectMeta, ObjectStore, PropertyFilter, VISIBLE_ROOT};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const ROOT_NAME: &str = "UDS Root";

/// One logical file as the catalog sees it.
#[derive(Clone, Debug)]
pub struct LogicalFile {
    pub name: String,
    pub container_id: String,
    pub byte_size: Option<u64>,
    pub encoded_size: Option<u64>,
    pub digest: Option<String>,
}

impl LogicalFile {
    fn from_meta(meta: &ObjectMeta) -> Self {
        let p = ContainerProps::from_bag(&meta.properties);
        Self {
            name: meta.name.clone(),
            container_id: meta.id.clone(),
            byte_size: p.size,
            encoded_size: p.encoded_size,
            digest: p.digest,
        }
    }
}

/// Locate the hidden root container, creating it on first use.
///
/// The root is tagged `udsRoot=true` and un-parented from the visible root so
/// it stays out of the user's view.
pub fn root_container(store: &dyn ObjectStore) -> Result<ObjectMeta> {
    let filter = PropertyFilter::new(props::PROP_UDS_ROOT, "true");
    let mut roots = store.search(&filter)?;
    match roots.len() {
        0 => {
            let mut bag = PropertyBag::new();
            bag.insert(props::PROP_UDS_ROOT.into(), "true".into());
            let id = store.create_object(
                &NewObject {
                    name: ROOT_NAME.into(),
                    mime: FOLDER_MIME.into(),
                    parents: vec![VISIBLE_ROOT.into()],
                    properties: bag,
                },
                None,
            )?;
            store.update_parents(&id, &[VISIBLE_ROOT], &[])?;
            tracing::info!(%id, "created root container");
            store.get_object(&id)
        }
        1 => Ok(roots.remove(0)),
        n => Err(UdsError::Format(format!("{n} UDS roots found, expected one"))),
    }
}

/// All known logical files, optionally filtered by a case-insensitive
/// name-contains query.
pub fn list_all(store: &dyn ObjectStore, query: Option<&str>) -> Result<Vec<LogicalFile>> {
    let filter = PropertyFilter::new(props::PROP_UDS, "true");
    let needle = query.map(str::to_ascii_lowercase);
    Ok(store
        .search(&filter)?
        .iter()
        .filter(|m| match &needle {
            Some(q) => m.name.to_ascii_lowercase().contains(q),
            None => true,
        })
        .map(LogicalFile::from_meta)
        .collect())
}

/// Delete a container and its chunk children after checking it actually
/// carries the UDS tag. An untagged object is a distinct condition from a
/// missing one.
pub fn delete_container(store: &dyn ObjectStore, id: &str) -> Result<()> {
    let meta = store.get_object(id)?;
    if !props::is_uds_tagged(&meta.properties) {
        return Err(UdsError::NotUds(id.into()));
    }
    for child in crate::store::list_all_children(store, id)? {
        store.delete_object(&child.id)?;
    }
    store.delete_object(id)
}

/// Local `name -> containerId` lookup, persisted as a JSON map.
///
/// Read-modified-written as a whole on every save; concurrent writers are
/// not supported (last writer wins).
#[derive(Debug)]
pub struct NameIndex {
    path: PathBuf,
    map: BTreeMap<String, String>,
}

impl NameIndex {
    pub fn load(path: &Path) -> Result<Self> {
        let map = match fs::read(path) {
            Ok(raw) => serde_json::from_slice(&raw)
                .map_err(|e| UdsError::Format(format!("name index decode: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_vec_pretty(&self.map)
            .map_err(|e| UdsError::Format(format!("name index encode: {e}")))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    pub fn record(&mut self, name: &str, container_id: &str) {
        self.map.insert(name.into(), container_id.into());
    }

    pub fn resolve(&self, name: &str) -> Result<&str> {
        self.map
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| UdsError::NotFound(name.into()))
    }

    /// Drop every entry pointing at `container_id`.
    pub fn forget(&mut self, container_id: &str) {
        self.map.retain(|_, id| id != container_id);
    }

    /// Rebuild the index from a live catalog listing.
    pub fn refresh(&mut self, store: &dyn ObjectStore) -> Result<()> {
        self.map.clear();
        for lf in list_all(store, None)? {
            self.map.insert(lf.name, lf.container_id);
        }
        self.save()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_mem::MemoryStore;

    #[test]
    fn root_is_created_once_and_hidden() {
        let store = MemoryStore::new();
        let first = root_container(&store).unwrap();
        assert!(first.parents.is_empty(), "root must be un-parented");
        let second = root_container(&store).unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn delete_distinguishes_untagged_from_missing() {
        let store = MemoryStore::new();
        let plain = store
            .create_object(
                &NewObject {
                    name: "ordinary".into(),
                    mime: FOLDER_MIME.into(),
                    parents: vec![],
                    properties: PropertyBag::new(),
                },
                None,
            )
            .unwrap();
        assert!(matches!(
            delete_container(&store, &plain),
            Err(UdsError::NotUds(_))
        ));
        assert!(matches!(
            delete_container(&store, "obj-999999"),
            Err(UdsError::NotFound(_))
        ));
    }

    #[test]
    fn name_index_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        {
            let mut idx = NameIndex::load(&path).unwrap();
            assert!(idx.is_empty());
            idx.record("report.pdf", "obj-000007");
            idx.record("video.mkv", "obj-000009");
            idx.forget("obj-000009");
            idx.save().unwrap();
        }
        let idx = NameIndex::load(&path).unwrap();
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.resolve("report.pdf").unwrap(), "obj-000007");
        assert!(matches!(
            idx.resolve("video.mkv"),
            Err(UdsError::NotFound(_))
        ));
    }
}
