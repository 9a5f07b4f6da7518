use crate::error::{Result, UdsError};
use crate::store::{NewObject, ObjectMeta, ObjectStore, PropertyFilter};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const META_FILE: &str = "meta.json";
const PAYLOAD_FILE: &str = "payload";
const PAGE_SIZE: usize = 100;

/// Directory-backed store: one subdirectory per object holding `meta.json`
/// and an optional `payload` file. Backs the CLI so pushed data survives the
/// process; the layout is also easy to inspect by hand.
pub struct FsStore {
    objects_dir: PathBuf,
}

impl FsStore {
    pub fn open(root: &Path) -> Result<Self> {
        let objects_dir = root.join("objects");
        fs::create_dir_all(&objects_dir)?;
        Ok(Self { objects_dir })
    }

    fn object_dir(&self, id: &str) -> PathBuf {
        self.objects_dir.join(id)
    }

    fn read_meta(&self, id: &str) -> Result<ObjectMeta> {
        let path = self.object_dir(id).join(META_FILE);
        let raw = fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => UdsError::NotFound(id.into()),
            _ => UdsError::Io(e),
        })?;
        serde_json::from_slice(&raw)
            .map_err(|e| UdsError::Format(format!("corrupt metadata for {id}: {e}")))
    }

    fn write_meta(&self, meta: &ObjectMeta) -> Result<()> {
        let raw = serde_json::to_vec_pretty(meta)
            .map_err(|e| UdsError::Format(format!("metadata encode: {e}")))?;
        fs::write(self.object_dir(&meta.id).join(META_FILE), raw)?;
        Ok(())
    }

    /// All object metas, sorted by ID for a stable listing order.
    fn scan(&self) -> Result<Vec<ObjectMeta>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.objects_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                ids.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        ids.sort();
        ids.iter().map(|id| self.read_meta(id)).collect()
    }
}

impl ObjectStore for FsStore {
    fn list_children(
        &self,
        parent_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<ObjectMeta>, Option<String>)> {
        let children: Vec<ObjectMeta> = self
            .scan()?
            .into_iter()
            .filter(|m| m.parents.iter().any(|p| p == parent_id))
            .collect();
        let offset: usize = page_token
            .map(|t| {
                t.parse()
                    .map_err(|_| UdsError::Format(format!("bad page token: {t:?}")))
            })
            .transpose()?
            .unwrap_or(0)
            .min(children.len());
        let end = (offset + PAGE_SIZE).min(children.len());
        let next = (end < children.len()).then(|| end.to_string());
        Ok((children[offset..end].to_vec(), next))
    }

    fn create_object(&self, meta: &NewObject, payload: Option<&[u8]>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let dir = self.object_dir(&id);
        fs::create_dir_all(&dir)?;
        if let Some(p) = payload {
            fs::write(dir.join(PAYLOAD_FILE), p)?;
        }
        self.write_meta(&ObjectMeta {
            id: id.clone(),
            name: meta.name.clone(),
            mime: meta.mime.clone(),
            parents: meta.parents.clone(),
            properties: meta.properties.clone(),
        })?;
        Ok(id)
    }

    fn get_object(&self, id: &str) -> Result<ObjectMeta> {
        self.read_meta(id)
    }

    fn delete_object(&self, id: &str) -> Result<()> {
        let dir = self.object_dir(id);
        if !dir.exists() {
            return Err(UdsError::NotFound(id.into()));
        }
        fs::remove_dir_all(dir)?;
        Ok(())
    }

    fn download_payload(&self, id: &str) -> Result<Vec<u8>> {
        // Meta read first so a missing object reports NotFound, not Io.
        self.read_meta(id)?;
        let path = self.object_dir(id).join(PAYLOAD_FILE);
        fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => UdsError::Format(format!("object {id} has no payload")),
            _ => UdsError::Io(e),
        })
    }

    fn update_parents(&self, id: &str, remove: &[&str], add: &[&str]) -> Result<()> {
        let mut meta = self.read_meta(id)?;
        meta.parents.retain(|p| !remove.contains(&p.as_str()));
        for a in add {
            if !meta.parents.iter().any(|p| p == a) {
                meta.parents.push((*a).to_string());
            }
        }
        self.write_meta(&meta)
    }

    fn search(&self, filter: &PropertyFilter) -> Result<Vec<ObjectMeta>> {
        Ok(self
            .scan()?
            .into_iter()
            .filter(|m| {
                m.properties
                    .get(&filter.key)
                    .map(|v| *v == filter.value)
                    .unwrap_or(false)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::PropertyBag;
    use crate::store::DOCUMENT_MIME;

    #[test]
    fn objects_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let store = FsStore::open(dir.path()).unwrap();
            store
                .create_object(
                    &NewObject {
                        name: "part0".into(),
                        mime: DOCUMENT_MIME.into(),
                        parents: vec!["folder".into()],
                        properties: PropertyBag::new(),
                    },
                    Some(b"QUJD"),
                )
                .unwrap()
        };

        let store = FsStore::open(dir.path()).unwrap();
        let meta = store.get_object(&id).unwrap();
        assert_eq!(meta.name, "part0");
        assert_eq!(store.download_payload(&id).unwrap(), b"QUJD");

        store.delete_object(&id).unwrap();
        assert!(matches!(
            store.get_object(&id),
            Err(UdsError::NotFound(_))
        ));
    }
}
