use crate::error::Result;
use crate::store::ObjectStore;
use crate::store_fs::FsStore;
use crate::store_mem::MemoryStore;
use std::path::Path;

pub enum Backend {
    Fs,
    /// Volatile backend for offline runs and tests; `root` is ignored.
    Memory,
}

pub fn open_store(backend: Backend, root: &Path) -> Result<Box<dyn ObjectStore>> {
    match backend {
        Backend::Fs => Ok(Box::new(FsStore::open(root)?)),
        Backend::Memory => Ok(Box::new(MemoryStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::PropertyBag;
    use crate::store::{DOCUMENT_MIME, NewObject};

    fn doc(name: &str) -> NewObject {
        NewObject {
            name: name.into(),
            mime: DOCUMENT_MIME.into(),
            parents: vec![],
            properties: PropertyBag::new(),
        }
    }

    #[test]
    fn fs_backend_opens_at_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(Backend::Fs, dir.path()).unwrap();
        let id = store.create_object(&doc("one"), Some(b"x")).unwrap();
        assert_eq!(store.get_object(&id).unwrap().name, "one");
        assert!(dir.path().join("objects").exists());
    }

    #[test]
    fn memory_backend_ignores_root() {
        let store = open_store(Backend::Memory, Path::new("/does/not/exist")).unwrap();
        let id = store.create_object(&doc("two"), None).unwrap();
        assert_eq!(store.get_object(&id).unwrap().name, "two");
    }
}
