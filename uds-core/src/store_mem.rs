use crate::error::{Result, UdsError};
use crate::store::{NewObject, ObjectMeta, ObjectStore, PropertyFilter};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Clone)]
struct Stored {
    meta: ObjectMeta,
    payload: Option<Vec<u8>>,
}

/// In-memory store used by tests and offline runs.
///
/// `BTreeMap` keeps listing order stable across runs; pagination and
/// transient-failure injection let tests exercise the pipelines' paging and
/// retry paths without a network.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    page_size: usize,
    fail_next: AtomicU32,
}

struct Inner {
    objects: BTreeMap<String, Stored>,
    next_id: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                objects: BTreeMap::new(),
                next_id: 1,
            }),
            page_size: page_size.max(1),
            fail_next: AtomicU32::new(0),
        }
    }

    /// Make the next `n` store calls fail with a transient error.
    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Overwrite a stored payload in place; for corruption tests.
    pub fn tamper_payload(&self, id: &str, payload: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(s) = inner.objects.get_mut(id) {
            s.payload = Some(payload.to_vec());
        }
    }

    pub fn object_count(&self) -> usize {
        self.inner.lock().unwrap().objects.len()
    }

    fn trip(&self) -> Result<()> {
        let prev = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .unwrap_or(0);
        if prev > 0 {
            Err(UdsError::TransientStore("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

impl ObjectStore for MemoryStore {
    fn list_children(
        &self,
        parent_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<ObjectMeta>, Option<String>)> {
        self.trip()?;
        let inner = self.inner.lock().unwrap();
        let children: Vec<ObjectMeta> = inner
            .objects
            .values()
            .filter(|s| s.meta.parents.iter().any(|p| p == parent_id))
            .map(|s| s.meta.clone())
            .collect();

        let offset: usize = page_token
            .map(|t| {
                t.parse()
                    .map_err(|_| UdsError::Format(format!("bad page token: {t:?}")))
            })
            .transpose()?
            .unwrap_or(0)
            .min(children.len());
        let end = (offset + self.page_size).min(children.len());
        let next = (end < children.len()).then(|| end.to_string());
        Ok((children[offset..end].to_vec(), next))
    }

    fn create_object(&self, meta: &NewObject, payload: Option<&[u8]>) -> Result<String> {
        self.trip()?;
        let mut inner = self.inner.lock().unwrap();
        let id = format!("obj-{:06}", inner.next_id);
        inner.next_id += 1;
        inner.objects.insert(
            id.clone(),
            Stored {
                meta: ObjectMeta {
                    id: id.clone(),
                    name: meta.name.clone(),
                    mime: meta.mime.clone(),
                    parents: meta.parents.clone(),
                    properties: meta.properties.clone(),
                },
                payload: payload.map(|p| p.to_vec()),
            },
        );
        Ok(id)
    }

    fn get_object(&self, id: &str) -> Result<ObjectMeta> {
        self.trip()?;
        let inner = self.inner.lock().unwrap();
        inner
            .objects
            .get(id)
            .map(|s| s.meta.clone())
            .ok_or_else(|| UdsError::NotFound(id.into()))
    }

    fn delete_object(&self, id: &str) -> Result<()> {
        self.trip()?;
        let mut inner = self.inner.lock().unwrap();
        inner
            .objects
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| UdsError::NotFound(id.into()))
    }

    fn download_payload(&self, id: &str) -> Result<Vec<u8>> {
        self.trip()?;
        let inner = self.inner.lock().unwrap();
        let stored = inner
            .objects
            .get(id)
            .ok_or_else(|| UdsError::NotFound(id.into()))?;
        stored
            .payload
            .clone()
            .ok_or_else(|| UdsError::Format(format!("object {id} has no payload")))
    }

    fn update_parents(&self, id: &str, remove: &[&str], add: &[&str]) -> Result<()> {
        self.trip()?;
        let mut inner = self.inner.lock().unwrap();
        let stored = inner
            .objects
            .get_mut(id)
            .ok_or_else(|| UdsError::NotFound(id.into()))?;
        stored.meta.parents.retain(|p| !remove.contains(&p.as_str()));
        for a in add {
            if !stored.meta.parents.iter().any(|p| p == a) {
                stored.meta.parents.push((*a).to_string());
            }
        }
        Ok(())
    }

    fn search(&self, filter: &PropertyFilter) -> Result<Vec<ObjectMeta>> {
        self.trip()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .objects
            .values()
            .filter(|s| {
                s.meta
                    .properties
                    .get(&filter.key)
                    .map(|v| *v == filter.value)
                    .unwrap_or(false)
            })
            .map(|s| s.meta.clone())
            .collect())
    }
}
