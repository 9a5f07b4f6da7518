use crate::error::{Result, UdsError};
use crate::props::PropertyBag;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Mime classification for container objects.
pub const FOLDER_MIME: &str = "application/vnd.uds.folder";
/// Mime classification for stored chunk documents.
pub const DOCUMENT_MIME: &str = "text/plain";
/// Well-known parent ID for objects visible at the top of the user's drive.
pub const VISIBLE_ROOT: &str = "root";

/// Metadata of one remote object as the store reports it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub id: String,
    pub name: String,
    pub mime: String,
    pub parents: Vec<String>,
    pub properties: PropertyBag,
}

/// Metadata for an object about to be created (the store assigns the ID).
#[derive(Clone, Debug)]
pub struct NewObject {
    pub name: String,
    pub mime: String,
    pub parents: Vec<String>,
    pub properties: PropertyBag,
}

/// Exact-match filter over one property key.
#[derive(Clone, Debug)]
pub struct PropertyFilter {
    pub key: String,
    pub value: String,
}

impl PropertyFilter {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The remote object store the pipelines are built against.
///
/// One instance is constructed per process and injected into every call;
/// there is no hidden shared client state. Implementations use interior
/// mutability so a `&dyn ObjectStore` can be shared across upload workers.
pub trait ObjectStore: Send + Sync {
    /// One page of children of `parent_id`; `None` token means the last page.
    fn list_children(
        &self,
        parent_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<ObjectMeta>, Option<String>)>;

    fn create_object(&self, meta: &NewObject, payload: Option<&[u8]>) -> Result<String>;

    fn get_object(&self, id: &str) -> Result<ObjectMeta>;

    fn delete_object(&self, id: &str) -> Result<()>;

    fn download_payload(&self, id: &str) -> Result<Vec<u8>>;

    fn update_parents(&self, id: &str, remove: &[&str], add: &[&str]) -> Result<()>;

    fn search(&self, filter: &PropertyFilter) -> Result<Vec<ObjectMeta>>;
}

/// List every child of `parent_id`, following page tokens to exhaustion.
/// Pages are concatenated in the order the store returns them.
pub fn list_all_children(store: &dyn ObjectStore, parent_id: &str) -> Result<Vec<ObjectMeta>> {
    let mut all = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let (mut page, next) = store.list_children(parent_id, token.as_deref())?;
        all.append(&mut page);
        match next {
            Some(t) => token = Some(t),
            None => break,
        }
    }
    Ok(all)
}

/// Bounded retry for transient store failures.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// No waiting, single attempt; for tests and impatient callers.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            backoff: Duration::ZERO,
        }
    }
}

/// Run `op`, retrying [`UdsError::TransientStore`] failures with a fixed
/// backoff until the attempt bound is exhausted. Deterministic failures
/// (codec, planning, not-found) are surfaced immediately; retry cannot
/// help them.
pub fn with_retry<T>(policy: &RetryPolicy, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let attempts = policy.attempts.max(1);
    let mut last = None;
    for attempt in 1..=attempts {
        match op() {
            Ok(v) => return Ok(v),
            Err(e @ UdsError::TransientStore(_)) => {
                tracing::debug!(attempt, attempts, error = %e, "transient store error");
                last = Some(e);
                if attempt < attempts && !policy.backoff.is_zero() {
                    std::thread::sleep(policy.backoff);
                }
            }
            Err(e) => return Err(e),
        }
    }
    Err(last.unwrap_or_else(|| UdsError::TransientStore("retry bound exhausted".into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_recovers_after_transient_failures() {
        let mut calls = 0;
        let out = with_retry(&RetryPolicy::immediate(5), || {
            calls += 1;
            if calls < 3 {
                Err(UdsError::TransientStore("flaky".into()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(out.unwrap(), 3);
    }

    #[test]
    fn retry_surfaces_last_error_at_bound() {
        let mut calls = 0;
        let out: Result<()> = with_retry(&RetryPolicy::immediate(3), || {
            calls += 1;
            Err(UdsError::TransientStore(format!("try {calls}")))
        });
        assert_eq!(calls, 3);
        assert!(matches!(out, Err(UdsError::TransientStore(msg)) if msg == "try 3"));
    }

    #[test]
    fn deterministic_errors_never_retry() {
        let mut calls = 0;
        let out: Result<()> = with_retry(&RetryPolicy::immediate(5), || {
            calls += 1;
            Err(UdsError::Codec("bad alphabet".into()))
        });
        assert_eq!(calls, 1);
        assert!(matches!(out, Err(UdsError::Codec(_))));
    }
}
