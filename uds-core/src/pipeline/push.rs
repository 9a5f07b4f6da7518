//! Upload pipeline: one source file becomes one container of encoded chunks.

use crate::codec;
use crate::digest::file_digest;
use crate::directory::root_container;
use crate::error::{Result, UdsError};
use crate::plan::{
    self, CHUNK_READ_LENGTH_BYTES, ChunkRange, MAX_ENCODED_OBJECT_BYTES, MAX_WORKERS_ALLOWED,
};
use crate::props::{ChunkProps, ContainerProps};
use crate::store::{DOCUMENT_MIME, FOLDER_MIME, NewObject, ObjectStore, RetryPolicy, with_retry};
use rayon::prelude::*;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use time::OffsetDateTime;

#[derive(Clone, Debug)]
pub struct PushOptions {
    pub chunk_read_bytes: u64,
    pub max_encoded_object_bytes: u64,
    /// When false, chunks upload serially in index order.
    pub parallel: bool,
    pub workers: usize,
    pub retry: RetryPolicy,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            chunk_read_bytes: CHUNK_READ_LENGTH_BYTES,
            max_encoded_object_bytes: MAX_ENCODED_OBJECT_BYTES,
            parallel: true,
            workers: MAX_WORKERS_ALLOWED,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PushSummary {
    pub name: String,
    pub byte_size: u64,
    pub encoded_size: u64,
    pub chunk_count: u64,
    pub container_id: String,
    pub digest: String,
}

/// Upload `path` into a fresh container under the hidden root.
///
/// A failed upload leaves the partially populated container behind; deleting
/// it and re-running push is the recovery path.
pub fn push(store: &dyn ObjectStore, path: &Path, opts: Option<&PushOptions>) -> Result<PushSummary> {
    let defaults = PushOptions::default();
    let opts = opts.unwrap_or(&defaults);

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| UdsError::Format(format!("no usable file name in {}", path.display())))?
        .to_string();
    let byte_size = std::fs::metadata(path)?.len();
    let digest = file_digest(path)?;

    let plan = plan::plan(byte_size, opts.chunk_read_bytes, opts.max_encoded_object_bytes)?;

    let root = root_container(store)?;
    let container_props = ContainerProps {
        size: Some(byte_size),
        encoded_size: Some(plan.encoded_size),
        digest: Some(digest.clone()),
        created: Some(OffsetDateTime::now_utc().unix_timestamp()),
    };
    let container_id = store.create_object(
        &NewObject {
            name: name.clone(),
            mime: FOLDER_MIME.into(),
            parents: vec![root.id],
            properties: container_props.to_bag(),
        },
        None,
    )?;
    tracing::info!(%container_id, name = %name, byte_size, chunks = plan.chunk_count, "created container");

    // A zero-byte file is a container with zero children; size and digest on
    // the container are enough to reassemble it.
    if plan.chunk_count > 0 {
        let upload_one = |range: &ChunkRange| {
            upload_chunk(store, path, &name, &container_id, range, &opts.retry)
        };
        if opts.parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(opts.workers.clamp(1, MAX_WORKERS_ALLOWED))
                .build()
                .map_err(|e| UdsError::Format(format!("worker pool: {e}")))?;
            pool.install(|| plan.ranges.par_iter().try_for_each(upload_one))?;
        } else {
            plan.ranges.iter().try_for_each(upload_one)?;
        }
    }

    tracing::info!(%container_id, name = %name, "upload complete");
    Ok(PushSummary {
        name,
        byte_size,
        encoded_size: plan.encoded_size,
        chunk_count: plan.chunk_count,
        container_id,
        digest,
    })
}

/// Ingest an existing plain remote object: fetch its raw payload into
/// `scratch_dir` and re-upload the result as a regular chunked container.
pub fn convert(
    store: &dyn ObjectStore,
    id: &str,
    scratch_dir: &Path,
    opts: Option<&PushOptions>,
) -> Result<PushSummary> {
    let meta = store.get_object(id)?;
    let payload = store.download_payload(id)?;
    std::fs::create_dir_all(scratch_dir)?;
    let local = scratch_dir.join(&meta.name);
    std::fs::write(&local, &payload)?;
    tracing::info!(%id, name = %meta.name, bytes = payload.len(), "fetched object for conversion");
    push(store, &local, opts)
}

/// Read one byte range, encode it, and create its chunk object. Only the
/// range in flight is resident. Transient store failures retry up to the
/// bound; the terminal error carries the part index and container.
fn upload_chunk(
    store: &dyn ObjectStore,
    path: &Path,
    name: &str,
    container_id: &str,
    range: &ChunkRange,
    retry: &RetryPolicy,
) -> Result<()> {
    let wrap = |e: UdsError| UdsError::Upload {
        part: range.index,
        container: container_id.to_string(),
        source: Box::new(e),
    };

    let mut f = File::open(path).map_err(|e| wrap(e.into()))?;
    f.seek(SeekFrom::Start(range.start)).map_err(|e| wrap(e.into()))?;
    let mut raw = vec![0u8; range.len() as usize];
    f.read_exact(&mut raw).map_err(|e| wrap(e.into()))?;

    let encoded = codec::encode(&raw);
    let meta = NewObject {
        name: format!("{name}{}", range.index),
        mime: DOCUMENT_MIME.into(),
        parents: vec![container_id.to_string()],
        properties: ChunkProps { part: range.index }.to_bag(),
    };

    with_retry(retry, || store.create_object(&meta, Some(encoded.as_bytes())))
        .map(|_| ())
        .map_err(wrap)?;
    tracing::debug!(part = range.index, bytes = range.len(), "chunk stored");
    Ok(())
}
