//! Reassembly pipeline: a container's chunks become the original file again.

use crate::codec;
use crate::digest::file_digest;
use crate::error::{Result, UdsError};
use crate::props::{ChunkProps, ContainerProps};
use crate::store::{ObjectMeta, ObjectStore, RetryPolicy, list_all_children, with_retry};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default)]
pub struct PullOptions {
    pub retry: RetryPolicy,
}

/// Reassemble the container's chunks into `dest_dir/<container name>`.
///
/// Chunks are downloaded and appended strictly in part order; the format has
/// no offset markers, so order is correctness. An interrupted pull leaves the
/// partial file behind; only a digest mismatch deletes it.
pub fn pull(
    store: &dyn ObjectStore,
    container_id: &str,
    dest_dir: &Path,
    opts: Option<&PullOptions>,
) -> Result<PathBuf> {
    let defaults = PullOptions::default();
    let opts = opts.unwrap_or(&defaults);

    let container = store.get_object(container_id)?;
    let props = ContainerProps::parse(&container.properties).map_err(|reason| {
        UdsError::MalformedContainer {
            container: container_id.to_string(),
            reason,
        }
    })?;

    let children = list_all_children(store, container_id)?;
    if children.is_empty() {
        // A recorded size of zero marks a legitimately empty file.
        if props.size == Some(0) {
            let out = prepare_output(dest_dir, &container.name)?;
            File::create(&out)?;
            verify_digest(&out, props.digest.as_deref())?;
            return Ok(out);
        }
        return Err(UdsError::NoPartsFound(container_id.into()));
    }

    let ordered = order_chunks(container_id, children)?;
    tracing::info!(%container_id, name = %container.name, parts = ordered.len(), "reassembling");

    let out = prepare_output(dest_dir, &container.name)?;
    let mut file = File::create(&out)?;
    for (part, meta) in ordered.iter().enumerate() {
        let payload = with_retry(&opts.retry, || store.download_payload(&meta.id)).map_err(|e| {
            UdsError::Download {
                part: part as u64,
                container: container_id.to_string(),
                source: Box::new(e),
            }
        })?;
        let text = std::str::from_utf8(&payload)
            .map_err(|e| UdsError::Codec(format!("part {part} is not text: {e}")))?;
        let decoded = codec::decode(text)?;
        file.write_all(&decoded)?;
        tracing::debug!(part, bytes = decoded.len(), "chunk appended");
    }
    file.flush()?;
    drop(file);

    verify_digest(&out, props.digest.as_deref())?;
    Ok(out)
}

/// Sort children by their `part` property and check the index set is exactly
/// `0..n`. The store's listing order carries no meaning.
fn order_chunks(container_id: &str, children: Vec<ObjectMeta>) -> Result<Vec<ObjectMeta>> {
    let malformed = |reason: String| UdsError::MalformedContainer {
        container: container_id.to_string(),
        reason,
    };

    let mut keyed: Vec<(u64, ObjectMeta)> = children
        .into_iter()
        .map(|m| {
            let props = ChunkProps::from_bag(&m.properties)
                .map_err(|reason| malformed(format!("chunk {}: {reason}", m.id)))?;
            Ok((props.part, m))
        })
        .collect::<Result<_>>()?;
    keyed.sort_by_key(|(part, _)| *part);

    for (expect, (part, meta)) in keyed.iter().enumerate() {
        let expect = expect as u64;
        if *part != expect {
            let what = if *part < expect { "duplicate" } else { "gap at" };
            return Err(malformed(format!(
                "{what} part {} (chunk {})",
                expect.min(*part),
                meta.id
            )));
        }
    }
    Ok(keyed.into_iter().map(|(_, m)| m).collect())
}

fn prepare_output(dest_dir: &Path, name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dest_dir)?;
    Ok(dest_dir.join(name))
}

/// Compare the assembled file against the recorded digest, when one exists.
/// A mismatch removes the file so no corrupt output is left behind.
fn verify_digest(out: &Path, expected: Option<&str>) -> Result<()> {
    let Some(expected) = expected else {
        tracing::debug!(path = %out.display(), "no recorded digest, skipping verification");
        return Ok(());
    };
    let actual = file_digest(out)?;
    if actual != expected {
        fs::remove_file(out)?;
        return Err(UdsError::Integrity {
            path: out.display().to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
