use crate::error::Result;
use crate::plan::CHUNK_READ_LENGTH_BYTES;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Streaming BLAKE3 digest of a file, hex-encoded.
///
/// Reads in chunk-sized slices so the whole file is never resident.
pub fn file_digest(path: &Path) -> Result<String> {
    let mut f = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; CHUNK_READ_LENGTH_BYTES as usize];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Digest of an in-memory buffer; same encoding as [`file_digest`].
pub fn bytes_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
