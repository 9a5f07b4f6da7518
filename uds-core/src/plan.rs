use crate::error::{Result, UdsError};

/// How many raw bytes one chunk reads from the source file.
pub const CHUNK_READ_LENGTH_BYTES: u64 = 750_000;
/// Size ceiling the store applies to one encoded document.
pub const MAX_ENCODED_OBJECT_BYTES: u64 = 1_000_000;
/// Upper bound on parallel chunk uploads.
pub const MAX_WORKERS_ALLOWED: usize = 10;

/// Projected size of the text encoding: 3 raw bytes become 4 characters.
pub fn encoded_len(byte_size: u64) -> u64 {
    (byte_size * 4).div_ceil(3)
}

/// One half-open byte range of the source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkRange {
    pub index: u64,
    pub start: u64,
    pub end: u64,
}

impl ChunkRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Clone, Debug)]
pub struct Plan {
    pub chunk_count: u64,
    pub encoded_size: u64,
    pub ranges: Vec<ChunkRange>,
}

/// Partition a file of `byte_size` bytes into chunk ranges.
///
/// The chunk count is sized by the *encoded* footprint, since the store's
/// ceiling applies to the stored text payload:
/// `chunk_count = ceil(encoded_size / max_encoded_object_bytes)`. The read
/// length and the object ceiling are independently configured, so the planner
/// checks that the count also covers the raw file (`ceil(byte_size /
/// chunk_read_bytes)` reads); a divergence means the two constants are
/// inconsistent and planning fails rather than producing a partition with
/// gaps or empty tail ranges.
pub fn plan(byte_size: u64, chunk_read_bytes: u64, max_encoded_object_bytes: u64) -> Result<Plan> {
    if chunk_read_bytes == 0 {
        return Err(UdsError::Planning("chunk read length must be > 0".into()));
    }
    if max_encoded_object_bytes == 0 {
        return Err(UdsError::Planning("encoded object ceiling must be > 0".into()));
    }

    let encoded_size = encoded_len(byte_size);
    if byte_size == 0 {
        return Ok(Plan {
            chunk_count: 0,
            encoded_size: 0,
            ranges: Vec::new(),
        });
    }

    let doc_count = encoded_size.div_ceil(max_encoded_object_bytes);
    let read_count = byte_size.div_ceil(chunk_read_bytes);
    if doc_count != read_count {
        return Err(UdsError::Planning(format!(
            "inconsistent chunk constants: {byte_size} bytes need {read_count} reads of \
             {chunk_read_bytes} but {doc_count} objects of {max_encoded_object_bytes} encoded bytes"
        )));
    }

    let ranges = (0..doc_count)
        .map(|i| ChunkRange {
            index: i,
            start: i * chunk_read_bytes,
            end: ((i + 1) * chunk_read_bytes).min(byte_size),
        })
        .collect();

    Ok(Plan {
        chunk_count: doc_count,
        encoded_size,
        ranges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_scenario_three_chunks() {
        let p = plan(2_000_000, 750_000, 1_000_000).unwrap();
        assert_eq!(p.encoded_size, 2_666_667);
        assert_eq!(p.chunk_count, 3);
        let bounds: Vec<(u64, u64)> = p.ranges.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(
            bounds,
            vec![(0, 750_000), (750_000, 1_500_000), (1_500_000, 2_000_000)]
        );
    }

    #[test]
    fn zero_size_plans_zero_chunks() {
        let p = plan(0, CHUNK_READ_LENGTH_BYTES, MAX_ENCODED_OBJECT_BYTES).unwrap();
        assert_eq!(p.chunk_count, 0);
        assert_eq!(p.encoded_size, 0);
        assert!(p.ranges.is_empty());
    }

    #[test]
    fn zero_constants_are_planning_errors() {
        assert!(matches!(plan(10, 0, 8), Err(UdsError::Planning(_))));
        assert!(matches!(plan(10, 6, 0), Err(UdsError::Planning(_))));
    }

    #[test]
    fn inconsistent_constants_rejected() {
        // 3-byte reads against a huge object ceiling: one object would have
        // to hold the whole file, leaving every read after the first unplanned.
        assert!(matches!(plan(300, 3, 1_000_000), Err(UdsError::Planning(_))));
    }

    // Coverage: ranges partition [0, byte_size) contiguously, ascending.
    #[test]
    fn ranges_cover_file_exactly() {
        let chunk_read = 6u64; // multiple of 3 keeps read and doc counts coupled
        let max_encoded = encoded_len(chunk_read);
        for byte_size in 1..200u64 {
            let p = plan(byte_size, chunk_read, max_encoded).unwrap();
            assert_eq!(p.chunk_count as usize, p.ranges.len());
            let mut cursor = 0u64;
            for (i, r) in p.ranges.iter().enumerate() {
                assert_eq!(r.index, i as u64);
                assert_eq!(r.start, cursor);
                assert!(r.end > r.start, "empty range at {i} for size {byte_size}");
                assert!(r.len() <= chunk_read);
                cursor = r.end;
            }
            assert_eq!(cursor, byte_size);
        }
    }

    #[test]
    fn encoded_len_matches_codec_output() {
        for n in 0..32u64 {
            let projected = encoded_len(n);
            let actual = crate::codec::encode(&vec![0u8; n as usize]).len() as u64;
            // The projection rounds the whole file; actual padding rounds to
            // a multiple of 4, so it may exceed the projection by up to 3.
            assert!(actual >= projected && actual - projected <= 3);
        }
    }
}
