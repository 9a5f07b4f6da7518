use crate::error::{Result, UdsError};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

/// Encode a raw chunk into its storage-safe text form.
/// Output length is exactly `ceil(len/3) * 4`.
pub fn encode(bytes: &[u8]) -> String {
    B64.encode(bytes)
}

/// Decode a stored chunk back to raw bytes.
///
/// Stored documents may come back re-wrapped or with their trailing padding
/// stripped, so whitespace is removed and `'='` is re-applied up to the next
/// multiple of 4 before decoding. Non-alphabet input is a [`UdsError::Codec`].
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let mut compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let rem = compact.len() % 4;
    if rem != 0 {
        for _ in 0..(4 - rem) {
            compact.push('=');
        }
    }
    B64.decode(compact.as_bytes())
        .map_err(|e| UdsError::Codec(e.to_string()))
}
