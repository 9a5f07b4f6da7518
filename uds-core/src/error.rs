use thiserror::Error;

#[derive(Error, Debug)]
pub enum UdsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("planning error: {0}")]
    Planning(String),

    #[error("transient store error: {0}")]
    TransientStore(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("not a UDS object: {0}")]
    NotUds(String),

    #[error("no parts found under container {0}")]
    NoPartsFound(String),

    #[error("malformed container {container}: {reason}")]
    MalformedContainer { container: String, reason: String },

    #[error("integrity failure for {path}: expected digest {expected}, got {actual}")]
    Integrity {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("upload of part {part} to container {container} failed: {source}")]
    Upload {
        part: u64,
        container: String,
        #[source]
        source: Box<UdsError>,
    },

    #[error("download of part {part} from container {container} failed: {source}")]
    Download {
        part: u64,
        container: String,
        #[source]
        source: Box<UdsError>,
    },

    #[error("format error: {0}")]
    Format(String),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, UdsError>;
