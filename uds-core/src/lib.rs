#![forbid(unsafe_code)]

pub mod error;
pub mod format;

pub mod codec;
pub mod digest;
pub mod plan;
pub mod props;

pub mod store;
pub mod store_factory;
pub mod store_fs;
pub mod store_mem;

pub mod pipeline {
    pub mod pull;
    pub mod push;
}

pub mod directory;

// Re-exports: stable API surface
pub use directory::{LogicalFile, NameIndex};
pub use pipeline::pull::{PullOptions, pull};
pub use pipeline::push::{PushOptions, PushSummary, convert, push};
pub use store::{NewObject, ObjectMeta, ObjectStore, PropertyFilter, RetryPolicy};
