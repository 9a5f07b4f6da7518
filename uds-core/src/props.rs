//! Typed views over the store's string-keyed property bags.
//!
//! The store only carries `String -> String` properties; everything above the
//! boundary works with these structs instead of poking at raw keys.

use std::collections::BTreeMap;

pub const PROP_UDS_ROOT: &str = "udsRoot";
pub const PROP_UDS: &str = "uds";
pub const PROP_SIZE: &str = "size";
pub const PROP_ENCODED_SIZE: &str = "encoded_size";
pub const PROP_DIGEST: &str = "digest";
pub const PROP_CREATED: &str = "created";
pub const PROP_PART: &str = "part";

pub type PropertyBag = BTreeMap<String, String>;

/// Properties carried by a container object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerProps {
    pub size: Option<u64>,
    pub encoded_size: Option<u64>,
    pub digest: Option<String>,
    pub created: Option<i64>,
}

impl ContainerProps {
    pub fn to_bag(&self) -> PropertyBag {
        let mut bag = PropertyBag::new();
        bag.insert(PROP_UDS.into(), "true".into());
        if let Some(size) = self.size {
            bag.insert(PROP_SIZE.into(), size.to_string());
        }
        if let Some(enc) = self.encoded_size {
            bag.insert(PROP_ENCODED_SIZE.into(), enc.to_string());
        }
        if let Some(d) = &self.digest {
            bag.insert(PROP_DIGEST.into(), d.clone());
        }
        if let Some(ts) = self.created {
            bag.insert(PROP_CREATED.into(), ts.to_string());
        }
        bag
    }

    /// Lenient read: fields that are absent or garbled come back as `None`
    /// (legacy containers predate some of them). Catalog listings use this
    /// so one bad container cannot fail the whole listing.
    pub fn from_bag(bag: &PropertyBag) -> Self {
        Self {
            size: bag.get(PROP_SIZE).and_then(|v| v.parse().ok()),
            encoded_size: bag.get(PROP_ENCODED_SIZE).and_then(|v| v.parse().ok()),
            digest: bag.get(PROP_DIGEST).cloned(),
            created: bag.get(PROP_CREATED).and_then(|v| v.parse().ok()),
        }
    }

    /// Strict read for reassembly: an absent numeric field stays `None`, but
    /// one that is present and non-numeric is an error. Distinguishes a
    /// legacy container from a corrupted one.
    pub fn parse(bag: &PropertyBag) -> std::result::Result<Self, String> {
        fn num(bag: &PropertyBag, key: &str) -> std::result::Result<Option<u64>, String> {
            match bag.get(key) {
                None => Ok(None),
                Some(raw) => raw
                    .parse()
                    .map(Some)
                    .map_err(|_| format!("non-numeric {key} property: {raw:?}")),
            }
        }
        Ok(Self {
            size: num(bag, PROP_SIZE)?,
            encoded_size: num(bag, PROP_ENCODED_SIZE)?,
            digest: bag.get(PROP_DIGEST).cloned(),
            created: bag.get(PROP_CREATED).and_then(|v| v.parse().ok()),
        })
    }
}

/// Properties carried by one chunk object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkProps {
    pub part: u64,
}

impl ChunkProps {
    pub fn to_bag(&self) -> PropertyBag {
        let mut bag = PropertyBag::new();
        bag.insert(PROP_PART.into(), self.part.to_string());
        bag
    }

    /// Strict read: a chunk without a numeric `part` cannot be ordered.
    pub fn from_bag(bag: &PropertyBag) -> std::result::Result<Self, String> {
        let raw = bag
            .get(PROP_PART)
            .ok_or_else(|| "missing part property".to_string())?;
        let part = raw
            .parse::<u64>()
            .map_err(|_| format!("non-numeric part property: {raw:?}"))?;
        Ok(Self { part })
    }
}

pub fn is_uds_tagged(bag: &PropertyBag) -> bool {
    bag.get(PROP_UDS).map(|v| v == "true").unwrap_or(false)
        || bag.get(PROP_UDS_ROOT).map(|v| v == "true").unwrap_or(false)
}
