// ironquery-core/src/collection.rs
// Collection handle: identity, status lifecycle, type tag.
//
// The engine owns the collection record; a Collection is a proxy that reads
// it and issues simple queries against it. Query factories live in
// simple_query.rs, geo resolution in geo.rs, iterate() in sampling.rs.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::catalog::{IndexDescriptor, IndexHandle};
use crate::engine::Engine;
use crate::error::{IronQueryError, Result};

const UNKNOWN: &str = "unknown";

/// Collection status (wire values are fixed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CollectionStatus {
    Corrupted = 0,
    /// Deprecated, still accepted on the wire
    NewBorn = 1,
    Unloaded = 2,
    Loaded = 3,
    Unloading = 4,
    Deleted = 5,
    Loading = 6,
}

impl CollectionStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(CollectionStatus::Corrupted),
            1 => Some(CollectionStatus::NewBorn),
            2 => Some(CollectionStatus::Unloaded),
            3 => Some(CollectionStatus::Loaded),
            4 => Some(CollectionStatus::Unloading),
            5 => Some(CollectionStatus::Deleted),
            6 => Some(CollectionStatus::Loading),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            CollectionStatus::Corrupted => "corrupted",
            CollectionStatus::NewBorn => "new born",
            CollectionStatus::Unloaded => "unloaded",
            CollectionStatus::Loaded => "loaded",
            CollectionStatus::Unloading => "unloading",
            CollectionStatus::Deleted => "deleted",
            CollectionStatus::Loading => "loading",
        }
    }
}

/// Label for a raw status code; unrecognized codes render as `"unknown"`
pub fn status_label(code: i64) -> &'static str {
    CollectionStatus::from_code(code).map_or(UNKNOWN, CollectionStatus::label)
}

/// Collection type (wire values are fixed; 0 and 1 are unused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CollectionType {
    Document = 2,
    Edge = 3,
}

impl CollectionType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            2 => Some(CollectionType::Document),
            3 => Some(CollectionType::Edge),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            CollectionType::Document => "document",
            CollectionType::Edge => "edge",
        }
    }
}

/// Label for a raw type code; unrecognized codes render as `"unknown"`
pub fn type_label(code: i64) -> &'static str {
    CollectionType::from_code(code).map_or(UNKNOWN, CollectionType::label)
}

/// Opaque, stable collection identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn new(id: impl Into<String>) -> Self {
        CollectionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collection record as reported by the engine
///
/// Status and type stay raw codes so a malformed record still renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub id: CollectionId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "status")]
    pub status_code: i64,
    #[serde(rename = "type")]
    pub type_code: i64,
}

impl CollectionInfo {
    pub fn new(
        id: CollectionId,
        name: impl Into<String>,
        collection_type: CollectionType,
        status: CollectionStatus,
    ) -> Self {
        CollectionInfo {
            id,
            name: name.into(),
            status_code: status.code(),
            type_code: collection_type.code(),
        }
    }
}

/// Handle to a named collection
///
/// Generic over the engine backend:
/// - `Collection<MemoryEngine>` - in-memory engine (tests, CLI)
/// - `Collection<E>` for any `E: Engine` provided by the embedding layer
pub struct Collection<E> {
    engine: Arc<E>,
    info: RwLock<CollectionInfo>,
}

impl<E> Collection<E> {
    /// Wrap an engine-provided record. Only the engine layer creates handles.
    pub fn new(engine: Arc<E>, info: CollectionInfo) -> Self {
        Collection {
            engine,
            info: RwLock::new(info),
        }
    }

    pub fn id(&self) -> CollectionId {
        self.info.read().id.clone()
    }

    pub fn name(&self) -> String {
        self.info.read().name.clone()
    }

    pub fn status(&self) -> Option<CollectionStatus> {
        CollectionStatus::from_code(self.info.read().status_code)
    }

    pub fn collection_type(&self) -> Option<CollectionType> {
        CollectionType::from_code(self.info.read().type_code)
    }

    pub fn info(&self) -> CollectionInfo {
        self.info.read().clone()
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Push a fresh engine record into the handle (status or name change).
    ///
    /// The id is immutable: a record for another collection is rejected.
    pub fn update_info(&self, info: CollectionInfo) -> Result<()> {
        let mut current = self.info.write();
        if current.id != info.id {
            return Err(IronQueryError::BadParameter(format!(
                "collection id mismatch: handle is {}, record is {}",
                current.id, info.id
            )));
        }
        *current = info;
        Ok(())
    }

    /// `[Collection: <id>]`
    pub fn to_short_string(&self) -> String {
        format!("[Collection: {}]", self.info.read().id)
    }
}

impl<E: Engine> Collection<E> {
    /// Indexes registered on this collection, in catalog order
    pub fn get_indexes(&self) -> Result<Vec<IndexDescriptor>> {
        self.engine.get_indexes(&self.name())
    }

    /// Direct index lookup by id or name
    pub fn index(&self, handle: &IndexHandle) -> Result<IndexDescriptor> {
        let name = self.name();
        self.engine
            .index(&name, handle)?
            .ok_or_else(|| IronQueryError::IndexNotFound(format!("{} in '{}'", handle, name)))
    }
}

impl<E> fmt::Display for Collection<E> {
    /// `[Collection <id>, "<name>" (type <type>, status <status>)]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.info.read();
        let name = if info.name.is_empty() {
            UNKNOWN
        } else {
            info.name.as_str()
        };
        write!(
            f,
            "[Collection {}, \"{}\" (type {}, status {})]",
            info.id,
            name,
            type_label(info.type_code),
            status_label(info.status_code)
        )
    }
}

impl<E> fmt::Debug for Collection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
