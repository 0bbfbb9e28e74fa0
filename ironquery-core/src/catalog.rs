// ironquery-core/src/catalog.rs
//! Read-only view over a collection's registered indexes
//!
//! The catalog is owned by the engine. This crate only reads it, either as
//! the full ordered list (geo resolution scans it in insertion order) or
//! through a direct lookup by index identity.

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const INDEX_TYPE_PRIMARY: &str = "primary";
/// Single attribute holding a packed `[lat, lon]` pair or a GeoJSON point
pub const INDEX_TYPE_GEO1: &str = "geo1";
/// Two attributes holding latitude and longitude separately
pub const INDEX_TYPE_GEO2: &str = "geo2";

/// One entry of a collection's index catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub index_type: String,
    pub fields: Vec<String>,
    /// Only meaningful for `geo1` indexes; an absent flag matches no lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_json: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub sparse: bool,
}

impl IndexDescriptor {
    pub fn new(id: impl Into<String>, index_type: impl Into<String>, fields: Vec<String>) -> Self {
        IndexDescriptor {
            id: id.into(),
            index_type: index_type.into(),
            fields,
            geo_json: None,
            name: None,
            unique: false,
            sparse: false,
        }
    }

    /// `geo1` index over a single location attribute
    pub fn geo1(id: impl Into<String>, field: impl Into<String>, geo_json: bool) -> Self {
        let mut index = Self::new(id, INDEX_TYPE_GEO1, vec![field.into()]);
        index.geo_json = Some(geo_json);
        index
    }

    /// `geo2` index over separate latitude/longitude attributes
    pub fn geo2(
        id: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        Self::new(id, INDEX_TYPE_GEO2, vec![latitude.into(), longitude.into()])
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn field(&self, position: usize) -> Option<&str> {
        self.fields.get(position).map(String::as_str)
    }
}

/// Identifies one index for a direct catalog lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexHandle {
    /// Index id, either fully qualified (`"places/17"`) or bare (`"17"`)
    Id(String),
    Name(String),
}

impl IndexHandle {
    pub fn id(id: impl Into<String>) -> Self {
        IndexHandle::Id(id.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        IndexHandle::Name(name.into())
    }

    /// Whether `index`, registered on `collection`, is the one this handle names
    pub fn matches(&self, collection: &str, index: &IndexDescriptor) -> bool {
        match self {
            IndexHandle::Id(id) => {
                index.id == *id
                    || index
                        .id
                        .strip_prefix(collection)
                        .and_then(|rest| rest.strip_prefix('/'))
                        .is_some_and(|bare| bare == id)
            }
            IndexHandle::Name(name) => index.name.as_deref() == Some(name.as_str()),
        }
    }
}

impl std::fmt::Display for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexHandle::Id(id) => write!(f, "{}", id),
            IndexHandle::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Index catalog boundary exposed by the engine
pub trait IndexCatalog: Send + Sync {
    /// All indexes of `collection`, in registration order
    fn get_indexes(&self, collection: &str) -> Result<Vec<IndexDescriptor>>;

    /// Direct lookup by identity; `None` when no index matches
    fn index(&self, collection: &str, handle: &IndexHandle) -> Result<Option<IndexDescriptor>> {
        Ok(self
            .get_indexes(collection)?
            .into_iter()
            .find(|index| handle.matches(collection, index)))
    }
}
