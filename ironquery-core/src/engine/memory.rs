// engine/memory.rs
//! In-memory engine
//!
//! Keeps collections, documents and index catalogs in a `HashMap` behind a
//! lock. Executes full scans, by-example, by-condition and range queries;
//! geo, fulltext and statement execution need real index engines and are
//! reported as not implemented.
//!
//! # Fixture format
//!
//! ```text
//! {
//!   "places": {
//!     "type": "document",
//!     "documents": [{"name": "Cologne", "loc": [50.9, 6.9]}],
//!     "indexes": [{"type": "geo1", "fields": ["loc"], "geoJson": false}]
//!   }
//! }
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::catalog::{IndexCatalog, IndexDescriptor, INDEX_TYPE_PRIMARY};
use crate::collection::{
    Collection, CollectionId, CollectionInfo, CollectionStatus, CollectionType,
};
use crate::engine::{BoxCursor, QueryEngine, Statement, VecCursor};
use crate::error::{codes, IronQueryError, Result};
use crate::simple_query::{QueryDescriptor, QueryKind};
use crate::value_utils::{compare_scalars, get_path, values_equal};
use crate::{log_debug, log_trace};

struct MemoryCollection {
    info: CollectionInfo,
    documents: Vec<Value>,
    indexes: Vec<IndexDescriptor>,
}

/// In-memory engine (tests, CLI)
pub struct MemoryEngine {
    collections: RwLock<HashMap<String, MemoryCollection>>,
    next_id: AtomicU64,
}

impl MemoryEngine {
    pub fn new() -> Self {
        MemoryEngine {
            collections: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, AtomicOrdering::Relaxed)
    }

    /// Create a loaded collection with a primary index
    pub fn create_collection(
        &self,
        name: &str,
        collection_type: CollectionType,
    ) -> Result<CollectionInfo> {
        if name.is_empty() {
            return Err(IronQueryError::BadParameter(
                "collection name must not be empty".to_string(),
            ));
        }

        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(IronQueryError::BadParameter(format!(
                "duplicate collection name '{}'",
                name
            )));
        }

        let info = CollectionInfo::new(
            CollectionId::new(self.next_id().to_string()),
            name,
            collection_type,
            CollectionStatus::Loaded,
        );
        let primary = IndexDescriptor::new(
            format!("{}/0", name),
            INDEX_TYPE_PRIMARY,
            vec!["_key".to_string()],
        );
        collections.insert(
            name.to_string(),
            MemoryCollection {
                info: info.clone(),
                documents: Vec::new(),
                indexes: vec![primary],
            },
        );
        log_debug!("created collection '{}' ({})", name, info.id);
        Ok(info)
    }

    /// Handle to an existing collection
    pub fn collection(self: &Arc<Self>, name: &str) -> Result<Collection<MemoryEngine>> {
        let info = self
            .collections
            .read()
            .get(name)
            .map(|c| c.info.clone())
            .ok_or_else(|| IronQueryError::CollectionNotFound(name.to_string()))?;
        Ok(Collection::new(Arc::clone(self), info))
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Change the status of a collection record and return the new record
    pub fn set_status(&self, name: &str, status: CollectionStatus) -> Result<CollectionInfo> {
        let mut collections = self.collections.write();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| IronQueryError::CollectionNotFound(name.to_string()))?;
        collection.info.status_code = status.code();
        Ok(collection.info.clone())
    }

    /// Append a document; a missing `_key` is generated
    pub fn insert(&self, name: &str, document: Value) -> Result<()> {
        let mut document = match document {
            Value::Object(map) => map,
            other => {
                return Err(IronQueryError::BadParameter(format!(
                    "document must be an object, got {}",
                    other
                )))
            }
        };
        if !document.contains_key("_key") {
            document.insert("_key".to_string(), Value::String(self.next_id().to_string()));
        }

        let mut collections = self.collections.write();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| IronQueryError::CollectionNotFound(name.to_string()))?;
        collection.documents.push(Value::Object(document));
        Ok(())
    }

    /// Register an index at the end of the catalog.
    ///
    /// An empty id is generated; a bare id (`"5"`) is stored as `"<collection>/5"`.
    pub fn ensure_index(&self, name: &str, mut index: IndexDescriptor) -> Result<IndexDescriptor> {
        let mut collections = self.collections.write();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| IronQueryError::CollectionNotFound(name.to_string()))?;
        if index.id.is_empty() {
            index.id = format!("{}/{}", name, self.next_id());
        } else if !index.id.contains('/') {
            index.id = format!("{}/{}", name, index.id);
        }
        log_debug!(
            "registering {} index {} on '{}' {:?}",
            index.index_type,
            index.id,
            name,
            index.fields
        );
        collection.indexes.push(index.clone());
        Ok(index)
    }

    /// Build an engine from a fixture object (see module docs)
    pub fn from_fixture(fixture: &Value) -> Result<Self> {
        let engine = MemoryEngine::new();
        let collections = fixture.as_object().ok_or_else(|| {
            IronQueryError::BadParameter("fixture must be an object of collections".to_string())
        })?;

        for (name, entry) in collections {
            let collection_type = match entry.get("type").and_then(Value::as_str) {
                None | Some("document") => CollectionType::Document,
                Some("edge") => CollectionType::Edge,
                Some(other) => {
                    return Err(IronQueryError::BadParameter(format!(
                        "unknown collection type '{}' for '{}'",
                        other, name
                    )))
                }
            };
            engine.create_collection(name, collection_type)?;

            for document in fixture_array(entry, "documents")? {
                engine.insert(name, document.clone())?;
            }
            for index in fixture_array(entry, "indexes")? {
                let mut index = index.clone();
                if let Value::Object(map) = &mut index {
                    map.entry("id").or_insert_with(|| Value::String(String::new()));
                }
                engine.ensure_index(name, serde_json::from_value(index)?)?;
            }
        }

        Ok(engine)
    }

    fn scan(&self, query: &QueryDescriptor) -> Result<Vec<Value>> {
        let collections = self.collections.read();
        let collection = collections
            .get(&query.collection)
            .ok_or_else(|| IronQueryError::CollectionNotFound(query.collection.clone()))?;

        let skip = query.skip.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);

        let mut results = Vec::new();
        for document in &collection.documents {
            if results.len() >= limit.saturating_add(skip) {
                break;
            }
            if matches_query(document, &query.query)? {
                results.push(document.clone());
            }
        }
        Ok(results.into_iter().skip(skip).take(limit).collect())
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn fixture_array<'a>(entry: &'a Value, key: &str) -> Result<&'a [Value]> {
    match entry.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(IronQueryError::BadParameter(format!(
            "fixture '{}' must be an array",
            key
        ))),
    }
}

fn not_implemented(kind: &str) -> IronQueryError {
    IronQueryError::Engine {
        code: codes::ERROR_NOT_IMPLEMENTED,
        message: format!("{} queries are not supported by the in-memory engine", kind),
    }
}

fn matches_query(document: &Value, query: &QueryKind) -> Result<bool> {
    match query {
        QueryKind::All => Ok(true),
        QueryKind::ByExample { example, .. } => Ok(example.as_map().iter().all(|(path, expected)| {
            get_path(document, path).is_some_and(|actual| values_equal(actual, expected))
        })),
        QueryKind::ByCondition { condition, .. } => matches_condition(document, condition),
        QueryKind::Range {
            attribute,
            left,
            right,
            closed,
        } => {
            let Some(value) = get_path(document, attribute) else {
                return Ok(false);
            };
            let above_left = matches!(
                compare_scalars(value, left),
                Some(Ordering::Greater | Ordering::Equal)
            );
            let below_right = match compare_scalars(value, right) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => *closed,
                _ => false,
            };
            Ok(above_left && below_right)
        }
        other => Err(not_implemented(other.name())),
    }
}

/// `{"age": [[">=", 18], ["<", 30]]}` - every comparison of every attribute must hold
fn matches_condition(document: &Value, condition: &Map<String, Value>) -> Result<bool> {
    for (path, comparisons) in condition {
        let comparisons = comparisons.as_array().ok_or_else(|| {
            IronQueryError::BadParameter(format!(
                "condition for '{}' must be a list of [operator, value] pairs",
                path
            ))
        })?;
        let actual = get_path(document, path);

        for comparison in comparisons {
            let (operator, expected) = match comparison.as_array().map(Vec::as_slice) {
                Some([Value::String(op), expected]) => (op.as_str(), expected),
                _ => {
                    return Err(IronQueryError::BadParameter(format!(
                        "malformed comparison {} for '{}'",
                        comparison, path
                    )))
                }
            };
            let ordering = actual.and_then(|a| compare_scalars(a, expected));
            let holds = match operator {
                "==" => ordering == Some(Ordering::Equal),
                "!=" => ordering != Some(Ordering::Equal),
                "<" => ordering == Some(Ordering::Less),
                "<=" => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                ">" => ordering == Some(Ordering::Greater),
                ">=" => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                other => {
                    return Err(IronQueryError::BadParameter(format!(
                        "unknown comparison operator '{}'",
                        other
                    )))
                }
            };
            if !holds {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

impl IndexCatalog for MemoryEngine {
    fn get_indexes(&self, collection: &str) -> Result<Vec<IndexDescriptor>> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.indexes.clone())
            .ok_or_else(|| IronQueryError::CollectionNotFound(collection.to_string()))
    }
}

impl QueryEngine for MemoryEngine {
    fn execute(&self, query: &QueryDescriptor) -> Result<BoxCursor> {
        log_trace!("memory engine executing {:?}", query);
        let documents = self.scan(query)?;
        Ok(Box::new(VecCursor::new(documents)))
    }

    fn execute_statement(&self, statement: &Statement) -> Result<BoxCursor> {
        log_trace!("memory engine rejecting statement {}", statement.query);
        Err(IronQueryError::Engine {
            code: codes::ERROR_NOT_IMPLEMENTED,
            message: "statement execution is not supported by the in-memory engine".to_string(),
        })
    }
}
