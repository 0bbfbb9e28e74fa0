// ironquery-core/src/simple_query.rs
//! Simple-query descriptors
//!
//! A simple query is a declarative description of a scan, filter, geo or
//! fulltext request bound to one collection. Factories on [`Collection`]
//! validate their arguments and build an immutable [`SimpleQuery`]; nothing
//! reaches the engine until [`SimpleQuery::execute`] is called.
//!
//! The wire form handed to the engine is [`QueryDescriptor`]:
//!
//! ```text
//! { "collection": "places", "kind": "near", "latitude": 50.9, "longitude": 6.9, "limit": 10 }
//! ```

use serde::Serialize;
use serde_json::{Map, Value};

use crate::collection::Collection;
use crate::engine::{BoxCursor, Engine};
use crate::error::{IronQueryError, Result};
use crate::log_trace;

/// Attribute/value mapping matched by example
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Example(Map<String, Value>);

impl Example {
    pub fn new() -> Self {
        Example(Map::new())
    }

    /// Build from a flattened `[field, value, field, value, ...]` sequence.
    ///
    /// An odd number of arguments leaves the last field without a value and
    /// is rejected rather than truncated. Fields must be strings.
    pub fn from_pairs(pairs: Vec<Value>) -> Result<Self> {
        if pairs.len() % 2 != 0 {
            return Err(IronQueryError::BadParameter(format!(
                "invalid argument count: expecting field/value pairs, got {} arguments",
                pairs.len()
            )));
        }

        let mut example = Map::new();
        let mut args = pairs.into_iter();
        while let (Some(field), Some(value)) = (args.next(), args.next()) {
            match field {
                Value::String(field) => {
                    example.insert(field, value);
                }
                other => {
                    return Err(IronQueryError::BadParameter(format!(
                        "example attribute name must be a string, got {}",
                        other
                    )))
                }
            }
        }
        Ok(Example(example))
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Example {
    fn from(map: Map<String, Value>) -> Self {
        Example(map)
    }
}

impl TryFrom<Value> for Example {
    type Error = IronQueryError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Example(map)),
            other => Err(IronQueryError::BadParameter(format!(
                "example must be an object, got {}",
                other
            ))),
        }
    }
}

/// Index family named by an index hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Hash,
    Skiplist,
    Geo,
}

/// Index the engine is asked to use
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexHint {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: IndexKind,
}

impl IndexHint {
    pub fn new(id: impl Into<String>, kind: IndexKind) -> Self {
        IndexHint {
            id: id.into(),
            kind,
        }
    }
}

/// Variant part of a descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QueryKind {
    All,
    #[serde(rename_all = "camelCase")]
    ByExample {
        example: Example,
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<IndexHint>,
    },
    ByCondition {
        condition: Map<String, Value>,
        index: IndexHint,
    },
    /// `left <= attribute < right`, or `<= right` when closed
    Range {
        attribute: String,
        left: Value,
        right: Value,
        closed: bool,
    },
    Near {
        latitude: f64,
        longitude: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        distance: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<IndexHint>,
    },
    Within {
        latitude: f64,
        longitude: f64,
        radius: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        distance: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<IndexHint>,
    },
    WithinRectangle {
        latitude1: f64,
        longitude1: f64,
        latitude2: f64,
        longitude2: f64,
    },
    Fulltext {
        attribute: String,
        query: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<String>,
    },
    /// Geo restriction resolved to one catalog index
    #[serde(rename_all = "camelCase")]
    Geo { resolved_index_id: String },
}

impl QueryKind {
    pub fn name(&self) -> &'static str {
        match self {
            QueryKind::All => "all",
            QueryKind::ByExample { .. } => "byExample",
            QueryKind::ByCondition { .. } => "byCondition",
            QueryKind::Range { .. } => "range",
            QueryKind::Near { .. } => "near",
            QueryKind::Within { .. } => "within",
            QueryKind::WithinRectangle { .. } => "withinRectangle",
            QueryKind::Fulltext { .. } => "fulltext",
            QueryKind::Geo { .. } => "geo",
        }
    }
}

/// Wire form of a simple query: `{collection, kind, ...variant fields, limit?, skip?}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescriptor {
    pub collection: String,
    #[serde(flatten)]
    pub query: QueryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
}

/// Simple query bound to the collection that issued it
pub struct SimpleQuery<'c, E> {
    collection: &'c Collection<E>,
    descriptor: QueryDescriptor,
}

impl<'c, E> SimpleQuery<'c, E> {
    pub(crate) fn new(collection: &'c Collection<E>, query: QueryKind) -> Self {
        SimpleQuery {
            descriptor: QueryDescriptor {
                collection: collection.name(),
                query,
                limit: None,
                skip: None,
            },
            collection,
        }
    }

    pub fn collection(&self) -> &'c Collection<E> {
        self.collection
    }

    pub fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    pub fn kind(&self) -> &QueryKind {
        &self.descriptor.query
    }

    /// Cap the number of results
    pub fn limit(mut self, limit: u64) -> Self {
        self.descriptor.limit = Some(limit);
        self
    }

    /// Skip leading results
    pub fn skip(mut self, skip: u64) -> Self {
        self.descriptor.skip = Some(skip);
        self
    }

    /// Report the distance to the reference point in `attribute`
    /// (near and within queries only)
    pub fn distance(mut self, attribute: impl Into<String>) -> Result<Self> {
        let attribute = attribute.into();
        require_attribute(&attribute)?;
        match &mut self.descriptor.query {
            QueryKind::Near { distance, .. } | QueryKind::Within { distance, .. } => {
                *distance = Some(attribute);
                Ok(self)
            }
            other => Err(IronQueryError::BadParameter(format!(
                "distance is not supported for {} queries",
                other.name()
            ))),
        }
    }
}

impl<'c, E: Engine> SimpleQuery<'c, E> {
    /// Dispatch to the engine
    pub fn execute(&self) -> Result<BoxCursor> {
        log_trace!(
            "dispatching {} query on '{}'",
            self.descriptor.query.name(),
            self.descriptor.collection
        );
        self.collection.engine().execute(&self.descriptor)
    }

    /// Execute and drain the cursor
    pub fn to_vec(&self) -> Result<Vec<Value>> {
        let mut cursor = self.execute()?;
        let mut documents = Vec::with_capacity(cursor.count().unwrap_or(0));
        while cursor.has_next() {
            documents.push(cursor.next_document()?);
        }
        Ok(documents)
    }
}

impl<'c, E> std::fmt::Debug for SimpleQuery<'c, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleQuery")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

fn require_attribute(attribute: &str) -> Result<()> {
    if attribute.is_empty() {
        return Err(IronQueryError::BadParameter(
            "attribute name must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_latitude(latitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(IronQueryError::BadParameter(format!(
            "latitude out of range: {}",
            latitude
        )));
    }
    Ok(())
}

pub(crate) fn check_longitude(longitude: f64) -> Result<()> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(IronQueryError::BadParameter(format!(
            "longitude out of range: {}",
            longitude
        )));
    }
    Ok(())
}

pub(crate) fn check_radius(radius: f64) -> Result<()> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(IronQueryError::BadParameter(format!(
            "radius must be a non-negative number, got {}",
            radius
        )));
    }
    Ok(())
}

// ========== QUERY FACTORIES ==========

impl<E> Collection<E> {
    /// Every document of the collection
    pub fn all(&self) -> SimpleQuery<'_, E> {
        SimpleQuery::new(self, QueryKind::All)
    }

    /// Documents matching all attribute/value pairs of `example`
    pub fn by_example(&self, example: impl Into<Example>) -> SimpleQuery<'_, E> {
        SimpleQuery::new(
            self,
            QueryKind::ByExample {
                example: example.into(),
                index: None,
            },
        )
    }

    /// `by_example` with the example given as flattened field/value pairs
    pub fn by_example_pairs(&self, pairs: Vec<Value>) -> Result<SimpleQuery<'_, E>> {
        Ok(self.by_example(Example::from_pairs(pairs)?))
    }

    /// `by_example` using the given hash index
    pub fn by_example_hash(
        &self,
        index: impl Into<String>,
        example: impl Into<Example>,
    ) -> SimpleQuery<'_, E> {
        SimpleQuery::new(
            self,
            QueryKind::ByExample {
                example: example.into(),
                index: Some(IndexHint::new(index, IndexKind::Hash)),
            },
        )
    }

    /// `by_example` using the given skiplist index
    pub fn by_example_skiplist(
        &self,
        index: impl Into<String>,
        example: impl Into<Example>,
    ) -> SimpleQuery<'_, E> {
        SimpleQuery::new(
            self,
            QueryKind::ByExample {
                example: example.into(),
                index: Some(IndexHint::new(index, IndexKind::Skiplist)),
            },
        )
    }

    /// Documents satisfying `condition`, evaluated with a skiplist index
    pub fn by_condition_skiplist(
        &self,
        index: impl Into<String>,
        condition: Map<String, Value>,
    ) -> SimpleQuery<'_, E> {
        SimpleQuery::new(
            self,
            QueryKind::ByCondition {
                condition,
                index: IndexHint::new(index, IndexKind::Skiplist),
            },
        )
    }

    /// Documents with `left <= attribute < right`
    pub fn range(
        &self,
        attribute: impl Into<String>,
        left: impl Into<Value>,
        right: impl Into<Value>,
    ) -> Result<SimpleQuery<'_, E>> {
        self.range_query(attribute.into(), left.into(), right.into(), false)
    }

    /// Documents with `left <= attribute <= right`
    pub fn closed_range(
        &self,
        attribute: impl Into<String>,
        left: impl Into<Value>,
        right: impl Into<Value>,
    ) -> Result<SimpleQuery<'_, E>> {
        self.range_query(attribute.into(), left.into(), right.into(), true)
    }

    fn range_query(
        &self,
        attribute: String,
        left: Value,
        right: Value,
        closed: bool,
    ) -> Result<SimpleQuery<'_, E>> {
        require_attribute(&attribute)?;
        Ok(SimpleQuery::new(
            self,
            QueryKind::Range {
                attribute,
                left,
                right,
                closed,
            },
        ))
    }

    /// Documents ordered by distance to a point
    pub fn near(&self, latitude: f64, longitude: f64) -> Result<SimpleQuery<'_, E>> {
        check_latitude(latitude)?;
        check_longitude(longitude)?;
        Ok(SimpleQuery::new(
            self,
            QueryKind::Near {
                latitude,
                longitude,
                distance: None,
                index: None,
            },
        ))
    }

    /// Documents within `radius` meters of a point
    pub fn within(&self, latitude: f64, longitude: f64, radius: f64) -> Result<SimpleQuery<'_, E>> {
        check_latitude(latitude)?;
        check_longitude(longitude)?;
        check_radius(radius)?;
        Ok(SimpleQuery::new(
            self,
            QueryKind::Within {
                latitude,
                longitude,
                radius,
                distance: None,
                index: None,
            },
        ))
    }

    /// Documents inside the rectangle spanned by two corners
    pub fn within_rectangle(
        &self,
        latitude1: f64,
        longitude1: f64,
        latitude2: f64,
        longitude2: f64,
    ) -> Result<SimpleQuery<'_, E>> {
        check_latitude(latitude1)?;
        check_longitude(longitude1)?;
        check_latitude(latitude2)?;
        check_longitude(longitude2)?;
        Ok(SimpleQuery::new(
            self,
            QueryKind::WithinRectangle {
                latitude1,
                longitude1,
                latitude2,
                longitude2,
            },
        ))
    }

    /// Fulltext search on `attribute`, optionally through a given index
    pub fn fulltext(
        &self,
        attribute: impl Into<String>,
        query: impl Into<String>,
        index: Option<String>,
    ) -> Result<SimpleQuery<'_, E>> {
        let attribute = attribute.into();
        require_attribute(&attribute)?;
        Ok(SimpleQuery::new(
            self,
            QueryKind::Fulltext {
                attribute,
                query: query.into(),
                index,
            },
        ))
    }
}
