// ironquery-core/src/geo.rs
//! Geo index resolution
//!
//! `geo()` maps a locator to exactly one entry of the collection's index
//! catalog:
//!
//! | Locator                       | Match                                              |
//! |-------------------------------|----------------------------------------------------|
//! | `Index(handle)`               | direct catalog lookup by identity                  |
//! | `Field { attr, geo_json }`    | first `geo1` with `fields[0] == attr` and same flag |
//! | `FieldPair { lat, lon }`      | first `geo2` with `fields == [lat, lon]`           |
//!
//! Scans follow catalog order and stop at the first match.

use crate::catalog::{IndexDescriptor, IndexHandle, INDEX_TYPE_GEO1, INDEX_TYPE_GEO2};
use crate::collection::Collection;
use crate::engine::Engine;
use crate::error::{IronQueryError, Result};
use crate::log_debug;
use crate::simple_query::{
    check_latitude, check_longitude, check_radius, IndexHint, IndexKind, QueryKind, SimpleQuery,
};

/// What `geo()` should resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoLocator {
    /// An already identified index
    Index(IndexHandle),
    /// Single location attribute (`geo1`), `geo_json` selecting the coordinate order
    Field { attribute: String, geo_json: bool },
    /// Separate latitude and longitude attributes (`geo2`), in that order
    FieldPair { latitude: String, longitude: String },
}

impl GeoLocator {
    /// `geo1` on `attribute` with `geoJson == false`
    pub fn field(attribute: impl Into<String>) -> Self {
        GeoLocator::Field {
            attribute: attribute.into(),
            geo_json: false,
        }
    }

    pub fn field_with_geo_json(attribute: impl Into<String>, geo_json: bool) -> Self {
        GeoLocator::Field {
            attribute: attribute.into(),
            geo_json,
        }
    }

    pub fn pair(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        GeoLocator::FieldPair {
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }

    pub fn index(handle: IndexHandle) -> Self {
        GeoLocator::Index(handle)
    }

    /// Whether a catalog entry satisfies a field-based locator.
    /// Index locators never match by scan.
    pub fn matches(&self, index: &IndexDescriptor) -> bool {
        match self {
            GeoLocator::Index(_) => false,
            GeoLocator::Field {
                attribute,
                geo_json,
            } => {
                index.index_type == INDEX_TYPE_GEO1
                    && index.field(0) == Some(attribute.as_str())
                    && index.geo_json == Some(*geo_json)
            }
            GeoLocator::FieldPair {
                latitude,
                longitude,
            } => {
                index.index_type == INDEX_TYPE_GEO2
                    && index.field(0) == Some(latitude.as_str())
                    && index.field(1) == Some(longitude.as_str())
            }
        }
    }
}

impl From<&str> for GeoLocator {
    fn from(attribute: &str) -> Self {
        GeoLocator::field(attribute)
    }
}

impl From<String> for GeoLocator {
    fn from(attribute: String) -> Self {
        GeoLocator::field(attribute)
    }
}

impl From<(&str, bool)> for GeoLocator {
    fn from((attribute, geo_json): (&str, bool)) -> Self {
        GeoLocator::field_with_geo_json(attribute, geo_json)
    }
}

impl From<(&str, &str)> for GeoLocator {
    fn from((latitude, longitude): (&str, &str)) -> Self {
        GeoLocator::pair(latitude, longitude)
    }
}

impl From<IndexHandle> for GeoLocator {
    fn from(handle: IndexHandle) -> Self {
        GeoLocator::Index(handle)
    }
}

/// First catalog entry matching a field-based locator
pub fn find_geo_index<'a>(
    indexes: &'a [IndexDescriptor],
    locator: &GeoLocator,
) -> Option<&'a IndexDescriptor> {
    indexes.iter().find(|index| locator.matches(index))
}

impl<E: Engine> Collection<E> {
    /// Resolve `locator` to one geo index of this collection
    pub fn resolve_geo_index(&self, locator: &GeoLocator) -> Result<IndexDescriptor> {
        let name = self.name();
        let found = match locator {
            GeoLocator::Index(handle) => {
                log_debug!("geo: direct lookup of index {} on '{}'", handle, name);
                self.engine().index(&name, handle)?
            }
            _ => {
                let indexes = self.engine().get_indexes(&name)?;
                log_debug!(
                    "geo: scanning {} catalog entries of '{}' for {:?}",
                    indexes.len(),
                    name,
                    locator
                );
                find_geo_index(&indexes, locator).cloned()
            }
        };

        found.ok_or(IronQueryError::GeoIndexMissing { collection: name })
    }

    /// Geo restriction through the index `locator` resolves to
    ///
    /// ```ignore
    /// coll.geo("loc")?;                           // geo1, geoJson = false
    /// coll.geo(("loc", true))?;                   // geo1, geoJson = true
    /// coll.geo(("lat", "lon"))?;                  // geo2 on (lat, lon)
    /// coll.geo(IndexHandle::id("places/17"))?;    // direct lookup
    /// ```
    pub fn geo(&self, locator: impl Into<GeoLocator>) -> Result<GeoQuery<'_, E>> {
        let index = self.resolve_geo_index(&locator.into())?;
        Ok(GeoQuery {
            query: SimpleQuery::new(
                self,
                QueryKind::Geo {
                    resolved_index_id: index.id.clone(),
                },
            ),
            index_id: index.id,
        })
    }
}

/// Geo restriction bound to a resolved index
pub struct GeoQuery<'c, E> {
    query: SimpleQuery<'c, E>,
    index_id: String,
}

impl<'c, E> GeoQuery<'c, E> {
    pub fn index_id(&self) -> &str {
        &self.index_id
    }

    pub fn query(&self) -> &SimpleQuery<'c, E> {
        &self.query
    }

    fn hint(&self) -> Option<IndexHint> {
        Some(IndexHint::new(self.index_id(), IndexKind::Geo))
    }

    /// Near query answered by the resolved index
    pub fn near(&self, latitude: f64, longitude: f64) -> Result<SimpleQuery<'c, E>> {
        check_latitude(latitude)?;
        check_longitude(longitude)?;
        Ok(SimpleQuery::new(
            self.query.collection(),
            QueryKind::Near {
                latitude,
                longitude,
                distance: None,
                index: self.hint(),
            },
        ))
    }

    /// Within query answered by the resolved index
    pub fn within(&self, latitude: f64, longitude: f64, radius: f64) -> Result<SimpleQuery<'c, E>> {
        check_latitude(latitude)?;
        check_longitude(longitude)?;
        check_radius(radius)?;
        Ok(SimpleQuery::new(
            self.query.collection(),
            QueryKind::Within {
                latitude,
                longitude,
                radius,
                distance: None,
                index: self.hint(),
            },
        ))
    }
}

impl<'c, E> std::fmt::Debug for GeoQuery<'c, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoQuery")
            .field("index_id", &self.index_id)
            .field("query", &self.query)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IndexDescriptor;

    fn catalog() -> Vec<IndexDescriptor> {
        vec![
            IndexDescriptor::new("places/0", "primary", vec!["_key".to_string()]),
            IndexDescriptor::geo1("places/1", "loc", true),
            IndexDescriptor::geo1("places/2", "loc", false),
            IndexDescriptor::geo2("places/3", "lat", "lon"),
            IndexDescriptor::geo1("places/4", "loc", false),
        ]
    }

    #[test]
    fn test_field_matches_geo_json_flag() {
        let indexes = catalog();
        let found = find_geo_index(&indexes, &GeoLocator::field_with_geo_json("loc", true));
        assert_eq!(found.map(|i| i.id.as_str()), Some("places/1"));

        let found = find_geo_index(&indexes, &GeoLocator::field("loc"));
        assert_eq!(found.map(|i| i.id.as_str()), Some("places/2"));
    }

    #[test]
    fn test_geo1_without_flag_never_matches() {
        let indexes: Vec<IndexDescriptor> = vec![serde_json::from_value(serde_json::json!({
            "id": "places/7",
            "type": "geo1",
            "fields": ["loc"]
        }))
        .unwrap()];

        assert!(find_geo_index(&indexes, &GeoLocator::field("loc")).is_none());
        assert!(find_geo_index(&indexes, &GeoLocator::field_with_geo_json("loc", true)).is_none());
    }

    #[test]
    fn test_pair_is_order_sensitive() {
        let indexes = catalog();
        let found = find_geo_index(&indexes, &GeoLocator::pair("lat", "lon"));
        assert_eq!(found.map(|i| i.id.as_str()), Some("places/3"));
        assert!(find_geo_index(&indexes, &GeoLocator::pair("lon", "lat")).is_none());
    }

    #[test]
    fn test_field_does_not_match_geo2_first_field() {
        let indexes = catalog();
        assert!(find_geo_index(&indexes, &GeoLocator::field("lat")).is_none());
    }

    #[test]
    fn test_index_locator_never_scans() {
        let indexes = catalog();
        let locator = GeoLocator::index(IndexHandle::id("places/1"));
        assert!(find_geo_index(&indexes, &locator).is_none());
    }

    #[test]
    fn test_locator_conversions() {
        assert_eq!(GeoLocator::from("loc"), GeoLocator::field("loc"));
        assert_eq!(
            GeoLocator::from(("loc", true)),
            GeoLocator::field_with_geo_json("loc", true)
        );
        assert_eq!(GeoLocator::from(("a", "b")), GeoLocator::pair("a", "b"));
        assert_eq!(
            GeoLocator::from(IndexHandle::name("geo")),
            GeoLocator::Index(IndexHandle::name("geo"))
        );
    }
}
