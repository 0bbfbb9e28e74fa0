//! Integration tests for the collection facade
//!
//! Geo index resolution, query dispatch and rendering against the
//! in-memory engine.

use ironquery_core::error::codes;
use ironquery_core::{
    Collection, CollectionStatus, CollectionType, ExampleMutations, GeoLocator, IndexDescriptor,
    IndexHandle, IndexKind, MemoryEngine, MutationOptions, QueryKind,
};
use serde_json::json;
use std::sync::Arc;

fn create_places(indexes: Vec<IndexDescriptor>) -> Collection<MemoryEngine> {
    let engine = Arc::new(MemoryEngine::new());
    engine
        .create_collection("places", CollectionType::Document)
        .unwrap();
    for index in indexes {
        engine.ensure_index("places", index).unwrap();
    }
    engine.collection("places").unwrap()
}

// ========== GEO RESOLUTION ==========

#[test]
fn test_geo_json_flag_must_match() {
    let places = create_places(vec![IndexDescriptor::geo1("places/10", "loc", true)]);

    let geo = places.geo(("loc", true)).unwrap();
    assert_eq!(geo.index_id(), "places/10");
    assert_eq!(
        geo.query().kind(),
        &QueryKind::Geo {
            resolved_index_id: "places/10".to_string()
        }
    );

    let err = places.geo(("loc", false)).unwrap_err();
    assert_eq!(err.error_num(), codes::ERROR_QUERY_GEO_INDEX_MISSING);
    assert!(err.error_message().contains("'places'"));
}

#[test]
fn test_field_without_flag_means_geo_json_false() {
    let places = create_places(vec![
        IndexDescriptor::geo1("places/10", "loc", true),
        IndexDescriptor::geo1("places/11", "loc", false),
    ]);
    assert_eq!(places.geo("loc").unwrap().index_id(), "places/11");
}

#[test]
fn test_geo2_pair_order_matters() {
    let places = create_places(vec![IndexDescriptor::geo2("places/20", "lat", "lon")]);

    assert_eq!(places.geo(("lat", "lon")).unwrap().index_id(), "places/20");

    let err = places.geo(("lon", "lat")).unwrap_err();
    assert_eq!(err.error_num(), codes::ERROR_QUERY_GEO_INDEX_MISSING);
}

#[test]
fn test_first_match_in_catalog_order_wins() {
    let places = create_places(vec![
        IndexDescriptor::geo2("places/30", "lat", "lon"),
        IndexDescriptor::geo2("places/31", "lat", "lon"),
    ]);
    assert_eq!(places.geo(("lat", "lon")).unwrap().index_id(), "places/30");
}

#[test]
fn test_geo_by_index_handle() {
    let places = create_places(vec![
        IndexDescriptor::geo1("places/40", "loc", false).with_name("by_loc")
    ]);

    assert_eq!(
        places.geo(IndexHandle::id("40")).unwrap().index_id(),
        "places/40"
    );
    assert_eq!(
        places.geo(IndexHandle::name("by_loc")).unwrap().index_id(),
        "places/40"
    );

    let err = places.geo(IndexHandle::id("places/99")).unwrap_err();
    assert_eq!(err.error_num(), codes::ERROR_QUERY_GEO_INDEX_MISSING);
}

#[test]
fn test_empty_catalog_has_no_geo_index() {
    let places = create_places(vec![]);
    for locator in [
        GeoLocator::field("loc"),
        GeoLocator::field_with_geo_json("loc", true),
        GeoLocator::pair("lat", "lon"),
    ] {
        let err = places.resolve_geo_index(&locator).unwrap_err();
        assert_eq!(err.error_num(), codes::ERROR_QUERY_GEO_INDEX_MISSING);
    }
}

#[test]
fn test_geo_chaining_carries_index_hint() {
    let places = create_places(vec![IndexDescriptor::geo1("places/50", "loc", false)]);
    let geo = places.geo("loc").unwrap();

    let near = geo.near(50.94, 6.96).unwrap().limit(3);
    match near.kind() {
        QueryKind::Near {
            index: Some(hint), ..
        } => {
            assert_eq!(hint.id, "places/50");
            assert_eq!(hint.kind, IndexKind::Geo);
        }
        other => panic!("unexpected kind {:?}", other),
    }
    assert_eq!(near.descriptor().limit, Some(3));

    let within = geo.within(50.94, 6.96, 250.0).unwrap();
    assert_eq!(
        serde_json::to_value(within.descriptor()).unwrap()["index"],
        json!({"id": "places/50", "type": "geo"})
    );
    assert!(geo.within(50.94, 6.96, -1.0).is_err());
}

#[test]
fn test_near_within_need_no_catalog() {
    let places = create_places(vec![]);
    assert_eq!(places.near(10.0, 20.0).unwrap().kind().name(), "near");
    assert_eq!(places.within(10.0, 20.0, 5.0).unwrap().kind().name(), "within");
}

// ========== HANDLE ==========

#[test]
fn test_collection_rendering_follows_lifecycle() {
    let engine = Arc::new(MemoryEngine::new());
    let info = engine
        .create_collection("roads", CollectionType::Edge)
        .unwrap();
    let roads = engine.collection("roads").unwrap();

    assert_eq!(
        roads.to_string(),
        format!("[Collection {}, \"roads\" (type edge, status loaded)]", info.id)
    );

    let unloaded = engine
        .set_status("roads", CollectionStatus::Unloaded)
        .unwrap();
    roads.update_info(unloaded).unwrap();
    assert!(roads.to_string().ends_with("(type edge, status unloaded)]"));
}

#[test]
fn test_index_lookup() {
    let places = create_places(vec![IndexDescriptor::geo2("places/60", "lat", "lon")]);
    assert_eq!(places.get_indexes().unwrap().len(), 2);
    assert_eq!(
        places.index(&IndexHandle::id("60")).unwrap().fields,
        vec!["lat", "lon"]
    );

    let err = places.index(&IndexHandle::id("61")).unwrap_err();
    assert_eq!(err.error_num(), codes::ERROR_ARANGO_INDEX_NOT_FOUND);
}

#[test]
fn test_base_facade_mutations_fail() {
    let places = create_places(vec![]);
    let example = ironquery_core::Example::new().with("name", "Cologne");
    let err = places
        .remove_by_example(&example, &MutationOptions::new())
        .unwrap_err();
    assert_eq!(err.error_num(), codes::ERROR_NOT_IMPLEMENTED);
}

#[test]
fn test_by_example_against_engine() {
    let places = create_places(vec![]);
    let engine = places.engine();
    engine
        .insert("places", json!({"name": "Cologne", "country": "DE"}))
        .unwrap();
    engine
        .insert("places", json!({"name": "Paris", "country": "FR"}))
        .unwrap();

    let found = places
        .by_example_pairs(vec![json!("country"), json!("FR")])
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], json!("Paris"));
}
