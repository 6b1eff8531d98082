use std::cell::RefCell;
use std::rc::Rc;

use clustering::{ClusterFeature, FeatureKey, LocationPoint};
use explorer::{ExplorerConfig, MapExplorer};
use foundation::camera::{CameraState, LngLat};
use foundation::ids::LocationId;
use foundation::time::Time;
use pretty_assertions::assert_eq;
use runtime::Frame;
use viewport::SnapshotPhase;

fn locations() -> Vec<LocationPoint> {
    vec![
        LocationPoint::new(1, 2.35, 48.85, "city").with_name("Paris"),
        LocationPoint::new(2, 2.13, 48.80, "history").with_name("Versailles"),
        LocationPoint::new(3, 2.34, 48.86, "culture").with_name("Louvre"),
        LocationPoint::new(4, -74.0, 40.7, "city").with_name("New York"),
        LocationPoint::new(5, -43.2, -22.9, "nature").with_name("Rio de Janeiro"),
        LocationPoint::new(6, 139.7, 35.7, "city").with_name("Tokyo"),
    ]
}

fn explorer() -> MapExplorer {
    let mut cfg = ExplorerConfig::default();
    cfg.cluster.max_zoom = 3;
    let mut e = MapExplorer::new(cfg).unwrap();
    e.resize(800.0, 600.0);
    e.set_locations(locations()).unwrap();
    e
}

fn settle(e: &mut MapExplorer) {
    let start = e.animator().now().0;
    for i in 1..=120 {
        e.tick(Frame::at(i, Time(start + i as f64 / 60.0), 1.0 / 60.0));
    }
}

fn location(id: u64) -> FeatureKey {
    FeatureKey::Location(LocationId(id))
}

fn paris_cluster(features: &[ClusterFeature]) -> FeatureKey {
    features
        .iter()
        .find(|f| f.is_aggregate())
        .map(|f| f.key())
        .expect("aggregate over paris")
}

#[test]
fn default_view_lists_features_in_reading_order() {
    let e = explorer();
    let bounds = e.bounds();
    assert!(bounds.contains(LngLat::new(0.0, 20.0)));
    assert!(!bounds.contains(LngLat::new(139.7, 35.7)));

    let visible = e.visible_features().unwrap();
    let keys: Vec<FeatureKey> = visible.iter().map(|f| f.key()).collect();
    assert_eq!(keys.len(), 3);
    assert_eq!(keys[0], location(4));
    assert!(visible[1].is_aggregate());
    assert_eq!(visible[1].point_count(), 3);
    assert_eq!(keys[2], location(5));

    let agg = visible[1].as_aggregate().unwrap();
    assert_eq!(agg.categories.get("city"), Some(&1));
    assert_eq!(agg.categories.get("history"), Some(&1));
    assert_eq!(agg.categories.get("culture"), Some(&1));
}

#[test]
fn selecting_an_aggregate_zooms_until_it_splits() {
    let mut e = explorer();
    let visible = e.visible_features().unwrap();
    let key = paris_cluster(&visible);
    let position = visible[1].position();

    e.select(key).unwrap();
    settle(&mut e);

    let camera = e.animator().camera();
    assert_eq!(camera, CameraState::new(position, 4.0));
    let mut ids: Vec<FeatureKey> = e
        .visible_features()
        .unwrap()
        .iter()
        .map(|f| f.key())
        .collect();
    ids.sort();
    assert_eq!(ids, vec![location(1), location(2), location(3)]);
}

#[test]
fn selecting_a_point_brings_it_to_select_zoom() {
    let mut e = explorer();
    e.select(location(4)).unwrap();
    settle(&mut e);
    assert_eq!(e.animator().camera(), CameraState::at(-74.0, 40.7, 3.0));
    assert_eq!(e.selected(), Some(LocationId(4)));
    assert_eq!(e.focused(), Some(location(4)));
}

#[test]
fn keyboard_focus_cycles_and_wraps() {
    let mut e = explorer();
    let visible = e.visible_features().unwrap();
    let cluster = paris_cluster(&visible);

    assert_eq!(e.focus_next().unwrap(), Some(location(4)));
    assert_eq!(e.focus_next().unwrap(), Some(cluster));
    assert_eq!(e.focus_next().unwrap(), Some(location(5)));
    assert_eq!(e.focus_next().unwrap(), Some(location(4)));
    assert_eq!(e.focus_prev().unwrap(), Some(location(5)));
}

#[test]
fn filtering_keeps_focus_only_while_visible() {
    let mut e = explorer();
    assert_eq!(e.focus_next().unwrap(), Some(location(4)));

    assert!(e.set_search("new").unwrap());
    assert_eq!(e.focused(), Some(location(4)));

    assert!(e.set_search("").unwrap());
    e.focus_prev().unwrap();
    assert_eq!(e.focused(), Some(location(5)));
    assert!(e.set_category(Some("city".into())).unwrap());
    assert_eq!(e.focused(), None);

    let keys: Vec<FeatureKey> = e
        .visible_features()
        .unwrap()
        .iter()
        .map(|f| f.key())
        .collect();
    assert_eq!(keys, vec![location(4), location(1)]);
    assert_eq!(e.categories(), vec!["city", "culture", "history", "nature"]);
}

#[test]
fn dragging_publishes_immediately() {
    let mut e = explorer();
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    e.subscribe(move |s| sink.borrow_mut().push(*s));

    e.drag_to(LngLat::new(120.0, 30.0));
    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].phase, SnapshotPhase::Immediate);
    assert_eq!(log[0].camera, CameraState::at(120.0, 30.0, 1.2));

    let visible = e.visible_features().unwrap();
    assert!(visible.iter().any(|f| f.key() == location(6)));
}

#[test]
fn independent_explorers_do_not_share_state() {
    let mut a = explorer();
    let b = explorer();
    a.drag_to(LngLat::new(60.0, 10.0));
    assert_eq!(a.published_camera().center, LngLat::new(60.0, 10.0));
    assert_eq!(b.published_camera(), CameraState::at(0.0, 20.0, 1.2));
}
