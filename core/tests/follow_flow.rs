//! Map view follow behaviour, driven end to end through the headless map.

use livemap_core::{
    command_port::{self, FOLLOW_PORT, UNFOLLOW_PORT},
    config::{MapConfig, ViewerConfig},
    entity::Entity,
    event::{FeedKind, FeedMessage},
    map_view::{Activation, MapView},
    state::SharedState,
    surface::{Cursor, HeadlessMap, SurfaceStats},
    types::LatLng,
    LiveMapApp,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Mounted app with the snapshot already delivered.
fn mounted() -> LiveMapApp<HeadlessMap> {
    init_logging();
    let mut app = LiveMapApp::new(ViewerConfig::default_test());
    assert_eq!(app.mount(HeadlessMap::new), Activation::Created);
    app.advance(100);
    app
}

fn popup_html(app: &LiveMapApp<HeadlessMap>) -> Option<String> {
    app.view()
        .with_surface(|m| m.popup().map(|p| p.html.clone()))
        .flatten()
}

fn stats(app: &LiveMapApp<HeadlessMap>) -> SurfaceStats {
    app.view()
        .with_surface(|m| m.stats().clone())
        .expect("surface exists")
}

#[test]
fn markers_are_created_once_and_then_moved() {
    let mut app = mounted();
    let handles: Vec<_> = (1..=10)
        .map(|i| app.view().marker_for(&i.to_string()).expect("marker"))
        .collect();

    app.advance(5_000);

    let s = stats(&app);
    assert_eq!(s.markers_added, 10);
    assert_eq!(s.markers_removed, 0);
    assert_eq!(s.marker_moves, 10 * 5);
    assert_eq!(s.listeners_attached, 2 + 10 * 3);
    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(app.view().marker_for(&(i + 1).to_string()), Some(*handle));
    }

    let entity = app.state().entity("4").expect("entity 4");
    let drawn = app
        .view()
        .with_surface(|m| m.marker_position(handles[3]))
        .flatten();
    assert_eq!(drawn, Some(entity.position()));
    app.unmount();
}

#[test]
fn follow_unfollow_refollow_round_trip() {
    let mut app = mounted();

    app.select("3");
    assert_eq!(app.state().followed_id().as_deref(), Some("3"));
    app.advance(900);

    let entity = app.state().entity("3").expect("entity 3");
    assert_eq!(app.view().active_popup_id().as_deref(), Some("3"));
    let html = popup_html(&app).expect("popup open");
    assert!(html.contains("window.unfollowUser()"));
    let ease = app.view().with_surface(|m| m.last_ease()).flatten().expect("eased");
    assert_eq!(ease.center, entity.position());
    assert_eq!(ease.duration, 1_000);

    assert!(command_port::invoke_unfollow());
    assert_eq!(app.state().followed_id(), None);
    assert_eq!(popup_html(&app), None);
    assert_eq!(app.view().active_popup_id(), None);

    let eases = stats(&app).eases;
    app.advance(1_000);
    assert_eq!(stats(&app).eases, eases, "camera stops tracking");
    assert_eq!(popup_html(&app), None, "popup stays closed");

    app.select("3");
    app.advance(1_000);
    assert_eq!(stats(&app).eases, eases + 1);
    assert_eq!(app.view().active_popup_id().as_deref(), Some("3"));
    assert!(popup_html(&app).expect("reopened").contains("Unfollow"));
    app.unmount();
}

#[test]
fn camera_tracks_every_emission_while_following() {
    let mut app = mounted();
    app.follow("2");
    app.advance(3_000);

    let s = stats(&app);
    assert_eq!(s.eases, 3);
    assert_eq!(s.popup_opens, 1, "popup opened once, then refreshed");
    assert_eq!(s.popup_updates, 2);

    let entity = app.state().entity("2").expect("entity 2");
    let popup = app
        .view()
        .with_surface(|m| m.popup().cloned())
        .flatten()
        .expect("popup");
    assert_eq!(popup.at, entity.position());
    assert!(popup.html.contains(&format!("Lat: {:.5}", entity.latitude)));
    app.unmount();
}

#[test]
fn selection_made_before_the_entity_exists_takes_effect_on_arrival() {
    init_logging();
    let mut app = LiveMapApp::new(ViewerConfig::default_test());
    app.mount(HeadlessMap::new);
    app.follow("7");
    assert_eq!(app.view().active_popup_id(), None);

    app.advance(100);
    let entity = app.state().entity("7").expect("entity 7");
    assert_eq!(app.state().followed_id().as_deref(), Some("7"));
    assert_eq!(app.view().active_popup_id().as_deref(), Some("7"));
    let ease = app.view().with_surface(|m| m.last_ease()).flatten();
    assert_eq!(ease.map(|e| e.center), Some(entity.position()));
    app.unmount();
}

#[test]
fn marker_click_opens_popup_with_current_selection() {
    let mut app = mounted();
    app.follow("5");
    app.advance(900);

    assert!(app.click_marker("5"));
    let html = popup_html(&app).expect("popup");
    assert!(html.contains("Unfollow"), "follow state resolved at click time");

    assert!(app.click_marker("6"));
    assert_eq!(app.view().active_popup_id().as_deref(), Some("6"));
    let html = popup_html(&app).expect("popup");
    assert!(html.contains("window.followUser('6')"));
    app.unmount();
}

#[test]
fn popup_follow_button_routes_through_the_port() {
    let mut app = mounted();
    assert!(app.click_marker("8"));

    let html = popup_html(&app).expect("popup");
    let onclick = html
        .split("onclick=\"")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .expect("button handler");
    let call = command_port::parse_invocation(onclick).expect("known port");
    assert!(command_port::dispatch(&call));

    assert_eq!(app.state().followed_id().as_deref(), Some("8"));
    assert!(popup_html(&app).expect("popup").contains("Unfollow"));
    app.unmount();
}

#[test]
fn background_click_is_ignored_while_following() {
    let mut app = mounted();
    app.follow("1");
    app.advance(900);
    assert!(popup_html(&app).is_some());

    assert!(app.click_background(LatLng::new(0.0, 0.0)));
    assert!(popup_html(&app).is_some());
    assert_eq!(app.state().followed_id().as_deref(), Some("1"));

    app.unfollow();
    assert!(app.click_marker("2"));
    assert!(app.click_background(LatLng::new(0.0, 0.0)));
    assert!(popup_html(&app).is_none());
    assert_eq!(app.view().active_popup_id(), None);
    app.unmount();
}

#[test]
fn closing_the_popup_clears_the_selection() {
    let mut app = mounted();
    app.follow("9");
    app.advance(900);

    assert!(app.press_popup_close());
    assert_eq!(app.state().followed_id(), None);
    assert_eq!(app.view().active_popup_id(), None);

    let eases = stats(&app).eases;
    app.advance(1_000);
    assert_eq!(stats(&app).eases, eases);
    assert!(popup_html(&app).is_none());
    app.unmount();
}

#[test]
fn teardown_detaches_everything_and_retracts_ports() {
    let mut app = mounted();
    assert!(command_port::is_installed(FOLLOW_PORT));
    assert!(command_port::is_installed(UNFOLLOW_PORT));

    let view = app.view().clone();
    app.unmount();

    assert!(!command_port::is_installed(FOLLOW_PORT));
    assert!(!command_port::is_installed(UNFOLLOW_PORT));
    assert!(!command_port::invoke_follow("1"));
    assert!(!view.has_surface());
    assert_eq!(view.marker_count(), 0);

    let followed = app.state().followed_id();
    assert_eq!(app.advance(10_000), 0);
    assert!(!app.click_marker("1"));
    assert!(!app.click_background(LatLng::new(0.0, 0.0)));
    assert_eq!(app.state().followed_id(), followed);
}

#[test]
fn missing_token_degrades_without_a_surface() {
    init_logging();
    let mut config = ViewerConfig::default_test();
    config.map.access_token = None;
    let mut app: LiveMapApp<HeadlessMap> = LiveMapApp::new(config);

    assert_eq!(app.mount(HeadlessMap::new), Activation::Degraded);
    assert!(!app.view().has_surface());

    app.advance(1_000);
    assert_eq!(app.state().total_count(), 10, "population still published");

    assert!(command_port::invoke_follow("4"));
    assert_eq!(app.state().followed_id().as_deref(), Some("4"));
    app.unmount();
    assert!(!command_port::is_installed(FOLLOW_PORT));
}

#[test]
fn activation_is_idempotent() {
    init_logging();
    let config = MapConfig {
        access_token: Some("pk.idempotent".into()),
        ..MapConfig::default()
    };
    let view: MapView<HeadlessMap> = MapView::new(config, SharedState::new());
    let mut created = 0;
    assert_eq!(
        view.activate(|o| {
            created += 1;
            HeadlessMap::new(o)
        }),
        Activation::Created
    );
    assert_eq!(
        view.activate(|o| {
            created += 1;
            HeadlessMap::new(o)
        }),
        Activation::AlreadyActive
    );
    assert_eq!(created, 1);
    view.teardown();
    view.teardown();
    assert!(!view.is_active());
}

#[test]
fn popup_anchors_on_the_clicked_world_copy() {
    init_logging();
    let config = MapConfig {
        access_token: Some("pk.wrap".into()),
        ..MapConfig::default()
    };
    let view: MapView<HeadlessMap> = MapView::new(config, SharedState::new());
    view.activate(HeadlessMap::new);
    view.on_simulation_data(&FeedMessage {
        kind: FeedKind::Snapshot,
        population: vec![Entity {
            id: "1".into(),
            display_name: "Dateline".into(),
            avatar_ref: String::new(),
            latitude: 10.0,
            longitude: -179.9,
            speed_class: 5,
        }],
    });

    let marker = view.marker_for("1").expect("marker");
    let click = view
        .with_surface(|m| m.click_marker_at(marker, LatLng::new(10.0, 179.9)))
        .flatten()
        .expect("listener attached");
    view.handle_event(click);

    let at = view
        .with_surface(|m| m.popup().map(|p| p.at))
        .flatten()
        .expect("popup");
    assert!((at.lng - 179.9).abs() <= 0.2 + 1e-9, "popup at {}", at.lng);
    view.teardown();
}

#[test]
fn hover_cursor_follows_the_pointer() {
    let app = mounted();
    let marker = app.view().marker_for("1").expect("marker");
    let enter = app
        .view()
        .with_surface(|m| m.hover_marker(marker))
        .flatten()
        .expect("enter listener");
    app.view().handle_event(enter);
    assert_eq!(app.view().with_surface(|m| m.cursor()), Some(Cursor::Pointer));
}

#[test]
fn zero_update_interval_mounts_and_shows_the_snapshot() {
    init_logging();
    let mut config = ViewerConfig::default_test();
    config.simulation.update_interval_ms = 0;
    let mut app = LiveMapApp::new(config);

    assert_eq!(app.mount(HeadlessMap::new), Activation::Created);
    assert_eq!(app.advance(60_000), 1);
    assert_eq!(app.view().marker_count(), app.state().total_count());
    assert_eq!(stats(&app).marker_moves, 0);
    app.unmount();
}
