//! The map synchronisation engine.
//!
//! Reconciles feed emissions and the shared selection against a live
//! `MapSurface`: one marker per entity id, one popup, a camera that tracks
//! the followed entity, and the command ports popup markup calls back into.
//!
//! ORDER PER EMISSION (fixed):
//!   1. Publish the population to the shared state.
//!   2. Marker pass: move known markers, create markers for new ids.
//!   3. Camera + popup for the followed entity.
//!   4. Refresh the open popup in place.
//! Steps 3 and 4 only ever see positions applied in step 2.
//!
//! RULES:
//!   - A marker is created once per id and then only moved.
//!   - Long-lived handlers resolve the entity and the selection when they
//!     run, never from values captured when they were attached.
//!   - No shared-state write happens while the view itself is borrowed.

use crate::{
    command_port::{self, CommandPort, PortGuard},
    config::MapConfig,
    error::ViewerError,
    event::FeedMessage,
    popup::render_popup,
    state::SharedState,
    surface::{Cursor, ListenKind, ListenTarget, ListenerId, MapEvent, MapOptions, MapSurface, MarkerHandle},
    types::{EntityId, LatLng},
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

/// Outcome of `MapView::activate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Created,
    AlreadyActive,
    /// No surface could be created (missing configuration). Selection still
    /// works; nothing is drawn.
    Degraded,
}

/// Shift `lng` by whole turns so it lies within 180° of `reference`.
///
/// Used to place a popup on the world copy the user actually clicked.
pub fn wrap_longitude_near(lng: f64, reference: f64) -> f64 {
    if !lng.is_finite() || !reference.is_finite() {
        return lng;
    }
    if (reference - lng).abs() <= 180.0 {
        return lng;
    }
    reference + (lng - reference + 180.0).rem_euclid(360.0) - 180.0
}

struct MarkerEntry {
    handle: MarkerHandle,
    listeners: Vec<ListenerId>,
}

struct ViewInner<S> {
    config: MapConfig,
    state: SharedState,
    active: bool,
    surface: Option<S>,
    map_listeners: Vec<ListenerId>,
    markers: HashMap<EntityId, MarkerEntry>,
    by_handle: HashMap<MarkerHandle, EntityId>,
    active_popup_id: Option<EntityId>,
    ports: Option<PortGuard>,
}

/// Cheap-to-clone handle; every clone drives the same view.
pub struct MapView<S: MapSurface + 'static> {
    inner: Rc<RefCell<ViewInner<S>>>,
}

impl<S: MapSurface + 'static> Clone for MapView<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// What a handler decided while the view was borrowed, applied after.
enum SelectionWrite {
    Keep,
    Clear,
}

impl<S: MapSurface + 'static> MapView<S> {
    pub fn new(config: MapConfig, state: SharedState) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ViewInner {
                config,
                state,
                active: false,
                surface: None,
                map_listeners: Vec::new(),
                markers: HashMap::new(),
                by_handle: HashMap::new(),
                active_popup_id: None,
                ports: None,
            })),
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────

    /// Create the surface and install the command ports. Calling this again
    /// while active is a no-op.
    pub fn activate(&self, create_surface: impl FnOnce(&MapOptions) -> S) -> Activation {
        let mut inner = self.inner.borrow_mut();
        if inner.active {
            log::debug!("view: activate() while active, ignoring");
            return Activation::AlreadyActive;
        }
        inner.active = true;

        let port: Rc<dyn CommandPort> = Rc::new(ViewPort {
            view: Rc::downgrade(&self.inner),
        });
        inner.ports = Some(command_port::install(port));

        let Some(options) = MapOptions::from_config(&inner.config) else {
            log::error!("view: {}; map surface not created", ViewerError::MissingAccessToken);
            return Activation::Degraded;
        };

        let mut surface = create_surface(&options);
        inner.map_listeners = vec![
            surface.listen(ListenTarget::Map, ListenKind::Click),
            surface.listen(ListenTarget::Popup, ListenKind::Close),
        ];
        inner.surface = Some(surface);
        log::info!("view: map surface created (zoom {})", options.zoom);
        Activation::Created
    }

    /// Detach every listener, remove the surface and retract the command
    /// ports. Safe to call more than once.
    pub fn teardown(&self) {
        let mut inner = self.inner.borrow_mut();
        let inner = &mut *inner;

        if let Some(mut surface) = inner.surface.take() {
            for (_, entry) in inner.markers.drain() {
                for listener in entry.listeners {
                    surface.unlisten(listener);
                }
                surface.remove_marker(entry.handle);
            }
            for listener in inner.map_listeners.drain(..) {
                surface.unlisten(listener);
            }
            surface.close_popup();
            surface.remove();
            log::info!("view: map surface removed");
        }

        inner.markers.clear();
        inner.by_handle.clear();
        inner.active_popup_id = None;
        inner.ports = None;
        inner.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.inner.borrow().active
    }

    pub fn has_surface(&self) -> bool {
        self.inner.borrow().surface.is_some()
    }

    /// Run `f` against the live surface, if there is one.
    pub fn with_surface<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        self.inner.borrow_mut().surface.as_mut().map(f)
    }

    pub fn marker_for(&self, id: &str) -> Option<MarkerHandle> {
        self.inner.borrow().markers.get(id).map(|m| m.handle)
    }

    pub fn marker_count(&self) -> usize {
        self.inner.borrow().markers.len()
    }

    pub fn active_popup_id(&self) -> Option<EntityId> {
        self.inner.borrow().active_popup_id.clone()
    }

    pub fn state(&self) -> SharedState {
        self.inner.borrow().state.clone()
    }

    // ── Feed consumer ──────────────────────────────────────────

    pub fn on_simulation_data(&self, message: &FeedMessage) {
        let state = self.state();
        state.replace_population(message.population.clone());

        let mut inner = self.inner.borrow_mut();
        let inner = &mut *inner;
        let Some(surface) = inner.surface.as_mut() else {
            return;
        };

        // Marker pass.
        let mut created = 0usize;
        for entity in &message.population {
            let at = entity.position();
            match inner.markers.get(&entity.id) {
                Some(entry) => surface.set_marker_position(entry.handle, at),
                None => {
                    let handle = surface.add_marker(at);
                    let listeners = vec![
                        surface.listen(ListenTarget::Marker(handle), ListenKind::Click),
                        surface.listen(ListenTarget::Marker(handle), ListenKind::MouseEnter),
                        surface.listen(ListenTarget::Marker(handle), ListenKind::MouseLeave),
                    ];
                    inner.markers.insert(entity.id.clone(), MarkerEntry { handle, listeners });
                    inner.by_handle.insert(handle, entity.id.clone());
                    created += 1;
                }
            }
        }

        if inner.markers.len() > message.population.len() {
            let present: HashSet<&str> = message.population.iter().map(|e| e.id.as_str()).collect();
            let gone: Vec<EntityId> = inner
                .markers
                .keys()
                .filter(|id| !present.contains(id.as_str()))
                .cloned()
                .collect();
            for id in gone {
                if let Some(entry) = inner.markers.remove(&id) {
                    for listener in entry.listeners {
                        surface.unlisten(listener);
                    }
                    surface.remove_marker(entry.handle);
                    inner.by_handle.remove(&entry.handle);
                }
            }
        }

        log::debug!(
            "view: {} with {} entities ({created} new markers)",
            message.kind.name(),
            message.population.len()
        );

        // Camera and popup for the followed entity.
        let followed_id = state.followed_id();
        let followed = followed_id
            .as_deref()
            .and_then(|id| message.population.iter().find(|e| e.id == id));
        let mut opened_now = false;
        if let Some(entity) = followed {
            surface.ease_to(entity.position(), inner.config.ease_duration_ms);
            let open_for_it = surface.is_popup_open()
                && inner.active_popup_id.as_deref() == Some(entity.id.as_str());
            if !open_for_it {
                surface.open_popup(entity.position(), &render_popup(entity, true));
                inner.active_popup_id = Some(entity.id.clone());
                opened_now = true;
            }
        }

        // Keep the open popup current.
        if !opened_now && surface.is_popup_open() {
            if let Some(active_id) = inner.active_popup_id.clone() {
                match message.population.iter().find(|e| e.id == active_id) {
                    Some(entity) => {
                        let following = followed_id.as_deref() == Some(active_id.as_str());
                        surface.update_popup(entity.position(), &render_popup(entity, following));
                    }
                    None => {
                        surface.close_popup();
                        inner.active_popup_id = None;
                    }
                }
            }
        }
    }

    // ── User input ─────────────────────────────────────────────

    pub fn handle_event(&self, event: MapEvent) {
        let write = {
            let mut inner = self.inner.borrow_mut();
            let inner = &mut *inner;
            let Some(surface) = inner.surface.as_mut() else {
                log::debug!("view: {event:?} with no surface, ignoring");
                return;
            };

            match event {
                MapEvent::MarkerClick { marker, at } => {
                    let entity = inner
                        .by_handle
                        .get(&marker)
                        .and_then(|id| inner.state.entity(id));
                    match entity {
                        Some(entity) => {
                            let following = inner.state.followed_id().as_deref() == Some(entity.id.as_str());
                            let anchor = LatLng::new(
                                entity.latitude,
                                wrap_longitude_near(entity.longitude, at.lng),
                            );
                            surface.open_popup(anchor, &render_popup(&entity, following));
                            inner.active_popup_id = Some(entity.id);
                        }
                        None => log::debug!("view: click on {marker:?} matched no entity"),
                    }
                    SelectionWrite::Keep
                }
                MapEvent::MarkerEnter { .. } => {
                    surface.set_cursor(Cursor::Pointer);
                    SelectionWrite::Keep
                }
                MapEvent::MarkerLeave { .. } => {
                    surface.set_cursor(Cursor::Default);
                    SelectionWrite::Keep
                }
                MapEvent::MapClick { .. } => {
                    if !inner.state.is_following() {
                        surface.close_popup();
                        inner.active_popup_id = None;
                    }
                    SelectionWrite::Keep
                }
                MapEvent::PopupClose => {
                    inner.active_popup_id = None;
                    if inner.state.is_following() {
                        SelectionWrite::Clear
                    } else {
                        SelectionWrite::Keep
                    }
                }
            }
        };

        if let SelectionWrite::Clear = write {
            self.state().set_followed(None);
        }
    }

    // ── Follow control ─────────────────────────────────────────

    /// Follow `id`. Tracking starts with the next emission containing it;
    /// an open popup for `id` flips to its unfollow action right away.
    pub fn follow(&self, id: &str) {
        self.state().set_followed(Some(id.to_string()));
        self.refresh_popup();
    }

    /// Stop following and close the popup.
    pub fn unfollow(&self) {
        self.state().set_followed(None);
        let mut inner = self.inner.borrow_mut();
        let inner = &mut *inner;
        if let Some(surface) = inner.surface.as_mut() {
            surface.close_popup();
        }
        inner.active_popup_id = None;
    }

    fn refresh_popup(&self) {
        let mut inner = self.inner.borrow_mut();
        let inner = &mut *inner;
        let Some(surface) = inner.surface.as_mut() else {
            return;
        };
        if !surface.is_popup_open() {
            return;
        }
        let Some(entity) = inner.active_popup_id.as_deref().and_then(|id| inner.state.entity(id)) else {
            return;
        };
        let following = inner.state.followed_id().as_deref() == Some(entity.id.as_str());
        surface.update_popup(entity.position(), &render_popup(&entity, following));
    }
}

/// The command port a view installs. Holds the view weakly so an installed
/// port never keeps a torn-down view alive.
struct ViewPort<S: MapSurface + 'static> {
    view: Weak<RefCell<ViewInner<S>>>,
}

impl<S: MapSurface + 'static> ViewPort<S> {
    fn view(&self) -> Option<MapView<S>> {
        self.view.upgrade().map(|inner| MapView { inner })
    }
}

impl<S: MapSurface + 'static> CommandPort for ViewPort<S> {
    fn follow(&self, id: &str) {
        if let Some(view) = self.view() {
            view.follow(id);
        }
    }

    fn unfollow(&self) {
        if let Some(view) = self.view() {
            view.unfollow();
        }
    }
}
