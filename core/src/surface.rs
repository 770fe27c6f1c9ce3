//! Map capability interface.
//!
//! The view drives any backend through `MapSurface`: point markers with a
//! geographic anchor, a singleton HTML popup, an animated camera, and
//! listener registration. Backends report user input as `MapEvent`s, and
//! only for listeners that are still attached.

use crate::{
    config::{MapConfig, PopupConfig},
    types::{LatLng, Millis},
};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// What a listener is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenTarget {
    Map,
    Popup,
    Marker(MarkerHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenKind {
    Click,
    MouseEnter,
    MouseLeave,
    /// The popup's own close control.
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

/// User input delivered by a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// A marker was clicked. Marker clicks never also count as map clicks.
    MarkerClick { marker: MarkerHandle, at: LatLng },
    MarkerEnter { marker: MarkerHandle },
    MarkerLeave { marker: MarkerHandle },
    /// A click on the map that hit no marker.
    MapClick { at: LatLng },
    /// The popup's close control was pressed.
    PopupClose,
}

/// Everything a backend needs to build the map.
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub access_token: String,
    pub style: String,
    pub center: LatLng,
    pub zoom: f64,
    pub popup: PopupConfig,
}

impl MapOptions {
    /// `None` when the config carries no usable access token.
    pub fn from_config(config: &MapConfig) -> Option<Self> {
        let token = config.access_token.as_deref().map(str::trim).unwrap_or("");
        if token.is_empty() {
            return None;
        }
        Some(Self {
            access_token: token.to_string(),
            style: config.style.clone(),
            center: LatLng::from_lng_lat(config.center),
            zoom: config.zoom,
            popup: config.popup.clone(),
        })
    }
}

/// The operations the view needs from a mapping backend.
pub trait MapSurface {
    fn add_marker(&mut self, at: LatLng) -> MarkerHandle;
    fn set_marker_position(&mut self, marker: MarkerHandle, at: LatLng);
    fn remove_marker(&mut self, marker: MarkerHandle);

    fn listen(&mut self, target: ListenTarget, kind: ListenKind) -> ListenerId;
    fn unlisten(&mut self, listener: ListenerId);

    /// Show the singleton popup at `at` with `html`, opening it if closed.
    fn open_popup(&mut self, at: LatLng, html: &str);
    /// Move and rewrite the popup in place without closing it.
    fn update_popup(&mut self, at: LatLng, html: &str);
    fn close_popup(&mut self);
    fn is_popup_open(&self) -> bool;

    fn ease_to(&mut self, center: LatLng, duration: Millis);
    fn set_cursor(&mut self, cursor: Cursor);

    /// Tear the map down. No events are delivered afterwards.
    fn remove(&mut self);
}

/// Counters a `HeadlessMap` keeps for every operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub markers_added: usize,
    pub marker_moves: usize,
    pub markers_removed: usize,
    pub popup_opens: usize,
    pub popup_updates: usize,
    pub popup_closes: usize,
    pub eases: usize,
    pub listeners_attached: usize,
    pub listeners_detached: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupView {
    pub at: LatLng,
    pub html: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMove {
    pub center: LatLng,
    pub duration: Millis,
}

/// In-memory backend. Records what the view asked for and synthesises
/// input events for attached listeners.
#[derive(Debug)]
pub struct HeadlessMap {
    options: MapOptions,
    next_marker: u64,
    next_listener: u64,
    markers: HashMap<MarkerHandle, LatLng>,
    listeners: HashMap<ListenerId, (ListenTarget, ListenKind)>,
    popup: Option<PopupView>,
    camera: LatLng,
    last_ease: Option<CameraMove>,
    cursor: Cursor,
    removed: bool,
    stats: SurfaceStats,
}

impl HeadlessMap {
    pub fn new(options: &MapOptions) -> Self {
        log::debug!(
            "headless map: style={} center=({:.4}, {:.4}) zoom={}",
            options.style,
            options.center.lat,
            options.center.lng,
            options.zoom
        );
        Self {
            camera: options.center,
            options: options.clone(),
            next_marker: 0,
            next_listener: 0,
            markers: HashMap::new(),
            listeners: HashMap::new(),
            popup: None,
            last_ease: None,
            cursor: Cursor::Default,
            removed: false,
            stats: SurfaceStats::default(),
        }
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn stats(&self) -> &SurfaceStats {
        &self.stats
    }

    pub fn marker_position(&self, marker: MarkerHandle) -> Option<LatLng> {
        self.markers.get(&marker).copied()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn popup(&self) -> Option<&PopupView> {
        self.popup.as_ref()
    }

    pub fn camera(&self) -> LatLng {
        self.camera
    }

    pub fn last_ease(&self) -> Option<CameraMove> {
        self.last_ease
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ── Input synthesis ────────────────────────────────────────
    // Each returns the event only if a matching listener is attached.

    pub fn click_marker(&self, marker: MarkerHandle) -> Option<MapEvent> {
        let at = self.marker_position(marker)?;
        self.click_marker_at(marker, at)
    }

    /// Click a marker at an explicit coordinate, e.g. on a wrapped world copy.
    pub fn click_marker_at(&self, marker: MarkerHandle, at: LatLng) -> Option<MapEvent> {
        self.heard(ListenTarget::Marker(marker), ListenKind::Click)
            .then_some(MapEvent::MarkerClick { marker, at })
    }

    pub fn hover_marker(&self, marker: MarkerHandle) -> Option<MapEvent> {
        self.heard(ListenTarget::Marker(marker), ListenKind::MouseEnter)
            .then_some(MapEvent::MarkerEnter { marker })
    }

    pub fn leave_marker(&self, marker: MarkerHandle) -> Option<MapEvent> {
        self.heard(ListenTarget::Marker(marker), ListenKind::MouseLeave)
            .then_some(MapEvent::MarkerLeave { marker })
    }

    pub fn click_map(&self, at: LatLng) -> Option<MapEvent> {
        self.heard(ListenTarget::Map, ListenKind::Click)
            .then_some(MapEvent::MapClick { at })
    }

    /// Press the popup's close control. The popup closes whether or not
    /// anyone listens; the event is returned only to listeners.
    pub fn press_popup_close(&mut self) -> Option<MapEvent> {
        if self.removed || self.popup.is_none() || !self.options.popup.close_button {
            return None;
        }
        self.popup = None;
        self.stats.popup_closes += 1;
        self.heard(ListenTarget::Popup, ListenKind::Close)
            .then_some(MapEvent::PopupClose)
    }

    fn heard(&self, target: ListenTarget, kind: ListenKind) -> bool {
        !self.removed
            && self
                .listeners
                .values()
                .any(|(t, k)| *t == target && *k == kind)
    }

    fn attached_targets(&self) -> HashSet<ListenTarget> {
        self.listeners.values().map(|(t, _)| *t).collect()
    }
}

impl MapSurface for HeadlessMap {
    fn add_marker(&mut self, at: LatLng) -> MarkerHandle {
        let handle = MarkerHandle(self.next_marker);
        self.next_marker += 1;
        self.markers.insert(handle, at);
        self.stats.markers_added += 1;
        handle
    }

    fn set_marker_position(&mut self, marker: MarkerHandle, at: LatLng) {
        if let Some(pos) = self.markers.get_mut(&marker) {
            *pos = at;
            self.stats.marker_moves += 1;
        }
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        if self.markers.remove(&marker).is_some() {
            self.stats.markers_removed += 1;
        }
    }

    fn listen(&mut self, target: ListenTarget, kind: ListenKind) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, (target, kind));
        self.stats.listeners_attached += 1;
        id
    }

    fn unlisten(&mut self, listener: ListenerId) {
        if self.listeners.remove(&listener).is_some() {
            self.stats.listeners_detached += 1;
        }
    }

    fn open_popup(&mut self, at: LatLng, html: &str) {
        self.popup = Some(PopupView {
            at,
            html: html.to_string(),
        });
        self.stats.popup_opens += 1;
    }

    fn update_popup(&mut self, at: LatLng, html: &str) {
        if let Some(popup) = self.popup.as_mut() {
            popup.at = at;
            popup.html = html.to_string();
            self.stats.popup_updates += 1;
        }
    }

    fn close_popup(&mut self) {
        if self.popup.take().is_some() {
            self.stats.popup_closes += 1;
        }
    }

    fn is_popup_open(&self) -> bool {
        self.popup.is_some()
    }

    fn ease_to(&mut self, center: LatLng, duration: Millis) {
        // No animation frames here; land on the target immediately.
        self.camera = center;
        self.last_ease = Some(CameraMove { center, duration });
        self.stats.eases += 1;
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        let stray = self.attached_targets().len();
        if stray > 0 {
            log::warn!("headless map: removed with listeners still on {stray} targets");
        }
        self.listeners.clear();
        self.markers.clear();
        self.popup = None;
        self.removed = true;
    }
}
