//! The live map page: feed, shared state, map view and search panel wired
//! together on one virtual clock.
//!
//! EXECUTION ORDER PER EMISSION (fixed):
//!   1. Timer fires; the feed steps the population (updates only).
//!   2. Feed hands the message to the current callback.
//!   3. Map view publishes the population to shared state.
//!   4. Map view moves or creates markers.
//!   5. Map view eases the camera and refreshes the popup.
//!
//! RULES:
//!   - Timers run one at a time, earliest first, on the caller's thread.
//!   - The search panel and the map view only ever talk through
//!     `SharedState`.
//!   - After `unmount()` nothing emits and no handler runs.

use crate::{
    clock::TimerQueue,
    config::ViewerConfig,
    feed::SimulationFeed,
    map_view::{Activation, MapView},
    rng::RngBank,
    search::SearchPanel,
    state::SharedState,
    surface::{HeadlessMap, MapEvent, MapOptions, MapSurface},
    types::{LatLng, Millis},
};

pub struct LiveMapApp<S: MapSurface + 'static> {
    config: ViewerConfig,
    timers: TimerQueue,
    feed: SimulationFeed,
    state: SharedState,
    view: MapView<S>,
    search: SearchPanel,
    mounted: bool,
}

impl<S: MapSurface + 'static> LiveMapApp<S> {
    pub fn new(config: ViewerConfig) -> Self {
        let rng_bank = RngBank::new(config.seed);
        let feed = SimulationFeed::new(config.simulation.clone(), &rng_bank);
        Self::with_feed(config, feed)
    }

    /// Build around a prepared feed, e.g. one over stubbed random sources.
    pub fn with_feed(config: ViewerConfig, feed: SimulationFeed) -> Self {
        let state = SharedState::new();
        let view = MapView::new(config.map.clone(), state.clone());
        Self {
            config,
            timers: TimerQueue::new(),
            feed,
            state,
            view,
            search: SearchPanel::new(),
            mounted: false,
        }
    }

    /// Create the map, route feed emissions into it and start the feed.
    pub fn mount(&mut self, create_surface: impl FnOnce(&MapOptions) -> S) -> Activation {
        if self.mounted {
            log::debug!("app: mount() while mounted, ignoring");
            return Activation::AlreadyActive;
        }
        self.mounted = true;

        let activation = self.view.activate(create_surface);
        let view = self.view.clone();
        self.feed.set_on_message(move |message| view.on_simulation_data(message));
        self.feed.activate(&mut self.timers);

        log::info!("app: mounted at t={}ms ({activation:?})", self.timers.now());
        activation
    }

    /// Stop the feed and tear the map down. Safe to call more than once.
    pub fn unmount(&mut self) {
        self.feed.deactivate(&mut self.timers);
        self.feed.callback_slot().set(None);
        self.view.teardown();
        if self.mounted {
            log::info!("app: unmounted at t={}ms", self.timers.now());
        }
        self.mounted = false;
    }

    /// Run virtual time forward by `ms`, firing every timer due on the way.
    /// Returns the number of emissions.
    pub fn advance(&mut self, ms: Millis) -> usize {
        let until = self.timers.now().saturating_add(ms);
        let mut emitted = 0;
        while let Some(id) = self.timers.next_due(until) {
            if let Some(kind) = self.feed.on_timer(id) {
                log::debug!("app: t={}ms {}", self.timers.now(), kind.name());
                emitted += 1;
            }
        }
        self.timers.advance_to(until);
        emitted
    }

    // ── Follow control ─────────────────────────────────────────

    pub fn follow(&self, id: &str) {
        self.view.follow(id);
    }

    pub fn unfollow(&self) {
        self.view.unfollow();
    }

    /// A click on a search result.
    pub fn select(&mut self, id: &str) {
        self.search.click_entity(&self.state, id);
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.search.set_query(query);
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn now(&self) -> Millis {
        self.timers.now()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn view(&self) -> &MapView<S> {
        &self.view
    }

    pub fn feed(&self) -> &SimulationFeed {
        &self.feed
    }

    pub fn search(&self) -> &SearchPanel {
        &self.search
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }
}

/// Input synthesis for the in-memory backend. Each returns false when the
/// input reached no listener.
impl LiveMapApp<HeadlessMap> {
    pub fn click_marker(&self, id: &str) -> bool {
        let Some(marker) = self.view.marker_for(id) else {
            return false;
        };
        self.deliver(|map| map.click_marker(marker))
    }

    pub fn click_background(&self, at: LatLng) -> bool {
        self.deliver(|map| map.click_map(at))
    }

    pub fn press_popup_close(&self) -> bool {
        self.deliver(|map| map.press_popup_close())
    }

    fn deliver(&self, input: impl FnOnce(&mut HeadlessMap) -> Option<MapEvent>) -> bool {
        match self.view.with_surface(input).flatten() {
            Some(event) => {
                self.view.handle_event(event);
                true
            }
            None => false,
        }
    }
}
