//! The simulation feed. Generates the population once, then emits it on a
//! fixed cadence.
//!
//! LIFECYCLE (one activation per instance, no restart):
//!   Idle ──activate()──▶ Running ──deactivate()──▶ Stopped
//!
//! On activation two timers are armed together: a one-shot snapshot after
//! `snapshot_delay_ms` and a repeating update every `update_interval_ms`.
//! Both are cleared together on deactivation.
//!
//! RULES:
//!   - Exactly one Snapshot precedes every Update.
//!   - Every emission goes to the callback in the slot at emission time.
//!   - Nothing is emitted outside `Running`.

use crate::{
    clock::{TimerId, TimerQueue},
    config::SimulationConfig,
    entity::Entity,
    event::{FeedKind, FeedMessage},
    generator::{self, GeneratorConfig},
    latest::Latest,
    motion,
    profile::{CuratedProfiles, ProfileSource},
    rng::{RandomSource, RngBank, StreamSlot},
};

pub type MessageCallback = Box<dyn FnMut(&FeedMessage)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Running,
    Stopped,
}

pub struct SimulationFeed {
    config: SimulationConfig,
    state: FeedState,
    population: Vec<Entity>,
    generator_rng: Box<dyn RandomSource>,
    motion_rng: Box<dyn RandomSource>,
    profiles: Box<dyn ProfileSource>,
    snapshot_timer: Option<TimerId>,
    update_timer: Option<TimerId>,
    snapshot_sent: bool,
    ticks: u64,
    on_message: Latest<Option<MessageCallback>>,
}

impl SimulationFeed {
    pub fn new(config: SimulationConfig, rng_bank: &RngBank) -> Self {
        Self::with_sources(
            config,
            Box::new(rng_bank.for_stream(StreamSlot::Generator)),
            Box::new(rng_bank.for_stream(StreamSlot::Motion)),
            Box::new(CuratedProfiles),
        )
    }

    /// Build a feed over explicit random sources. Tests use this to pin
    /// generation and motion to known values.
    pub fn with_sources(
        config: SimulationConfig,
        generator_rng: Box<dyn RandomSource>,
        motion_rng: Box<dyn RandomSource>,
        profiles: Box<dyn ProfileSource>,
    ) -> Self {
        Self {
            config,
            state: FeedState::Idle,
            population: Vec::new(),
            generator_rng,
            motion_rng,
            profiles,
            snapshot_timer: None,
            update_timer: None,
            snapshot_sent: false,
            ticks: 0,
            on_message: Latest::new(None),
        }
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    /// Number of updates emitted so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The last population generated or stepped. Private to the feed until
    /// emitted; exposed read-only for tooling.
    pub fn population(&self) -> &[Entity] {
        &self.population
    }

    /// Replace the consumer. Takes effect from the next emission, with no
    /// effect on the timers.
    pub fn set_on_message(&self, callback: impl FnMut(&FeedMessage) + 'static) {
        self.on_message.set(Some(Box::new(callback)));
    }

    /// The shared callback slot. A UI layer can keep a clone and swap the
    /// callback on every render without touching the feed.
    pub fn callback_slot(&self) -> Latest<Option<MessageCallback>> {
        self.on_message.clone()
    }

    /// Generate the population and arm both timers. Only valid from `Idle`;
    /// any other call is a no-op.
    pub fn activate(&mut self, timers: &mut TimerQueue) {
        if self.state != FeedState::Idle {
            log::debug!("feed: activate() ignored in state {:?}", self.state);
            return;
        }

        let generator_config = GeneratorConfig::from(&self.config);
        self.population = generator::generate(
            self.config.entity_count,
            self.config.center,
            &generator_config,
            self.generator_rng.as_mut(),
            self.profiles.as_mut(),
        );
        self.snapshot_timer = Some(timers.set_timeout(self.config.snapshot_delay_ms));
        self.update_timer = timers.set_interval(self.config.update_interval_ms);
        if self.update_timer.is_none() {
            log::warn!("feed: update_interval_ms is 0, only the snapshot will be emitted");
        }
        self.state = FeedState::Running;

        log::info!(
            "feed: running with {} entities (snapshot in {}ms, update every {}ms)",
            self.population.len(),
            self.config.snapshot_delay_ms,
            self.config.update_interval_ms
        );
    }

    /// Clear both timers and stop for good.
    pub fn deactivate(&mut self, timers: &mut TimerQueue) {
        if let Some(id) = self.snapshot_timer.take() {
            timers.clear(id);
        }
        if let Some(id) = self.update_timer.take() {
            timers.clear(id);
        }
        if self.state != FeedState::Stopped {
            log::info!("feed: stopped after {} updates", self.ticks);
        }
        self.state = FeedState::Stopped;
    }

    /// Dispatch a fired timer. Returns the kind emitted, if any.
    /// Ids that do not belong to this feed are ignored.
    pub fn on_timer(&mut self, id: TimerId) -> Option<FeedKind> {
        if self.state != FeedState::Running {
            return None;
        }

        if self.snapshot_timer == Some(id) {
            self.snapshot_timer = None;
            self.snapshot_sent = true;
            self.emit(FeedKind::Snapshot);
            return Some(FeedKind::Snapshot);
        }

        if self.update_timer == Some(id) {
            if !self.snapshot_sent {
                // An update never overtakes the snapshot; hold this tick.
                log::debug!("feed: update held until snapshot is delivered");
                return None;
            }
            self.population = motion::step_all(
                &self.population,
                self.motion_rng.as_mut(),
                self.config.base_movement_factor,
            );
            self.ticks += 1;
            self.emit(FeedKind::Update);
            return Some(FeedKind::Update);
        }

        None
    }

    fn emit(&mut self, kind: FeedKind) {
        let message = FeedMessage {
            kind,
            population: self.population.clone(),
        };

        // Take the callback out for the call so it may install a successor.
        let callback = self.on_message.with_mut(Option::take);
        match callback {
            Some(mut callback) => {
                callback(&message);
                self.on_message.with_mut(|slot| {
                    if slot.is_none() {
                        *slot = Some(callback);
                    }
                });
            }
            None => log::debug!("feed: {} dropped, no consumer", kind.name()),
        }
    }
}
