//! Shared selection/population state. The single writer-of-record for the
//! current population and the followed entity.
//!
//! RULE: Nothing outside this module mutates the population or the
//! selection. Writes complete (including the paired selection check) before
//! any subscriber runs, so no observer sees a half-applied update.

use crate::{entity::Entity, types::EntityId};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// The population was replaced. `selection_reset` is true when the
    /// followed id vanished and the selection was cleared in the same write.
    Population { selection_reset: bool },
    Selection { followed: Option<EntityId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<dyn Fn(&StateChange)>;

#[derive(Default)]
struct StateInner {
    population: Vec<Entity>,
    followed_id: Option<EntityId>,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener)>,
}

/// Cheap-to-clone handle; every clone addresses the same state.
#[derive(Clone, Default)]
pub struct SharedState {
    inner: Rc<RefCell<StateInner>>,
    listeners: Rc<RefCell<Listeners>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Population ─────────────────────────────────────────────

    pub fn population(&self) -> Vec<Entity> {
        self.inner.borrow().population.clone()
    }

    pub fn with_population<R>(&self, f: impl FnOnce(&[Entity]) -> R) -> R {
        f(&self.inner.borrow().population)
    }

    pub fn entity(&self, id: &str) -> Option<Entity> {
        self.inner
            .borrow()
            .population
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    /// Replace the whole population. A followed id that was present and is
    /// missing from the new population is cleared in the same write. An id
    /// that has not appeared yet stays selected.
    pub fn replace_population(&self, population: Vec<Entity>) {
        let selection_reset = {
            let mut inner = self.inner.borrow_mut();
            let missing = match inner.followed_id.as_deref() {
                Some(id) => {
                    inner.population.iter().any(|e| e.id == id)
                        && !population.iter().any(|e| e.id == id)
                }
                None => false,
            };
            inner.population = population;
            if missing {
                log::debug!(
                    "state: followed id {:?} left the population, clearing selection",
                    inner.followed_id
                );
                inner.followed_id = None;
            }
            missing
        };
        self.notify(&StateChange::Population { selection_reset });
    }

    pub fn total_count(&self) -> usize {
        self.inner.borrow().population.len()
    }

    // ── Selection ──────────────────────────────────────────────

    pub fn followed_id(&self) -> Option<EntityId> {
        self.inner.borrow().followed_id.clone()
    }

    /// Set or clear the followed id. An id not yet in the population is
    /// accepted; the next population containing it is followed immediately.
    pub fn set_followed(&self, followed: Option<EntityId>) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.followed_id == followed {
                return;
            }
            inner.followed_id = followed.clone();
        }
        log::debug!("state: followed -> {followed:?}");
        self.notify(&StateChange::Selection { followed });
    }

    /// Follow `id`, or unfollow it if it is already followed.
    /// Returns the new selection.
    pub fn toggle_followed(&self, id: &str) -> Option<EntityId> {
        let next = match self.followed_id() {
            Some(current) if current == id => None,
            _ => Some(id.to_string()),
        };
        self.set_followed(next.clone());
        next
    }

    // ── Derived ────────────────────────────────────────────────

    pub fn is_following(&self) -> bool {
        self.inner.borrow().followed_id.is_some()
    }

    /// The followed entity, if one is selected and present.
    pub fn followed_entity(&self) -> Option<Entity> {
        let inner = self.inner.borrow();
        let id = inner.followed_id.as_deref()?;
        inner.population.iter().find(|e| e.id == id).cloned()
    }

    // ── Subscriptions ──────────────────────────────────────────

    pub fn subscribe(&self, listener: impl Fn(&StateChange) + 'static) -> SubscriptionId {
        let mut listeners = self.listeners.borrow_mut();
        let id = SubscriptionId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.entries.len();
        listeners.entries.retain(|(sid, _)| *sid != id);
        listeners.entries.len() != before
    }

    fn notify(&self, change: &StateChange) {
        // Snapshot the list so listeners may read state or (un)subscribe.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            (*listener)(change);
        }
    }
}
