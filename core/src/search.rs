//! Search/select panel: filter the population, pick or drop the followed
//! entity, and the text the panel shows.
//!
//! The panel owns only its query. Population and selection are read from
//! `SharedState` on every call.

use crate::{
    entity::Entity,
    state::SharedState,
    types::EntityId,
};
use serde::Serialize;

/// What sits at the top of the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Header {
    /// Shown while a present entity is followed.
    Unfollow { name: String },
    Search { query: String },
}

impl Header {
    pub fn label(&self) -> String {
        match self {
            Header::Unfollow { name } => format!("Unfollow {name}"),
            Header::Search { .. } => "Search by Name or ID".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub id: EntityId,
    pub name: String,
    pub short_id: String,
    pub avatar: String,
    pub followed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SearchPanel {
    query: String,
}

impl SearchPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Entities whose name or id contains the query, ignoring case. The
    /// whole population while following or with an empty query.
    pub fn results(&self, state: &SharedState) -> Vec<Entity> {
        if state.is_following() || self.query.is_empty() {
            return state.population();
        }
        let needle = self.query.to_lowercase();
        state.with_population(|population| {
            population
                .iter()
                .filter(|e| {
                    e.display_name.to_lowercase().contains(&needle)
                        || e.id.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect()
        })
    }

    /// A list item was clicked: follow it, or unfollow it if it is the
    /// current selection. Starting a new follow clears the query.
    pub fn click_entity(&mut self, state: &SharedState, id: &str) -> Option<EntityId> {
        let next = state.toggle_followed(id);
        if next.is_some() {
            self.query.clear();
        }
        next
    }

    pub fn unfollow(&self, state: &SharedState) {
        state.set_followed(None);
    }

    pub fn header(&self, state: &SharedState) -> Header {
        match state.followed_entity() {
            Some(entity) => Header::Unfollow {
                name: entity.display_name,
            },
            None => Header::Search {
                query: self.query.clone(),
            },
        }
    }

    /// Only when there is a query, nothing matches, and nothing is followed.
    pub fn empty_message(&self, state: &SharedState) -> Option<String> {
        let show = !self.query.is_empty()
            && !state.is_following()
            && self.results(state).is_empty();
        show.then(|| format!("No users found for \"{}\".", self.query))
    }

    pub fn items(&self, state: &SharedState) -> Vec<ListItem> {
        let followed = state.followed_id();
        self.results(state)
            .into_iter()
            .map(|e| ListItem {
                followed: followed.as_deref() == Some(e.id.as_str()),
                short_id: format!("{}...", e.truncated_id()),
                name: e.display_name,
                avatar: e.avatar_ref,
                id: e.id,
            })
            .collect()
    }

    pub fn total_label(&self, state: &SharedState) -> String {
        format!("Total users: {}", state.total_count())
    }
}
