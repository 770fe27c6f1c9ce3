//! livemap-core: simulated population, follow-mode map synchronisation and
//! the search panel of the live map viewer.
//!
//! Data flow: generator → feed (timers) → map view → shared state ← search.

pub mod app;
pub mod clock;
pub mod command_port;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod feed;
pub mod generator;
pub mod latest;
pub mod map_view;
pub mod motion;
pub mod popup;
pub mod profile;
pub mod rng;
pub mod search;
pub mod state;
pub mod surface;
pub mod types;

pub use app::LiveMapApp;
pub use config::ViewerConfig;
pub use entity::Entity;
pub use error::{ViewerError, ViewerResult};
pub use map_view::{Activation, MapView};
pub use surface::{HeadlessMap, MapSurface};
