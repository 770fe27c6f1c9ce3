//! Shared primitive types used across the entire viewer.

use serde::{Deserialize, Serialize};

/// A stable, unique identifier for a tracked entity.
pub type EntityId = String;

/// Virtual milliseconds on the page clock.
pub type Millis = u64;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `[lng, lat]`, the ordering map backends expect.
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    pub fn from_lng_lat([lng, lat]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}
