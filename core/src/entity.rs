use crate::types::{EntityId, LatLng};
use serde::{Deserialize, Serialize};

/// Number of id characters shown in compact labels.
pub const SHORT_ID_LEN: usize = 8;

/// A tracked moving point.
///
/// `id`, `display_name`, `avatar_ref` and `speed_class` are fixed at
/// generation time. Only the coordinates change between ticks, and they are
/// never clamped or wrapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub display_name: String,
    pub avatar_ref: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_class: u32,
}

impl Entity {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// First `SHORT_ID_LEN` characters of the id.
    pub fn truncated_id(&self) -> &str {
        match self.id.char_indices().nth(SHORT_ID_LEN) {
            Some((cut, _)) => &self.id[..cut],
            None => &self.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str) -> Entity {
        Entity {
            id: id.into(),
            display_name: "Dewi Lubis".into(),
            avatar_ref: "a".into(),
            latitude: 1.5,
            longitude: -2.5,
            speed_class: 10,
        }
    }

    #[test]
    fn short_ids_are_kept_whole() {
        assert_eq!(entity("42").truncated_id(), "42");
        assert_eq!(entity("12345678").truncated_id(), "12345678");
    }

    #[test]
    fn long_ids_are_cut_at_eight_chars() {
        assert_eq!(entity("123456789abc").truncated_id(), "12345678");
    }

    #[test]
    fn position_reads_both_coordinates() {
        assert_eq!(entity("1").position(), LatLng::new(1.5, -2.5));
    }
}
