//! Initial population generation.
//!
//! Entity `n` (1-based) gets id `"n"`. The parity of `n` picks its speed
//! range: even ordinals move fast, odd ordinals move slowly.

use crate::{
    config::{SimulationConfig, SpeedRange},
    entity::Entity,
    profile::ProfileSource,
    rng::RandomSource,
    types::LatLng,
};

/// The parts of `SimulationConfig` generation depends on.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
    pub jitter_radius: f64,
    pub slow_speed: SpeedRange,
    pub fast_speed: SpeedRange,
}

impl From<&SimulationConfig> for GeneratorConfig {
    fn from(sim: &SimulationConfig) -> Self {
        Self {
            jitter_radius: sim.jitter_radius,
            slow_speed: sim.slow_speed,
            fast_speed: sim.fast_speed,
        }
    }
}

impl GeneratorConfig {
    pub fn speed_range_for(&self, ordinal: usize) -> SpeedRange {
        if ordinal % 2 == 0 {
            self.fast_speed
        } else {
            self.slow_speed
        }
    }
}

/// Generate exactly `count` entities scattered around `center`.
///
/// Per entity the random draws happen in a fixed order (lat, lng, name,
/// avatar, speed) so a given source always yields the same population.
pub fn generate(
    count: usize,
    center: LatLng,
    config: &GeneratorConfig,
    rng: &mut dyn RandomSource,
    profiles: &mut dyn ProfileSource,
) -> Vec<Entity> {
    let span = config.jitter_radius * 2.0;
    let mut population = Vec::with_capacity(count);

    for ordinal in 1..=count {
        let latitude = center.lat + rng.centered(span);
        let longitude = center.lng + rng.centered(span);
        let display_name = profiles.full_name(rng);
        let avatar_ref = profiles.avatar_ref(rng);
        let range = config.speed_range_for(ordinal);
        let speed_class = rng.int_in_range(range.min, range.max);

        population.push(Entity {
            id: ordinal.to_string(),
            display_name,
            avatar_ref,
            latitude,
            longitude,
            speed_class,
        });
    }

    log::debug!("generator: {count} entities around ({:.4}, {:.4})", center.lat, center.lng);
    population
}
