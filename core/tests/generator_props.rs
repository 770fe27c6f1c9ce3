//! Property tests for population generation and motion.

use livemap_core::{
    config::{SimulationConfig, SpeedRange},
    generator::{self, GeneratorConfig},
    motion,
    profile::CuratedProfiles,
    rng::SimRng,
    types::LatLng,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn config() -> GeneratorConfig {
    GeneratorConfig::from(&SimulationConfig::default())
}

proptest! {
    #[test]
    fn generates_exactly_count_distinct_ids(count in 0usize..300, seed in any::<u64>()) {
        let mut rng = SimRng::new(seed, 0);
        let population = generator::generate(
            count,
            LatLng::new(-6.2, 106.8),
            &config(),
            &mut rng,
            &mut CuratedProfiles,
        );

        prop_assert_eq!(population.len(), count);
        let ids: HashSet<&str> = population.iter().map(|e| e.id.as_str()).collect();
        prop_assert_eq!(ids.len(), count);
    }

    #[test]
    fn spawns_inside_the_jitter_square(
        seed in any::<u64>(),
        lat in -80.0f64..80.0,
        lng in -179.0f64..179.0,
    ) {
        let mut rng = SimRng::new(seed, 0);
        let cfg = config();
        let population = generator::generate(50, LatLng::new(lat, lng), &cfg, &mut rng, &mut CuratedProfiles);

        for e in &population {
            prop_assert!((e.latitude - lat).abs() <= cfg.jitter_radius + 1e-9);
            prop_assert!((e.longitude - lng).abs() <= cfg.jitter_radius + 1e-9);
            let range = cfg.speed_range_for(e.id.parse::<usize>().unwrap());
            prop_assert!(range.contains(e.speed_class));
        }
    }

    #[test]
    fn parity_picks_the_speed_band(seed in any::<u64>()) {
        let mut rng = SimRng::new(seed, 0);
        let population = generator::generate(40, LatLng::new(0.0, 0.0), &config(), &mut rng, &mut CuratedProfiles);
        for (i, e) in population.iter().enumerate() {
            let expected = if (i + 1) % 2 == 0 { SpeedRange::FAST } else { SpeedRange::SLOW };
            prop_assert!(expected.contains(e.speed_class), "{} has speed {}", e.id, e.speed_class);
        }
    }

    #[test]
    fn a_step_moves_at_most_half_the_travel(seed in any::<u64>(), factor in 0.0f64..0.01) {
        let mut rng = SimRng::new(seed, 1);
        let population = generator::generate(20, LatLng::new(0.0, 0.0), &config(), &mut rng, &mut CuratedProfiles);
        let stepped = motion::step_all(&population, &mut rng, factor);

        prop_assert_eq!(stepped.len(), population.len());
        for (before, after) in population.iter().zip(&stepped) {
            prop_assert_eq!(&before.id, &after.id);
            prop_assert_eq!(before.speed_class, after.speed_class);
            let half = factor * f64::from(before.speed_class) / 2.0;
            prop_assert!((after.latitude - before.latitude).abs() <= half + 1e-12);
            prop_assert!((after.longitude - before.longitude).abs() <= half + 1e-12);
        }
    }
}
