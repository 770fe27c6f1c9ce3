use crate::{entity::Entity, rng::RandomSource};

/// Advance one entity by one tick.
///
/// Travel for the tick is `base_factor * speed_class`; latitude and
/// longitude each move by an independent uniform draw in
/// `[-travel/2, travel/2)`. Coordinates are left unbounded.
pub fn step(entity: &Entity, rng: &mut dyn RandomSource, base_factor: f64) -> Entity {
    let travel = base_factor * f64::from(entity.speed_class);
    let lat_delta = rng.centered(travel);
    let lng_delta = rng.centered(travel);

    Entity {
        latitude: entity.latitude + lat_delta,
        longitude: entity.longitude + lng_delta,
        ..entity.clone()
    }
}

/// Apply `step` to every member, preserving order.
pub fn step_all(population: &[Entity], rng: &mut dyn RandomSource, base_factor: f64) -> Vec<Entity> {
    population
        .iter()
        .map(|entity| step(entity, rng, base_factor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StreamSlot};

    const FACTOR: f64 = 0.00009;

    struct Fixed(f64);

    impl RandomSource for Fixed {
        fn next_f64(&mut self) -> f64 {
            self.0
        }
    }

    fn walker(speed_class: u32) -> Entity {
        Entity {
            id: "4".into(),
            display_name: "Gita Halim".into(),
            avatar_ref: "https://avatars.githubusercontent.com/u/4".into(),
            latitude: -6.2,
            longitude: 106.8,
            speed_class,
        }
    }

    #[test]
    fn step_is_repeatable_with_same_source() {
        let start = walker(60);
        let a = step(&start, &mut Fixed(0.9), FACTOR);
        let b = step(&start, &mut Fixed(0.9), FACTOR);
        assert_eq!(a, b);
    }

    #[test]
    fn step_leaves_input_untouched() {
        let start = walker(60);
        let before = start.clone();
        let next = step(&start, &mut Fixed(1.0 - f64::EPSILON), FACTOR);

        assert_eq!(start, before);
        assert_ne!(next.latitude, start.latitude);
        assert_eq!(next.id, start.id);
        assert_eq!(next.display_name, start.display_name);
        assert_eq!(next.avatar_ref, start.avatar_ref);
        assert_eq!(next.speed_class, start.speed_class);
    }

    #[test]
    fn displacement_is_bounded_by_half_travel() {
        let start = walker(70);
        let half = FACTOR * 70.0 / 2.0;
        let mut rng = RngBank::new(5).for_stream(StreamSlot::Motion);
        for _ in 0..500 {
            let next = step(&start, &mut rng, FACTOR);
            assert!((next.latitude - start.latitude).abs() <= half + 1e-15);
            assert!((next.longitude - start.longitude).abs() <= half + 1e-15);
        }
    }

    #[test]
    fn midpoint_source_does_not_move() {
        let start = walker(15);
        assert_eq!(step(&start, &mut Fixed(0.5), FACTOR), start);
    }

    #[test]
    fn step_all_keeps_order_and_ids() {
        let population = vec![walker(5), Entity { id: "9".into(), ..walker(50) }];
        let mut rng = RngBank::new(11).for_stream(StreamSlot::Motion);
        let next = step_all(&population, &mut rng, FACTOR);
        let ids: Vec<&str> = next.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["4", "9"]);
    }
}
