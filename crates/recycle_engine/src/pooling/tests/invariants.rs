//! Randomized operation sequences checked against the pool invariants
//!
//! Every step of a seeded random mix of acquire, release, grow, update,
//! release-all and pool clears must leave each pool structurally consistent.

use crate::foundation::math::Vec3;
use crate::pooling::{
    ArchetypeDescriptor, InstanceHandle, LifecycleFacet, Placement, PoolError, PoolRegistry,
    PrototypeRef,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::rc::Rc;

#[cfg(test)]
mod tests {
    use super::*;

    fn prototype() -> PrototypeRef {
        Rc::new(Vec::<Box<dyn LifecycleFacet>>::new)
    }

    fn registry() -> PoolRegistry {
        let mut registry = PoolRegistry::new();
        let descriptors = [
            ArchetypeDescriptor::new("Bolt", prototype())
                .with_initial_count(4)
                .with_capacity_ceiling(32),
            ArchetypeDescriptor::new("Spark", prototype())
                .with_initial_count(2)
                .with_auto_release(0.3),
            ArchetypeDescriptor::new("Shield", prototype())
                .with_initial_count(3)
                .with_capacity_ceiling(3)
                .with_auto_expand(false),
        ];
        for descriptor in descriptors {
            registry.create_pool(descriptor).unwrap();
        }
        registry
    }

    fn assert_consistent(registry: &PoolRegistry, step: usize) {
        for name in ["Bolt", "Spark", "Shield"] {
            let pool = registry.pool(name).unwrap();
            if let Err(violation) = pool.check_invariants() {
                panic!("step {step}: pool '{name}' broke an invariant: {violation}");
            }
        }
    }

    fn run_sequence(seed: u64, steps: usize) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut registry = registry();
        let mut held: Vec<InstanceHandle> = Vec::new();
        let names = ["Bolt", "Spark", "Shield", "Missing"];

        for step in 0..steps {
            match rng.gen_range(0..100) {
                0..=44 => {
                    let name = names[rng.gen_range(0..names.len())];
                    let position = Vec3::new(rng.gen_range(-10.0..10.0), 0.0, rng.gen_range(-10.0..10.0));
                    match registry.acquire(name, Placement::at(position)) {
                        Ok(handle) => held.push(handle),
                        Err(PoolError::PoolExhausted { .. } | PoolError::UnknownArchetype { .. }) => {}
                        Err(other) => panic!("step {step}: unexpected acquire error {other}"),
                    }
                }
                45..=79 if !held.is_empty() => {
                    let handle = held.swap_remove(rng.gen_range(0..held.len()));
                    let before = registry.stats(handle.archetype());
                    match registry.release(&handle) {
                        Ok(()) => {}
                        // Auto-released or cleared behind our back; nothing may change
                        Err(PoolError::NotOwned { .. }) => {
                            assert_eq!(registry.stats(handle.archetype()), before);
                        }
                        Err(other) => panic!("step {step}: unexpected release error {other}"),
                    }
                }
                80..=89 => {
                    registry.update(rng.gen_range(0.0..0.2));
                }
                90..=94 => {
                    let name = names[rng.gen_range(0..3)];
                    if let Some(pool) = registry.pool_mut(name) {
                        pool.grow(rng.gen_range(0..4));
                    }
                }
                95..=97 => {
                    registry.release_all();
                }
                98..=99 => {
                    let name = names[rng.gen_range(0..3)];
                    if let Some(pool) = registry.pool_mut(name) {
                        pool.clear();
                    }
                }
                _ => {}
            }
            assert_consistent(&registry, step);
        }
    }

    #[test]
    fn test_random_sequences_preserve_invariants() {
        for seed in 0..16 {
            run_sequence(seed, 400);
        }
    }

    #[test]
    fn test_held_handles_stay_valid_until_released() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut registry = registry();
        let mut held = Vec::new();

        for _ in 0..30 {
            if let Ok(handle) = registry.acquire("Bolt", Placement::default()) {
                held.push(handle);
            }
            if rng.gen_bool(0.3) && !held.is_empty() {
                let handle = held.swap_remove(0);
                registry.release(&handle).unwrap();
            }
        }

        let pool = registry.pool("Bolt").unwrap();
        assert_eq!(pool.active_count(), held.len());
        assert!(held.iter().all(|handle| pool.owns(handle)));
        assert!(pool.total_created() <= 32);
    }
}
