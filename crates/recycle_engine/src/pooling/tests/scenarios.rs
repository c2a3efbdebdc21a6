//! Acceptance flows for the pool registry and prewarm scheduler
//!
//! Each test walks one externally observable story: prewarmed creation, burst
//! acquisition with auto-expand, hard exhaustion, rejected releases and
//! time-sliced prewarming.

use crate::foundation::collections::InstanceKey;
use crate::foundation::logging;
use crate::foundation::math::Vec3;
use crate::pooling::{
    ArchetypeCatalog, ArchetypeDescriptor, ArchetypeRecord, InstanceHandle, LifecycleFacet,
    Placement, PoolError, PoolRegistry, PoolStamp, PoolStats, PrewarmScheduler, PrewarmStart,
    PrewarmTick, PrototypeRef,
};
use std::rc::Rc;

#[cfg(test)]
mod tests {
    use super::*;

    fn bolt_prototype() -> PrototypeRef {
        Rc::new(Vec::<Box<dyn LifecycleFacet>>::new)
    }

    fn occupancy(stats: PoolStats) -> (usize, usize, usize) {
        (stats.active, stats.available, stats.total_created)
    }

    /// Registry with "Bolt": 20 prewarmed, ceiling 40, auto-expand on
    fn bolt_registry() -> PoolRegistry {
        logging::init_for_tests();
        let mut registry = PoolRegistry::new();
        let registered = registry
            .create_pool(
                ArchetypeDescriptor::new("Bolt", bolt_prototype())
                    .with_initial_count(20)
                    .with_capacity_ceiling(40)
                    .with_auto_expand(true),
            )
            .expect("valid prototype");
        assert!(!registered.is_duplicate());
        registry
    }

    #[test]
    fn test_create_pool_prewarms_initial_count() {
        let registry = bolt_registry();

        let stats = registry.stats("Bolt").expect("Bolt is registered");
        assert_eq!(occupancy(stats), (0, 20, 20));
    }

    #[test]
    fn test_burst_beyond_prewarm_auto_expands_up_to_ceiling() {
        let mut registry = bolt_registry();
        let mut handles = Vec::new();

        for i in 0..20 {
            let placement = Placement::at(Vec3::new(i as f32, 0.0, 0.0));
            handles.push(registry.acquire("Bolt", placement).expect("prewarmed instance"));
        }
        assert_eq!(registry.stats("Bolt").unwrap().available, 0);

        handles.push(registry.acquire("Bolt", Placement::default()).expect("auto-expand"));
        let grown = registry.stats("Bolt").unwrap();
        assert!(grown.total_created > 20);
        assert!(grown.total_created <= 40);

        // Keep bursting until the ceiling stops growth
        loop {
            match registry.acquire("Bolt", Placement::default()) {
                Ok(handle) => handles.push(handle),
                Err(PoolError::PoolExhausted { total_created, capacity_ceiling, .. }) => {
                    assert_eq!(total_created, 40);
                    assert_eq!(capacity_ceiling, 40);
                    break;
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(handles.len(), 40);
        assert!(registry.pool("Bolt").unwrap().check_invariants().is_ok());
    }

    #[test]
    fn test_exhaustion_without_auto_expand_leaves_stats_untouched() {
        let mut registry = bolt_registry();
        registry
            .create_pool(
                ArchetypeDescriptor::new("Shield", bolt_prototype())
                    .with_initial_count(5)
                    .with_capacity_ceiling(5)
                    .with_auto_expand(false),
            )
            .unwrap();

        for _ in 0..5 {
            registry.acquire("Shield", Placement::default()).expect("within capacity");
        }
        let result = registry.acquire("Shield", Placement::default());

        assert!(matches!(result, Err(PoolError::PoolExhausted { .. })));
        assert!(result.unwrap_err().is_recoverable());
        assert_eq!(occupancy(registry.stats("Shield").unwrap()), (5, 0, 5));
    }

    #[test]
    fn test_release_of_garbage_handle_is_not_owned() {
        let mut registry = bolt_registry();
        let kept = registry.acquire("Bolt", Placement::default()).unwrap();
        let before = registry.stats("Bolt").unwrap();

        let garbage = InstanceHandle::new(Rc::from("Bolt"), PoolStamp::next(), InstanceKey::default());
        let result = registry.release(&garbage);

        assert!(matches!(result, Err(PoolError::NotOwned { .. })));
        assert_eq!(registry.stats("Bolt").unwrap(), before);
        assert!(registry.pool("Bolt").unwrap().owns(&kept));
    }

    #[test]
    fn test_release_of_handle_from_other_registry_is_not_owned() {
        let mut first = bolt_registry();
        let mut second = bolt_registry();
        let handle = first.acquire("Bolt", Placement::default()).unwrap();
        let before = second.stats("Bolt").unwrap();

        assert!(matches!(second.release(&handle), Err(PoolError::NotOwned { .. })));
        assert_eq!(second.stats("Bolt").unwrap(), before);
    }

    #[test]
    fn test_unknown_archetype_is_reported() {
        let mut registry = bolt_registry();

        let result = registry.acquire("Missile", Placement::default());
        assert_eq!(
            result.unwrap_err(),
            PoolError::UnknownArchetype { name: "Missile".to_string() }
        );
    }

    #[test]
    fn test_duplicate_registration_keeps_existing_pool() {
        let mut registry = bolt_registry();

        let registered = registry
            .create_pool(ArchetypeDescriptor::new("Bolt", bolt_prototype()).with_initial_count(3))
            .unwrap();
        assert!(registered.is_duplicate());
        assert_eq!(registered.pool().total_created(), 20);

        let strict = registry
            .create_pool(ArchetypeDescriptor::new("Bolt", bolt_prototype()))
            .unwrap()
            .into_result();
        assert!(matches!(strict, Err(PoolError::DuplicateArchetype { .. })));
    }

    #[test]
    fn test_prewarm_is_time_sliced_and_completes_once() {
        logging::init_for_tests();
        let mut registry = PoolRegistry::new();
        let mut scheduler = PrewarmScheduler::new();

        let mut bolt = ArchetypeRecord::new("Bolt", Some(bolt_prototype()));
        bolt.initial_count = 10;
        let mut spark = ArchetypeRecord::new("Spark", Some(bolt_prototype()));
        spark.initial_count = 8;
        let mut debris = ArchetypeRecord::new("Debris", Some(bolt_prototype()));
        debris.initial_count = 12;
        debris.capacity_ceiling = 5;
        let catalog = ArchetypeCatalog::new().with(bolt).with(spark).with(debris);

        let start = scheduler.start_catalog(&mut registry, &catalog, 5).unwrap();
        assert_eq!(start, PrewarmStart::Started { total: 23 });

        let mut last_progress = 0.0_f32;
        let mut completions = 0;
        let mut ticks = 0;
        loop {
            ticks += 1;
            match scheduler.step(&mut registry) {
                PrewarmTick::Progress(progress) => {
                    assert!(progress > last_progress, "progress must strictly increase");
                    assert!(progress < 1.0);
                    last_progress = progress;
                    for pool in ["Bolt", "Spark", "Debris"] {
                        assert!(registry.pool(pool).unwrap().check_invariants().is_ok());
                    }
                }
                PrewarmTick::Completed => completions += 1,
                PrewarmTick::Idle => break,
            }
            assert!(ticks <= 10, "prewarm did not finish");
        }

        assert_eq!(completions, 1);
        assert_eq!(ticks, 6);
        approx::assert_relative_eq!(last_progress, 20.0 / 23.0);
        assert_eq!(registry.stats("Bolt").unwrap().total_created, 10);
        assert_eq!(registry.stats("Spark").unwrap().total_created, 8);
        assert_eq!(registry.stats("Debris").unwrap().total_created, 5);
    }

    #[test]
    fn test_prewarm_of_satisfied_catalog_reports_completion_immediately() {
        let mut registry = bolt_registry();
        let mut scheduler = PrewarmScheduler::new();
        let mut bolt = ArchetypeRecord::new("Bolt", Some(bolt_prototype()));
        bolt.initial_count = 20;

        let start = scheduler
            .start_catalog(&mut registry, &ArchetypeCatalog::new().with(bolt), 5)
            .unwrap();

        assert_eq!(start, PrewarmStart::AlreadySatisfied);
        assert_eq!(scheduler.step(&mut registry), PrewarmTick::Idle);
    }

    #[test]
    fn test_acquire_during_prewarm_sees_partial_pool() {
        let mut registry = PoolRegistry::new();
        let mut scheduler = PrewarmScheduler::new();
        let mut bolt = ArchetypeRecord::new("Bolt", Some(bolt_prototype()));
        bolt.initial_count = 12;
        bolt.allow_auto_expand = false;
        scheduler
            .start_catalog(&mut registry, &ArchetypeCatalog::new().with(bolt), 4)
            .unwrap();

        scheduler.step(&mut registry);
        let handle = registry.acquire("Bolt", Placement::default()).unwrap();
        while scheduler.step(&mut registry) != PrewarmTick::Completed {}

        let stats = registry.stats("Bolt").unwrap();
        assert_eq!(occupancy(stats), (1, 11, 12));
        registry.release(&handle).unwrap();
    }

    #[test]
    fn test_auto_release_through_registry_update() {
        let mut registry = PoolRegistry::new();
        registry
            .create_pool(
                ArchetypeDescriptor::new("Debris", bolt_prototype())
                    .with_initial_count(4)
                    .with_auto_release(0.5),
            )
            .unwrap();
        for _ in 0..3 {
            registry.acquire("Debris", Placement::default()).unwrap();
        }

        assert_eq!(registry.update(0.25), 0);
        assert_eq!(registry.update(0.25), 3);
        assert_eq!(occupancy(registry.stats("Debris").unwrap()), (0, 4, 4));
    }
}
