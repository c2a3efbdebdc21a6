//! Recyclable instances and their lifecycle facets
//!
//! A [`RecyclableInstance`] is the leaf unit of the recycling engine: one
//! pooled entity plus the behaviors ("facets") attached to it. Instances are
//! constructed by their pool, lent out through an [`InstanceHandle`], and
//! never destroyed individually; only clearing the owning pool drops them.
//!
//! # State machine
//!
//! ```text
//! Resting ──acquire──▶ Active ──release / auto-release──▶ Resting
//!    └────────────── clear ──────────────┴──────────────▶ Destroyed
//! ```

use crate::foundation::collections::InstanceKey;
use crate::foundation::math::{utils, Quat, Vec3};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// World placement applied to an instance when it is acquired
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// World position
    pub position: Vec3,
    /// World orientation
    pub orientation: Quat,
    /// Transient parent-of-convenience (opaque entity id), detached on release
    pub parent: Option<u64>,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Quat::identity(),
            parent: None,
        }
    }
}

impl Placement {
    /// Create a placement from position and orientation
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
            parent: None,
        }
    }

    /// Create a placement at a position with identity orientation
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::identity())
    }

    /// Attach the instance to a transient parent while it is active
    #[must_use]
    pub fn with_parent(mut self, parent: u64) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Whether the position is finite
    pub fn is_finite(&self) -> bool {
        utils::is_finite(&self.position)
    }
}

/// Behavior attached to a recyclable instance that observes spawn/despawn
///
/// Any number of facets may be attached to one instance. They are notified in
/// attachment order on every transition.
pub trait LifecycleFacet {
    /// Called after the placement has been applied, before the handle reaches the caller
    fn on_spawned(&mut self, placement: &Placement);

    /// Called before the instance is deactivated and returned to the pool
    fn on_despawned(&mut self);

    /// Short name used in diagnostics
    fn label(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Activity state of a pooled instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Sitting in the available set, ready for acquisition
    Resting,
    /// Lent out to a caller
    Active,
}

/// Identity of one pool incarnation
///
/// Every pool receives a fresh stamp on construction and again on `clear`,
/// so handles issued before a clear (or by another pool) never resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolStamp(u64);

impl PoolStamp {
    pub(crate) fn next() -> Self {
        static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_STAMP.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a lent-out instance
///
/// Carries the owning archetype name so the registry can route a release back
/// to the right pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    archetype: Rc<str>,
    stamp: PoolStamp,
    key: InstanceKey,
}

impl InstanceHandle {
    pub(crate) fn new(archetype: Rc<str>, stamp: PoolStamp, key: InstanceKey) -> Self {
        Self { archetype, stamp, key }
    }

    /// Archetype of the pool that issued this handle
    pub fn archetype(&self) -> &str {
        &self.archetype
    }

    /// Generational key of the instance within its pool
    pub fn key(&self) -> InstanceKey {
        self.key
    }

    pub(crate) fn stamp(&self) -> PoolStamp {
        self.stamp
    }
}

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}@{}", self.archetype, self.key, self.stamp.0)
    }
}

/// One pooled entity plus its attached lifecycle facets
pub struct RecyclableInstance {
    archetype: Rc<str>,
    state: InstanceState,
    placement: Placement,
    facets: Vec<Box<dyn LifecycleFacet>>,
    release_token: Option<u64>,
    spawn_count: u32,
}

impl RecyclableInstance {
    /// Create a resting instance for `archetype` with the given facets
    pub(crate) fn new(archetype: Rc<str>, facets: Vec<Box<dyn LifecycleFacet>>) -> Self {
        Self {
            archetype,
            state: InstanceState::Resting,
            placement: Placement::default(),
            facets,
            release_token: None,
            spawn_count: 0,
        }
    }

    /// Archetype this instance belongs to
    pub fn archetype(&self) -> &str {
        &self.archetype
    }

    /// Current activity state
    pub fn state(&self) -> InstanceState {
        self.state
    }

    /// Whether the instance is lent out
    pub fn is_active(&self) -> bool {
        self.state == InstanceState::Active
    }

    /// Placement applied by the most recent acquisition
    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Transient parent, if attached
    pub fn parent(&self) -> Option<u64> {
        self.placement.parent
    }

    /// How many times this instance has been spawned
    pub fn spawn_count(&self) -> u32 {
        self.spawn_count
    }

    /// Number of attached facets
    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    /// Labels of the attached facets in notification order
    pub fn facet_labels(&self) -> impl Iterator<Item = &str> {
        self.facets.iter().map(|facet| facet.label())
    }

    /// Attach an additional facet; it is notified after every facet attached earlier
    pub fn attach_facet(&mut self, facet: Box<dyn LifecycleFacet>) {
        self.facets.push(facet);
    }

    pub(crate) fn release_token(&self) -> Option<u64> {
        self.release_token
    }

    pub(crate) fn set_release_token(&mut self, token: Option<u64>) {
        self.release_token = token;
    }

    /// Apply placement, mark active and notify facets
    pub(crate) fn activate(&mut self, placement: Placement) {
        self.placement = placement;
        self.state = InstanceState::Active;
        self.spawn_count = self.spawn_count.saturating_add(1);

        for facet in &mut self.facets {
            facet.on_spawned(&self.placement);
        }
    }

    /// Notify facets, drop any pending auto-release, deactivate and detach
    pub(crate) fn deactivate(&mut self) {
        for facet in &mut self.facets {
            facet.on_despawned();
        }

        self.release_token = None;
        self.state = InstanceState::Resting;
        self.placement.parent = None;
    }
}

impl fmt::Debug for RecyclableInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecyclableInstance")
            .field("archetype", &self.archetype)
            .field("state", &self.state)
            .field("placement", &self.placement)
            .field("facets", &self.facet_labels().collect::<Vec<_>>())
            .field("spawn_count", &self.spawn_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder {
        tag: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl LifecycleFacet for Recorder {
        fn on_spawned(&mut self, placement: &Placement) {
            self.log
                .borrow_mut()
                .push(format!("{}:spawn:{}", self.tag, placement.position.x));
        }

        fn on_despawned(&mut self) {
            self.log.borrow_mut().push(format!("{}:despawn", self.tag));
        }
    }

    fn recorder(tag: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Box<dyn LifecycleFacet> {
        Box::new(Recorder { tag, log: Rc::clone(log) })
    }

    #[test]
    fn test_facets_notified_in_attachment_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut instance = RecyclableInstance::new(
            Rc::from("Bolt"),
            vec![recorder("a", &log), recorder("b", &log)],
        );
        instance.attach_facet(recorder("c", &log));

        instance.activate(Placement::at(Vec3::new(3.0, 0.0, 0.0)));
        instance.deactivate();

        assert_eq!(
            *log.borrow(),
            vec![
                "a:spawn:3", "b:spawn:3", "c:spawn:3",
                "a:despawn", "b:despawn", "c:despawn",
            ]
        );
    }

    #[test]
    fn test_deactivate_detaches_parent_and_token() {
        let mut instance = RecyclableInstance::new(Rc::from("Pickup"), Vec::new());
        instance.activate(Placement::default().with_parent(42));
        instance.set_release_token(Some(7));

        assert!(instance.is_active());
        assert_eq!(instance.parent(), Some(42));

        instance.deactivate();

        assert_eq!(instance.state(), InstanceState::Resting);
        assert_eq!(instance.parent(), None);
        assert_eq!(instance.release_token(), None);
        assert_eq!(instance.spawn_count(), 1);
    }

    #[test]
    fn test_pool_stamps_are_unique() {
        assert_ne!(PoolStamp::next(), PoolStamp::next());
    }
}
