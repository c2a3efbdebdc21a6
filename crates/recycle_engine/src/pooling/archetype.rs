//! Archetype descriptors and the externally supplied catalog
//!
//! An archetype is a named category of recyclable instance: one prototype,
//! one pool. The catalog is plain data handed to the engine at startup; it is
//! either built in code or resolved from a config file
//! (see [`crate::config::CatalogConfig`]).

use crate::pooling::instance::LifecycleFacet;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Template from which new instances of an archetype are constructed
///
/// Validation runs once when the pool is registered; construction itself is
/// infallible so that growing a pool during a live acquire can never fail.
pub trait Prototype {
    /// Check the template before any instance is built
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Build the facets for one new instance
    fn instantiate(&self) -> Vec<Box<dyn LifecycleFacet>>;
}

impl<F> Prototype for F
where
    F: Fn() -> Vec<Box<dyn LifecycleFacet>>,
{
    fn instantiate(&self) -> Vec<Box<dyn LifecycleFacet>> {
        self()
    }
}

/// Shared reference to a prototype
pub type PrototypeRef = Rc<dyn Prototype>;

/// Immutable description of one archetype
#[derive(Clone)]
pub struct ArchetypeDescriptor {
    name: String,
    prototype: PrototypeRef,
    initial_count: usize,
    capacity_ceiling: usize,
    allow_auto_expand: bool,
    auto_release_seconds: f32,
}

impl ArchetypeDescriptor {
    /// Create a descriptor with no prewarm, no ceiling, auto-expand on and no auto-release
    pub fn new(name: impl Into<String>, prototype: PrototypeRef) -> Self {
        Self {
            name: name.into(),
            prototype,
            initial_count: 0,
            capacity_ceiling: 0,
            allow_auto_expand: true,
            auto_release_seconds: 0.0,
        }
    }

    /// Number of instances to construct up front
    #[must_use]
    pub fn with_initial_count(mut self, count: usize) -> Self {
        self.initial_count = count;
        self
    }

    /// Maximum number of instances ever constructed (0 = unbounded)
    #[must_use]
    pub fn with_capacity_ceiling(mut self, ceiling: usize) -> Self {
        self.capacity_ceiling = ceiling;
        self
    }

    /// Whether an empty pool may construct more instances on demand
    #[must_use]
    pub fn with_auto_expand(mut self, allow: bool) -> Self {
        self.allow_auto_expand = allow;
        self
    }

    /// Return active instances automatically after `seconds` (0 = never)
    #[must_use]
    pub fn with_auto_release(mut self, seconds: f32) -> Self {
        self.auto_release_seconds = seconds;
        self
    }

    /// Archetype name (case-sensitive key)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prototype used to construct instances
    pub fn prototype(&self) -> &PrototypeRef {
        &self.prototype
    }

    /// Requested prewarm count, as configured
    pub fn initial_count(&self) -> usize {
        self.initial_count
    }

    /// Capacity ceiling, as configured (0 = unbounded)
    pub fn capacity_ceiling(&self) -> usize {
        self.capacity_ceiling
    }

    /// Whether auto-expand is allowed
    pub fn allow_auto_expand(&self) -> bool {
        self.allow_auto_expand
    }

    /// Auto-release timeout in seconds (0 = never)
    pub fn auto_release_seconds(&self) -> f32 {
        self.auto_release_seconds
    }

    /// Auto-release timeout, if one is configured
    pub fn auto_release(&self) -> Option<f32> {
        let seconds = self.auto_release_seconds;
        (seconds.is_finite() && seconds > 0.0).then_some(seconds)
    }

    /// Ceiling as an option (`None` = unbounded)
    pub fn ceiling(&self) -> Option<usize> {
        (self.capacity_ceiling > 0).then_some(self.capacity_ceiling)
    }

    /// Clamp a requested instance count to the ceiling
    pub fn clamp_to_ceiling(&self, count: usize) -> usize {
        self.ceiling().map_or(count, |ceiling| count.min(ceiling))
    }
}

impl fmt::Debug for ArchetypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchetypeDescriptor")
            .field("name", &self.name)
            .field("initial_count", &self.initial_count)
            .field("capacity_ceiling", &self.capacity_ceiling)
            .field("allow_auto_expand", &self.allow_auto_expand)
            .field("auto_release_seconds", &self.auto_release_seconds)
            .finish_non_exhaustive()
    }
}

/// Why a catalog record could not become a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Name is empty or whitespace
    BlankName,
    /// No prototype was supplied or resolved
    MissingPrototype,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankName => write!(f, "blank archetype name"),
            Self::MissingPrototype => write!(f, "missing prototype"),
        }
    }
}

/// One raw catalog entry, possibly malformed
#[derive(Clone)]
pub struct ArchetypeRecord {
    /// Archetype name
    pub name: String,
    /// Prototype, if one was supplied
    pub prototype: Option<PrototypeRef>,
    /// Requested prewarm count
    pub initial_count: usize,
    /// Capacity ceiling (0 = unbounded)
    pub capacity_ceiling: usize,
    /// Whether auto-expand is allowed
    pub allow_auto_expand: bool,
    /// Auto-release timeout in seconds (0 = never)
    pub auto_release_seconds: f32,
}

impl ArchetypeRecord {
    /// Create a record with default policy for the given name and prototype
    pub fn new(name: impl Into<String>, prototype: Option<PrototypeRef>) -> Self {
        Self {
            name: name.into(),
            prototype,
            initial_count: 0,
            capacity_ceiling: 0,
            allow_auto_expand: true,
            auto_release_seconds: 0.0,
        }
    }

    /// Turn the record into a descriptor, or explain why it must be skipped
    pub fn to_descriptor(&self) -> Result<ArchetypeDescriptor, SkipReason> {
        if self.name.trim().is_empty() {
            return Err(SkipReason::BlankName);
        }
        let prototype = self.prototype.clone().ok_or(SkipReason::MissingPrototype)?;

        Ok(ArchetypeDescriptor::new(self.name.clone(), prototype)
            .with_initial_count(self.initial_count)
            .with_capacity_ceiling(self.capacity_ceiling)
            .with_auto_expand(self.allow_auto_expand)
            .with_auto_release(self.auto_release_seconds))
    }
}

impl From<ArchetypeDescriptor> for ArchetypeRecord {
    fn from(descriptor: ArchetypeDescriptor) -> Self {
        Self {
            name: descriptor.name,
            prototype: Some(descriptor.prototype),
            initial_count: descriptor.initial_count,
            capacity_ceiling: descriptor.capacity_ceiling,
            allow_auto_expand: descriptor.allow_auto_expand,
            auto_release_seconds: descriptor.auto_release_seconds,
        }
    }
}

impl fmt::Debug for ArchetypeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchetypeRecord")
            .field("name", &self.name)
            .field("has_prototype", &self.prototype.is_some())
            .field("initial_count", &self.initial_count)
            .field("capacity_ceiling", &self.capacity_ceiling)
            .field("allow_auto_expand", &self.allow_auto_expand)
            .field("auto_release_seconds", &self.auto_release_seconds)
            .finish()
    }
}

/// Ordered list of archetype records supplied by configuration
#[derive(Debug, Clone, Default)]
pub struct ArchetypeCatalog {
    records: Vec<ArchetypeRecord>,
}

impl ArchetypeCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    pub fn push(&mut self, record: impl Into<ArchetypeRecord>) {
        self.records.push(record.into());
    }

    /// Append a record, builder style
    #[must_use]
    pub fn with(mut self, record: impl Into<ArchetypeRecord>) -> Self {
        self.push(record);
        self
    }

    /// Records in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &ArchetypeRecord> {
        self.records.iter()
    }

    /// Number of records (including malformed ones)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<R: Into<ArchetypeRecord>> FromIterator<R> for ArchetypeCatalog {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Named prototypes that config files refer to by key
#[derive(Default)]
pub struct PrototypeLibrary {
    prototypes: HashMap<String, PrototypeRef>,
}

impl PrototypeLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prototype under `key`, replacing any previous one
    pub fn register(&mut self, key: impl Into<String>, prototype: PrototypeRef) {
        let key = key.into();
        if self.prototypes.insert(key.clone(), prototype).is_some() {
            log::debug!("Replaced prototype '{}' in library", key);
        }
    }

    /// Look up a prototype by key
    pub fn get(&self, key: &str) -> Option<PrototypeRef> {
        self.prototypes.get(key).cloned()
    }

    /// Number of registered prototypes
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_prototype() -> PrototypeRef {
        Rc::new(Vec::<Box<dyn LifecycleFacet>>::new)
    }

    #[test]
    fn test_descriptor_defaults() {
        let descriptor = ArchetypeDescriptor::new("Bolt", bare_prototype());

        assert_eq!(descriptor.name(), "Bolt");
        assert_eq!(descriptor.ceiling(), None);
        assert_eq!(descriptor.auto_release(), None);
        assert!(descriptor.allow_auto_expand());
        assert_eq!(descriptor.clamp_to_ceiling(1_000), 1_000);
    }

    #[test]
    fn test_descriptor_clamps_to_ceiling() {
        let descriptor = ArchetypeDescriptor::new("Debris", bare_prototype())
            .with_capacity_ceiling(8)
            .with_auto_release(2.5);

        assert_eq!(descriptor.clamp_to_ceiling(20), 8);
        assert_eq!(descriptor.clamp_to_ceiling(3), 3);
        assert_eq!(descriptor.auto_release(), Some(2.5));
    }

    #[test]
    fn test_record_skip_reasons() {
        let blank = ArchetypeRecord::new("   ", Some(bare_prototype()));
        let missing = ArchetypeRecord::new("Pickup", None);

        assert_eq!(blank.to_descriptor().err(), Some(SkipReason::BlankName));
        assert_eq!(missing.to_descriptor().err(), Some(SkipReason::MissingPrototype));
    }

    #[test]
    fn test_record_round_trips_policy() {
        let mut record = ArchetypeRecord::new("Spark", Some(bare_prototype()));
        record.initial_count = 4;
        record.capacity_ceiling = 16;
        record.allow_auto_expand = false;

        let descriptor = record.to_descriptor().expect("valid record");
        assert_eq!(descriptor.initial_count(), 4);
        assert_eq!(descriptor.capacity_ceiling(), 16);
        assert!(!descriptor.allow_auto_expand());
    }

    #[test]
    fn test_library_lookup() {
        let mut library = PrototypeLibrary::new();
        library.register("bolt", bare_prototype());

        assert!(library.get("bolt").is_some());
        assert!(library.get("Bolt").is_none());
        assert_eq!(library.len(), 1);
    }
}
