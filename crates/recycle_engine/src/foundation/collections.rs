//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Generational key of a recyclable instance inside its pool.
    ///
    /// A key stays valid for the lifetime of the instance; once the pool is
    /// cleared the slot version moves on and the old key no longer resolves.
    pub struct InstanceKey;
}

/// Handle-based map of pooled instances
pub type InstanceMap<T> = SlotMap<InstanceKey, T>;
