//! Per-file byte accounting for in-flight transfers.

use rustc_hash::FxHashMap;

/// Identifies one component of a file: `(component index, destination)`.
///
/// Whole-file progress uses `(None, dst)`.
pub type ComponentKey = (Option<u32>, Option<String>);

/// Bytes attributed to one component: `(new, existing)`.
///
/// `new` counts bytes moved by this run, `existing` bytes already present
/// from a resumed run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ComponentBytes {
    /// Bytes transferred by this run.
    pub new: i64,
    /// Bytes found from an earlier run.
    pub existing: i64,
}

impl ComponentBytes {
    /// Creates a component entry.
    #[must_use]
    pub const fn new(new: i64, existing: i64) -> Self {
        Self { new, existing }
    }

    /// Bytes accounted for in total.
    #[must_use]
    pub const fn total(self) -> i64 {
        self.new + self.existing
    }
}

/// Byte accounting for one file between its start and finish events.
#[derive(Clone, Debug, Default)]
pub struct FileProgressRecord {
    size: u64,
    pub(crate) new_sum: i64,
    pub(crate) existing_sum: i64,
    components: FxHashMap<ComponentKey, ComponentBytes>,
}

impl FileProgressRecord {
    /// Creates an empty record for a file of `size` bytes.
    #[must_use]
    pub fn new(size: u64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Size announced by the file start event.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Bytes transferred by this run.
    #[must_use]
    pub const fn new_sum(&self) -> i64 {
        self.new_sum
    }

    /// Bytes present from an earlier run.
    #[must_use]
    pub const fn existing_sum(&self) -> i64 {
        self.existing_sum
    }

    /// Bytes of the file not yet reported by any event.
    #[must_use]
    pub fn unaccounted(&self) -> i64 {
        signed(self.size).saturating_sub(self.new_sum.saturating_add(self.existing_sum))
    }

    /// Last recorded bytes for `key`, or zero if the component is unknown.
    #[must_use]
    pub fn component(&self, key: &ComponentKey) -> ComponentBytes {
        self.components.get(key).copied().unwrap_or_default()
    }

    /// Overwrites the bytes recorded for `key`.
    pub fn set_component(&mut self, key: ComponentKey, bytes: ComponentBytes) {
        self.components.insert(key, bytes);
    }

    /// Number of components with recorded bytes.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}

/// Converts a byte count to the signed accounting domain, saturating at
/// `i64::MAX`.
pub(crate) fn signed(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}
