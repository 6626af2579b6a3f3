use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier used for stages, recycles and equipment.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// Human-facing tag such as `EQ-007` (1-based, zero padded).
    pub fn tag(self, prefix: &str) -> String {
        format!("{}-{:03}", prefix, self.0.get())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Stage-train ID aliases.
pub type StageId = Id;
pub type RecycleId = Id;

/// Monotonic per-run counter. Two runs over the same inputs hand out the
/// same sequence, which keeps equipment IDs reproducible.
#[derive(Debug, Default, Clone)]
pub struct IdSequence {
    next: u32,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next ID.
    pub fn next_id(&mut self) -> Id {
        let id = Id::from_index(self.next);
        self.next += 1;
        id
    }

    /// Number of IDs issued so far.
    pub fn issued(&self) -> u32 {
        self.next
    }
}
