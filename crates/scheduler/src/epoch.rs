//! Document/zoom generation counter
//!
//! An [`Epoch`] is a monotonically increasing counter owned by a session or
//! render coordinator. Every piece of async work takes a [`Stamp`] of the
//! epoch at issue time; before its result is applied, the stamp is checked
//! against the live epoch. Advancing the epoch (new document, new zoom, new
//! page set) therefore invalidates every outstanding continuation at once.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Monotonic generation counter shared between an owner and its in-flight work
#[derive(Debug, Clone)]
pub struct Epoch {
    value: Arc<AtomicU64>,
}

impl Epoch {
    /// Create a new epoch starting at generation zero
    pub fn new() -> Self {
        Self {
            value: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance to the next generation, invalidating all outstanding stamps
    ///
    /// Returns the new generation value.
    pub fn advance(&self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Get the current generation value
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Take a stamp of the current generation
    pub fn stamp(&self) -> Stamp {
        Stamp {
            generation: self.current(),
        }
    }
}

impl Default for Epoch {
    fn default() -> Self {
        Self::new()
    }
}

/// A recorded generation, carried by async work issued under that generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    generation: u64,
}

impl Stamp {
    /// Check whether this stamp still matches the live epoch
    ///
    /// A stale stamp means the work it accompanies was superseded and its
    /// result must be discarded.
    pub fn is_current(&self, epoch: &Epoch) -> bool {
        self.generation == epoch.current()
    }

    /// The generation this stamp was taken at
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_current_until_advance() {
        let epoch = Epoch::new();
        let stamp = epoch.stamp();
        assert!(stamp.is_current(&epoch));

        epoch.advance();
        assert!(!stamp.is_current(&epoch));
    }

    #[test]
    fn test_advance_returns_new_generation() {
        let epoch = Epoch::new();
        assert_eq!(epoch.current(), 0);
        assert_eq!(epoch.advance(), 1);
        assert_eq!(epoch.advance(), 2);
        assert_eq!(epoch.current(), 2);
    }

    #[test]
    fn test_clones_share_generation() {
        let epoch = Epoch::new();
        let shared = epoch.clone();
        let stamp = shared.stamp();

        epoch.advance();
        assert!(!stamp.is_current(&shared));
        assert_eq!(shared.current(), 1);
    }

    #[test]
    fn test_fresh_stamp_after_advance() {
        let epoch = Epoch::new();
        epoch.advance();

        let stamp = epoch.stamp();
        assert!(stamp.is_current(&epoch));
        assert_eq!(stamp.generation(), 1);
    }
}
