//! Reader lifecycle states.
//!
//! ```text
//!            read / next_result / result_sets
//! Building ────────────────────────────────────▶ Reading
//!    ▲  │                                          │
//!    │  └──────────── close ──────────┐    close ──┘
//!    │                                ▼
//!    └──────────── reset ────────── Closed
//! ```
//!
//! `reset` also returns a `Reading` reader to `Building`.

use std::fmt;

/// Lifecycle state of an [`ObjectReader`](crate::ObjectReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReaderState {
    /// Sets may be added or removed; no cursor exists yet.
    #[default]
    Building,
    /// Iteration has started; the set list is frozen.
    Reading,
    /// The reader has been closed; all access fails until reset.
    Closed,
}

impl ReaderState {
    /// Whether the set list may be modified.
    #[must_use]
    pub const fn can_modify(self) -> bool {
        matches!(self, Self::Building)
    }

    /// Whether the reader has started iterating.
    #[must_use]
    pub const fn has_started(self) -> bool {
        matches!(self, Self::Reading)
    }
}

impl fmt::Display for ReaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Building => "building",
            Self::Reading => "reading",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert_eq!(ReaderState::default(), ReaderState::Building);
        assert!(ReaderState::Building.can_modify());
        assert!(!ReaderState::Reading.can_modify());
        assert!(!ReaderState::Closed.can_modify());
        assert!(ReaderState::Reading.has_started());
        assert_eq!(ReaderState::Closed.to_string(), "closed");
    }
}
