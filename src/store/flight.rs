// In-flight tracking per store resource.
// Backs the loading flags and rejects overlapping fetches of store-owned state.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::models::LoadingFlags;

/// A collection the store fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Questions,
    Answers,
    Favorites,
    Profile,
}

impl Resource {
    fn index(self) -> usize {
        match self {
            Resource::Questions => 0,
            Resource::Answers => 1,
            Resource::Favorites => 2,
            Resource::Profile => 3,
        }
    }

    /// Exclusive resources write store state, so at most one fetch may run.
    /// Answers are returned to the caller, never stored, and may overlap.
    pub fn is_exclusive(self) -> bool {
        !matches!(self, Resource::Answers)
    }

    pub fn name(self) -> &'static str {
        match self {
            Resource::Questions => "questions",
            Resource::Answers => "answers",
            Resource::Favorites => "favorites",
            Resource::Profile => "profile",
        }
    }
}

/// Counts fetches in flight for each resource.
#[derive(Debug, Default)]
pub struct InFlight {
    counters: [AtomicUsize; 4],
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fetch. Returns false if an exclusive fetch is already running.
    pub fn try_acquire(&self, resource: Resource) -> bool {
        let counter = &self.counters[resource.index()];
        if resource.is_exclusive() {
            counter
                .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        } else {
            counter.fetch_add(1, Ordering::AcqRel);
            true
        }
    }

    pub fn release(&self, resource: Resource) {
        let counter = &self.counters[resource.index()];
        // Never wraps below zero on an unmatched release
        let _ = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    pub fn count(&self, resource: Resource) -> usize {
        self.counters[resource.index()].load(Ordering::Acquire)
    }

    pub fn is_loading(&self, resource: Resource) -> bool {
        self.count(resource) > 0
    }

    /// Loading flags derived from the current counts.
    pub fn flags(&self) -> LoadingFlags {
        LoadingFlags {
            questions: self.is_loading(Resource::Questions),
            answers: self.is_loading(Resource::Answers),
            favorites: self.is_loading(Resource::Favorites),
            profile: self.is_loading(Resource::Profile),
        }
    }
}
