//! Contact tracking and collision events
//!
//! The resolver records every pair that produced a resolvable overlap during
//! a tick. Comparing that set with the previous tick's gives the enter and
//! exit transitions, which the world hands to [`CollisionHandler`]s and
//! queues as [`ContactEvent`]s. Sets are ordered so event order is
//! deterministic.

use std::collections::BTreeSet;

use super::world::BodyHandle;

/// Unordered pair of bodies, stored with the smaller handle first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContactPair {
    a: BodyHandle,
    b: BodyHandle,
}

impl ContactPair {
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        if a <= b { Self { a, b } } else { Self { a: b, b: a } }
    }

    pub fn first(&self) -> BodyHandle {
        self.a
    }

    pub fn second(&self) -> BodyHandle {
        self.b
    }

    pub fn involves(&self, handle: BodyHandle) -> bool {
        self.a == handle || self.b == handle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Enter,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    pub kind: ContactKind,
    pub a: BodyHandle,
    pub b: BodyHandle,
}

/// Gameplay listener attached to a physics object.
///
/// Both methods default to no-ops so listeners implement only what they need.
pub trait CollisionHandler {
    fn on_collision_enter(&mut self, _other: BodyHandle) {}
    fn on_collision_exit(&mut self, _other: BodyHandle) {}
}

/// Touching pairs of the previous tick and the tick in progress.
#[derive(Debug, Default)]
pub struct ContactTracker {
    active: BTreeSet<ContactPair>,
    current: BTreeSet<ContactPair>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_tick(&mut self) {
        self.current.clear();
    }

    pub fn record(&mut self, a: BodyHandle, b: BodyHandle) {
        self.current.insert(ContactPair::new(a, b));
    }

    /// Ends the tick: returns enter events followed by exit events and makes
    /// the current set the active one.
    pub fn finish_tick(&mut self) -> Vec<ContactEvent> {
        let mut events = Vec::new();
        for pair in self.current.difference(&self.active) {
            events.push(ContactEvent {
                kind: ContactKind::Enter,
                a: pair.a,
                b: pair.b,
            });
        }
        for pair in self.active.difference(&self.current) {
            events.push(ContactEvent {
                kind: ContactKind::Exit,
                a: pair.a,
                b: pair.b,
            });
        }
        self.active = std::mem::take(&mut self.current);
        events
    }

    pub fn is_touching(&self, a: BodyHandle, b: BodyHandle) -> bool {
        self.active.contains(&ContactPair::new(a, b))
    }

    pub fn active_pairs(&self) -> impl Iterator<Item = &ContactPair> {
        self.active.iter()
    }

    /// Drops every record that references `handle`, without exit events.
    pub fn purge(&mut self, handle: BodyHandle) {
        self.active.retain(|p| !p.involves(handle));
        self.current.retain(|p| !p.involves(handle));
    }
}
