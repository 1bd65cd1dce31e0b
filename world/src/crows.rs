//! Authoritative crow registry.

use std::{collections::BTreeMap, time::Duration};

use crow_defence_core::{CrowId, CrowPhase, CrowSnapshot, Problem};

/// State of a crow stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct CrowState {
    /// Identifier allocated by the world for the crow.
    pub(crate) id: CrowId,
    /// Problem the crow carries. Never changes after spawn.
    problem: Problem,
    phase: CrowPhase,
    /// Horizontal position reported by the motion collaborator.
    pub(crate) x: f32,
    /// Vertical lane the crow was spawned on.
    pub(crate) lane: f32,
    /// Distance dropped since the crow started falling.
    pub(crate) drop: f32,
    /// Session time at which the crow started falling.
    pub(crate) falling_since: Option<Duration>,
}

impl CrowState {
    pub(crate) fn problem(&self) -> Problem {
        self.problem
    }

    pub(crate) fn phase(&self) -> CrowPhase {
        self.phase
    }

    /// Moves the crow to `next` if the transition table allows it.
    pub(crate) fn transition(&mut self, next: CrowPhase) -> bool {
        if self.phase.permits(next) {
            self.phase = next;
            true
        } else {
            false
        }
    }

    pub(crate) fn snapshot(&self) -> CrowSnapshot {
        CrowSnapshot {
            id: self.id,
            problem: self.problem,
            phase: self.phase,
            x: self.x,
            lane: self.lane,
            drop: self.drop,
        }
    }
}

/// Registry that stores live crows and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct CrowRegistry {
    entries: BTreeMap<CrowId, CrowState>,
    next_crow_id: CrowId,
}

impl CrowRegistry {
    /// Creates an empty crow registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_crow_id: CrowId::new(0),
        }
    }

    /// Registers a new flying crow and returns its identifier.
    pub(crate) fn insert(&mut self, problem: Problem, x: f32, lane: f32) -> CrowId {
        let id = self.next_crow_id;
        self.next_crow_id = CrowId::new(id.get().wrapping_add(1));
        let _ = self.entries.insert(
            id,
            CrowState {
                id,
                problem,
                phase: CrowPhase::Flying,
                x,
                lane,
                drop: 0.0,
                falling_since: None,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: CrowId) -> Option<&CrowState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: CrowId) -> Option<&mut CrowState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: CrowId) -> Option<CrowState> {
        self.entries.remove(&id)
    }

    /// Iterates crows in identifier order, which is also spawn order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &CrowState> {
        self.entries.values()
    }

    /// Number of crows that still count toward wave completion.
    pub(crate) fn live_count(&self) -> usize {
        self.entries
            .values()
            .filter(|crow| crow.phase.is_live())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_starts_empty_with_zero_identifier() {
        let registry = CrowRegistry::new();
        assert!(registry.entries.is_empty());
        assert_eq!(registry.next_crow_id.get(), 0);
    }

    #[test]
    fn insert_allocates_sequential_identifiers() {
        let mut registry = CrowRegistry::new();
        let first = registry.insert(Problem::new(2, 3), 100.0, 300.0);
        let second = registry.insert(Problem::new(4, 4), 100.0, 400.0);

        assert_eq!(first, CrowId::new(0));
        assert_eq!(second, CrowId::new(1));
        assert_eq!(registry.live_count(), 2);
        let ids: Vec<CrowId> = registry.iter().map(|crow| crow.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn transition_rejects_skipping_phases() {
        let mut registry = CrowRegistry::new();
        let id = registry.insert(Problem::new(6, 7), 0.0, 0.0);
        let crow = registry.get_mut(id).expect("crow");

        assert!(!crow.transition(CrowPhase::Removed));
        assert!(!crow.transition(CrowPhase::Falling));
        assert!(crow.transition(CrowPhase::Hit));
        assert!(!crow.transition(CrowPhase::Hit));
        assert!(crow.transition(CrowPhase::Falling));
        assert!(crow.transition(CrowPhase::Removed));
        assert_eq!(crow.phase(), CrowPhase::Removed);
        assert_eq!(crow.problem().answer(), 42);
        assert_eq!(registry.live_count(), 0);
    }
}
