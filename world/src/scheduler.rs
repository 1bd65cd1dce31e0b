//! Timers owned by the world: the wave spawn timer and deferred crow tasks.

use std::{collections::BTreeMap, time::Duration};

use crow_defence_core::CrowId;

/// Repeating timer that fires once per elapsed period.
///
/// The handle is owned by the wave session; dropping it cancels the timer.
#[derive(Debug)]
pub(crate) struct SpawnTimer {
    period: Duration,
    accumulator: Duration,
}

impl SpawnTimer {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period,
            accumulator: Duration::ZERO,
        }
    }

    /// Accumulates `dt` and returns how many periods elapsed.
    pub(crate) fn advance(&mut self, dt: Duration) -> u32 {
        if self.period.is_zero() {
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let mut fires = 0;
        while self.accumulator >= self.period {
            self.accumulator -= self.period;
            fires += 1;
        }
        fires
    }
}

/// Follow-up work attached to a crow's defeat sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TaskKind {
    /// The hit animation finished; the crow starts to fall.
    HitAnimationEnded,
    /// Poll whether a falling crow left the arena.
    FallCheck,
}

/// Deferred continuation keyed by crow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ScheduledTask {
    pub(crate) due: Duration,
    pub(crate) crow: CrowId,
    pub(crate) kind: TaskKind,
}

/// Queue of deferred tasks ordered by due time, then by insertion.
#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    queue: BTreeMap<(Duration, u64), ScheduledTask>,
    sequence: u64,
}

impl Scheduler {
    pub(crate) fn schedule(&mut self, due: Duration, crow: CrowId, kind: TaskKind) {
        let key = (due, self.sequence);
        self.sequence = self.sequence.wrapping_add(1);
        let _ = self.queue.insert(key, ScheduledTask { due, crow, kind });
    }

    /// Removes and returns the earliest task due at or before `now`.
    pub(crate) fn pop_due(&mut self, now: Duration) -> Option<ScheduledTask> {
        let entry = self.queue.first_entry()?;
        if entry.key().0 > now {
            return None;
        }
        Some(entry.remove())
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_timer_fires_once_per_period() {
        let mut timer = SpawnTimer::new(Duration::from_millis(500));
        assert_eq!(timer.advance(Duration::from_millis(400)), 0);
        assert_eq!(timer.advance(Duration::from_millis(100)), 1);
        assert_eq!(timer.advance(Duration::from_secs(2)), 4);
    }

    #[test]
    fn spawn_timer_without_period_never_fires() {
        let mut timer = SpawnTimer::new(Duration::ZERO);
        assert_eq!(timer.advance(Duration::from_secs(10)), 0);
    }

    #[test]
    fn tasks_pop_in_due_then_insertion_order() {
        let mut scheduler = Scheduler::default();
        let late = CrowId::new(1);
        let early = CrowId::new(2);
        let tied = CrowId::new(3);
        scheduler.schedule(Duration::from_millis(300), late, TaskKind::FallCheck);
        scheduler.schedule(Duration::from_millis(100), early, TaskKind::HitAnimationEnded);
        scheduler.schedule(Duration::from_millis(100), tied, TaskKind::HitAnimationEnded);

        assert_eq!(scheduler.pop_due(Duration::from_millis(50)), None);
        let now = Duration::from_millis(300);
        assert_eq!(scheduler.pop_due(now).map(|task| task.crow), Some(early));
        assert_eq!(scheduler.pop_due(now).map(|task| task.crow), Some(tied));
        assert_eq!(scheduler.pop_due(now).map(|task| task.crow), Some(late));
        assert_eq!(scheduler.pop_due(now), None);
    }

    #[test]
    fn clear_discards_pending_tasks() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(Duration::ZERO, CrowId::new(0), TaskKind::FallCheck);
        assert_eq!(scheduler.len(), 1);
        scheduler.clear();
        assert_eq!(scheduler.len(), 0);
    }
}
