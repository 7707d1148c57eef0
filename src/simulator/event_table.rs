use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::dynamics::{Time, INFINITY};
use crate::models::ModelId;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    time: Time,
    sequence: u64,
    model: ModelId,
}

impl Eq for Entry {}

impl Ord for Entry {
    // Reversed: the heap pops the earliest time, then the earliest
    // scheduling.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .partial_cmp(&self.time)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Next internal event time of every scheduled simulator.  Rescheduling
/// leaves the previous heap entry in place; entries which no longer match
/// the schedule are discarded when they reach the top.
#[derive(Debug, Default)]
pub struct EventTable {
    heap: BinaryHeap<Entry>,
    scheduled: HashMap<ModelId, (Time, u64)>,
    sequence: u64,
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules the internal event of `model` at `time`.  An infinite
    /// time unschedules it.
    pub fn schedule(&mut self, model: ModelId, time: Time) {
        if time == INFINITY {
            self.unschedule(model);
            return;
        }
        self.sequence += 1;
        self.scheduled.insert(model, (time, self.sequence));
        self.heap.push(Entry {
            time,
            sequence: self.sequence,
            model,
        });
    }

    pub fn unschedule(&mut self, model: ModelId) {
        self.scheduled.remove(&model);
    }

    pub fn scheduled_time(&self, model: ModelId) -> Option<Time> {
        self.scheduled.get(&model).map(|(time, _)| *time)
    }

    pub fn len(&self) -> usize {
        self.scheduled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scheduled.is_empty()
    }

    fn is_current(&self, entry: &Entry) -> bool {
        self.scheduled.get(&entry.model) == Some(&(entry.time, entry.sequence))
    }

    fn purge(&mut self) {
        while let Some(entry) = self.heap.peek() {
            if self.is_current(entry) {
                break;
            }
            self.heap.pop();
        }
    }

    /// Time of the earliest internal event, [`INFINITY`] if none.
    pub fn next_time(&mut self) -> Time {
        self.purge();
        self.heap.peek().map_or(INFINITY, |entry| entry.time)
    }

    /// Removes and returns every model scheduled at the earliest time.
    pub fn pop_imminent(&mut self) -> (Time, Vec<ModelId>) {
        let time = self.next_time();
        let mut imminent = Vec::new();
        while let Some(entry) = self.heap.peek().copied() {
            if entry.time != time {
                break;
            }
            self.heap.pop();
            if self.is_current(&entry) {
                self.scheduled.remove(&entry.model);
                imminent.push(entry.model);
            }
        }
        imminent.sort();
        (time, imminent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescheduling_discards_previous_entries() {
        let a = ModelId::new(0, 0);
        let b = ModelId::new(1, 0);
        let mut table = EventTable::new();
        table.schedule(a, 2.0);
        table.schedule(b, 2.0);
        table.schedule(a, 5.0);
        assert_eq!(2.0, table.next_time());
        assert_eq!((2.0, vec![b]), table.pop_imminent());
        assert_eq!(5.0, table.next_time());
        table.schedule(a, INFINITY);
        assert_eq!(INFINITY, table.next_time());
        assert!(table.is_empty());
    }

    #[test]
    fn simultaneous_events_pop_together() {
        let ids: Vec<ModelId> = (0..3).map(|index| ModelId::new(index, 0)).collect();
        let mut table = EventTable::new();
        for id in ids.iter().rev() {
            table.schedule(*id, 1.0);
        }
        assert_eq!((1.0, ids), table.pop_imminent());
        assert_eq!((INFINITY, Vec::new()), table.pop_imminent());
    }
}
