//! Gesture-based undo history.
//!
//! Every finalized gesture becomes a [`HistoryRecord`] holding the snapshot
//! it produced. Moving through history swaps snapshots; nothing is replayed.

mod gesture;

use std::collections::BTreeMap;
use std::time::SystemTime;

use patchwork_types::{EntityId, StorePath};

use crate::patch::{create_patch, Patch};
use crate::store::Store;

pub use gesture::{ActiveGesture, Gesture, GestureState, DEFAULT_GESTURE_DURATION};

/// Default cap on non-baseline records.
pub const DEFAULT_MAX_RECORDS: usize = 1000;

/// One committed (timestamp, snapshot, gesture) triple.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub committed: SystemTime,
    pub store: Store,
    pub gesture: Gesture,
    /// Ids the gesture changed, with the time of each one's last change.
    pub updates: BTreeMap<EntityId, SystemTime>,
}

impl HistoryRecord {
    fn baseline(store: Store, committed: SystemTime) -> Self {
        Self {
            committed,
            store,
            gesture: Gesture::new(),
            updates: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreHistory {
    records: Vec<HistoryRecord>,
    /// The snapshot the recorded gestures replay from. Folding the oldest
    /// record into the baseline keeps it, since the folded actions stay.
    origin: Store,
    index: usize,
    max_records: usize,
    /// Per id, the update time of every record up to `index` that changed it.
    update_times: BTreeMap<EntityId, Vec<SystemTime>>,
}

impl StoreHistory {
    /// History whose record 0 is `baseline`.
    pub fn new(baseline: Store, max_records: usize) -> Self {
        Self {
            origin: baseline.clone(),
            records: vec![HistoryRecord::baseline(baseline, SystemTime::now())],
            index: 0,
            max_records: max_records.max(1),
            update_times: BTreeMap::new(),
        }
    }

    /// Drop every record and start over from `baseline`.
    pub fn reset(&mut self, baseline: Store) {
        self.records.clear();
        self.origin = baseline.clone();
        self.records
            .push(HistoryRecord::baseline(baseline, SystemTime::now()));
        self.index = 0;
        self.update_times.clear();
    }

    /// Starting point for [`gestures`](Self::gestures).
    pub fn origin(&self) -> &Store {
        &self.origin
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of records, baseline included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.len() == 1
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn current(&self) -> &HistoryRecord {
        &self.records[self.index]
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.records.len()
    }

    /// Seal `gesture` as a new record ending in `store`.
    ///
    /// Records past the current index are dropped first. Returns the patch
    /// from the previous record, or `None` (and records nothing) when the
    /// gesture left the store as it was.
    pub fn add_gesture(
        &mut self,
        store: Store,
        gesture: Gesture,
        updates: BTreeMap<EntityId, SystemTime>,
        committed: SystemTime,
    ) -> Option<Patch> {
        if self.current().store == store {
            log::debug!(target: "history", "gesture had no net effect, not recorded");
            return None;
        }
        let patch = create_patch(&self.current().store, &store, &StorePath::root());

        if self.can_redo() {
            log::debug!(
                target: "history",
                "dropping {} redo records",
                self.records.len() - self.index - 1
            );
            self.records.truncate(self.index + 1);
        }
        for (id, at) in &updates {
            self.update_times.entry(*id).or_default().push(*at);
        }
        self.records.push(HistoryRecord {
            committed,
            store,
            gesture,
            updates,
        });
        self.index += 1;

        if self.records.len() - 1 > self.max_records {
            self.fold_oldest();
        }
        Some(patch)
    }

    /// Merge record 1 into the baseline so the record count stays bounded.
    /// The folded gesture's actions stay on the baseline, so an action-format
    /// save still reproduces the state.
    fn fold_oldest(&mut self) {
        let oldest = self.records.remove(1);
        let baseline = &mut self.records[0];
        baseline.store = oldest.store;
        baseline.committed = oldest.committed;
        baseline.gesture.extend(oldest.gesture);
        self.index -= 1;
        log::debug!(target: "history", "folded oldest record into baseline");
    }

    /// Jump to record `index` and return its snapshot. `None` when the index
    /// is out of range or already current.
    pub fn set_index(&mut self, index: usize) -> Option<&Store> {
        if index >= self.records.len() || index == self.index {
            return None;
        }
        if index < self.index {
            for record in self.records[index + 1..=self.index].iter().rev() {
                for id in record.updates.keys() {
                    if let Some(times) = self.update_times.get_mut(id) {
                        times.pop();
                        if times.is_empty() {
                            self.update_times.remove(id);
                        }
                    }
                }
            }
        } else {
            for record in &self.records[self.index + 1..=index] {
                for (id, at) in &record.updates {
                    self.update_times.entry(*id).or_default().push(*at);
                }
            }
        }
        self.index = index;
        Some(&self.records[index].store)
    }

    pub fn undo(&mut self) -> Option<&Store> {
        if !self.can_undo() {
            return None;
        }
        self.set_index(self.index - 1)
    }

    pub fn redo(&mut self) -> Option<&Store> {
        if !self.can_redo() {
            return None;
        }
        self.set_index(self.index + 1)
    }

    /// Patch that record `index` applied to its predecessor.
    pub fn patch_at(&self, index: usize) -> Option<Patch> {
        if index == 0 || index >= self.records.len() {
            return None;
        }
        Some(create_patch(
            &self.records[index - 1].store,
            &self.records[index].store,
            &StorePath::root(),
        ))
    }

    /// Gestures that rebuild the current record from the baseline's origin,
    /// oldest first. Empty gestures are skipped.
    pub fn gestures(&self) -> impl Iterator<Item = &Gesture> + '_ {
        self.records[..=self.index]
            .iter()
            .map(|r| &r.gesture)
            .filter(|g| !g.is_empty())
    }

    /// How many records up to the current index changed `id`.
    pub fn change_count(&self, id: EntityId) -> usize {
        self.update_times.get(&id).map_or(0, Vec::len)
    }

    pub fn latest_update_time(&self, id: EntityId) -> Option<SystemTime> {
        self.update_times.get(&id).and_then(|t| t.last().copied())
    }

    /// The `n` most frequently changed ids, most changed first.
    pub fn most_changed(&self, n: usize) -> Vec<(EntityId, usize)> {
        let mut counts: Vec<_> = self
            .update_times
            .iter()
            .map(|(id, times)| (*id, times.len()))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        counts.truncate(n);
        counts
    }
}
