use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use patchwork_types::{ActionMerge, ActionMoment, EntityId};

/// Debounce window used when the config does not set one.
pub const DEFAULT_GESTURE_DURATION: Duration = Duration::from_millis(500);

/// Whether a burst of actions is currently being accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Accumulating,
}

/// A burst of actions treated as one undo step.
///
/// Adjacent actions that fold together (repeated sets of one path, a toggle
/// undone by a second toggle) are compressed as they are pushed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gesture {
    actions: Vec<ActionMoment>,
}

impl Gesture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap already-recorded moments without compressing them.
    pub fn from_actions(actions: Vec<ActionMoment>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[ActionMoment] {
        &self.actions
    }

    pub fn into_actions(self) -> Vec<ActionMoment> {
        self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Append `moment`, folding it into the previous action where possible.
    pub fn push(&mut self, moment: ActionMoment) {
        let Some(last) = self.actions.last_mut() else {
            self.actions.push(moment);
            return;
        };
        match last.action.merge(&moment.action) {
            ActionMerge::Merged(action) => {
                last.action = action;
                last.queued_at = moment.queued_at;
            }
            ActionMerge::Cancel => {
                self.actions.pop();
            }
            ActionMerge::Distinct => self.actions.push(moment),
        }
    }

    /// Append moments recorded elsewhere, as-is.
    pub fn extend(&mut self, other: Gesture) {
        self.actions.extend(other.actions);
    }
}

/// The gesture being accumulated right now, plus its debounce bookkeeping.
#[derive(Debug, Clone)]
pub struct ActiveGesture {
    gesture: Gesture,
    duration: Duration,
    widget_gesturing: bool,
    last_action: Option<SystemTime>,
    updates: BTreeMap<EntityId, SystemTime>,
}

impl Default for ActiveGesture {
    fn default() -> Self {
        Self::new(DEFAULT_GESTURE_DURATION)
    }
}

impl ActiveGesture {
    pub fn new(duration: Duration) -> Self {
        Self {
            gesture: Gesture::new(),
            duration,
            widget_gesturing: false,
            last_action: None,
            updates: BTreeMap::new(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Accumulating once any action has been accepted since the last finalize,
    /// even if compression has since emptied the action list.
    pub fn state(&self) -> GestureState {
        if self.last_action.is_some() {
            GestureState::Accumulating
        } else {
            GestureState::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == GestureState::Accumulating
    }

    /// A held widget (slider drag, knob turn) keeps the gesture open past the
    /// debounce window until it is released.
    pub fn widget_gesturing(&self) -> bool {
        self.widget_gesturing
    }

    pub fn set_widget_gesturing(&mut self, gesturing: bool) {
        self.widget_gesturing = gesturing;
    }

    pub fn push(&mut self, moment: ActionMoment) {
        self.last_action = Some(moment.queued_at);
        self.gesture.push(moment);
    }

    /// Record that `ids` changed at `at` as part of this gesture.
    pub fn touch(&mut self, ids: impl IntoIterator<Item = EntityId>, at: SystemTime) {
        for id in ids {
            self.updates.insert(id, at);
        }
    }

    pub fn updates(&self) -> &BTreeMap<EntityId, SystemTime> {
        &self.updates
    }

    /// Time left before the gesture auto-finalizes, measured from its most
    /// recent action. Zero when idle.
    pub fn time_remaining(&self, now: SystemTime) -> Duration {
        match self.last_action {
            Some(last) => {
                let elapsed = now.duration_since(last).unwrap_or(Duration::ZERO);
                self.duration.saturating_sub(elapsed)
            }
            None => Duration::ZERO,
        }
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.is_active() && !self.widget_gesturing && self.time_remaining(now).is_zero()
    }

    /// End the gesture, returning its actions and per-id update times.
    pub fn take(&mut self) -> (Gesture, BTreeMap<EntityId, SystemTime>) {
        self.last_action = None;
        (
            std::mem::take(&mut self.gesture),
            std::mem::take(&mut self.updates),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwork_types::{Action, PrimitiveAction, StorePath};
    use std::time::UNIX_EPOCH;

    fn at(ms: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(ms)
    }

    fn set(value: i32, ms: u64) -> ActionMoment {
        let action: Action = PrimitiveAction::SetInt {
            path: StorePath::new("/x"),
            value,
        }
        .into();
        ActionMoment::new(action, at(ms))
    }

    fn toggle(ms: u64) -> ActionMoment {
        let action: Action = PrimitiveAction::ToggleBool {
            path: StorePath::new("/flag"),
        }
        .into();
        ActionMoment::new(action, at(ms))
    }

    #[test]
    fn push_compresses_adjacent_actions() {
        let mut gesture = Gesture::new();
        gesture.push(set(1, 0));
        gesture.push(set(2, 10));
        assert_eq!(gesture.len(), 1);
        assert_eq!(gesture.actions()[0], set(2, 10));

        gesture.push(toggle(20));
        gesture.push(toggle(30));
        assert_eq!(gesture.actions(), &[set(2, 10)]);
    }

    #[test]
    fn debounce_window() {
        let mut active = ActiveGesture::new(Duration::from_millis(500));
        assert_eq!(active.state(), GestureState::Idle);
        assert!(!active.is_expired(at(10_000)));

        active.push(set(1, 1000));
        assert_eq!(active.state(), GestureState::Accumulating);
        assert_eq!(active.time_remaining(at(1200)), Duration::from_millis(300));
        assert!(!active.is_expired(at(1499)));
        assert!(active.is_expired(at(1500)));

        active.set_widget_gesturing(true);
        assert!(!active.is_expired(at(5000)));
        active.set_widget_gesturing(false);
        assert!(active.is_expired(at(5000)));
    }

    #[test]
    fn take_resets_to_idle() {
        let mut active = ActiveGesture::default();
        active.push(toggle(0));
        active.push(toggle(1));
        assert!(active.gesture().is_empty());
        assert!(active.is_active());
        let id = StorePath::new("/flag").id();
        active.touch([id], at(1));

        let (gesture, updates) = active.take();
        assert!(gesture.is_empty());
        assert_eq!(updates.get(&id), Some(&at(1)));
        assert_eq!(active.state(), GestureState::Idle);
        assert!(active.updates().is_empty());
    }
}
