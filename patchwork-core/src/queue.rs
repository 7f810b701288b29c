//! Multi-producer, single-consumer action queue.
//!
//! Producers on any thread hold a cloned [`ActionSender`]; the engine owns the
//! one [`ActionReceiver`] and drains it once per tick. The channel is
//! unbounded: enqueueing never blocks and never drops while the engine lives.

use std::time::SystemTime;

use crossbeam_channel::{Receiver, Sender};

use patchwork_types::{Action, ActionMoment, Dispatcher};

/// Create a paired (sender, receiver).
pub fn action_queue() -> (ActionSender, ActionReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ActionSender { tx }, ActionReceiver { rx })
}

/// Producer handle. Cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct ActionSender {
    tx: Sender<ActionMoment>,
}

impl ActionSender {
    /// Queue `action`, stamped with the current time.
    pub fn enqueue(&self, action: Action) {
        self.enqueue_at(action, SystemTime::now());
    }

    /// Queue `action` with a caller-supplied timestamp.
    pub fn enqueue_at(&self, action: Action, queued_at: SystemTime) {
        if let Err(e) = self.tx.send(ActionMoment::new(action, queued_at)) {
            log::warn!(target: "queue", "action dropped, engine is gone: {:?}", e.into_inner().action);
        }
    }
}

impl Dispatcher for ActionSender {
    fn dispatch(&self, action: Action) {
        self.enqueue(action);
    }
}

/// Consumer handle, owned by the engine.
#[derive(Debug)]
pub struct ActionReceiver {
    rx: Receiver<ActionMoment>,
}

impl ActionReceiver {
    /// Everything queued right now, in enqueue order per producer.
    pub fn drain_all(&self) -> Vec<ActionMoment> {
        self.rx.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwork_types::{PrimitiveAction, StorePath};
    use std::thread;
    use std::time::{Duration, UNIX_EPOCH};

    fn set(value: i32) -> Action {
        PrimitiveAction::SetInt {
            path: StorePath::new("/n"),
            value,
        }
        .into()
    }

    #[test]
    fn drains_in_order_and_empties() {
        let (tx, rx) = action_queue();
        tx.enqueue(set(1));
        tx.dispatch(set(2));
        let at = UNIX_EPOCH + Duration::from_secs(5);
        tx.enqueue_at(set(3), at);
        assert_eq!(rx.len(), 3);
        let drained = rx.drain_all();
        let actions: Vec<_> = drained.iter().map(|m| m.action.clone()).collect();
        assert_eq!(actions, vec![set(1), set(2), set(3)]);
        assert_eq!(drained[2].queued_at, at);
        assert!(rx.is_empty());
        assert!(rx.drain_all().is_empty());
    }

    #[test]
    fn concurrent_producers_lose_nothing() {
        let (tx, rx) = action_queue();
        let handles: Vec<_> = (0..4)
            .map(|producer| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        tx.enqueue(set(producer * 1000 + i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let drained = rx.drain_all();
        assert_eq!(drained.len(), 1000);
        for producer in 0..4 {
            let mine: Vec<i32> = drained
                .iter()
                .filter_map(|m| match &m.action {
                    Action::Store(patchwork_types::StoreAction::Primitive(
                        PrimitiveAction::SetInt { value, .. },
                    )) if value / 1000 == producer => Some(*value),
                    _ => None,
                })
                .collect();
            let expected: Vec<i32> = (0..250).map(|i| producer * 1000 + i).collect();
            assert_eq!(mine, expected);
        }
    }

    #[test]
    fn send_after_receiver_dropped_does_not_panic() {
        let (tx, rx) = action_queue();
        drop(rx);
        tx.enqueue(set(1));
    }
}
