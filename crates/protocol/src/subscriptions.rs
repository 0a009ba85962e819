//! In-process subscription bookkeeping for the publish/subscribe channel.
//!
//! [`SubscriptionRegistry`] owns the topic → callback table and status
//! listeners. A transport (MQTT, WebSocket, test harness) mirrors
//! [`SubscriptionRegistry::active_topics`] to its broker and feeds delivered
//! events into [`SubscriptionRegistry::dispatch`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::{
    ConnectionState, ConnectionStatus, StatusCallback, SubscriptionId, Topic, TopicCallback,
    TopicSubscriber,
};

#[derive(Default)]
struct RegistryState {
    topics: HashMap<Topic, Vec<(SubscriptionId, TopicCallback)>>,
    status: Vec<(SubscriptionId, StatusCallback)>,
}

/// Thread-safe [`TopicSubscriber`] that fans delivered events out to callbacks.
///
/// Callbacks are always invoked after the internal lock is released, so a
/// callback may subscribe or unsubscribe without deadlocking.
#[derive(Default)]
pub struct SubscriptionRegistry {
    state: Mutex<RegistryState>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Topics with at least one subscriber, in no particular order.
    pub fn active_topics(&self) -> Vec<Topic> {
        self.lock().topics.keys().cloned().collect()
    }

    /// Delivers `payload` to every callback registered for `topic`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn dispatch(&self, topic: &Topic, payload: &[u8]) -> usize {
        let callbacks: Vec<TopicCallback> = self
            .lock()
            .topics
            .get(topic)
            .map(|subs| subs.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default();
        for callback in &callbacks {
            callback(topic, payload);
        }
        callbacks.len()
    }

    /// Notifies every status listener of `status`.
    pub fn publish_status(&self, status: &ConnectionStatus) {
        let callbacks: Vec<StatusCallback> =
            self.lock().status.iter().map(|(_, cb)| cb.clone()).collect();
        for callback in &callbacks {
            callback(status);
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TopicSubscriber for SubscriptionRegistry {
    fn subscribe(&self, topic: Topic, callback: TopicCallback) -> SubscriptionId {
        let id = SubscriptionId::new_random();
        let first = {
            let mut state = self.lock();
            let subs = state.topics.entry(topic.clone()).or_default();
            subs.push((id, callback));
            subs.len() == 1
        };
        debug!(topic = %topic, subscription = %id, "subscribed");
        if first {
            self.publish_status(&ConnectionStatus::new(
                ConnectionState::SubscriptionAdded,
                topic.as_str(),
            ));
        }
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut emptied = None;
        let removed = {
            let mut state = self.lock();
            let status_len = state.status.len();
            state.status.retain(|(sub, _)| *sub != id);
            if state.status.len() != status_len {
                true
            } else {
                let owner = state
                    .topics
                    .iter()
                    .find(|(_, subs)| subs.iter().any(|(sub, _)| *sub == id))
                    .map(|(topic, _)| topic.clone());
                match owner {
                    Some(topic) => {
                        if let Some(subs) = state.topics.get_mut(&topic) {
                            subs.retain(|(sub, _)| *sub != id);
                            if subs.is_empty() {
                                state.topics.remove(&topic);
                                emptied = Some(topic);
                            }
                        }
                        true
                    }
                    None => false,
                }
            }
        };
        if let Some(topic) = emptied {
            self.publish_status(&ConnectionStatus::new(
                ConnectionState::SubscriptionRemoved,
                topic.as_str(),
            ));
        }
        removed
    }

    fn status_changed(&self, callback: StatusCallback) -> SubscriptionId {
        let id = SubscriptionId::new_random();
        self.lock().status.push((id, callback));
        id
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, TopicCallback) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let callback: TopicCallback = Arc::new(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (hits, callback)
    }

    #[test]
    fn dispatch_reaches_only_matching_topic() {
        let registry = SubscriptionRegistry::new();
        let (latest_hits, latest) = counter();
        let (messages_hits, messages) = counter();
        registry.subscribe(Topic::milestones_latest(), latest);
        registry.subscribe(Topic::messages(), messages);

        assert_eq!(registry.dispatch(&Topic::milestones_latest(), b"{}"), 1);
        assert_eq!(latest_hits.load(Ordering::SeqCst), 1);
        assert_eq!(messages_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_removes_topic_when_last_subscriber_leaves() {
        let registry = SubscriptionRegistry::new();
        let (_, first) = counter();
        let (_, second) = counter();
        let a = registry.subscribe(Topic::messages(), first);
        let b = registry.subscribe(Topic::messages(), second);

        assert!(registry.unsubscribe(a));
        assert_eq!(registry.active_topics(), vec![Topic::messages()]);
        assert!(registry.unsubscribe(b));
        assert!(registry.active_topics().is_empty());
        assert!(!registry.unsubscribe(b));
    }

    #[test]
    fn status_listeners_see_subscription_changes() {
        let registry = SubscriptionRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener = registry.status_changed(Arc::new(move |status| {
            sink.lock().unwrap().push(status.state);
        }));

        let (_, callback) = counter();
        let id = registry.subscribe(Topic::milestones_confirmed(), callback);
        registry.unsubscribe(id);
        registry.publish_status(&ConnectionStatus::new(ConnectionState::Connected, "broker"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ConnectionState::SubscriptionAdded,
                ConnectionState::SubscriptionRemoved,
                ConnectionState::Connected,
            ]
        );
        assert!(registry.unsubscribe(listener));
    }

    #[test]
    fn callbacks_may_resubscribe_without_deadlock() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let inner = registry.clone();
        registry.subscribe(
            Topic::messages(),
            Arc::new(move |_, _| {
                let (_, callback) = counter();
                inner.subscribe(Topic::messages_referenced(), callback);
            }),
        );

        registry.dispatch(&Topic::messages(), b"");
        assert_eq!(registry.active_topics().len(), 2);
    }
}
