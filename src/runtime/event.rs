use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::runtime::action::{Action, ResumeAction};
use crate::runtime::refs::NodeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    None,
    Message,
    Signal,
    User,
    Manual,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::None => "none",
            EventKind::Message => "message",
            EventKind::Signal => "signal",
            EventKind::User => "user",
            EventKind::Manual => "manual",
            EventKind::Error => "error",
        };
        f.write_str(s)
    }
}

/// A named occurrence. Equality is the subscription key `(group, kind, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub group: String,
    pub name: String,
}

impl Event {
    pub fn new(kind: EventKind, group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            group: group.into(),
            name: name.into(),
        }
    }

    /// The event that starts a process through its none start event.
    pub fn none(group: impl Into<String>, process_id: impl Into<String>) -> Self {
        Self::new(EventKind::None, group, process_id)
    }

    pub fn message(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EventKind::Message, group, name)
    }

    pub fn signal(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EventKind::Signal, group, name)
    }

    pub fn user(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EventKind::User, group, name)
    }

    pub fn manual(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EventKind::Manual, group, name)
    }

    pub fn error(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EventKind::Error, group, name)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} event '{}' in group '{}'", self.kind, self.name, self.group)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub node_ref: NodeRef,
    /// Removed after the first delivery.
    pub consumable: bool,
}

/// Subscription table mapping events to waiting node references.
pub trait EventRegistry: Send + Sync {
    /// Subscriptions in registration order.
    fn get_subscriptions(&self, event: &Event) -> Vec<Subscription>;
    fn create_subscription(&self, event: &Event, node_ref: NodeRef, consumable: bool);
    /// Removing an absent subscription is a no-op.
    fn delete_subscription(&self, event: &Event, node_ref: &NodeRef);
}

#[derive(Default)]
pub struct InMemoryEventRegistry {
    subscriptions: DashMap<Event, Vec<Subscription>>,
}

impl InMemoryEventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventRegistry for InMemoryEventRegistry {
    fn get_subscriptions(&self, event: &Event) -> Vec<Subscription> {
        self.subscriptions
            .get(event)
            .map(|subs| subs.value().clone())
            .unwrap_or_default()
    }

    fn create_subscription(&self, event: &Event, node_ref: NodeRef, consumable: bool) {
        let mut subs = self.subscriptions.entry(event.clone()).or_default();
        if let Some(existing) = subs.iter_mut().find(|s| s.node_ref == node_ref) {
            existing.consumable = consumable;
        } else {
            debug!(%event, node = %node_ref, consumable, "subscription created");
            subs.push(Subscription { node_ref, consumable });
        }
    }

    fn delete_subscription(&self, event: &Event, node_ref: &NodeRef) {
        let now_empty = match self.subscriptions.get_mut(event) {
            Some(mut subs) => {
                subs.retain(|s| &s.node_ref != node_ref);
                subs.is_empty()
            }
            None => return,
        };
        // guard dropped above; removing re-locks the shard
        if now_empty {
            self.subscriptions.remove_if(event, |_, subs| subs.is_empty());
        }
    }
}

/// Turns an event into follow-up actions for its subscribers.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: &Event, registry: &dyn EventRegistry) -> Vec<Action>;
}

/// Resumes every subscriber in registration order.
#[derive(Debug, Default)]
pub struct DefaultEventEmitter;

impl EventEmitter for DefaultEventEmitter {
    fn emit(&self, event: &Event, registry: &dyn EventRegistry) -> Vec<Action> {
        let subscriptions = registry.get_subscriptions(event);
        debug!(%event, subscribers = subscriptions.len(), "emitting event");

        subscriptions
            .into_iter()
            .map(|sub| {
                if sub.consumable {
                    registry.delete_subscription(event, &sub.node_ref);
                }
                Action::Resume(ResumeAction { reference: sub.node_ref })
            })
            .collect()
    }
}
