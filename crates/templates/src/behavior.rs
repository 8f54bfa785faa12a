use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

use crate::entity::EntityInstance;
use crate::reference::EntityReference;

/// Event delivered to a script listener.
#[derive(Debug, Clone, Copy)]
pub struct ListenerEvent<'a> {
    pub entity_reference: &'a EntityReference,
    pub event: &'a str,
    pub payload: &'a Value,
}

/// Compiled script handler. Shared by every instance it is attached to.
pub type ScriptListener = Rc<dyn Fn(&ListenerEvent<'_>)>;

/// Event name -> handlers, in registration order.
#[derive(Clone, Default)]
pub struct EventListeners {
    by_event: BTreeMap<String, Vec<ScriptListener>>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, event: impl Into<String>, listener: ScriptListener) {
        self.by_event.entry(event.into()).or_default().push(listener);
    }

    pub fn is_empty(&self) -> bool {
        self.by_event.values().all(Vec::is_empty)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.by_event.get(event).map_or(0, Vec::len)
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.by_event.keys().map(String::as_str)
    }

    pub fn extend_from(&mut self, other: &EventListeners) {
        for (event, listeners) in &other.by_event {
            self.by_event
                .entry(event.clone())
                .or_default()
                .extend(listeners.iter().cloned());
        }
    }

    /// Invokes every handler bound to `event`; returns how many ran.
    pub fn emit(&self, entity_reference: &EntityReference, event: &str, payload: &Value) -> usize {
        let Some(listeners) = self.by_event.get(event) else {
            return 0;
        };
        let delivered = ListenerEvent {
            entity_reference,
            event,
            payload,
        };
        for listener in listeners {
            listener(&delivered);
        }
        listeners.len()
    }
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.by_event
                    .iter()
                    .map(|(event, listeners)| (event, listeners.len())),
            )
            .finish()
    }
}

/// Script listeners registered per entity reference.
#[derive(Debug, Default, Clone)]
pub struct BehaviorManager {
    listeners: HashMap<EntityReference, EventListeners>,
}

impl BehaviorManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(
        &mut self,
        reference: EntityReference,
        event: impl Into<String>,
        listener: ScriptListener,
    ) {
        let event = event.into();
        trace!(entity_reference = %reference, event = %event, "script_listener_added");
        self.listeners
            .entry(reference)
            .or_default()
            .on(event, listener);
    }

    pub fn has_listeners(&self, reference: &EntityReference) -> bool {
        self.listeners
            .get(reference)
            .is_some_and(|listeners| !listeners.is_empty())
    }

    pub fn listeners(&self, reference: &EntityReference) -> Option<&EventListeners> {
        self.listeners.get(reference)
    }

    /// Binds every handler registered for `reference` onto `entity`.
    pub fn attach<E: EntityInstance>(&self, reference: &EntityReference, entity: &mut E) {
        if let Some(listeners) = self.listeners.get(reference) {
            entity.listeners_mut().extend_from(listeners);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, ScriptListener) {
        let seen = Rc::new(RefCell::new(Vec::<String>::new()));
        let sink = Rc::clone(&seen);
        let listener: ScriptListener = Rc::new(move |event: &ListenerEvent<'_>| {
            sink.borrow_mut()
                .push(format!("{}:{}:{}", event.entity_reference, event.event, event.payload));
        });
        (seen, listener)
    }

    #[test]
    fn emit_runs_handlers_for_matching_event_only() {
        let (seen, listener) = recorder();
        let mut listeners = EventListeners::new();
        listeners.on("spawn", Rc::clone(&listener));
        listeners.on("spawn", listener);

        let reference = EntityReference::new("limbo", 1);
        assert_eq!(listeners.emit(&reference, "spawn", &json!(1)), 2);
        assert_eq!(listeners.emit(&reference, "death", &json!(null)), 0);
        assert_eq!(seen.borrow().as_slice(), ["limbo:1:spawn:1", "limbo:1:spawn:1"]);
    }

    #[test]
    fn has_listeners_is_per_exact_reference() {
        let (_, listener) = recorder();
        let mut manager = BehaviorManager::new();
        manager.add_listener(EntityReference::new("limbo", 1), "spawn", listener);

        assert!(manager.has_listeners(&EntityReference::new("limbo", 1)));
        assert!(!manager.has_listeners(&EntityReference::new("limbo", 2)));
        assert!(!manager.has_listeners(&EntityReference::new("craft", 1)));
    }

    #[test]
    fn extend_from_shares_handlers() {
        let (seen, listener) = recorder();
        let mut source = EventListeners::new();
        source.on("hit", listener);

        let mut first = EventListeners::new();
        let mut second = EventListeners::new();
        first.extend_from(&source);
        second.extend_from(&source);

        let reference = EntityReference::new("limbo", 4);
        first.emit(&reference, "hit", &json!("a"));
        second.emit(&reference, "hit", &json!("b"));
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(first.listener_count("hit"), 1);
        assert_eq!(first.events().collect::<Vec<_>>(), vec!["hit"]);
    }
}
