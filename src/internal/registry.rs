use std::{collections::HashMap, sync::Arc};

use crate::{EventName, Listener, ListenerId};

/// One subscription: a listener plus the id it was assigned at registration.
#[derive(Clone)]
pub(crate) struct Entry {
    pub id: ListenerId,
    pub listener: Arc<dyn Listener>,
}

/// Mapping from event name to its ordered listener sequence.
///
/// Within one name, entries keep insertion order. Removal shifts the
/// remaining entries down (order-preserving), so sequential dispatch order
/// stays stable across removals. A name whose sequence becomes empty is
/// dropped from the map.
///
/// The registry is not synchronized itself; the bus serializes access with
/// its own lock.
#[derive(Default)]
pub(crate) struct Registry {
    listeners: HashMap<EventName, Vec<Entry>>,
}

impl Registry {
    pub fn push(&mut self, name: EventName, entry: Entry) {
        self.listeners.entry(name).or_default().push(entry);
    }

    /// Removes the entry with the given id. Returns `false` when the name or
    /// id is unknown (a no-op, not an error).
    pub fn remove(&mut self, name: &EventName, id: ListenerId) -> bool {
        let Some(entries) = self.listeners.get_mut(name) else {
            return false;
        };
        let Some(pos) = entries.iter().position(|e| e.id == id) else {
            return false;
        };
        entries.remove(pos);
        if entries.is_empty() {
            self.listeners.remove(name);
        }
        true
    }

    /// Current sequence for a name; absent names yield an empty snapshot.
    ///
    /// The clones are `Arc` handles, so mutating the registry after a
    /// snapshot was taken does not affect that snapshot.
    pub fn snapshot(&self, name: &EventName) -> Vec<Entry> {
        self.listeners.get(name).cloned().unwrap_or_default()
    }

    pub fn count(&self, name: &EventName) -> usize {
        self.listeners.get(name).map_or(0, Vec::len)
    }
}
