use std::{any::Any, fmt, ops::Deref, sync::Arc};

/// Identity of an event kind.
///
/// Two events are "the same kind" iff their names compare equal -- exact
/// string match, no normalization, no case folding. The name is the sole key
/// used for listener lookup and is always supplied explicitly by the
/// producer; it is never inferred from the payload's runtime type.
///
/// Cheap to clone (an `Arc<str>` internally), so it can be stored both as a
/// registry key and inside every dispatched [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventName(Arc<str>);

impl EventName {
    /// The name as a plain string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        Self(Arc::from(name))
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<Arc<str>> for EventName {
    fn from(name: Arc<str>) -> Self {
        Self(name)
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for EventName {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Opaque event payload.
///
/// Shared via `Arc` so an event can cross task boundaries during fan-out
/// without copying the payload itself.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// An immutable (name, payload) value describing something that happened.
///
/// Constructed by a producer immediately before dispatch and not retained by
/// the bus afterwards (there is no event store). The name is fixed at
/// construction; listeners receive the event as-is and use
/// [`payload_as`](Event::payload_as) for typed access to the payload.
#[derive(Clone)]
pub struct Event {
    name: EventName,
    payload: Payload,
}

impl Event {
    /// Create an event from an owned payload value.
    pub fn new<N>(name: N, payload: impl Any + Send + Sync) -> Self
    where
        N: Into<EventName>,
    {
        Self {
            name: name.into(),
            payload: Arc::new(payload),
        }
    }

    /// Create an event from an already shared payload.
    ///
    /// Useful when the same payload is raised under several names or kept
    /// around by the producer.
    pub fn from_payload<N>(name: N, payload: Payload) -> Self
    where
        N: Into<EventName>,
    {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// The event's identity; the sole key used for listener lookup.
    #[inline]
    pub fn name(&self) -> &EventName {
        &self.name
    }

    /// The raw payload handle.
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Typed view of the payload, or `None` when the payload is of a
    /// different type.
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The payload is opaque; only the identity is printable.
        f.debug_struct("Event")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
