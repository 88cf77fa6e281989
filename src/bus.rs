use std::{
    any::Any,
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
};

use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, trace, warn};

use crate::{
    Error, Event, EventName, Failure, Listener, ListenerId, Result,
    internal::{Entry, IdAllocator, Registry},
};

/// In-process publish/subscribe hub.
///
/// - Subscribe with `register(name, listener)`; keep the returned
///   [`ListenerId`] to `unregister` later.
/// - Notify with `dispatch(&event)` (sequential, registration order) or
///   `dispatch_concurrent(&event)` (one task per listener, join all).
/// - `raise(name, payload)` is the one-line producer surface: construct and
///   sequentially dispatch in one call.
///
/// The bus is a cheap, cloneable handle over shared state; clones observe the
/// same registry. Registration, removal, and dispatch may all happen
/// concurrently: mutations are serialized by a lock, and dispatch operates on
/// the snapshot resolved at dispatch start. A listener added mid-dispatch is
/// not invoked by that dispatch; a listener removed mid-dispatch may see at
/// most one more invocation.
///
/// No lock is held while listeners run, so a listener may itself register,
/// unregister, or dispatch on the same bus without deadlocking.
///
/// See also: [`Listener`], [`Event`].
#[derive(Clone, Default)]
pub struct EventBus {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    registry: Mutex<Registry>,
    ids: IdAllocator,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a listener to an event name.
    ///
    /// Allocates a fresh id, assigns it to the subscription, and appends the
    /// listener to the name's sequence. Never fails: there is no duplicate
    /// detection, so registering the same listener value twice means it will
    /// be invoked twice per dispatch.
    pub fn register<N>(&self, name: N, listener: Arc<dyn Listener>) -> ListenerId
    where
        N: Into<EventName>,
    {
        let name = name.into();
        let id = self.shared.ids.allocate();
        self.lock_registry().push(name.clone(), Entry { id, listener });
        debug!(event = %name, listener = %id, "listener registered");
        id
    }

    /// Batch form of [`register`](EventBus::register): each listener gets its
    /// own id; all are appended in the order given.
    pub fn register_all<N, I>(&self, name: N, listeners: I) -> Vec<ListenerId>
    where
        N: Into<EventName>,
        I: IntoIterator<Item = Arc<dyn Listener>>,
    {
        let name = name.into();
        listeners
            .into_iter()
            .map(|listener| self.register(name.clone(), listener))
            .collect()
    }

    /// Subscribe an async closure; see [`listener::from_fn`](crate::listener::from_fn).
    pub fn register_fn<N, F, Fut>(&self, name: N, f: F) -> ListenerId
    where
        N: Into<EventName>,
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.register(name, crate::listener::from_fn(f))
    }

    /// Remove the subscription with the given id and free the id.
    ///
    /// Removal is order-preserving: the remaining listeners for the name keep
    /// their relative order, so sequential dispatch order stays stable.
    /// Unregistering an unknown name or id is a silent no-op.
    pub fn unregister<N>(&self, name: N, id: ListenerId)
    where
        N: Into<EventName>,
    {
        let name = name.into();
        let removed = self.lock_registry().remove(&name, id);
        if removed {
            self.shared.ids.free(id);
            debug!(event = %name, listener = %id, "listener removed");
        }
    }

    /// Number of listeners currently subscribed to a name.
    pub fn listener_count<N>(&self, name: N) -> usize
    where
        N: Into<EventName>,
    {
        self.lock_registry().count(&name.into())
    }

    /// Invoke every listener subscribed to the event's name, sequentially and
    /// in registration order, on the calling task. Returns after the last
    /// listener has returned; a name with no listeners is a no-op.
    ///
    /// A listener error stops the loop and propagates to the caller; later
    /// listeners are not invoked. Callers that need delivery to continue past
    /// a failing listener should use
    /// [`dispatch_concurrent`](EventBus::dispatch_concurrent), which isolates
    /// failures.
    pub async fn dispatch(&self, event: &Event) -> Result<()> {
        let entries = self.resolve(event.name());
        trace!(event = %event.name(), listeners = entries.len(), "dispatching");
        for entry in entries {
            entry.listener.handle(event).await?;
        }
        Ok(())
    }

    /// Invoke every listener subscribed to the event's name concurrently, one
    /// task per listener, and wait for all of them to finish before
    /// returning. No ordering guarantee among invocations. The fan-out is
    /// unbounded; listener counts per name are expected to be small.
    ///
    /// Failures are isolated: an erroring or panicking listener does not
    /// prevent the others from completing. When any listener failed, the
    /// result is [`Error::Fanout`] carrying the id and error of each failed
    /// invocation.
    pub async fn dispatch_concurrent(&self, event: &Event) -> Result<()> {
        let entries = self.resolve(event.name());
        trace!(event = %event.name(), listeners = entries.len(), "dispatching concurrently");
        if entries.is_empty() {
            return Ok(());
        }

        let total = entries.len();
        let mut tasks: Vec<(ListenerId, JoinHandle<Result<()>>)> = Vec::with_capacity(total);
        for entry in entries {
            let event = event.clone();
            let task = tokio::spawn(async move { entry.listener.handle(&event).await });
            tasks.push((entry.id, task));
        }

        let mut failures = Vec::new();
        for (listener, task) in tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => failures.push(Failure { listener, error }),
                Err(join_error) => failures.push(Failure {
                    listener,
                    error: Error::ListenerPanic(panic_message(join_error)),
                }),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            warn!(
                event = %event.name(),
                failed = failures.len(),
                total,
                "concurrent dispatch completed with failures"
            );
            Err(Error::Fanout { total, failures })
        }
    }

    /// Construct an event and sequentially dispatch it in one call.
    pub async fn raise<N>(&self, name: N, payload: impl Any + Send + Sync) -> Result<()>
    where
        N: Into<EventName>,
    {
        self.dispatch(&Event::new(name, payload)).await
    }

    /// Snapshot the listener sequence for a name. The lock is released before
    /// any listener runs.
    fn resolve(&self, name: &EventName) -> Vec<Entry> {
        self.lock_registry().snapshot(name)
    }

    fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        self.shared.registry.lock().expect("registry lock poisoned")
    }
}

fn panic_message(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }
    let payload = error.into_panic();
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_listener(count: Arc<AtomicUsize>) -> Arc<dyn Listener> {
        crate::listener::from_fn(move |_| {
            let count = count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_dispatch_invokes_each_listener_once() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.register("ping", counting_listener(count.clone()));
        bus.register("ping", counting_listener(count.clone()));

        bus.dispatch(&Event::new("ping", ())).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dispatch_without_listeners_is_noop() {
        let bus = EventBus::new();
        bus.dispatch(&Event::new("nobody.home", ())).await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_runs_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let order = order.clone();
            bus.register_fn("seq", move |_| {
                let order = order.clone();
                async move {
                    order.lock().unwrap().push(i);
                    Ok(())
                }
            });
        }

        bus.dispatch(&Event::new("seq", ())).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_order_survives_removal() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut ids = Vec::new();
        for i in 0..4 {
            let order = order.clone();
            ids.push(bus.register_fn("seq", move |_| {
                let order = order.clone();
                async move {
                    order.lock().unwrap().push(i);
                    Ok(())
                }
            }));
        }

        bus.unregister("seq", ids[1]);
        bus.dispatch(&Event::new("seq", ())).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec![0, 2, 3]);
    }

    #[tokio::test]
    async fn test_names_are_isolated() {
        let bus = EventBus::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        bus.register("a", counting_listener(a.clone()));
        bus.register("b", counting_listener(b.clone()));

        bus.dispatch(&Event::new("a", ())).await.unwrap();
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_register_then_unregister_leaves_nothing() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let id = bus.register("once", counting_listener(count.clone()));
        bus.unregister("once", id);

        assert_eq!(bus.listener_count("once"), 0);
        bus.dispatch(&Event::new("once", ())).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unregister_unknown_id_is_noop() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let id = bus.register("known", counting_listener(count.clone()));
        bus.unregister("known", ListenerId::new(id.raw() + 1000));
        bus.unregister("unknown", id);

        assert_eq!(bus.listener_count("known"), 1);
    }

    #[tokio::test]
    async fn test_register_all_appends_in_order_with_distinct_ids() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let ids = bus.register_all(
            "batch",
            vec![
                counting_listener(count.clone()),
                counting_listener(count.clone()),
                counting_listener(count.clone()),
            ],
        );

        assert_eq!(ids.len(), 3);
        assert!(ids[0] < ids[1] && ids[1] < ids[2]);
        assert_eq!(bus.listener_count("batch"), 3);
    }

    #[tokio::test]
    async fn test_dispatch_stops_at_first_failure() {
        let bus = EventBus::new();
        let invoked = Arc::new(AtomicUsize::new(0));
        bus.register_fn("fragile", |_| async { Err(Error::listener("boom")) });
        bus.register("fragile", counting_listener(invoked.clone()));

        let result = bus.dispatch(&Event::new("fragile", ())).await;
        assert!(matches!(result, Err(Error::Listener(_))));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_same_listener_registered_twice_runs_twice() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let listener = counting_listener(count.clone());
        let first = bus.register("dup", listener.clone());
        let second = bus.register("dup", listener);
        assert_ne!(first, second);

        bus.dispatch(&Event::new("dup", ())).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_raise_passes_payload_through() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        bus.register_fn("user.created", move |event| {
            let sink = sink.clone();
            async move {
                *sink.lock().unwrap() = event.payload_as::<u64>().copied();
                Ok(())
            }
        });

        bus.raise("user.created", 42u64).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(42));
    }
}
