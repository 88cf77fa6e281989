use std::{future::Future, sync::Arc};

use async_trait::async_trait;

use crate::{Event, Result};

/// Unique identifier assigned to a listener at registration time.
///
/// Returned by [`EventBus::register`](crate::EventBus::register) and
/// required to unregister that specific subscription later. Ids are issued
/// by a monotonic allocator, so a live id is never reissued to another
/// listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub(crate) fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of behavior invoked with an event when its subscribed name fires.
///
/// Implement this for your handler type and register it with
/// [`EventBus::register`](crate::EventBus::register). The bus holds the
/// listener as `Arc<dyn Listener>`, so one handler value can back several
/// subscriptions. Handlers take `&self`; keep mutable state behind your own
/// synchronization if you need any.
///
/// Return `Ok(())` when processing succeeds, or an error to signal failure.
/// How a failure affects the rest of a dispatch depends on the dispatch mode;
/// see [`EventBus::dispatch`](crate::EventBus::dispatch) and
/// [`EventBus::dispatch_concurrent`](crate::EventBus::dispatch_concurrent).
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &Event) -> Result<()>;
}

/// Wraps an async closure into a shareable [`Listener`].
///
/// The closure receives a clone of the dispatched event (cheap -- the payload
/// is behind an `Arc`).
///
/// # Example
///
/// ```rust,ignore
/// let listener = listener::from_fn(|event| async move {
///     println!("got {}", event.name());
///     Ok(())
/// });
/// bus.register("user.created", listener);
/// ```
pub fn from_fn<F, Fut>(f: F) -> Arc<dyn Listener>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(FnListener(f))
}

struct FnListener<F>(F);

#[async_trait]
impl<F, Fut> Listener for FnListener<F>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, event: &Event) -> Result<()> {
        (self.0)(event.clone()).await
    }
}
