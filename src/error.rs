use std::sync::Arc;

use crate::ListenerId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A handler reported a failure while processing an event.
    #[error("Listener failed: {0}")]
    Listener(Arc<str>),

    /// A fanned-out listener task panicked.
    #[error("Listener panicked: {0}")]
    ListenerPanic(String),

    /// Aggregate outcome of a concurrent dispatch in which some listeners
    /// failed. The remaining listeners still ran to completion; `failures`
    /// names the ones that did not.
    #[error("{} of {total} listeners failed during concurrent dispatch", .failures.len())]
    Fanout {
        total: usize,
        failures: Vec<Failure>,
    },
}

impl Error {
    /// Convenience constructor for handlers reporting their own failures.
    pub fn listener(msg: impl Into<Arc<str>>) -> Self {
        Error::Listener(msg.into())
    }
}

/// One failed listener invocation within a concurrent dispatch.
#[derive(Debug)]
pub struct Failure {
    pub listener: ListenerId,
    pub error: Error,
}
