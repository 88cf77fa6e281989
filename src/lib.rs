//! Herald - in-process publish/subscribe event dispatch
//!
//! A producer raises a named event carrying an arbitrary payload; zero or
//! more registered listeners are invoked without producer and listener
//! knowing about each other. Dispatch is immediate and in-memory, either
//! sequential on the calling task or fanned out one task per listener.
//!
//! See `demos/user_created.rs`.

mod bus;
mod error;
mod event;
pub mod listener;

mod internal;

pub use bus::EventBus;
pub use error::{Error, Failure};
pub use event::{Event, EventName, Payload};
pub use listener::{Listener, ListenerId};

pub type Result<T = ()> = std::result::Result<T, Error>;
