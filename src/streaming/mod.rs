//! The bounded streaming pipe between node execution and the caller.
//!
//! One [`StreamSender`]/[`EventDrain`] pair is created per run. Producers
//! (any node, including concurrent fan-out tasks inside a node) push
//! [`StreamEvent`]s through a single bounded queue; the one consumer drains
//! them in exact push-completion order. Backpressure is primarily the
//! bounded `push` itself (a full buffer suspends producers), with a
//! consumer-side high-water pause as a secondary safeguard. A [`StopFlag`]
//! makes the drain finite: once set, the consumer empties what is buffered
//! and terminates.

mod channel;
mod event;

pub use channel::{EventDrain, StopFlag, StreamError, StreamSender, bounded};
pub use event::{EventKind, Signal, StreamEvent};
