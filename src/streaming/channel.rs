//! Bounded producer/consumer plumbing and the stop flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, timeout};

use super::event::StreamEvent;

/// Pause applied by the drain loop when the backlog crosses the high-water
/// mark, before the next receive.
const THROTTLE_PAUSE: Duration = Duration::from_millis(10);

/// One-shot cancellation/completion flag shared between the run driver, the
/// run registry, and the consumer.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the flag. Idempotent.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Errors from the producer side.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The consumer is gone; nothing can be delivered.
    #[error("streaming channel closed")]
    Closed,
}

/// Producer handle; cheap to clone into concurrent fan-out tasks.
#[derive(Clone)]
pub struct StreamSender {
    tx: flume::Sender<StreamEvent>,
}

impl StreamSender {
    /// Push one event, suspending while the bounded buffer is full.
    ///
    /// Events are never dropped: the await is the backpressure.
    pub async fn push(&self, event: StreamEvent) -> Result<(), StreamError> {
        self.tx
            .send_async(event)
            .await
            .map_err(|_| StreamError::Closed)
    }

    /// Number of events currently buffered.
    #[must_use]
    pub fn backlog(&self) -> usize {
        self.tx.len()
    }
}

/// The single consumer of a run's event stream.
///
/// [`next`](Self::next) polls with a short timeout so the stop flag is
/// observed within one poll interval even when no event arrives; once the
/// flag is set, buffered events are drained and the stream ends.
pub struct EventDrain {
    rx: flume::Receiver<StreamEvent>,
    stop: StopFlag,
    poll_interval: Duration,
    high_water: usize,
    pauses: Arc<AtomicU64>,
}

impl EventDrain {
    /// Next event in push order, or `None` once the stream is finished
    /// (stop flag set and buffer empty, or all producers gone).
    pub async fn next(&mut self) -> Option<StreamEvent> {
        loop {
            if self.rx.len() >= self.high_water {
                self.pauses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    backlog = self.rx.len(),
                    high_water = self.high_water,
                    "drain throttling: backlog over high-water mark"
                );
                sleep(THROTTLE_PAUSE).await;
            }

            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(flume::TryRecvError::Disconnected) => return None,
                Err(flume::TryRecvError::Empty) => {
                    if self.stop.is_stopped() {
                        return None;
                    }
                    match timeout(self.poll_interval, self.rx.recv_async()).await {
                        Ok(Ok(event)) => return Some(event),
                        Ok(Err(_)) => return None,
                        // Poll timeout: loop to re-check the stop flag.
                        Err(_) => continue,
                    }
                }
            }
        }
    }

    /// Next event encoded as a single JSON line, for the wire boundary.
    pub async fn next_json_line(&mut self) -> Option<String> {
        loop {
            let event = self.next().await?;
            match event.to_json_string() {
                Ok(line) => return Some(line),
                Err(err) => {
                    tracing::warn!(error = %err, "dropping unserializable event");
                    continue;
                }
            }
        }
    }

    /// Clone of the stop flag shared with this drain.
    #[must_use]
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Times the drain loop throttled on the high-water mark.
    #[must_use]
    pub fn throttle_pauses(&self) -> u64 {
        self.pauses.load(Ordering::Relaxed)
    }
}

/// Create one run's streaming channel.
///
/// `capacity` bounds the buffer; the high-water mark sits at 80% of it.
/// `poll_interval` bounds how stale the consumer's view of the stop flag
/// can be.
pub fn bounded(capacity: usize, poll_interval: Duration) -> (StreamSender, EventDrain) {
    let capacity = capacity.max(1);
    let (tx, rx) = flume::bounded(capacity);
    let drain = EventDrain {
        rx,
        stop: StopFlag::new(),
        poll_interval,
        high_water: ((capacity * 4) / 5).max(1),
        pauses: Arc::new(AtomicU64::new(0)),
    };
    (StreamSender { tx }, drain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::Signal;

    #[tokio::test]
    async fn events_arrive_in_push_order() {
        let (tx, mut drain) = bounded(8, Duration::from_millis(100));
        for i in 0..3 {
            tx.push(StreamEvent::token(format!("t{i}"))).await.unwrap();
        }
        for i in 0..3 {
            let ev = drain.next().await.unwrap();
            assert_eq!(ev.payload, format!("t{i}"));
        }
    }

    #[tokio::test]
    async fn stop_flag_finishes_drain_after_buffered_events() {
        let (tx, mut drain) = bounded(8, Duration::from_millis(20));
        tx.push(StreamEvent::signal(Signal::End)).await.unwrap();
        drain.stop_flag().stop();

        let ev = drain.next().await.unwrap();
        assert!(ev.is_signal(Signal::End));
        assert!(drain.next().await.is_none());
    }

    #[tokio::test]
    async fn push_to_dropped_drain_errors() {
        let (tx, drain) = bounded(2, Duration::from_millis(10));
        drop(drain);
        let err = tx.push(StreamEvent::token("x")).await;
        assert!(matches!(err, Err(StreamError::Closed)));
    }
}
