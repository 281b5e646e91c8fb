//! The run driver and the caller-facing run handle.

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};

use crate::app::{App, EngineError, RunContext};
use crate::runtimes::{AgentConfig, RunRegistry};
use crate::state::AgentState;
use crate::streaming::{EventDrain, Signal, StopFlag, StreamEvent, StreamSender};

/// Static message streamed when routing failed for the turn.
pub const ROUTING_FAILURE_MESSAGE: &str =
    "I'm sorry, I could not work out how to handle that request.";

/// Static message streamed when the run failed for any other reason.
pub const RUN_FAILURE_MESSAGE: &str =
    "I'm sorry, something went wrong while processing your request.";

#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
    #[error(transparent)]
    #[diagnostic(code(modiste::run::engine))]
    Engine(#[from] EngineError),

    #[error("run task join error: {0}")]
    #[diagnostic(code(modiste::run::join))]
    Join(#[from] JoinError),
}

/// Handle for one in-flight conversational turn.
///
/// Owns the consumer side of the run's streaming channel plus the spawned
/// execution task. Dropping the handle drops the drain; producers then fail
/// fast instead of blocking on a full buffer.
pub struct RunHandle {
    run_id: String,
    drain: EventDrain,
    stop: StopFlag,
    join: Option<JoinHandle<Result<AgentState, EngineError>>>,
}

impl RunHandle {
    pub(crate) fn new(
        run_id: String,
        drain: EventDrain,
        stop: StopFlag,
        join: JoinHandle<Result<AgentState, EngineError>>,
    ) -> Self {
        Self {
            run_id,
            drain,
            stop,
            join: Some(join),
        }
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Next event in push order; `None` once the completion signal has been
    /// drained (or the run was cancelled and the buffer is empty).
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.drain.next().await
    }

    /// Next event as one JSON line, the service's wire encoding.
    pub async fn next_json_line(&mut self) -> Option<String> {
        self.drain.next_json_line().await
    }

    /// Times the drain loop throttled on the high-water mark.
    #[must_use]
    pub fn throttle_pauses(&self) -> u64 {
        self.drain.throttle_pauses()
    }

    #[must_use]
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Abort the underlying run task.
    pub fn abort(&self) {
        if let Some(join) = &self.join {
            join.abort();
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map(JoinHandle::is_finished).unwrap_or(true)
    }

    /// Await the run's terminal state. Call after draining events; the
    /// consumer side stays usable until then.
    pub async fn join(mut self) -> Result<AgentState, RunError> {
        let join = self
            .join
            .take()
            .expect("join handle present until joined");
        Ok(join.await??)
    }
}

/// Drive one run to completion and finalize its stream.
///
/// The completion signal is emitted exactly once on every path (success,
/// handled failure, routing failure), and the stop flag is set right after,
/// so the consumer's drain always terminates cleanly.
pub(crate) async fn drive(
    app: Arc<App>,
    state: AgentState,
    stream: StreamSender,
    stop: StopFlag,
    config: Arc<AgentConfig>,
    registry: Arc<dyn RunRegistry>,
    run_id: String,
) -> Result<AgentState, EngineError> {
    let _ = stream.push(StreamEvent::signal(Signal::Start)).await;

    let ctx = RunContext {
        stream: stream.clone(),
        config,
    };
    let result = app.invoke(state, ctx).await;

    if let Err(err) = &result {
        tracing::error!(%run_id, error = %err, "run failed");
        let message = if err.is_routing_failure() {
            ROUTING_FAILURE_MESSAGE
        } else {
            RUN_FAILURE_MESSAGE
        };
        let _ = stream.push(StreamEvent::token(message)).await;
    }

    let _ = stream.push(StreamEvent::signal(Signal::End)).await;
    stop.stop();
    registry.remove(&run_id).await;

    tracing::info!(%run_id, ok = result.is_ok(), "run finalized");
    result
}
