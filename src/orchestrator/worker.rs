//! Background execution of actor calls.
//!
//! At most one request is outstanding. The actor runs on the tokio blocking
//! pool and hands its reply back through a oneshot channel; the orchestrator
//! checks for it without blocking, or awaits it.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::trace;

use super::OrchestratorError;
use crate::actor::{Actor, ActorError, ChatRequest, DecisionRequest};

type Outcome = Result<String, ActorError>;

/// A unit of work for an actor.
pub enum Job {
    Decide(Arc<dyn Actor>, DecisionRequest),
    Converse(Arc<dyn Actor>, ChatRequest),
}

impl Job {
    fn run(self) -> Outcome {
        match self {
            Job::Decide(actor, request) => actor.decide(&request),
            Job::Converse(actor, request) => actor.converse(&request),
        }
    }
}

/// Single-slot dispatcher for actor requests.
pub struct DecisionWorker {
    handle: Handle,
    in_flight: Option<oneshot::Receiver<Outcome>>,
    ready: Option<Outcome>,
}

fn dropped() -> ActorError {
    ActorError::Provider("actor task ended without replying".into())
}

impl DecisionWorker {
    pub fn new(handle: Handle) -> Self {
        DecisionWorker {
            handle,
            in_flight: None,
            ready: None,
        }
    }

    /// True while a request is running or its result has not been collected.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.ready.is_some()
    }

    /// Starts `job`. Fails if another request is still outstanding.
    pub fn dispatch(&mut self, job: Job) -> Result<(), OrchestratorError> {
        if self.is_busy() {
            return Err(OrchestratorError::RequestInFlight);
        }
        let (tx, rx) = oneshot::channel();
        self.handle.spawn_blocking(move || {
            // The receiver may be gone if the orchestrator was dropped.
            let _ = tx.send(job.run());
        });
        self.in_flight = Some(rx);
        trace!("request dispatched");
        Ok(())
    }

    /// Takes the result if it has arrived. Never blocks.
    pub fn poll(&mut self) -> Option<Outcome> {
        if let Some(outcome) = self.ready.take() {
            return Some(outcome);
        }
        let rx = self.in_flight.as_mut()?;
        match rx.try_recv() {
            Ok(outcome) => {
                self.in_flight = None;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                self.in_flight = None;
                Some(Err(dropped()))
            }
        }
    }

    /// Waits until the outstanding request completes. The result stays
    /// available to the next `poll`.
    pub async fn wait(&mut self) {
        if let Some(rx) = self.in_flight.take() {
            self.ready = Some(rx.await.unwrap_or_else(|_| Err(dropped())));
        }
    }
}
