//! Sends solve requests to the engine worker and merges replies into the session.
//!
//! A dispatch translates the puzzle into engine naming, flags the session as
//! pending and posts one request. Replies are picked up by
//! [`SolverDispatcher::poll`] on the interactive thread. Only the reply whose
//! id matches the outstanding request, issued in the current session epoch,
//! is merged; anything else is discarded.
//!
//! At most one request is outstanding. Dispatching again supersedes the
//! previous request, whose ticket resolves with [`SolveError::Superseded`].
//! A superseded or timed-out request may still be running, so its worker is
//! retired and the next request goes to a fresh thread.
//! Merging a reply clears the pending flag and never touches the solved flag;
//! callers compare the result with the live grid and mark the session solved
//! themselves.

use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use futures_channel::oneshot;
use pencilmark_core::{
    Constraints, Grid, ModelError, SolverType, SolvingEngine, TranslationError,
    field_names::constraints_to_engine,
    wire::{
        CheckVerdict, EngineCall, EngineOutcome, EngineReply, EngineRequest, GridPayload,
        RequestId, SolveTrace,
    },
};
use portable_atomic::{AtomicU64, Ordering};
use serde::Serialize;

use self::worker::Worker;
use crate::store::SessionStore;

mod worker;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    RequestId(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
}

/// Errors that can occur while scheduling or receiving background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum WorkError {
    /// Failed to start the worker thread.
    #[display("worker initialization failed")]
    WorkerInitFailed,
    /// Failed to serialize a request payload.
    #[display("failed to serialize worker payload")]
    SerializationFailed,
    /// Failed to deserialize a reply payload.
    #[display("failed to deserialize worker payload")]
    DeserializationFailed,
    /// The worker thread is gone.
    #[display("worker disconnected")]
    WorkerDisconnected,
}

/// Why a solve request produced no result.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    derive_more::Display,
    derive_more::Error,
    derive_more::From,
    derive_more::IsVariant,
)]
pub enum SolveError {
    /// The puzzle could not be expressed in engine naming.
    #[display("failed to translate constraints: {_0}")]
    Translation(#[from] TranslationError),
    /// The grid does not fit the puzzle.
    #[display("invalid grid: {_0}")]
    Model(#[from] ModelError),
    /// The worker could not carry the request.
    #[display("worker error: {_0}")]
    Work(#[from] WorkError),
    /// The engine answered with a failure.
    #[display("engine failed: {message}")]
    Engine {
        /// Failure message from the engine.
        message: String,
    },
    /// The engine answered with an outcome of the wrong kind.
    #[display("engine replied with an unexpected outcome")]
    UnexpectedReply,
    /// No reply arrived in time.
    #[display("no reply within {timeout:?}")]
    TimedOut {
        /// The deadline that expired.
        timeout: Duration,
    },
    /// A newer request replaced this one.
    #[display("superseded by request {by}")]
    Superseded {
        /// The replacing request.
        by: RequestId,
    },
    /// The session was reset before the reply arrived.
    #[display("session was reset")]
    SessionReset,
    /// The session is already solved.
    #[display("session is already solved")]
    SessionSolved,
}

/// What a request asked the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SolveKind {
    /// Solve from the givens with the named strategy.
    Solve(SolverType),
    /// Check the player's grid.
    Check,
}

/// A successful engine result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "data")]
pub enum SolveResult {
    /// A complete solution.
    Solution(Grid),
    /// Deduction steps, with the solution if they reached one.
    Trace(SolveTrace),
    /// Verdict on a checked grid.
    Verdict(CheckVerdict),
}

impl SolveResult {
    /// Returns the solved grid carried by this result, if any.
    #[must_use]
    pub fn solution(&self) -> Option<&Grid> {
        match self {
            Self::Solution(grid) => Some(grid),
            Self::Trace(trace) => trace.solution.as_ref(),
            Self::Verdict(_) => None,
        }
    }
}

/// The outcome of a request, as merged into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveEvent {
    /// Request the outcome belongs to.
    pub id: RequestId,
    /// What was asked.
    pub kind: SolveKind,
    /// What came back.
    pub result: Result<SolveResult, SolveError>,
}

/// Resolves once the request finishes, fails, or is superseded.
///
/// The ticket is optional: outcomes also surface through
/// [`SolverDispatcher::poll`]. It can be awaited or checked with
/// [`try_take`](Self::try_take).
#[derive(Debug)]
#[must_use = "the ticket is the only per-request handle to the outcome"]
pub struct SolveTicket {
    id: RequestId,
    receiver: oneshot::Receiver<Result<SolveResult, SolveError>>,
}

impl SolveTicket {
    /// Returns the id of the request.
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Takes the outcome if the request has finished.
    pub fn try_take(&mut self) -> Option<Result<SolveResult, SolveError>> {
        match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::Canceled) => Some(Err(WorkError::WorkerDisconnected.into())),
        }
    }
}

impl Future for SolveTicket {
    type Output = Result<SolveResult, SolveError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|outcome| {
            outcome.unwrap_or_else(|oneshot::Canceled| Err(WorkError::WorkerDisconnected.into()))
        })
    }
}

#[derive(Debug)]
struct Outstanding {
    id: RequestId,
    kind: SolveKind,
    epoch: u64,
    issued_at: Instant,
    responder: oneshot::Sender<Result<SolveResult, SolveError>>,
}

/// Engine handle shared by every worker the dispatcher starts.
type SharedEngine = Arc<dyn SolvingEngine + Sync>;

/// Owns the engine worker and the single outstanding request.
pub struct SolverDispatcher {
    engine: SharedEngine,
    worker: Option<Worker>,
    timeout: Option<Duration>,
    outstanding: Option<Outstanding>,
}

impl std::fmt::Debug for SolverDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverDispatcher")
            .field("worker", &self.worker)
            .field("timeout", &self.timeout)
            .field("outstanding", &self.outstanding_id())
            .finish_non_exhaustive()
    }
}

impl SolverDispatcher {
    /// Creates a dispatcher for `engine`.
    ///
    /// The worker thread starts on the first dispatch or on
    /// [`warm_up`](Self::warm_up). With a `timeout`, an unanswered request
    /// fails with [`SolveError::TimedOut`] once the deadline passes.
    #[must_use]
    pub fn new(engine: impl SolvingEngine + Sync + 'static, timeout: Option<Duration>) -> Self {
        Self {
            engine: Arc::new(engine),
            worker: None,
            timeout,
            outstanding: None,
        }
    }

    /// Starts the worker thread without sending a request.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError`] if the thread cannot be started or has exited.
    pub fn warm_up(&mut self) -> Result<(), WorkError> {
        self.ensure_worker().map(|_| ())
    }

    /// Returns `true` while a request awaits its reply.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Returns the id of the outstanding request.
    #[must_use]
    pub fn outstanding_id(&self) -> Option<RequestId> {
        self.outstanding.as_ref().map(|o| o.id)
    }

    /// Asks the engine to solve the puzzle from its givens.
    ///
    /// # Errors
    ///
    /// Fails without touching the session if it is already solved or if the
    /// constraints cannot be translated. Fails if the worker is unavailable.
    pub fn dispatch_solve(
        &mut self,
        store: &mut SessionStore,
        constraints: &Constraints,
        solver_type: SolverType,
        now: Instant,
    ) -> Result<SolveTicket, SolveError> {
        let call = EngineCall::Solve {
            constraints: constraints_to_engine(constraints)?,
            solver_type,
        };
        self.dispatch(store, SolveKind::Solve(solver_type), call, now)
    }

    /// Asks the engine to check `grid` against the puzzle.
    ///
    /// # Errors
    ///
    /// Fails without touching the session if it is already solved, if `grid`
    /// does not match the puzzle size or if the constraints cannot be
    /// translated. Fails if the worker is unavailable.
    pub fn dispatch_check(
        &mut self,
        store: &mut SessionStore,
        constraints: &Constraints,
        grid: &Grid,
        now: Instant,
    ) -> Result<SolveTicket, SolveError> {
        constraints.check_grid(grid)?;
        let call = EngineCall::Check {
            constraints: constraints_to_engine(constraints)?,
            grid: GridPayload {
                values: grid.clone(),
            },
        };
        self.dispatch(store, SolveKind::Check, call, now)
    }

    fn dispatch(
        &mut self,
        store: &mut SessionStore,
        kind: SolveKind,
        call: EngineCall,
        now: Instant,
    ) -> Result<SolveTicket, SolveError> {
        if store.is_solved() {
            return Err(SolveError::SessionSolved);
        }
        let id = next_request_id();
        let superseded = self.outstanding.take();
        if let Some(previous) = &superseded {
            log::debug!("request {} superseded by {id}", previous.id);
            self.retire_worker();
        }
        let sent = self
            .ensure_worker()
            .and_then(|worker| worker.send(&EngineRequest { id, call }));
        if let Some(previous) = superseded {
            let _ = previous
                .responder
                .send(Err(SolveError::Superseded { by: id }));
        }
        if let Err(err) = sent {
            store.set_computation_pending(false);
            return Err(err.into());
        }
        log::debug!("dispatched request {id} ({kind:?})");

        let (responder, receiver) = oneshot::channel();
        self.outstanding = Some(Outstanding {
            id,
            kind,
            epoch: store.epoch(),
            issued_at: now,
            responder,
        });
        store.set_computation_pending(true);
        Ok(SolveTicket { id, receiver })
    }

    /// Merges finished work into `store`.
    ///
    /// Drains every reply the worker has produced, discarding stale ones, then
    /// applies the timeout. Returns the outcome of the outstanding request if
    /// it resolved.
    pub fn poll(&mut self, store: &mut SessionStore, now: Instant) -> Option<SolveEvent> {
        while let Some(worker) = &self.worker {
            match worker.poll() {
                Ok(Some(reply)) => {
                    if let Some(event) = self.accept(store, reply) {
                        return Some(event);
                    }
                }
                Ok(None) => break,
                Err(WorkError::WorkerDisconnected) => {
                    log::error!("solver worker disconnected");
                    self.worker = None;
                    return self.fail(store, WorkError::WorkerDisconnected.into());
                }
                Err(err) => {
                    log::warn!("unreadable reply from worker: {err}");
                    return self.fail(store, err.into());
                }
            }
        }
        self.expire(store, now)
    }

    fn ensure_worker(&mut self) -> Result<&Worker, WorkError> {
        if self.worker.is_none() {
            self.worker = Some(Worker::spawn(Arc::clone(&self.engine))?);
        }
        self.worker.as_ref().ok_or(WorkError::WorkerDisconnected)
    }

    /// Drops the channels of a worker that may still be busy.
    ///
    /// The thread exits after its current request; its reply is lost.
    fn retire_worker(&mut self) {
        if self.worker.take().is_some() {
            log::debug!("retiring busy solver worker");
        }
    }

    fn accept(&mut self, store: &mut SessionStore, reply: EngineReply) -> Option<SolveEvent> {
        let Some(outstanding) = self.outstanding.take_if(|o| o.id == reply.id) else {
            log::debug!("discarding stale reply {}", reply.id);
            return None;
        };
        let result = into_result(outstanding.kind, reply.outcome);
        Self::finish(store, outstanding, result)
    }

    fn fail(&mut self, store: &mut SessionStore, err: SolveError) -> Option<SolveEvent> {
        let outstanding = self.outstanding.take()?;
        Self::finish(store, outstanding, Err(err))
    }

    fn expire(&mut self, store: &mut SessionStore, now: Instant) -> Option<SolveEvent> {
        let timeout = self.timeout?;
        let outstanding = self
            .outstanding
            .take_if(|o| now.saturating_duration_since(o.issued_at) >= timeout)?;
        log::warn!("request {} timed out after {timeout:?}", outstanding.id);
        self.retire_worker();
        Self::finish(store, outstanding, Err(SolveError::TimedOut { timeout }))
    }

    fn finish(
        store: &mut SessionStore,
        outstanding: Outstanding,
        result: Result<SolveResult, SolveError>,
    ) -> Option<SolveEvent> {
        let Outstanding {
            id,
            kind,
            epoch,
            responder,
            ..
        } = outstanding;
        if epoch != store.epoch() {
            log::debug!("discarding reply {id} from a previous session");
            let _ = responder.send(Err(SolveError::SessionReset));
            return None;
        }
        store.set_computation_pending(false);
        let _ = responder.send(result.clone());
        Some(SolveEvent { id, kind, result })
    }
}

fn into_result(kind: SolveKind, outcome: EngineOutcome) -> Result<SolveResult, SolveError> {
    match (kind, outcome) {
        (_, EngineOutcome::Failed(message)) => Err(SolveError::Engine { message }),
        (SolveKind::Solve(_), EngineOutcome::Solution(grid)) => Ok(SolveResult::Solution(grid)),
        (SolveKind::Solve(_), EngineOutcome::Trace(trace)) => Ok(SolveResult::Trace(trace)),
        (SolveKind::Check, EngineOutcome::Verdict(verdict)) => Ok(SolveResult::Verdict(verdict)),
        (kind, outcome) => {
            log::warn!("unexpected {outcome:?} for {kind:?}");
            Err(SolveError::UnexpectedReply)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Mutex, mpsc},
        thread,
    };

    use pencilmark_core::Cell;
    use pencilmark_engine::ReferenceEngine;
    use portable_atomic::AtomicBool;

    use super::*;

    /// Engine that holds each request until the test releases it.
    struct Gated {
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl SolvingEngine for Gated {
        fn handle(&self, request: EngineRequest) -> EngineReply {
            if let Ok(gate) = self.gate.lock() {
                let _ = gate.recv();
            }
            ReferenceEngine::new().handle(request)
        }
    }

    /// Engine that never answers its first request unless released.
    struct StuckOnce {
        first: AtomicBool,
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl SolvingEngine for StuckOnce {
        fn handle(&self, request: EngineRequest) -> EngineReply {
            if self.first.swap(false, Ordering::SeqCst)
                && let Ok(gate) = self.gate.lock()
            {
                let _ = gate.recv();
            }
            ReferenceEngine::new().handle(request)
        }
    }

    fn stuck_once(timeout: Option<Duration>) -> (SolverDispatcher, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let engine = StuckOnce {
            first: AtomicBool::new(true),
            gate: Mutex::new(rx),
        };
        (SolverDispatcher::new(engine, timeout), tx)
    }

    fn gated(timeout: Option<Duration>) -> (SolverDispatcher, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let engine = Gated {
            gate: Mutex::new(rx),
        };
        (SolverDispatcher::new(engine, timeout), tx)
    }

    fn wait(dispatcher: &mut SolverDispatcher, store: &mut SessionStore) -> SolveEvent {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Some(event) = dispatcher.poll(store, Instant::now()) {
                return event;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("no solve event");
    }

    #[test]
    fn test_solve_sets_and_clears_pending() {
        let mut store = SessionStore::new();
        let mut dispatcher = SolverDispatcher::new(ReferenceEngine::new(), None);
        let mut ticket = dispatcher
            .dispatch_solve(
                &mut store,
                &Constraints::classic(4),
                SolverType::Brute,
                Instant::now(),
            )
            .unwrap();
        assert!(store.is_pending());
        assert!(dispatcher.is_pending());

        let event = wait(&mut dispatcher, &mut store);
        assert_eq!(event.id, ticket.id());
        assert_eq!(event.kind, SolveKind::Solve(SolverType::Brute));
        let solution = event.result.as_ref().unwrap().solution().unwrap();
        assert!(solution.is_complete());
        assert!(!store.is_pending());
        assert!(!store.is_solved());
        assert_eq!(ticket.try_take(), Some(event.result));
    }

    #[test]
    fn test_new_dispatch_supersedes_outstanding() {
        let mut store = SessionStore::new();
        let (mut dispatcher, gate) = gated(None);
        let constraints = Constraints::classic(4);
        let now = Instant::now();

        let mut first = dispatcher
            .dispatch_solve(&mut store, &constraints, SolverType::Brute, now)
            .unwrap();
        let second = dispatcher
            .dispatch_solve(&mut store, &constraints, SolverType::Brute, now)
            .unwrap();
        assert_eq!(
            first.try_take(),
            Some(Err(SolveError::Superseded { by: second.id() }))
        );

        gate.send(()).unwrap();
        gate.send(()).unwrap();
        let event = wait(&mut dispatcher, &mut store);
        assert_eq!(event.id, second.id());
        assert!(!store.is_pending());
    }

    #[test]
    fn test_timeout_clears_pending() {
        let mut store = SessionStore::new();
        let (mut dispatcher, _gate) = gated(Some(Duration::from_secs(30)));
        let start = Instant::now();
        let mut ticket = dispatcher
            .dispatch_solve(
                &mut store,
                &Constraints::classic(4),
                SolverType::Logical,
                start,
            )
            .unwrap();

        assert!(dispatcher.poll(&mut store, start + Duration::from_secs(29)).is_none());
        let event = dispatcher
            .poll(&mut store, start + Duration::from_secs(30))
            .unwrap();
        let expected = Err(SolveError::TimedOut {
            timeout: Duration::from_secs(30),
        });
        assert_eq!(event.result, expected);
        assert!(!store.is_pending());
        assert_eq!(ticket.try_take(), Some(expected));
    }

    #[test]
    fn test_dispatch_after_timeout_is_answered() {
        let mut store = SessionStore::new();
        let (mut dispatcher, _gate) = stuck_once(Some(Duration::from_secs(5)));
        let constraints = Constraints::classic(4);
        let start = Instant::now();

        let _stuck = dispatcher
            .dispatch_solve(&mut store, &constraints, SolverType::Brute, start)
            .unwrap();
        let expired = dispatcher
            .poll(&mut store, start + Duration::from_secs(5))
            .unwrap();
        assert!(expired.result.unwrap_err().is_timed_out());

        let mut ticket = dispatcher
            .dispatch_solve(&mut store, &constraints, SolverType::Brute, Instant::now())
            .unwrap();
        let event = wait(&mut dispatcher, &mut store);
        assert_eq!(event.id, ticket.id());
        assert!(event.result.as_ref().unwrap().solution().is_some());
        assert!(!store.is_pending());
        assert_eq!(ticket.try_take(), Some(event.result));
    }

    #[test]
    fn test_dispatch_superseding_stuck_request_is_answered() {
        let mut store = SessionStore::new();
        let (mut dispatcher, _gate) = stuck_once(None);
        let constraints = Constraints::classic(4);

        let _stuck = dispatcher
            .dispatch_solve(&mut store, &constraints, SolverType::Brute, Instant::now())
            .unwrap();
        let second = dispatcher
            .dispatch_solve(&mut store, &constraints, SolverType::Logical, Instant::now())
            .unwrap();
        let event = wait(&mut dispatcher, &mut store);
        assert_eq!(event.id, second.id());
        assert_eq!(event.kind, SolveKind::Solve(SolverType::Logical));
        assert!(!store.is_pending());
    }

    #[test]
    fn test_reply_after_reset_is_discarded() {
        let mut store = SessionStore::new();
        let (mut dispatcher, gate) = gated(None);
        let mut ticket = dispatcher
            .dispatch_solve(
                &mut store,
                &Constraints::classic(4),
                SolverType::Brute,
                Instant::now(),
            )
            .unwrap();
        store.reset();
        store.tick();
        gate.send(()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while dispatcher.is_pending() && Instant::now() < deadline {
            assert!(dispatcher.poll(&mut store, Instant::now()).is_none());
            thread::sleep(Duration::from_millis(1));
        }
        assert!(!dispatcher.is_pending());
        assert_eq!(store.elapsed_seconds(), 1);
        assert_eq!(ticket.try_take(), Some(Err(SolveError::SessionReset)));
    }

    #[test]
    fn test_solved_session_rejects_dispatch() {
        let mut store = SessionStore::new();
        store.mark_solved();
        let mut dispatcher = SolverDispatcher::new(ReferenceEngine::new(), None);
        let err = dispatcher
            .dispatch_solve(
                &mut store,
                &Constraints::classic(4),
                SolverType::Logical,
                Instant::now(),
            )
            .unwrap_err();
        assert_eq!(err, SolveError::SessionSolved);
        assert!(!store.is_pending());
    }

    #[test]
    fn test_check_rejects_mismatched_grid() {
        let mut store = SessionStore::new();
        let mut dispatcher = SolverDispatcher::new(ReferenceEngine::new(), None);
        let err = dispatcher
            .dispatch_check(
                &mut store,
                &Constraints::classic(4),
                &Grid::new(9),
                Instant::now(),
            )
            .unwrap_err();
        assert!(err.is_model());
        assert!(!store.is_pending());
    }

    #[test]
    fn test_check_returns_verdict() {
        let mut store = SessionStore::new();
        let mut dispatcher = SolverDispatcher::new(ReferenceEngine::new(), None);
        dispatcher.warm_up().unwrap();
        let mut grid = Grid::new(4);
        grid.set(Cell::new(0, 0), 1);
        grid.set(Cell::new(0, 1), 1);
        let _ticket = dispatcher
            .dispatch_check(&mut store, &Constraints::classic(4), &grid, Instant::now())
            .unwrap();
        let event = wait(&mut dispatcher, &mut store);
        assert_eq!(
            event.result,
            Ok(SolveResult::Verdict(CheckVerdict {
                consistent: false,
                solvable: false,
            }))
        );
    }

    #[test]
    fn test_engine_failure_is_reported() {
        let constraints = Constraints::builder(4)
            .rows()
            .given(Cell::new(0, 0), 1)
            .given(Cell::new(0, 1), 1)
            .build()
            .unwrap();
        let mut store = SessionStore::new();
        let mut dispatcher = SolverDispatcher::new(ReferenceEngine::new(), None);
        let _ticket = dispatcher
            .dispatch_solve(&mut store, &constraints, SolverType::Brute, Instant::now())
            .unwrap();
        let event = wait(&mut dispatcher, &mut store);
        assert!(matches!(event.result, Err(SolveError::Engine { .. })));
        assert!(!store.is_pending());
    }
}
