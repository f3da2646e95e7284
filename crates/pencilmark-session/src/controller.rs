//! The mounted session: every component wired to one store.

use std::{cell::Ref, collections::BTreeSet, rc::Rc, time::Instant};

use pencilmark_core::{Cell, CellMarks, Constraints, Grid, SolverType, SolvingEngine, grid_errors};

use crate::{
    blur_guard::BlurPauseGuard,
    dispatcher::{SolveError, SolveEvent, SolveTicket, SolverDispatcher},
    online::OnlineStatusMonitor,
    settings::SessionSettings,
    signals::SignalHub,
    store::{Lifecycle, SessionControls, SessionStore, SharedStore},
    ticker::TimerTicker,
    validator::MemoizedValidator,
};

/// Controller for one puzzle view.
///
/// Mounting wires the ticker, the blur guard and the online monitor to a
/// fresh store; dropping the controller releases all of them. The embedding
/// loop calls [`update`](Self::update) regularly to merge solver replies and
/// advance the timer.
#[derive(Debug)]
pub struct SessionController {
    settings: SessionSettings,
    constraints: Rc<Constraints>,
    store: SharedStore,
    ticker: TimerTicker,
    blur_guard: BlurPauseGuard,
    online: OnlineStatusMonitor,
    dispatcher: SolverDispatcher,
    validator: MemoizedValidator,
    solution: Option<Grid>,
}

impl SessionController {
    /// Mounts a session for `constraints` on `hub`.
    #[must_use]
    pub fn mount(
        hub: &SignalHub,
        constraints: Rc<Constraints>,
        settings: SessionSettings,
        engine: impl SolvingEngine + Sync + 'static,
        now: Instant,
    ) -> Self {
        let store = SessionStore::shared();
        let ticker = TimerTicker::start(Rc::clone(&store), settings.timer.tick_interval(), now);
        let blur_guard = BlurPauseGuard::mount(hub, &store);
        let online = OnlineStatusMonitor::mount(hub);
        let dispatcher = SolverDispatcher::new(engine, settings.solver.timeout());
        log::debug!("session mounted for a {0}x{0} puzzle", constraints.size);
        Self {
            settings,
            constraints,
            store,
            ticker,
            blur_guard,
            online,
            dispatcher,
            validator: MemoizedValidator::new(),
            solution: None,
        }
    }

    /// Borrows the store for reading.
    #[must_use]
    pub fn store(&self) -> Ref<'_, SessionStore> {
        self.store.borrow()
    }

    /// Returns the current lifecycle flags.
    #[must_use]
    pub fn controls(&self) -> SessionControls {
        self.store.borrow().controls()
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.store.borrow().lifecycle()
    }

    /// Returns the seconds counted so far.
    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.store.borrow().elapsed_seconds()
    }

    /// Returns the puzzle.
    #[must_use]
    pub fn constraints(&self) -> &Rc<Constraints> {
        &self.constraints
    }

    /// Returns the settings the session was mounted with.
    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Returns the last observed connectivity.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.is_online()
    }

    /// Returns the solution from the latest solve, if one arrived.
    #[must_use]
    pub fn solution(&self) -> Option<&Grid> {
        self.solution.as_ref()
    }

    /// Pauses the session at the player's request.
    pub fn pause(&mut self) -> bool {
        self.store.borrow_mut().pause()
    }

    /// Resumes the session at the player's request.
    pub fn resume(&mut self, now: Instant) -> bool {
        let resumed = self.store.borrow_mut().resume();
        if resumed {
            self.ticker.restart(now);
        }
        resumed
    }

    /// Marks the puzzle solved.
    pub fn mark_solved(&mut self) -> bool {
        self.store.borrow_mut().mark_solved()
    }

    /// Starts a new attempt at the same puzzle.
    pub fn reset(&mut self, now: Instant) {
        self.store.borrow_mut().reset();
        self.ticker.restart(now);
        self.solution = None;
    }

    /// Reattaches the blur guard, replacing its previous registration.
    pub fn reregister_blur(&mut self, hub: &SignalHub) {
        self.blur_guard.register(hub, &self.store);
    }

    /// Asks the engine to solve the puzzle, with the configured strategy unless one is named.
    ///
    /// # Errors
    ///
    /// See [`SolverDispatcher::dispatch_solve`].
    pub fn request_solve(
        &mut self,
        solver_type: Option<SolverType>,
        now: Instant,
    ) -> Result<SolveTicket, SolveError> {
        let solver_type = solver_type.unwrap_or(self.settings.solver.solver_type);
        self.dispatcher.dispatch_solve(
            &mut self.store.borrow_mut(),
            &self.constraints,
            solver_type,
            now,
        )
    }

    /// Asks the engine whether `grid` is consistent and still solvable.
    ///
    /// # Errors
    ///
    /// See [`SolverDispatcher::dispatch_check`].
    pub fn request_check(&mut self, grid: &Grid, now: Instant) -> Result<SolveTicket, SolveError> {
        self.dispatcher
            .dispatch_check(&mut self.store.borrow_mut(), &self.constraints, grid, now)
    }

    /// Applies a missed focus loss, merges finished solver work, then fires due ticks.
    ///
    /// Returns the outcome of the outstanding request if it resolved.
    pub fn update(&mut self, now: Instant) -> Option<SolveEvent> {
        let event = {
            let mut store = self.store.borrow_mut();
            self.blur_guard.flush(&mut store);
            self.dispatcher.poll(&mut store, now)
        };
        if let Some(SolveEvent {
            result: Ok(result), ..
        }) = &event
            && let Some(solution) = result.solution()
        {
            self.solution = Some(solution.clone());
        }
        self.ticker.poll(now);
        event
    }

    /// Returns the cells of `grid` that break a rule.
    ///
    /// Empty when error checking is disabled in the settings.
    pub fn errors(
        &mut self,
        grid: &Rc<Grid>,
        marks: Option<&Rc<CellMarks>>,
    ) -> Rc<BTreeSet<Cell>> {
        self.validator.errors(
            self.settings.assist.check_errors,
            &self.constraints,
            grid,
            marks,
        )
    }

    /// Marks the session solved if `grid` completes the puzzle.
    ///
    /// A grid matching the latest engine solution counts as complete. Without
    /// one, a full grid with no rule violations does.
    pub fn check_completion(&mut self, grid: &Grid) -> bool {
        let complete = match &self.solution {
            Some(solution) => solution == grid,
            None => {
                grid.is_complete()
                    && self.constraints.check_grid(grid).is_ok()
                    && grid_errors(true, &self.constraints, grid, None).is_empty()
            }
        };
        complete && self.mark_solved()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pencilmark_engine::ReferenceEngine;

    use super::*;
    use crate::signals::Signal;

    fn mount(hub: &SignalHub, now: Instant) -> SessionController {
        SessionController::mount(
            hub,
            Rc::new(Constraints::classic(4)),
            SessionSettings::default(),
            ReferenceEngine::new(),
            now,
        )
    }

    #[test]
    fn test_blur_then_tick_keeps_time() {
        let hub = SignalHub::new(true);
        let start = Instant::now();
        let mut controller = mount(&hub, start);

        controller.update(start + Duration::from_secs(2));
        assert_eq!(controller.elapsed_seconds(), 2);
        hub.emit(Signal::Blur);
        controller.update(start + Duration::from_secs(5));
        assert_eq!(controller.lifecycle(), Lifecycle::Paused);
        assert_eq!(controller.elapsed_seconds(), 2);
    }

    #[test]
    fn test_blur_while_store_is_read_pauses_on_update() {
        let hub = SignalHub::new(true);
        let start = Instant::now();
        let mut controller = mount(&hub, start);

        {
            let store = controller.store();
            hub.emit(Signal::Blur);
            assert!(!store.is_paused());
        }
        controller.update(start + Duration::from_secs(3));
        assert_eq!(controller.lifecycle(), Lifecycle::Paused);
        assert_eq!(controller.elapsed_seconds(), 0);
    }

    #[test]
    fn test_unmount_releases_subscriptions() {
        let hub = SignalHub::new(true);
        let controller = mount(&hub, Instant::now());
        assert_eq!(hub.handler_count(Signal::Blur), 1);
        assert_eq!(hub.handler_count(Signal::Online), 1);

        drop(controller);
        assert_eq!(hub.handler_count(Signal::Blur), 0);
        assert_eq!(hub.handler_count(Signal::Online), 0);
        assert_eq!(hub.handler_count(Signal::Offline), 0);
    }

    #[test]
    fn test_check_completion_without_solution() {
        let hub = SignalHub::new(true);
        let mut controller = mount(&hub, Instant::now());
        let solved = Grid::from_rows(vec![
            vec![1, 2, 3, 4],
            vec![3, 4, 1, 2],
            vec![2, 1, 4, 3],
            vec![4, 3, 2, 1],
        ])
        .unwrap();
        let mut wrong = solved.clone();
        wrong.set(Cell::new(0, 0), 2);

        assert!(!controller.check_completion(&wrong));
        assert!(!controller.check_completion(&Grid::new(4)));
        assert!(controller.check_completion(&solved));
        assert_eq!(controller.lifecycle(), Lifecycle::Solved);
    }

    #[test]
    fn test_errors_follow_settings() {
        let hub = SignalHub::new(true);
        let mut settings = SessionSettings::default();
        settings.assist.check_errors = false;
        let mut controller = SessionController::mount(
            &hub,
            Rc::new(Constraints::classic(4)),
            settings,
            ReferenceEngine::new(),
            Instant::now(),
        );
        let mut grid = Grid::new(4);
        grid.set(Cell::new(0, 0), 1);
        grid.set(Cell::new(0, 1), 1);
        assert!(controller.errors(&Rc::new(grid), None).is_empty());
    }
}
