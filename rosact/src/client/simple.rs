//! One-goal-at-a-time client facade.
//!
//! Wraps an [`ActionClient`] and tracks a single goal, collapsing the
//! communication state machine into the three-state
//! [`SimpleGoalState`] so callers can block on completion instead of
//! wiring transition callbacks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rosact_core::{Action, CommState, SimpleClientGoalState, SimpleGoalState, Time};
use tracing::{debug, error};

use crate::client::{ActionCallbacks, ActionClient, ClientGoalHandle};
use crate::error::Result;
use crate::transport::ActionTransport;

/// Callbacks for the currently tracked goal.
pub trait SimpleCallbacks<A: Action>: Send + Sync {
    /// The goal started executing.
    fn on_active(&self) {}

    /// A feedback message arrived for the goal.
    fn on_feedback(&self, _feedback: &A::Feedback) {}

    /// The goal reached a terminal state.
    fn on_done(&self, _state: SimpleClientGoalState, _result: Option<A::Result>) {}
}

struct SimpleTracking<A: Action> {
    simple_state: SimpleGoalState,
    handle: Option<ClientGoalHandle<A>>,
    callbacks: Option<Arc<dyn SimpleCallbacks<A>>>,
}

struct SimpleCore<A: Action> {
    state: Mutex<SimpleTracking<A>>,
    cond: Condvar,
}

impl<A: Action> SimpleCore<A> {
    fn set_state(&self, next: SimpleGoalState) {
        self.state.lock().simple_state = next;
        self.cond.notify_all();
    }
}

impl<A: Action> ActionCallbacks<A> for SimpleCore<A> {
    fn on_transition(&self, goal: &ClientGoalHandle<A>) {
        let comm = goal.comm_state();
        let (simple_state, callbacks) = {
            let tracking = self.state.lock();
            (tracking.simple_state, tracking.callbacks.clone())
        };

        match comm {
            CommState::Active | CommState::Preempting => match simple_state {
                SimpleGoalState::Pending => {
                    self.set_state(SimpleGoalState::Active);
                    if let Some(callbacks) = &callbacks {
                        callbacks.on_active();
                    }
                }
                SimpleGoalState::Active => {}
                SimpleGoalState::Done => {
                    error!("goal went {comm:?} after already reaching a terminal state");
                }
            },
            CommState::Recalling => {
                if simple_state != SimpleGoalState::Pending {
                    error!("goal started recalling while {simple_state:?}");
                }
            }
            CommState::Done => match simple_state {
                SimpleGoalState::Done => error!("goal reported done twice"),
                _ => {
                    let terminal = goal.terminal_state();
                    let result = goal.result();
                    self.set_state(SimpleGoalState::Done);
                    if let Some(callbacks) = &callbacks {
                        callbacks.on_done(terminal.status.into(), result);
                    }
                }
            },
            _ => {}
        }
    }

    fn on_feedback(&self, _goal: &ClientGoalHandle<A>, feedback: &A::Feedback) {
        let callbacks = self.state.lock().callbacks.clone();
        if let Some(callbacks) = callbacks {
            callbacks.on_feedback(feedback);
        }
    }
}

/// An action client tracking one goal at a time.
///
/// Sending a new goal stops tracking the previous one without cancelling
/// it on the server.
pub struct SimpleActionClient<A: Action> {
    client: ActionClient<A>,
    core: Arc<SimpleCore<A>>,
}

impl<A: Action> SimpleActionClient<A> {
    pub fn new(name: &str, transport: impl ActionTransport<A> + 'static) -> Result<Self> {
        Ok(Self {
            client: ActionClient::new(name, transport)?,
            core: Arc::new(SimpleCore {
                state: Mutex::new(SimpleTracking {
                    simple_state: SimpleGoalState::Pending,
                    handle: None,
                    callbacks: None,
                }),
                cond: Condvar::new(),
            }),
        })
    }

    /// The wrapped multi-goal client.
    pub fn action_client(&self) -> &ActionClient<A> {
        &self.client
    }

    /// Submit a goal without callbacks. Returns false if the underlying
    /// client was shut down.
    pub fn send_goal(&self, goal: A::Goal) -> bool {
        self.submit(goal, None)
    }

    /// Submit a goal with callbacks for its lifetime.
    pub fn send_goal_with_callbacks(
        &self,
        goal: A::Goal,
        callbacks: Arc<dyn SimpleCallbacks<A>>,
    ) -> bool {
        self.submit(goal, Some(callbacks))
    }

    fn submit(&self, goal: A::Goal, callbacks: Option<Arc<dyn SimpleCallbacks<A>>>) -> bool {
        let previous = {
            let mut tracking = self.core.state.lock();
            let previous = tracking.handle.take();
            tracking.callbacks = callbacks;
            tracking.simple_state = SimpleGoalState::Pending;
            previous
        };
        if let Some(previous) = previous {
            previous.shutdown(true);
        }

        match self
            .client
            .send_goal_with_callbacks(goal, self.core.clone())
        {
            Some(handle) => {
                self.core.state.lock().handle = Some(handle);
                true
            }
            None => false,
        }
    }

    /// Current outcome of the tracked goal.
    pub fn state(&self) -> SimpleClientGoalState {
        let (simple_state, handle) = {
            let tracking = self.core.state.lock();
            (tracking.simple_state, tracking.handle.clone())
        };
        let Some(handle) = handle else {
            error!("state queried before any goal was sent");
            return SimpleClientGoalState::Lost;
        };
        match simple_state {
            SimpleGoalState::Pending => SimpleClientGoalState::Pending,
            SimpleGoalState::Active => SimpleClientGoalState::Active,
            SimpleGoalState::Done => handle.terminal_state().status.into(),
        }
    }

    /// Result of the tracked goal, if one has arrived.
    pub fn result(&self) -> Option<A::Result> {
        let handle = self.core.state.lock().handle.clone();
        handle.and_then(|h| h.result())
    }

    /// Ask the server to cancel the tracked goal.
    pub fn cancel_goal(&self) {
        let handle = self.core.state.lock().handle.clone();
        match handle {
            Some(handle) => handle.cancel(),
            None => error!("cancel_goal called before any goal was sent"),
        }
    }

    /// Stop tracking the current goal without cancelling it.
    pub fn stop_tracking_goal(&self) {
        let handle = self.core.state.lock().handle.take();
        match handle {
            Some(handle) => handle.shutdown(true),
            None => error!("stop_tracking_goal called before any goal was sent"),
        }
    }

    /// Block until the tracked goal reaches a terminal state.
    ///
    /// A zero `timeout` waits forever. Returns false on timeout or if no
    /// goal is being tracked.
    pub fn wait_for_result(&self, timeout: Duration) -> bool {
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);
        let mut tracking = self.core.state.lock();
        if tracking.handle.is_none() {
            error!("wait_for_result called before any goal was sent");
            return false;
        }
        while tracking.simple_state != SimpleGoalState::Done {
            match deadline {
                Some(deadline) => {
                    self.core.cond.wait_until(&mut tracking, deadline);
                    if tracking.simple_state != SimpleGoalState::Done
                        && Instant::now() >= deadline
                    {
                        return false;
                    }
                }
                None => self.core.cond.wait(&mut tracking),
            }
        }
        true
    }

    /// Submit a goal and block for its outcome.
    ///
    /// If the goal does not finish within `execute_timeout` it is
    /// cancelled, and the cancellation is given `preempt_timeout` to be
    /// acknowledged. Zero timeouts wait forever.
    pub fn send_goal_and_wait(
        &self,
        goal: A::Goal,
        execute_timeout: Duration,
        preempt_timeout: Duration,
    ) -> SimpleClientGoalState {
        if !self.send_goal(goal) {
            return SimpleClientGoalState::Lost;
        }
        if !self.wait_for_result(execute_timeout) {
            debug!("goal did not finish within the execute timeout, cancelling");
            self.cancel_goal();
            if !self.wait_for_result(preempt_timeout) {
                debug!("goal did not finish within the preempt timeout either");
            }
        }
        self.state()
    }

    /// Block until the action server is reachable. A zero `timeout`
    /// waits forever.
    pub fn wait_for_server(&self, timeout: Duration) -> bool {
        self.client.wait_for_server(timeout)
    }

    /// Ask the server to cancel every goal it knows about.
    pub fn cancel_all_goals(&self) {
        self.client.cancel_all_goals();
    }

    /// Ask the server to cancel every goal submitted at or before `stamp`.
    pub fn cancel_goals_at_and_before(&self, stamp: Time) {
        self.client.cancel_goals_at_and_before(stamp);
    }

    /// Shut down the underlying client. Irreversible.
    pub fn shutdown(&self) {
        self.client.shutdown();
    }
}
