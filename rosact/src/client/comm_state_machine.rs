//! Per-goal communication state machine.
//!
//! One instance per submitted goal. Consumes the status, feedback and
//! result streams, keeps the goal's [`CommState`] consistent with the
//! transition table in `rosact_core::state`, and invokes the user callback
//! once per transition and per relevant feedback message. Messages for
//! other goals are filtered out here by goal id, not by the registry.

use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use rosact_core::{
    Action, ActionFeedback, ActionGoal, ActionResult, CommState, GoalId, GoalStatus,
    GoalStatusArray, GoalStatusValue, Transition, status, status_transitions,
};
use tracing::{debug, error};

use crate::client::{ActionCallbacks, ClientGoalHandle};

struct CsmState<A: Action> {
    comm_state: CommState,
    latest_status: Option<GoalStatus>,
    latest_result: Option<ActionResult<A::Result>>,
}

/// Tracks the protocol lifecycle of a single goal.
///
/// All mutation goes through a per-instance re-entrant lock: transport
/// delivery threads for the three incoming topics and the user's calling
/// thread may all touch one goal concurrently. The lock is re-entrant
/// because user callbacks fire while it is held and commonly query the
/// goal handle back. Callbacks must not synchronously submit or delete
/// goals; see [`ActionCallbacks`].
pub(crate) struct CommStateMachine<A: Action> {
    action_goal: ActionGoal<A::Goal>,
    callbacks: Option<Arc<dyn ActionCallbacks<A>>>,
    state: ReentrantMutex<RefCell<CsmState<A>>>,
}

impl<A: Action> CommStateMachine<A> {
    pub(crate) fn new(
        action_goal: ActionGoal<A::Goal>,
        callbacks: Option<Arc<dyn ActionCallbacks<A>>>,
    ) -> Self {
        Self {
            action_goal,
            callbacks,
            state: ReentrantMutex::new(RefCell::new(CsmState {
                comm_state: CommState::WaitingForGoalAck,
                latest_status: None,
                latest_result: None,
            })),
        }
    }

    pub(crate) fn goal_id(&self) -> &GoalId {
        &self.action_goal.goal_id
    }

    pub(crate) fn action_goal(&self) -> &ActionGoal<A::Goal> {
        &self.action_goal
    }

    pub(crate) fn comm_state(&self) -> CommState {
        let state = self.state.lock();
        let comm = state.borrow().comm_state;
        comm
    }

    pub(crate) fn latest_status(&self) -> Option<GoalStatus> {
        let state = self.state.lock();
        let status = state.borrow().latest_status.clone();
        status
    }

    pub(crate) fn latest_result(&self) -> Option<ActionResult<A::Result>> {
        let state = self.state.lock();
        let result = state.borrow().latest_result.clone();
        result
    }

    /// Apply one status snapshot to this goal.
    pub(crate) fn update_status(&self, handle: &ClientGoalHandle<A>, array: &GoalStatusArray) {
        let state = self.state.lock();

        let comm = state.borrow().comm_state;
        // Stale status traffic after the terminal state is expected and
        // dropped wholesale.
        if comm == CommState::Done {
            return;
        }

        let Some(goal_status) = find_goal_status(array, &self.goal_id().id) else {
            self.handle_missing_status(handle, &state, comm);
            return;
        };

        state.borrow_mut().latest_status = Some(goal_status.clone());

        let Some(incoming) = goal_status.value() else {
            error!(
                goal_id = %self.goal_id().id,
                raw = goal_status.status,
                "received unknown goal status value, ignoring"
            );
            return;
        };

        self.apply_transition(handle, comm, incoming);
    }

    /// Deliver one feedback envelope to this goal's feedback callback.
    pub(crate) fn update_feedback(
        &self,
        handle: &ClientGoalHandle<A>,
        feedback: &ActionFeedback<A::Feedback>,
    ) {
        let _state = self.state.lock();

        if feedback.status.goal_id.id != self.goal_id().id {
            return;
        }

        if let Some(callbacks) = &self.callbacks {
            let callbacks = callbacks.clone();
            let payload = &feedback.feedback;
            if catch_unwind(AssertUnwindSafe(|| callbacks.on_feedback(handle, payload))).is_err() {
                error!(goal_id = %self.goal_id().id, "feedback callback panicked");
            }
        }
    }

    /// Apply one result envelope to this goal.
    ///
    /// The embedded goal status is first run through the regular status
    /// path so a result arriving before any status snapshot still walks
    /// the intermediate transitions, then the goal is forced to done.
    pub(crate) fn update_result(
        &self,
        handle: &ClientGoalHandle<A>,
        result: &ActionResult<A::Result>,
    ) {
        let state = self.state.lock();

        if result.status.goal_id.id != self.goal_id().id {
            return;
        }

        let comm = state.borrow().comm_state;
        if comm == CommState::Done {
            error!(
                goal_id = %self.goal_id().id,
                "received a result for a goal that is already done"
            );
            return;
        }

        {
            let mut inner = state.borrow_mut();
            inner.latest_status = Some(result.status.clone());
            inner.latest_result = Some(result.clone());
        }

        self.update_status(handle, &GoalStatusArray::single(result.status.clone()));
        self.transition_to(handle, CommState::Done);
    }

    /// Set a new communication state and notify the user callback.
    pub(crate) fn transition_to(&self, handle: &ClientGoalHandle<A>, next: CommState) {
        let state = self.state.lock();

        let from = state.borrow().comm_state;
        debug!(goal_id = %self.goal_id().id, "comm state {from:?} -> {next:?}");
        state.borrow_mut().comm_state = next;

        if let Some(callbacks) = &self.callbacks {
            let callbacks = callbacks.clone();
            if catch_unwind(AssertUnwindSafe(|| callbacks.on_transition(handle))).is_err() {
                error!(goal_id = %self.goal_id().id, "transition callback panicked");
            }
        }
    }

    /// The server stopped listing this goal. Anywhere past the first ack
    /// and before the result wait, that means the goal is gone for good.
    fn handle_missing_status(
        &self,
        handle: &ClientGoalHandle<A>,
        state: &RefCell<CsmState<A>>,
        comm: CommState,
    ) {
        match comm {
            CommState::WaitingForGoalAck | CommState::WaitingForResult | CommState::Done => {}
            _ => {
                debug!(
                    goal_id = %self.goal_id().id,
                    "goal missing from status snapshot in {comm:?}, marking lost"
                );
                {
                    let mut inner = state.borrow_mut();
                    match &mut inner.latest_status {
                        Some(latest) => latest.status = status::LOST,
                        None => {
                            inner.latest_status = Some(GoalStatus::new(
                                self.goal_id().clone(),
                                GoalStatusValue::Lost,
                            ));
                        }
                    }
                }
                self.transition_to(handle, CommState::Done);
            }
        }
    }

    fn apply_transition(
        &self,
        handle: &ClientGoalHandle<A>,
        from: CommState,
        incoming: GoalStatusValue,
    ) {
        match status_transitions(from, incoming) {
            Transition::Stay => {}
            Transition::Invalid => {
                error!(
                    goal_id = %self.goal_id().id,
                    "invalid goal status transition from {from:?} on {incoming:?}"
                );
            }
            Transition::Steps(steps) => {
                for step in steps {
                    self.transition_to(handle, *step);
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn force_state(&self, comm: CommState) {
        let state = self.state.lock();
        state.borrow_mut().comm_state = comm;
    }
}

fn find_goal_status<'a>(array: &'a GoalStatusArray, id: &str) -> Option<&'a GoalStatus> {
    array.status_list.iter().find(|gs| gs.goal_id.id == id)
}
