//! User-facing capability for one submitted goal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use rosact_core::{Action, CancelGoal, CommState, GoalId, GoalStatus, TerminalState, TerminalStatus};
use tracing::{error, warn};

use crate::client::ClientCore;
use crate::client::comm_state_machine::CommStateMachine;
use crate::client::goal_manager::GoalManager;

/// Handle to one submitted goal.
///
/// Created once per submission by the client and never reused for another
/// goal. Clones share the same goal. Every operation on a handle whose
/// goal tracking was shut down logs an error and returns a conservative
/// default instead of panicking; careless use is tolerated, not rewarded.
pub struct ClientGoalHandle<A: Action> {
    inner: Arc<HandleInner<A>>,
}

struct HandleInner<A: Action> {
    active: AtomicBool,
    csm: CommStateMachine<A>,
    manager: Weak<GoalManager<A>>,
    core: Arc<ClientCore<A>>,
}

impl<A: Action> Clone for ClientGoalHandle<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: Action> ClientGoalHandle<A> {
    pub(crate) fn new(
        csm: CommStateMachine<A>,
        manager: Weak<GoalManager<A>>,
        core: Arc<ClientCore<A>>,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                active: AtomicBool::new(true),
                csm,
                manager,
                core,
            }),
        }
    }

    /// A handle with no registry or live transport behind it.
    #[cfg(test)]
    pub(crate) fn detached(csm: CommStateMachine<A>) -> Self {
        let (transport, _server) = crate::transport::mem::MemTransport::open();
        Self::new(
            csm,
            Weak::new(),
            Arc::new(ClientCore::new(Box::new(transport))),
        )
    }

    pub(crate) fn csm(&self) -> &CommStateMachine<A> {
        &self.inner.csm
    }

    pub(crate) fn same_goal(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The id this goal was submitted under.
    pub fn goal_id(&self) -> GoalId {
        self.inner.csm.goal_id().clone()
    }

    /// Whether goal tracking for this handle has been shut down.
    pub fn is_expired(&self) -> bool {
        !self.inner.active.load(Ordering::Acquire)
    }

    /// Current communication state of the goal.
    pub fn comm_state(&self) -> CommState {
        if self.is_expired() {
            error!(goal_id = %self.inner.csm.goal_id().id, "comm_state called on an expired goal handle");
            return CommState::Done;
        }
        self.inner.csm.comm_state()
    }

    /// The last status snapshot the server reported for this goal.
    pub fn latest_goal_status(&self) -> Option<GoalStatus> {
        if self.is_expired() {
            error!(goal_id = %self.inner.csm.goal_id().id, "latest_goal_status called on an expired goal handle");
            return None;
        }
        self.inner.csm.latest_status()
    }

    /// Terminal outcome of the goal.
    ///
    /// Meaningful once [`comm_state`](Self::comm_state) is `Done`. Called
    /// earlier it warns and derives a best-effort outcome from the latest
    /// status, defaulting to lost for any in-flight status.
    pub fn terminal_state(&self) -> TerminalState {
        if self.is_expired() {
            error!(goal_id = %self.inner.csm.goal_id().id, "terminal_state called on an expired goal handle");
            return TerminalState::lost();
        }

        let comm = self.inner.csm.comm_state();
        if comm != CommState::Done {
            warn!(
                goal_id = %self.inner.csm.goal_id().id,
                "asking for the terminal state while in {comm:?}"
            );
        }

        let Some(latest) = self.inner.csm.latest_status() else {
            return TerminalState::lost();
        };
        match latest.value().and_then(TerminalStatus::from_status) {
            Some(status) => TerminalState::new(status, latest.text),
            None => {
                error!(
                    goal_id = %self.inner.csm.goal_id().id,
                    raw = latest.status,
                    "latest goal status has no terminal reading"
                );
                TerminalState::lost()
            }
        }
    }

    /// The result payload, if a result message has been received.
    pub fn result(&self) -> Option<A::Result> {
        if self.is_expired() {
            error!(goal_id = %self.inner.csm.goal_id().id, "result called on an expired goal handle");
            return None;
        }
        self.inner.csm.latest_result().map(|r| r.result)
    }

    /// Re-publish the stored goal envelope unchanged. The goal keeps its
    /// original id and stamp.
    pub fn resend(&self) {
        if self.is_expired() {
            error!(goal_id = %self.inner.csm.goal_id().id, "resend called on an expired goal handle");
            return;
        }
        if let Err(e) = self.inner.core.publish_goal(self.inner.csm.action_goal()) {
            error!(goal_id = %self.inner.csm.goal_id().id, "failed to resend goal: {e}");
        }
    }

    /// Ask the server to cancel this goal.
    pub fn cancel(&self) {
        if self.is_expired() {
            error!(goal_id = %self.inner.csm.goal_id().id, "cancel called on an expired goal handle");
            return;
        }
        let cancel = CancelGoal::for_goal(self.inner.csm.goal_id());
        if let Err(e) = self.inner.core.publish_cancel(&cancel) {
            error!(goal_id = %self.inner.csm.goal_id().id, "failed to publish cancel: {e}");
        }
        self.inner.csm.transition_to(self, CommState::WaitingForCancelAck);
    }

    /// Stop tracking this goal. Idempotent. Does not cancel the goal on
    /// the server.
    ///
    /// With `delete_from_registry` the handle is also removed from its
    /// client's registry, so later status traffic no longer reaches it.
    pub fn shutdown(&self, delete_from_registry: bool) {
        if self.inner.active.swap(false, Ordering::AcqRel) && delete_from_registry {
            if let Some(manager) = self.inner.manager.upgrade() {
                manager.delete_goal_handle(self);
            }
        }
    }
}
