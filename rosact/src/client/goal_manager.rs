//! Registry of live goals for one client.
//!
//! Fans every incoming status, feedback and result message out to every
//! tracked goal; each goal decides relevance by id. The handle list lock
//! is held for the whole fan-out iteration, so submission and deletion
//! serialize against delivery. Goal counts are small and bounded by
//! application usage, not message rate, so the linear fan-out is fine.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rosact_core::{
    Action, ActionFeedback, ActionGoal, ActionResult, GoalStatusArray, Header,
};
use tracing::error;

use crate::client::comm_state_machine::CommStateMachine;
use crate::client::goal_handle::ClientGoalHandle;
use crate::client::{ActionCallbacks, ClientCore};
use crate::goal_id::GoalIdGenerator;

pub(crate) struct GoalManager<A: Action> {
    handles: Mutex<Vec<ClientGoalHandle<A>>>,
    core: Arc<ClientCore<A>>,
    id_generator: GoalIdGenerator,
}

impl<A: Action> GoalManager<A> {
    pub(crate) fn new(client_name: &str, core: Arc<ClientCore<A>>) -> Self {
        Self {
            handles: Mutex::new(Vec::new()),
            core,
            id_generator: GoalIdGenerator::new(client_name),
        }
    }

    /// Submit a goal: generate its id, publish the envelope and start
    /// tracking it. The only way goals enter the registry.
    pub(crate) fn init_goal(
        self: &Arc<Self>,
        goal: A::Goal,
        callbacks: Option<Arc<dyn ActionCallbacks<A>>>,
    ) -> ClientGoalHandle<A> {
        let goal_id = self.id_generator.generate();
        let action_goal = ActionGoal {
            header: Header {
                stamp: goal_id.stamp,
                frame_id: String::new(),
            },
            goal_id,
            goal,
        };

        if let Err(e) = self.core.publish_goal(&action_goal) {
            error!(goal_id = %action_goal.goal_id.id, "failed to publish goal: {e}");
        }

        let csm = CommStateMachine::new(action_goal, callbacks);
        let handle = ClientGoalHandle::new(csm, Arc::downgrade(self), self.core.clone());
        self.handles.lock().push(handle.clone());
        handle
    }

    /// Remove one handle from the registry. Not a cancellation.
    pub(crate) fn delete_goal_handle(&self, handle: &ClientGoalHandle<A>) {
        self.handles.lock().retain(|h| !h.same_goal(handle));
    }

    pub(crate) fn update_statuses(&self, array: &GoalStatusArray) {
        for handle in self.handles.lock().iter() {
            handle.csm().update_status(handle, array);
        }
    }

    pub(crate) fn update_feedbacks(&self, feedback: &ActionFeedback<A::Feedback>) {
        for handle in self.handles.lock().iter() {
            handle.csm().update_feedback(handle, feedback);
        }
    }

    pub(crate) fn update_results(&self, result: &ActionResult<A::Result>) {
        for handle in self.handles.lock().iter() {
            handle.csm().update_result(handle, result);
        }
    }

    /// Shut down every tracked handle and empty the registry. No cancel
    /// messages are sent.
    pub(crate) fn clear(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            handle.shutdown(false);
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_count(&self) -> usize {
        self.handles.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosact_core::{CommState, GoalStatus, GoalStatusValue};
    use crate::transport::mem::MemTransport;

    struct Probe;

    impl Action for Probe {
        type Goal = u32;
        type Feedback = u32;
        type Result = u32;
    }

    fn manager() -> Arc<GoalManager<Probe>> {
        let (transport, _server) = MemTransport::open();
        let core = Arc::new(ClientCore::new(Box::new(transport)));
        Arc::new(GoalManager::new("test_client", core))
    }

    #[test]
    fn test_init_goal_tracks_handle() {
        let manager = manager();
        let gh = manager.init_goal(1, None);
        assert_eq!(manager.tracked_count(), 1);
        assert_eq!(gh.comm_state(), CommState::WaitingForGoalAck);
    }

    #[test]
    fn test_registry_isolation() {
        let manager = manager();
        let g1 = manager.init_goal(1, None);
        let g2 = manager.init_goal(2, None);

        let array = GoalStatusArray::single(GoalStatus::new(
            g1.goal_id(),
            GoalStatusValue::Active,
        ));
        manager.update_statuses(&array);

        assert_eq!(g1.comm_state(), CommState::Active);
        assert_eq!(g2.comm_state(), CommState::WaitingForGoalAck);
    }

    #[test]
    fn test_deleted_handle_no_longer_updated() {
        let manager = manager();
        let gh = manager.init_goal(1, None);
        gh.shutdown(true);
        assert_eq!(manager.tracked_count(), 0);
    }

    #[test]
    fn test_clear_expires_all_handles() {
        let manager = manager();
        let g1 = manager.init_goal(1, None);
        let g2 = manager.init_goal(2, None);

        manager.clear();

        assert_eq!(manager.tracked_count(), 0);
        assert!(g1.is_expired());
        assert!(g2.is_expired());
    }
}
