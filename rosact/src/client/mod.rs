//! Action client over a topic transport.
//!
//! [`ActionClient`] tracks any number of concurrent goals; each submission
//! returns a [`ClientGoalHandle`] for querying and cancelling that goal.
//! [`SimpleActionClient`](simple::SimpleActionClient) is a facade for the
//! common one-goal-at-a-time pattern with blocking waits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rosact_core::{Action, ActionGoal, CancelGoal, Time};
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::transport::ActionTransport;

mod comm_state_machine;
mod goal_handle;
mod goal_manager;
pub mod simple;

pub use goal_handle::ClientGoalHandle;
pub use simple::{SimpleActionClient, SimpleCallbacks};

use goal_manager::GoalManager;

/// Per-goal user callbacks, injected at submission time.
///
/// Both methods are invoked synchronously from transport delivery threads
/// while the goal's own lock is held. Querying the passed handle back is
/// fine; submitting, deleting or shutting down goals from inside a
/// callback is not and can deadlock against the registry lock.
pub trait ActionCallbacks<A: Action>: Send + Sync {
    /// Invoked once per communication state transition of the goal.
    fn on_transition(&self, _goal: &ClientGoalHandle<A>) {}

    /// Invoked once per feedback message addressed to the goal.
    fn on_feedback(&self, _goal: &ClientGoalHandle<A>, _feedback: &A::Feedback) {}
}

/// Transport bindings shared by the client, its registry and its handles.
pub(crate) struct ClientCore<A: Action> {
    transport: Box<dyn ActionTransport<A>>,
    active: AtomicBool,
}

impl<A: Action> ClientCore<A> {
    pub(crate) fn new(transport: Box<dyn ActionTransport<A>>) -> Self {
        Self {
            transport,
            active: AtomicBool::new(true),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn transport(&self) -> &dyn ActionTransport<A> {
        &*self.transport
    }

    pub(crate) fn publish_goal(&self, goal: &ActionGoal<A::Goal>) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        self.transport.publish_goal(goal)
    }

    pub(crate) fn publish_cancel(&self, cancel: &CancelGoal) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        self.transport.publish_cancel(cancel)
    }

    /// Release the transport. Returns false if already shut down.
    fn shutdown(&self) -> bool {
        if self.active.swap(false, Ordering::AcqRel) {
            self.transport.shutdown();
            true
        } else {
            false
        }
    }
}

#[derive(Default)]
struct ServerConnection {
    started: Mutex<bool>,
    cond: Condvar,
}

/// Bookkeeping over the status topic as a whole, independent of any goal.
#[derive(Default)]
struct StatusMeta {
    received: bool,
    caller_id: Option<String>,
    last_stamp: Time,
}

/// Client side of one action namespace.
///
/// Binds the five action topics once at construction and never rebinds.
/// Construction is the only operation that can fail hard; afterwards
/// protocol anomalies and misuse degrade to logging.
pub struct ActionClient<A: Action> {
    name: String,
    core: Arc<ClientCore<A>>,
    manager: Arc<GoalManager<A>>,
    connection: Arc<ServerConnection>,
    status_meta: Arc<Mutex<StatusMeta>>,
}

impl<A: Action> ActionClient<A> {
    /// Create a client named `name` over `transport`.
    ///
    /// Subscribes to the status, feedback and result topics; any
    /// subscription failure aborts construction.
    pub fn new(name: &str, transport: impl ActionTransport<A> + 'static) -> Result<Self> {
        let core = Arc::new(ClientCore::new(Box::new(transport)));
        let manager = Arc::new(GoalManager::new(name, core.clone()));
        let connection = Arc::new(ServerConnection::default());
        let status_meta = Arc::new(Mutex::new(StatusMeta::default()));

        {
            let manager = manager.clone();
            let meta = status_meta.clone();
            core.transport().subscribe_status(Box::new(move |array| {
                {
                    let mut meta = meta.lock();
                    if !meta.received {
                        meta.received = true;
                        meta.caller_id = Some(array.header.frame_id.clone());
                        debug!("first status message received from {:?}", array.header.frame_id);
                    } else if meta.caller_id.as_deref() != Some(array.header.frame_id.as_str()) {
                        warn!(
                            "status caller id changed from {:?} to {:?}",
                            meta.caller_id, array.header.frame_id
                        );
                        meta.caller_id = Some(array.header.frame_id.clone());
                    }
                    meta.last_stamp = array.header.stamp;
                }
                manager.update_statuses(&array);
            }))?;
        }

        {
            let manager = manager.clone();
            core.transport()
                .subscribe_feedback(Box::new(move |feedback| {
                    manager.update_feedbacks(&feedback);
                }))?;
        }

        {
            let manager = manager.clone();
            core.transport().subscribe_result(Box::new(move |result| {
                manager.update_results(&result);
            }))?;
        }

        {
            let connection = connection.clone();
            core.transport().subscribe_ready(Box::new(move || {
                *connection.started.lock() = true;
                connection.cond.notify_all();
            }))?;
        }

        Ok(Self {
            name: name.to_string(),
            core,
            manager,
            connection,
            status_meta,
        })
    }

    /// Submit a goal without callbacks.
    ///
    /// Returns `None` after [`shutdown`](Self::shutdown); that misuse is
    /// logged, not fatal.
    pub fn send_goal(&self, goal: A::Goal) -> Option<ClientGoalHandle<A>> {
        self.submit(goal, None)
    }

    /// Submit a goal with per-goal callbacks.
    pub fn send_goal_with_callbacks(
        &self,
        goal: A::Goal,
        callbacks: Arc<dyn ActionCallbacks<A>>,
    ) -> Option<ClientGoalHandle<A>> {
        self.submit(goal, Some(callbacks))
    }

    fn submit(
        &self,
        goal: A::Goal,
        callbacks: Option<Arc<dyn ActionCallbacks<A>>>,
    ) -> Option<ClientGoalHandle<A>> {
        if !self.core.is_active() {
            warn!(client = %self.name, "send_goal called on a shut down client");
            return None;
        }
        Some(self.manager.init_goal(goal, callbacks))
    }

    /// Ask the server to cancel every goal submitted at or before `stamp`.
    pub fn cancel_goals_at_and_before(&self, stamp: Time) {
        if !self.core.is_active() {
            warn!(client = %self.name, "cancel requested on a shut down client");
            return;
        }
        if let Err(e) = self.core.publish_cancel(&CancelGoal::at_and_before(stamp)) {
            error!(client = %self.name, "failed to publish cancel: {e}");
        }
    }

    /// Ask the server to cancel every goal it knows about.
    ///
    /// Encoded as the empty id with the zero stamp; the wire convention
    /// overloads "at or before the epoch" to mean "all".
    pub fn cancel_all_goals(&self) {
        self.cancel_goals_at_and_before(Time::zero());
    }

    /// Whether the action server is currently reachable.
    pub fn is_server_connected(&self) -> bool {
        self.core.is_active() && self.core.transport().is_server_connected()
    }

    /// Block until the action server is reachable.
    ///
    /// A zero `timeout` waits forever. Returns false on timeout.
    pub fn wait_for_server(&self, timeout: Duration) -> bool {
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);
        let mut started = self.connection.started.lock();
        while !*started {
            match deadline {
                Some(deadline) => {
                    self.connection.cond.wait_until(&mut started, deadline);
                    if !*started && Instant::now() >= deadline {
                        return false;
                    }
                }
                None => self.connection.cond.wait(&mut started),
            }
        }
        true
    }

    /// Stamp of the last status snapshot received, or zero if none yet.
    pub fn last_status_stamp(&self) -> Time {
        self.status_meta.lock().last_stamp
    }

    /// Shut the client down: expire every tracked goal and release the
    /// transport bindings. Irreversible and idempotent. No cancel
    /// messages are sent.
    pub fn shutdown(&self) {
        if self.core.shutdown() {
            self.manager.clear();
            self.connection.cond.notify_all();
        }
    }
}

impl<A: Action> Drop for ActionClient<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
