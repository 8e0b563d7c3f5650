//! The topic transport contract consumed by the action client.
//!
//! An action is carried over five topics fixed by protocol convention
//! relative to an action namespace: `goal` and `cancel` (client to server)
//! and `status`, `feedback` and `result` (server to client). The transport
//! delivers messages at least once, asynchronously, with no ordering
//! guarantee across topics and no built-in retry; the client's state
//! machine is built to tolerate exactly that.

use rosact_core::{Action, ActionFeedback, ActionGoal, ActionResult, CancelGoal, GoalStatusArray};

use crate::error::Result;

pub mod mem;

/// Callback invoked once per arriving status snapshot.
pub type StatusCallback = Box<dyn Fn(GoalStatusArray) + Send + Sync>;

/// Callback invoked once per arriving feedback envelope.
pub type FeedbackCallback<A> = Box<dyn Fn(ActionFeedback<<A as Action>::Feedback>) + Send + Sync>;

/// Callback invoked once per arriving result envelope.
pub type ResultCallback<A> = Box<dyn Fn(ActionResult<<A as Action>::Result>) + Send + Sync>;

/// Callback invoked when the server side of the action topics is connected.
pub type ReadyCallback = Box<dyn Fn() + Send + Sync>;

/// A bound set of action topics.
///
/// Publishing is fire-and-forget: no delivery confirmation, no ordering
/// relative to other topics. Subscription callbacks are invoked zero or
/// more times, asynchronously, from transport-owned delivery threads, for
/// the lifetime of the subscription. Implementations must be safe to call
/// from any thread.
///
/// Subscription failure at client construction is the one hard failure
/// class of this crate; everything after construction degrades to logging.
pub trait ActionTransport<A: Action>: Send + Sync {
    /// Publish a goal envelope on the goal topic.
    fn publish_goal(&self, goal: &ActionGoal<A::Goal>) -> Result<()>;

    /// Publish a cancel envelope on the cancel topic.
    fn publish_cancel(&self, cancel: &CancelGoal) -> Result<()>;

    /// Register the status topic callback.
    fn subscribe_status(&self, callback: StatusCallback) -> Result<()>;

    /// Register the feedback topic callback.
    fn subscribe_feedback(&self, callback: FeedbackCallback<A>) -> Result<()>;

    /// Register the result topic callback.
    fn subscribe_result(&self, callback: ResultCallback<A>) -> Result<()>;

    /// Register a callback fired when the action server is reachable on
    /// all five topics. May fire immediately if it already is.
    fn subscribe_ready(&self, callback: ReadyCallback) -> Result<()>;

    /// Whether the action server is currently reachable.
    fn is_server_connected(&self) -> bool;

    /// Release the topic bindings. Irreversible; delivery threads stop and
    /// no further callbacks are invoked.
    fn shutdown(&self);
}
