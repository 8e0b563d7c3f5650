//! Actionlib-style action client over a pub/sub topic transport.
//!
//! An action is a goal-oriented request carried over five independent
//! topics: the client publishes goal and cancel envelopes, the server
//! pushes status snapshots, feedback and exactly one result per goal.
//! Messages arrive asynchronously, possibly reordered across topics,
//! possibly never; this crate reconstructs a coherent per-goal lifecycle
//! from that traffic.
//!
//! [`ActionClient`] tracks any number of concurrent goals, each owned by
//! a [`ClientGoalHandle`]. [`SimpleActionClient`] is the facade for the
//! one-goal-at-a-time pattern. The transport is pluggable through
//! [`transport::ActionTransport`]; [`transport::mem`] ships an
//! in-process implementation.
//!
//! # Example
//!
//! ```ignore
//! use rosact::{ActionClient, transport::mem::MemTransport};
//! use std::time::Duration;
//!
//! struct Fibonacci;
//! impl rosact::Action for Fibonacci {
//!     type Goal = u32;
//!     type Feedback = Vec<u64>;
//!     type Result = Vec<u64>;
//! }
//!
//! let (transport, server) = MemTransport::<Fibonacci>::open();
//! let client = ActionClient::new("fib_client", transport)?;
//! server.connect();
//! client.wait_for_server(Duration::from_secs(1));
//!
//! let goal = client.send_goal(10).unwrap();
//! // ... server publishes status and a result ...
//! # Ok::<(), rosact::Error>(())
//! ```

pub mod client;
pub mod error;
pub mod goal_id;
pub mod logger;
pub mod transport;

pub use client::{
    ActionCallbacks, ActionClient, ClientGoalHandle, SimpleActionClient, SimpleCallbacks,
};
pub use error::{Error, Result};
pub use goal_id::GoalIdGenerator;

pub use rosact_core::{
    Action, ActionFeedback, ActionGoal, ActionResult, CancelGoal, CommState, GoalId, GoalStatus,
    GoalStatusArray, GoalStatusValue, Header, SimpleClientGoalState, SimpleGoalState,
    TerminalState, TerminalStatus, Time,
};
