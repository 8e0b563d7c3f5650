//! Core types for the rosact action client library.
//!
//! This crate holds everything that is independent of a concrete topic
//! transport: the actionlib message shapes, the client-side communication
//! states, and the goal status transition table. The `rosact` crate builds
//! the actual client on top of these.

pub mod error;
pub mod msg;
pub mod state;
pub mod time;

pub use error::{CoreError, DynError};
pub use msg::{
    Action, ActionFeedback, ActionGoal, ActionResult, CancelGoal, GoalId, GoalStatus,
    GoalStatusArray, GoalStatusValue, Header, status,
};
pub use state::{
    CommState, SimpleClientGoalState, SimpleGoalState, TerminalState, TerminalStatus, Transition,
    status_transitions,
};
pub use time::Time;
