//! Client-side goal lifecycle states and the status transition table.
//!
//! The communication state is never transmitted on the wire; it is derived
//! purely from the sequence of [`GoalStatusValue`]s observed for one goal.
//! The transition table is data, not code-per-state: one pure function maps
//! a `(current state, incoming status)` pair to the ordered list of
//! intermediate states to pass through, which keeps the table exhaustively
//! checkable by the compiler and directly testable.

use crate::msg::GoalStatusValue;

/// Communication state of one goal, client-local.
///
/// `Done` is absorbing: no transition ever leaves it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommState {
    /// Goal sent, no status mentioning it seen yet.
    WaitingForGoalAck,

    /// Server acknowledged the goal but has not started it.
    Pending,

    /// Server is executing the goal.
    Active,

    /// A terminal status was seen; the result message is still outstanding.
    WaitingForResult,

    /// A cancel was sent; no status reflecting it has been seen yet.
    WaitingForCancelAck,

    /// Server is canceling the goal before execution started.
    Recalling,

    /// Server is canceling the goal during execution.
    Preempting,

    /// Terminal. The goal's outcome is fixed.
    Done,
}

/// Outcome classification of a goal once its [`CommState`] is `Done`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TerminalStatus {
    /// Canceled before execution started.
    Recalled,

    /// Refused without being processed.
    Rejected,

    /// Canceled during execution.
    Preempted,

    /// Achieved.
    Succeeded,

    /// Aborted by the server during execution.
    Aborted,

    /// The server stopped tracking the goal, or the outcome is unknowable.
    Lost,
}

impl TerminalStatus {
    /// Maps a terminal wire status to its outcome classification. In-flight
    /// statuses (pending, active, preempting, recalling) have no terminal
    /// reading and map to `None`.
    pub fn from_status(value: GoalStatusValue) -> Option<Self> {
        match value {
            GoalStatusValue::Preempted => Some(Self::Preempted),
            GoalStatusValue::Succeeded => Some(Self::Succeeded),
            GoalStatusValue::Aborted => Some(Self::Aborted),
            GoalStatusValue::Rejected => Some(Self::Rejected),
            GoalStatusValue::Recalled => Some(Self::Recalled),
            GoalStatusValue::Lost => Some(Self::Lost),
            GoalStatusValue::Pending
            | GoalStatusValue::Active
            | GoalStatusValue::Preempting
            | GoalStatusValue::Recalling => None,
        }
    }
}

/// Terminal outcome with the server's annotation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalState {
    /// Outcome classification.
    pub status: TerminalStatus,

    /// Annotation from the last goal status, if any.
    pub text: String,
}

impl TerminalState {
    /// A terminal state with annotation text.
    pub fn new(status: TerminalStatus, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
        }
    }

    /// The conservative default outcome.
    pub fn lost() -> Self {
        Self::new(TerminalStatus::Lost, "")
    }
}

/// Collapsed three-state goal lifecycle used by the simple client facade.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SimpleGoalState {
    /// Goal not yet being executed.
    Pending,

    /// Goal is being executed.
    Active,

    /// Goal reached a terminal state.
    Done,
}

/// Goal outcome as reported by the simple client facade.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SimpleClientGoalState {
    /// Goal not yet being executed.
    Pending,

    /// Goal is being executed.
    Active,

    /// Canceled before execution started.
    Recalled,

    /// Refused without being processed.
    Rejected,

    /// Canceled during execution.
    Preempted,

    /// Aborted by the server during execution.
    Aborted,

    /// Achieved.
    Succeeded,

    /// Outcome unknowable.
    Lost,
}

impl From<TerminalStatus> for SimpleClientGoalState {
    fn from(t: TerminalStatus) -> Self {
        match t {
            TerminalStatus::Recalled => Self::Recalled,
            TerminalStatus::Rejected => Self::Rejected,
            TerminalStatus::Preempted => Self::Preempted,
            TerminalStatus::Succeeded => Self::Succeeded,
            TerminalStatus::Aborted => Self::Aborted,
            TerminalStatus::Lost => Self::Lost,
        }
    }
}

/// What a `(current state, incoming status)` pair prescribes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Legal but redundant; the state does not change.
    Stay,

    /// Protocol violation; logged by the caller, state held steady.
    Invalid,

    /// Pass through these states in order. Some incoming statuses imply
    /// several intermediate transitions.
    Steps(&'static [CommState]),
}

use CommState::*;
use GoalStatusValue as S;
use Transition::{Invalid, Stay, Steps};

/// The goal status transition table.
///
/// Covers every `(CommState, GoalStatusValue)` pair. `Lost` is assigned
/// client-side only; a server sending it is a protocol violation in every
/// state.
pub fn status_transitions(from: CommState, incoming: GoalStatusValue) -> Transition {
    match (from, incoming) {
        (_, S::Lost) => Invalid,

        (WaitingForGoalAck, S::Pending) => Steps(&[Pending]),
        (WaitingForGoalAck, S::Active) => Steps(&[Active]),
        (WaitingForGoalAck, S::Preempted) => Steps(&[Active, Preempting, WaitingForResult]),
        (WaitingForGoalAck, S::Succeeded | S::Aborted) => Steps(&[Active, WaitingForResult]),
        (WaitingForGoalAck, S::Rejected | S::Recalled) => Steps(&[Pending, WaitingForResult]),
        (WaitingForGoalAck, S::Preempting) => Steps(&[Active, Preempting]),
        (WaitingForGoalAck, S::Recalling) => Steps(&[Pending, Recalling]),

        (Pending, S::Pending) => Stay,
        (Pending, S::Active) => Steps(&[Active]),
        (Pending, S::Preempted) => Steps(&[Active, Preempting, WaitingForResult]),
        (Pending, S::Succeeded | S::Aborted) => Steps(&[Active, WaitingForResult]),
        (Pending, S::Rejected) => Steps(&[WaitingForResult]),
        (Pending, S::Recalled) => Steps(&[Recalling, WaitingForResult]),
        (Pending, S::Preempting) => Steps(&[Active, Preempting]),
        (Pending, S::Recalling) => Steps(&[Recalling]),

        (Active, S::Active) => Stay,
        (Active, S::Preempted) => Steps(&[Preempting, WaitingForResult]),
        (Active, S::Succeeded | S::Aborted) => Steps(&[WaitingForResult]),
        (Active, S::Preempting) => Steps(&[Preempting]),
        (Active, S::Pending | S::Rejected | S::Recalling | S::Recalled) => Invalid,

        // Late echoes of already-seen statuses are legal while the result
        // is outstanding.
        (
            WaitingForResult,
            S::Active | S::Preempted | S::Succeeded | S::Aborted | S::Rejected | S::Recalled,
        ) => Stay,
        (WaitingForResult, S::Pending | S::Preempting | S::Recalling) => Invalid,

        (WaitingForCancelAck, S::Pending | S::Active) => Stay,
        (WaitingForCancelAck, S::Succeeded | S::Aborted | S::Preempted) => {
            Steps(&[Preempting, WaitingForResult])
        }
        (WaitingForCancelAck, S::Recalled) => Steps(&[Recalling, WaitingForResult]),
        (WaitingForCancelAck, S::Rejected) => Steps(&[WaitingForResult]),
        (WaitingForCancelAck, S::Preempting) => Steps(&[Preempting]),
        (WaitingForCancelAck, S::Recalling) => Steps(&[Recalling]),

        (Recalling, S::Succeeded | S::Aborted | S::Preempted) => {
            Steps(&[Preempting, WaitingForResult])
        }
        (Recalling, S::Recalled | S::Rejected) => Steps(&[WaitingForResult]),
        (Recalling, S::Preempting) => Steps(&[Preempting]),
        (Recalling, S::Recalling) => Stay,
        (Recalling, S::Pending | S::Active) => Invalid,

        (Preempting, S::Preempted | S::Succeeded | S::Aborted) => Steps(&[WaitingForResult]),
        (Preempting, S::Preempting) => Stay,
        (Preempting, S::Pending | S::Active | S::Rejected | S::Recalling | S::Recalled) => Invalid,

        (Done, S::Preempted | S::Succeeded | S::Aborted | S::Recalled | S::Rejected) => Stay,
        (Done, S::Pending | S::Active | S::Recalling | S::Preempting) => Invalid,
    }
}
