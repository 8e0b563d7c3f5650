//! Actionlib message shapes.
//!
//! These mirror the `actionlib_msgs` wire types: an action goal is the user
//! goal wrapped with a [`GoalId`], feedback and results are the user payload
//! wrapped with the originating goal's [`GoalStatus`], and the server
//! periodically pushes a [`GoalStatusArray`] snapshot of every goal it
//! currently tracks.

use crate::error::CoreError;
use crate::time::Time;

/// An action definition: the three user payload types exchanged for one
/// goal. Implemented once per action type and never instantiated.
pub trait Action: Send + Sync + 'static {
    /// The request payload submitted to the server.
    type Goal: Clone + Send + Sync + 'static;

    /// The progress payload the server sends while working on a goal.
    type Feedback: Clone + Send + Sync + 'static;

    /// The terminal payload the server sends once per goal.
    type Result: Clone + Send + Sync + 'static;
}

/// Standard message header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Time the message was stamped by its sender.
    pub stamp: Time,

    /// Identity of the sending node.
    pub frame_id: String,
}

/// Identifies one submitted goal for the lifetime of a client.
///
/// The id string is the join key across the status, feedback and result
/// streams; it is generated once at submission and never regenerated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GoalId {
    /// Unique id string.
    pub id: String,

    /// Submission timestamp.
    pub stamp: Time,
}

/// Wire values for [`GoalStatus::status`], as defined by actionlib_msgs.
pub mod status {
    pub const PENDING: u8 = 0;
    pub const ACTIVE: u8 = 1;
    pub const PREEMPTED: u8 = 2;
    pub const SUCCEEDED: u8 = 3;
    pub const ABORTED: u8 = 4;
    pub const REJECTED: u8 = 5;
    pub const PREEMPTING: u8 = 6;
    pub const RECALLING: u8 = 7;
    pub const RECALLED: u8 = 8;
    /// Client-side only: the server forgot the goal.
    pub const LOST: u8 = 9;
}

/// Decoded goal status value.
///
/// The wire carries a raw `u8`; values outside this enumeration decode to
/// `None` and are logged (not acted on) by the state machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GoalStatusValue {
    /// Goal has yet to be processed by the server.
    Pending,

    /// Goal is currently being processed.
    Active,

    /// Goal was preempted after it started executing.
    Preempted,

    /// Goal was achieved.
    Succeeded,

    /// Goal was aborted by the server during execution.
    Aborted,

    /// Goal was rejected without being processed.
    Rejected,

    /// A cancel request reached the goal after it started executing.
    Preempting,

    /// A cancel request reached the goal before it started executing.
    Recalling,

    /// Goal was canceled before it started executing.
    Recalled,

    /// The server no longer tracks the goal. Never sent by a server;
    /// assigned client-side.
    Lost,
}

impl GoalStatusValue {
    /// Decodes a wire status byte. Returns `None` for unknown values.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            status::PENDING => Some(Self::Pending),
            status::ACTIVE => Some(Self::Active),
            status::PREEMPTED => Some(Self::Preempted),
            status::SUCCEEDED => Some(Self::Succeeded),
            status::ABORTED => Some(Self::Aborted),
            status::REJECTED => Some(Self::Rejected),
            status::PREEMPTING => Some(Self::Preempting),
            status::RECALLING => Some(Self::Recalling),
            status::RECALLED => Some(Self::Recalled),
            status::LOST => Some(Self::Lost),
            _ => None,
        }
    }

    /// Like [`from_raw`](Self::from_raw), but unknown values become a
    /// [`CoreError`] for callers that treat them as failures.
    pub fn try_from_raw(raw: u8) -> Result<Self, CoreError> {
        Self::from_raw(raw).ok_or(CoreError::UnknownStatusValue(raw))
    }

    /// The wire encoding of this value.
    pub fn as_raw(self) -> u8 {
        match self {
            Self::Pending => status::PENDING,
            Self::Active => status::ACTIVE,
            Self::Preempted => status::PREEMPTED,
            Self::Succeeded => status::SUCCEEDED,
            Self::Aborted => status::ABORTED,
            Self::Rejected => status::REJECTED,
            Self::Preempting => status::PREEMPTING,
            Self::Recalling => status::RECALLING,
            Self::Recalled => status::RECALLED,
            Self::Lost => status::LOST,
        }
    }
}

/// Server-reported status snapshot for one goal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalStatus {
    /// The goal this status refers to.
    pub goal_id: GoalId,

    /// Raw wire status value (see [`status`]).
    pub status: u8,

    /// Human-readable annotation from the server.
    pub text: String,
}

impl GoalStatus {
    /// A status snapshot with the given decoded value and no text.
    pub fn new(goal_id: GoalId, value: GoalStatusValue) -> Self {
        Self {
            goal_id,
            status: value.as_raw(),
            text: String::new(),
        }
    }

    /// Decodes the raw status byte. `None` for unknown wire values.
    pub fn value(&self) -> Option<GoalStatusValue> {
        GoalStatusValue::from_raw(self.status)
    }
}

/// Periodic server snapshot of every goal it currently tracks.
#[derive(Debug, Clone, Default)]
pub struct GoalStatusArray {
    /// Stamp and sender identity of the snapshot.
    pub header: Header,

    /// One entry per goal the server knows about. At most one entry per
    /// goal id.
    pub status_list: Vec<GoalStatus>,
}

impl GoalStatusArray {
    /// A snapshot containing a single status entry.
    pub fn single(status: GoalStatus) -> Self {
        Self {
            header: Header::default(),
            status_list: vec![status],
        }
    }
}

/// Goal envelope published on the goal topic.
#[derive(Debug, Clone)]
pub struct ActionGoal<G> {
    /// Submission stamp and sender identity.
    pub header: Header,

    /// The id this goal is tracked under.
    pub goal_id: GoalId,

    /// User goal payload.
    pub goal: G,
}

/// Feedback envelope delivered on the feedback topic.
#[derive(Debug, Clone)]
pub struct ActionFeedback<F> {
    /// Stamp and sender identity.
    pub header: Header,

    /// Status of the goal this feedback belongs to.
    pub status: GoalStatus,

    /// User feedback payload.
    pub feedback: F,
}

/// Result envelope delivered on the result topic. Exactly one per goal
/// under normal operation.
#[derive(Debug, Clone)]
pub struct ActionResult<R> {
    /// Stamp and sender identity.
    pub header: Header,

    /// Terminal status of the goal this result belongs to.
    pub status: GoalStatus,

    /// User result payload.
    pub result: R,
}

/// Cancel envelope published on the cancel topic.
///
/// An empty id with a non-zero stamp means "cancel every goal submitted at
/// or before this time"; an empty id with the zero stamp means "cancel all
/// goals". The overload is a protocol convention and preserved as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelGoal {
    /// Id of the goal to cancel, or empty for the time-based forms.
    pub id: String,

    /// Cutoff time for the empty-id forms.
    pub stamp: Time,
}

impl CancelGoal {
    /// Cancel exactly one goal.
    pub fn for_goal(id: &GoalId) -> Self {
        Self {
            id: id.id.clone(),
            stamp: Time::zero(),
        }
    }

    /// Cancel every goal submitted at or before `stamp`.
    pub fn at_and_before(stamp: Time) -> Self {
        Self {
            id: String::new(),
            stamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for raw in 0u8..=9 {
            let value = GoalStatusValue::from_raw(raw).expect("known value");
            assert_eq!(value.as_raw(), raw);
        }
    }

    #[test]
    fn test_unknown_status_value() {
        assert_eq!(GoalStatusValue::from_raw(10), None);
        assert_eq!(GoalStatusValue::from_raw(255), None);
        assert!(matches!(
            GoalStatusValue::try_from_raw(10),
            Err(CoreError::UnknownStatusValue(10))
        ));

        let gs = GoalStatus {
            goal_id: GoalId::default(),
            status: 42,
            text: String::new(),
        };
        assert_eq!(gs.value(), None);
    }

    #[test]
    fn test_cancel_envelopes() {
        let id = GoalId {
            id: "client-1-100.0".into(),
            stamp: Time::new(100, 0),
        };
        let one = CancelGoal::for_goal(&id);
        assert_eq!(one.id, "client-1-100.0");
        assert!(one.stamp.is_zero());

        let all = CancelGoal::at_and_before(Time::zero());
        assert!(all.id.is_empty());
        assert!(all.stamp.is_zero());
    }
}
