//! Tests for the one-goal-at-a-time client facade.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rosact::transport::mem::{MemServer, MemTransport};
use rosact::{
    Action, ActionFeedback, ActionResult, GoalId, GoalStatus, GoalStatusArray, GoalStatusValue,
    Header, SimpleActionClient, SimpleCallbacks, SimpleClientGoalState,
};

struct Counting;

impl Action for Counting {
    type Goal = u32;
    type Feedback = u32;
    type Result = u32;
}

fn setup() -> (SimpleActionClient<Counting>, MemServer<Counting>) {
    let (transport, server) = MemTransport::open();
    let client =
        SimpleActionClient::new("simple_client", transport).expect("client construction failed");
    server.connect();
    (client, server)
}

fn single_status(id: GoalId, value: GoalStatusValue) -> GoalStatusArray {
    GoalStatusArray::single(GoalStatus::new(id, value))
}

fn result_msg(id: GoalId, value: GoalStatusValue, payload: u32) -> ActionResult<u32> {
    ActionResult {
        header: Header::default(),
        status: GoalStatus::new(id, value),
        result: payload,
    }
}

#[derive(Default)]
struct Events {
    active: AtomicBool,
    feedback: Mutex<Vec<u32>>,
    done: Mutex<Option<(SimpleClientGoalState, Option<u32>)>>,
}

impl SimpleCallbacks<Counting> for Events {
    fn on_active(&self) {
        self.active.store(true, Ordering::Release);
    }

    fn on_feedback(&self, feedback: &u32) {
        self.feedback.lock().unwrap().push(*feedback);
    }

    fn on_done(&self, state: SimpleClientGoalState, result: Option<u32>) {
        *self.done.lock().unwrap() = Some((state, result));
    }
}

#[test]
fn test_success_flow_with_callbacks() {
    let (client, server) = setup();

    let events = Arc::new(Events::default());
    assert!(client.send_goal_with_callbacks(4, events.clone()));
    assert_eq!(client.state(), SimpleClientGoalState::Pending);

    let goal = server
        .recv_goal_timeout(Duration::from_secs(1))
        .expect("goal not published");

    server.publish_status(single_status(goal.goal_id.clone(), GoalStatusValue::Active));
    server.publish_feedback(ActionFeedback {
        header: Header::default(),
        status: GoalStatus::new(goal.goal_id.clone(), GoalStatusValue::Active),
        feedback: 2,
    });
    server.publish_result(result_msg(goal.goal_id, GoalStatusValue::Succeeded, 24));

    assert!(client.wait_for_result(Duration::from_secs(5)));
    assert_eq!(client.state(), SimpleClientGoalState::Succeeded);
    assert_eq!(client.result(), Some(24));

    assert!(events.active.load(Ordering::Acquire));
    assert_eq!(*events.feedback.lock().unwrap(), vec![2]);
    assert_eq!(
        *events.done.lock().unwrap(),
        Some((SimpleClientGoalState::Succeeded, Some(24)))
    );
}

#[test]
fn test_wait_for_result_times_out_without_server_response() {
    let (client, _server) = setup();

    assert!(client.send_goal(1));
    assert!(!client.wait_for_result(Duration::from_millis(30)));
    assert_eq!(client.state(), SimpleClientGoalState::Pending);
}

#[test]
fn test_queries_before_any_goal() {
    let (client, server) = setup();

    assert_eq!(client.state(), SimpleClientGoalState::Lost);
    assert!(client.result().is_none());
    assert!(!client.wait_for_result(Duration::from_millis(10)));
    // Logged, not fatal.
    client.cancel_goal();
    client.stop_tracking_goal();
    assert!(server.try_recv_cancel().is_none());
}

#[test]
fn test_send_goal_and_wait_success() {
    let (client, server) = setup();

    let worker = thread::spawn(move || {
        let goal = server
            .recv_goal_timeout(Duration::from_secs(5))
            .expect("goal not published");
        server.publish_status(single_status(goal.goal_id.clone(), GoalStatusValue::Active));
        server.publish_result(result_msg(goal.goal_id, GoalStatusValue::Succeeded, 99));
    });

    let state = client.send_goal_and_wait(6, Duration::from_secs(5), Duration::from_secs(5));
    assert_eq!(state, SimpleClientGoalState::Succeeded);
    assert_eq!(client.result(), Some(99));
    worker.join().expect("server thread panicked");
}

#[test]
fn test_send_goal_and_wait_preempts_on_timeout() {
    let (client, server) = setup();

    let worker = thread::spawn(move || {
        let goal = server
            .recv_goal_timeout(Duration::from_secs(5))
            .expect("goal not published");
        server.publish_status(single_status(goal.goal_id.clone(), GoalStatusValue::Active));

        // Never finish on our own; only react to the cancel.
        let cancel = server
            .recv_cancel_timeout(Duration::from_secs(5))
            .expect("cancel not published");
        assert_eq!(cancel.id, goal.goal_id.id);
        server.publish_status(single_status(
            goal.goal_id.clone(),
            GoalStatusValue::Preempted,
        ));
        server.publish_result(result_msg(goal.goal_id, GoalStatusValue::Preempted, 0));
    });

    let state = client.send_goal_and_wait(6, Duration::from_millis(100), Duration::from_secs(5));
    assert_eq!(state, SimpleClientGoalState::Preempted);
    worker.join().expect("server thread panicked");
}

#[test]
fn test_new_goal_stops_tracking_previous() {
    let (client, server) = setup();

    assert!(client.send_goal(1));
    let first = server
        .recv_goal_timeout(Duration::from_secs(1))
        .expect("first goal not published");

    assert!(client.send_goal(2));
    let second = server
        .recv_goal_timeout(Duration::from_secs(1))
        .expect("second goal not published");
    assert_ne!(first.goal_id, second.goal_id);

    // A result for the abandoned goal no longer reaches the facade.
    server.publish_result(result_msg(first.goal_id, GoalStatusValue::Aborted, 0));
    assert!(!client.wait_for_result(Duration::from_millis(50)));
    assert_eq!(client.state(), SimpleClientGoalState::Pending);

    server.publish_status(single_status(second.goal_id.clone(), GoalStatusValue::Active));
    server.publish_result(result_msg(second.goal_id, GoalStatusValue::Succeeded, 5));
    assert!(client.wait_for_result(Duration::from_secs(5)));
    assert_eq!(client.state(), SimpleClientGoalState::Succeeded);
    assert_eq!(client.result(), Some(5));
}

#[test]
fn test_cancel_goal_publishes_cancel() {
    let (client, server) = setup();

    assert!(client.send_goal(1));
    let goal = server
        .recv_goal_timeout(Duration::from_secs(1))
        .expect("goal not published");

    client.cancel_goal();
    let cancel = server
        .recv_cancel_timeout(Duration::from_secs(1))
        .expect("cancel not published");
    assert_eq!(cancel.id, goal.goal_id.id);
}

#[test]
fn test_shutdown_refuses_new_goals() {
    let (client, _server) = setup();
    client.shutdown();
    assert!(!client.send_goal(1));
}
