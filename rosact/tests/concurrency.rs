//! Concurrent fan-out stress tests.
//!
//! Status snapshots, results and user-thread queries hit the same set of
//! goals from independent threads. The assertions check that every goal
//! ends in a state a sequential replay of the same traffic could produce
//! and that transition sequences are never torn.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use rosact::transport::mem::MemTransport;
use rosact::{
    Action, ActionCallbacks, ActionClient, ActionResult, ClientGoalHandle, CommState, GoalId,
    GoalStatus, GoalStatusArray, GoalStatusValue, Header, TerminalStatus,
};

struct Stress;

impl Action for Stress {
    type Goal = usize;
    type Feedback = ();
    type Result = usize;
}

struct Trace {
    transitions: Mutex<Vec<CommState>>,
}

impl ActionCallbacks<Stress> for Trace {
    fn on_transition(&self, goal: &ClientGoalHandle<Stress>) {
        self.transitions.lock().unwrap().push(goal.comm_state());
    }
}

fn snapshot(ids: &[GoalId], value: GoalStatusValue) -> GoalStatusArray {
    GoalStatusArray {
        header: Header::default(),
        status_list: ids
            .iter()
            .map(|id| GoalStatus::new(id.clone(), value))
            .collect(),
    }
}

#[test]
fn test_concurrent_fanout_leaves_no_torn_state() {
    const GOALS: usize = 50;
    const SNAPSHOTS: usize = 1000;

    let (transport, server) = MemTransport::<Stress>::open();
    let client = ActionClient::new("stress_client", transport).expect("client construction failed");
    server.connect();

    let mut handles = Vec::with_capacity(GOALS);
    let mut traces = Vec::with_capacity(GOALS);
    for i in 0..GOALS {
        let trace = Arc::new(Trace {
            transitions: Mutex::new(Vec::new()),
        });
        let gh = client
            .send_goal_with_callbacks(i, trace.clone())
            .expect("send_goal failed");
        handles.push(gh);
        traces.push(trace);
    }
    let ids: Vec<GoalId> = handles.iter().map(|h| h.goal_id()).collect();

    // The first half of the goals get a result; the rest only see status
    // traffic.
    let finished = GOALS / 2;

    let server = Arc::new(server);
    let status_server = server.clone();
    let status_ids = ids.clone();
    let status_thread = thread::spawn(move || {
        for round in 0..SNAPSHOTS {
            let value = if round % 2 == 0 {
                GoalStatusValue::Pending
            } else {
                GoalStatusValue::Active
            };
            status_server.publish_status(snapshot(&status_ids, value));
        }
        // Settle every goal that never gets a result on a known value.
        status_server.publish_status(snapshot(&status_ids, GoalStatusValue::Active));
    });

    let result_server = server.clone();
    let result_ids = ids.clone();
    let result_thread = thread::spawn(move || {
        for (i, id) in result_ids.iter().take(finished).enumerate() {
            result_server.publish_result(ActionResult {
                header: Header::default(),
                status: GoalStatus::new(id.clone(), GoalStatusValue::Succeeded),
                result: i,
            });
        }
    });

    // User-thread reads race the delivery threads the whole time.
    let reader_handles = handles.clone();
    let reader_thread = thread::spawn(move || {
        let until = Instant::now() + Duration::from_millis(200);
        while Instant::now() < until {
            for gh in &reader_handles {
                let _ = gh.comm_state();
                let _ = gh.latest_goal_status();
            }
        }
    });

    status_thread.join().expect("status thread panicked");
    result_thread.join().expect("result thread panicked");
    reader_thread.join().expect("reader thread panicked");

    let deadline = Instant::now() + Duration::from_secs(10);
    let settled = |gh: &ClientGoalHandle<Stress>, i: usize| {
        if i < finished {
            gh.comm_state() == CommState::Done
        } else {
            gh.comm_state() == CommState::Active
        }
    };
    while Instant::now() < deadline
        && !handles.iter().enumerate().all(|(i, gh)| settled(gh, i))
    {
        thread::sleep(Duration::from_millis(5));
    }

    for (i, gh) in handles.iter().enumerate() {
        if i < finished {
            assert_eq!(gh.comm_state(), CommState::Done, "goal {i}");
            assert_eq!(gh.terminal_state().status, TerminalStatus::Succeeded);
            assert_eq!(gh.result(), Some(i));
        } else {
            assert_eq!(gh.comm_state(), CommState::Active, "goal {i}");
            assert_eq!(
                gh.latest_goal_status().expect("status seen").value(),
                Some(GoalStatusValue::Active)
            );
        }
    }

    // Per-goal transition sequences must be valid sequential paths: done
    // is final, and only expected states ever appear.
    for (i, trace) in traces.iter().enumerate() {
        let seen = trace.transitions.lock().unwrap();
        assert!(!seen.is_empty(), "goal {i} saw no transitions");
        if let Some(pos) = seen.iter().position(|s| *s == CommState::Done) {
            assert_eq!(pos, seen.len() - 1, "goal {i} transitioned after done");
        }
        for state in seen.iter() {
            assert!(
                matches!(
                    state,
                    CommState::Pending
                        | CommState::Active
                        | CommState::WaitingForResult
                        | CommState::Done
                ),
                "goal {i} reached unexpected state {state:?}"
            );
        }
    }
}

#[test]
fn test_concurrent_submission_and_delivery() {
    const SUBMITTERS: usize = 4;
    const PER_THREAD: usize = 25;

    let (transport, server) = MemTransport::<Stress>::open();
    let client =
        Arc::new(ActionClient::new("stress_client", transport).expect("client construction failed"));
    server.connect();
    let server = Arc::new(server);

    // Status noise for unknown goals runs while goals are being submitted.
    let noise_server = server.clone();
    let noise = thread::spawn(move || {
        let ids = [GoalId {
            id: "foreign-0-1.0".into(),
            stamp: rosact::Time::new(1, 0),
        }];
        for _ in 0..500 {
            noise_server.publish_status(snapshot(&ids, GoalStatusValue::Active));
        }
    });

    let mut workers = Vec::new();
    for _ in 0..SUBMITTERS {
        let client = client.clone();
        workers.push(thread::spawn(move || {
            let mut handles = Vec::new();
            for i in 0..PER_THREAD {
                handles.push(client.send_goal(i).expect("send_goal failed"));
            }
            handles
        }));
    }

    let mut all = Vec::new();
    for worker in workers {
        all.extend(worker.join().expect("submitter panicked"));
    }
    noise.join().expect("noise thread panicked");

    assert_eq!(all.len(), SUBMITTERS * PER_THREAD);
    // Ids are unique across submitter threads and no goal was disturbed
    // by the foreign status traffic.
    let mut ids: Vec<String> = all.iter().map(|gh| gh.goal_id().id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), SUBMITTERS * PER_THREAD);
    for gh in &all {
        assert_eq!(gh.comm_state(), CommState::WaitingForGoalAck);
    }
}
