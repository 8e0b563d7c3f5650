//! In-process loopback transport.
//!
//! [`MemTransport::open`] returns the client half together with a
//! [`MemServer`] giving the server side of the five action topics. Each
//! server-to-client topic is an unbounded channel drained by its own
//! delivery thread, so callbacks fire asynchronously and independently per
//! topic, exactly like a networked transport. Used by action servers
//! running in the same process and by the integration tests.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, select, unbounded};
use parking_lot::Mutex;
use rosact_core::{Action, ActionFeedback, ActionGoal, ActionResult, CancelGoal, GoalStatusArray};

use crate::error::{Error, Result};
use crate::transport::{
    ActionTransport, FeedbackCallback, ReadyCallback, ResultCallback, StatusCallback,
};

struct Shared {
    connected: AtomicBool,
    ready_callbacks: Mutex<Vec<ReadyCallback>>,
}

/// Client half of an in-process action topic pair.
pub struct MemTransport<A: Action> {
    goal_tx: Sender<ActionGoal<A::Goal>>,
    cancel_tx: Sender<CancelGoal>,
    status_rx: Mutex<Option<Receiver<GoalStatusArray>>>,
    feedback_rx: Mutex<Option<Receiver<ActionFeedback<A::Feedback>>>>,
    result_rx: Mutex<Option<Receiver<ActionResult<A::Result>>>>,
    // Dropping the sender disconnects every delivery thread.
    halt_tx: Mutex<Option<Sender<()>>>,
    halt_rx: Receiver<()>,
    shared: Arc<Shared>,
}

/// Server half of an in-process action topic pair.
pub struct MemServer<A: Action> {
    status_tx: Sender<GoalStatusArray>,
    feedback_tx: Sender<ActionFeedback<A::Feedback>>,
    result_tx: Sender<ActionResult<A::Result>>,
    goal_rx: Receiver<ActionGoal<A::Goal>>,
    cancel_rx: Receiver<CancelGoal>,
    shared: Arc<Shared>,
}

impl<A: Action> MemTransport<A> {
    /// Create a connected transport/server pair.
    ///
    /// The pair starts disconnected: `wait_for_server` style operations
    /// block until [`MemServer::connect`] is called.
    pub fn open() -> (Self, MemServer<A>) {
        let (goal_tx, goal_rx) = unbounded();
        let (cancel_tx, cancel_rx) = unbounded();
        let (status_tx, status_rx) = unbounded();
        let (feedback_tx, feedback_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        let (halt_tx, halt_rx) = unbounded();

        let shared = Arc::new(Shared {
            connected: AtomicBool::new(false),
            ready_callbacks: Mutex::new(Vec::new()),
        });

        let transport = MemTransport {
            goal_tx,
            cancel_tx,
            status_rx: Mutex::new(Some(status_rx)),
            feedback_rx: Mutex::new(Some(feedback_rx)),
            result_rx: Mutex::new(Some(result_rx)),
            halt_tx: Mutex::new(Some(halt_tx)),
            halt_rx,
            shared: shared.clone(),
        };

        let server = MemServer {
            status_tx,
            feedback_tx,
            result_tx,
            goal_rx,
            cancel_rx,
            shared,
        };

        (transport, server)
    }

    fn spawn_delivery<T: Send + 'static>(
        &self,
        name: &str,
        rx: Receiver<T>,
        callback: impl Fn(T) + Send + Sync + 'static,
    ) -> Result<()> {
        let halt = self.halt_rx.clone();
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                loop {
                    select! {
                        recv(rx) -> msg => match msg {
                            Ok(msg) => callback(msg),
                            Err(_) => break,
                        },
                        recv(halt) -> msg => {
                            if msg.is_err() {
                                break;
                            }
                        }
                    }
                }
            })
            .map_err(|e| Error::Transport(Box::new(e)))?;
        Ok(())
    }
}

impl<A: Action> ActionTransport<A> for MemTransport<A> {
    fn publish_goal(&self, goal: &ActionGoal<A::Goal>) -> Result<()> {
        self.goal_tx
            .send(goal.clone())
            .map_err(|_| Error::ChannelClosed)
    }

    fn publish_cancel(&self, cancel: &CancelGoal) -> Result<()> {
        self.cancel_tx
            .send(cancel.clone())
            .map_err(|_| Error::ChannelClosed)
    }

    fn subscribe_status(&self, callback: StatusCallback) -> Result<()> {
        let rx = self.status_rx.lock().take().ok_or(Error::ChannelClosed)?;
        self.spawn_delivery("rosact-status", rx, move |msg| callback(msg))
    }

    fn subscribe_feedback(&self, callback: FeedbackCallback<A>) -> Result<()> {
        let rx = self.feedback_rx.lock().take().ok_or(Error::ChannelClosed)?;
        self.spawn_delivery("rosact-feedback", rx, move |msg| callback(msg))
    }

    fn subscribe_result(&self, callback: ResultCallback<A>) -> Result<()> {
        let rx = self.result_rx.lock().take().ok_or(Error::ChannelClosed)?;
        self.spawn_delivery("rosact-result", rx, move |msg| callback(msg))
    }

    fn subscribe_ready(&self, callback: ReadyCallback) -> Result<()> {
        if self.shared.connected.load(Ordering::Acquire) {
            callback();
        } else {
            self.shared.ready_callbacks.lock().push(callback);
        }
        Ok(())
    }

    fn is_server_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    fn shutdown(&self) {
        // Dropping the halt sender disconnects the delivery threads.
        self.halt_tx.lock().take();
    }
}

impl<A: Action> MemServer<A> {
    /// Mark the server reachable and fire pending ready callbacks.
    pub fn connect(&self) {
        self.shared.connected.store(true, Ordering::Release);
        for callback in self.shared.ready_callbacks.lock().drain(..) {
            callback();
        }
    }

    /// Push a status snapshot to the client.
    pub fn publish_status(&self, statuses: GoalStatusArray) {
        let _ = self.status_tx.send(statuses);
    }

    /// Push a feedback envelope to the client.
    pub fn publish_feedback(&self, feedback: ActionFeedback<A::Feedback>) {
        let _ = self.feedback_tx.send(feedback);
    }

    /// Push a result envelope to the client.
    pub fn publish_result(&self, result: ActionResult<A::Result>) {
        let _ = self.result_tx.send(result);
    }

    /// Take the next goal envelope published by the client, if any.
    pub fn try_recv_goal(&self) -> Option<ActionGoal<A::Goal>> {
        self.goal_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for a goal envelope from the client.
    pub fn recv_goal_timeout(&self, timeout: Duration) -> Option<ActionGoal<A::Goal>> {
        self.goal_rx.recv_timeout(timeout).ok()
    }

    /// Take the next cancel envelope published by the client, if any.
    pub fn try_recv_cancel(&self) -> Option<CancelGoal> {
        self.cancel_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for a cancel envelope from the client.
    pub fn recv_cancel_timeout(&self, timeout: Duration) -> Option<CancelGoal> {
        self.cancel_rx.recv_timeout(timeout).ok()
    }
}
