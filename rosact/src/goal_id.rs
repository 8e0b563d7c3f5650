//! Goal id generation.

use std::sync::atomic::{AtomicU64, Ordering};

use rosact_core::{GoalId, Time};

/// Generates goal ids unique for the lifetime of one client.
///
/// Ids combine the owning client's name, a monotonically increasing
/// sequence number and the submission timestamp, so concurrent clients in
/// the same process never collide and ids stay readable in logs.
pub struct GoalIdGenerator {
    name: String,
    seq: AtomicU64,
}

impl GoalIdGenerator {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            seq: AtomicU64::new(0),
        }
    }

    /// A fresh goal id stamped with the current wall-clock time.
    pub fn generate(&self) -> GoalId {
        let stamp = Time::now();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        GoalId {
            id: format!("{}-{}-{}.{}", self.name, seq, stamp.sec, stamp.nanosec),
            stamp,
        }
    }
}
