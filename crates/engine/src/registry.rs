//! Run Registry - which robots currently have an execution task
//!
//! Admission is a single check-and-insert on the map entry, so two
//! schedulers polling at once can never start the same robot twice.
//! No I/O happens while an entry is locked.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use talos_core::{RobotId, TradePhase};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct RunEntry {
    phase: TradePhase,
    cancel: CancellationToken,
}

/// Shared map of running robots
#[derive(Debug)]
pub struct RunRegistry {
    entries: DashMap<RobotId, RunEntry>,
    /// Parent of every task token; cancelled on shutdown
    root: CancellationToken,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            root: CancellationToken::new(),
        }
    }

    /// Claim a robot for a new task
    ///
    /// Returns the task's cancellation token, or `None` when the robot
    /// is already running. Never waits.
    pub fn acquire(&self, id: RobotId) -> Option<CancellationToken> {
        match self.entries.entry(id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let cancel = self.root.child_token();
                slot.insert(RunEntry {
                    phase: TradePhase::Sold,
                    cancel: cancel.clone(),
                });
                Some(cancel)
            }
        }
    }

    pub fn try_acquire(&self, id: RobotId) -> bool {
        self.acquire(id).is_some()
    }

    /// Record the phase of a running robot; false if it is not running
    pub fn set_phase(&self, id: RobotId, phase: TradePhase) -> bool {
        match self.entries.get_mut(&id) {
            Some(mut entry) => {
                entry.phase = phase;
                true
            }
            None => false,
        }
    }

    pub fn phase(&self, id: RobotId) -> Option<TradePhase> {
        self.entries.get(&id).map(|entry| entry.phase)
    }

    /// Drop a robot's entry; called by the task itself when it stops
    pub fn release(&self, id: RobotId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn is_running(&self, id: RobotId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Ask a running task to stop
    ///
    /// The entry stays until the task observes the signal and releases it.
    pub fn cancel(&self, id: RobotId) -> bool {
        match self.entries.get(&id) {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every current and future task token
    pub fn close(&self) {
        self.root.cancel();
    }

    /// Ids of running robots, ascending
    pub fn running(&self) -> Vec<RobotId> {
        let mut ids: Vec<RobotId> = self.entries.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new()
    }
}
