//! Commands deferred against the world frame counter.

use iso_tactics_core::{Command, TriggerId};

/// Lifecycle of a deferred command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerState {
    /// Waiting for its due frame.
    Pending {
        /// Frame on which the command will be applied.
        due_frame: u64,
    },
    /// The command has been applied.
    Fired,
}

#[derive(Clone, Debug)]
struct Trigger {
    id: TriggerId,
    due_frame: u64,
    command: Command,
}

/// Pending triggers ordered by `(due_frame, id)`.
#[derive(Clone, Debug, Default)]
pub(crate) struct Timeline {
    pending: Vec<Trigger>,
    next_id: u32,
}

impl Timeline {
    pub(crate) fn schedule(&mut self, due_frame: u64, command: Command) -> TriggerId {
        let id = TriggerId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let position = self
            .pending
            .partition_point(|trigger| trigger.due_frame <= due_frame);
        self.pending.insert(
            position,
            Trigger {
                id,
                due_frame,
                command,
            },
        );
        id
    }

    /// Moves every trigger due at or before `frame` to the fired state and
    /// hands back their commands in firing order.
    pub(crate) fn take_due(&mut self, frame: u64) -> Vec<(TriggerId, Command)> {
        let split = self
            .pending
            .partition_point(|trigger| trigger.due_frame <= frame);
        self.pending
            .drain(..split)
            .map(|trigger| (trigger.id, trigger.command))
            .collect()
    }

    pub(crate) fn state(&self, id: TriggerId) -> Option<TriggerState> {
        if id.get() >= self.next_id {
            return None;
        }
        Some(
            self.pending
                .iter()
                .find(|trigger| trigger.id == id)
                .map_or(TriggerState::Fired, |trigger| TriggerState::Pending {
                    due_frame: trigger.due_frame,
                }),
        )
    }
}
