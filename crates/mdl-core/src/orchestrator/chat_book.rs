//! Per-chat bookkeeping for advisory queue positions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::ids::ChatId;
use crate::queue::QueueTicket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatRecord {
    /// Position reported for the chat's most recent enqueue.
    pub last_ticket: QueueTicket,
    /// Jobs of this chat not yet in a terminal phase.
    pub outstanding: usize,
}

/// Owned by the orchestrator. The lock is never held across an await.
#[derive(Debug, Default)]
pub struct ChatBook {
    records: Mutex<HashMap<ChatId, ChatRecord>>,
}

impl ChatBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Poison-tolerant lock.
    fn records(&self) -> MutexGuard<'_, HashMap<ChatId, ChatRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count a job for `chat` before it is handed to the queue, so the
    /// consumer can never finish it before it was counted.
    pub fn note_enqueued(&self, chat: ChatId) {
        let mut records = self.records();
        let rec = records.entry(chat).or_insert(ChatRecord {
            last_ticket: QueueTicket(0),
            outstanding: 0,
        });
        rec.outstanding += 1;
    }

    /// Record the position for the latest enqueue and return the one to
    /// report: never lower than an earlier ticket of the same chat while that
    /// chat still has jobs outstanding. An evicted record gets `ticket` back.
    pub fn set_ticket(&self, chat: ChatId, ticket: QueueTicket) -> QueueTicket {
        let mut records = self.records();
        match records.get_mut(&chat) {
            Some(rec) => {
                rec.last_ticket = rec.last_ticket.max(ticket);
                rec.last_ticket
            }
            None => ticket,
        }
    }

    /// Called once per job at its terminal phase. The record is evicted when
    /// nothing is left outstanding.
    pub fn note_finished(&self, chat: ChatId) {
        let mut records = self.records();
        if let Some(rec) = records.get_mut(&chat) {
            rec.outstanding = rec.outstanding.saturating_sub(1);
            if rec.outstanding == 0 {
                records.remove(&chat);
            }
        }
    }

    pub fn get(&self, chat: ChatId) -> Option<ChatRecord> {
        let records = self.records();
        records.get(&chat).copied()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
