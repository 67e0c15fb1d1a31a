//! Job lifecycle phases, logged on every transition.

use std::fmt;

use crate::ids::ChatId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Probing,
    AwaitingSelection,
    Ready,
    Downloading,
    Delivering,
    Done,
    Failed,
}

impl JobPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            JobPhase::Probing => "probing",
            JobPhase::AwaitingSelection => "awaiting_selection",
            JobPhase::Ready => "ready",
            JobPhase::Downloading => "downloading",
            JobPhase::Delivering => "delivering",
            JobPhase::Done => "done",
            JobPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Done | JobPhase::Failed)
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn enter(chat: ChatId, url: &str, phase: JobPhase) {
    if phase.is_terminal() {
        tracing::info!(chat_id = %chat, phase = %phase, url, "job phase");
    } else {
        tracing::debug!(chat_id = %chat, phase = %phase, url, "job phase");
    }
}
