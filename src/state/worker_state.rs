/// Worker state definitions for tracking a single page fetch
///
/// This module defines every state a fetch worker passes through, from being
/// spawned by the dispatcher to its terminal outcome.
use std::fmt;

/// Represents the current state of a fetch worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    // ===== Active States =====
    /// Worker task has been spawned but has not asked for a slot yet
    Spawned,

    /// Worker is sleeping its jitter or waiting for a free slot
    AcquiringSlot,

    /// Worker holds a slot and a page number, request is built
    RequestBuilt,

    /// Request is on the wire
    Sent,

    /// Response status was inspected and accepted
    Classified,

    // ===== Terminal States =====
    /// Page was decoded and handed to the collector
    Emitted,

    /// Transport failed; the page is lost and the fetch continues
    Dropped,

    /// Worker detected the end of the feed and raised cancellation
    ExhaustionSignaled,

    /// Worker got its slot after cancellation, or found the pool closed, and
    /// never took a page number
    Abandoned,
}

impl WorkerState {
    /// Returns true if this is a terminal state (worker is done)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Emitted | Self::Dropped | Self::ExhaustionSignaled | Self::Abandoned
        )
    }

    /// Returns true if this state is a legal successor of `self`
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Spawned, AcquiringSlot)
                | (AcquiringSlot, RequestBuilt)
                | (AcquiringSlot, Abandoned)
                | (AcquiringSlot, ExhaustionSignaled)
                | (RequestBuilt, Sent)
                | (Sent, Classified)
                | (Sent, Dropped)
                | (Sent, ExhaustionSignaled)
                | (Classified, Emitted)
                | (Classified, ExhaustionSignaled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spawned => "spawned",
            Self::AcquiringSlot => "acquiring_slot",
            Self::RequestBuilt => "request_built",
            Self::Sent => "sent",
            Self::Classified => "classified",
            Self::Emitted => "emitted",
            Self::Dropped => "dropped",
            Self::ExhaustionSignaled => "exhaustion_signaled",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
