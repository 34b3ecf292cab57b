//! Capacity-aware promotion
//!
//! Walks a queue once, in order. Each entry takes the next roster seat
//! while seats remain, otherwise the next waitlist position. Nothing is
//! revisited: an entry placed on the waitlist stays there even if a later
//! entry could have fit.

use uuid::Uuid;

use crate::model::{ListMove, ListType, SignupRecord};

/// Running roster/waitlist counters for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionAssigner {
    roster_count: u32,
    overflow_count: u32,
    max_signups: u32,
}

impl PromotionAssigner {
    /// Start from the event's live counts.
    pub fn new(roster_count: u32, max_signups: u32, overflow_count: u32) -> Self {
        Self {
            roster_count,
            overflow_count,
            max_signups,
        }
    }

    pub fn roster_count(&self) -> u32 {
        self.roster_count
    }

    pub fn overflow_count(&self) -> u32 {
        self.overflow_count
    }

    pub fn has_roster_seat(&self) -> bool {
        self.roster_count < self.max_signups
    }

    /// Place one entry.
    pub fn assign(&mut self, signup_id: Uuid) -> ListMove {
        if self.has_roster_seat() {
            self.roster_count += 1;
            ListMove::new(signup_id, ListType::Roster, self.roster_count)
        } else {
            self.overflow_count += 1;
            ListMove::new(signup_id, ListType::Overflow, self.overflow_count)
        }
    }

    /// Place every entry of `queue` in order.
    pub fn assign_queue(&mut self, queue: &[SignupRecord]) -> Vec<ListMove> {
        queue.iter().map(|record| self.assign(record.id)).collect()
    }
}
