//! Holding queue ordering
//!
//! Entering PRELIMINARY_ORDERING, the holding pool is shuffled once: tier 2
//! and tier 3 are each permuted independently, then concatenated
//! `tier2 + tier3 + other` and renumbered `1..=n`. This is the only source
//! of randomness in the engine and takes the generator as a parameter.
//!
//! Entering FINAL_ORDERING, that fixed order is read back unchanged.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::eligibility::Tier;
use crate::model::{resequence, ListMove, ListType, SignupRecord};

/// How the final queue is read from the holding pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedOrder {
    /// Order fixed by the preliminary shuffle
    Sequence,
    /// Arrival order, for an event that never went through the shuffle
    Arrival,
}

/// Shuffle within tier 2 and within tier 3, keeping tier groups in order.
///
/// The output is a permutation of `holding`.
pub fn randomize_holding<R: Rng + ?Sized>(
    holding: &[SignupRecord],
    rng: &mut R,
) -> Vec<SignupRecord> {
    let mut first: Vec<SignupRecord> = Vec::new();
    let mut second: Vec<SignupRecord> = Vec::new();
    let mut other: Vec<SignupRecord> = Vec::new();

    for record in holding {
        match record.tier {
            Tier::FirstPriority => first.push(record.clone()),
            Tier::SecondPriority => second.push(record.clone()),
            Tier::Roster => other.push(record.clone()),
        }
    }

    first.shuffle(rng);
    second.shuffle(rng);

    first.extend(second);
    first.extend(other);
    first
}

/// Shuffle the holding pool and produce the moves that renumber it in place.
pub fn randomize_moves<R: Rng + ?Sized>(
    holding: &[SignupRecord],
    rng: &mut R,
) -> Vec<ListMove> {
    resequence(&randomize_holding(holding, rng), ListType::Holding)
}

/// Read the holding pool in its fixed order.
///
/// Input order is irrelevant; the result is sorted by the chosen key with
/// the other key as tie-break.
pub fn fixed_queue(holding: &[SignupRecord], order: FixedOrder) -> Vec<SignupRecord> {
    let mut queue = holding.to_vec();
    match order {
        FixedOrder::Sequence => {
            queue.sort_by(|a, b| {
                a.sequence_number
                    .cmp(&b.sequence_number)
                    .then(a.created_at.cmp(&b.created_at))
            });
        }
        FixedOrder::Arrival => {
            queue.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then(a.sequence_number.cmp(&b.sequence_number))
            });
        }
    }
    queue
}
