//! Signup records and list moves

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::eligibility::Tier;

/// The three signup lists of an event.
///
/// Older snapshots use `EVENT`, `WAITLIST` and `WAITLIST_HOLDING`; those
/// are accepted on read and always written back in canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListType {
    /// Counts toward capacity
    #[serde(alias = "EVENT")]
    Roster,
    /// Ordered waitlist behind a full roster
    #[serde(alias = "WAITLIST")]
    Overflow,
    /// Pre-ordering pool for reserves
    #[serde(alias = "WAITLIST_HOLDING")]
    Holding,
}

impl ListType {
    pub const ALL: [ListType; 3] = [ListType::Roster, ListType::Overflow, ListType::Holding];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Roster => "ROSTER",
            Self::Overflow => "OVERFLOW",
            Self::Holding => "HOLDING",
        }
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One member's place on one event.
///
/// Within an (event, list) partition, sequence numbers are `1..=n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRecord {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub list_type: ListType,
    pub sequence_number: u32,
    pub tier: Tier,
    pub created_at: DateTime<Utc>,
}

impl SignupRecord {
    pub fn new(
        event_id: Uuid,
        user_id: Uuid,
        list_type: ListType,
        sequence_number: u32,
        tier: Tier,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            list_type,
            sequence_number,
            tier,
            created_at,
        }
    }
}

/// New placement for an existing signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMove {
    pub signup_id: Uuid,
    pub list_type: ListType,
    pub sequence_number: u32,
}

impl ListMove {
    pub fn new(signup_id: Uuid, list_type: ListType, sequence_number: u32) -> Self {
        Self {
            signup_id,
            list_type,
            sequence_number,
        }
    }
}

/// Assign `1..=n` within `list_type` over `ordered`.
pub fn resequence(ordered: &[SignupRecord], list_type: ListType) -> Vec<ListMove> {
    ordered
        .iter()
        .zip(1u32..)
        .map(|(record, seq)| ListMove::new(record.id, list_type, seq))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_list_tags_accepted() {
        let parsed: Vec<ListType> =
            serde_json::from_str(r#"["EVENT","WAITLIST","WAITLIST_HOLDING"]"#).unwrap();
        assert_eq!(parsed, ListType::ALL.to_vec());

        let written = serde_json::to_string(&ListType::Overflow).unwrap();
        assert_eq!(written, "\"OVERFLOW\"");
    }

    #[test]
    fn test_resequence_is_contiguous_from_one() {
        let event_id = Uuid::new_v4();
        let now = Utc::now();
        let records: Vec<_> = [7, 3, 9]
            .iter()
            .map(|seq| {
                SignupRecord::new(
                    event_id,
                    Uuid::new_v4(),
                    ListType::Overflow,
                    *seq,
                    Tier::Roster,
                    now,
                )
            })
            .collect();

        let moves = resequence(&records, ListType::Overflow);
        let seqs: Vec<u32> = moves.iter().map(|m| m.sequence_number).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(moves[0].signup_id, records[0].id);
    }
}
