//! Event templates and instances

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::{EventPhase, EventWindows};

use super::errors::{ConfigError, ConfigResult};

/// Identifier of a membership group.
pub type GroupId = Uuid;

fn default_max_signups() -> u32 {
    15
}
fn default_roster_open_minutes() -> u32 {
    4320
} // 3 days
fn default_reserve_open_minutes() -> u32 {
    720
} // 12 hours
fn default_initial_scheduling_minutes() -> u32 {
    420
} // 7 hours
fn default_final_scheduling_minutes() -> u32 {
    180
} // 3 hours

/// Template for a recurring event.
///
/// The four offsets are minutes before the event's start and must satisfy
/// `roster_open >= reserve_open >= initial_scheduling >= final_scheduling`.
/// Call [`EventTypeConfig::validate`] when accepting a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTypeConfig {
    pub id: Uuid,

    pub name: String,

    /// Roster capacity
    #[serde(default = "default_max_signups")]
    pub max_signups: u32,

    #[serde(default = "default_roster_open_minutes")]
    pub roster_open_minutes: u32,

    #[serde(default = "default_reserve_open_minutes")]
    pub reserve_open_minutes: u32,

    #[serde(default = "default_initial_scheduling_minutes")]
    pub initial_scheduling_minutes: u32,

    #[serde(default = "default_final_scheduling_minutes")]
    pub final_scheduling_minutes: u32,

    /// Members of this group are tier 1
    #[serde(default)]
    pub roster_group: Option<GroupId>,

    /// Members of this group are tier 2
    #[serde(default)]
    pub first_priority_group: Option<GroupId>,

    /// Members of this group are tier 3
    #[serde(default)]
    pub second_priority_group: Option<GroupId>,
}

impl EventTypeConfig {
    /// Config with the standard windows and capacity and no groups attached.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            max_signups: default_max_signups(),
            roster_open_minutes: default_roster_open_minutes(),
            reserve_open_minutes: default_reserve_open_minutes(),
            initial_scheduling_minutes: default_initial_scheduling_minutes(),
            final_scheduling_minutes: default_final_scheduling_minutes(),
            roster_group: None,
            first_priority_group: None,
            second_priority_group: None,
        }
    }

    /// Check that the windows open in lifecycle order.
    pub fn validate(&self) -> ConfigResult<()> {
        let windows = [
            ("roster_open_minutes", self.roster_open_minutes),
            ("reserve_open_minutes", self.reserve_open_minutes),
            ("initial_scheduling_minutes", self.initial_scheduling_minutes),
            ("final_scheduling_minutes", self.final_scheduling_minutes),
        ];

        for pair in windows.windows(2) {
            let (earlier, earlier_minutes) = pair[0];
            let (later, later_minutes) = pair[1];
            if earlier_minutes < later_minutes {
                return Err(ConfigError::WindowOrder {
                    earlier,
                    earlier_minutes,
                    later,
                    later_minutes,
                });
            }
        }

        Ok(())
    }
}

/// Whether the sweep may move an event between phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Determinant {
    #[default]
    Automatic,
    /// Phase is pinned by an administrator
    Manual,
}

/// One instance of an [`EventTypeConfig`] at a concrete start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub config: EventTypeConfig,
    pub event_date: DateTime<Utc>,
    pub phase: EventPhase,
    #[serde(default)]
    pub determinant: Determinant,
    /// Bumped by the store on every change to the event or its lists
    #[serde(default)]
    pub revision: u64,
}

impl Event {
    /// New automatic event in `NOT_YET_OPEN`.
    pub fn new(config: EventTypeConfig, event_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            event_date,
            phase: EventPhase::NotYetOpen,
            determinant: Determinant::Automatic,
            revision: 0,
        }
    }

    pub fn windows(&self) -> EventWindows {
        EventWindows::compute(&self.config, self.event_date)
    }

    pub fn is_manual(&self) -> bool {
        self.determinant == Determinant::Manual
    }
}
