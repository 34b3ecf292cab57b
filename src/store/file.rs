//! JSON snapshot store
//!
//! The whole table state lives in one JSON file shared by every process
//! that opens it. Each mutating batch:
//! 1. Takes an exclusive lock on `<state>.json.lock`
//! 2. Re-reads the snapshot, so batches from other handles are seen
//! 3. Applies the batch to that fresh state
//! 4. Writes a temp file, fsyncs it, and renames it over the snapshot
//!
//! The in-memory view is replaced only after the rename succeeds, so a
//! failed batch leaves the file unchanged. Reads are served from the view
//! as of the last open or commit.
//!
//! Stored phase tags are read through the legacy migration, and list gaps
//! left by older writers are closed on load.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::{migrate_stored_phase, EventPhase};
use crate::model::{Determinant, Event, EventTypeConfig, ListMove, ListType, SignupRecord};
use crate::observability::{log_event_with_fields, Event as LogEvent};

use super::errors::{StoreError, StoreResult};
use super::state::StoreState;
use super::{SignupOrder, Store};

/// Event as written to disk; `phase` stays a raw tag until migrated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: Uuid,
    pub config: EventTypeConfig,
    pub event_date: DateTime<Utc>,
    /// Accepts the `status` key used by older snapshots
    #[serde(alias = "status")]
    pub phase: String,
    #[serde(default, alias = "status_determinant")]
    pub determinant: Determinant,
    #[serde(default)]
    pub revision: u64,
}

impl From<&Event> for StoredEvent {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            config: event.config.clone(),
            event_date: event.event_date,
            phase: event.phase.as_str().to_string(),
            determinant: event.determinant,
            revision: event.revision,
        }
    }
}

/// On-disk layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub events: Vec<StoredEvent>,
    #[serde(default)]
    pub signups: Vec<SignupRecord>,
}

impl StoreSnapshot {
    fn from_state(state: &StoreState) -> Self {
        Self {
            events: state.events.values().map(StoredEvent::from).collect(),
            signups: state.signups.values().cloned().collect(),
        }
    }

    /// Build table state, migrating phase tags as of `now` and closing
    /// list gaps.
    fn into_state(self, now: DateTime<Utc>) -> (StoreState, LoadStats) {
        let mut state = StoreState::default();
        let mut migrated = 0;

        for stored in self.events {
            let migration =
                migrate_stored_phase(&stored.phase, &stored.config, stored.event_date, now);
            if migration.migrated {
                migrated += 1;
                let id = stored.id.to_string();
                log_event_with_fields(
                    LogEvent::LegacyPhaseMigrated,
                    &[
                        ("event_id", id.as_str()),
                        ("from", stored.phase.as_str()),
                        ("to", migration.phase.as_str()),
                    ],
                );
            }

            state.insert_event(Event {
                id: stored.id,
                config: stored.config,
                event_date: stored.event_date,
                phase: migration.phase,
                determinant: stored.determinant,
                revision: stored.revision,
            });
        }

        for record in self.signups {
            state.signups.insert(record.id, record);
        }
        let renumbered = state.compact_lists();

        (
            state,
            LoadStats {
                migrated,
                renumbered,
            },
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct LoadStats {
    migrated: usize,
    renumbered: usize,
}

/// Exclusive advisory lock held for the duration of one batch.
///
/// Released when dropped; the OS also releases it if the process dies.
struct CommitLock {
    file: File,
}

impl CommitLock {
    fn acquire(path: &Path) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| StoreError::CommitFailed(format!("open lock file: {}", e)))?;

        file.lock_exclusive()
            .map_err(|e| StoreError::CommitFailed(format!("lock state file: {}", e)))?;

        Ok(Self { file })
    }
}

impl Drop for CommitLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Store persisted to a JSON snapshot file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    temp_path: PathBuf,
    lock_path: PathBuf,
    /// Evaluation time for legacy phase tags on every read of the file
    loaded_at: DateTime<Utc>,
    state: RwLock<StoreState>,
}

impl FileStore {
    /// Open the snapshot at `path`; a missing file is an empty store.
    ///
    /// `now` is used only to recompute legacy phase tags.
    pub fn open(path: impl AsRef<Path>, now: DateTime<Utc>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let temp_path = path.with_extension("json.tmp");
        let lock_path = path.with_extension("json.lock");

        let (state, stats) = load_snapshot(&path, now)?;
        let events = state.events.len().to_string();
        let signups = state.signups.len().to_string();
        let migrated = stats.migrated.to_string();
        let renumbered = stats.renumbered.to_string();
        log_event_with_fields(
            LogEvent::StateLoaded,
            &[
                ("events", events.as_str()),
                ("migrated", migrated.as_str()),
                ("renumbered", renumbered.as_str()),
                ("signups", signups.as_str()),
            ],
        );

        Ok(Self {
            path,
            temp_path,
            lock_path,
            loaded_at: now,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register an event and persist it.
    pub fn insert_event(&self, event: Event) -> StoreResult<()> {
        self.commit(|state| {
            state.insert_event(event);
            Ok(())
        })
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))
    }

    /// Apply `f` to the on-disk state under the file lock, persist the
    /// result, then publish it.
    ///
    /// The view is refreshed from disk even when `f` fails, so a caller
    /// that re-plans after a conflict sees the latest lists.
    fn commit<T>(&self, f: impl FnOnce(&mut StoreState) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::CommitFailed(format!("create directory: {}", e))
                })?;
            }
        }
        let _lock = CommitLock::acquire(&self.lock_path)?;

        let (fresh, _) = load_snapshot(&self.path, self.loaded_at)?;
        let mut next = fresh.clone();

        let outcome = f(&mut next).and_then(|value| self.persist(&next).map(|()| value));
        match outcome {
            Ok(value) => {
                *guard = next;
                Ok(value)
            }
            Err(e) => {
                *guard = fresh;
                Err(e)
            }
        }
    }

    fn persist(&self, state: &StoreState) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(&StoreSnapshot::from_state(state))?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.temp_path)
            .map_err(|e| StoreError::CommitFailed(format!("create temp snapshot: {}", e)))?;

        file.write_all(content.as_bytes())
            .map_err(|e| StoreError::CommitFailed(format!("write temp snapshot: {}", e)))?;
        file.sync_all()
            .map_err(|e| StoreError::CommitFailed(format!("fsync temp snapshot: {}", e)))?;

        fs::rename(&self.temp_path, &self.path)
            .map_err(|e| StoreError::CommitFailed(format!("rename snapshot: {}", e)))?;

        // Make the rename itself durable
        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }
}

/// Read and migrate the snapshot at `path`; a missing or blank file is empty.
fn load_snapshot(path: &Path, now: DateTime<Utc>) -> StoreResult<(StoreState, LoadStats)> {
    let snapshot = if path.exists() {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            StoreSnapshot::default()
        } else {
            serde_json::from_str(&content)?
        }
    } else {
        StoreSnapshot::default()
    };

    Ok(snapshot.into_state(now))
}

impl Store for FileStore {
    fn get_event(&self, event_id: Uuid) -> StoreResult<Event> {
        self.read()?.event(event_id).cloned()
    }

    fn list_events(&self) -> StoreResult<Vec<Event>> {
        Ok(self.read()?.list_events())
    }

    fn list_signups(
        &self,
        event_id: Uuid,
        list_type: ListType,
        order: SignupOrder,
    ) -> StoreResult<Vec<SignupRecord>> {
        Ok(self.read()?.list_signups(event_id, list_type, order))
    }

    fn count_signups(&self, event_id: Uuid, list_type: ListType) -> StoreResult<u32> {
        Ok(self.read()?.count_signups(event_id, list_type))
    }

    fn find_signup(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<SignupRecord>> {
        Ok(self.read()?.find_signup(event_id, user_id))
    }

    fn insert_signup(&self, record: SignupRecord) -> StoreResult<SignupRecord> {
        self.commit(|state| state.insert_signup(record))
    }

    fn place_signup(
        &self,
        record: SignupRecord,
        seen_phase: EventPhase,
    ) -> StoreResult<SignupRecord> {
        self.commit(|state| state.place_signup(record, seen_phase))
    }

    fn delete_signup_with_moves(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        seen_revision: u64,
        moves: &[ListMove],
    ) -> StoreResult<bool> {
        self.commit(|state| {
            state.delete_signup_with_moves(event_id, user_id, seen_revision, moves)
        })
    }

    fn apply_transition(
        &self,
        event_id: Uuid,
        seen_revision: u64,
        moves: &[ListMove],
        new_phase: EventPhase,
    ) -> StoreResult<()> {
        self.commit(|state| state.apply_transition(event_id, seen_revision, moves, new_phase))
    }
}
