//! Playback progress tracking.
//!
//! Records position per `(user, asset)` pair. Each pair has exactly one
//! record; updates mutate it in place as a single atomic mutation via the
//! map's entry API, so concurrent updates for the same pair resolve
//! last-write-wins without partial writes.

use chrono::Utc;
use dashmap::DashMap;
use streamgate_common::{AssetId, PlaybackProgress, UserId};

/// Thread-safe per-user playback position store.
pub struct ProgressTracker {
    records: DashMap<(UserId, AssetId), PlaybackProgress>,
    completion_threshold: f64,
}

impl ProgressTracker {
    /// Create a tracker that treats records at or past `completion_threshold`
    /// as finished.
    pub fn new(completion_threshold: f64) -> Self {
        Self {
            records: DashMap::new(),
            completion_threshold,
        }
    }

    /// Upsert the record for `(user, asset)`.
    ///
    /// A known duration is never overwritten with zero or absent; position
    /// updates without a duration keep whatever was reported before.
    pub fn update(
        &self,
        user: UserId,
        asset: AssetId,
        position_secs: f64,
        duration_secs: Option<f64>,
    ) -> PlaybackProgress {
        let mut entry = self
            .records
            .entry((user, asset))
            .or_insert_with(PlaybackProgress::zeroed);

        entry.position_secs = position_secs.max(0.0);
        if let Some(duration) = duration_secs {
            if duration > 0.0 {
                entry.duration_secs = duration;
            }
        }
        entry.updated_at = Utc::now();

        entry.value().clone()
    }

    /// Ensure a record exists for `(user, asset)` and return it.
    ///
    /// Used at token issuance so a playback session always has a record to
    /// report against.
    pub fn ensure(&self, user: UserId, asset: AssetId) -> PlaybackProgress {
        self.records
            .entry((user, asset))
            .or_insert_with(PlaybackProgress::zeroed)
            .value()
            .clone()
    }

    /// Current record for `(user, asset)`, if any.
    pub fn get(&self, user: UserId, asset: AssetId) -> Option<PlaybackProgress> {
        self.records.get(&(user, asset)).map(|e| e.value().clone())
    }

    /// The user's unfinished records, most recently updated first.
    ///
    /// Completed records are excluded; this feeds the "continue watching"
    /// view.
    pub fn list_recent(&self, user: UserId, limit: usize) -> Vec<(AssetId, PlaybackProgress)> {
        let mut records: Vec<(AssetId, PlaybackProgress)> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == user)
            .filter(|entry| !entry.value().is_completed(self.completion_threshold))
            .map(|entry| (entry.key().1, entry.value().clone()))
            .collect();

        records.sort_by(|a, b| b.1.updated_at.cmp(&a.1.updated_at));
        records.truncate(limit);
        records
    }

    /// Number of records across all users.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(streamgate_common::types::DEFAULT_COMPLETION_THRESHOLD)
    }
}
