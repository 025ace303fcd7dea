#![deny(warnings)]

//! Persistence layer: an in-memory [`BlobStore`] with JSON snapshots.
//!
//! The store keeps leagues, blobs and scheduled events. An event is
//! unconcluded until its results are recorded, which is what gates season
//! conclusion. Eon records (points and medals) are derived from the recorded
//! results of the requested eon.

use blob_core::{
    Blob, BlobId, EventResult, EventType, GrandmasterStandingsDto, League, LeagueId, TimeScale,
};
use championship::BlobStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Returns the default path used for local saves.
pub fn default_snapshot_path() -> &'static str {
    "./saves/main.json"
}

/// Errors surfaced by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("blob {0} not found")]
    BlobNotFound(BlobId),
    #[error("league {0} not found")]
    LeagueNotFound(LeagueId),
    #[error("event {0} not found")]
    EventNotFound(u32),
    #[error("event {0} already has results")]
    EventAlreadyConcluded(u32),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A league event scheduled for a season.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: u32,
    pub league_id: LeagueId,
    pub season: u64,
    pub event_type: EventType,
    /// `None` until the event has been run.
    pub results: Option<Vec<EventResult>>,
}

impl Event {
    pub fn is_concluded(&self) -> bool {
        self.results.is_some()
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    scale: TimeScale,
    next_event_id: u32,
    leagues: Vec<League>,
    blobs: Vec<Blob>,
    events: Vec<Event>,
}

/// Store backed by ordered in-memory maps.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    scale: TimeScale,
    leagues: BTreeMap<LeagueId, League>,
    blobs: BTreeMap<BlobId, Blob>,
    events: BTreeMap<u32, Event>,
    next_event_id: u32,
}

impl MemoryStore {
    pub fn new(scale: TimeScale) -> Self {
        Self {
            scale,
            leagues: BTreeMap::new(),
            blobs: BTreeMap::new(),
            events: BTreeMap::new(),
            next_event_id: 1,
        }
    }

    pub fn insert_league(&mut self, league: League) {
        self.leagues.insert(league.id, league);
    }

    pub fn insert_blob(&mut self, blob: Blob) {
        self.blobs.insert(blob.id, blob);
    }

    pub fn blobs(&self) -> impl Iterator<Item = &Blob> {
        self.blobs.values()
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    /// Adds an unconcluded event and returns its id.
    pub fn schedule_event(
        &mut self,
        league_id: LeagueId,
        season: u64,
        event_type: EventType,
    ) -> Result<u32, StoreError> {
        if !self.leagues.contains_key(&league_id) {
            return Err(StoreError::LeagueNotFound(league_id));
        }
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.saturating_add(1);
        self.events.insert(
            id,
            Event {
                id,
                league_id,
                season,
                event_type,
                results: None,
            },
        );
        debug!(event = id, league = %league_id, season, ?event_type, "event scheduled");
        Ok(id)
    }

    /// Records the outcome of an event, concluding it.
    pub fn record_results(
        &mut self,
        event_id: u32,
        points: &[(BlobId, u32)],
    ) -> Result<(), StoreError> {
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or(StoreError::EventNotFound(event_id))?;
        if event.is_concluded() {
            return Err(StoreError::EventAlreadyConcluded(event_id));
        }
        event.results = Some(
            points
                .iter()
                .map(|&(blob_id, points)| EventResult {
                    event_id,
                    blob_id,
                    points,
                })
                .collect(),
        );
        debug!(event = event_id, entries = points.len(), "event concluded");
        Ok(())
    }

    fn concluded_results(
        &self,
        league_id: LeagueId,
    ) -> impl Iterator<Item = (&Event, &[EventResult])> {
        self.events
            .values()
            .filter(move |e| e.league_id == league_id)
            .filter_map(|e| e.results.as_deref().map(|r| (e, r)))
    }

    /// Serialize the full store to JSON.
    pub fn to_json(&self) -> Result<String, StoreError> {
        let snap = Snapshot {
            scale: self.scale,
            next_event_id: self.next_event_id,
            leagues: self.leagues.values().cloned().collect(),
            blobs: self.blobs.values().cloned().collect(),
            events: self.events.values().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&snap)?)
    }

    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        let snap: Snapshot = serde_json::from_str(text)?;
        Ok(Self {
            scale: snap.scale,
            next_event_id: snap.next_event_id,
            leagues: snap.leagues.into_iter().map(|l| (l.id, l)).collect(),
            blobs: snap.blobs.into_iter().map(|b| (b.id, b)).collect(),
            events: snap.events.into_iter().map(|e| (e.id, e)).collect(),
        })
    }

    /// Write a snapshot to `path`, creating parent directories.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), blobs = self.blobs.len(), "snapshot saved");
        Ok(())
    }

    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

/// Gold, silver and bronze go to the three best scores of an event, ties on
/// the lower id.
fn podium(results: &[EventResult]) -> Vec<BlobId> {
    let mut ranked: Vec<&EventResult> = results.iter().collect();
    ranked.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.blob_id.cmp(&b.blob_id)));
    ranked.into_iter().take(3).map(|r| r.blob_id).collect()
}

impl BlobStore for MemoryStore {
    type Error = StoreError;

    fn count_unconcluded_for_league(
        &self,
        league_id: LeagueId,
        season: u64,
    ) -> Result<u32, StoreError> {
        let n = self
            .events
            .values()
            .filter(|e| e.league_id == league_id && e.season == season && !e.is_concluded())
            .count();
        Ok(u32::try_from(n).unwrap_or(u32::MAX))
    }

    fn get_league(&self, league_id: LeagueId) -> Result<League, StoreError> {
        self.leagues
            .get(&league_id)
            .cloned()
            .ok_or(StoreError::LeagueNotFound(league_id))
    }

    fn get_leagues(&self) -> Result<Vec<League>, StoreError> {
        Ok(self.leagues.values().cloned().collect())
    }

    fn get_blob_by_id(&self, id: BlobId) -> Result<Blob, StoreError> {
        self.blobs.get(&id).cloned().ok_or(StoreError::BlobNotFound(id))
    }

    fn get_all_by_league_order_by_id(
        &self,
        league_id: LeagueId,
    ) -> Result<BTreeMap<BlobId, Blob>, StoreError> {
        if !self.leagues.contains_key(&league_id) {
            return Err(StoreError::LeagueNotFound(league_id));
        }
        Ok(self
            .blobs
            .values()
            .filter(|b| b.league_id == league_id)
            .map(|b| (b.id, b.clone()))
            .collect())
    }

    fn get_results_for_league(
        &self,
        league_id: LeagueId,
        season: u64,
    ) -> Result<Vec<EventResult>, StoreError> {
        Ok(self
            .concluded_results(league_id)
            .filter(|(e, _)| e.season == season)
            .flat_map(|(_, r)| r.iter().copied())
            .collect())
    }

    /// Records cover the concluded events of the league's seasons in `eon`.
    fn get_grandmaster_standings(
        &self,
        league_id: LeagueId,
        eon: u64,
    ) -> Result<Vec<GrandmasterStandingsDto>, StoreError> {
        let mut records: BTreeMap<BlobId, GrandmasterStandingsDto> = BTreeMap::new();
        for (event, results) in self.concluded_results(league_id) {
            if self.scale.eon_of_season(event.season) != eon {
                continue;
            }
            for r in results {
                let Some(blob) = self.blobs.get(&r.blob_id) else {
                    continue;
                };
                let rec = records.entry(r.blob_id).or_insert_with(|| GrandmasterStandingsDto {
                    blob_id: blob.id,
                    name: blob.name.clone(),
                    championships: blob.championships,
                    gold: 0,
                    silver: 0,
                    bronze: 0,
                    points: 0,
                });
                rec.points = rec.points.saturating_add(u64::from(r.points));
            }
            for (place, id) in podium(results).into_iter().enumerate() {
                if let Some(rec) = records.get_mut(&id) {
                    match place {
                        0 => rec.gold = rec.gold.saturating_add(1),
                        1 => rec.silver = rec.silver.saturating_add(1),
                        _ => rec.bronze = rec.bronze.saturating_add(1),
                    }
                }
            }
        }
        Ok(records.into_values().collect())
    }

    fn save_blob(&mut self, blob: &Blob) -> Result<(), StoreError> {
        debug!(blob = %blob.id, "saving blob");
        self.blobs.insert(blob.id, blob.clone());
        Ok(())
    }

    fn save_all_blobs(&mut self, blobs: &[Blob]) -> Result<(), StoreError> {
        debug!(count = blobs.len(), "saving blobs");
        for b in blobs {
            self.blobs.insert(b.id, b.clone());
        }
        Ok(())
    }
}
