//! In-crate test double for [`BlobStore`] that records every write.

use crate::BlobStore;
use blob_core::{
    Blob, BlobId, EventResult, GrandmasterStandingsDto, League, LeagueId, TimeScale,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FakeError {
    #[error("blob {0} not found")]
    BlobNotFound(BlobId),
    #[error("league {0} not found")]
    LeagueNotFound(LeagueId),
    #[error("save rejected")]
    SaveRejected,
}

pub fn blob(id: u32, league_id: u32) -> Blob {
    let scale = TimeScale::default();
    let mut b = Blob::new(BlobId(id), format!("Blob {id}"), LeagueId(league_id), &scale);
    b.integrity = 0;
    b
}

pub fn league(id: u32, level: u8) -> League {
    League {
        id: LeagueId(id),
        name: format!("League {id}"),
        field_size: 5,
        level,
    }
}

pub fn gm(blob_id: u32, points: u64, gold: u32) -> GrandmasterStandingsDto {
    GrandmasterStandingsDto {
        blob_id: BlobId(blob_id),
        name: format!("Blob {blob_id}"),
        championships: 0,
        gold,
        silver: 0,
        bronze: 0,
        points,
    }
}

#[derive(Debug)]
pub struct FakeStore {
    pub league: League,
    pub blobs: BTreeMap<BlobId, Blob>,
    pub unconcluded: u32,
    pub results: Vec<EventResult>,
    pub gm_records: Vec<GrandmasterStandingsDto>,
    /// Eons the grandmaster records were requested for.
    pub gm_eons: RefCell<Vec<u64>>,
    pub save_calls: Vec<Blob>,
    pub save_all_calls: Vec<Vec<Blob>>,
    pub reject_saves: bool,
}

impl FakeStore {
    pub fn new(league: League, blobs: Vec<Blob>) -> Self {
        Self {
            league,
            blobs: blobs.into_iter().map(|b| (b.id, b)).collect(),
            unconcluded: 0,
            results: Vec::new(),
            gm_records: Vec::new(),
            gm_eons: RefCell::new(Vec::new()),
            save_calls: Vec::new(),
            save_all_calls: Vec::new(),
            reject_saves: false,
        }
    }

    pub fn with_results(mut self, results: Vec<EventResult>) -> Self {
        self.results = results;
        self
    }

    /// One result per blob, `points[i]` for blob `ids[i]`.
    pub fn with_points(self, ids: &[u32], points: &[u32]) -> Self {
        let results = ids
            .iter()
            .zip(points)
            .map(|(&id, &p)| EventResult {
                event_id: 1,
                blob_id: BlobId(id),
                points: p,
            })
            .collect();
        self.with_results(results)
    }

    fn blob_mut(&mut self, id: BlobId) -> Result<&mut Blob, FakeError> {
        self.blobs.get_mut(&id).ok_or(FakeError::BlobNotFound(id))
    }
}

impl BlobStore for FakeStore {
    type Error = FakeError;

    fn count_unconcluded_for_league(
        &self,
        league_id: LeagueId,
        _season: u64,
    ) -> Result<u32, FakeError> {
        if league_id != self.league.id {
            return Err(FakeError::LeagueNotFound(league_id));
        }
        Ok(self.unconcluded)
    }

    fn get_league(&self, league_id: LeagueId) -> Result<League, FakeError> {
        if league_id != self.league.id {
            return Err(FakeError::LeagueNotFound(league_id));
        }
        Ok(self.league.clone())
    }

    fn get_leagues(&self) -> Result<Vec<League>, FakeError> {
        Ok(vec![self.league.clone()])
    }

    fn get_blob_by_id(&self, id: BlobId) -> Result<Blob, FakeError> {
        self.blobs.get(&id).cloned().ok_or(FakeError::BlobNotFound(id))
    }

    fn get_all_by_league_order_by_id(
        &self,
        league_id: LeagueId,
    ) -> Result<BTreeMap<BlobId, Blob>, FakeError> {
        Ok(self
            .blobs
            .iter()
            .filter(|(_, b)| b.league_id == league_id)
            .map(|(id, b)| (*id, b.clone()))
            .collect())
    }

    fn get_results_for_league(
        &self,
        _league_id: LeagueId,
        _season: u64,
    ) -> Result<Vec<EventResult>, FakeError> {
        Ok(self.results.clone())
    }

    fn get_grandmaster_standings(
        &self,
        _league_id: LeagueId,
        eon: u64,
    ) -> Result<Vec<GrandmasterStandingsDto>, FakeError> {
        self.gm_eons.borrow_mut().push(eon);
        Ok(self.gm_records.clone())
    }

    fn save_blob(&mut self, blob: &Blob) -> Result<(), FakeError> {
        if self.reject_saves {
            return Err(FakeError::SaveRejected);
        }
        *self.blob_mut(blob.id)? = blob.clone();
        self.save_calls.push(blob.clone());
        Ok(())
    }

    fn save_all_blobs(&mut self, blobs: &[Blob]) -> Result<(), FakeError> {
        if self.reject_saves {
            return Err(FakeError::SaveRejected);
        }
        for b in blobs {
            *self.blob_mut(b.id)? = b.clone();
        }
        self.save_all_calls.push(blobs.to_vec());
        Ok(())
    }
}
