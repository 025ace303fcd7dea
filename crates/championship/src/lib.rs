#![deny(warnings)]

//! Championship progression: deciding when a season or eon is over, ranking
//! the field and handing out the rewards.
//!
//! The crate performs no I/O. Everything it reads or writes goes through a
//! [`BlobStore`], and the store's own error type is propagated untouched.

pub mod rewards;
pub mod service;
pub mod standings;

#[cfg(test)]
pub(crate) mod fake;

use blob_core::{
    Blob, BlobId, EventResult, GrandmasterStandingsDto, League, LeagueId, StandingsDto,
};
use std::collections::BTreeMap;

pub use rewards::{apply_award, plan_eon_reward, plan_season_rewards, Award, RewardAssignment};
pub use service::{ChampionshipService, PeriodState};
pub use standings::{compute_grandmaster_standings, compute_standings};

/// Data access the championship services depend on.
pub trait BlobStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Events of `league_id` in `season` that have no result yet.
    fn count_unconcluded_for_league(
        &self,
        league_id: LeagueId,
        season: u64,
    ) -> Result<u32, Self::Error>;

    fn get_league(&self, league_id: LeagueId) -> Result<League, Self::Error>;

    fn get_leagues(&self) -> Result<Vec<League>, Self::Error>;

    fn get_blob_by_id(&self, id: BlobId) -> Result<Blob, Self::Error>;

    /// Full roster of a league, ordered by id.
    fn get_all_by_league_order_by_id(
        &self,
        league_id: LeagueId,
    ) -> Result<BTreeMap<BlobId, Blob>, Self::Error>;

    /// Every recorded result of the league's events in `season`.
    fn get_results_for_league(
        &self,
        league_id: LeagueId,
        season: u64,
    ) -> Result<Vec<EventResult>, Self::Error>;

    /// Records of the league's field accumulated over `eon`, in any order.
    fn get_grandmaster_standings(
        &self,
        league_id: LeagueId,
        eon: u64,
    ) -> Result<Vec<GrandmasterStandingsDto>, Self::Error>;

    fn save_blob(&mut self, blob: &Blob) -> Result<(), Self::Error>;

    fn save_all_blobs(&mut self, blobs: &[Blob]) -> Result<(), Self::Error>;

    /// Ranked season standings of a league.
    fn get_standings(
        &self,
        league_id: LeagueId,
        season: u64,
    ) -> Result<Vec<StandingsDto>, Self::Error> {
        let roster = self.get_all_by_league_order_by_id(league_id)?;
        let results = self.get_results_for_league(league_id, season)?;
        Ok(standings::rank_standings(&roster, &results))
    }
}
