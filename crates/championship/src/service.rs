//! Season and eon conclusion.
//!
//! A period moves `Pending -> Concluding -> Concluded`. It leaves `Pending`
//! only once the store reports no unconcluded events for it. Nothing records
//! that a period was concluded, so calling a service twice for the same
//! period hands out the rewards twice; the caller owns the once-per-period
//! guarantee.

use crate::rewards::{apply_award, plan_eon_reward, plan_season_rewards};
use crate::standings::{compute_grandmaster_standings, compute_standings};
use crate::BlobStore;
use blob_core::{
    Blob, ChampionshipConfig, GrandmasterStandingsDto, League, LeagueId, StandingsDto,
};
use tracing::{debug, info, warn};

/// Lifecycle of one period instance (a league season or an eon).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodState {
    /// Events are still unresolved.
    Pending,
    /// All events resolved; rewards being computed and saved.
    Concluding,
    /// Rewards saved. Terminal.
    Concluded,
}

impl PeriodState {
    /// State implied by the number of unresolved events.
    pub fn from_unconcluded(count: u32) -> Self {
        if count == 0 {
            PeriodState::Concluding
        } else {
            PeriodState::Pending
        }
    }
}

/// Applies season and eon outcomes using an injected configuration.
#[derive(Clone, Debug, Default)]
pub struct ChampionshipService {
    config: ChampionshipConfig,
}

impl ChampionshipService {
    pub fn new(config: ChampionshipConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChampionshipConfig {
        &self.config
    }

    fn gate<S: BlobStore + ?Sized>(
        &self,
        league_id: LeagueId,
        season: u64,
        store: &S,
    ) -> Result<PeriodState, S::Error> {
        let unconcluded = store.count_unconcluded_for_league(league_id, season)?;
        let state = PeriodState::from_unconcluded(unconcluded);
        debug!(league = %league_id, season, unconcluded, ?state, "period gate");
        Ok(state)
    }

    /// Conclude `season` for `league` if all of its events are resolved.
    ///
    /// The winner gets two more contract terms, the champion prize and a title
    /// (a championship in the top tier, a season victory elsewhere); the runner
    /// up gets one more term. The whole roster is then saved in one call, in
    /// id order. Returns `None` while the season is still running.
    pub fn end_season_if_over<S: BlobStore + ?Sized>(
        &self,
        league: &League,
        season: u64,
        store: &mut S,
    ) -> Result<Option<Vec<StandingsDto>>, S::Error> {
        if self.gate(league.id, season, &*store)? == PeriodState::Pending {
            return Ok(None);
        }

        let standings = compute_standings(&*store, league.id, season)?;
        let mut roster = store.get_all_by_league_order_by_id(league.id)?;
        for assignment in plan_season_rewards(league, &standings) {
            match roster.get_mut(&assignment.blob_id) {
                Some(blob) => apply_award(blob, assignment.award, &self.config),
                None => warn!(
                    league = %league.id,
                    blob = %assignment.blob_id,
                    "ranked blob missing from roster, award skipped"
                ),
            }
        }
        let blobs: Vec<Blob> = roster.into_values().collect();
        store.save_all_blobs(&blobs)?;

        info!(
            league = %league.id,
            season,
            champion = ?standings.first().map(|s| s.blob_id),
            state = ?PeriodState::Concluded,
            "season concluded"
        );
        Ok(Some(standings))
    }

    /// Crown the grandmaster if `season` closes the eon and is fully resolved.
    ///
    /// Only the top tier has an eon race. The leader gains a grandmaster
    /// title, the grandmaster prize, one contract term and full integrity, and
    /// is saved on its own. Returns `None` when any gate fails.
    pub fn end_eon_if_over<S: BlobStore + ?Sized>(
        &self,
        season: u64,
        league: &League,
        store: &mut S,
    ) -> Result<Option<Vec<GrandmasterStandingsDto>>, S::Error> {
        if !league.is_top_tier() || !self.config.time.is_final_season_of_eon(season) {
            debug!(league = %league.id, season, level = league.level, "not an eon boundary");
            return Ok(None);
        }
        if self.gate(league.id, season, &*store)? == PeriodState::Pending {
            return Ok(None);
        }

        let eon = self.config.time.eon_of_season(season);
        let standings = compute_grandmaster_standings(&*store, league.id, eon)?;
        if let Some(assignment) = plan_eon_reward(&standings) {
            let mut blob = store.get_blob_by_id(assignment.blob_id)?;
            apply_award(&mut blob, assignment.award, &self.config);
            store.save_blob(&blob)?;
            info!(
                league = %league.id,
                season,
                eon,
                grandmaster = %blob.id,
                state = ?PeriodState::Concluded,
                "eon concluded"
            );
        }
        Ok(Some(standings))
    }
}
