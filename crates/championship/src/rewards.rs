//! Reward selection and application.
//!
//! Picking who gets what is a pure function of the ranking. Applying an award
//! to a blob is a separate step so the two can be tested independently.

use blob_core::{Blob, BlobId, ChampionshipConfig, GrandmasterStandingsDto, League, StandingsDto};

/// What a blob receives at a period boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Award {
    /// First place in a season. `top_tier` decides which title tally grows.
    SeasonChampion { top_tier: bool },
    /// Second place in a season.
    RunnerUp,
    /// First place in the top tier over an eon.
    Grandmaster,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardAssignment {
    pub blob_id: BlobId,
    pub award: Award,
}

/// Season awards for the top two of `standings`.
pub fn plan_season_rewards(league: &League, standings: &[StandingsDto]) -> Vec<RewardAssignment> {
    let mut plan = Vec::with_capacity(2);
    let mut ranked = standings.iter();
    if let Some(first) = ranked.next() {
        plan.push(RewardAssignment {
            blob_id: first.blob_id,
            award: Award::SeasonChampion {
                top_tier: league.is_top_tier(),
            },
        });
    }
    if let Some(second) = ranked.next() {
        plan.push(RewardAssignment {
            blob_id: second.blob_id,
            award: Award::RunnerUp,
        });
    }
    plan
}

/// The grandmaster award, if anyone is ranked.
pub fn plan_eon_reward(standings: &[GrandmasterStandingsDto]) -> Option<RewardAssignment> {
    standings.first().map(|first| RewardAssignment {
        blob_id: first.blob_id,
        award: Award::Grandmaster,
    })
}

/// Mutate `blob` according to `award`.
pub fn apply_award(blob: &mut Blob, award: Award, config: &ChampionshipConfig) {
    match award {
        Award::SeasonChampion { top_tier } => {
            blob.contract = blob.contract.saturating_add(2);
            blob.money = config.champion_prize;
            if top_tier {
                blob.championships = blob.championships.saturating_add(1);
            } else {
                blob.season_victories = blob.season_victories.saturating_add(1);
            }
        }
        Award::RunnerUp => {
            blob.contract = blob.contract.saturating_add(1);
        }
        Award::Grandmaster => {
            blob.grandmasters = blob.grandmasters.saturating_add(1);
            blob.money = config.grandmaster_prize;
            blob.contract = blob.contract.saturating_add(1);
            blob.set_integrity(config.time.cycles_per_eon().get(), &config.time);
        }
    }
}
