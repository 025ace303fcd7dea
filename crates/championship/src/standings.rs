//! Season and eon rankings.
//!
//! Both rankings order by points descending and break ties on the lower blob
//! id, so the outcome never depends on storage order.

use crate::BlobStore;
use blob_core::{
    Blob, BlobId, EventResult, GrandmasterStandingsDto, LeagueId, StandingsDto, StandingsResult,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

fn by_points_then_id(a: (u64, BlobId), b: (u64, BlobId)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1))
}

/// Ranked season standings for `league_id`.
pub fn compute_standings<S: BlobStore + ?Sized>(
    store: &S,
    league_id: LeagueId,
    season: u64,
) -> Result<Vec<StandingsDto>, S::Error> {
    store.get_standings(league_id, season)
}

/// Ranked standings of `eon` for `league_id`. Lower tiers have no
/// grandmaster race and yield an empty ranking.
pub fn compute_grandmaster_standings<S: BlobStore + ?Sized>(
    store: &S,
    league_id: LeagueId,
    eon: u64,
) -> Result<Vec<GrandmasterStandingsDto>, S::Error> {
    let league = store.get_league(league_id)?;
    if !league.is_top_tier() {
        debug!(league = %league_id, level = league.level, "no grandmaster ranking below top tier");
        return Ok(Vec::new());
    }
    let roster = store.get_all_by_league_order_by_id(league_id)?;
    let records = store.get_grandmaster_standings(league_id, eon)?;
    Ok(rank_grandmasters(&roster, records))
}

/// Build one row per rostered blob from its season results.
///
/// Results of blobs outside the roster are ignored; rostered blobs without
/// results score zero.
pub fn rank_standings(
    roster: &BTreeMap<BlobId, Blob>,
    results: &[EventResult],
) -> Vec<StandingsDto> {
    let mut rows: BTreeMap<BlobId, StandingsDto> = roster
        .values()
        .map(|b| {
            (
                b.id,
                StandingsDto {
                    blob_id: b.id,
                    name: b.name.clone(),
                    is_contract_ending: b.is_contract_ending(),
                    results: Vec::new(),
                    total_points: 0,
                },
            )
        })
        .collect();

    for r in results {
        if let Some(row) = rows.get_mut(&r.blob_id) {
            row.results.push(StandingsResult {
                event_id: r.event_id,
                points: r.points,
            });
            row.total_points = row.total_points.saturating_add(u64::from(r.points));
        }
    }

    let mut ranked: Vec<StandingsDto> = rows.into_values().collect();
    for row in &mut ranked {
        row.results.sort_by_key(|r| r.event_id);
    }
    ranked.sort_by(|a, b| {
        by_points_then_id((a.total_points, a.blob_id), (b.total_points, b.blob_id))
    });
    ranked
}

/// Merge eon records into the roster and rank them.
///
/// Medal counters are taken from the records as-is. A rostered blob with no
/// record gets a zero row carrying its own championship count; records for
/// blobs outside the roster, and repeated records, are dropped.
pub fn rank_grandmasters(
    roster: &BTreeMap<BlobId, Blob>,
    records: Vec<GrandmasterStandingsDto>,
) -> Vec<GrandmasterStandingsDto> {
    let mut by_id: BTreeMap<BlobId, GrandmasterStandingsDto> = BTreeMap::new();
    for rec in records {
        if roster.contains_key(&rec.blob_id) && !by_id.contains_key(&rec.blob_id) {
            by_id.insert(rec.blob_id, rec);
        }
    }
    let mut ranked: Vec<GrandmasterStandingsDto> = roster
        .values()
        .map(|b| {
            by_id.remove(&b.id).unwrap_or_else(|| GrandmasterStandingsDto {
                blob_id: b.id,
                name: b.name.clone(),
                championships: b.championships,
                gold: 0,
                silver: 0,
                bronze: 0,
                points: 0,
            })
        })
        .collect();
    ranked.sort_by(|a, b| by_points_then_id((a.points, a.blob_id), (b.points, b.blob_id)));
    ranked
}
