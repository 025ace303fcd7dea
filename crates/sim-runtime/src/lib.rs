#![deny(warnings)]

//! Cycle loop driving period conclusion.
//!
//! At each season boundary every league is checked in tier order, season
//! first and eon second, so the eon reward always sees the blob as the season
//! reward left it. Each conclusion runs at most once per league and period.
//! A season that still had unresolved events is retried at every later
//! boundary until it concludes.

use blob_core::{ChampionshipConfig, GrandmasterStandingsDto, LeagueId, SimTime, StandingsDto};
use championship::{BlobStore, ChampionshipService};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Outcome of a concluded period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Conclusion {
    Season {
        league: LeagueId,
        season: u64,
        standings: Vec<StandingsDto>,
    },
    Eon {
        league: LeagueId,
        season: u64,
        standings: Vec<GrandmasterStandingsDto>,
    },
}

/// What happened during one cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub time: SimTime,
    pub conclusions: Vec<Conclusion>,
}

/// Simulation state over a store.
pub struct Simulation<S> {
    store: S,
    service: ChampionshipService,
    cycle: u64,
    seasons_done: BTreeSet<(LeagueId, u64)>,
    eons_done: BTreeSet<(LeagueId, u64)>,
    pending_seasons: BTreeSet<u64>,
}

impl<S: BlobStore> Simulation<S> {
    pub fn new(store: S, config: ChampionshipConfig) -> Self {
        Self {
            store,
            service: ChampionshipService::new(config),
            cycle: 0,
            seasons_done: BTreeSet::new(),
            eons_done: BTreeSet::new(),
            pending_seasons: BTreeSet::new(),
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn now(&self) -> SimTime {
        self.service.config().time.at(self.cycle)
    }

    pub fn config(&self) -> &ChampionshipConfig {
        self.service.config()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Seasons some league could not conclude yet, oldest first.
    pub fn pending_seasons(&self) -> impl Iterator<Item = u64> + '_ {
        self.pending_seasons.iter().copied()
    }

    /// Move one cycle forward.
    ///
    /// On a season boundary, earlier seasons left pending are retried oldest
    /// first, then the season that just ran out is concluded.
    pub fn advance(&mut self) -> Result<TickReport, S::Error> {
        self.cycle = self.cycle.saturating_add(1);
        let scale = self.service.config().time;
        let mut conclusions = Vec::new();
        if scale.is_season_boundary(self.cycle) {
            let finished = scale.season(self.cycle).saturating_sub(1);
            let retries: Vec<u64> = self.pending_seasons.range(..finished).copied().collect();
            for season in retries.into_iter().chain([finished]) {
                conclusions.extend(self.conclude_season(season)?);
            }
        }
        Ok(TickReport {
            time: self.now(),
            conclusions,
        })
    }

    /// Run `cycles` cycles and collect every conclusion on the way.
    pub fn run(&mut self, cycles: u64) -> Result<Vec<Conclusion>, S::Error> {
        let mut out = Vec::new();
        for _ in 0..cycles {
            out.extend(self.advance()?.conclusions);
        }
        Ok(out)
    }

    /// Try to conclude `season` for every league not yet concluded for it.
    ///
    /// Safe to call again for a season that was still pending; periods
    /// already concluded are skipped. A season any league could not conclude
    /// stays pending and is retried by [`Simulation::advance`].
    pub fn conclude_season(&mut self, season: u64) -> Result<Vec<Conclusion>, S::Error> {
        let mut leagues = self.store.get_leagues()?;
        leagues.sort_by_key(|l| (l.level, l.id));

        let mut out = Vec::new();
        let mut pending = false;
        for league in leagues {
            let key = (league.id, season);
            if !self.seasons_done.contains(&key) {
                match self.service.end_season_if_over(&league, season, &mut self.store)? {
                    Some(standings) => {
                        self.seasons_done.insert(key);
                        out.push(Conclusion::Season {
                            league: league.id,
                            season,
                            standings,
                        });
                    }
                    None => {
                        warn!(league = %league.id, season, "season still has unresolved events");
                        pending = true;
                        continue;
                    }
                }
            }
            if !self.eons_done.contains(&key) {
                if let Some(standings) =
                    self.service.end_eon_if_over(season, &league, &mut self.store)?
                {
                    self.eons_done.insert(key);
                    out.push(Conclusion::Eon {
                        league: league.id,
                        season,
                        standings,
                    });
                }
            }
        }
        if pending {
            self.pending_seasons.insert(season);
        } else {
            self.pending_seasons.remove(&season);
        }
        if !out.is_empty() {
            info!(season, concluded = out.len(), "period boundary processed");
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blob_core::{Blob, BlobId, EventType, League, TimeScale};
    use persistence::MemoryStore;

    fn config() -> ChampionshipConfig {
        ChampionshipConfig {
            time: TimeScale::new(2, 2, 2).unwrap(),
            ..ChampionshipConfig::default()
        }
    }

    /// Two leagues, two blobs each, one event per league and season.
    fn sim() -> Simulation<MemoryStore> {
        let cfg = config();
        let mut store = MemoryStore::new(cfg.time);
        for (id, level) in [(1, 1), (2, 2)] {
            store.insert_league(League {
                id: LeagueId(id),
                name: format!("L{id}"),
                field_size: 4,
                level,
            });
        }
        for (id, league) in [(1, 1), (2, 1), (3, 2), (4, 2)] {
            let mut b = Blob::new(BlobId(id), format!("B{id}"), LeagueId(league), &cfg.time);
            b.integrity = 1;
            store.insert_blob(b);
        }
        Simulation::new(store, cfg)
    }

    /// Schedule and immediately resolve the season's events; the lower id
    /// of each league wins.
    fn play_season(sim: &mut Simulation<MemoryStore>, season: u64) {
        for (league, a, b) in [(1, 1, 2), (2, 3, 4)] {
            let store = sim.store_mut();
            let e = store
                .schedule_event(LeagueId(league), season, EventType::QuarteredOneShotScoring)
                .unwrap();
            store.record_results(e, &[(BlobId(a), 10), (BlobId(b), 5)]).unwrap();
        }
    }

    #[test]
    fn no_conclusion_inside_a_season() {
        let mut s = sim();
        play_season(&mut s, 1);
        for _ in 0..3 {
            assert!(s.advance().unwrap().conclusions.is_empty());
        }
        assert_eq!(s.now().short(), "1.  1 - 1");
    }

    #[test]
    fn season_then_eon_in_tier_order() {
        let mut s = sim();
        play_season(&mut s, 1);
        let first = s.run(4).unwrap();
        assert_eq!(first.len(), 2);
        assert!(matches!(first[0], Conclusion::Season { league: LeagueId(1), season: 1, .. }));
        assert!(matches!(first[1], Conclusion::Season { league: LeagueId(2), season: 1, .. }));

        play_season(&mut s, 2);
        let second = s.run(4).unwrap();
        let kinds: Vec<(&str, u32)> = second
            .iter()
            .map(|c| match c {
                Conclusion::Season { league, .. } => ("season", league.0),
                Conclusion::Eon { league, .. } => ("eon", league.0),
            })
            .collect();
        assert_eq!(kinds, vec![("season", 1), ("eon", 1), ("season", 2)]);

        let store = s.store();
        let b1 = store.get_blob_by_id(BlobId(1)).unwrap();
        assert_eq!(b1.championships, 2);
        assert_eq!(b1.grandmasters, 1);
        // two titles (+2 each) and the eon crown (+1)
        assert_eq!(b1.contract, 5);
        assert_eq!(b1.money, s.config().grandmaster_prize);
        assert_eq!(b1.integrity, s.config().time.cycles_per_eon().get());

        let b3 = store.get_blob_by_id(BlobId(3)).unwrap();
        assert_eq!(b3.season_victories, 2);
        assert_eq!(b3.grandmasters, 0);
    }

    #[test]
    fn repeated_boundary_check_does_not_double_reward() {
        let mut s = sim();
        play_season(&mut s, 1);
        s.run(4).unwrap();
        assert!(s.conclude_season(1).unwrap().is_empty());
        assert_eq!(s.store().get_blob_by_id(BlobId(1)).unwrap().contract, 2);
    }

    #[test]
    fn pending_season_can_be_retried() {
        let mut s = sim();
        let e = s
            .store_mut()
            .schedule_event(LeagueId(1), 1, EventType::QuarteredTwoShotScoring)
            .unwrap();
        let report = s.run(4).unwrap();
        // league 2 has no events and concludes on an empty schedule
        assert_eq!(report.len(), 1);
        assert!(matches!(report[0], Conclusion::Season { league: LeagueId(2), .. }));

        s.store_mut().record_results(e, &[(BlobId(2), 1)]).unwrap();
        let retry = s.conclude_season(1).unwrap();
        assert_eq!(retry.len(), 1);
        assert_eq!(s.store().get_blob_by_id(BlobId(2)).unwrap().championships, 1);
    }

    #[test]
    fn pending_season_concludes_at_next_boundary() {
        let mut s = sim();
        let e = s
            .store_mut()
            .schedule_event(LeagueId(1), 1, EventType::QuarteredTwoShotScoring)
            .unwrap();
        s.run(4).unwrap();
        assert_eq!(s.pending_seasons().collect::<Vec<_>>(), vec![1]);

        s.store_mut().record_results(e, &[(BlobId(2), 1)]).unwrap();
        let next = s.run(4).unwrap();
        let kinds: Vec<(&str, u32, u64)> = next
            .iter()
            .map(|c| match c {
                Conclusion::Season { league, season, .. } => ("season", league.0, *season),
                Conclusion::Eon { league, season, .. } => ("eon", league.0, *season),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![("season", 1, 1), ("season", 1, 2), ("eon", 1, 2), ("season", 2, 2)]
        );
        assert_eq!(s.pending_seasons().count(), 0);
        assert_eq!(s.store().get_blob_by_id(BlobId(2)).unwrap().championships, 1);
    }

    #[test]
    fn late_season_result_counts_toward_its_own_eon() {
        let mut s = sim();
        let schedule = |s: &mut Simulation<MemoryStore>, league: u32, season: u64| {
            s.store_mut()
                .schedule_event(LeagueId(league), season, EventType::QuarteredOneShotScoring)
                .unwrap()
        };
        // blob 2 beats blob 1 in both seasons of eon 0
        let first = schedule(&mut s, 1, 1);
        s.store_mut().record_results(first, &[(BlobId(1), 5), (BlobId(2), 10)]).unwrap();
        s.run(4).unwrap();

        let late = schedule(&mut s, 1, 2);
        let lower = schedule(&mut s, 2, 2);
        s.store_mut().record_results(lower, &[(BlobId(3), 10), (BlobId(4), 5)]).unwrap();
        s.run(4).unwrap();
        assert_eq!(s.pending_seasons().collect::<Vec<_>>(), vec![2]);

        schedule(&mut s, 1, 3);
        s.store_mut().record_results(late, &[(BlobId(1), 5), (BlobId(2), 10)]).unwrap();
        let out = s.conclude_season(2).unwrap();

        assert!(matches!(out[1], Conclusion::Eon { league: LeagueId(1), season: 2, .. }));
        let store = s.store();
        assert_eq!(store.get_blob_by_id(BlobId(2)).unwrap().grandmasters, 1);
        assert_eq!(store.get_blob_by_id(BlobId(1)).unwrap().grandmasters, 0);
        assert_eq!(s.pending_seasons().count(), 0);
    }

    #[test]
    fn report_serializes() {
        let mut s = sim();
        play_season(&mut s, 1);
        let out = s.run(4).unwrap();
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains("\"Season\""));
    }
}
