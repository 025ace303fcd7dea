#![deny(warnings)]

//! Headless CLI: seeds a small two-tier world, plays seasons with seeded
//! random event results and prints every concluded season and eon.

use anyhow::{Context, Result};
use blob_core::*;
use championship::BlobStore;
use persistence::{default_snapshot_path, MemoryStore};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sim_runtime::{Conclusion, Simulation, TickReport};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

struct Args {
    config: Option<String>,
    seasons: u64,
    seed: u64,
    snapshot: Option<String>,
    save: bool,
    json: bool,
}

impl Args {
    /// Explicit `--snapshot` path, else the default one when `--save` is set.
    fn snapshot_path(&self) -> Option<&str> {
        match (&self.snapshot, self.save) {
            (Some(path), _) => Some(path.as_str()),
            (None, true) => Some(default_snapshot_path()),
            (None, false) => None,
        }
    }
}

fn parse_args() -> Args {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from(argv: impl IntoIterator<Item = String>) -> Args {
    let mut args = Args {
        config: None,
        seasons: 4,
        seed: 42,
        snapshot: None,
        save: false,
        json: false,
    };
    let mut it = argv.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next(),
            "--seasons" => {
                if let Some(n) = it.next().and_then(|s| s.parse().ok()) {
                    args.seasons = n;
                }
            }
            "--seed" => {
                if let Some(n) = it.next().and_then(|s| s.parse().ok()) {
                    args.seed = n;
                }
            }
            "--snapshot" => args.snapshot = it.next(),
            "--save" => args.save = true,
            "--json" => args.json = true,
            _ => {}
        }
    }
    args
}

fn load_config(path: Option<&str>) -> Result<ChampionshipConfig> {
    let Some(path) = path else {
        return Ok(ChampionshipConfig::default());
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
    Ok(ChampionshipConfig::from_yaml_str(&text)?)
}

const NAMES: [&str; 12] = [
    "Gloop", "Wobble", "Squish", "Blorb", "Jelly", "Ooze", "Splat", "Drip", "Mush", "Goober",
    "Slick", "Puddle",
];

fn demo_store(cfg: &ChampionshipConfig) -> Result<MemoryStore> {
    let mut store = MemoryStore::new(cfg.time);
    let leagues = [
        League {
            id: LeagueId(1),
            name: "Premier Pond".to_string(),
            field_size: 6,
            level: 1,
        },
        League {
            id: LeagueId(2),
            name: "Lower Lagoon".to_string(),
            field_size: 8,
            level: 2,
        },
    ];
    for league in leagues {
        validate_league(&league)?;
        store.insert_league(league);
    }
    for (id, name) in (1u32..).zip(NAMES) {
        let league = if id <= 6 { LeagueId(1) } else { LeagueId(2) };
        let blob = Blob::new(BlobId(id), name, league, &cfg.time);
        validate_blob(&blob, &cfg.time)?;
        store.insert_blob(blob);
    }
    Ok(store)
}

/// One event per league and epoch; returns event ids grouped by epoch.
fn schedule_season(
    store: &mut MemoryStore,
    cfg: &ChampionshipConfig,
    season: u64,
) -> Result<Vec<Vec<u32>>> {
    let leagues = store.get_leagues()?;
    let mut by_epoch = Vec::new();
    for epoch in 0..cfg.time.epochs_per_season.get() {
        let event_type = if epoch % 2 == 0 {
            EventType::QuarteredTwoShotScoring
        } else {
            EventType::QuarteredOneShotScoring
        };
        let mut ids = Vec::with_capacity(leagues.len());
        for league in &leagues {
            ids.push(store.schedule_event(league.id, season, event_type)?);
        }
        by_epoch.push(ids);
    }
    Ok(by_epoch)
}

fn resolve_events(store: &mut MemoryStore, events: &[u32], rng: &mut ChaCha8Rng) -> Result<()> {
    for &event_id in events {
        let league_id = store
            .events()
            .find(|e| e.id == event_id)
            .map(|e| e.league_id)
            .with_context(|| format!("event {event_id} missing"))?;
        let points: Vec<(BlobId, u32)> = store
            .get_all_by_league_order_by_id(league_id)?
            .into_keys()
            .map(|id| (id, rng.gen_range(0..=10)))
            .collect();
        store.record_results(event_id, &points)?;
    }
    Ok(())
}

fn print_report(report: &TickReport, cfg: &ChampionshipConfig) {
    for c in &report.conclusions {
        match c {
            Conclusion::Season {
                league,
                season,
                standings,
            } => {
                println!(
                    "[{}] Season {season} final standings, league {league}",
                    report.time.short()
                );
                for (pos, row) in (1..).zip(standings) {
                    let ending = if row.is_contract_ending { " *" } else { "" };
                    println!("{pos:>3}. {:<10} {:>4}{ending}", row.name, row.total_points);
                }
            }
            Conclusion::Eon {
                league,
                season,
                standings,
            } => {
                let eon = cfg.time.eon_of_season(*season);
                let crowned = standings.first().map(|r| r.name.as_str()).unwrap_or("-");
                println!("[{}] Eon {eon} grandmaster of league {league}: {crowned}", report.time);
                for (pos, row) in (1..).zip(standings) {
                    println!(
                        "{pos:>3}. {:<10} {:>5} | titles {} | {}/{}/{}",
                        row.name, row.points, row.championships, row.gold, row.silver, row.bronze
                    );
                }
            }
        }
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(config = ?args.config, seasons = args.seasons, seed = args.seed, "starting CLI");

    let cfg = load_config(args.config.as_deref())?;
    let store = demo_store(&cfg)?;
    let mut sim = Simulation::new(store, cfg.clone());
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let cycles_per_epoch = cfg.time.cycles_per_epoch.get();
    let total_cycles = args.seasons.saturating_mul(cfg.time.cycles_per_season().get());
    let mut schedule = schedule_season(sim.store_mut(), &cfg, 1)?;

    for _ in 0..total_cycles {
        let now = sim.now();
        if now.cycle + 1 == cycles_per_epoch {
            let epoch = usize::try_from(now.epoch)?;
            if let Some(events) = schedule.get(epoch) {
                resolve_events(sim.store_mut(), events, &mut rng)?;
            }
        }

        let report = sim.advance()?;
        if args.json && !report.conclusions.is_empty() {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            print_report(&report, &cfg);
        }

        if cfg.time.is_season_boundary(sim.cycle()) && report.time.season <= args.seasons {
            schedule = schedule_season(sim.store_mut(), &cfg, report.time.season)?;
        }
    }

    println!("Finished at {}", sim.now());
    for season in sim.pending_seasons() {
        warn!(season, "season left with unresolved events");
    }
    for b in sim.store().blobs() {
        println!(
            "{:<10} league {} | contract {} | money {} | championships {} | season wins {} \
             | grandmasters {}",
            b.name,
            b.league_id,
            b.contract,
            b.money,
            b.championships,
            b.season_victories,
            b.grandmasters
        );
    }

    if let Some(path) = args.snapshot_path() {
        sim.store().save_snapshot(path)?;
        info!(%path, "snapshot written");
    }
    Ok(())
}
