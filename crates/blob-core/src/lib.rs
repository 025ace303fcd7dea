#![deny(warnings)]

//! Core domain models and invariants for the blob league simulation.
//!
//! This crate defines serializable types shared across the workspace: the
//! competitors ("blobs"), leagues, standings rows, the simulated calendar and
//! the championship configuration, with validation helpers guarding the basic
//! invariants.

pub mod time;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use time::{SimTime, TimeScale};

/// Stable identifier of a competitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlobId(pub u32);

/// Stable identifier of a league.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LeagueId(pub u32);

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LeagueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A competitor taking part in league events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub id: BlobId,
    pub name: String,
    /// League the blob is currently rostered in.
    pub league_id: LeagueId,
    /// Remaining term before the blob must be renewed or retired.
    pub contract: u32,
    pub money: u64,
    /// Top-tier season titles.
    pub championships: u32,
    /// Lower-tier season titles.
    pub season_victories: u32,
    /// Eon titles.
    pub grandmasters: u32,
    /// Condition counter in `[0, cycles_per_eon]`.
    pub integrity: u64,
}

impl Blob {
    /// A fresh blob with empty tallies and full integrity.
    pub fn new(
        id: BlobId,
        name: impl Into<String>,
        league_id: LeagueId,
        scale: &TimeScale,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            league_id,
            contract: 0,
            money: 0,
            championships: 0,
            season_victories: 0,
            grandmasters: 0,
            integrity: scale.cycles_per_eon().get(),
        }
    }

    /// True when no term remains past the current season.
    pub fn is_contract_ending(&self) -> bool {
        self.contract == 0
    }

    /// Sets integrity, clamped to one eon's worth of cycles.
    pub fn set_integrity(&mut self, value: u64, scale: &TimeScale) {
        self.integrity = value.min(scale.cycles_per_eon().get());
    }
}

/// A competitive tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    /// Number of competitor slots; rosters may be smaller.
    pub field_size: u32,
    /// 1 is the top tier, larger numbers are lower tiers.
    pub level: u8,
}

impl League {
    pub fn is_top_tier(&self) -> bool {
        self.level == 1
    }
}

/// Kinds of events a league season is made of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    QuarteredTwoShotScoring,
    QuarteredOneShotScoring,
}

impl EventType {
    /// Human readable name.
    pub fn display_text(&self) -> &'static str {
        match self {
            EventType::QuarteredTwoShotScoring => "Quartered two-shot high jump",
            EventType::QuarteredOneShotScoring => "Quartered one-shot high jump",
        }
    }

    /// Storage tag, the inverse of [`EventType::from_str`].
    pub fn tag(&self) -> &'static str {
        match self {
            EventType::QuarteredTwoShotScoring => "QUARTERED_TWO_SHOT_SCORING",
            EventType::QuarteredOneShotScoring => "QUARTERED_ONE_SHOT_SCORING",
        }
    }
}

/// An event tag that maps to no [`EventType`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown event type tag: {0:?}")]
pub struct ParseEventTypeError(pub String);

impl FromStr for EventType {
    type Err = ParseEventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUARTERED_TWO_SHOT_SCORING" => Ok(EventType::QuarteredTwoShotScoring),
            "QUARTERED_ONE_SHOT_SCORING" => Ok(EventType::QuarteredOneShotScoring),
            other => Err(ParseEventTypeError(other.to_string())),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_text())
    }
}

/// Raw points a blob scored in one league event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResult {
    pub event_id: u32,
    pub blob_id: BlobId,
    pub points: u32,
}

/// One blob's points in a single event of the season.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsResult {
    pub event_id: u32,
    pub points: u32,
}

/// A season ranking row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsDto {
    pub blob_id: BlobId,
    pub name: String,
    pub is_contract_ending: bool,
    /// Ordered by event id.
    pub results: Vec<StandingsResult>,
    pub total_points: u64,
}

/// An eon ranking row for the top tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrandmasterStandingsDto {
    pub blob_id: BlobId,
    pub name: String,
    pub championships: u32,
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
    pub points: u64,
}

/// Prize amounts and calendar ratios consumed by the championship services.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChampionshipConfig {
    pub time: TimeScale,
    /// Money a season winner ends up with.
    pub champion_prize: u64,
    /// Money an eon winner ends up with.
    pub grandmaster_prize: u64,
}

impl Default for ChampionshipConfig {
    fn default() -> Self {
        Self {
            time: TimeScale::default(),
            champion_prize: 150,
            grandmaster_prize: 1_000,
        }
    }
}

/// Configuration problems.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The calendar ratios multiply past `u64::MAX`.
    #[error("calendar ratios overflow the cycle counter")]
    CalendarOverflow,
    /// The document could not be parsed.
    #[error("invalid config document: {0}")]
    Parse(String),
}

impl ChampionshipConfig {
    /// Parse a YAML document; missing keys fall back to defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: ChampionshipConfig =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time.checked_cycles_per_eon().is_none() {
            return Err(ConfigError::CalendarOverflow);
        }
        Ok(())
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Integrity above one eon of cycles.
    #[error("blob {0}: integrity {1} exceeds the eon length")]
    IntegrityOutOfRange(BlobId, u64),
    /// Names must not be blank.
    #[error("blank name")]
    BlankName,
    /// Leagues need at least one slot and a level of 1 or more.
    #[error("league {0}: invalid field size or level")]
    InvalidLeague(LeagueId),
}

/// Validate a blob against the calendar it lives in.
pub fn validate_blob(blob: &Blob, scale: &TimeScale) -> Result<(), ValidationError> {
    if blob.name.trim().is_empty() {
        return Err(ValidationError::BlankName);
    }
    if blob.integrity > scale.cycles_per_eon().get() {
        return Err(ValidationError::IntegrityOutOfRange(blob.id, blob.integrity));
    }
    Ok(())
}

/// Validate a league definition.
pub fn validate_league(league: &League) -> Result<(), ValidationError> {
    if league.name.trim().is_empty() {
        return Err(ValidationError::BlankName);
    }
    if league.field_size == 0 || league.level == 0 {
        return Err(ValidationError::InvalidLeague(league.id));
    }
    Ok(())
}
