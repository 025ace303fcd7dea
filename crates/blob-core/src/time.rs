//! Simulated calendar: cycles, epochs, seasons and eons.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;

const fn nz(v: u64) -> NonZeroU64 {
    match NonZeroU64::new(v) {
        Some(n) => n,
        None => NonZeroU64::MIN,
    }
}

/// Fixed ratios between the calendar units.
///
/// Every ratio is non-zero, so all conversions are total over `u64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeScale {
    /// Cycles in one epoch.
    pub cycles_per_epoch: NonZeroU64,
    /// Epochs in one season.
    pub epochs_per_season: NonZeroU64,
    /// Seasons in one eon.
    pub seasons_per_eon: NonZeroU64,
}

impl Default for TimeScale {
    fn default() -> Self {
        Self {
            cycles_per_epoch: nz(4),
            epochs_per_season: nz(10),
            seasons_per_eon: nz(4),
        }
    }
}

impl TimeScale {
    /// Builds a scale, rejecting zero ratios.
    pub fn new(
        cycles_per_epoch: u64,
        epochs_per_season: u64,
        seasons_per_eon: u64,
    ) -> Option<Self> {
        let scale = Self {
            cycles_per_epoch: NonZeroU64::new(cycles_per_epoch)?,
            epochs_per_season: NonZeroU64::new(epochs_per_season)?,
            seasons_per_eon: NonZeroU64::new(seasons_per_eon)?,
        };
        scale.checked_cycles_per_eon().map(|_| scale)
    }

    /// `None` when the products overflow `u64`.
    pub fn checked_cycles_per_eon(&self) -> Option<NonZeroU64> {
        self.cycles_per_epoch
            .checked_mul(self.epochs_per_season)?
            .checked_mul(self.seasons_per_eon)
    }

    pub fn cycles_per_season(&self) -> NonZeroU64 {
        self.cycles_per_epoch.saturating_mul(self.epochs_per_season)
    }

    pub fn cycles_per_eon(&self) -> NonZeroU64 {
        self.cycles_per_season().saturating_mul(self.seasons_per_eon)
    }

    pub fn eon(&self, t: u64) -> u64 {
        t / self.cycles_per_eon()
    }

    /// 1-based season index.
    pub fn season(&self, t: u64) -> u64 {
        (t / self.cycles_per_season()).saturating_add(1)
    }

    pub fn epoch_in_season(&self, t: u64) -> u64 {
        (t / self.cycles_per_epoch) % self.epochs_per_season
    }

    pub fn cycle_in_epoch(&self, t: u64) -> u64 {
        t % self.cycles_per_epoch
    }

    /// All calendar coordinates of cycle `t`.
    pub fn at(&self, t: u64) -> SimTime {
        SimTime {
            eon: self.eon(t),
            season: self.season(t),
            epoch: self.epoch_in_season(t),
            cycle: self.cycle_in_epoch(t),
        }
    }

    /// Whether a 1-based `season` closes its eon.
    pub fn is_final_season_of_eon(&self, season: u64) -> bool {
        season != 0 && season % self.seasons_per_eon == 0
    }

    /// Eon a 1-based `season` belongs to.
    pub fn eon_of_season(&self, season: u64) -> u64 {
        season.saturating_sub(1) / self.seasons_per_eon
    }

    /// True on the first cycle of every season except the very first one,
    /// i.e. the moment the previous season has run out of cycles.
    pub fn is_season_boundary(&self, t: u64) -> bool {
        t != 0 && t % self.cycles_per_season() == 0
    }
}

/// Calendar coordinates of a single cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimTime {
    pub eon: u64,
    pub season: u64,
    pub epoch: u64,
    pub cycle: u64,
}

impl SimTime {
    /// Compact form without the eon, e.g. `3.  7 - 2`.
    pub fn short(&self) -> String {
        format!("{}. {:2} - {}", self.season, self.epoch, self.cycle)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Eon: {} Season: {}. {} - {}",
            self.eon, self.season, self.epoch, self.cycle
        )
    }
}
