use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub const UPGRADE_COUNT: usize = 5;
pub const MAX_UPGRADE_LEVEL: u8 = 10;
const COST_GROWTH: f64 = 1.5;

/// The five permanent upgrades. Fixed-size index, so effect lookups are a
/// plain array access instead of a string scan over a catalog.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    HitWindow,
    ScoreBoost,
    ComboShield,
    PerfectBonus,
    SlowFall,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; UPGRADE_COUNT] = [
        UpgradeKind::HitWindow,
        UpgradeKind::ScoreBoost,
        UpgradeKind::ComboShield,
        UpgradeKind::PerfectBonus,
        UpgradeKind::SlowFall,
    ];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable identifier used in the save blob.
    pub fn id(self) -> &'static str {
        match self {
            UpgradeKind::HitWindow => "hit_window",
            UpgradeKind::ScoreBoost => "score_boost",
            UpgradeKind::ComboShield => "combo_shield",
            UpgradeKind::PerfectBonus => "perfect_bonus",
            UpgradeKind::SlowFall => "slow_fall",
        }
    }
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for UpgradeKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hit_window" => Ok(UpgradeKind::HitWindow),
            "score_boost" => Ok(UpgradeKind::ScoreBoost),
            "combo_shield" => Ok(UpgradeKind::ComboShield),
            "perfect_bonus" => Ok(UpgradeKind::PerfectBonus),
            "slow_fall" => Ok(UpgradeKind::SlowFall),
            _ => Err(()),
        }
    }
}

pub struct UpgradeDef {
    pub kind: UpgradeKind,
    pub name: &'static str,
    pub blurb: &'static str,
    pub base_cost: u64,
    /// Per-level effect magnitude; how it applies depends on the kind.
    pub effect: f64,
}

pub const CATALOG: [UpgradeDef; UPGRADE_COUNT] = [
    UpgradeDef {
        kind: UpgradeKind::HitWindow,
        name: "Wider Timing",
        blurb: "Widens the hit window by 5% per level.",
        base_cost: 100,
        effect: 0.05,
    },
    UpgradeDef {
        kind: UpgradeKind::ScoreBoost,
        name: "Score Boost",
        blurb: "All points earned +10% per level.",
        base_cost: 150,
        effect: 0.10,
    },
    UpgradeDef {
        kind: UpgradeKind::ComboShield,
        name: "Combo Shield",
        blurb: "5% chance per level that a miss keeps your combo.",
        base_cost: 200,
        effect: 0.05,
    },
    UpgradeDef {
        kind: UpgradeKind::PerfectBonus,
        name: "Perfect Bonus",
        blurb: "Perfect hits earn +20% per level.",
        base_cost: 250,
        effect: 0.20,
    },
    UpgradeDef {
        kind: UpgradeKind::SlowFall,
        name: "Slow Fall",
        blurb: "Notes fall 3% slower per level.",
        base_cost: 120,
        effect: 0.03,
    },
];

#[inline(always)]
pub fn def(kind: UpgradeKind) -> &'static UpgradeDef {
    &CATALOG[kind.index()]
}

/// Price of going from `level` to `level + 1`.
pub fn cost_at(kind: UpgradeKind, level: u8) -> u64 {
    let base = def(kind).base_cost as f64;
    (base * COST_GROWTH.powi(i32::from(level))).floor() as u64
}

/// Owned upgrade levels, indexed by kind. Effects are computed from the
/// current levels at every call site, never cached, so a purchase applies on
/// the very next evaluation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UpgradeLevels([u8; UPGRADE_COUNT]);

impl UpgradeLevels {
    #[inline(always)]
    pub fn get(&self, kind: UpgradeKind) -> u8 {
        self.0[kind.index()]
    }

    pub fn set(&mut self, kind: UpgradeKind, level: u8) {
        self.0[kind.index()] = level.min(MAX_UPGRADE_LEVEL);
    }

    pub fn raise(&mut self, kind: UpgradeKind) {
        let slot = &mut self.0[kind.index()];
        *slot = slot.saturating_add(1).min(MAX_UPGRADE_LEVEL);
    }

    #[inline(always)]
    fn scaled(&self, kind: UpgradeKind) -> f64 {
        f64::from(self.get(kind)) * def(kind).effect
    }

    /// Multiplier on the base hit window.
    pub fn window_multiplier(&self) -> f64 {
        1.0 + self.scaled(UpgradeKind::HitWindow)
    }

    /// Multiplier on awarded points; the perfect bonus only applies to
    /// perfect hits.
    pub fn score_multiplier(&self, perfect: bool) -> f64 {
        let mut m = 1.0 + self.scaled(UpgradeKind::ScoreBoost);
        if perfect {
            m += self.scaled(UpgradeKind::PerfectBonus);
        }
        m
    }

    /// Probability that a miss leaves the combo intact.
    pub fn shield_chance(&self) -> f64 {
        self.scaled(UpgradeKind::ComboShield)
    }

    /// Multiplier on the base fall speed.
    pub fn speed_multiplier(&self) -> f64 {
        1.0 - self.scaled(UpgradeKind::SlowFall)
    }
}
