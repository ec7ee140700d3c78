use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::game::chart::LANE_COUNT;
use crate::game::upgrades::{self, MAX_UPGRADE_LEVEL, UpgradeKind, UpgradeLevels};

pub const SAVE_VERSION: u32 = 1;
pub const DEFAULT_KEYBINDS: [char; LANE_COUNT] = ['d', 'f', 'j', 'k'];

// Bounds applied to persisted records so a crafted save file cannot balloon
// memory or poison the tables with absurd entries. Out-of-range entries are
// dropped individually; the rest of the save still loads.
pub const MAX_RECORD_LEVEL: u32 = 100_000;
pub const MAX_RECORD_ENTRIES: usize = 10_000;
const MAX_RECORD_SCORE: u64 = 1_000_000_000_000;
const MAX_RECORD_COMBO: u32 = 1_000_000;

const SCORE_PER_UNLOCK_LEVEL: u64 = 1_000;
const CURRENCY_PER_SCORE: u64 = 10;

/// Everything that survives between sessions. Owned by the engine instance;
/// reaches disk only through the injected save port.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub currency: u64,
    pub highest_level: u32,
    pub upgrades: UpgradeLevels,
    pub best_scores: FxHashMap<u32, u64>,
    pub best_combos: FxHashMap<u32, u32>,
    pub keybinds: [char; LANE_COUNT],
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            currency: 0,
            highest_level: 1,
            upgrades: UpgradeLevels::default(),
            best_scores: FxHashMap::default(),
            best_combos: FxHashMap::default(),
            keybinds: DEFAULT_KEYBINDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased { cost: u64 },
    AtMaxLevel,
    NotEnoughPoints,
}

/// What one finished attempt did to the profile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FinishSummary {
    pub level: u32,
    pub score: u64,
    pub max_combo: u32,
    pub reward: u64,
    pub new_high_score: bool,
    pub new_best_combo: bool,
    pub unlocked: Option<u32>,
}

impl Profile {
    pub fn best_score(&self, level: u32) -> u64 {
        self.best_scores.get(&level).copied().unwrap_or(0)
    }

    pub fn best_combo(&self, level: u32) -> u32 {
        self.best_combos.get(&level).copied().unwrap_or(0)
    }

    /// Folds a finished attempt into the profile: currency reward, monotonic
    /// record updates and the frontier unlock check.
    pub fn apply_finish(&mut self, level: u32, score: u64, max_combo: u32) -> FinishSummary {
        let reward = score / CURRENCY_PER_SCORE;
        self.currency = self.currency.saturating_add(reward);

        // Records only ever move up.
        let new_high_score = score > self.best_score(level);
        if new_high_score {
            self.best_scores.insert(level, score);
        }
        let new_best_combo = max_combo > self.best_combo(level);
        if new_best_combo {
            self.best_combos.insert(level, max_combo);
        }

        // Only the frontier level can push the unlock counter forward.
        let mut unlocked = None;
        let threshold = SCORE_PER_UNLOCK_LEVEL.saturating_mul(u64::from(level));
        if level == self.highest_level && score >= threshold {
            let next = level.saturating_add(1);
            self.highest_level = next;
            unlocked = Some(next);
        }

        FinishSummary {
            level,
            score,
            max_combo,
            reward,
            new_high_score,
            new_best_combo,
            unlocked,
        }
    }

    /// Attempts to buy the next level of `kind`. Never fails loudly: at max
    /// level or short on points the profile is left untouched and the
    /// outcome says why.
    pub fn try_purchase(&mut self, kind: UpgradeKind) -> PurchaseOutcome {
        let level = self.upgrades.get(kind);
        if level >= MAX_UPGRADE_LEVEL {
            return PurchaseOutcome::AtMaxLevel;
        }
        let cost = upgrades::cost_at(kind, level);
        if self.currency < cost {
            return PurchaseOutcome::NotEnoughPoints;
        }
        self.currency -= cost;
        self.upgrades.raise(kind);
        PurchaseOutcome::Purchased { cost }
    }

    /// Decodes a persisted blob, treating every field as optional and never
    /// letting a parse failure escape: garbage in means a fresh profile out.
    pub fn from_blob(blob: &str) -> Self {
        match serde_json::from_str::<SaveBlob>(blob) {
            Ok(raw) => Self::from_raw(raw),
            Err(e) => {
                warn!("Save blob unreadable, starting fresh: {e}");
                Self::default()
            }
        }
    }

    /// Strict variant for user-initiated import: a parse failure is returned
    /// to the caller instead of being swallowed.
    pub fn parse_blob(blob: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<SaveBlob>(blob).map(Self::from_raw)
    }

    fn from_raw(raw: SaveBlob) -> Self {
        if raw.version > SAVE_VERSION {
            warn!(
                "Save version {} is newer than {}, loading best-effort",
                raw.version, SAVE_VERSION
            );
        }

        let mut profile = Self {
            currency: raw.currency,
            highest_level: raw.highest_level.clamp(1, MAX_RECORD_LEVEL),
            ..Self::default()
        };

        for (id, level) in &raw.upgrades {
            match id.parse::<UpgradeKind>() {
                Ok(kind) => profile.upgrades.set(kind, *level),
                Err(()) => debug!("Ignoring unknown upgrade id {id:?} in save"),
            }
        }

        for &(level, score) in raw.best_scores.iter().take(MAX_RECORD_ENTRIES) {
            if (1..=MAX_RECORD_LEVEL).contains(&level) && score <= MAX_RECORD_SCORE {
                profile.best_scores.insert(level, score);
            } else {
                debug!("Dropping absurd score record ({level}, {score})");
            }
        }
        for &(level, combo) in raw.best_combos.iter().take(MAX_RECORD_ENTRIES) {
            if (1..=MAX_RECORD_LEVEL).contains(&level) && combo <= MAX_RECORD_COMBO {
                profile.best_combos.insert(level, combo);
            } else {
                debug!("Dropping absurd combo record ({level}, {combo})");
            }
        }

        if raw.keybinds.len() == LANE_COUNT {
            for (slot, c) in profile.keybinds.iter_mut().zip(&raw.keybinds) {
                *slot = c.to_ascii_lowercase();
            }
        } else if !raw.keybinds.is_empty() {
            warn!(
                "Persisted keybinds have {} entries, expected {LANE_COUNT}; using defaults",
                raw.keybinds.len()
            );
        }

        profile
    }

    /// Encodes the profile as the versioned save blob. Record lists are
    /// sorted by level so repeated saves of the same state are identical.
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        let mut best_scores: Vec<(u32, u64)> =
            self.best_scores.iter().map(|(&k, &v)| (k, v)).collect();
        best_scores.sort_unstable_by_key(|&(level, _)| level);
        let mut best_combos: Vec<(u32, u32)> =
            self.best_combos.iter().map(|(&k, &v)| (k, v)).collect();
        best_combos.sort_unstable_by_key(|&(level, _)| level);

        let blob = SaveBlob {
            version: SAVE_VERSION,
            currency: self.currency,
            highest_level: self.highest_level,
            upgrades: UpgradeKind::ALL
                .iter()
                .map(|&kind| (kind.id().to_string(), self.upgrades.get(kind)))
                .collect(),
            best_scores,
            best_combos,
            keybinds: self.keybinds.to_vec(),
        };
        serde_json::to_string(&blob)
    }
}

/// Wire shape of the save. Every field defaults when missing, which is what
/// lets old or hand-edited saves load.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SaveBlob {
    version: u32,
    currency: u64,
    highest_level: u32,
    upgrades: Vec<(String, u8)>,
    best_scores: Vec<(u32, u64)>,
    best_combos: Vec<(u32, u32)>,
    keybinds: Vec<char>,
}
