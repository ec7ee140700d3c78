//! Read-only view of one engine tick for a presentation layer.
//!
//! The simulation never draws; a frontend pulls a [`Frame`] after each tick
//! and renders whatever it finds there. Everything is borrowed or `Copy`,
//! and the whole frame serializes for headless consumers.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::game::chart::{LANE_COUNT, LevelChart};
use crate::game::gameplay::{self, Combo, FloatingText, LaneState, Note, Particle, ScoreBoard};
use crate::game::judgment::RatingCounts;
use crate::game::profile::{FinishSummary, Profile};
use crate::game::upgrades::{self, UPGRADE_COUNT, UpgradeKind, UpgradeLevels};
use crate::screens::{Screen, menu, results};

#[derive(Serialize)]
pub struct Frame<'a> {
    pub screen: Screen,
    pub currency: u64,
    pub highest_level: u32,
    pub upgrades: &'a UpgradeLevels,
    pub keybinds: &'a [char; LANE_COUNT],
    pub config: &'a EngineConfig,
    pub menu: Option<MenuView<'a>>,
    pub play: Option<PlayView<'a>>,
    pub results: Option<ResultsView>,
}

#[derive(Serialize)]
pub struct MenuView<'a> {
    pub selected_level: u32,
    pub preview: &'a LevelChart,
    pub rebind_lane: Option<usize>,
    pub notice: Option<&'a str>,
    pub upgrades: [UpgradeSlot; UPGRADE_COUNT],
}

/// One row of the upgrade shop.
#[derive(Copy, Clone, Serialize)]
pub struct UpgradeSlot {
    pub kind: UpgradeKind,
    pub name: &'static str,
    pub blurb: &'static str,
    pub level: u8,
    /// `None` once the upgrade is maxed out.
    pub next_cost: Option<u64>,
    pub affordable: bool,
}

#[derive(Serialize)]
pub struct PlayView<'a> {
    pub level: u32,
    pub bpm: f64,
    pub duration_s: f64,
    pub time: f64,
    pub paused: bool,
    pub notes: &'a [Note],
    pub lanes: &'a [LaneState; LANE_COUNT],
    pub combo: Combo,
    pub score: ScoreBoard,
    pub missed_notes: u32,
    pub miss_limit: u32,
    pub particles: &'a [Particle],
    pub texts: &'a [FloatingText],
    pub beat_pulse: f32,
    /// Effective values with upgrades applied, not the config bases.
    pub note_speed: f32,
    pub hit_window: f32,
    pub hit_line_y: f32,
}

#[derive(Copy, Clone, Serialize)]
pub struct ResultsView {
    pub summary: FinishSummary,
    pub counts: RatingCounts,
    pub cleared: bool,
    pub reveal: f32,
}

impl<'a> MenuView<'a> {
    pub fn capture(state: &'a menu::State, profile: &Profile) -> Self {
        let slots = std::array::from_fn(|i| {
            let kind = UpgradeKind::ALL[i];
            let def = upgrades::def(kind);
            let level = profile.upgrades.get(kind);
            let next_cost = (level < upgrades::MAX_UPGRADE_LEVEL)
                .then(|| upgrades::cost_at(kind, level));
            UpgradeSlot {
                kind,
                name: def.name,
                blurb: def.blurb,
                level,
                next_cost,
                affordable: next_cost.is_some_and(|c| profile.currency >= c),
            }
        });
        Self {
            selected_level: state.selected_level,
            preview: &state.preview,
            rebind_lane: state.rebind_lane,
            notice: state.notice.as_deref(),
            upgrades: slots,
        }
    }
}

impl<'a> PlayView<'a> {
    pub fn capture(state: &'a gameplay::State, upgrades: &UpgradeLevels) -> Self {
        Self {
            level: state.chart.level,
            bpm: state.chart.bpm,
            duration_s: state.chart.duration_s,
            time: state.time,
            paused: state.paused,
            notes: &state.notes,
            lanes: &state.lanes,
            combo: state.combo,
            score: state.score,
            missed_notes: state.missed_notes,
            miss_limit: state.cfg.miss_limit,
            particles: &state.particles,
            texts: &state.texts,
            beat_pulse: state.beat_pulse,
            note_speed: gameplay::effective_note_speed(&state.cfg, upgrades),
            hit_window: gameplay::effective_hit_window(&state.cfg, upgrades),
            hit_line_y: state.cfg.hit_line_y,
        }
    }
}

impl ResultsView {
    pub fn capture(state: &results::State) -> Self {
        Self {
            summary: state.summary,
            counts: state.counts,
            cleared: state.cleared,
            reveal: state.reveal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_view_prices_the_whole_catalog() {
        let profile = Profile {
            currency: 120,
            ..Profile::default()
        };
        let state = menu::init(&profile);
        let view = MenuView::capture(&state, &profile);

        assert_eq!(view.upgrades.len(), UPGRADE_COUNT);
        let hit_window = view.upgrades[UpgradeKind::HitWindow.index()];
        assert_eq!(hit_window.next_cost, Some(100));
        assert!(hit_window.affordable);
        let perfect = view.upgrades[UpgradeKind::PerfectBonus.index()];
        assert_eq!(perfect.next_cost, Some(250));
        assert!(!perfect.affordable, "250 is out of reach at 120 points");
    }

    #[test]
    fn maxed_upgrade_has_no_next_cost() {
        let mut profile = Profile::default();
        profile
            .upgrades
            .set(UpgradeKind::SlowFall, upgrades::MAX_UPGRADE_LEVEL);
        let state = menu::init(&profile);
        let view = MenuView::capture(&state, &profile);
        let slot = view.upgrades[UpgradeKind::SlowFall.index()];
        assert_eq!(slot.next_cost, None);
        assert!(!slot.affordable);
    }

    #[test]
    fn play_view_reports_effective_values() {
        let cfg = EngineConfig::default();
        let mut upgrades = UpgradeLevels::default();
        upgrades.set(UpgradeKind::HitWindow, 4);
        upgrades.set(UpgradeKind::SlowFall, 5);
        let state = gameplay::init(cfg, 3);
        let view = PlayView::capture(&state, &upgrades);

        assert_eq!(view.level, 3);
        assert!((view.hit_window - 180.0).abs() < 1e-3, "+20% window");
        assert!((view.note_speed - 255.0).abs() < 1e-3, "-15% fall speed");
        assert_eq!(view.miss_limit, 10);
        assert!(view.time < 0.0, "fresh attempt is still counting down");
    }

    #[test]
    fn play_view_serializes_for_headless_consumers() {
        let state = gameplay::init(EngineConfig::default(), 1);
        let view = PlayView::capture(&state, &UpgradeLevels::default());
        let json = serde_json::to_string(&view).expect("view must serialize");
        assert!(json.contains("\"notes\""));
        assert!(json.contains("\"beat_pulse\""));
    }
}
