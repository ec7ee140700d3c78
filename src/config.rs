use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

// Field geometry defaults. Distances are in field units; the presentation
// layer maps them to pixels however it likes.
pub const DEFAULT_FIELD_WIDTH: f32 = 400.0;
pub const DEFAULT_FIELD_HEIGHT: f32 = 600.0;
pub const DEFAULT_HIT_LINE_Y: f32 = 500.0;
pub const DEFAULT_SPAWN_Y: f32 = -40.0;
pub const DEFAULT_NOTE_SIZE: f32 = 40.0;

pub const DEFAULT_NOTE_SPEED: f32 = 300.0;
pub const DEFAULT_HIT_WINDOW: f32 = 150.0;
pub const DEFAULT_PERFECT_WINDOW: f32 = 40.0;
pub const DEFAULT_GREAT_WINDOW: f32 = 80.0;
pub const DEFAULT_MISS_MARGIN: f32 = 50.0;

pub const DEFAULT_COUNTDOWN_S: f64 = 2.0;
pub const DEFAULT_END_GRACE_S: f64 = 2.0;
pub const DEFAULT_MISS_LIMIT: u32 = 10;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Engine tunables. The judgement constants (windows, miss margin, miss
/// limit, countdown) default to the values the scoring tests assume; hosts
/// mostly override geometry and speed.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub field_width: f32,
    pub field_height: f32,
    pub hit_line_y: f32,
    pub spawn_y: f32,
    pub note_size: f32,
    pub base_note_speed: f32,
    pub base_hit_window: f32,
    pub perfect_window: f32,
    pub great_window: f32,
    pub miss_margin: f32,
    pub countdown_s: f64,
    pub end_grace_s: f64,
    pub miss_limit: u32,
    pub log_level: LogLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            field_width: DEFAULT_FIELD_WIDTH,
            field_height: DEFAULT_FIELD_HEIGHT,
            hit_line_y: DEFAULT_HIT_LINE_Y,
            spawn_y: DEFAULT_SPAWN_Y,
            note_size: DEFAULT_NOTE_SIZE,
            base_note_speed: DEFAULT_NOTE_SPEED,
            base_hit_window: DEFAULT_HIT_WINDOW,
            perfect_window: DEFAULT_PERFECT_WINDOW,
            great_window: DEFAULT_GREAT_WINDOW,
            miss_margin: DEFAULT_MISS_MARGIN,
            countdown_s: DEFAULT_COUNTDOWN_S,
            end_grace_s: DEFAULT_END_GRACE_S,
            miss_limit: DEFAULT_MISS_LIMIT,
            log_level: LogLevel::default(),
        }
    }
}

impl EngineConfig {
    /// Loads overrides from a JSON file; anything missing or malformed
    /// falls back to defaults rather than failing the boot.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(_) => {
                info!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str::<Self>(text) {
            Ok(cfg) => cfg.sanitized(),
            Err(e) => {
                warn!("Config unreadable, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Clamps values the simulation divides by or iterates on.
    pub fn sanitized(mut self) -> Self {
        if !(self.base_note_speed > 0.0) {
            warn!("Non-positive note speed in config, using default");
            self.base_note_speed = DEFAULT_NOTE_SPEED;
        }
        if !(self.field_width > 0.0) {
            self.field_width = DEFAULT_FIELD_WIDTH;
        }
        if self.miss_limit == 0 {
            warn!("Miss limit 0 would end every attempt instantly, using default");
            self.miss_limit = DEFAULT_MISS_LIMIT;
        }
        if self.countdown_s < 0.0 {
            self.countdown_s = DEFAULT_COUNTDOWN_S;
        }
        self
    }

    /// Width of one lane. Lanes tile the field left to right.
    #[inline(always)]
    pub fn lane_width(&self) -> f32 {
        self.field_width / crate::game::chart::LANE_COUNT as f32
    }

    /// Horizontal center of a lane, for effect placement.
    #[inline(always)]
    pub fn lane_center_x(&self, lane: usize) -> f32 {
        (lane as f32 + 0.5) * self.lane_width()
    }

    /// Which lane a pointer x-coordinate falls into.
    pub fn lane_at_x(&self, x: f32) -> Option<usize> {
        if x < 0.0 || x >= self.field_width {
            return None;
        }
        let lane = (x / self.lane_width()) as usize;
        Some(lane.min(crate::game::chart::LANE_COUNT - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_judgement_constants() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.base_hit_window, 150.0);
        assert_eq!(cfg.perfect_window, 40.0);
        assert_eq!(cfg.great_window, 80.0);
        assert_eq!(cfg.miss_margin, 50.0);
        assert_eq!(cfg.miss_limit, 10);
        assert_eq!(cfg.countdown_s, 2.0);
    }

    #[test]
    fn malformed_json_falls_back_to_defaults() {
        assert_eq!(EngineConfig::from_json("nope"), EngineConfig::default());
        assert_eq!(EngineConfig::from_json("{]"), EngineConfig::default());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg = EngineConfig::from_json("{\"base_note_speed\": 450.0}");
        assert_eq!(cfg.base_note_speed, 450.0);
        assert_eq!(cfg.base_hit_window, DEFAULT_HIT_WINDOW);
    }

    #[test]
    fn degenerate_values_are_sanitized() {
        let cfg = EngineConfig::from_json("{\"base_note_speed\": 0.0, \"miss_limit\": 0}");
        assert_eq!(cfg.base_note_speed, DEFAULT_NOTE_SPEED);
        assert_eq!(cfg.miss_limit, DEFAULT_MISS_LIMIT);
    }

    #[test]
    fn pointer_x_maps_to_lanes() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.lane_at_x(-1.0), None);
        assert_eq!(cfg.lane_at_x(0.0), Some(0));
        assert_eq!(cfg.lane_at_x(99.0), Some(0));
        assert_eq!(cfg.lane_at_x(100.0), Some(1));
        assert_eq!(cfg.lane_at_x(399.9), Some(3));
        assert_eq!(cfg.lane_at_x(400.0), None);
    }

    #[test]
    fn load_or_default_survives_a_missing_file() {
        let cfg = EngineConfig::load_or_default("definitely/not/here.json");
        assert_eq!(cfg, EngineConfig::default());
    }
}
