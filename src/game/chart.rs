use serde::Serialize;
use smallvec::SmallVec;

use crate::game::rng::ChartRng;

pub const LANE_COUNT: usize = 4;

// The first beats of every level are left empty so the player has a moment
// to orient before the first note reaches the hit line.
pub const WARMUP_BEATS: u32 = 4;

pub const BASE_BPM: u32 = 80;
pub const BPM_PER_LEVEL: u32 = 5;
pub const BPM_GAIN_CAP: u32 = 120;
pub const BASE_DURATION_S: u32 = 20;
pub const DURATION_PER_LEVEL_S: u32 = 2;
pub const DURATION_CAP_S: u32 = 60;
pub const DIFFICULTY_PER_LEVEL: f64 = 0.15;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Normal,
    Double,
    // Carried in the data model; the procedural generator currently emits
    // normal and double only.
    Hold,
}

/// One scheduled note group. `time` is normalized to `[0, 1)` over the
/// level duration; `lanes` holds one entry for a single note and two
/// distinct entries for a double.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Pattern {
    pub time: f64,
    pub lanes: SmallVec<[u8; 2]>,
    pub kind: NoteKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LevelChart {
    pub level: u32,
    pub bpm: f64,
    pub duration_s: f64,
    pub difficulty: f64,
    pub patterns: Vec<Pattern>,
}

impl LevelChart {
    #[inline(always)]
    pub fn beat_duration(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Absolute hit time in seconds for a normalized pattern time.
    #[inline(always)]
    pub fn hit_time(&self, normalized: f64) -> f64 {
        normalized * self.duration_s
    }
}

/// Generates the chart for `level`. Pure: the same level number always yields
/// the same chart, so the menu preview and the live attempt agree, and
/// per-level records stay comparable across sessions.
pub fn generate(level: u32) -> LevelChart {
    let level = level.max(1);
    let bpm = f64::from(BASE_BPM + level.saturating_mul(BPM_PER_LEVEL).min(BPM_GAIN_CAP));
    let duration_s = f64::from(
        level
            .saturating_mul(DURATION_PER_LEVEL_S)
            .saturating_add(BASE_DURATION_S)
            .min(DURATION_CAP_S),
    );
    let difficulty = 1.0 + f64::from(level - 1) * DIFFICULTY_PER_LEVEL;

    let beat_duration = 60.0 / bpm;
    let total_beats = (duration_s / beat_duration).floor() as u32;

    let note_chance = 0.5 + (difficulty * 0.08).min(0.4);
    let double_chance = (0.05 + difficulty * 0.05).min(0.4);
    let offbeat_chance = (difficulty * 0.08).min(0.5);

    let mut rng = ChartRng::for_level(level);
    let mut patterns = Vec::new();

    for beat in WARMUP_BEATS..total_beats {
        let beat_time = f64::from(beat) * beat_duration;

        if rng.chance(note_chance) {
            let lane = rng.pick_index(LANE_COUNT);
            let mut lanes: SmallVec<[u8; 2]> = SmallVec::new();
            lanes.push(lane as u8);
            let mut kind = NoteKind::Normal;
            if rng.chance(double_chance) {
                // Offset into the remaining lanes, so the pair is always
                // distinct and costs exactly one draw.
                let second = (lane + 1 + rng.pick_index(LANE_COUNT - 1)) % LANE_COUNT;
                lanes.push(second as u8);
                kind = NoteKind::Double;
            }
            push_pattern(&mut patterns, beat_time / duration_s, lanes, kind);
        }

        if rng.chance(offbeat_chance) {
            let lane = rng.pick_index(LANE_COUNT);
            let time = (beat_time + 0.5 * beat_duration) / duration_s;
            push_pattern(&mut patterns, time, single(lane), NoteKind::Normal);
        }

        if difficulty > 2.0 && rng.chance(0.1) {
            let first = rng.pick_index(LANE_COUNT);
            let t1 = (beat_time + beat_duration / 3.0) / duration_s;
            push_pattern(&mut patterns, t1, single(first), NoteKind::Normal);

            let second = rng.pick_index(LANE_COUNT);
            let t2 = (beat_time + 2.0 * beat_duration / 3.0) / duration_s;
            push_pattern(&mut patterns, t2, single(second), NoteKind::Normal);
        }
    }

    patterns.sort_by(|a, b| a.time.total_cmp(&b.time));

    LevelChart {
        level,
        bpm,
        duration_s,
        difficulty,
        patterns,
    }
}

#[inline(always)]
fn single(lane: usize) -> SmallVec<[u8; 2]> {
    let mut lanes = SmallVec::new();
    lanes.push(lane as u8);
    lanes
}

fn push_pattern(patterns: &mut Vec<Pattern>, time: f64, lanes: SmallVec<[u8; 2]>, kind: NoteKind) {
    // Off-beat and triplet offsets near the last beat can land past the end
    // of the level; those are dropped to keep every time inside [0, 1).
    if time < 1.0 {
        patterns.push(Pattern { time, lanes, kind });
    }
}
