use log::{debug, info};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::game::chart::{self, LANE_COUNT, LevelChart, NoteKind};
use crate::game::judgment::{self, JudgeGrade, RatingCounts};
use crate::game::upgrades::UpgradeLevels;
use crate::screens::{Screen, ScreenAction};

pub const COMBO_STEP: u32 = 10;
pub const COMBO_STEP_BONUS: f64 = 0.1;
const COMBO_MILESTONE: u32 = 100;

const DISPLAY_SCORE_RATE: f64 = 5.0;
const DISPLAY_SCORE_SNAP: f64 = 1.0;

const BEAT_PULSE_DECAY_PER_S: f32 = 2.5;
const LANE_GLOW_DECAY_PER_S: f32 = 3.0;
const WHIFF_GLOW: f32 = 0.35;

const PARTICLE_GRAVITY: f32 = 240.0;
const TEXT_RISE_PER_S: f32 = 40.0;
const RATING_TEXT_LIFE_S: f32 = 0.8;
const POINTS_TEXT_LIFE_S: f32 = 0.7;
const SAVED_TEXT_LIFE_S: f32 = 0.9;
const MILESTONE_TEXT_LIFE_S: f32 = 1.0;

pub const LANE_COLORS: [[u8; 3]; LANE_COUNT] = [
    [255, 107, 107],
    [255, 217, 97],
    [107, 207, 127],
    [77, 171, 247],
];

/// One falling note. `hit` and `missed` are mutually exclusive; a note can
/// also scroll out unresolved and be culled without ever setting either.
#[derive(Clone, Debug, Serialize)]
pub struct Note {
    pub id: u64,
    pub lane: u8,
    pub kind: NoteKind,
    pub hit_time: f64,
    pub spawn_time: f64,
    pub y: f32,
    pub hit: bool,
    pub missed: bool,
    pub rating: Option<JudgeGrade>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LaneState {
    pub x: f32,
    pub width: f32,
    pub color: [u8; 3],
    /// Mirrors the physical key state; a held key only judges once.
    pub pressed: bool,
    /// 0..1 glow for the presentation layer, decayed every tick.
    pub hit_effect: f32,
}

#[derive(Copy, Clone, Debug, Serialize)]
pub struct Combo {
    pub current: u32,
    pub max: u32,
    pub multiplier: f64,
}

impl Default for Combo {
    fn default() -> Self {
        Self {
            current: 0,
            max: 0,
            multiplier: 1.0,
        }
    }
}

impl Combo {
    pub fn advance(&mut self) {
        self.current = self.current.saturating_add(1);
        self.max = self.max.max(self.current);
        self.refresh_multiplier();
    }

    pub fn reset(&mut self) {
        self.current = 0;
        self.refresh_multiplier();
    }

    // multiplier = 1 + floor(current / 10) * 0.1, recomputed on every change.
    fn refresh_multiplier(&mut self) {
        self.multiplier = 1.0 + f64::from(self.current / COMBO_STEP) * COMBO_STEP_BONUS;
    }
}

#[derive(Copy, Clone, Debug, Default, Serialize)]
pub struct ScoreBoard {
    pub points: u64,
    /// Eases toward `points` for the score counter animation.
    pub display: f64,
    pub counts: RatingCounts,
}

#[derive(Copy, Clone, Debug, Serialize)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: f32,
    pub max_life: f32,
    pub tint: [u8; 3],
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    Rating,
    Points,
    Saved,
    Milestone,
}

#[derive(Clone, Debug, Serialize)]
pub struct FloatingText {
    pub text: String,
    pub kind: TextKind,
    pub x: f32,
    pub y: f32,
    pub life: f32,
}

/// Live state of one level attempt.
pub struct State {
    pub cfg: EngineConfig,
    pub chart: LevelChart,
    /// Simulation seconds; negative during the pre-roll countdown.
    pub time: f64,
    pub paused: bool,
    pub notes: Vec<Note>,
    next_note_id: u64,
    spawn_cursor: usize,
    pub lanes: [LaneState; LANE_COUNT],
    pub combo: Combo,
    pub score: ScoreBoard,
    pub missed_notes: u32,
    pub particles: Vec<Particle>,
    pub texts: Vec<FloatingText>,
    pub beat_pulse: f32,
    last_beat: i64,
}

pub fn init(cfg: EngineConfig, level: u32) -> State {
    let chart = chart::generate(level);
    info!(
        "Level {} attempt: {:.0} BPM, {:.0}s, {} patterns",
        chart.level,
        chart.bpm,
        chart.duration_s,
        chart.patterns.len()
    );
    let lane_width = cfg.lane_width();
    let lanes = std::array::from_fn(|i| LaneState {
        x: i as f32 * lane_width,
        width: lane_width,
        color: LANE_COLORS[i],
        pressed: false,
        hit_effect: 0.0,
    });
    State {
        cfg,
        chart,
        time: -cfg.countdown_s,
        paused: false,
        notes: Vec::new(),
        next_note_id: 0,
        spawn_cursor: 0,
        lanes,
        combo: Combo::default(),
        score: ScoreBoard::default(),
        missed_notes: 0,
        particles: Vec::new(),
        texts: Vec::new(),
        beat_pulse: 0.0,
        last_beat: -1,
    }
}

#[inline(always)]
pub fn effective_note_speed(cfg: &EngineConfig, upgrades: &UpgradeLevels) -> f32 {
    (f64::from(cfg.base_note_speed) * upgrades.speed_multiplier()) as f32
}

#[inline(always)]
pub fn effective_hit_window(cfg: &EngineConfig, upgrades: &UpgradeLevels) -> f32 {
    (f64::from(cfg.base_hit_window) * upgrades.window_multiplier()) as f32
}

/// Seconds a note is on screen between spawning and the hit line.
#[inline(always)]
fn travel_time(cfg: &EngineConfig, speed: f32) -> f64 {
    f64::from((cfg.hit_line_y - cfg.spawn_y) / speed)
}

/// One simulation step. The returned action is `Navigate(Results)` on the
/// tick that observes either termination condition: the miss limit, or the
/// level duration plus grace running out.
pub fn update(state: &mut State, upgrades: &UpgradeLevels, dt: f32) -> ScreenAction {
    let mut action = ScreenAction::None;

    if !state.paused {
        state.time += f64::from(dt);
        let speed = effective_note_speed(&state.cfg, upgrades);
        spawn_due_notes(state, speed);
        advance_notes(state, speed);
        apply_time_based_misses(state, upgrades);
        cull_scrolled_out_notes(state);
        pulse_on_beat(state);

        if state.missed_notes >= state.cfg.miss_limit {
            info!(
                "Attempt failed at {} misses (score {})",
                state.missed_notes, state.score.points
            );
            action = ScreenAction::Navigate(Screen::Results);
        } else if state.time >= state.chart.duration_s + state.cfg.end_grace_s {
            info!(
                "Level {} cleared: score {}, max combo {}",
                state.chart.level, state.score.points, state.combo.max
            );
            action = ScreenAction::Navigate(Screen::Results);
        }
    }

    tick_visual_effects(state, dt);
    action
}

/// Whether the attempt ended by clearing the level rather than by misses.
pub fn cleared(state: &State) -> bool {
    state.missed_notes < state.cfg.miss_limit
}

fn spawn_due_notes(state: &mut State, speed: f32) {
    let travel = travel_time(&state.cfg, speed);
    while state.spawn_cursor < state.chart.patterns.len() {
        let pattern = &state.chart.patterns[state.spawn_cursor];
        let hit_time = state.chart.hit_time(pattern.time);
        let spawn_time = hit_time - travel;
        if spawn_time > state.time {
            break;
        }
        let kind = pattern.kind;
        let lanes = pattern.lanes.clone();
        state.spawn_cursor += 1;
        for &lane in &lanes {
            let id = state.next_note_id;
            state.next_note_id += 1;
            state.notes.push(Note {
                id,
                lane,
                kind,
                hit_time,
                spawn_time,
                y: note_y(&state.cfg, state.time, spawn_time, speed),
                hit: false,
                missed: false,
                rating: None,
            });
        }
    }
}

#[inline(always)]
fn note_y(cfg: &EngineConfig, now: f64, spawn_time: f64, speed: f32) -> f32 {
    cfg.spawn_y + (now - spawn_time) as f32 * speed
}

fn advance_notes(state: &mut State, speed: f32) {
    let now = state.time;
    let cfg = state.cfg;
    for note in &mut state.notes {
        note.y = note_y(&cfg, now, note.spawn_time, speed);
    }
}

fn apply_time_based_misses(state: &mut State, upgrades: &UpgradeLevels) {
    let cutoff = state.cfg.hit_line_y + state.cfg.miss_margin;
    for i in 0..state.notes.len() {
        let past = {
            let n = &state.notes[i];
            !n.hit && !n.missed && n.y > cutoff
        };
        if past {
            resolve_miss(state, i, upgrades);
        }
    }
}

fn resolve_miss(state: &mut State, note_index: usize, upgrades: &UpgradeLevels) {
    let lane = {
        let n = &mut state.notes[note_index];
        n.missed = true;
        n.rating = Some(JudgeGrade::Miss);
        n.lane as usize
    };
    state.missed_notes = state.missed_notes.saturating_add(1);
    state.score.counts.bump(JudgeGrade::Miss);

    // The shield roll is cosmetic-grade randomness, deliberately unseeded.
    let shield = upgrades.shield_chance();
    if shield > 0.0 && rand::random::<f64>() < shield {
        debug!("Combo shield held at {} combo", state.combo.current);
        push_text(state, lane, "SAVED".to_string(), TextKind::Saved, SAVED_TEXT_LIFE_S);
    } else {
        state.combo.reset();
    }
    push_text(
        state,
        lane,
        JudgeGrade::Miss.label().to_string(),
        TextKind::Rating,
        RATING_TEXT_LIFE_S,
    );
}

fn cull_scrolled_out_notes(state: &mut State) {
    // Removal is pure garbage collection: hit, missed and unresolved notes
    // all leave the set once they are past the visible field.
    let bottom = state.cfg.field_height + state.cfg.note_size;
    state.notes.retain(|n| n.y <= bottom);
}

fn pulse_on_beat(state: &mut State) {
    if state.time < 0.0 {
        return;
    }
    let beat = (state.time / state.chart.beat_duration()).floor() as i64;
    if beat > state.last_beat {
        state.last_beat = beat;
        state.beat_pulse = 1.0;
    }
}

/// Ages particles and floating texts, eases the displayed score and decays
/// glow intensities. Runs every tick, paused or not, on every screen that
/// still shows attempt state.
pub fn tick_visual_effects(state: &mut State, dt: f32) {
    state.particles.retain_mut(|p| {
        p.life -= dt;
        if p.life <= 0.0 {
            return false;
        }
        p.x += p.vx * dt;
        p.y += p.vy * dt;
        p.vy += PARTICLE_GRAVITY * dt;
        true
    });

    state.texts.retain_mut(|t| {
        t.life -= dt;
        if t.life <= 0.0 {
            return false;
        }
        t.y -= TEXT_RISE_PER_S * dt;
        true
    });

    let target = state.score.points as f64;
    let diff = target - state.score.display;
    if diff.abs() < DISPLAY_SCORE_SNAP {
        state.score.display = target;
    } else {
        state.score.display += diff * f64::from(dt) * DISPLAY_SCORE_RATE;
    }

    state.beat_pulse = (state.beat_pulse - dt * BEAT_PULSE_DECAY_PER_S).max(0.0);
    for lane in &mut state.lanes {
        lane.hit_effect = (lane.hit_effect - dt * LANE_GLOW_DECAY_PER_S).max(0.0);
    }
}

/// Key-down for a lane. The pressed latch swallows auto-repeat: only the
/// first down of a physical press reaches the judge.
pub fn handle_key_down(state: &mut State, upgrades: &UpgradeLevels, lane: usize) {
    if state.lanes[lane].pressed {
        return;
    }
    state.lanes[lane].pressed = true;
    judge_a_tap(state, upgrades, lane);
}

pub fn handle_key_up(state: &mut State, lane: usize) {
    state.lanes[lane].pressed = false;
}

/// Pointer taps are discrete, so they skip the pressed latch.
pub fn handle_pointer_tap(state: &mut State, upgrades: &UpgradeLevels, x: f32) {
    if let Some(lane) = state.cfg.lane_at_x(x) {
        judge_a_tap(state, upgrades, lane);
    }
}

pub fn toggle_pause(state: &mut State) {
    state.paused = !state.paused;
    info!(
        "{} at t={:.2}",
        if state.paused { "Paused" } else { "Resumed" },
        state.time
    );
}

/// Judges one press on `lane`: the unresolved note nearest the hit line
/// wins, and only notes inside the effective window count at all. A press
/// with no candidate is a whiff and costs nothing.
pub fn judge_a_tap(state: &mut State, upgrades: &UpgradeLevels, lane: usize) -> bool {
    if state.paused {
        return false;
    }
    let window = effective_hit_window(&state.cfg, upgrades);
    let hit_line = state.cfg.hit_line_y;

    let mut best: Option<(usize, f32)> = None;
    for (i, n) in state.notes.iter().enumerate() {
        if n.lane as usize != lane || n.hit || n.missed {
            continue;
        }
        let distance = (n.y - hit_line).abs();
        if distance > window {
            continue;
        }
        if best.is_none_or(|(_, nearest)| distance < nearest) {
            best = Some((i, distance));
        }
    }

    match best {
        Some((note_index, distance)) => {
            resolve_hit(state, upgrades, note_index, distance);
            true
        }
        None => {
            state.lanes[lane].hit_effect = state.lanes[lane].hit_effect.max(WHIFF_GLOW);
            false
        }
    }
}

fn resolve_hit(state: &mut State, upgrades: &UpgradeLevels, note_index: usize, distance: f32) {
    let grade = judgment::classify_distance(
        distance,
        state.cfg.perfect_window,
        state.cfg.great_window,
    );
    let lane = {
        let n = &mut state.notes[note_index];
        n.hit = true;
        n.rating = Some(grade);
        n.lane as usize
    };

    state.score.counts.bump(grade);
    state.combo.advance();

    let base = judgment::grade_base_points(grade);
    let multiplier = upgrades.score_multiplier(grade == JudgeGrade::Perfect);
    let awarded = (base as f64 * state.combo.multiplier * multiplier).floor() as u64;
    state.score.points = state.score.points.saturating_add(awarded);

    trigger_hit_burst(state, lane, grade);
    push_text(
        state,
        lane,
        grade.label().to_string(),
        TextKind::Rating,
        RATING_TEXT_LIFE_S,
    );
    push_text(
        state,
        lane,
        format!("+{awarded}"),
        TextKind::Points,
        POINTS_TEXT_LIFE_S,
    );
    let combo_now = state.combo.current;
    if combo_now.is_multiple_of(COMBO_MILESTONE) {
        push_text(
            state,
            lane,
            format!("{combo_now} COMBO!"),
            TextKind::Milestone,
            MILESTONE_TEXT_LIFE_S,
        );
    }
    state.lanes[lane].hit_effect = 1.0;
    state.beat_pulse = 1.0;

    debug!(
        "Lane {lane} {} at {distance:.1} for +{awarded} (combo {})",
        grade.label(),
        state.combo.current
    );
}

fn trigger_hit_burst(state: &mut State, lane: usize, grade: JudgeGrade) {
    let count = match grade {
        JudgeGrade::Perfect => 16,
        JudgeGrade::Great => 12,
        JudgeGrade::Good => 8,
        JudgeGrade::Miss => 0,
    };
    let x = state.cfg.lane_center_x(lane);
    let y = state.cfg.hit_line_y;
    let tint = LANE_COLORS[lane];
    for _ in 0..count {
        let angle = rand::random::<f32>() * std::f32::consts::TAU;
        let speed = 60.0 + rand::random::<f32>() * 160.0;
        let life = 0.35 + rand::random::<f32>() * 0.3;
        state.particles.push(Particle {
            x,
            y,
            vx: angle.cos() * speed,
            vy: angle.sin() * speed - 80.0,
            life,
            max_life: life,
            tint,
        });
    }
}

fn push_text(state: &mut State, lane: usize, text: String, kind: TextKind, life: f32) {
    let x = state.cfg.lane_center_x(lane);
    let y = state.cfg.hit_line_y - 30.0;
    state.texts.push(FloatingText {
        text,
        kind,
        x,
        y,
        life,
    });
}
