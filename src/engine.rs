//! Headless engine: owns the screen state machine, the profile and the save
//! port, and turns ticks plus input events into screen transitions. A
//! frontend drives it with `tick`/`handle_event` and draws from `snapshot`.

use std::error::Error;
use std::fmt;

use log::{debug, info, warn};

use crate::config::EngineConfig;
use crate::game::gameplay;
use crate::game::profile::Profile;
use crate::input::{self, InputEvent, KeySym};
use crate::persist::SavePort;
use crate::screens::{Screen, ScreenAction, menu, results};
use crate::snapshot::{Frame, MenuView, PlayView, ResultsView};

/// Longest simulation step one tick may take. Anything larger (debugger
/// stalls, suspended laptops) is clamped so notes never teleport.
pub const MAX_TICK_DELTA_S: f32 = 0.1;

pub struct Engine {
    cfg: EngineConfig,
    screen: Screen,
    menu: menu::State,
    play: Option<gameplay::State>,
    results: Option<results::State>,
    profile: Profile,
    store: Box<dyn SavePort>,
    stopped: bool,
}

/// Failure of a user-initiated save import. Normal loads never raise this;
/// they fall back to a fresh profile instead.
#[derive(Debug)]
pub enum ImportError {
    Parse(serde_json::Error),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Parse(e) => write!(f, "save blob did not parse: {e}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ImportError::Parse(e) => Some(e),
        }
    }
}

impl Engine {
    pub fn new(cfg: EngineConfig, store: Box<dyn SavePort>) -> Self {
        let profile = match store.load() {
            Some(blob) => Profile::from_blob(&blob),
            None => {
                info!("No saved progress, starting a fresh profile");
                Profile::default()
            }
        };
        let menu = menu::init(&profile);
        Self {
            cfg: cfg.sanitized(),
            screen: Screen::Menu,
            menu,
            play: None,
            results: None,
            profile,
            store,
            stopped: false,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Advances the simulation by `raw_dt` seconds, clamped to
    /// [`MAX_TICK_DELTA_S`].
    pub fn tick(&mut self, raw_dt: f32) {
        if self.stopped {
            return;
        }
        let dt = raw_dt.clamp(0.0, MAX_TICK_DELTA_S);

        let action = match self.screen {
            Screen::Menu => {
                menu::update(&mut self.menu, dt);
                ScreenAction::None
            }
            Screen::Playing => match &mut self.play {
                Some(gs) => gameplay::update(gs, &self.profile.upgrades, dt),
                None => ScreenAction::None,
            },
            Screen::Results => {
                // The attempt state stays alive behind the tally so its
                // particles and texts keep aging out.
                if let Some(gs) = &mut self.play {
                    gameplay::tick_visual_effects(gs, dt);
                }
                if let Some(rs) = &mut self.results {
                    results::update(rs, dt);
                }
                ScreenAction::None
            }
        };
        self.handle_action(action);
    }

    pub fn handle_event(&mut self, ev: &InputEvent) {
        if self.stopped {
            return;
        }
        let action = match self.screen {
            Screen::Menu => {
                let action = menu::handle_input(&mut self.menu, &mut self.profile, ev);
                self.flush_menu_changes();
                action
            }
            Screen::Playing => self.route_play_event(ev),
            Screen::Results => match &self.results {
                Some(rs) => results::handle_input(rs, ev),
                None => ScreenAction::None,
            },
        };
        self.handle_action(action);
    }

    fn route_play_event(&mut self, ev: &InputEvent) -> ScreenAction {
        let Some(gs) = &mut self.play else {
            return ScreenAction::None;
        };
        match ev {
            InputEvent::KeyDown(KeySym::Escape) => gameplay::toggle_pause(gs),
            InputEvent::KeyDown(sym) => {
                if let Some(lane) = input::lane_for_key(&self.profile.keybinds, *sym) {
                    gameplay::handle_key_down(gs, &self.profile.upgrades, lane);
                }
            }
            InputEvent::KeyUp(sym) => {
                if let Some(lane) = input::lane_for_key(&self.profile.keybinds, *sym) {
                    gameplay::handle_key_up(gs, lane);
                }
            }
            InputEvent::PointerClick { x, .. } => {
                gameplay::handle_pointer_tap(gs, &self.profile.upgrades, *x);
            }
            InputEvent::Menu(_) => {}
        }
        ScreenAction::None
    }

    fn handle_action(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::None => {}
            ScreenAction::Exit => self.stop(),
            ScreenAction::Navigate(to) => match (self.screen, to) {
                (Screen::Menu, Screen::Playing) => {
                    self.start_attempt(self.menu.selected_level);
                }
                (Screen::Playing, Screen::Results) => self.finalize_attempt(),
                (_, Screen::Menu) => self.return_to_menu(),
                (from, to) => debug!("Ignoring navigation {from:?} -> {to:?}"),
            },
        }
    }

    /// Starts an attempt at `level`, clamped to the unlocked range. Public
    /// so shells can jump straight into a level.
    pub fn start_level(&mut self, level: u32) {
        if self.stopped {
            return;
        }
        self.start_attempt(level);
    }

    fn start_attempt(&mut self, level: u32) {
        let level = level.clamp(1, self.profile.highest_level.max(1));
        self.play = Some(gameplay::init(self.cfg, level));
        self.results = None;
        self.screen = Screen::Playing;
    }

    fn finalize_attempt(&mut self) {
        let Some(gs) = &self.play else {
            self.screen = Screen::Menu;
            return;
        };
        let cleared = gameplay::cleared(gs);
        let counts = gs.score.counts;
        let summary =
            self.profile
                .apply_finish(gs.chart.level, gs.score.points, gs.combo.max);
        info!(
            "Attempt summary: level {}, score {}, reward {}, unlocked {:?}",
            summary.level, summary.score, summary.reward, summary.unlocked
        );
        self.results = Some(results::init(summary, counts, cleared));
        self.screen = Screen::Results;
        self.save_profile();
    }

    fn return_to_menu(&mut self) {
        self.play = None;
        self.results = None;
        self.menu = menu::init(&self.profile);
        self.screen = Screen::Menu;
    }

    fn flush_menu_changes(&mut self) {
        if self.menu.dirty {
            self.menu.dirty = false;
            self.save_profile();
        }
    }

    /// Best-effort persistence: a failed write is logged and the session
    /// keeps running on the in-memory profile.
    fn save_profile(&mut self) {
        match self.profile.to_blob() {
            Ok(blob) => {
                if let Err(e) = self.store.save(&blob) {
                    warn!("Could not write save: {e}");
                }
            }
            Err(e) => warn!("Could not encode save: {e}"),
        }
    }

    /// Flushes the profile and refuses further ticks and events. Safe to
    /// call more than once.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.save_profile();
        self.stopped = true;
        info!("Engine stopped");
    }

    /// The profile as a portable blob, for user-driven backup.
    pub fn export_save(&self) -> Result<String, serde_json::Error> {
        self.profile.to_blob()
    }

    /// Replaces the profile from an exported blob. On failure the current
    /// profile is left untouched.
    pub fn import_save(&mut self, blob: &str) -> Result<(), ImportError> {
        let profile = Profile::parse_blob(blob).map_err(ImportError::Parse)?;
        self.profile = profile;
        self.menu = menu::init(&self.profile);
        self.save_profile();
        info!(
            "Imported profile: highest level {}, {} points",
            self.profile.highest_level, self.profile.currency
        );
        Ok(())
    }

    /// The presentation snapshot for the current tick.
    pub fn snapshot(&self) -> Frame<'_> {
        Frame {
            screen: self.screen,
            currency: self.profile.currency,
            highest_level: self.profile.highest_level,
            upgrades: &self.profile.upgrades,
            keybinds: &self.profile.keybinds,
            config: &self.cfg,
            menu: (self.screen == Screen::Menu)
                .then(|| MenuView::capture(&self.menu, &self.profile)),
            play: self
                .play
                .as_ref()
                .map(|gs| PlayView::capture(gs, &self.profile.upgrades)),
            results: self.results.as_ref().map(ResultsView::capture),
        }
    }
}
