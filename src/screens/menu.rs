use log::info;

use crate::game::chart::{self, LANE_COUNT, LevelChart};
use crate::game::profile::{Profile, PurchaseOutcome};
use crate::game::upgrades::{self, UpgradeKind};
use crate::input::{InputEvent, KeySym, MenuCmd};
use crate::screens::{Screen, ScreenAction};

const NOTICE_DURATION_S: f32 = 2.5;

/* -------------------------------- state -------------------------------- */

pub struct State {
    /// Currently highlighted level, always within `1..=highest_level`.
    pub selected_level: u32,
    /// Chart preview for the highlighted level, regenerated on selection.
    pub preview: LevelChart,
    /// Lane index currently capturing a new key, if any.
    pub rebind_lane: Option<usize>,
    pub notice: Option<String>,
    notice_t: f32,
    /// Set when the profile changed and should be flushed to disk.
    pub dirty: bool,
}

pub fn init(profile: &Profile) -> State {
    let selected_level = profile.highest_level.max(1);
    State {
        selected_level,
        preview: chart::generate(selected_level),
        rebind_lane: None,
        notice: None,
        notice_t: 0.0,
        dirty: false,
    }
}

pub fn update(state: &mut State, dt: f32) {
    if state.notice.is_some() {
        state.notice_t = (state.notice_t - dt).max(0.0);
        if state.notice_t <= 0.0 {
            state.notice = None;
        }
    }
}

fn show_notice(state: &mut State, text: String) {
    state.notice = Some(text);
    state.notice_t = NOTICE_DURATION_S;
}

fn select_level(state: &mut State, profile: &Profile, level: u32) {
    let clamped = level.clamp(1, profile.highest_level.max(1));
    if clamped != state.selected_level {
        state.selected_level = clamped;
        state.preview = chart::generate(clamped);
    }
}

fn purchase(state: &mut State, profile: &mut Profile, kind: UpgradeKind) {
    let def = upgrades::def(kind);
    match profile.try_purchase(kind) {
        PurchaseOutcome::Purchased { cost } => {
            state.dirty = true;
            info!(
                "Bought {} level {} for {cost}",
                def.name,
                profile.upgrades.get(kind)
            );
            show_notice(
                state,
                format!("{} is now level {}", def.name, profile.upgrades.get(kind)),
            );
        }
        PurchaseOutcome::AtMaxLevel => {
            show_notice(state, format!("{} is already maxed out", def.name));
        }
        PurchaseOutcome::NotEnoughPoints => {
            show_notice(
                state,
                format!(
                    "Need {} points for {}",
                    upgrades::cost_at(kind, profile.upgrades.get(kind)),
                    def.name
                ),
            );
        }
    }
}

/// Feeds one captured key into the armed rebind. Named keys are ignored and
/// the capture stays armed; a char already bound to another lane is rejected.
fn capture_rebind(state: &mut State, profile: &mut Profile, lane: usize, sym: KeySym) {
    let Some(c) = sym.bindable_char() else {
        return;
    };
    let taken = profile
        .keybinds
        .iter()
        .position(|&b| b == c)
        .filter(|&other| other != lane);
    if taken.is_some() {
        show_notice(state, format!("'{c}' is already bound"));
        return;
    }
    profile.keybinds[lane] = c;
    state.rebind_lane = None;
    state.dirty = true;
    info!("Lane {} rebound to '{c}'", lane + 1);
    show_notice(state, format!("Lane {} is now '{c}'", lane + 1));
}

/* -------------------------------- input -------------------------------- */

pub fn handle_input(state: &mut State, profile: &mut Profile, ev: &InputEvent) -> ScreenAction {
    // An armed rebind consumes key presses before normal navigation.
    if let Some(lane) = state.rebind_lane {
        if let InputEvent::KeyDown(sym) = ev {
            if *sym == KeySym::Escape {
                state.rebind_lane = None;
                show_notice(state, "Rebind cancelled".to_string());
            } else {
                capture_rebind(state, profile, lane, *sym);
            }
            return ScreenAction::None;
        }
    }

    match ev {
        InputEvent::KeyDown(KeySym::Left) | InputEvent::Menu(MenuCmd::PrevLevel) => {
            let target = state.selected_level.saturating_sub(1);
            select_level(state, profile, target);
            ScreenAction::None
        }
        InputEvent::KeyDown(KeySym::Right) | InputEvent::Menu(MenuCmd::NextLevel) => {
            let target = state.selected_level.saturating_add(1);
            select_level(state, profile, target);
            ScreenAction::None
        }
        InputEvent::KeyDown(KeySym::Enter) | InputEvent::KeyDown(KeySym::Space) => {
            ScreenAction::Navigate(Screen::Playing)
        }
        InputEvent::KeyDown(KeySym::Escape) => ScreenAction::Exit,
        InputEvent::Menu(MenuCmd::StartSelected) => ScreenAction::Navigate(Screen::Playing),
        InputEvent::Menu(MenuCmd::Purchase(kind)) => {
            purchase(state, profile, *kind);
            ScreenAction::None
        }
        InputEvent::Menu(MenuCmd::RebindLane(lane)) => {
            if *lane < LANE_COUNT {
                state.rebind_lane = Some(*lane);
                show_notice(state, format!("Press a key for lane {}", lane + 1));
            }
            ScreenAction::None
        }
        _ => ScreenAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::upgrades::MAX_UPGRADE_LEVEL;

    fn profile_at_level(highest: u32) -> Profile {
        Profile {
            highest_level: highest,
            ..Profile::default()
        }
    }

    #[test]
    fn selection_clamps_to_the_unlocked_range() {
        let profile = profile_at_level(3);
        let mut state = init(&profile);
        assert_eq!(state.selected_level, 3, "menu opens on the frontier level");

        handle_input(&mut state, &mut profile.clone(), &InputEvent::Menu(MenuCmd::NextLevel));
        assert_eq!(state.selected_level, 3, "cannot select past highest");

        let mut p = profile.clone();
        for _ in 0..5 {
            handle_input(&mut state, &mut p, &InputEvent::KeyDown(KeySym::Left));
        }
        assert_eq!(state.selected_level, 1, "cannot select below level one");
        assert_eq!(state.preview.level, 1, "preview follows the selection");
    }

    #[test]
    fn start_and_escape_produce_the_expected_actions() {
        let mut profile = Profile::default();
        let mut state = init(&profile);
        assert_eq!(
            handle_input(&mut state, &mut profile, &InputEvent::KeyDown(KeySym::Enter)),
            ScreenAction::Navigate(Screen::Playing)
        );
        assert_eq!(
            handle_input(&mut state, &mut profile, &InputEvent::Menu(MenuCmd::StartSelected)),
            ScreenAction::Navigate(Screen::Playing)
        );
        assert_eq!(
            handle_input(&mut state, &mut profile, &InputEvent::KeyDown(KeySym::Escape)),
            ScreenAction::Exit
        );
    }

    #[test]
    fn purchase_outcomes_surface_as_notices() {
        let mut profile = Profile {
            currency: 100,
            ..Profile::default()
        };
        let mut state = init(&profile);

        handle_input(
            &mut state,
            &mut profile,
            &InputEvent::Menu(MenuCmd::Purchase(UpgradeKind::HitWindow)),
        );
        assert_eq!(profile.currency, 0);
        assert_eq!(profile.upgrades.get(UpgradeKind::HitWindow), 1);
        assert!(state.dirty, "successful purchase marks the profile dirty");
        assert!(state.notice.is_some());

        state.dirty = false;
        handle_input(
            &mut state,
            &mut profile,
            &InputEvent::Menu(MenuCmd::Purchase(UpgradeKind::HitWindow)),
        );
        assert_eq!(
            profile.upgrades.get(UpgradeKind::HitWindow),
            1,
            "broke purchase must not apply"
        );
        assert!(!state.dirty, "failed purchase leaves the profile clean");

        profile.upgrades.set(UpgradeKind::ScoreBoost, MAX_UPGRADE_LEVEL);
        profile.currency = u64::MAX;
        handle_input(
            &mut state,
            &mut profile,
            &InputEvent::Menu(MenuCmd::Purchase(UpgradeKind::ScoreBoost)),
        );
        assert_eq!(profile.currency, u64::MAX, "maxed upgrade charges nothing");
    }

    #[test]
    fn notices_expire_after_their_timer() {
        let mut profile = Profile::default();
        let mut state = init(&profile);
        handle_input(
            &mut state,
            &mut profile,
            &InputEvent::Menu(MenuCmd::Purchase(UpgradeKind::HitWindow)),
        );
        assert!(state.notice.is_some());
        update(&mut state, NOTICE_DURATION_S + 0.1);
        assert!(state.notice.is_none(), "notice should expire");
    }

    #[test]
    fn rebind_captures_a_free_char_and_disarms() {
        let mut profile = Profile::default();
        let mut state = init(&profile);

        handle_input(&mut state, &mut profile, &InputEvent::Menu(MenuCmd::RebindLane(0)));
        assert_eq!(state.rebind_lane, Some(0));

        // Named keys are swallowed without disarming.
        handle_input(&mut state, &mut profile, &InputEvent::KeyDown(KeySym::Left));
        assert_eq!(state.rebind_lane, Some(0), "arrow key must not bind");

        handle_input(&mut state, &mut profile, &InputEvent::KeyDown(KeySym::Char('X')));
        assert_eq!(profile.keybinds[0], 'x', "captured chars are lowercased");
        assert_eq!(state.rebind_lane, None);
        assert!(state.dirty);
    }

    #[test]
    fn rebind_rejects_chars_bound_to_other_lanes() {
        let mut profile = Profile::default();
        let mut state = init(&profile);

        handle_input(&mut state, &mut profile, &InputEvent::Menu(MenuCmd::RebindLane(0)));
        handle_input(&mut state, &mut profile, &InputEvent::KeyDown(KeySym::Char('j')));
        assert_eq!(profile.keybinds[0], 'd', "lane three's key must be refused");
        assert_eq!(state.rebind_lane, Some(0), "capture stays armed after refusal");

        // Re-capturing the lane's own key is a no-op bind, not a conflict.
        handle_input(&mut state, &mut profile, &InputEvent::KeyDown(KeySym::Char('d')));
        assert_eq!(profile.keybinds[0], 'd');
        assert_eq!(state.rebind_lane, None);
    }

    #[test]
    fn escape_cancels_an_armed_rebind_instead_of_exiting() {
        let mut profile = Profile::default();
        let mut state = init(&profile);
        handle_input(&mut state, &mut profile, &InputEvent::Menu(MenuCmd::RebindLane(2)));
        let action =
            handle_input(&mut state, &mut profile, &InputEvent::KeyDown(KeySym::Escape));
        assert_eq!(action, ScreenAction::None, "escape must not exit mid-rebind");
        assert_eq!(state.rebind_lane, None);
    }
}
