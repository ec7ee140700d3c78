use crate::game::judgment::RatingCounts;
use crate::game::profile::FinishSummary;
use crate::input::{InputEvent, KeySym, MenuCmd};
use crate::screens::{Screen, ScreenAction};

const REVEAL_DURATION_S: f32 = 0.6;

/* -------------------------------- state -------------------------------- */

pub struct State {
    pub summary: FinishSummary,
    pub counts: RatingCounts,
    /// False when the attempt ended at the miss limit.
    pub cleared: bool,
    /// 0..1 roll-in progress for the tally presentation.
    pub reveal: f32,
}

pub fn init(summary: FinishSummary, counts: RatingCounts, cleared: bool) -> State {
    State {
        summary,
        counts,
        cleared,
        reveal: 0.0,
    }
}

pub fn update(state: &mut State, dt: f32) {
    state.reveal = (state.reveal + dt / REVEAL_DURATION_S).min(1.0);
}

pub fn handle_input(_state: &State, ev: &InputEvent) -> ScreenAction {
    match ev {
        InputEvent::KeyDown(KeySym::Enter)
        | InputEvent::KeyDown(KeySym::Space)
        | InputEvent::KeyDown(KeySym::Escape)
        | InputEvent::PointerClick { .. }
        | InputEvent::Menu(MenuCmd::Continue) => ScreenAction::Navigate(Screen::Menu),
        _ => ScreenAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> FinishSummary {
        FinishSummary {
            level: 2,
            score: 4_200,
            max_combo: 31,
            reward: 420,
            new_high_score: true,
            new_best_combo: false,
            unlocked: Some(3),
        }
    }

    #[test]
    fn reveal_rolls_in_and_saturates() {
        let mut state = init(summary(), RatingCounts::default(), true);
        assert_eq!(state.reveal, 0.0);
        update(&mut state, 0.3);
        assert!(state.reveal > 0.0 && state.reveal < 1.0);
        update(&mut state, 10.0);
        assert_eq!(state.reveal, 1.0);
    }

    #[test]
    fn any_confirm_returns_to_the_menu() {
        let state = init(summary(), RatingCounts::default(), false);
        for ev in [
            InputEvent::KeyDown(KeySym::Enter),
            InputEvent::KeyDown(KeySym::Space),
            InputEvent::KeyDown(KeySym::Escape),
            InputEvent::PointerClick { x: 10.0, y: 10.0 },
            InputEvent::Menu(MenuCmd::Continue),
        ] {
            assert_eq!(handle_input(&state, &ev), ScreenAction::Navigate(Screen::Menu));
        }
        assert_eq!(
            handle_input(&state, &InputEvent::KeyDown(KeySym::Char('d'))),
            ScreenAction::None,
            "lane keys do nothing on the tally"
        );
    }
}
