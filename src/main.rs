use std::error::Error;

use log::warn;

use beatfall::game::chart::LANE_COUNT;
use beatfall::{
    Engine, EngineConfig, FileStore, InputEvent, KeySym, MemStore, MenuCmd, SavePort, Screen,
};

const CONFIG_FILE: &str = "beatfall.json";
const TICK_S: f32 = 1.0 / 120.0;
/// Autoplay presses once a note is this close to the hit line.
const AUTOPLAY_TOLERANCE: f32 = 10.0;
/// One minute of simulated play, far past any single attempt.
const MAX_TICKS: u32 = 60 * 120;

/// Headless demo shell: boots the engine, autoplays one attempt at the
/// highest unlocked level and prints the tally. Real frontends replace this
/// loop with their own clock, input source and renderer.
fn main() -> Result<(), Box<dyn Error>> {
    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    // Startup default when config is missing or malformed.
    log::set_max_level(log::LevelFilter::Warn);

    let cfg = EngineConfig::load_or_default(CONFIG_FILE);
    log::set_max_level(cfg.log_level.as_level_filter());

    let store: Box<dyn SavePort> = match FileStore::at_default_location() {
        Some(files) => Box::new(files),
        None => {
            warn!("No platform data directory, progress will not persist");
            Box::new(MemStore::new())
        }
    };

    let mut engine = Engine::new(cfg, store);
    engine.handle_event(&InputEvent::Menu(MenuCmd::StartSelected));

    let mut pressed = [false; LANE_COUNT];
    for _ in 0..MAX_TICKS {
        engine.tick(TICK_S);
        match engine.screen() {
            Screen::Playing => {
                let wants = lanes_wanting_a_press(&engine);
                let binds = engine.profile().keybinds;
                for lane in 0..LANE_COUNT {
                    if wants[lane] && !pressed[lane] {
                        engine.handle_event(&InputEvent::KeyDown(KeySym::Char(binds[lane])));
                        pressed[lane] = true;
                    } else if !wants[lane] && pressed[lane] {
                        engine.handle_event(&InputEvent::KeyUp(KeySym::Char(binds[lane])));
                        pressed[lane] = false;
                    }
                }
            }
            Screen::Results => break,
            Screen::Menu => {}
        }
    }

    if let Some(results) = engine.snapshot().results {
        let s = results.summary;
        println!(
            "Level {}: score {}, max combo {}, reward {}{}",
            s.level,
            s.score,
            s.max_combo,
            s.reward,
            if results.cleared { "" } else { " (failed)" }
        );
        println!(
            "Perfect {} / Great {} / Good {} / Miss {}",
            results.counts.perfect, results.counts.great, results.counts.good, results.counts.miss
        );
        if let Some(next) = s.unlocked {
            println!("Unlocked level {next}");
        }
        engine.handle_event(&InputEvent::Menu(MenuCmd::Continue));
    }

    engine.stop();
    Ok(())
}

/// Which lanes have a live note inside the autoplay tolerance right now.
fn lanes_wanting_a_press(engine: &Engine) -> [bool; LANE_COUNT] {
    let mut wants = [false; LANE_COUNT];
    if let Some(play) = engine.snapshot().play {
        for note in play.notes {
            if note.hit || note.missed {
                continue;
            }
            if (note.y - play.hit_line_y).abs() <= AUTOPLAY_TOLERANCE {
                wants[note.lane as usize] = true;
            }
        }
    }
    wants
}
