//! Beatfall: a headless rhythm-game core.
//!
//! Levels are procedural; the same level number always yields the same
//! chart, so scores are comparable between sessions. The engine simulates
//! falling notes against a fixed field, judges key presses by distance from
//! the hit line, and pays out a currency that buys permanent upgrades.
//!
//! Core modules:
//! - `engine`: screen state machine, tick and event dispatch
//! - `game`: chart generation, judging, upgrades, profile progression
//! - `snapshot`: per-tick read-only view for a presentation layer
//! - `persist`: save-port trait with file and in-memory stores
//!
//! Nothing here draws or opens a window; a frontend owns the clock and the
//! input source and renders from [`snapshot::Frame`].

pub mod config;
pub mod engine;
pub mod game;
pub mod input;
pub mod persist;
pub mod screens;
pub mod snapshot;

pub use config::EngineConfig;
pub use engine::Engine;
pub use input::{InputEvent, KeySym, MenuCmd};
pub use persist::{FileStore, MemStore, SavePort};
pub use screens::Screen;
pub use snapshot::Frame;
