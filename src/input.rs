use crate::game::chart::LANE_COUNT;
use crate::game::upgrades::UpgradeKind;

/// A key as the host reports it. Lane binds are single printable characters
/// and matched case-insensitively; the named keys are reserved for
/// navigation and can never be bound to a lane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeySym {
    Char(char),
    Enter,
    Space,
    Escape,
    Left,
    Right,
}

impl KeySym {
    /// The lowercased character this key would bind as, if it is bindable.
    pub fn bindable_char(self) -> Option<char> {
        match self {
            KeySym::Char(c) if c.is_ascii_graphic() => Some(c.to_ascii_lowercase()),
            _ => None,
        }
    }
}

/// Discrete events the host feeds into the engine. Raw keys are resolved
/// against the binding table here in the core; menu commands arrive already
/// hit-tested by the presentation layer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InputEvent {
    KeyDown(KeySym),
    KeyUp(KeySym),
    PointerClick { x: f32, y: f32 },
    Menu(MenuCmd),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MenuCmd {
    PrevLevel,
    NextLevel,
    StartSelected,
    Purchase(UpgradeKind),
    RebindLane(usize),
    Continue,
}

/// Resolves a key against the lane binds, case-insensitively.
pub fn lane_for_key(binds: &[char; LANE_COUNT], sym: KeySym) -> Option<usize> {
    let KeySym::Char(c) = sym else {
        return None;
    };
    let c = c.to_ascii_lowercase();
    binds.iter().position(|&b| b == c)
}
