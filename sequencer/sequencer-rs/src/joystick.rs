use serde::{Deserialize, Serialize};
use strum_macros::{Display, IntoStaticStr};

/// Ladder for the five-way joystick on the display board. The stick rests
/// at the top of the ladder.
pub const JOYSTICK_LADDER: [u16; 6] = [60, 250, 450, 650, 850, 1000];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, IntoStaticStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Joystick {
    #[default]
    None,
    Press,
    Up,
    Down,
    Left,
    Right,
}

impl Joystick {
    pub fn from_level(level: u8) -> Self {
        match level {
            2 => Joystick::Press,
            3 => Joystick::Up,
            4 => Joystick::Down,
            5 => Joystick::Left,
            6 => Joystick::Right,
            _ => Joystick::None,
        }
    }
}
