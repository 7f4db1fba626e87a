use core::any::Any;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter, EnumString, IntoStaticStr};

use crate::{event_log::EventStore, Millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinId(pub u8);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
    EnumCountMacro, EnumIter, EnumString, IntoStaticStr, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Defer to the input's normal mode.
    #[default]
    #[strum(serialize = "def_in")]
    #[serde(rename = "def_in")]
    Default,
    ForceOn,
    ForceOff,
    ActiveLowIn,
    ActiveHighIn,
    ActiveLowPullup,
    ActiveHighPullup,
    MultiInput,
}

impl InputMode {
    pub fn is_pullup(self) -> bool {
        matches!(self, InputMode::ActiveLowPullup | InputMode::ActiveHighPullup)
    }

    pub fn is_active_low(self) -> bool {
        matches!(self, InputMode::ActiveLowIn | InputMode::ActiveLowPullup)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
    EnumCountMacro, EnumIter, EnumString, IntoStaticStr, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Defer to the output's normal mode.
    #[default]
    #[strum(serialize = "def_out")]
    #[serde(rename = "def_out")]
    Default,
    #[strum(serialize = "active_low_out")]
    #[serde(rename = "active_low_out")]
    ActiveLow,
    #[strum(serialize = "active_high_out")]
    #[serde(rename = "active_high_out")]
    ActiveHigh,
    ForceLow,
    ForceHigh,
    Servo,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
    EnumCountMacro, EnumIter, EnumString, IntoStaticStr, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OutputState {
    On,
    #[default]
    Off,
    SingleOn,
    SingleOff,
    PulseOn,
    PulseOff,
    Pwm,
    ServoControlled,
}

impl OutputState {
    /// Whether the logical state asks for the active level right now.
    pub fn is_on(self) -> bool {
        matches!(self, OutputState::On | OutputState::SingleOn | OutputState::PulseOn)
    }

    pub fn is_periodic(self) -> bool {
        matches!(self, OutputState::PulseOn | OutputState::PulseOff)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
    EnumIter, IntoStaticStr, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    #[default]
    None,
    Rising,
    Falling,
}

/// Board support seam. One implementation per target, plus the mock and the
/// simulated plant.
pub trait StandDriver {
    fn millis(&self) -> Millis;

    fn configure_input(&mut self, pin: PinId, pullup: bool);
    fn configure_output(&mut self, pin: PinId);

    fn digital_read(&mut self, pin: PinId) -> bool;
    fn analog_read(&mut self, pin: PinId) -> u16;
    fn digital_write(&mut self, pin: PinId, high: bool);

    fn servo_write(&mut self, pin: PinId, degrees: u8);
    fn servo_detach(&mut self, pin: PinId);

    fn event_store(&mut self) -> &mut dyn EventStore;

    fn as_mut_any(&mut self) -> &mut dyn Any;
}
