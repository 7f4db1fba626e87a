use strum::EnumCount;
use strum_macros::{EnumCount as EnumCountMacro, EnumIter, IntoStaticStr};

use stand_core::{
    input::FILTER_SCALE, Input, InputMode, IoRegistry, Output, OutputMode, OutputState,
};

use crate::{config::SequencerConfig, joystick::JOYSTICK_LADDER};

pub const LADDERS: &[&[u16]] = &[&JOYSTICK_LADDER];

pub const JOYSTICK_LADDER_INDEX: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumCountMacro, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum InputId {
    Joystick,
    IgPressure,
    #[strum(serialize = "push_1")]
    Push1,
    #[strum(serialize = "push_2")]
    Push2,
    SafeIgniter,
    SafeMain,
    #[strum(serialize = "cmd_1")]
    Cmd1,
    #[strum(serialize = "cmd_2")]
    Cmd2,
    PowerSense,
    MainPress,
}

impl InputId {
    pub fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumCountMacro, EnumIter, IntoStaticStr)]
pub enum OutputId {
    #[strum(serialize = "IPA_Ig_Valve")]
    IpaIgValve,
    #[strum(serialize = "N2O_Ig_Valve")]
    N2oIgValve,
    #[strum(serialize = "GREEN_LED")]
    GreenLed,
    #[strum(serialize = "AMBER_LED")]
    AmberLed,
    #[strum(serialize = "RED_LED")]
    RedLed,
    #[strum(serialize = "Power_LED")]
    PowerLed,
    #[strum(serialize = "Spark")]
    Spark,
    #[strum(serialize = "DAQ_0")]
    Daq0,
    #[strum(serialize = "DAQ_1")]
    Daq1,
    #[strum(serialize = "TESTLED")]
    TestLed,
}

impl OutputId {
    pub fn index(&self) -> usize {
        *self as usize
    }
}

pub type StandIo = IoRegistry<{ InputId::COUNT }, { OutputId::COUNT }>;

fn counts(filtered: u32) -> i16 {
    (filtered / FILTER_SCALE).min(i16::MAX as u32) as i16
}

/// Builds the stand's I/O tables. Entries are in `InputId` / `OutputId` order.
pub fn build(config: &SequencerConfig) -> StandIo {
    let pins = &config.pins;
    let pressure = &config.pressure;

    let inputs = [
        Input::ladder("joystick", pins.joystick, JOYSTICK_LADDER_INDEX),
        Input::analog(
            "ig_pressure",
            pins.ig_pressure,
            InputMode::ActiveHighIn,
            counts(pressure.good),
            1,
        ),
        Input::digital("push_1", pins.push_1, InputMode::ActiveLowPullup),
        Input::digital("push_2", pins.push_2, InputMode::ActiveLowPullup),
        // True when safed.
        Input::digital("safe_igniter", pins.safe_igniter, InputMode::ActiveHighPullup),
        Input::digital("safe_main", pins.safe_main, InputMode::ActiveHighPullup),
        Input::digital("cmd_1", pins.cmd_1, InputMode::ActiveLowIn),
        Input::digital("cmd_2", pins.cmd_2, InputMode::ActiveLowIn),
        Input::analog(
            "power_sense",
            pins.power_sense,
            InputMode::ActiveHighIn,
            config.power_threshold,
            config.power_hysteresis,
        ),
        Input::analog(
            "main_press",
            pins.main_press,
            InputMode::ActiveHighIn,
            counts(pressure.main_good),
            1,
        ),
    ];

    let blink = config.status_blink_ms;
    let report_pulse = config.sequence.report_pulse_ms;
    let outputs = [
        Output::new("IPA_Ig_Valve", pins.ipa_ig_valve, OutputMode::ActiveHigh),
        Output::new("N2O_Ig_Valve", pins.n2o_ig_valve, OutputMode::ActiveHigh),
        Output::pulsed("GREEN_LED", pins.green_led, OutputMode::ActiveHigh, blink),
        Output::pulsed("AMBER_LED", pins.amber_led, OutputMode::ActiveHigh, blink),
        Output::pulsed("RED_LED", pins.red_led, OutputMode::ActiveHigh, blink).starting(OutputState::On),
        Output::new("Power_LED", pins.power_led, OutputMode::ActiveHigh),
        Output::new("Spark", pins.spark, OutputMode::ActiveHigh),
        Output::pulsed("DAQ_0", pins.daq_0, OutputMode::ActiveHigh, report_pulse),
        Output::pulsed("DAQ_1", pins.daq_1, OutputMode::ActiveHigh, report_pulse),
        Output::new("TESTLED", pins.test_led, OutputMode::ActiveHigh),
    ];

    IoRegistry::new(inputs, outputs, LADDERS, config.debounce_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stand_core::PinId;
    use strum::IntoEnumIterator;

    #[test]
    fn test_table_order_matches_ids() {
        let io = build(&SequencerConfig::default());

        for id in InputId::iter() {
            let name: &'static str = id.into();
            assert_eq!(io.input(id.index()).name, name);
        }
        for id in OutputId::iter() {
            let name: &'static str = id.into();
            assert_eq!(io.output(id.index()).name, name);
        }
    }

    #[test]
    fn test_default_table_is_valid() {
        assert_eq!(build(&SequencerConfig::default()).validate(), Ok(()));
    }

    #[test]
    fn test_remapped_pins_are_validated() {
        let mut config = SequencerConfig::default();
        config.pins.cmd_1 = PinId(9);

        assert!(build(&config).validate().is_err());
    }
}
