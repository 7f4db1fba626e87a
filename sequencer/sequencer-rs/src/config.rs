use serde::{Deserialize, Serialize};
use stand_core::{Millis, PinId};

use crate::main_valves::ServoPositions;

/// Everything tunable about the stand. Pressures are filtered readings
/// (ADC counts times the filter scale).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub debounce_ms: Millis,
    /// Half period of blinking status LEDs.
    pub status_blink_ms: Millis,
    /// Power sense trip point in ADC counts.
    pub power_threshold: i16,
    pub power_hysteresis: i16,
    pub ignition: IgnitionConfig,
    pub sequence: SequenceConfig,
    pub pressure: PressureConfig,
    pub valves: ValveConfig,
    pub pins: PinMap,
}

/// Igniter timing, shared by the ignition test and the main sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnitionConfig {
    pub spark_period_ms: Millis,
    pub spark_start_ms: Millis,
    pub ipa_start_ms: Millis,
    pub n2o_start_ms: Millis,
    /// Time from spark to ignition before giving up.
    pub pressure_timeout_ms: Millis,
    /// Spark keeps running this long after pressure comes up.
    pub spark_continue_ms: Millis,
    /// Flame-out is ignored this long after pressure comes up.
    pub pressure_grace_ms: Millis,
    pub run_time_ms: Millis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub crack_ms: Millis,
    pub stable_spark_ms: Millis,
    pub stable_no_spark_ms: Millis,
    pub main_ipa_open_ms: Millis,
    pub main_n2o_open_ms: Millis,
    pub main_stable_ms: Millis,
    pub main_pressure_timeout_ms: Millis,
    pub ig_n2o_close_ms: Millis,
    pub main_run_time_ms: Millis,
    pub report_pulse_ms: Millis,
    /// Fault if the chamber does not light with the valves partly open.
    /// Otherwise the sequence goes to full open regardless.
    pub abort_on_no_main: bool,
    /// Fault if igniter pressure falls below chamber pressure at full open.
    pub ig_below_main_abort: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureConfig {
    /// Readings above this mean a broken or disconnected sensor.
    pub sane_max: u32,
    pub min: u32,
    pub max: u32,
    pub max_idle: u32,
    pub good: u32,
    pub main_good: u32,
    pub ig_zero: u32,
    pub main_zero: u32,
    /// How far igniter pressure may sit below chamber pressure.
    pub delta_allowed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValveConfig {
    pub ipa: ServoPositions,
    pub n2o: ServoPositions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinMap {
    pub joystick: PinId,
    pub ig_pressure: PinId,
    pub main_press: PinId,
    pub power_sense: PinId,
    pub push_1: PinId,
    pub push_2: PinId,
    pub safe_igniter: PinId,
    pub safe_main: PinId,
    pub cmd_1: PinId,
    pub cmd_2: PinId,
    pub ipa_ig_valve: PinId,
    pub n2o_ig_valve: PinId,
    pub green_led: PinId,
    pub amber_led: PinId,
    pub red_led: PinId,
    pub power_led: PinId,
    pub spark: PinId,
    pub daq_0: PinId,
    pub daq_1: PinId,
    pub test_led: PinId,
    pub ipa_servo: PinId,
    pub n2o_servo: PinId,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 25,
            status_blink_ms: 250,
            power_threshold: 840,
            power_hysteresis: 8,
            ignition: IgnitionConfig::default(),
            sequence: SequenceConfig::default(),
            pressure: PressureConfig::default(),
            valves: ValveConfig::default(),
            pins: PinMap::default(),
        }
    }
}

impl Default for IgnitionConfig {
    fn default() -> Self {
        Self {
            spark_period_ms: 25,
            spark_start_ms: 0,
            ipa_start_ms: 0,
            n2o_start_ms: 200,
            pressure_timeout_ms: 500,
            spark_continue_ms: 80,
            pressure_grace_ms: 120,
            run_time_ms: 1200,
        }
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            crack_ms: 0,
            stable_spark_ms: 80,
            stable_no_spark_ms: 40,
            main_ipa_open_ms: 0,
            main_n2o_open_ms: 50,
            main_stable_ms: 20,
            main_pressure_timeout_ms: 550,
            ig_n2o_close_ms: 50,
            main_run_time_ms: 8000,
            report_pulse_ms: 10,
            abort_on_no_main: false,
            ig_below_main_abort: true,
        }
    }
}

impl Default for PressureConfig {
    // 500 PSI transducers, 0.5 V at zero, about 6.5 filtered counts per PSI.
    fn default() -> Self {
        Self {
            sane_max: 4000,
            min: 360,
            max: 3031,
            max_idle: 500,
            good: 737,
            main_good: 638,
            ig_zero: 409,
            main_zero: 409,
            delta_allowed: 35,
        }
    }
}

impl Default for ValveConfig {
    fn default() -> Self {
        Self {
            ipa: ServoPositions::from_closed(44, 43),
            n2o: ServoPositions::from_closed(20, 47),
        }
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            joystick: PinId(3),
            ig_pressure: PinId(2),
            main_press: PinId(1),
            power_sense: PinId(5),
            push_1: PinId(24),
            push_2: PinId(25),
            safe_igniter: PinId(22),
            safe_main: PinId(23),
            cmd_1: PinId(28),
            cmd_2: PinId(29),
            ipa_ig_valve: PinId(3),
            n2o_ig_valve: PinId(4),
            green_led: PinId(15),
            amber_led: PinId(17),
            red_led: PinId(16),
            power_led: PinId(14),
            spark: PinId(9),
            daq_0: PinId(11),
            daq_1: PinId(10),
            test_led: PinId(12),
            ipa_servo: PinId(6),
            n2o_servo: PinId(5),
        }
    }
}
