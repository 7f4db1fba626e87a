#![allow(dead_code)]

use sequencer_rs::{Sequencer, StandState};
use stand_core::{stand_mock::StandDriverMock, PinId};

pub const JOYSTICK: PinId = PinId(3);
pub const IG_PRESSURE: PinId = PinId(2);
pub const MAIN_PRESS: PinId = PinId(1);
pub const POWER_SENSE: PinId = PinId(5);
pub const PUSH_1: PinId = PinId(24);
pub const PUSH_2: PinId = PinId(25);
pub const SAFE_IGNITER: PinId = PinId(22);
pub const SAFE_MAIN: PinId = PinId(23);
pub const CMD_1: PinId = PinId(28);
pub const CMD_2: PinId = PinId(29);

pub const IPA_IG_VALVE: PinId = PinId(3);
pub const N2O_IG_VALVE: PinId = PinId(4);
pub const GREEN_LED: PinId = PinId(15);
pub const RED_LED: PinId = PinId(16);
pub const POWER_LED: PinId = PinId(14);
pub const SPARK: PinId = PinId(9);
pub const DAQ_0: PinId = PinId(11);
pub const DAQ_1: PinId = PinId(10);
pub const IPA_SERVO: PinId = PinId(6);
pub const N2O_SERVO: PinId = PinId(5);

/// Joystick ladder readings.
pub const STICK_IDLE: u16 = 1023;
pub const STICK_PRESS: u16 = 100;
pub const STICK_UP: u16 = 300;
pub const STICK_DOWN: u16 = 500;

/// Raw sensor reading at zero gauge pressure.
pub const PRESSURE_ZERO: u16 = 103;
/// Raw sensor reading comfortably above good pressure.
pub const PRESSURE_FIRING: u16 = 250;
pub const POWER_ON: u16 = 1000;

/// Longer than the debounce window.
pub const HOLD_MS: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arming {
    /// Igniter armed, main valves safed.
    Igniter,
    /// Both safe switches armed.
    Both,
}

pub fn mock<'s>(seq: &'s mut Sequencer) -> &'s mut StandDriverMock {
    seq.driver
        .as_mut_any()
        .downcast_mut::<StandDriverMock>()
        .unwrap()
}

pub fn fixture_driver(arming: Arming) -> StandDriverMock {
    let mut driver = StandDriverMock::new();

    driver.set_analog(JOYSTICK, STICK_IDLE);
    driver.set_analog(IG_PRESSURE, PRESSURE_ZERO);
    driver.set_analog(MAIN_PRESS, PRESSURE_ZERO);
    driver.set_analog(POWER_SENSE, POWER_ON);

    for pin in [PUSH_1, PUSH_2, CMD_1, CMD_2] {
        driver.set_digital(pin, true);
    }
    driver.set_digital(SAFE_IGNITER, false);
    driver.set_digital(SAFE_MAIN, arming == Arming::Igniter);

    driver
}

/// One loop iteration, one millisecond later.
pub fn step(seq: &mut Sequencer) -> Option<StandState> {
    mock(seq).advance(1);
    seq.update().unwrap()
}

pub fn run_for(seq: &mut Sequencer, ms: u32) {
    for _ in 0..ms {
        step(seq);
    }
}

/// Steps until `state` is entered, returning the number of iterations.
pub fn run_until(seq: &mut Sequencer, state: StandState, max_ms: u32) -> u32 {
    for ms in 1..=max_ms {
        step(seq);
        if seq.state() == state {
            return ms;
        }
    }

    panic!("{} not reached within {} ms, stuck in {}", state, max_ms, seq.state());
}

/// Boots, lets the filters settle and leaves the stand idle in the menu.
pub fn settle(seq: &mut Sequencer) {
    run_for(seq, 200);
    assert_eq!(seq.state(), StandState::Menu);
}

pub fn hold_stick(seq: &mut Sequencer, reading: u16) {
    mock(seq).set_analog(JOYSTICK, reading);
    run_for(seq, HOLD_MS);
    mock(seq).set_analog(JOYSTICK, STICK_IDLE);
    run_for(seq, HOLD_MS);
}

/// Holds an active-low button or command line for a while, then lets go.
pub fn press(seq: &mut Sequencer, pin: PinId) {
    mock(seq).set_digital(pin, false);
    run_for(seq, HOLD_MS);
    mock(seq).set_digital(pin, true);
    run_for(seq, HOLD_MS);
}

/// Moves the menu cursor down `steps` times and activates the entry.
pub fn select(seq: &mut Sequencer, steps: usize) {
    for _ in 0..steps {
        hold_stick(seq, STICK_DOWN);
    }
    hold_stick(seq, STICK_PRESS);
}

pub fn level(seq: &mut Sequencer, pin: PinId) -> bool {
    mock(seq).pin_level(pin).unwrap_or(false)
}
