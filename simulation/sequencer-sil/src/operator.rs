use log::info;
use sequencer_rs::config::PinMap;
use stand_core::{stand_mock::StandDriverMock, Millis, PinId};

use crate::config::{Scenario, TestKind};

/// Joystick readings inside each ladder band.
const STICK_IDLE: u16 = 1023;
const STICK_PRESS: u16 = 100;
const STICK_DOWN: u16 = 500;
/// Comfortably past the debounce window.
const STICK_HOLD_MS: Millis = 60;

const POWER_ON: u16 = 1000;
const POWER_OFF: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Stick(u16),
    Digital(PinId, bool),
    Analog(PinId, u16),
}

/// Scripted operator and test cell: safe switches, menu navigation, the go
/// command and an optional power cut.
pub struct Operator {
    pins: PinMap,
    test: TestKind,
    script: Vec<(Millis, Action)>,
    next: usize,
}

impl Operator {
    pub fn new(scenario: &Scenario, pins: &PinMap) -> Self {
        let mut script = Vec::new();

        let mut t = scenario.select_at_ms;
        for _ in 0..scenario.test.menu_steps() {
            script.push((t, Action::Stick(STICK_DOWN)));
            script.push((t + STICK_HOLD_MS, Action::Stick(STICK_IDLE)));
            t += 2 * STICK_HOLD_MS;
        }
        script.push((t, Action::Stick(STICK_PRESS)));
        script.push((t + STICK_HOLD_MS, Action::Stick(STICK_IDLE)));

        let go = match scenario.test {
            TestKind::IgnitionLocal => pins.push_1,
            TestKind::IgnitionRemote => pins.cmd_1,
            TestKind::MainSequence => pins.cmd_2,
        };
        script.push((scenario.fire_at_ms, Action::Digital(go, false)));
        script.push((scenario.fire_at_ms + scenario.fire_hold_ms, Action::Digital(go, true)));

        if let Some(t) = scenario.power_loss_at_ms {
            script.push((t, Action::Analog(pins.power_sense, POWER_OFF)));
        }

        script.sort_by_key(|(t, _)| *t);

        Self {
            pins: pins.clone(),
            test: scenario.test,
            script,
            next: 0,
        }
    }

    /// Idle levels before the controller boots: buttons released, power on,
    /// safe switches armed for the chosen test.
    pub fn prepare(&self, stand: &mut StandDriverMock) {
        let pins = &self.pins;

        stand.set_analog(pins.joystick, STICK_IDLE);
        stand.set_analog(pins.power_sense, POWER_ON);
        for pin in [pins.push_1, pins.push_2, pins.cmd_1, pins.cmd_2] {
            stand.set_digital(pin, true);
        }

        stand.set_digital(pins.safe_igniter, false);
        stand.set_digital(pins.safe_main, self.test != TestKind::MainSequence);
    }

    pub fn update(&mut self, stand: &mut StandDriverMock, now: Millis) {
        while let Some(&(t, action)) = self.script.get(self.next) {
            if t > now {
                break;
            }
            self.next += 1;

            match action {
                Action::Stick(reading) => stand.set_analog(self.pins.joystick, reading),
                Action::Digital(pin, high) => {
                    info!("Operator: pin {} {}", pin.0, if high { "released" } else { "pulled low" });
                    stand.set_digital(pin, high);
                }
                Action::Analog(pin, reading) => {
                    info!("Operator: analog {} set to {}", pin.0, reading);
                    stand.set_analog(pin, reading);
                }
            }
        }
    }
}
