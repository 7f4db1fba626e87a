//! Servo-driven main propellant valves.

use serde::{Deserialize, Serialize};
use stand_core::StandDriver;

use crate::config::{PinMap, ValveConfig};

/// Degrees from closed to cracked, taking up slack in the linkage.
pub const SERVO_CRACK: u8 = 1;
/// Degrees from closed to fully open.
pub const SERVO_OPEN: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MainValve {
    Ipa,
    N2o,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValvePosition {
    Closed,
    Cracked,
    Partial,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoPositions {
    pub closed: u8,
    pub cracked: u8,
    pub partial: u8,
    pub open: u8,
}

impl ServoPositions {
    pub const fn from_closed(closed: u8, partial_offset: u8) -> Self {
        Self {
            closed,
            cracked: closed + SERVO_CRACK,
            partial: closed + partial_offset,
            open: closed + SERVO_OPEN,
        }
    }

    pub fn degrees(&self, position: ValvePosition) -> u8 {
        match position {
            ValvePosition::Closed => self.closed,
            ValvePosition::Cracked => self.cracked,
            ValvePosition::Partial => self.partial,
            ValvePosition::Open => self.open,
        }
    }
}

/// Tracks the commanded position of both main valves. Servos are attached
/// by the first command and stay powered until `detach`.
#[derive(Debug, Default)]
pub struct MainValves {
    ipa: Option<ValvePosition>,
    n2o: Option<ValvePosition>,
}

impl MainValves {
    pub const fn new() -> Self {
        Self { ipa: None, n2o: None }
    }

    pub fn set(
        &mut self,
        driver: &mut dyn StandDriver,
        config: &ValveConfig,
        pins: &PinMap,
        valve: MainValve,
        position: ValvePosition,
    ) {
        let (pin, degrees) = match valve {
            MainValve::Ipa => (pins.ipa_servo, config.ipa.degrees(position)),
            MainValve::N2o => (pins.n2o_servo, config.n2o.degrees(position)),
        };

        driver.servo_write(pin, degrees);
        *self.slot(valve) = Some(position);
    }

    pub fn close_all(&mut self, driver: &mut dyn StandDriver, config: &ValveConfig, pins: &PinMap) {
        self.set(driver, config, pins, MainValve::Ipa, ValvePosition::Closed);
        self.set(driver, config, pins, MainValve::N2o, ValvePosition::Closed);
    }

    /// Removes servo power. The valves hold their last position.
    pub fn detach(&mut self, driver: &mut dyn StandDriver, pins: &PinMap) {
        for pin in [pins.ipa_servo, pins.n2o_servo] {
            driver.servo_detach(pin);
        }
        self.ipa = None;
        self.n2o = None;
    }

    /// Commanded position, `None` while detached.
    pub fn position(&self, valve: MainValve) -> Option<ValvePosition> {
        match valve {
            MainValve::Ipa => self.ipa,
            MainValve::N2o => self.n2o,
        }
    }

    fn slot(&mut self, valve: MainValve) -> &mut Option<ValvePosition> {
        match valve {
            MainValve::Ipa => &mut self.ipa,
            MainValve::N2o => &mut self.n2o,
        }
    }
}
