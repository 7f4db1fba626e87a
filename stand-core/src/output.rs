use crate::{
    stand_hal::{OutputMode, OutputState, PinId, StandDriver},
    util::elapsed,
    Millis,
};

/// What `Output::update` did to the pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    /// Pin driven from the logical state.
    Driven(bool),
    /// Pin driven by a force override, logical state ignored.
    Forced(bool),
    /// PWM is not generated; the pin is held low.
    Unimplemented,
    /// Pin belongs to a servo driven elsewhere and was left untouched.
    External,
}

#[derive(Debug, Clone)]
pub struct Output {
    pub name: &'static str,
    pub pin: PinId,
    pub normal: OutputMode,
    pub current: OutputMode,
    /// Single pulse width, or half period of a periodic pulse.
    pub pulse_ms: Millis,
    state: OutputState,
    last_change_t: Option<Millis>,
}

impl Output {
    pub const fn new(name: &'static str, pin: PinId, normal: OutputMode) -> Self {
        Self::pulsed(name, pin, normal, 0)
    }

    pub const fn pulsed(name: &'static str, pin: PinId, normal: OutputMode, pulse_ms: Millis) -> Self {
        Self {
            name,
            pin,
            normal,
            current: OutputMode::Default,
            pulse_ms,
            state: OutputState::Off,
            last_change_t: None,
        }
    }

    pub fn starting(mut self, state: OutputState) -> Self {
        self.state = state;
        self
    }

    pub fn mode(&self) -> OutputMode {
        match self.current {
            OutputMode::Default => self.normal,
            mode => mode,
        }
    }

    pub fn state(&self) -> OutputState {
        self.state
    }

    /// Sets the logical state. The pulse timer restarts only when the state
    /// actually changes; both phases of a periodic pulse count as one state.
    pub fn set(&mut self, state: OutputState) {
        let unchanged = self.state == state || (self.state.is_periodic() && state.is_periodic());

        if !unchanged {
            self.state = state;
            self.last_change_t = None;
        }
    }

    pub fn set_on(&mut self, on: bool) {
        self.set(if on { OutputState::On } else { OutputState::Off });
    }

    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    /// Pin level of the logical "off" state in the current mode.
    pub fn off_level(&self) -> bool {
        self.mode() == OutputMode::ActiveLow
    }

    pub fn setup(&mut self, driver: &mut dyn StandDriver, now: Millis) {
        self.update(driver, now);
        driver.configure_output(self.pin);
    }

    /// Applies the pin level for the current mode, logical state and time.
    pub fn update(&mut self, driver: &mut dyn StandDriver, now: Millis) -> Actuation {
        match self.mode() {
            OutputMode::ForceLow => return self.force(driver, false),
            OutputMode::ForceHigh => return self.force(driver, true),
            OutputMode::Servo => return Actuation::External,
            _ => {}
        }

        match self.state {
            OutputState::On | OutputState::Off => {}
            OutputState::SingleOn | OutputState::SingleOff => {
                let started = *self.last_change_t.get_or_insert(now);

                if elapsed(now, started) >= self.pulse_ms {
                    self.state = match self.state {
                        OutputState::SingleOn => OutputState::Off,
                        _ => OutputState::On,
                    };
                    self.last_change_t = None;
                }
            }
            OutputState::PulseOn | OutputState::PulseOff => {
                let started = *self.last_change_t.get_or_insert(now);

                if elapsed(now, started) >= self.pulse_ms {
                    self.state = match self.state {
                        OutputState::PulseOn => OutputState::PulseOff,
                        _ => OutputState::PulseOn,
                    };
                    self.last_change_t = Some(now);
                }
            }
            OutputState::Pwm => {
                driver.digital_write(self.pin, false);
                return Actuation::Unimplemented;
            }
            OutputState::ServoControlled => return Actuation::External,
        }

        let level = self.state.is_on() != self.off_level();
        driver.digital_write(self.pin, level);

        Actuation::Driven(level)
    }

    fn force(&self, driver: &mut dyn StandDriver, level: bool) -> Actuation {
        driver.digital_write(self.pin, level);
        Actuation::Forced(level)
    }
}
