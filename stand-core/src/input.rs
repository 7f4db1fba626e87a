use crate::{
    ladder,
    stand_hal::{Edge, InputMode, PinId, StandDriver},
    util::elapsed,
    Millis,
};

/// Exponential filter window, in samples.
pub const FILTER_WEIGHT: u32 = 16;
/// Fixed-point scale the filter accumulator is kept at.
pub const FILTER_SCALE: u32 = 4;

/// `analog_threshold` sentinel for a plain digital pin.
pub const DIGITAL_INPUT: i16 = -1;
/// `analog_threshold` sentinel for a ladder pin.
pub const LADDER_INPUT: i16 = 0;

/// One step of the analog filter. `filtered` and the result are at `FILTER_SCALE`.
pub fn filter_step(filtered: u32, raw: u16) -> u32 {
    (filtered * (FILTER_WEIGHT - 1) + raw as u32 * FILTER_SCALE + FILTER_SCALE / 2) / FILTER_WEIGHT
}

#[derive(Debug, Clone)]
pub struct Input {
    pub name: &'static str,
    pub pin: PinId,
    pub normal: InputMode,
    pub current: InputMode,
    /// -1 digital, 0 ladder, otherwise the analog threshold in counts.
    pub analog_threshold: i16,
    pub analog_hysteresis: i16,
    pub ladder: usize,
    candidate: u8,
    value: u8,
    edge: Edge,
    last_change_t: Millis,
    filtered: u32,
    raw: u16,
}

impl Input {
    pub const fn new(
        name: &'static str,
        pin: PinId,
        normal: InputMode,
        analog_threshold: i16,
        analog_hysteresis: i16,
        ladder: usize,
    ) -> Self {
        Self {
            name,
            pin,
            normal,
            current: InputMode::Default,
            analog_threshold,
            analog_hysteresis,
            ladder,
            candidate: 0,
            value: 0,
            edge: Edge::None,
            last_change_t: 0,
            filtered: 0,
            raw: 0,
        }
    }

    pub const fn digital(name: &'static str, pin: PinId, normal: InputMode) -> Self {
        Self::new(name, pin, normal, DIGITAL_INPUT, 0, 0)
    }

    pub const fn analog(
        name: &'static str,
        pin: PinId,
        normal: InputMode,
        threshold: i16,
        hysteresis: i16,
    ) -> Self {
        Self::new(name, pin, normal, threshold, hysteresis, 0)
    }

    pub const fn ladder(name: &'static str, pin: PinId, ladder: usize) -> Self {
        Self::new(name, pin, InputMode::MultiInput, LADDER_INPUT, 0, ladder)
    }

    pub fn is_analog(&self) -> bool {
        self.analog_threshold >= 0
    }

    /// The mode in force: the runtime override unless it defers to `normal`.
    pub fn mode(&self) -> InputMode {
        match self.current {
            InputMode::Default => self.normal,
            mode => mode,
        }
    }

    /// Debounced value. Boolean inputs read 0 or 1, ladder inputs their level.
    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_active(&self) -> bool {
        self.value != 0
    }

    pub fn edge(&self) -> Edge {
        self.edge
    }

    /// Returns the pending edge and clears it, for single-shot consumers.
    pub fn take_edge(&mut self) -> Edge {
        core::mem::take(&mut self.edge)
    }

    pub fn clear_edge(&mut self) {
        self.edge = Edge::None;
    }

    /// Filtered analog reading at `FILTER_SCALE`.
    pub fn filtered(&self) -> u32 {
        self.filtered
    }

    /// Filtered analog reading in ADC counts.
    pub fn filtered_counts(&self) -> u32 {
        self.filtered / FILTER_SCALE
    }

    /// Last unfiltered analog sample.
    pub fn raw(&self) -> u16 {
        self.raw
    }

    pub fn setup(&mut self, driver: &mut dyn StandDriver) {
        driver.configure_input(self.pin, !self.is_analog() && self.mode().is_pullup());
    }

    /// Reads the pin and runs filter, classification and debounce. `now` is
    /// the loop start time.
    pub fn sample(
        &mut self,
        driver: &mut dyn StandDriver,
        now: Millis,
        ladders: &[&[u16]],
        debounce_ms: Millis,
    ) {
        let sampled = match self.mode() {
            InputMode::ForceOn => 1,
            InputMode::ForceOff => 0,
            mode if self.is_analog() => self.sample_analog(driver, mode, ladders),
            mode => {
                let level = driver.digital_read(self.pin);
                (level != mode.is_active_low()) as u8
            }
        };

        self.debounce(sampled, now, debounce_ms);
    }

    fn sample_analog(&mut self, driver: &mut dyn StandDriver, mode: InputMode, ladders: &[&[u16]]) -> u8 {
        let raw = driver.analog_read(self.pin);
        self.raw = raw;
        self.filtered = filter_step(self.filtered, raw);

        let level = self.filtered_counts() as i32;
        let threshold = self.analog_threshold as i32;
        let hysteresis = self.analog_hysteresis as i32;
        // The band follows the undebounced candidate, not the accepted value.
        let was_active = self.candidate != 0;

        match mode {
            InputMode::ActiveHighIn if was_active => (level >= threshold - hysteresis) as u8,
            InputMode::ActiveHighIn => (level >= threshold) as u8,
            InputMode::ActiveLowIn if was_active => (level < threshold + hysteresis) as u8,
            InputMode::ActiveLowIn => (level < threshold) as u8,
            InputMode::MultiInput => ladders
                .get(self.ladder)
                .map_or(ladder::LEVEL_NONE, |thresholds| ladder::decode(thresholds, raw)),
            // Pull-up modes have no meaning on an analog pin.
            _ => 0,
        }
    }

    fn debounce(&mut self, sampled: u8, now: Millis, debounce_ms: Millis) {
        if sampled != self.candidate {
            self.candidate = sampled;
            self.last_change_t = now;
        } else if self.value != sampled && elapsed(now, self.last_change_t) >= debounce_ms {
            self.edge = if sampled != 0 { Edge::Rising } else { Edge::Falling };
            self.value = sampled;
        }
    }
}
