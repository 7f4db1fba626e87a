use core::any::Any;

use crate::{
    event_log::{EventStore, MemoryEventStore},
    stand_hal::{PinId, StandDriver},
    Millis,
};

pub const MOCK_PIN_COUNT: usize = 64;

/// Pin-level double for `StandDriver`. Time only moves when a test moves it.
pub struct StandDriverMock {
    now: Millis,
    digital_inputs: [bool; MOCK_PIN_COUNT],
    analog_inputs: [u16; MOCK_PIN_COUNT],
    input_pullups: [Option<bool>; MOCK_PIN_COUNT],
    output_pins: [bool; MOCK_PIN_COUNT],
    levels: [Option<bool>; MOCK_PIN_COUNT],
    servos: [Option<u8>; MOCK_PIN_COUNT],
    writes: u32,
    store: MemoryEventStore,
}

impl StandDriver for StandDriverMock {
    fn millis(&self) -> Millis {
        self.now
    }

    fn configure_input(&mut self, pin: PinId, pullup: bool) {
        if let Some(slot) = self.input_pullups.get_mut(pin.0 as usize) {
            *slot = Some(pullup);
        }
    }

    fn configure_output(&mut self, pin: PinId) {
        if let Some(slot) = self.output_pins.get_mut(pin.0 as usize) {
            *slot = true;
        }
    }

    fn digital_read(&mut self, pin: PinId) -> bool {
        self.digital_inputs.get(pin.0 as usize).copied().unwrap_or(false)
    }

    fn analog_read(&mut self, pin: PinId) -> u16 {
        self.analog_inputs.get(pin.0 as usize).copied().unwrap_or(0)
    }

    fn digital_write(&mut self, pin: PinId, high: bool) {
        self.writes += 1;
        if let Some(slot) = self.levels.get_mut(pin.0 as usize) {
            *slot = Some(high);
        }
    }

    fn servo_write(&mut self, pin: PinId, degrees: u8) {
        if let Some(slot) = self.servos.get_mut(pin.0 as usize) {
            *slot = Some(degrees);
        }
    }

    fn servo_detach(&mut self, pin: PinId) {
        if let Some(slot) = self.servos.get_mut(pin.0 as usize) {
            *slot = None;
        }
    }

    fn event_store(&mut self) -> &mut dyn EventStore {
        &mut self.store
    }

    fn as_mut_any(&mut self) -> &mut dyn Any {
        self
    }
}

impl StandDriverMock {
    pub fn new() -> Self {
        Self {
            now: 0,
            digital_inputs: [false; MOCK_PIN_COUNT],
            analog_inputs: [0; MOCK_PIN_COUNT],
            input_pullups: [None; MOCK_PIN_COUNT],
            output_pins: [false; MOCK_PIN_COUNT],
            levels: [None; MOCK_PIN_COUNT],
            servos: [None; MOCK_PIN_COUNT],
            writes: 0,
            store: MemoryEventStore::new(),
        }
    }

    pub fn set_millis(&mut self, now: Millis) {
        self.now = now;
    }

    pub fn advance(&mut self, ms: Millis) {
        self.now = self.now.wrapping_add(ms);
    }

    pub fn set_digital(&mut self, pin: PinId, high: bool) {
        if let Some(slot) = self.digital_inputs.get_mut(pin.0 as usize) {
            *slot = high;
        }
    }

    pub fn set_analog(&mut self, pin: PinId, value: u16) {
        if let Some(slot) = self.analog_inputs.get_mut(pin.0 as usize) {
            *slot = value;
        }
    }

    /// Last level written to `pin`, `None` if never written.
    pub fn pin_level(&self, pin: PinId) -> Option<bool> {
        self.levels.get(pin.0 as usize).copied().flatten()
    }

    pub fn is_output(&self, pin: PinId) -> bool {
        self.output_pins.get(pin.0 as usize).copied().unwrap_or(false)
    }

    /// Pull-up setting the pin was configured with, `None` if never configured as an input.
    pub fn input_pullup(&self, pin: PinId) -> Option<bool> {
        self.input_pullups.get(pin.0 as usize).copied().flatten()
    }

    pub fn servo_position(&self, pin: PinId) -> Option<u8> {
        self.servos.get(pin.0 as usize).copied().flatten()
    }

    pub fn write_count(&self) -> u32 {
        self.writes
    }

    pub fn store(&self) -> &MemoryEventStore {
        &self.store
    }
}

impl Default for StandDriverMock {
    fn default() -> Self {
        Self::new()
    }
}
