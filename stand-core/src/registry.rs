use core::fmt;

use log::error;

use crate::{
    input::{Input, DIGITAL_INPUT, LADDER_INPUT},
    ladder,
    output::{Actuation, Output},
    stand_hal::{InputMode, PinId, StandDriver},
    Millis,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// Threshold is neither the digital sentinel nor a valid analog value.
    InvalidThreshold { input: &'static str },
    /// Ladder mode on an input that is not configured as a ladder pin.
    LadderMismatch { input: &'static str },
    UnknownLadder { input: &'static str },
    NegativeHysteresis { input: &'static str },
    DuplicateName { name: &'static str },
    DuplicateInputPin { first: &'static str, second: &'static str },
    InputOutputPinCollision { input: &'static str, output: &'static str },
    DuplicateOutputPin { first: &'static str, second: &'static str },
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoError::InvalidThreshold { input } => write!(f, "{}: invalid analog threshold", input),
            IoError::LadderMismatch { input } => write!(f, "{}: multi_input needs a ladder pin", input),
            IoError::UnknownLadder { input } => write!(f, "{}: no such ladder", input),
            IoError::NegativeHysteresis { input } => write!(f, "{}: negative hysteresis", input),
            IoError::DuplicateName { name } => write!(f, "{}: name used twice", name),
            IoError::DuplicateInputPin { first, second } => {
                write!(f, "{} and {} share an input pin", first, second)
            }
            IoError::InputOutputPinCollision { input, output } => {
                write!(f, "input {} and output {} share a pin", input, output)
            }
            IoError::DuplicateOutputPin { first, second } => {
                write!(f, "{} and {} share an output pin", first, second)
            }
        }
    }
}

impl core::error::Error for IoError {}

/// Identity of the physical pin behind an input. Analog and digital pin
/// numbers are separate namespaces on the board.
fn input_pin(input: &Input) -> (PinId, bool) {
    (input.pin, input.is_analog())
}

/// The fixed I/O tables of the stand, built once at startup.
pub struct IoRegistry<const NI: usize, const NO: usize> {
    inputs: [Input; NI],
    outputs: [Output; NO],
    ladders: &'static [&'static [u16]],
    debounce_ms: Millis,
}

impl<const NI: usize, const NO: usize> IoRegistry<NI, NO> {
    pub fn new(
        inputs: [Input; NI],
        outputs: [Output; NO],
        ladders: &'static [&'static [u16]],
        debounce_ms: Millis,
    ) -> Self {
        Self {
            inputs,
            outputs,
            ladders,
            debounce_ms,
        }
    }

    /// Checks the tables for configurations that would misread a sensor or
    /// drive one pin from two places.
    pub fn validate(&self) -> Result<(), IoError> {
        for (i, input) in self.inputs.iter().enumerate() {
            self.validate_input(input)?;

            for other in &self.inputs[i + 1..] {
                if input.name == other.name {
                    return Err(IoError::DuplicateName { name: input.name });
                }
                if input_pin(input) == input_pin(other) {
                    return Err(IoError::DuplicateInputPin {
                        first: input.name,
                        second: other.name,
                    });
                }
            }

            for output in &self.outputs {
                if input.name == output.name {
                    return Err(IoError::DuplicateName { name: input.name });
                }
                if input_pin(input) == (output.pin, false) {
                    return Err(IoError::InputOutputPinCollision {
                        input: input.name,
                        output: output.name,
                    });
                }
            }
        }

        for (i, output) in self.outputs.iter().enumerate() {
            for other in &self.outputs[i + 1..] {
                if output.name == other.name {
                    return Err(IoError::DuplicateName { name: output.name });
                }
                if output.pin == other.pin {
                    return Err(IoError::DuplicateOutputPin {
                        first: output.name,
                        second: other.name,
                    });
                }
            }
        }

        Ok(())
    }

    fn validate_input(&self, input: &Input) -> Result<(), IoError> {
        let name = input.name;
        let uses_ladder =
            input.normal == InputMode::MultiInput || input.current == InputMode::MultiInput;

        if input.analog_threshold < DIGITAL_INPUT {
            return Err(IoError::InvalidThreshold { input: name });
        }
        if uses_ladder && input.analog_threshold != LADDER_INPUT {
            return Err(IoError::LadderMismatch { input: name });
        }
        if uses_ladder && !self.ladders.get(input.ladder).is_some_and(|l| ladder::is_valid(l)) {
            return Err(IoError::UnknownLadder { input: name });
        }
        if input.analog_hysteresis < 0 {
            return Err(IoError::NegativeHysteresis { input: name });
        }

        Ok(())
    }

    /// Configures every pin. Outputs are driven to their initial level
    /// before being switched to output mode.
    pub fn setup(&mut self, driver: &mut dyn StandDriver, now: Millis) {
        for input in self.inputs.iter_mut() {
            input.setup(driver);
        }
        for output in self.outputs.iter_mut() {
            output.setup(driver, now);
        }
    }

    pub fn sample_inputs(&mut self, driver: &mut dyn StandDriver, now: Millis) {
        for input in self.inputs.iter_mut() {
            input.sample(driver, now, self.ladders, self.debounce_ms);
        }
    }

    pub fn update_outputs(&mut self, driver: &mut dyn StandDriver, now: Millis) {
        for output in self.outputs.iter_mut() {
            if output.update(driver, now) == Actuation::Unimplemented {
                error!("{}: pwm output is not implemented, holding low", output.name);
            }
        }
    }

    /// Drives every output pin to its off level, ignoring logical state.
    pub fn drive_safe(&mut self, driver: &mut dyn StandDriver) {
        for output in self.outputs.iter_mut() {
            output.set_on(false);
            driver.digital_write(output.pin, output.off_level());
        }
    }

    pub fn input(&self, index: usize) -> &Input {
        &self.inputs[index]
    }

    pub fn input_mut(&mut self, index: usize) -> &mut Input {
        &mut self.inputs[index]
    }

    pub fn output(&self, index: usize) -> &Output {
        &self.outputs[index]
    }

    pub fn output_mut(&mut self, index: usize) -> &mut Output {
        &mut self.outputs[index]
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn find_input(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|input| input.name == name)
    }

    pub fn find_output(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|output| output.name == name)
    }
}
