//! Typed command surface of the serial debug console. Line parsing lives
//! with the serial driver; everything here works on names.

use core::{fmt, str::FromStr};

use stand_core::{Edge, InputMode, OutputMode, OutputState};
use strum::IntoEnumIterator;

use crate::{stand_fsm::StandState, Sequencer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand<'c> {
    /// `read <input>`
    Read { input: &'c str },
    /// `reada <input>`
    ReadAnalog { input: &'c str },
    /// `set_i <input> <mode>`
    SetInputMode { input: &'c str, mode: &'c str },
    /// `set_om <output> <mode>`
    SetOutputMode { output: &'c str, mode: &'c str },
    /// `set_ov <output> <state>`
    SetOutputValue { output: &'c str, state: &'c str },
    State,
    ListIo,
    ListModes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugReply {
    Value { value: u8, edge: Edge },
    Analog { raw: u16, filtered: u32 },
    State(StandState),
    IoCount { inputs: usize, outputs: usize },
    ModeCount { input_modes: usize, output_modes: usize, output_states: usize },
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    UnknownInput,
    UnknownOutput,
    UnknownMode,
    UnknownState,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::UnknownInput => write!(f, "no such input"),
            ConsoleError::UnknownOutput => write!(f, "no such output"),
            ConsoleError::UnknownMode => write!(f, "no such mode"),
            ConsoleError::UnknownState => write!(f, "no such output state"),
        }
    }
}

impl core::error::Error for ConsoleError {}

pub fn execute(seq: &mut Sequencer, command: DebugCommand) -> Result<DebugReply, ConsoleError> {
    match command {
        DebugCommand::Read { input } => {
            let input = seq.io.input(find_input(seq, input)?);
            Ok(DebugReply::Value {
                value: input.value(),
                edge: input.edge(),
            })
        }
        DebugCommand::ReadAnalog { input } => {
            let input = seq.io.input(find_input(seq, input)?);
            Ok(DebugReply::Analog {
                raw: input.raw(),
                filtered: input.filtered(),
            })
        }
        DebugCommand::SetInputMode { input, mode } => {
            let index = find_input(seq, input)?;
            let mode = InputMode::from_str(mode).map_err(|_| ConsoleError::UnknownMode)?;
            seq.io.input_mut(index).current = mode;
            Ok(DebugReply::Done)
        }
        DebugCommand::SetOutputMode { output, mode } => {
            let index = find_output(seq, output)?;
            let mode = OutputMode::from_str(mode).map_err(|_| ConsoleError::UnknownMode)?;
            seq.io.output_mut(index).current = mode;
            Ok(DebugReply::Done)
        }
        DebugCommand::SetOutputValue { output, state } => {
            let index = find_output(seq, output)?;
            let state = OutputState::from_str(state).map_err(|_| ConsoleError::UnknownState)?;
            seq.io.output_mut(index).set(state);
            Ok(DebugReply::Done)
        }
        DebugCommand::State => Ok(DebugReply::State(seq.state())),
        DebugCommand::ListIo => Ok(DebugReply::IoCount {
            inputs: seq.io.inputs().len(),
            outputs: seq.io.outputs().len(),
        }),
        DebugCommand::ListModes => Ok(DebugReply::ModeCount {
            input_modes: InputMode::iter().count(),
            output_modes: OutputMode::iter().count(),
            output_states: OutputState::iter().count(),
        }),
    }
}

fn find_input(seq: &Sequencer, name: &str) -> Result<usize, ConsoleError> {
    seq.io.find_input(name).ok_or(ConsoleError::UnknownInput)
}

fn find_output(seq: &Sequencer, name: &str) -> Result<usize, ConsoleError> {
    seq.io.find_output(name).ok_or(ConsoleError::UnknownOutput)
}

/// Every input and output with its current mode, for `list_io`.
pub fn list_io<'s>(seq: &'s Sequencer) -> impl Iterator<Item = (&'static str, &'static str)> + 's {
    let inputs = seq
        .io
        .inputs()
        .iter()
        .map(|input| (input.name, <&'static str>::from(input.mode())));
    let outputs = seq
        .io
        .outputs()
        .iter()
        .map(|output| (output.name, <&'static str>::from(output.mode())));

    inputs.chain(outputs)
}

/// Names accepted by `set_i`, `set_om` and `set_ov`, for `list_modes`.
pub fn list_modes() -> impl Iterator<Item = &'static str> {
    let inputs = InputMode::iter().map(<&'static str>::from);
    let outputs = OutputMode::iter().map(<&'static str>::from);
    let states = OutputState::iter().map(<&'static str>::from);

    inputs.chain(outputs).chain(states)
}
