//! Main engine sequence: igniter light, igniter pressure, main valves
//! partial then full, report.
//!
//! The DAQ lines tell the recorder which phase is running. DAQ 1 carries the
//! low bit of the phase number (1 light, 2 igniter pressure, 3 main partial,
//! 4 main full). DAQ 0 is held low while a phase runs and goes high when the
//! phase exits.

use stand_core::{Edge, Millis};

use crate::{
    events::{EventCode, ABORT_OPERATOR, ABORT_POWER, ABORT_SAFE},
    faults::FaultCode,
    io_table::{InputId, OutputId},
    joystick::Joystick,
    stand_fsm::StandState,
    Sequencer,
};

pub mod entry;
pub mod ig_light;
pub mod ig_pressure;
pub mod main_valves_full;
pub mod main_valves_start;
pub mod report;

/// Bookkeeping that spans the phases of one main sequence run.
#[derive(Debug, Default)]
pub struct SequenceRun {
    /// Loop time the sequence was fired.
    pub sequence_t: Millis,
    /// Loop time the igniter was declared stable.
    pub stable_t: Millis,
    pub ig_n2o_on: bool,
}

impl SequenceRun {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The main sequence needs both safe switches armed.
pub fn safe_ok(seq: &Sequencer) -> bool {
    !seq.is_active(InputId::SafeIgniter) && !seq.is_active(InputId::SafeMain)
}

/// Checks both pressure sensors. Used before firing and during every phase.
pub fn pressure_faults(seq: &mut Sequencer, record: bool) -> Option<StandState> {
    let p = seq.ig_pressure();
    if !seq.pressure_valid(p) {
        if record {
            seq.event(EventCode::IgPressFail, p as u16);
        }
        let code = match seq.pressure_sane(p) {
            true => FaultCode::IgNoPressure,
            false => FaultCode::IgPressureInsane,
        };
        return Some(seq.fault(code, p));
    }

    let p = seq.main_pressure();
    if !seq.pressure_valid(p) {
        if record {
            seq.event(EventCode::MainPressFail, p as u16);
        }
        let code = match seq.pressure_sane(p) {
            true => FaultCode::MainNoPressure,
            false => FaultCode::MainPressureInsane,
        };
        return Some(seq.fault(code, p));
    }

    None
}

/// Abort conditions shared by every running phase.
pub fn aborts(seq: &mut Sequencer) -> Option<StandState> {
    if seq.joystick() == Joystick::Press
        || seq.input(InputId::Cmd2).edge() == Edge::Rising
        || seq.is_active(InputId::Push1)
        || seq.is_active(InputId::Push2)
    {
        seq.input_mut(InputId::Cmd2).clear_edge();
        seq.event(EventCode::OpAbort, ABORT_OPERATOR);
        return Some(seq.fault(FaultCode::SeqOpAbort, 0));
    }

    if !safe_ok(seq) {
        seq.event(EventCode::OpAbort, ABORT_SAFE);
        return Some(seq.fault(FaultCode::SeqSafe, 0));
    }

    if !seq.power_ok() {
        seq.event(EventCode::OpAbort, ABORT_POWER);
        return Some(seq.fault(FaultCode::SeqPower, 0));
    }

    pressure_faults(seq, true)
}

/// Exit of the igniter phases: igniter shut, spark off, DAQ 0 flags the exit.
pub fn phase_exit(seq: &mut Sequencer) {
    seq.output_on(OutputId::Daq0, true);
    seq.output_on(OutputId::IpaIgValve, false);
    seq.output_on(OutputId::N2oIgValve, false);
    seq.output_on(OutputId::Spark, false);
}

/// Entry of a phase: DAQ 1 carries the low bit of the phase number.
pub fn phase_enter(seq: &mut Sequencer, phase: u8) {
    seq.output_on(OutputId::Daq0, false);
    seq.output_on(OutputId::Daq1, phase % 2 == 1);
}

/// Igniter pressure below `good`.
pub fn ig_pressure_low(seq: &Sequencer, pressure: u32) -> bool {
    pressure < seq.config.pressure.good
}

/// Main chamber pressure below `main_good`.
pub fn main_pressure_low(seq: &Sequencer, pressure: u32) -> bool {
    pressure < seq.config.pressure.main_good
}
