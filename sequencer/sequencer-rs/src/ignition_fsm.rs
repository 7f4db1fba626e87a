//! Igniter-only test firing: arm from a test entry screen, light the igniter,
//! hold it at pressure for the configured run time and report.

use serde::{Deserialize, Serialize};
use stand_core::{util::elapsed, Millis, OutputState};

use crate::{
    events::EventCode,
    faults::FaultCode,
    io_table::{InputId, OutputId},
    joystick::Joystick,
    stand_fsm::StandState,
    Sequencer,
};

pub mod ig_press;
pub mod ig_run;
pub mod report;
pub mod run_start;
pub mod test_entry;

/// Summary of the last igniter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnitionReport {
    /// From commanded start to the end of the run.
    pub run_time_ms: Millis,
    /// From commanded start to first good pressure, if it came up at all.
    pub time_to_pressure_ms: Option<Millis>,
    pub time_at_pressure_ms: Millis,
    pub max_pressure: u32,
    pub mean_pressure: u32,
    /// True if the run ended on time rather than on flame-out.
    pub stopped_on_time: bool,
}

/// Shared bookkeeping of one igniter run, carried across the run states.
#[derive(Debug, Default)]
pub struct IgnitionRun {
    /// Test entry state that launched the run.
    pub return_state: Option<StandState>,
    pub test_start_t: Millis,
    pub at_pressure_t: Option<Millis>,
    pub end_t: Millis,
    pub stop_good: bool,
    samples: u32,
    max_pressure: u32,
    sum_pressure: u64,
    saved_daq: [OutputState; 2],
    pub report: Option<IgnitionReport>,
}

impl IgnitionRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: Millis) {
        self.test_start_t = now;
        self.at_pressure_t = None;
        self.end_t = now;
        self.stop_good = false;
        self.samples = 0;
        self.max_pressure = 0;
        self.sum_pressure = 0;
    }

    pub fn record_pressure(&mut self, pressure: u32) {
        self.max_pressure = self.max_pressure.max(pressure);
        self.samples += 1;
        self.sum_pressure += pressure as u64;
    }

    pub fn build_report(&self) -> IgnitionReport {
        let mean_pressure = match self.samples {
            0 => 0,
            n => (self.sum_pressure / n as u64) as u32,
        };

        IgnitionReport {
            run_time_ms: elapsed(self.end_t, self.test_start_t),
            time_to_pressure_ms: self.at_pressure_t.map(|t| elapsed(t, self.test_start_t)),
            time_at_pressure_ms: self
                .at_pressure_t
                .map_or(0, |t| elapsed(self.end_t, t)),
            max_pressure: self.max_pressure,
            mean_pressure,
            stopped_on_time: self.stop_good,
        }
    }
}

/// Igniter tests want the igniter armed and the main valves safed.
pub fn safe_ok(seq: &Sequencer) -> bool {
    !seq.is_active(InputId::SafeIgniter) && seq.is_active(InputId::SafeMain)
}

/// Abort conditions shared by every running state of an igniter test.
pub fn aborts(seq: &mut Sequencer) -> Option<StandState> {
    if seq.joystick() == Joystick::Press
        || seq.is_active(InputId::Cmd2)
        || seq.is_active(InputId::Push2)
    {
        return Some(seq.fault(FaultCode::IgTestAborted, 0));
    }

    if !safe_ok(seq) {
        return Some(seq.fault(FaultCode::IgTestSafe, 0));
    }

    if !seq.power_ok() {
        return Some(seq.fault(FaultCode::IgTestPower, 0));
    }

    let p = seq.ig_pressure();
    if !seq.pressure_sane(p) {
        seq.event(EventCode::IgPressFail, p as u16);
        return Some(seq.fault(FaultCode::IgPressureInsane, p));
    }

    let p = seq.main_pressure();
    if !seq.pressure_sane(p) {
        seq.event(EventCode::MainPressFail, p as u16);
        return Some(seq.fault(FaultCode::MainPressureInsane, p));
    }

    None
}

/// Status LEDs follow the igniter pressure while it burns.
pub fn record_pressure(seq: &mut Sequencer, pressure: u32) {
    seq.ignition.record_pressure(pressure);

    let good = pressure >= seq.config.pressure.good;
    seq.output_on(OutputId::GreenLed, good);
    seq.output_on(OutputId::AmberLed, !good);
}

/// Entry of the states after `RunStart`: propellants flowing, DAQ lines as
/// they were when the previous state exited.
pub fn run_enter(seq: &mut Sequencer) {
    seq.output_on(OutputId::IpaIgValve, true);
    seq.output_on(OutputId::N2oIgValve, true);

    let [daq0, daq1] = seq.ignition.saved_daq;
    seq.set_output(OutputId::Daq0, daq0);
    seq.set_output(OutputId::Daq1, daq1);
}

/// Exit of every running state. Everything goes safe, and the DAQ lines are
/// remembered so the next running state can restore them.
pub fn run_exit(seq: &mut Sequencer) {
    seq.output_on(OutputId::Spark, false);
    seq.output_on(OutputId::IpaIgValve, false);
    seq.output_on(OutputId::N2oIgValve, false);
    seq.output_on(OutputId::AmberLed, true);
    seq.output_on(OutputId::GreenLed, false);

    seq.ignition.saved_daq = [
        seq.output(OutputId::Daq0).state(),
        seq.output(OutputId::Daq1).state(),
    ];
    seq.output_on(OutputId::Daq0, false);
    seq.output_on(OutputId::Daq1, false);
}
