use log::error;
use stand_core::{util::elapsed, ControllerState, Millis, OutputState};

use crate::{io_table::OutputId, stand_fsm::StandState, Sequencer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportPhase {
    /// Both DAQ lines pulsed high to mark the end of the run.
    Marker,
    /// Both lines low for one more pulse width.
    Gap,
}

/// Marks the end of the run on the DAQ lines, then saves the event log.
pub struct SequenceReport {
    phase: ReportPhase,
    phase_t: Millis,
}

impl<'f> ControllerState<StandState, Sequencer<'f>> for SequenceReport {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        let now = seq.now();
        if elapsed(now, self.phase_t) < seq.config.sequence.report_pulse_ms {
            return Some(StandState::SequenceReport);
        }

        if self.phase == ReportPhase::Marker {
            self.phase = ReportPhase::Gap;
            self.phase_t = now;
            return Some(StandState::SequenceReport);
        }

        if let Err(err) = seq.commit_events() {
            error!("Could not save event log: {}", err);
        }
        seq.faults.clear_history();

        Some(StandState::Menu)
    }

    fn enter_state(&mut self, seq: &mut Sequencer<'f>) {
        self.phase = ReportPhase::Marker;
        self.phase_t = seq.now();

        seq.output_on(OutputId::GreenLed, false);
        seq.output_on(OutputId::AmberLed, true);
        seq.output_on(OutputId::RedLed, false);
        seq.set_output(OutputId::Daq0, OutputState::SingleOn);
        seq.set_output(OutputId::Daq1, OutputState::SingleOn);
    }

    fn exit_state(&mut self, seq: &mut Sequencer<'f>) {
        seq.output_on(OutputId::GreenLed, true);
        seq.output_on(OutputId::AmberLed, false);
        seq.output_on(OutputId::Daq0, false);
        seq.output_on(OutputId::Daq1, false);
    }
}

impl SequenceReport {
    pub fn new() -> Self {
        Self {
            phase: ReportPhase::Marker,
            phase_t: 0,
        }
    }
}
