use log::info;
use stand_core::ControllerState;

use crate::{joystick::Joystick, stand_fsm::StandState, Sequencer};

/// Shows the run summary until the operator presses the stick.
pub struct IgRunReport;

impl<'f> ControllerState<StandState, Sequencer<'f>> for IgRunReport {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        if seq.joystick() == Joystick::Press {
            return Some(seq.ignition.return_state.unwrap_or(StandState::Menu));
        }

        Some(StandState::IgRunReport)
    }

    fn enter_state(&mut self, seq: &mut Sequencer<'f>) {
        let report = seq.ignition.build_report();
        info!(
            "Igniter run: {} ms, {} ms at pressure, max {}, mean {}, {}",
            report.run_time_ms,
            report.time_at_pressure_ms,
            report.max_pressure,
            report.mean_pressure,
            if report.stopped_on_time { "stopped on time" } else { "flame out" },
        );
        seq.ignition.report = Some(report);
    }

    fn exit_state(&mut self, _seq: &mut Sequencer<'f>) {
        // Nothing
    }
}
