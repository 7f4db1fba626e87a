use log::info;
use stand_core::ControllerState;

use crate::{faults::FaultCode, io_table::OutputId, stand_fsm::StandState, Sequencer};

use super::{aborts, record_pressure, run_enter, run_exit};

/// Sparks until the igniter comes up to pressure.
pub struct RunIgPress;

impl<'f> ControllerState<StandState, Sequencer<'f>> for RunIgPress {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        if let Some(fault) = aborts(seq) {
            return Some(fault);
        }

        seq.spark_run();

        let p = seq.ig_pressure();
        if p >= seq.config.pressure.good {
            info!("Igniter at pressure ({})", p);
            seq.ignition.at_pressure_t = Some(seq.now());
            seq.output_on(OutputId::Daq1, true);
            record_pressure(seq, p);
            return Some(StandState::RunIgRun);
        }

        let t = seq.time_in_state();
        if t > seq.config.ignition.pressure_timeout_ms {
            return Some(seq.fault(FaultCode::IgNoIgnition, t));
        }

        Some(StandState::RunIgPress)
    }

    fn enter_state(&mut self, seq: &mut Sequencer<'f>) {
        run_enter(seq);
    }

    fn exit_state(&mut self, seq: &mut Sequencer<'f>) {
        run_exit(seq);
    }
}
