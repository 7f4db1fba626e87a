use stand_core::{util::elapsed, ControllerState};

use crate::{io_table::OutputId, stand_fsm::StandState, Sequencer};

use super::{aborts, record_pressure, run_enter, run_exit};

/// Holds the igniter lit until flame-out or the end of the run.
pub struct RunIgRun;

impl<'f> ControllerState<StandState, Sequencer<'f>> for RunIgRun {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        if let Some(fault) = aborts(seq) {
            return Some(fault);
        }

        let p = seq.ig_pressure();
        record_pressure(seq, p);

        let at_pressure_t = seq.ignition.at_pressure_t.unwrap_or(seq.state_enter_time());
        let t = elapsed(seq.now(), at_pressure_t);
        let ignition = &seq.config.ignition;
        let (spark_continue, grace, run_time) = (
            ignition.spark_continue_ms,
            ignition.pressure_grace_ms,
            ignition.run_time_ms,
        );

        if t <= spark_continue {
            seq.spark_run();
        } else {
            seq.output_on(OutputId::Spark, false);
        }

        if t <= grace {
            return Some(StandState::RunIgRun);
        }

        let good = p >= seq.config.pressure.good;
        if good && t <= run_time {
            return Some(StandState::RunIgRun);
        }

        seq.ignition.stop_good = good;
        seq.ignition.end_t = seq.now();
        Some(StandState::IgRunReport)
    }

    fn enter_state(&mut self, seq: &mut Sequencer<'f>) {
        run_enter(seq);
    }

    fn exit_state(&mut self, seq: &mut Sequencer<'f>) {
        run_exit(seq);
    }
}
