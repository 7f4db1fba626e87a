use stand_core::{util::elapsed, ControllerState};

use crate::{io_table::OutputId, stand_fsm::StandState, Sequencer};

use super::{aborts, run_exit};

/// Brings up spark and igniter propellants at their offsets from the
/// commanded start.
pub struct RunStart;

impl<'f> ControllerState<StandState, Sequencer<'f>> for RunStart {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        if let Some(fault) = aborts(seq) {
            return Some(fault);
        }

        let t = elapsed(seq.now(), seq.ignition.test_start_t);
        let ignition = &seq.config.ignition;
        let (spark, n2o, ipa) = (
            t >= ignition.spark_start_ms,
            t >= ignition.n2o_start_ms,
            t >= ignition.ipa_start_ms,
        );

        if spark {
            seq.spark_run();
        }
        if n2o {
            seq.output_on(OutputId::N2oIgValve, true);
        }
        if ipa {
            seq.output_on(OutputId::IpaIgValve, true);
        }

        if spark && n2o && ipa {
            return Some(StandState::RunIgPress);
        }

        Some(StandState::RunStart)
    }

    fn enter_state(&mut self, seq: &mut Sequencer<'f>) {
        let now = seq.now();
        seq.ignition.start(now);
        seq.ignition.report = None;
        seq.reset_spark();

        seq.close_main_valves();
        run_exit(seq);
        seq.output_on(OutputId::Daq0, true);
    }

    fn exit_state(&mut self, seq: &mut Sequencer<'f>) {
        run_exit(seq);
    }
}
