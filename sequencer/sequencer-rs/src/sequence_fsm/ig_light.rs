use stand_core::{util::elapsed, ControllerState, EntryPhase, OutputState};

use crate::{
    events::EventCode,
    io_table::OutputId,
    main_valves::{MainValve, ValvePosition},
    stand_fsm::StandState,
    Sequencer,
};

use super::{aborts, phase_enter, phase_exit};

/// Phase 1: igniter propellants and spark come on at their offsets, and the
/// main valves are cracked to take up linkage slack.
pub struct SequenceIgLight {
    phase: EntryPhase,
    ipa_on: bool,
    n2o_on: bool,
    spark_on: bool,
    cracked: bool,
}

impl<'f> ControllerState<StandState, Sequencer<'f>> for SequenceIgLight {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        if let Some(fault) = aborts(seq) {
            return Some(fault);
        }

        if self.phase == EntryPhase::Entering {
            self.phase = EntryPhase::Active;

            seq.event(EventCode::IgStart, 0);
            seq.sequence.sequence_t = seq.now();
            seq.reset_spark();
            // Already closed; this attaches and powers the servos.
            seq.close_main_valves();

            return Some(StandState::SequenceIgLight);
        }

        let t = elapsed(seq.now(), seq.sequence.sequence_t);
        let ignition = &seq.config.ignition;
        let (ipa_start, n2o_start, spark_start) =
            (ignition.ipa_start_ms, ignition.n2o_start_ms, ignition.spark_start_ms);

        if !self.cracked && t >= seq.config.sequence.crack_ms {
            self.cracked = true;
            seq.event(EventCode::MvSlack, 0);
            seq.set_main_valve(MainValve::Ipa, ValvePosition::Cracked);
            seq.set_main_valve(MainValve::N2o, ValvePosition::Cracked);
        }

        if !self.ipa_on && t >= ipa_start {
            self.ipa_on = true;
            seq.event(EventCode::IgIpa, 0);
            seq.output_on(OutputId::IpaIgValve, true);
        }

        if !self.n2o_on && t >= n2o_start {
            self.n2o_on = true;
            seq.sequence.ig_n2o_on = true;
            seq.event(EventCode::IgN2o, 0);
            seq.output_on(OutputId::N2oIgValve, true);
        }

        if t >= spark_start {
            if !self.spark_on {
                self.spark_on = true;
                seq.event(EventCode::IgSpark, 0);
            }
            seq.spark_run();
        }

        if self.ipa_on && self.n2o_on && self.spark_on {
            return Some(StandState::SequenceIgPressure);
        }

        Some(StandState::SequenceIgLight)
    }

    fn enter_state(&mut self, seq: &mut Sequencer<'f>) {
        *self = Self::new();

        seq.set_output(OutputId::GreenLed, OutputState::PulseOn);
        seq.output_on(OutputId::AmberLed, true);
        seq.output_on(OutputId::RedLed, false);
        phase_enter(seq, 1);

        seq.output_on(OutputId::IpaIgValve, false);
        seq.output_on(OutputId::N2oIgValve, false);
        seq.sequence.ig_n2o_on = false;
    }

    fn exit_state(&mut self, seq: &mut Sequencer<'f>) {
        phase_exit(seq);
    }
}

impl SequenceIgLight {
    pub fn new() -> Self {
        Self {
            phase: EntryPhase::Entering,
            ipa_on: false,
            n2o_on: false,
            spark_on: false,
            cracked: false,
        }
    }
}
