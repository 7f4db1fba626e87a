use stand_core::{util::elapsed, ControllerState, Millis};

use crate::{
    events::EventCode,
    faults::FaultCode,
    io_table::OutputId,
    stand_fsm::StandState,
    Sequencer,
};

use super::{aborts, ig_pressure_low, phase_enter, phase_exit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressPhase {
    NoPressure,
    /// At pressure with the spark still running.
    StableSpark,
    /// At pressure with the spark off.
    StableNoSpark,
}

/// Phase 2: wait for igniter pressure, then prove it holds with and without
/// the spark.
pub struct SequenceIgPressure {
    phase: PressPhase,
    phase_t: Millis,
}

impl<'f> ControllerState<StandState, Sequencer<'f>> for SequenceIgPressure {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        if let Some(fault) = aborts(seq) {
            return Some(fault);
        }

        let now = seq.now();
        let p = seq.ig_pressure();
        let good = !ig_pressure_low(seq, p);
        let sequence = &seq.config.sequence;
        let (stable_spark, stable_no_spark) = (sequence.stable_spark_ms, sequence.stable_no_spark_ms);

        match self.phase {
            PressPhase::NoPressure => {
                seq.spark_run();
                if good {
                    seq.event(EventCode::IgPressOk, p as u16);
                    self.enter_phase(PressPhase::StableSpark, now);
                }
            }
            PressPhase::StableSpark => {
                seq.spark_run();
                if !good {
                    seq.event(EventCode::IgPressNak, p as u16);
                    self.enter_phase(PressPhase::NoPressure, now);
                } else if elapsed(now, self.phase_t) >= stable_spark {
                    seq.event(EventCode::IgPressStable, p as u16);
                    seq.event(EventCode::IgSparkOff, 0);
                    seq.output_on(OutputId::Spark, false);
                    self.enter_phase(PressPhase::StableNoSpark, now);
                }
            }
            PressPhase::StableNoSpark => {
                if !good {
                    seq.event(EventCode::IgPressNak, p as u16);
                    seq.event(EventCode::IgFail0, 0);
                    return Some(seq.fault(FaultCode::IgFlameOut, p));
                } else if elapsed(now, self.phase_t) >= stable_no_spark {
                    seq.sequence.stable_t = now;
                    seq.event(EventCode::IgStable, p as u16);
                    return Some(StandState::SequenceMainValvesStart);
                }
            }
        }

        if seq.time_in_state() > seq.config.ignition.pressure_timeout_ms {
            seq.event(EventCode::IgFail1, p as u16);
            return Some(seq.fault(FaultCode::IgNoIgnition, seq.time_in_state()));
        }

        Some(StandState::SequenceIgPressure)
    }

    fn enter_state(&mut self, seq: &mut Sequencer<'f>) {
        self.enter_phase(PressPhase::NoPressure, seq.now());

        phase_enter(seq, 2);
        seq.output_on(OutputId::IpaIgValve, true);
        seq.output_on(OutputId::N2oIgValve, true);
    }

    fn exit_state(&mut self, seq: &mut Sequencer<'f>) {
        phase_exit(seq);
    }
}

impl SequenceIgPressure {
    pub fn new() -> Self {
        Self {
            phase: PressPhase::NoPressure,
            phase_t: 0,
        }
    }

    fn enter_phase(&mut self, phase: PressPhase, now: Millis) {
        self.phase = phase;
        self.phase_t = now;
    }
}
