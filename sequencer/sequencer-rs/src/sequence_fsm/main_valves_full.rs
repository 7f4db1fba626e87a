use stand_core::{util::elapsed, ControllerState, Millis, OutputState};

use crate::{
    events::EventCode,
    faults::FaultCode,
    io_table::OutputId,
    main_valves::{MainValve, ValvePosition},
    stand_fsm::StandState,
    Sequencer,
};

use super::{aborts, phase_enter};

/// Phase 4: main valves full open for the burn, igniter N2O shut on schedule.
pub struct MainValvesFull {
    full_t: Millis,
}

impl<'f> ControllerState<StandState, Sequencer<'f>> for MainValvesFull {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        if let Some(fault) = aborts(seq) {
            return Some(fault);
        }

        if seq.config.sequence.ig_below_main_abort {
            if let Some((ig, main)) = ig_below_main(seq) {
                seq.event(EventCode::IgLessMain, ig as u16);
                seq.event(EventCode::IgLessMain, main as u16);
                return Some(seq.fault(FaultCode::IgTooLow, ig));
            }
        }

        let t = elapsed(seq.now(), self.full_t);
        let sequence = &seq.config.sequence;
        let (ig_n2o_close, run_time) = (sequence.ig_n2o_close_ms, sequence.main_run_time_ms);

        if t >= ig_n2o_close && seq.sequence.ig_n2o_on {
            seq.sequence.ig_n2o_on = false;
            seq.output_on(OutputId::N2oIgValve, false);
            seq.event(EventCode::IgN2oClose, 0);
        }

        if t >= run_time {
            return Some(StandState::SequenceReport);
        }

        Some(StandState::SequenceMainValvesFull)
    }

    fn enter_state(&mut self, seq: &mut Sequencer<'f>) {
        self.full_t = seq.now();

        phase_enter(seq, 4);
        seq.output_on(OutputId::IpaIgValve, true);
        seq.output_on(OutputId::N2oIgValve, true);
        seq.sequence.ig_n2o_on = true;

        seq.faults.set_restartable(false);
        seq.event(EventCode::MvFull, 0);
        seq.set_main_valve(MainValve::N2o, ValvePosition::Open);
        seq.set_main_valve(MainValve::Ipa, ValvePosition::Open);
    }

    fn exit_state(&mut self, seq: &mut Sequencer<'f>) {
        seq.output_on(OutputId::Daq0, true);
        seq.output_on(OutputId::Daq1, false);
        seq.event(EventCode::IgIpaClose, 0);
        seq.event(EventCode::SequenceDone, 0);

        seq.output_on(OutputId::IpaIgValve, false);
        seq.output_on(OutputId::N2oIgValve, false);
        seq.output_on(OutputId::Spark, false);
        seq.close_main_valves();

        seq.output_on(OutputId::GreenLed, false);
        seq.set_output(OutputId::AmberLed, OutputState::PulseOn);
        seq.output_on(OutputId::RedLed, false);
    }
}

impl MainValvesFull {
    pub fn new() -> Self {
        Self { full_t: 0 }
    }
}

/// Zero-corrected igniter and chamber pressures if the igniter has fallen too
/// far below the chamber. Low chamber readings are not compared, so a burn
/// running out of propellant does not trip it.
fn ig_below_main(seq: &Sequencer) -> Option<(u32, u32)> {
    let pressure = &seq.config.pressure;
    let ig = seq.ig_pressure().saturating_sub(pressure.ig_zero);
    let main = seq.main_pressure().saturating_sub(pressure.main_zero);

    if main <= 2 * pressure.delta_allowed {
        return None;
    }

    (ig + pressure.delta_allowed < main).then_some((ig, main))
}
