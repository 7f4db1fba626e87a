use log::warn;
use stand_core::{util::elapsed, ControllerState, Millis};

use crate::{
    events::EventCode,
    faults::FaultCode,
    io_table::OutputId,
    main_valves::{MainValve, ValvePosition},
    stand_fsm::StandState,
    Sequencer,
};

use super::{aborts, ig_pressure_low, main_pressure_low, phase_enter, phase_exit};

/// Phase 3: open the main valves part way and wait for the chamber to light.
pub struct MainValvesStart {
    close_on_exit: bool,
    ipa_open: bool,
    n2o_open: bool,
    main_good: bool,
    main_good_t: Millis,
}

impl<'f> ControllerState<StandState, Sequencer<'f>> for MainValvesStart {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        if let Some(fault) = aborts(seq) {
            return Some(fault);
        }

        let now = seq.now();
        let p = seq.ig_pressure();
        if ig_pressure_low(seq, p) {
            seq.event(EventCode::IgFail2, p as u16);
            return Some(seq.fault(FaultCode::IgFlameOut, p));
        }

        let p = seq.main_pressure();
        if main_pressure_low(seq, p) {
            if self.main_good {
                seq.event(EventCode::MainPartialNak, p as u16);
                self.main_good = false;
            }
        } else if !self.main_good {
            seq.event(EventCode::MainPartialOk, p as u16);
            self.main_good = true;
            self.main_good_t = now;
        } else if elapsed(now, self.main_good_t) >= seq.config.sequence.main_stable_ms {
            self.close_on_exit = false;
            return Some(StandState::SequenceMainValvesFull);
        }

        let sequence = &seq.config.sequence;
        let (timeout, ipa_open, n2o_open, abort_on_no_main) = (
            sequence.main_pressure_timeout_ms,
            sequence.main_ipa_open_ms,
            sequence.main_n2o_open_ms,
            sequence.abort_on_no_main,
        );

        let t = elapsed(now, seq.sequence.stable_t);
        if t >= timeout {
            seq.event(EventCode::MainFail0, p as u16);
            if abort_on_no_main {
                return Some(seq.fault(FaultCode::SeqNoMain, p));
            }

            warn!("Chamber pressure not seen, going to full open");
            seq.event(EventCode::MainPartialOk, p as u16);
            self.close_on_exit = false;
            return Some(StandState::SequenceMainValvesFull);
        }

        if !self.ipa_open && t >= ipa_open {
            self.ipa_open = true;
            seq.event(EventCode::MvIpaStart, 0);
            seq.set_main_valve(MainValve::Ipa, ValvePosition::Partial);
            seq.faults.set_restartable(false);
        }

        if !self.n2o_open && t >= n2o_open {
            self.n2o_open = true;
            seq.event(EventCode::MvN2oStart, 0);
            seq.set_main_valve(MainValve::N2o, ValvePosition::Partial);
            seq.faults.set_restartable(false);
        }

        Some(StandState::SequenceMainValvesStart)
    }

    fn enter_state(&mut self, seq: &mut Sequencer<'f>) {
        *self = Self::new();
        self.main_good_t = seq.now();

        phase_enter(seq, 3);
        seq.output_on(OutputId::IpaIgValve, true);
        seq.output_on(OutputId::N2oIgValve, true);
    }

    fn exit_state(&mut self, seq: &mut Sequencer<'f>) {
        phase_exit(seq);
        if self.close_on_exit {
            seq.close_main_valves();
        }
    }
}

impl MainValvesStart {
    pub fn new() -> Self {
        Self {
            close_on_exit: true,
            ipa_open: false,
            n2o_open: false,
            main_good: false,
            main_good_t: 0,
        }
    }
}
