use log::{error, warn};
use stand_core::{ControllerState, Edge, EntryPhase};

use crate::{
    events::EventCode,
    io_table::{InputId, OutputId},
    joystick::Joystick,
    Sequencer,
};

use super::StandState;

/// Shows the active fault until the operator dismisses or restarts it.
pub struct Fault {
    phase: EntryPhase,
}

impl<'f> ControllerState<StandState, Sequencer<'f>> for Fault {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        if self.phase == EntryPhase::Entering {
            self.phase = EntryPhase::Active;

            if let Some(fault) = seq.active_fault() {
                warn!(
                    "Fault display: {} value={} restartable={}",
                    fault.code.message(),
                    fault.value,
                    fault.restartable
                );
            }
            if let Err(err) = seq.commit_events() {
                error!("Could not save event log: {}", err);
            }

            return Some(StandState::Fault);
        }

        let restart = seq
            .active_fault()
            .filter(|fault| fault.restartable)
            .and_then(|_| seq.faults.restart_state());

        if seq.joystick() == Joystick::Press {
            return Some(restart.unwrap_or(StandState::Menu));
        }

        if let Some(restart) = restart {
            if seq.input(InputId::Cmd1).edge() == Edge::Rising {
                seq.input_mut(InputId::Cmd1).clear_edge();
                return Some(restart);
            }
        }

        Some(StandState::Fault)
    }

    fn enter_state(&mut self, seq: &mut Sequencer<'f>) {
        self.phase = EntryPhase::Entering;

        let code = seq.faults.activate().map(|fault| fault.code as u16);
        if let Some(code) = code {
            seq.event(EventCode::Fault, code);
        }

        seq.output_on(OutputId::RedLed, true);
        seq.output_on(OutputId::AmberLed, false);
        seq.output_on(OutputId::GreenLed, false);
        seq.output_on(OutputId::Daq0, false);
        seq.output_on(OutputId::Daq1, false);

        seq.input_mut(InputId::Cmd1).clear_edge();
    }

    fn exit_state(&mut self, seq: &mut Sequencer<'f>) {
        seq.output_on(OutputId::RedLed, false);
        seq.output_on(OutputId::AmberLed, true);
        seq.output_on(OutputId::GreenLed, false);
        seq.output_on(OutputId::Daq1, false);
    }
}

impl Fault {
    pub fn new() -> Self {
        Self {
            phase: EntryPhase::Entering,
        }
    }
}
