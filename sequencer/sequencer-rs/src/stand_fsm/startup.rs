use log::info;
use stand_core::ControllerState;

use crate::{io_table::OutputId, Sequencer};

use super::StandState;

pub struct Startup;

impl<'f> ControllerState<StandState, Sequencer<'f>> for Startup {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        info!("Stand controller up at {} ms", seq.now());
        Some(StandState::Menu)
    }

    fn enter_state(&mut self, _seq: &mut Sequencer<'f>) {
        // Nothing
    }

    fn exit_state(&mut self, seq: &mut Sequencer<'f>) {
        seq.output_on(OutputId::RedLed, false);
        seq.output_on(OutputId::PowerLed, true);
    }
}
