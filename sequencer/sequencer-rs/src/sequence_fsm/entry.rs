use log::info;
use stand_core::ControllerState;

use crate::{
    events::EventCode,
    io_table::{InputId, OutputId},
    joystick::Joystick,
    stand_fsm::StandState,
    Sequencer,
};

use super::{pressure_faults, safe_ok};

/// Armed and waiting for the fire command. The first remote command line is
/// echoed to DAQ 0 and runs the spark while held.
pub struct SequenceEntry;

impl<'f> ControllerState<StandState, Sequencer<'f>> for SequenceEntry {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        if seq.joystick() == Joystick::Press {
            return Some(StandState::Menu);
        }

        let spark_test = seq.is_active(InputId::Cmd1);
        seq.output_on(OutputId::Daq0, spark_test);
        if spark_test {
            seq.spark_run();
        } else {
            seq.output_on(OutputId::Spark, false);
        }

        seq.output_on(OutputId::GreenLed, false);
        seq.output_on(OutputId::AmberLed, false);
        seq.output_on(OutputId::RedLed, true);

        if let Some(fault) = pressure_faults(seq, false) {
            return Some(fault);
        }

        if !seq.power_ok() || !safe_ok(seq) {
            return Some(StandState::SequenceEntry);
        }

        seq.output_on(OutputId::GreenLed, true);
        seq.output_on(OutputId::RedLed, false);

        if seq.is_active(InputId::Cmd2) {
            info!("Main sequence fired");
            let (ig_zero, main_zero) = (seq.config.pressure.ig_zero, seq.config.pressure.main_zero);

            seq.events.enable();
            seq.event(EventCode::IgZero, ig_zero as u16);
            seq.event(EventCode::MainZero, main_zero as u16);
            // The running phases abort on a new rising edge.
            seq.input_mut(InputId::Cmd2).clear_edge();

            return Some(StandState::SequenceIgLight);
        }

        Some(StandState::SequenceEntry)
    }

    fn enter_state(&mut self, seq: &mut Sequencer<'f>) {
        seq.detach_main_valves();
        seq.input_mut(InputId::Cmd2).clear_edge();

        seq.faults.set_restart(Some(StandState::SequenceEntry));
        seq.events.disable();
    }

    fn exit_state(&mut self, seq: &mut Sequencer<'f>) {
        seq.output_on(OutputId::GreenLed, false);
        seq.output_on(OutputId::AmberLed, false);
        seq.output_on(OutputId::RedLed, true);
        seq.safe_igniter();
    }
}
