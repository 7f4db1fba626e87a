use stand_core::ControllerState;

use crate::{
    faults::FaultCode,
    io_table::{InputId, OutputId},
    joystick::Joystick,
    stand_fsm::StandState,
    Sequencer,
};

use super::safe_ok;

/// Where the "go" command comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoSource {
    /// Push button on the sequencer box.
    Local,
    /// Command line from the DAQ.
    Remote,
}

/// Waits for the stand to be ready and the operator to fire.
pub struct TestEntry {
    id: StandState,
    go: GoSource,
}

impl<'f> ControllerState<StandState, Sequencer<'f>> for TestEntry {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        let p = seq.ig_pressure();
        if !seq.pressure_sane(p) {
            return Some(seq.fault(FaultCode::IgPressureInsane, p));
        }

        let limits = &seq.config.pressure;
        if p < limits.min || p > limits.max_idle {
            return Some(seq.fault(FaultCode::IgNoPressure, p));
        }

        if seq.joystick() == Joystick::Press {
            return Some(StandState::Menu);
        }

        let ready = safe_ok(seq) && seq.power_ok();
        seq.output_on(OutputId::GreenLed, ready);
        seq.output_on(OutputId::AmberLed, !ready);

        let go = match self.go {
            GoSource::Local => seq.is_active(InputId::Push1),
            GoSource::Remote => seq.is_active(InputId::Cmd1),
        };

        if ready && go {
            return Some(StandState::RunStart);
        }

        Some(self.id)
    }

    fn enter_state(&mut self, seq: &mut Sequencer<'f>) {
        seq.ignition.return_state = Some(self.id);
        seq.faults.set_restart(Some(self.id));

        seq.safe_igniter();
        seq.output_on(OutputId::AmberLed, true);
        seq.output_on(OutputId::GreenLed, false);
        seq.output_on(OutputId::RedLed, false);
    }

    fn exit_state(&mut self, _seq: &mut Sequencer<'f>) {
        // Nothing
    }
}

impl TestEntry {
    pub fn new(id: StandState, go: GoSource) -> Self {
        Self { id, go }
    }
}
