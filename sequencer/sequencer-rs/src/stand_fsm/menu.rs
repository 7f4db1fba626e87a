use stand_core::ControllerState;

use crate::{io_table::OutputId, joystick::Joystick, Sequencer};

use super::StandState;

pub struct MenuItem {
    pub label: &'static str,
    pub target: StandState,
}

pub const MENU_ITEMS: [MenuItem; 3] = [
    MenuItem {
        label: "Ignition Local",
        target: StandState::IgLocalTest,
    },
    MenuItem {
        label: "Ignition Remote",
        target: StandState::IgRemoteTest,
    },
    MenuItem {
        label: "Main Sequence",
        target: StandState::SequenceEntry,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuPhase {
    /// The stick is still deflected from whatever led here.
    WaitRelease,
    Idle,
}

pub struct Menu {
    phase: MenuPhase,
    selection: usize,
}

impl<'f> ControllerState<StandState, Sequencer<'f>> for Menu {
    fn check(&mut self, seq: &mut Sequencer<'f>) -> Option<StandState> {
        let held = seq.joystick_held();

        if self.phase == MenuPhase::WaitRelease {
            if held == Joystick::None {
                self.phase = MenuPhase::Idle;
            }
            return Some(StandState::Menu);
        }

        match held {
            Joystick::Press => return MENU_ITEMS.get(self.selection).map(|item| item.target),
            Joystick::Up => {
                self.selection = self.selection.checked_sub(1).unwrap_or(MENU_ITEMS.len() - 1);
                self.phase = MenuPhase::WaitRelease;
            }
            Joystick::Down => {
                self.selection = (self.selection + 1) % MENU_ITEMS.len();
                self.phase = MenuPhase::WaitRelease;
            }
            _ => {}
        }

        Some(StandState::Menu)
    }

    fn enter_state(&mut self, seq: &mut Sequencer<'f>) {
        self.phase = MenuPhase::WaitRelease;
        self.selection = 0;

        seq.faults.set_restart(None);
        seq.faults.clear_history();

        seq.safe_igniter();
        seq.output_on(OutputId::GreenLed, false);
        seq.output_on(OutputId::AmberLed, false);
        seq.output_on(OutputId::RedLed, false);
        seq.output_on(OutputId::PowerLed, true);
        seq.detach_main_valves();
    }

    fn exit_state(&mut self, _seq: &mut Sequencer<'f>) {
        // Nothing
    }
}

impl Menu {
    pub fn new() -> Self {
        Self {
            phase: MenuPhase::WaitRelease,
            selection: 0,
        }
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    /// Moves the cursor without checking it against the menu table.
    pub fn select(&mut self, index: usize) {
        self.selection = index;
    }
}
