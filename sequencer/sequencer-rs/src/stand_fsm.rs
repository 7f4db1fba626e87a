use serde::{Deserialize, Serialize};
use stand_core::{ControllerFsm, ControllerState};
use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter, EnumString, IntoStaticStr};

use crate::{
    ignition_fsm::{
        ig_press::RunIgPress, ig_run::RunIgRun, report::IgRunReport, run_start::RunStart,
        test_entry::{GoSource, TestEntry},
    },
    sequence_fsm::{
        entry::SequenceEntry, ig_light::SequenceIgLight, ig_pressure::SequenceIgPressure,
        main_valves_full::MainValvesFull, main_valves_start::MainValvesStart,
        report::SequenceReport,
    },
    Sequencer,
};

pub mod fault;
pub mod menu;
pub mod startup;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    EnumCountMacro, EnumIter, EnumString, IntoStaticStr, Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum StandState {
    Startup,
    Menu,
    IgLocalTest,
    IgRemoteTest,
    RunStart,
    RunIgPress,
    RunIgRun,
    IgRunReport,
    SequenceEntry,
    SequenceIgLight,
    SequenceIgPressure,
    SequenceMainValvesStart,
    SequenceMainValvesFull,
    SequenceReport,
    Fault,
}

/// Every state of the stand, built once and addressed by `StandState`.
pub struct StandFsm {
    startup: startup::Startup,
    menu: menu::Menu,
    ig_local_test: TestEntry,
    ig_remote_test: TestEntry,
    run_start: RunStart,
    run_ig_press: RunIgPress,
    run_ig_run: RunIgRun,
    ig_run_report: IgRunReport,
    sequence_entry: SequenceEntry,
    sequence_ig_light: SequenceIgLight,
    sequence_ig_pressure: SequenceIgPressure,
    sequence_main_valves_start: MainValvesStart,
    sequence_main_valves_full: MainValvesFull,
    sequence_report: SequenceReport,
    fault: fault::Fault,
}

impl StandFsm {
    pub fn new() -> Self {
        Self {
            startup: startup::Startup,
            menu: menu::Menu::new(),
            ig_local_test: TestEntry::new(StandState::IgLocalTest, GoSource::Local),
            ig_remote_test: TestEntry::new(StandState::IgRemoteTest, GoSource::Remote),
            run_start: RunStart,
            run_ig_press: RunIgPress,
            run_ig_run: RunIgRun,
            ig_run_report: IgRunReport,
            sequence_entry: SequenceEntry,
            sequence_ig_light: SequenceIgLight::new(),
            sequence_ig_pressure: SequenceIgPressure::new(),
            sequence_main_valves_start: MainValvesStart::new(),
            sequence_main_valves_full: MainValvesFull::new(),
            sequence_report: SequenceReport::new(),
            fault: fault::Fault::new(),
        }
    }

    pub fn menu_mut(&mut self) -> &mut menu::Menu {
        &mut self.menu
    }

    pub fn menu(&self) -> &menu::Menu {
        &self.menu
    }
}

impl Default for StandFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ControllerFsm<StandState, Sequencer<'a>> for StandFsm {
    fn to_controller_state(&mut self, state: StandState) -> &mut dyn ControllerState<StandState, Sequencer<'a>> {
        match state {
            StandState::Startup => &mut self.startup,
            StandState::Menu => &mut self.menu,
            StandState::IgLocalTest => &mut self.ig_local_test,
            StandState::IgRemoteTest => &mut self.ig_remote_test,
            StandState::RunStart => &mut self.run_start,
            StandState::RunIgPress => &mut self.run_ig_press,
            StandState::RunIgRun => &mut self.run_ig_run,
            StandState::IgRunReport => &mut self.ig_run_report,
            StandState::SequenceEntry => &mut self.sequence_entry,
            StandState::SequenceIgLight => &mut self.sequence_ig_light,
            StandState::SequenceIgPressure => &mut self.sequence_ig_pressure,
            StandState::SequenceMainValvesStart => &mut self.sequence_main_valves_start,
            StandState::SequenceMainValvesFull => &mut self.sequence_main_valves_full,
            StandState::SequenceReport => &mut self.sequence_report,
            StandState::Fault => &mut self.fault,
        }
    }
}
