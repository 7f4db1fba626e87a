#![cfg_attr(not(any(test, feature = "sil")), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod debug_console;
pub mod events;
pub mod faults;
pub mod ignition_fsm;
pub mod io_table;
pub mod joystick;
pub mod main_valves;
pub mod sequence_fsm;
pub mod sequencer;
pub mod stand_fsm;

pub use config::SequencerConfig;
pub use sequencer::{Sequencer, SequencerError};
pub use stand_fsm::StandState;
