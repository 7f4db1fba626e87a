#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

pub mod event_log;
pub mod input;
pub mod ladder;
pub mod output;
pub mod registry;
pub mod stand_hal;
pub mod stand_mock;
pub mod util;

use core::{fmt, marker::PhantomData};

pub use event_log::{EventLog, EventRecord, EventStore, LogError, MemoryEventStore};
pub use input::Input;
pub use output::{Actuation, Output};
pub use registry::{IoError, IoRegistry};
pub use stand_hal::{Edge, InputMode, OutputMode, OutputState, PinId, StandDriver};

/// Milliseconds since boot, as returned by the board clock. Wraps after ~49 days.
pub type Millis = u32;

/// One lifecycle-managed state of a controller.
///
/// `check` runs once per loop while the state is current and returns the
/// identifier of the state that should be current afterwards. Returning the
/// state's own identifier keeps it active without running `exit_state` or
/// `enter_state`. Returning `None` is a programming error and halts the
/// controller.
pub trait ControllerState<S, C> {
    fn check(&mut self, controller: &mut C) -> Option<S>;
    fn enter_state(&mut self, controller: &mut C);
    fn exit_state(&mut self, controller: &mut C);
}

/// Resolves a stable state identifier to the state object that implements it.
pub trait ControllerFsm<S, C> {
    fn to_controller_state(&mut self, state: S) -> &mut dyn ControllerState<S, C>;
}

/// Notified between the old state's exit and the new state's enter.
pub trait StateObserver<S> {
    fn state_changed(&mut self, old_state: Option<S>, new_state: S);
}

/// Splits a state's first `check` from the rest, so expensive entry work can
/// be moved out of `enter_state` without blocking the loop that entered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryPhase {
    #[default]
    Entering,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmError<S> {
    NoNextState(S),
}

impl<S: fmt::Debug> fmt::Display for FsmError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsmError::NoNextState(state) => write!(f, "state {:?} returned no next state", state),
        }
    }
}

impl<S: fmt::Debug> core::error::Error for FsmError<S> {}

pub struct ControllerEntity<F, S, C> {
    states: F,
    current_state: S,
    _controller_marker: PhantomData<C>,
}

impl<F, S, C> ControllerEntity<F, S, C>
where
    F: ControllerFsm<S, C>,
    S: Copy + PartialEq,
    C: StateObserver<S>,
{
    pub fn new(controller: &mut C, states: F, initial_state: S) -> Self {
        let mut controller_fsm = Self {
            states,
            current_state: initial_state,
            _controller_marker: PhantomData,
        };

        controller.state_changed(None, initial_state);
        controller_fsm
            .states
            .to_controller_state(initial_state)
            .enter_state(controller);

        controller_fsm
    }

    /// Runs one check of the current state. Returns the newly entered state
    /// if a transition happened.
    pub fn update(&mut self, controller: &mut C) -> Result<Option<S>, FsmError<S>> {
        let current_state = self.current_state;
        let new_state = self
            .states
            .to_controller_state(current_state)
            .check(controller)
            .ok_or(FsmError::NoNextState(current_state))?;

        if new_state == current_state {
            return Ok(None);
        }

        self.transition_state(controller, current_state, new_state);

        Ok(Some(new_state))
    }

    fn transition_state(&mut self, controller: &mut C, old_state: S, new_state: S) {
        self.states
            .to_controller_state(old_state)
            .exit_state(controller);

        self.current_state = new_state;
        controller.state_changed(Some(old_state), new_state);

        self.states
            .to_controller_state(new_state)
            .enter_state(controller);
    }

    pub fn current_state(&self) -> S {
        self.current_state
    }

    pub fn states(&self) -> &F {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut F {
        &mut self.states
    }
}
