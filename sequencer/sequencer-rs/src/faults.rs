use log::warn;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::stand_fsm::StandState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, IntoStaticStr, Display)]
#[repr(u8)]
pub enum FaultCode {
    IgTestAborted = 1,
    IgTestSafe,
    IgTestPower,
    IgPressureInsane,
    IgNoPressure,
    IgNoIgnition,
    IgFlameOut,
    IgTooLow,
    MainPressureInsane,
    MainNoPressure,
    SeqOpAbort,
    SeqSafe,
    SeqPower,
    SeqNoMain,
}

impl FaultCode {
    pub fn message(self) -> &'static str {
        match self {
            FaultCode::IgTestAborted => "ignition test aborted by operator",
            FaultCode::IgTestSafe => "ignition test aborted by safe switch",
            FaultCode::IgTestPower => "ignition test aborted on power loss",
            FaultCode::IgPressureInsane => "igniter pressure sensor out of range",
            FaultCode::IgNoPressure => "igniter pressure outside limits",
            FaultCode::IgNoIgnition => "no ignition",
            FaultCode::IgFlameOut => "igniter flame out",
            FaultCode::IgTooLow => "igniter pressure below chamber pressure",
            FaultCode::MainPressureInsane => "chamber pressure sensor out of range",
            FaultCode::MainNoPressure => "chamber pressure outside limits",
            FaultCode::SeqOpAbort => "sequence aborted by operator",
            FaultCode::SeqSafe => "sequence aborted by safe switch",
            FaultCode::SeqPower => "sequence aborted on power loss",
            FaultCode::SeqNoMain => "chamber did not come up to pressure",
        }
    }
}

/// The fault being displayed by the fault state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFault {
    pub code: FaultCode,
    /// Reading or elapsed time that tripped the fault.
    pub value: u16,
    pub restartable: bool,
}

/// Fault bookkeeping and restart policy.
///
/// States that can be retried register themselves with `set_restart`.
/// Restartability is dropped once a run does something that cannot be
/// retried, and a second consecutive fault with the same code is never
/// restartable.
#[derive(Debug, Default)]
pub struct FaultTracker {
    pending: Option<(FaultCode, u16)>,
    restart_state: Option<StandState>,
    restartable: bool,
    last_code: Option<FaultCode>,
    active: Option<ActiveFault>,
}

impl FaultTracker {
    pub const fn new() -> Self {
        Self {
            pending: None,
            restart_state: None,
            restartable: false,
            last_code: None,
            active: None,
        }
    }

    pub fn raise(&mut self, code: FaultCode, value: u16) {
        warn!("Fault {}: {} ({})", code as u8, code.message(), value);
        self.pending = Some((code, value));
    }

    pub fn set_restart(&mut self, state: Option<StandState>) {
        self.restart_state = state;
        self.restartable = state.is_some();
    }

    pub fn set_restartable(&mut self, restartable: bool) {
        self.restartable = restartable && self.restart_state.is_some();
    }

    /// Forgets the previous fault code, so the next fault is judged fresh.
    pub fn clear_history(&mut self) {
        self.last_code = None;
    }

    /// Moves the pending fault to active and decides whether it may restart.
    pub fn activate(&mut self) -> Option<ActiveFault> {
        let (code, value) = self.pending.take()?;
        let repeated = self.last_code == Some(code);
        self.last_code = Some(code);

        let fault = ActiveFault {
            code,
            value,
            restartable: self.restartable && !repeated,
        };
        self.active = Some(fault);

        Some(fault)
    }

    pub fn active(&self) -> Option<ActiveFault> {
        self.active
    }

    pub fn restart_state(&self) -> Option<StandState> {
        self.restart_state
    }
}
