use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, IntoStaticStr};

/// Codes recorded into the event log during a main sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, IntoStaticStr, Display)]
#[repr(u8)]
pub enum EventCode {
    IgZero = 1,
    MainZero,
    IgStart,
    MvSlack,
    IgIpa,
    IgN2o,
    IgSpark,
    IgPressOk,
    IgPressNak,
    IgPressStable,
    IgSparkOff,
    IgStable,
    /// Flame-out after the spark went off.
    IgFail0,
    /// No stable ignition before the timeout.
    IgFail1,
    /// Flame-out while the main valves were opening.
    IgFail2,
    MainPartialOk,
    MainPartialNak,
    MainFail0,
    MvIpaStart,
    MvN2oStart,
    MvFull,
    IgN2oClose,
    IgIpaClose,
    IgLessMain,
    SequenceDone,
    /// Parameter: 1 operator, 2 safe switch, 3 power.
    OpAbort,
    IgPressFail,
    MainPressFail,
    /// Parameter: fault code.
    Fault,
}

pub const ABORT_OPERATOR: u16 = 1;
pub const ABORT_SAFE: u16 = 2;
pub const ABORT_POWER: u16 = 3;
