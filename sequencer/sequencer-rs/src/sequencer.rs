use core::fmt;

use log::{error, info};
use stand_core::{
    util::elapsed, ControllerEntity, Edge, EventLog, FsmError, Input, IoError, LogError, Millis,
    Output, OutputState, StandDriver, StateObserver,
};

use crate::{
    config::SequencerConfig,
    events::EventCode,
    faults::{ActiveFault, FaultCode, FaultTracker},
    ignition_fsm::{IgnitionReport, IgnitionRun},
    io_table::{self, InputId, OutputId, StandIo},
    joystick::Joystick,
    main_valves::{MainValve, MainValves, ValvePosition},
    sequence_fsm::SequenceRun,
    stand_fsm::{StandFsm, StandState},
};

pub const EVENT_LOG_SIZE: usize = 64;

pub type StandEventLog = EventLog<EventCode, EVENT_LOG_SIZE>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerError {
    /// The I/O tables failed validation. Nothing was configured or driven.
    InvalidIo(IoError),
    /// A state returned no next state. Outputs are safed and the loop is dead.
    NoNextState(StandState),
    Halted,
}

impl fmt::Display for SequencerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequencerError::InvalidIo(err) => write!(f, "invalid I/O table: {}", err),
            SequencerError::NoNextState(state) => write!(f, "state {} returned no next state", state),
            SequencerError::Halted => write!(f, "sequencer is halted"),
        }
    }
}

impl core::error::Error for SequencerError {}

impl From<IoError> for SequencerError {
    fn from(err: IoError) -> Self {
        SequencerError::InvalidIo(err)
    }
}

impl From<FsmError<StandState>> for SequencerError {
    fn from(err: FsmError<StandState>) -> Self {
        match err {
            FsmError::NoNextState(state) => SequencerError::NoNextState(state),
        }
    }
}

pub struct Sequencer<'a> {
    pub config: SequencerConfig,
    pub driver: &'a mut dyn StandDriver,
    pub io: StandIo,
    pub events: StandEventLog,
    pub faults: FaultTracker,
    pub main_valves: MainValves,
    pub ignition: IgnitionRun,
    pub sequence: SequenceRun,
    machine: Option<ControllerEntity<StandFsm, StandState, Sequencer<'a>>>,
    state: StandState,
    spark_bias: Millis,
    loop_start_t: Millis,
    state_enter_t: Millis,
    joystick: Joystick,
    last_log_sequence: Option<u16>,
    halted: bool,
}

impl<'a> Sequencer<'a> {
    /// Validates the I/O tables, configures every pin and enters `Startup`.
    /// A table that fails validation is never applied to the hardware.
    pub fn new(driver: &'a mut dyn StandDriver, config: SequencerConfig) -> Result<Self, SequencerError> {
        let io = io_table::build(&config);
        if let Err(err) = io.validate() {
            error!("I/O validation failed: {}", err);
            return Err(err.into());
        }

        let now = driver.millis();
        let mut sequencer = Self {
            config,
            driver,
            io,
            events: StandEventLog::new(),
            faults: FaultTracker::new(),
            main_valves: MainValves::new(),
            ignition: IgnitionRun::new(),
            sequence: SequenceRun::new(),
            machine: None,
            state: StandState::Startup,
            spark_bias: now,
            loop_start_t: now,
            state_enter_t: now,
            joystick: Joystick::None,
            last_log_sequence: None,
            halted: false,
        };

        sequencer.io.setup(sequencer.driver, now);
        sequencer.machine = Some(ControllerEntity::new(
            &mut sequencer,
            StandFsm::new(),
            StandState::Startup,
        ));

        Ok(sequencer)
    }

    /// Runs one control loop iteration. Returns the state entered during
    /// this iteration, if any.
    pub fn update(&mut self) -> Result<Option<StandState>, SequencerError> {
        if self.halted {
            return Err(SequencerError::Halted);
        }

        self.loop_start_t = self.driver.millis();
        self.io.sample_inputs(self.driver, self.loop_start_t);
        self.joystick = self.take_joystick_event();

        let Some(mut machine) = self.machine.take() else {
            return Err(SequencerError::Halted);
        };
        let result = machine.update(self);
        self.machine = Some(machine);

        match result {
            Ok(entered) => {
                self.io.update_outputs(self.driver, self.loop_start_t);
                Ok(entered)
            }
            Err(err) => {
                error!("Halting: {}", err);
                self.halt();
                Err(err.into())
            }
        }
    }

    fn take_joystick_event(&mut self) -> Joystick {
        let joystick = self.io.input_mut(InputId::Joystick.index());
        if joystick.take_edge() == Edge::None {
            return Joystick::None;
        }

        Joystick::from_level(joystick.value())
    }

    /// Drives every output to its off level and latches the fault lamp.
    fn halt(&mut self) {
        self.halted = true;
        self.io.drive_safe(self.driver);
        self.main_valves.detach(self.driver, &self.config.pins);

        let red = self.io.output(OutputId::RedLed.index());
        self.driver.digital_write(red.pin, !red.off_level());
    }

    pub fn state(&self) -> StandState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Loop start time of the current iteration.
    pub fn now(&self) -> Millis {
        self.loop_start_t
    }

    pub fn state_enter_time(&self) -> Millis {
        self.state_enter_t
    }

    pub fn time_in_state(&self) -> Millis {
        elapsed(self.loop_start_t, self.state_enter_t)
    }

    /// Joystick position newly accepted this iteration.
    pub fn joystick(&self) -> Joystick {
        self.joystick
    }

    /// Joystick position held right now.
    pub fn joystick_held(&self) -> Joystick {
        Joystick::from_level(self.input(InputId::Joystick).value())
    }

    pub fn input(&self, id: InputId) -> &Input {
        self.io.input(id.index())
    }

    pub fn input_mut(&mut self, id: InputId) -> &mut Input {
        self.io.input_mut(id.index())
    }

    pub fn output(&self, id: OutputId) -> &Output {
        self.io.output(id.index())
    }

    pub fn set_output(&mut self, id: OutputId, state: OutputState) {
        self.io.output_mut(id.index()).set(state);
    }

    pub fn output_on(&mut self, id: OutputId, on: bool) {
        self.io.output_mut(id.index()).set_on(on);
    }

    pub fn is_active(&self, id: InputId) -> bool {
        self.input(id).is_active()
    }

    /// Filtered igniter chamber pressure.
    pub fn ig_pressure(&self) -> u32 {
        self.input(InputId::IgPressure).filtered()
    }

    /// Filtered main chamber pressure.
    pub fn main_pressure(&self) -> u32 {
        self.input(InputId::MainPress).filtered()
    }

    pub fn power_ok(&self) -> bool {
        self.is_active(InputId::PowerSense)
    }

    /// True unless the reading points at a broken or disconnected sensor.
    pub fn pressure_sane(&self, pressure: u32) -> bool {
        pressure <= self.config.pressure.sane_max
    }

    /// True if the sensor is sane and the reading lies within operating limits.
    pub fn pressure_valid(&self, pressure: u32) -> bool {
        let limits = &self.config.pressure;
        self.pressure_sane(pressure) && pressure >= limits.min && pressure <= limits.max
    }

    /// Raises `code` and returns the fault state for `check` to transition to.
    pub fn fault(&mut self, code: FaultCode, value: u32) -> StandState {
        self.faults.raise(code, value.min(u16::MAX as u32) as u16);
        StandState::Fault
    }

    pub fn active_fault(&self) -> Option<ActiveFault> {
        self.faults.active()
    }

    pub fn event(&mut self, code: EventCode, param: u16) {
        self.events.record(code, param, self.loop_start_t);
    }

    /// Writes the event log to the board's store, if one is being recorded.
    pub fn commit_events(&mut self) -> Result<Option<u16>, LogError> {
        let sequence = self.events.commit(self.driver.event_store())?;
        if let Some(sequence) = sequence {
            info!("Event log committed as #{}", sequence);
            self.last_log_sequence = Some(sequence);
        }

        Ok(sequence)
    }

    pub fn last_log_sequence(&self) -> Option<u16> {
        self.last_log_sequence
    }

    /// Restarts the spark square wave at the current loop time.
    pub fn reset_spark(&mut self) {
        self.spark_bias = self.loop_start_t;
    }

    /// Drives the spark as a square wave locked to the last `reset_spark`.
    pub fn spark_run(&mut self) {
        let period = self.config.ignition.spark_period_ms.max(2);
        let phase = elapsed(self.loop_start_t, self.spark_bias) % period;
        self.output_on(OutputId::Spark, phase < period / 2);
    }

    /// Igniter valves, spark and DAQ lines off.
    pub fn safe_igniter(&mut self) {
        for id in [
            OutputId::IpaIgValve,
            OutputId::N2oIgValve,
            OutputId::Spark,
            OutputId::Daq0,
            OutputId::Daq1,
        ] {
            self.output_on(id, false);
        }
    }

    pub fn set_main_valve(&mut self, valve: MainValve, position: ValvePosition) {
        self.main_valves
            .set(self.driver, &self.config.valves, &self.config.pins, valve, position);
    }

    pub fn close_main_valves(&mut self) {
        self.main_valves
            .close_all(self.driver, &self.config.valves, &self.config.pins);
    }

    pub fn detach_main_valves(&mut self) {
        self.main_valves.detach(self.driver, &self.config.pins);
    }

    pub fn ignition_report(&self) -> Option<IgnitionReport> {
        self.ignition.report
    }

    pub fn menu_selection(&self) -> Option<usize> {
        self.machine.as_ref().map(|machine| machine.states().menu().selection())
    }
}

impl StateObserver<StandState> for Sequencer<'_> {
    fn state_changed(&mut self, old_state: Option<StandState>, new_state: StandState) {
        match old_state {
            Some(old_state) => info!("Leaving {}; entering {}", old_state, new_state),
            None => info!("Entering {}", new_state),
        }

        self.state = new_state;
        self.state_enter_t = self.loop_start_t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stand_core::stand_mock::StandDriverMock;

    use crate::stand_fsm::menu::MENU_ITEMS;

    fn mock<'s>(seq: &'s mut Sequencer) -> &'s mut StandDriverMock {
        seq.driver.as_mut_any().downcast_mut::<StandDriverMock>().unwrap()
    }

    fn step(seq: &mut Sequencer) -> Result<Option<StandState>, SequencerError> {
        mock(seq).advance(1);
        seq.update()
    }

    #[test]
    fn test_state_without_next_state_halts_the_loop() {
        let config = SequencerConfig::default();
        let pins = config.pins.clone();

        let mut driver = StandDriverMock::new();
        driver.set_analog(pins.joystick, 1023);
        let mut seq = Sequencer::new(&mut driver, config).unwrap();
        for _ in 0..50 {
            step(&mut seq).unwrap();
        }
        assert_eq!(seq.state(), StandState::Menu);

        // A cursor past the end of the table has nowhere to go.
        if let Some(machine) = seq.machine.as_mut() {
            machine.states_mut().menu_mut().select(MENU_ITEMS.len());
        }
        seq.output_on(OutputId::Spark, true);
        mock(&mut seq).set_analog(pins.joystick, 100);

        let mut result = Ok(None);
        for _ in 0..100 {
            result = step(&mut seq);
            if result.is_err() {
                break;
            }
        }

        assert_eq!(result, Err(SequencerError::NoNextState(StandState::Menu)));
        assert!(seq.is_halted());

        let driver = mock(&mut seq);
        assert_eq!(driver.pin_level(pins.spark), Some(false));
        assert_eq!(driver.pin_level(pins.power_led), Some(false));
        assert_eq!(driver.pin_level(pins.red_led), Some(true));
        assert_eq!(driver.servo_position(pins.ipa_servo), None);
        let writes = driver.write_count();

        assert_eq!(step(&mut seq), Err(SequencerError::Halted));
        assert_eq!(mock(&mut seq).write_count(), writes);
    }

    #[test]
    fn test_halt_safes_outputs_and_latches() {
        let mut driver = StandDriverMock::new();
        let mut seq = Sequencer::new(&mut driver, SequencerConfig::default()).unwrap();
        seq.update().unwrap();
        assert_eq!(seq.state(), StandState::Menu);

        seq.output_on(OutputId::Spark, true);
        seq.update().unwrap();
        seq.halt();

        assert!(seq.is_halted());
        assert_eq!(seq.update(), Err(SequencerError::Halted));

        let pins = seq.config.pins.clone();
        let driver = seq.driver.as_mut_any().downcast_mut::<StandDriverMock>().unwrap();
        let writes = driver.write_count();
        assert_eq!(driver.pin_level(pins.spark), Some(false));
        assert_eq!(driver.pin_level(pins.power_led), Some(false));
        assert_eq!(driver.pin_level(pins.red_led), Some(true));
        assert_eq!(driver.servo_position(pins.ipa_servo), None);

        driver.advance(10);
        assert_eq!(seq.update(), Err(SequencerError::Halted));
        let driver = seq.driver.as_mut_any().downcast_mut::<StandDriverMock>().unwrap();
        assert_eq!(driver.write_count(), writes);
    }
}
