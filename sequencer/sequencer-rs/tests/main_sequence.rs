mod common;

use common::*;
use sequencer_rs::{
    events::EventCode, faults::FaultCode, sequencer::StandEventLog, Sequencer, SequencerConfig,
    StandState,
};

fn short_run_config() -> SequencerConfig {
    let mut config = SequencerConfig::default();
    config.sequence.main_run_time_ms = 300;
    config
}

/// From the menu to the armed sequence entry screen.
fn fixture_sequence_entry(seq: &mut Sequencer) {
    settle(seq);
    select(seq, 2);
    assert_eq!(seq.state(), StandState::SequenceEntry);
    assert!(level(seq, GREEN_LED));
    assert!(!level(seq, RED_LED));
}

fn fire(seq: &mut Sequencer) {
    mock(seq).set_digital(CMD_2, false);
    run_until(seq, StandState::SequenceIgLight, 100);
    mock(seq).set_digital(CMD_2, true);
}

fn committed_events(seq: &mut Sequencer) -> Vec<EventCode> {
    let mut codes = Vec::new();
    StandEventLog::decode(mock(seq).store().image(), |record| codes.push(record.code)).unwrap();
    codes
}

#[test]
fn full_sequence_runs_to_report() {
    let mut driver = fixture_driver(Arming::Both);
    let mut seq = Sequencer::new(&mut driver, short_run_config()).unwrap();
    fixture_sequence_entry(&mut seq);
    fire(&mut seq);

    run_until(&mut seq, StandState::SequenceIgPressure, 300);
    assert_eq!(mock(&mut seq).servo_position(IPA_SERVO), Some(45));
    assert_eq!(mock(&mut seq).servo_position(N2O_SERVO), Some(21));
    assert!(level(&mut seq, IPA_IG_VALVE));
    assert!(level(&mut seq, N2O_IG_VALVE));
    assert!(!level(&mut seq, DAQ_0));
    assert!(!level(&mut seq, DAQ_1));

    mock(&mut seq).set_analog(IG_PRESSURE, PRESSURE_FIRING);
    run_until(&mut seq, StandState::SequenceMainValvesStart, 400);
    assert!(!level(&mut seq, SPARK));
    assert!(level(&mut seq, DAQ_1));

    run_for(&mut seq, 60);
    assert_eq!(seq.state(), StandState::SequenceMainValvesStart);
    assert_eq!(mock(&mut seq).servo_position(IPA_SERVO), Some(87));
    assert_eq!(mock(&mut seq).servo_position(N2O_SERVO), Some(67));

    mock(&mut seq).set_analog(MAIN_PRESS, PRESSURE_FIRING);
    run_until(&mut seq, StandState::SequenceMainValvesFull, 100);
    assert_eq!(mock(&mut seq).servo_position(IPA_SERVO), Some(134));
    assert_eq!(mock(&mut seq).servo_position(N2O_SERVO), Some(110));
    assert!(!level(&mut seq, DAQ_0));
    assert!(!level(&mut seq, DAQ_1));

    run_for(&mut seq, 60);
    assert!(level(&mut seq, IPA_IG_VALVE));
    assert!(!level(&mut seq, N2O_IG_VALVE));

    run_until(&mut seq, StandState::SequenceReport, 300);
    assert_eq!(mock(&mut seq).servo_position(IPA_SERVO), Some(44));
    assert_eq!(mock(&mut seq).servo_position(N2O_SERVO), Some(20));
    assert!(!level(&mut seq, IPA_IG_VALVE));
    assert!(level(&mut seq, DAQ_0));
    assert!(level(&mut seq, DAQ_1));

    run_until(&mut seq, StandState::Menu, 100);
    assert_eq!(mock(&mut seq).servo_position(IPA_SERVO), None);
    assert_eq!(mock(&mut seq).store().sequence(), 1);
    assert_eq!(seq.last_log_sequence(), Some(1));

    assert_eq!(
        committed_events(&mut seq),
        vec![
            EventCode::IgZero,
            EventCode::MainZero,
            EventCode::IgStart,
            EventCode::MvSlack,
            EventCode::IgIpa,
            EventCode::IgSpark,
            EventCode::IgN2o,
            EventCode::IgPressOk,
            EventCode::IgPressStable,
            EventCode::IgSparkOff,
            EventCode::IgStable,
            EventCode::MvIpaStart,
            EventCode::MvN2oStart,
            EventCode::MainPartialOk,
            EventCode::MvFull,
            EventCode::IgN2oClose,
            EventCode::IgIpaClose,
            EventCode::SequenceDone,
        ]
    );
}

#[test]
fn chamber_not_lighting_goes_to_full_open_by_default() {
    let mut driver = fixture_driver(Arming::Both);
    let mut seq = Sequencer::new(&mut driver, short_run_config()).unwrap();
    fixture_sequence_entry(&mut seq);
    fire(&mut seq);

    mock(&mut seq).set_analog(IG_PRESSURE, PRESSURE_FIRING);
    run_until(&mut seq, StandState::SequenceMainValvesStart, 800);

    let ms = run_until(&mut seq, StandState::SequenceMainValvesFull, 700);
    assert!(ms >= 550);
}

#[test]
fn chamber_not_lighting_faults_when_configured() {
    let mut config = short_run_config();
    config.sequence.abort_on_no_main = true;

    let mut driver = fixture_driver(Arming::Both);
    let mut seq = Sequencer::new(&mut driver, config).unwrap();
    fixture_sequence_entry(&mut seq);
    fire(&mut seq);

    mock(&mut seq).set_analog(IG_PRESSURE, PRESSURE_FIRING);
    run_until(&mut seq, StandState::SequenceMainValvesStart, 800);
    run_until(&mut seq, StandState::Fault, 700);

    let fault = seq.active_fault().unwrap();
    assert_eq!(fault.code, FaultCode::SeqNoMain);
    assert!(!fault.restartable);
    assert_eq!(mock(&mut seq).servo_position(IPA_SERVO), Some(44));
    assert_eq!(mock(&mut seq).servo_position(N2O_SERVO), Some(20));

    // The fault display saves the log on its first pass.
    step(&mut seq);
    assert_eq!(mock(&mut seq).store().sequence(), 1);
    let events = committed_events(&mut seq);
    assert!(events.contains(&EventCode::MainFail0));
    assert_eq!(events.last(), Some(&EventCode::Fault));
}

#[test]
fn operator_abort_restarts_once() {
    let mut driver = fixture_driver(Arming::Both);
    let mut seq = Sequencer::new(&mut driver, short_run_config()).unwrap();
    fixture_sequence_entry(&mut seq);
    fire(&mut seq);

    mock(&mut seq).set_digital(PUSH_2, false);
    run_until(&mut seq, StandState::Fault, 100);
    mock(&mut seq).set_digital(PUSH_2, true);

    let fault = seq.active_fault().unwrap();
    assert_eq!(fault.code, FaultCode::SeqOpAbort);
    assert!(fault.restartable);
    assert!(level(&mut seq, RED_LED));
    assert!(!level(&mut seq, IPA_IG_VALVE));
    assert!(!level(&mut seq, SPARK));

    press(&mut seq, CMD_1);
    assert_eq!(seq.state(), StandState::SequenceEntry);

    // The same abort straight after a restart is not offered again.
    fire(&mut seq);
    mock(&mut seq).set_digital(PUSH_2, false);
    run_until(&mut seq, StandState::Fault, 100);
    mock(&mut seq).set_digital(PUSH_2, true);

    let fault = seq.active_fault().unwrap();
    assert_eq!(fault.code, FaultCode::SeqOpAbort);
    assert!(!fault.restartable);

    press(&mut seq, CMD_1);
    assert_eq!(seq.state(), StandState::Fault);

    hold_stick(&mut seq, STICK_PRESS);
    assert_eq!(seq.state(), StandState::Menu);
    assert!(!level(&mut seq, RED_LED));
}

#[test]
fn safe_switch_aborts_full_burn_without_restart() {
    let mut driver = fixture_driver(Arming::Both);
    let mut seq = Sequencer::new(&mut driver, short_run_config()).unwrap();
    fixture_sequence_entry(&mut seq);
    fire(&mut seq);

    mock(&mut seq).set_analog(IG_PRESSURE, PRESSURE_FIRING);
    mock(&mut seq).set_analog(MAIN_PRESS, PRESSURE_FIRING);
    run_until(&mut seq, StandState::SequenceMainValvesFull, 800);

    mock(&mut seq).set_digital(SAFE_MAIN, true);
    run_until(&mut seq, StandState::Fault, 100);

    let fault = seq.active_fault().unwrap();
    assert_eq!(fault.code, FaultCode::SeqSafe);
    assert!(!fault.restartable);
    assert_eq!(mock(&mut seq).servo_position(IPA_SERVO), Some(44));
    assert!(!level(&mut seq, N2O_IG_VALVE));
}

#[test]
fn igniter_below_chamber_pressure_aborts() {
    let mut driver = fixture_driver(Arming::Both);
    let mut seq = Sequencer::new(&mut driver, short_run_config()).unwrap();
    fixture_sequence_entry(&mut seq);
    fire(&mut seq);

    mock(&mut seq).set_analog(IG_PRESSURE, PRESSURE_FIRING);
    mock(&mut seq).set_analog(MAIN_PRESS, PRESSURE_FIRING);
    run_until(&mut seq, StandState::SequenceMainValvesFull, 800);

    mock(&mut seq).set_analog(MAIN_PRESS, 400);
    run_until(&mut seq, StandState::Fault, 100);

    assert_eq!(seq.active_fault().map(|fault| fault.code), Some(FaultCode::IgTooLow));
}

#[test]
fn entry_waits_for_power_and_safe_switches() {
    let mut driver = fixture_driver(Arming::Igniter);
    let mut seq = Sequencer::new(&mut driver, short_run_config()).unwrap();
    settle(&mut seq);
    select(&mut seq, 2);

    assert_eq!(seq.state(), StandState::SequenceEntry);
    assert!(level(&mut seq, RED_LED));
    assert!(!level(&mut seq, GREEN_LED));

    mock(&mut seq).set_digital(CMD_2, false);
    run_for(&mut seq, 100);
    assert_eq!(seq.state(), StandState::SequenceEntry);

    hold_stick(&mut seq, STICK_PRESS);
    assert_eq!(seq.state(), StandState::Menu);
}
