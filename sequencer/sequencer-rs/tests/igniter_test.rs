mod common;

use common::*;
use sequencer_rs::{faults::FaultCode, Sequencer, SequencerConfig, StandState};

fn fixture_armed_run_start(seq: &mut Sequencer) {
    settle(seq);
    select(seq, 0);
    assert_eq!(seq.state(), StandState::IgLocalTest);
    assert!(level(seq, GREEN_LED));

    mock(seq).set_digital(PUSH_1, false);
    run_until(seq, StandState::RunStart, 100);
    mock(seq).set_digital(PUSH_1, true);
}

fn ramp_ig_pressure(seq: &mut Sequencer) {
    for step_index in 0..=20u16 {
        let raw = PRESSURE_ZERO + (PRESSURE_FIRING - PRESSURE_ZERO) * step_index / 20;
        mock(seq).set_analog(IG_PRESSURE, raw);
        step(seq);
    }
}

#[test]
fn igniter_sequence_offsets_and_spark() {
    let mut driver = fixture_driver(Arming::Igniter);
    let mut seq = Sequencer::new(&mut driver, SequencerConfig::default()).unwrap();
    fixture_armed_run_start(&mut seq);

    assert!(level(&mut seq, DAQ_0));
    assert!(!level(&mut seq, IPA_IG_VALVE));

    let mut spark = Vec::new();
    for t in 1..200 {
        step(&mut seq);
        assert_eq!(seq.state(), StandState::RunStart);
        assert!(level(&mut seq, IPA_IG_VALVE), "ipa closed at {} ms", t);
        assert!(!level(&mut seq, N2O_IG_VALVE), "n2o open at {} ms", t);
        spark.push(level(&mut seq, SPARK));
    }

    // 25 ms square wave locked to the commanded start.
    for (i, &on) in spark.iter().enumerate() {
        let t = i + 1;
        assert_eq!(on, t % 25 < 12, "spark at {} ms", t);
    }

    assert_eq!(step(&mut seq), Some(StandState::RunIgPress));
    assert!(level(&mut seq, IPA_IG_VALVE));
    assert!(level(&mut seq, N2O_IG_VALVE));
}

#[test]
fn igniter_run_tracks_time_at_pressure() {
    let mut driver = fixture_driver(Arming::Igniter);
    let mut seq = Sequencer::new(&mut driver, SequencerConfig::default()).unwrap();
    fixture_armed_run_start(&mut seq);
    run_until(&mut seq, StandState::RunIgPress, 250);

    ramp_ig_pressure(&mut seq);
    run_until(&mut seq, StandState::RunIgRun, 100);
    assert!(level(&mut seq, DAQ_1));
    assert!(level(&mut seq, DAQ_0));

    run_until(&mut seq, StandState::IgRunReport, 1500);

    let report = seq.ignition_report().unwrap();
    assert!(report.stopped_on_time);
    assert_eq!(report.time_at_pressure_ms, 1201);
    assert!(report.time_to_pressure_ms.unwrap() >= 200);
    assert!(report.max_pressure >= seq.config.pressure.good);
    assert!(report.mean_pressure <= report.max_pressure);

    for pin in [IPA_IG_VALVE, N2O_IG_VALVE, SPARK, DAQ_0, DAQ_1] {
        assert!(!level(&mut seq, pin));
    }

    // The entry screen wants idle pressure back before it arms again.
    mock(&mut seq).set_analog(IG_PRESSURE, PRESSURE_ZERO);
    run_for(&mut seq, 100);
    hold_stick(&mut seq, STICK_PRESS);
    assert_eq!(seq.state(), StandState::IgLocalTest);
}

#[test]
fn igniter_flame_out_stops_the_run() {
    let mut driver = fixture_driver(Arming::Igniter);
    let mut seq = Sequencer::new(&mut driver, SequencerConfig::default()).unwrap();
    fixture_armed_run_start(&mut seq);
    run_until(&mut seq, StandState::RunIgPress, 250);
    ramp_ig_pressure(&mut seq);
    run_until(&mut seq, StandState::RunIgRun, 100);

    run_for(&mut seq, 300);
    mock(&mut seq).set_analog(IG_PRESSURE, PRESSURE_ZERO);
    run_until(&mut seq, StandState::IgRunReport, 200);

    let report = seq.ignition_report().unwrap();
    assert!(!report.stopped_on_time);
    assert!(report.time_at_pressure_ms > 300);
    assert!(report.time_at_pressure_ms < 400);
}

#[test]
fn igniter_no_ignition_times_out() {
    let mut driver = fixture_driver(Arming::Igniter);
    let mut seq = Sequencer::new(&mut driver, SequencerConfig::default()).unwrap();
    fixture_armed_run_start(&mut seq);
    run_until(&mut seq, StandState::RunIgPress, 250);

    let ms = run_until(&mut seq, StandState::Fault, 600);
    assert_eq!(ms, 501);

    let fault = seq.active_fault().unwrap();
    assert_eq!(fault.code, FaultCode::IgNoIgnition);
    assert_eq!(fault.value, 501);
    assert!(fault.restartable);
    assert!(!level(&mut seq, IPA_IG_VALVE));
    assert!(!level(&mut seq, SPARK));
}

#[test]
fn power_loss_shuts_valves_in_the_same_iteration() {
    let mut driver = fixture_driver(Arming::Igniter);
    let mut seq = Sequencer::new(&mut driver, SequencerConfig::default()).unwrap();
    fixture_armed_run_start(&mut seq);
    run_until(&mut seq, StandState::RunIgPress, 250);
    ramp_ig_pressure(&mut seq);
    run_until(&mut seq, StandState::RunIgRun, 100);
    run_for(&mut seq, 300);

    mock(&mut seq).set_analog(POWER_SENSE, 0);
    for _ in 0..100 {
        assert!(level(&mut seq, IPA_IG_VALVE));
        assert!(level(&mut seq, N2O_IG_VALVE));

        if step(&mut seq) == Some(StandState::Fault) {
            break;
        }
    }

    assert_eq!(seq.state(), StandState::Fault);
    assert!(!level(&mut seq, IPA_IG_VALVE));
    assert!(!level(&mut seq, N2O_IG_VALVE));
    assert!(!level(&mut seq, SPARK));
    assert!(level(&mut seq, RED_LED));

    let fault = seq.active_fault().unwrap();
    assert_eq!(fault.code, FaultCode::IgTestPower);
    assert!(fault.restartable);

    mock(&mut seq).set_analog(IG_PRESSURE, PRESSURE_ZERO);
    run_for(&mut seq, 100);
    hold_stick(&mut seq, STICK_PRESS);
    assert_eq!(seq.state(), StandState::IgLocalTest);
}

#[test]
fn remote_test_fires_on_command_line() {
    let mut driver = fixture_driver(Arming::Igniter);
    let mut seq = Sequencer::new(&mut driver, SequencerConfig::default()).unwrap();
    settle(&mut seq);
    select(&mut seq, 1);
    assert_eq!(seq.state(), StandState::IgRemoteTest);

    // The local button does nothing here.
    press(&mut seq, PUSH_1);
    assert_eq!(seq.state(), StandState::IgRemoteTest);

    mock(&mut seq).set_digital(CMD_1, false);
    run_until(&mut seq, StandState::RunStart, 100);
}

#[test]
fn igniter_test_refuses_main_armed() {
    let mut driver = fixture_driver(Arming::Both);
    let mut seq = Sequencer::new(&mut driver, SequencerConfig::default()).unwrap();
    settle(&mut seq);
    select(&mut seq, 0);
    assert_eq!(seq.state(), StandState::IgLocalTest);
    assert!(!level(&mut seq, GREEN_LED));

    press(&mut seq, PUSH_1);
    assert_eq!(seq.state(), StandState::IgLocalTest);
}
