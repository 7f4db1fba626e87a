mod config;
mod operator;
mod plant;

use anyhow::{anyhow, Result};
use log::{info, warn};
use sequencer_rs::{sequencer::StandEventLog, Sequencer, StandState};
use stand_core::{stand_mock::StandDriverMock, util::LoopTimer, StandDriver};

use crate::{config::SilConfig, operator::Operator, plant::StandPlant};

const DEFAULT_CONFIG: &str = "stand.toml";

fn main() -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = SilConfig::load(&path)?;
    info!("Running {:?} for {} ms", config.scenario.test, config.scenario.duration_ms);

    let mut plant = StandPlant::new(&config.plant, &config.sequencer)?;
    let mut operator = Operator::new(&config.scenario, &config.sequencer.pins);

    let mut driver = StandDriverMock::new();
    operator.prepare(&mut driver);
    plant.update(&mut driver, 0);

    let mut seq = Sequencer::new(&mut driver, config.sequencer.clone())?;
    let mut status_timer = LoopTimer::new(config.scenario.status_interval_ms);

    for _ in 0..config.scenario.duration_ms {
        let stand = stand_driver(&mut seq)?;
        stand.advance(1);
        let now = stand.millis();
        operator.update(stand, now);
        plant.update(stand, 1);

        seq.update()?;

        if status_timer.should_update(seq.now()) {
            info!(
                "t={} ms state={} ig={} main={} power={}",
                seq.now(),
                seq.state(),
                seq.ig_pressure(),
                seq.main_pressure(),
                seq.power_ok()
            );
        }
    }

    report(&mut seq)
}

fn stand_driver<'s>(seq: &'s mut Sequencer) -> Result<&'s mut StandDriverMock> {
    seq.driver
        .as_mut_any()
        .downcast_mut::<StandDriverMock>()
        .ok_or_else(|| anyhow!("sequencer is not driving the simulated stand"))
}

fn report(seq: &mut Sequencer) -> Result<()> {
    info!("Finished in {}", seq.state());

    if seq.state() == StandState::Fault {
        if let Some(fault) = seq.active_fault() {
            warn!(
                "Fault {}: {} value={} restartable={}",
                fault.code as u8,
                fault.code.message(),
                fault.value,
                fault.restartable
            );
        }
    }

    if let Some(report) = seq.ignition_report() {
        info!("Igniter run: {:?}", report);
    }

    let Some(sequence) = seq.last_log_sequence() else {
        info!("No event log was committed");
        return Ok(());
    };

    let image = stand_driver(seq)?.store().image().to_vec();
    info!("Event log #{}:", sequence);
    let count = StandEventLog::decode(&image, |record| {
        let code: &'static str = record.code.into();
        info!("{:>6} ms  {:<16} {}", record.time_ms, code, record.param);
    })?;
    info!("{} events", count);

    Ok(())
}
