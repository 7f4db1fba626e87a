use anyhow::{Context, Result};
use log::info;
use rand::rngs::ThreadRng;
use rand_distr::{Distribution, Normal};
use sequencer_rs::{
    config::{PinMap, ValveConfig},
    main_valves::ServoPositions,
    SequencerConfig,
};
use stand_core::{stand_mock::StandDriverMock, Millis, PinId};

use crate::config::PlantConfig;

const ADC_MAX: f64 = 1023.0;

/// Igniter and main chamber seen through the stand's pins. Reads valve,
/// spark and servo outputs from the driver and writes noisy pressure
/// readings back.
pub struct StandPlant {
    config: PlantConfig,
    pins: PinMap,
    valves: ValveConfig,
    /// Counts above the sensor zero.
    ig_pressure: f64,
    main_pressure: f64,
    /// Detached servos hold their last position.
    ipa_open: f64,
    n2o_open: f64,
    sparked: bool,
    flow_time: Millis,
    ig_lit: bool,
    main_lit: bool,
    noise: Option<Normal<f64>>,
    rng: ThreadRng,
}

impl StandPlant {
    pub fn new(config: &PlantConfig, sequencer: &SequencerConfig) -> Result<Self> {
        let noise = match config.noise_std_dev > 0.0 {
            true => Some(Normal::new(0.0, config.noise_std_dev).context("sensor noise")?),
            false => None,
        };

        Ok(Self {
            config: config.clone(),
            pins: sequencer.pins.clone(),
            valves: sequencer.valves.clone(),
            ig_pressure: 0.0,
            main_pressure: 0.0,
            ipa_open: 0.0,
            n2o_open: 0.0,
            sparked: false,
            flow_time: 0,
            ig_lit: false,
            main_lit: false,
            noise,
            rng: rand::thread_rng(),
        })
    }

    pub fn update(&mut self, stand: &mut StandDriverMock, dt: Millis) {
        let high = |pin: PinId| stand.pin_level(pin) == Some(true);
        let ig_flowing = high(self.pins.ipa_ig_valve) && high(self.pins.n2o_ig_valve);
        let spark = high(self.pins.spark);

        if let Some(degrees) = stand.servo_position(self.pins.ipa_servo) {
            self.ipa_open = open_fraction(&self.valves.ipa, degrees);
        }
        if let Some(degrees) = stand.servo_position(self.pins.n2o_servo) {
            self.n2o_open = open_fraction(&self.valves.n2o, degrees);
        }

        if !ig_flowing {
            self.ig_lit = false;
            self.sparked = false;
            self.flow_time = 0;
        } else if !self.ig_lit {
            // Propellant alone does not light.
            self.sparked |= spark;
            if self.sparked && self.flow_time >= self.config.light_delay_ms {
                info!("Plant: igniter lit");
                self.ig_lit = true;
            } else if self.sparked {
                self.flow_time += dt;
            }
        }

        let main_open = self.ipa_open.min(self.n2o_open);
        if main_open <= 0.0 {
            self.main_lit = false;
        } else if self.ig_lit && self.config.main_lights && !self.main_lit {
            info!("Plant: main chamber lit");
            self.main_lit = true;
        }

        let ig_target = if self.ig_lit { self.config.ig_firing } else { 0.0 };
        let main_target = if self.main_lit {
            self.config.main_firing * main_open
        } else {
            0.0
        };
        self.ig_pressure = self.approach(self.ig_pressure, ig_target, dt);
        self.main_pressure = self.approach(self.main_pressure, main_target, dt);

        // The igniter vents into the main chamber, so it never reads below it.
        let ig_reading = self.reading(self.ig_pressure.max(self.main_pressure));
        let main_reading = self.reading(self.main_pressure);
        stand.set_analog(self.pins.ig_pressure, ig_reading);
        stand.set_analog(self.pins.main_press, main_reading);
    }

    pub fn ig_lit(&self) -> bool {
        self.ig_lit
    }

    pub fn main_lit(&self) -> bool {
        self.main_lit
    }

    fn approach(&self, pressure: f64, target: f64, dt: Millis) -> f64 {
        let time_constant = match target > pressure {
            true => self.config.rise_time_ms,
            false => self.config.decay_time_ms,
        };
        let alpha = 1.0 - (-(dt as f64) / time_constant.max(1.0)).exp();

        pressure + (target - pressure) * alpha
    }

    fn reading(&mut self, pressure: f64) -> u16 {
        let noise = match &self.noise {
            Some(normal) => normal.sample(&mut self.rng),
            None => 0.0,
        };

        (self.config.sensor_zero as f64 + pressure + noise)
            .round()
            .clamp(0.0, ADC_MAX) as u16
    }
}

fn open_fraction(positions: &ServoPositions, degrees: u8) -> f64 {
    let travel = positions.open.saturating_sub(positions.closed).max(1) as f64;

    (degrees.saturating_sub(positions.closed) as f64 / travel).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stand_core::StandDriver;

    fn fixture() -> (StandPlant, StandDriverMock, SequencerConfig) {
        let sequencer = SequencerConfig::default();
        let config = PlantConfig {
            noise_std_dev: 0.0,
            ..Default::default()
        };

        (StandPlant::new(&config, &sequencer).unwrap(), StandDriverMock::new(), sequencer)
    }

    #[test]
    fn test_igniter_needs_flow_and_spark() {
        let (mut plant, mut stand, sequencer) = fixture();
        let pins = &sequencer.pins;

        stand.digital_write(pins.ipa_ig_valve, true);
        stand.digital_write(pins.n2o_ig_valve, true);
        for _ in 0..100 {
            plant.update(&mut stand, 1);
        }
        assert!(!plant.ig_lit());

        stand.digital_write(pins.spark, true);
        plant.update(&mut stand, 1);
        stand.digital_write(pins.spark, false);
        for _ in 0..100 {
            plant.update(&mut stand, 1);
        }

        assert!(plant.ig_lit());
        assert!(stand.analog_read(pins.ig_pressure) > 240);
        assert_eq!(stand.analog_read(pins.main_press), 103);

        stand.digital_write(pins.n2o_ig_valve, false);
        for _ in 0..300 {
            plant.update(&mut stand, 1);
        }
        assert!(!plant.ig_lit());
        assert_eq!(stand.analog_read(pins.ig_pressure), 103);
    }

    #[test]
    fn test_main_follows_valve_opening() {
        let (mut plant, mut stand, sequencer) = fixture();
        let pins = &sequencer.pins;

        assert_eq!(open_fraction(&sequencer.valves.ipa, 44), 0.0);
        assert_eq!(open_fraction(&sequencer.valves.ipa, 134), 1.0);

        for pin in [pins.ipa_ig_valve, pins.n2o_ig_valve, pins.spark] {
            stand.digital_write(pin, true);
        }
        stand.servo_write(pins.ipa_servo, 134);
        stand.servo_write(pins.n2o_servo, 110);
        for _ in 0..300 {
            plant.update(&mut stand, 1);
        }

        assert!(plant.main_lit());
        let main = stand.analog_read(pins.main_press);
        assert!((240..=245).contains(&main), "main reading {}", main);
        assert!(stand.analog_read(pins.ig_pressure) >= main);
    }
}
