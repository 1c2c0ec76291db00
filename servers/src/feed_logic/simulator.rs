//! Flight profile generator.
//!
//! The vehicle climbs from 0 m to the -80000 m apogee of the altitude domain,
//! descends back, and launches again. Noise comes from a seedable RNG so runs
//! can be replayed.

use lib_spectrum::VehicleState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Altitude of apogee. Altitude grows negative as the vehicle climbs.
pub const APOGEE: f64 = -80000.0;

const MAX_ASCENT_VELOCITY: f64 = 70.0;
const VELOCITY_STEP: f64 = 2.5;
const VELOCITY_NOISE: f64 = 3.0;
/// Metres travelled per tick and unit of velocity.
const ALTITUDE_GAIN: f64 = 20.0;
const GROUND_TEMPERATURE: f64 = 20.0;
const APOGEE_TEMPERATURE: f64 = -25.0;
const TEMPERATURE_NOISE: f64 = 1.5;

/// Body sent instead of a snapshot on malformed ticks.
pub const MALFORMED_FRAME: &str = "{\"Velocity\": \"corrupted";

pub const ANOMALY_MESSAGE: &str = "Anomaly detected, operator action required";

#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatorSettings {
    /// Raise an action request every N ticks, 0 disables.
    pub anomaly_every: u64,
    /// Emit a malformed frame every N ticks, 0 disables.
    pub malformed_every: u64,
}

/// What a tick puts on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    Snapshot(VehicleState),
    Malformed(&'static str),
}

pub struct Simulator {
    state: VehicleState,
    tick: u64,
    settings: SimulatorSettings,
    rng: StdRng,
}

impl Simulator {
    pub fn new(settings: SimulatorSettings, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            state: VehicleState {
                velocity: 0.0,
                altitude: 0.0,
                temperature: GROUND_TEMPERATURE,
                status_message: "Ready for launch".to_string(),
                is_ascending: true,
                is_action_required: false,
            },
            tick: 0,
            settings,
            rng,
        }
    }

    pub fn snapshot(&self) -> &VehicleState {
        &self.state
    }

    /// Clears a pending action request. Returns whether one was pending.
    pub fn acknowledge(&mut self) -> bool {
        let was_required = self.state.is_action_required;
        self.state.is_action_required = false;
        self.state.status_message = self.phase_message().to_string();
        was_required
    }

    /// Advances the flight by one tick.
    pub fn step(&mut self) -> Tick {
        self.tick += 1;
        self.advance_flight();

        if every(self.settings.anomaly_every, self.tick) {
            self.state.is_action_required = true;
        }
        self.state.status_message = if self.state.is_action_required {
            ANOMALY_MESSAGE.to_string()
        } else {
            self.phase_message().to_string()
        };

        if every(self.settings.malformed_every, self.tick) {
            Tick::Malformed(MALFORMED_FRAME)
        } else {
            Tick::Snapshot(self.state.clone())
        }
    }

    fn advance_flight(&mut self) {
        let noise = self.rng.random_range(-VELOCITY_NOISE..=VELOCITY_NOISE);
        let s = &mut self.state;

        if s.is_ascending {
            s.velocity = (s.velocity.max(0.0) + VELOCITY_STEP).min(MAX_ASCENT_VELOCITY) + noise;
            s.altitude -= s.velocity.max(0.0) * ALTITUDE_GAIN;
            if s.altitude <= APOGEE {
                s.altitude = APOGEE;
                s.is_ascending = false;
            }
        } else {
            s.velocity = (s.velocity.min(0.0) - VELOCITY_STEP).max(-MAX_ASCENT_VELOCITY) + noise;
            s.altitude -= s.velocity.min(0.0) * ALTITUDE_GAIN;
            if s.altitude >= 0.0 {
                s.altitude = 0.0;
                s.velocity = 0.0;
                s.is_ascending = true;
            }
        }

        let height = s.altitude / APOGEE;
        s.temperature = GROUND_TEMPERATURE + (APOGEE_TEMPERATURE - GROUND_TEMPERATURE) * height
            + self.rng.random_range(-TEMPERATURE_NOISE..=TEMPERATURE_NOISE);
    }

    fn phase_message(&self) -> &'static str {
        let s = &self.state;
        match (s.is_ascending, s.altitude) {
            (true, a) if a == 0.0 => "Ready for launch",
            (true, a) if a > -2000.0 => "Liftoff",
            (true, a) if a > -70000.0 => "Ascent nominal",
            (true, _) => "Approaching apogee",
            (false, a) if a > -2000.0 => "Final approach",
            (false, _) => "Descent nominal",
        }
    }
}

fn every(period: u64, tick: u64) -> bool {
    period > 0 && tick % period == 0
}
