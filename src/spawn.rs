//! Vehicle spawning with an explicitly owned, seedable generator.
//!
//! The simulation core never samples randomness; everything stochastic
//! lives here, so a fixed seed reproduces a run exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::road::LANE_COUNT;
use crate::vehicle::{VehicleAttributes, VehicleType};

/// The tick rate the km/h conversion assumes, in ticks/s.
const TICK_RATE: f64 = 50.0;

/// One spawn roll in this many succeeds each tick, on average.
const SPAWN_ODDS: u32 = 25;

/// Probability that a spawned vehicle is a car; buses and trucks split
/// most of the remainder between them.
const CAR_PROB: f64 = 0.65;
const BUS_PROB: f64 = 0.15;

/// Per-type speed bands in km/h.
const CAR_KMH: (f64, f64) = (110.0, 120.0);
const BUS_KMH: (f64, f64) = (90.0, 120.0);
const TRUCK_KMH: (f64, f64) = (60.0, 90.0);

/// Driver-to-driver speed variance band.
const VARIANCE: (f64, f64) = (0.8, 1.2);

/// Probability of a speeding violation, and how far past the cap it may go.
const VIOLATION_PROB: f64 = 0.002;
const VIOLATION_OVERSPEED_FACTOR: f64 = 1.3;

/// Per-type size distributions in metres: (mean, std deviation, floor).
const CAR_LEN: (f64, f64, f64) = (4.5, 0.4, 3.6);
const CAR_WID: (f64, f64, f64) = (1.8, 0.15, 1.5);
const BUS_LEN: (f64, f64, f64) = (12.0, 0.8, 8.0);
const BUS_WID: (f64, f64, f64) = (2.5, 0.1, 2.2);
const TRUCK_LEN: (f64, f64, f64) = (16.0, 1.5, 9.0);
const TRUCK_WID: (f64, f64, f64) = (2.5, 0.1, 2.2);

/// Converts a km/h speed into px/tick.
fn kmh_to_px_per_tick(kmh: f64, scale: f64) -> f64 {
    // 1 km/h ≈ 0.278 m/s
    kmh * 0.278 * scale / TICK_RATE
}

/// Produces fully-populated vehicle records for a simulation to adopt.
pub struct Spawner {
    rng: StdRng,
    /// Pixels per metre.
    scale: f64,
}

impl Spawner {
    /// Creates a spawner from an explicit seed, so runs are reproducible.
    pub fn new(seed: u64, scale: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            scale,
        }
    }

    /// Rolls the per-tick spawn chance; produces attributes when it hits.
    pub fn maybe_spawn(&mut self) -> Option<VehicleAttributes> {
        if self.rng.gen_range(0..SPAWN_ODDS) != 0 {
            return None;
        }
        Some(self.spawn())
    }

    /// Produces one vehicle unconditionally.
    pub fn spawn(&mut self) -> VehicleAttributes {
        let kind = self.sample_kind();
        let (length_m, width_m) = self.sample_dimensions(kind);
        let kmh = self.sample_speed_kmh(kind);
        let vel = f64::max(1.0, kmh_to_px_per_tick(kmh, self.scale).round());
        VehicleAttributes {
            lane: self.rng.gen_range(0..LANE_COUNT),
            length: (length_m * self.scale).round(),
            width: (width_m * self.scale).round(),
            vel,
            vel_kmh: kmh,
            kind,
            colour: self.sample_colour(kind),
        }
    }

    fn sample_kind(&mut self) -> VehicleType {
        let r = self.rng.gen_range(0.0..1.0);
        if r < CAR_PROB {
            VehicleType::Car
        } else if r < CAR_PROB + BUS_PROB {
            VehicleType::Bus
        } else {
            VehicleType::Truck
        }
    }

    fn sample_dimensions(&mut self, kind: VehicleType) -> (f64, f64) {
        let (len, wid) = match kind {
            VehicleType::Car => (CAR_LEN, CAR_WID),
            VehicleType::Bus => (BUS_LEN, BUS_WID),
            VehicleType::Truck => (TRUCK_LEN, TRUCK_WID),
        };
        (self.sample_normal(len), self.sample_normal(wid))
    }

    fn sample_normal(&mut self, (mean, std, floor): (f64, f64, f64)) -> f64 {
        let distr = Normal::new(mean, std).expect("Invalid standard deviation");
        f64::max(floor, distr.sample(&mut self.rng))
    }

    fn sample_speed_kmh(&mut self, kind: VehicleType) -> f64 {
        let (vmin, vmax) = match kind {
            VehicleType::Car => CAR_KMH,
            VehicleType::Bus => BUS_KMH,
            VehicleType::Truck => TRUCK_KMH,
        };
        let base = self.rng.gen_range(vmin..vmax);
        let kmh = base * self.rng.gen_range(VARIANCE.0..VARIANCE.1);
        if self.rng.gen_bool(VIOLATION_PROB) {
            // Moderate overspeed, still bounded above the cap.
            f64::min(kmh * 1.15, vmax * VIOLATION_OVERSPEED_FACTOR)
        } else {
            f64::min(kmh, vmax)
        }
    }

    fn sample_colour(&mut self, kind: VehicleType) -> [u8; 3] {
        match kind {
            VehicleType::Car => [self.rng.gen(), self.rng.gen(), self.rng.gen()],
            VehicleType::Bus => [
                60 + self.rng.gen_range(0..40),
                120 + self.rng.gen_range(0..80),
                220,
            ],
            VehicleType::Truck => [180, 160, 120 + self.rng.gen_range(0..100)],
        }
    }
}
