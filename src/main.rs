use std::time::Instant;

use bridge_sim::{Road, Simulation, Spawner};

/// Pixels per metre.
const SCALE: f64 = 2.0;

fn main() {
    env_logger::init();

    // An 800 m bridge with 24 px lanes.
    let road = Road::new(800.0 * SCALE, 24.0);
    let mut sim = Simulation::new(road);
    let mut spawner = Spawner::new(0xB21D6E, SCALE);

    let num_frames = 6000;
    let start = Instant::now();
    for frame in 1..=num_frames {
        if let Some(attributes) = spawner.maybe_spawn() {
            sim.add_vehicle(&attributes);
        }
        sim.step();

        if frame % 500 == 0 {
            println!(
                "frame {:>5}: {:>3} vehicles, {} stalled",
                frame,
                sim.vehicle_count(),
                sim.stalled_count()
            );
        }
    }

    let elapsed = start.elapsed();
    println!(
        "{} frames in {:?} ({:.0} frames/s)",
        num_frames,
        elapsed,
        num_frames as f64 / elapsed.as_secs_f64()
    );
}
