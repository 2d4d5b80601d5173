use log::debug;

use crate::behaviour::{self, Behaviour};
use crate::collision;
#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::lane_change::{self, LaneDecision};
use crate::road::Road;
use crate::vehicle::{Vehicle, VehicleAttributes};
use crate::{VehicleId, VehicleSet};

/// Reacts to a vehicle closing on the one ahead of it.
///
/// Implemented for any `FnMut(&Vehicle, &Vehicle)` closure; an observer
/// is invoked synchronously from [`Simulation::observe_front_vehicle`].
pub trait FrontVehicleObserver {
    /// Called with the subject vehicle and the vehicle ahead of it.
    fn react(&mut self, vehicle: &Vehicle, front: &Vehicle);
}

impl<F: FnMut(&Vehicle, &Vehicle)> FrontVehicleObserver for F {
    fn react(&mut self, vehicle: &Vehicle, front: &Vehicle) {
        self(vehicle, front)
    }
}

/// A bridge traffic simulation.
pub struct Simulation {
    /// The bridge being simulated.
    road: Road,
    /// The vehicles being simulated.
    vehicles: VehicleSet,
    /// The current frame of simulation.
    frame: usize,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Simulation {
    /// Creates a new simulation of the given road.
    pub fn new(road: Road) -> Self {
        Self {
            road,
            vehicles: VehicleSet::default(),
            frame: 0,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        }
    }

    /// Gets the road being simulated.
    pub fn road(&self) -> &Road {
        &self.road
    }

    /// Adds a vehicle at the entry edge of its lane.
    pub fn add_vehicle(&mut self, attributes: &VehicleAttributes) -> VehicleId {
        self.add_vehicle_at(attributes, self.road.entry_x(attributes.lane))
    }

    /// Adds a vehicle at the given x coordinate along its lane.
    pub fn add_vehicle_at(&mut self, attributes: &VehicleAttributes, x: f64) -> VehicleId {
        let y = self.road.lane_centre_y(attributes.lane);
        self.vehicles
            .insert_with_key(|id| Vehicle::new(id, attributes, x, y))
    }

    /// Removes a vehicle from the simulation.
    pub fn remove_vehicle(&mut self, id: VehicleId) {
        self.vehicles.remove(id);
    }

    /// Gets a reference to the vehicle with the given ID.
    pub fn get_vehicle(&self, id: VehicleId) -> &Vehicle {
        &self.vehicles[id]
    }

    /// Returns an iterator over all the vehicles in the simulation.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// The number of vehicles in the simulation.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// The number of stalled vehicles, for status display.
    pub fn stalled_count(&self) -> usize {
        self.vehicles.values().filter(|v| v.is_stalled()).count()
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Marks a vehicle as stalled. Stalling is terminal: the vehicle
    /// stops dead and stays put until it is removed.
    pub fn stall_vehicle(&mut self, id: VehicleId) {
        self.vehicles[id].stall();
    }

    /// Requests a lane change for the given vehicle.
    /// Returns false when the change is rejected or unsafe.
    pub fn request_lane_change(&mut self, id: VehicleId, target_lane: usize) -> bool {
        lane_change::request_lane_change(&mut self.vehicles, id, target_lane, &self.road)
    }

    /// Invokes `observer` with `(vehicle, front)` for the first vehicle
    /// ahead of `id` in its lane whose footprint gap is within
    /// `safe_distance`. At most one notification per call.
    pub fn observe_front_vehicle(
        &self,
        id: VehicleId,
        safe_distance: f64,
        observer: &mut impl FrontVehicleObserver,
    ) {
        let vehicle = &self.vehicles[id];
        let sign = self.road.direction(vehicle.lane()).sign();
        for other in self.vehicles.values() {
            if other.id() == id || other.lane() != vehicle.lane() {
                continue;
            }
            if sign * (other.x() - vehicle.x()) <= 0.0 {
                continue;
            }
            let gap = (other.x() - vehicle.x()).abs() - 0.5 * (other.length() + vehicle.length());
            if gap <= safe_distance {
                observer.react(vehicle, other);
                return;
            }
        }
    }

    /// Advances the simulation by one tick.
    pub fn step(&mut self) {
        collision::handle_collisions(&mut self.vehicles, &self.road);
        self.plan_vehicles();
        self.move_vehicles();
        collision::handle_collisions(&mut self.vehicles, &self.road);
        self.prune_exited();
        self.frame += 1;

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }
    }

    /// Gets the debugging information for the previously simulated frame.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }

    /// Lane-change decisions and speed adjustments for every vehicle.
    /// A vehicle stalled earlier in the tick is skipped here.
    fn plan_vehicles(&mut self) {
        let ids: Vec<VehicleId> = self.vehicles.keys().collect();
        for id in ids {
            if self.vehicles[id].is_stalled() {
                continue;
            }
            match lane_change::decide_target_lane(&self.vehicles[id], &self.vehicles, &self.road) {
                LaneDecision::ChangeTo(target) => {
                    // A rejected change is simply retried on a later tick.
                    lane_change::request_lane_change(&mut self.vehicles, id, target, &self.road);
                    self.adjust_vehicle_speed(id);
                }
                LaneDecision::Decelerate => {
                    let vehicle = &mut self.vehicles[id];
                    vehicle.set_vel(f64::max(0.0, vehicle.vel() - 1.0));
                }
                LaneDecision::Stay => self.adjust_vehicle_speed(id),
            }
        }
    }

    /// Classifies the vehicle against the nearest leader and adjusts speed.
    fn adjust_vehicle_speed(&mut self, id: VehicleId) {
        let vehicle = &self.vehicles[id];
        match lane_change::nearest_obstacle(vehicle, &self.vehicles, &self.road) {
            Some((front_id, gap)) => {
                let behaviour = behaviour::decide_behaviour(vehicle, &self.vehicles[front_id]);
                if let Some([vehicle, front]) = self.vehicles.get_disjoint_mut([id, front_id]) {
                    behaviour::adjust_speed(vehicle, behaviour, Some(front), gap);
                }
            }
            None => {
                behaviour::adjust_speed(
                    &mut self.vehicles[id],
                    Behaviour::FreeDriving,
                    None,
                    f64::INFINITY,
                );
            }
        }
    }

    /// Integrates positions and lane-change progress for all vehicles.
    fn move_vehicles(&mut self) {
        for (_, vehicle) in &mut self.vehicles {
            vehicle.advance(&self.road);
            vehicle.update_lane_change();
        }
    }

    /// Removes vehicles that have left the bridge plus its margin.
    fn prune_exited(&mut self) {
        let road = self.road;
        self.vehicles.retain(|id, vehicle| {
            let keep = !road.has_exited(vehicle.x());
            if !keep {
                debug!("vehicle {:?} exited the bridge", id);
            }
            keep
        });
    }
}
