use crate::math::{CubicBezier1d, Point2d};
use crate::road::Road;
use crate::util::Interval;
use crate::VehicleId;

/// The number of ticks a lane change takes to complete.
pub(crate) const LANE_CHANGE_TICKS: f64 = 30.0;

/// The colour a vehicle is repainted once it stalls.
const STALLED_COLOUR: [u8; 3] = [128, 128, 128];

/// The class of a vehicle, which determines its size and speed range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleType {
    Car,
    Bus,
    Truck,
}

/// A simulated vehicle.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID.
    pub(crate) id: VehicleId,
    /// The lane the vehicle occupies for collision purposes.
    lane: usize,
    /// Half the vehicle's length in px.
    half_len: f64,
    /// Half the vehicle's width in px.
    half_wid: f64,
    /// The coordinates of the centre of the vehicle.
    pos: Point2d,
    /// The speed in px/tick.
    vel: f64,
    /// The speed cap to restore toward, in px/tick.
    max_vel: f64,
    /// The speed in km/h, used for behaviour decisions and display.
    vel_kmh: f64,
    /// The vehicle class.
    kind: VehicleType,
    /// The display colour.
    colour: [u8; 3],
    /// Whether the vehicle has stalled.
    stalled: bool,
    /// The in-progress lane change, if there is one.
    lane_change: Option<LaneChange>,
}

/// The attributes of a vehicle to be spawned.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleAttributes {
    /// The lane the vehicle starts in.
    pub lane: usize,
    /// The vehicle length in px.
    pub length: f64,
    /// The vehicle width in px.
    pub width: f64,
    /// The speed in px/tick.
    pub vel: f64,
    /// The speed in km/h.
    pub vel_kmh: f64,
    /// The vehicle class.
    pub kind: VehicleType,
    /// The display colour.
    pub colour: [u8; 3],
}

/// Represents an in-progress lane change.
#[derive(Clone, Copy, Debug)]
pub struct LaneChange {
    /// The destination lane.
    pub target_lane: usize,
    /// Normalised completion fraction in [0, 1].
    pub progress: f64,
    /// The y coordinate at which the change started.
    pub start_y: f64,
    /// The y coordinate of the destination lane's centre.
    pub end_y: f64,
}

impl Vehicle {
    /// Creates a new vehicle.
    pub(crate) fn new(id: VehicleId, attributes: &VehicleAttributes, x: f64, y: f64) -> Self {
        Self {
            id,
            lane: attributes.lane,
            half_len: 0.5 * attributes.length,
            half_wid: 0.5 * attributes.width,
            pos: Point2d::new(x, y),
            vel: f64::max(0.0, attributes.vel),
            max_vel: f64::max(0.0, attributes.vel),
            vel_kmh: attributes.vel_kmh,
            kind: attributes.kind,
            colour: attributes.colour,
            stalled: false,
            lane_change: None,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The lane the vehicle occupies.
    ///
    /// Halfway through a lane change this is already the target lane,
    /// even though the vehicle's y coordinate is still interpolating.
    pub fn lane(&self) -> usize {
        self.lane
    }

    /// The vehicle's length in px.
    pub fn length(&self) -> f64 {
        2.0 * self.half_len
    }

    /// The vehicle's width in px.
    pub fn width(&self) -> f64 {
        2.0 * self.half_wid
    }

    /// The coordinates of the centre of the vehicle.
    pub fn position(&self) -> Point2d {
        self.pos
    }

    /// The x coordinate of the centre of the vehicle.
    pub fn x(&self) -> f64 {
        self.pos.x
    }

    /// The y coordinate of the centre of the vehicle.
    pub fn y(&self) -> f64 {
        self.pos.y
    }

    /// The vehicle's axis-aligned bounding box, as x and y extents.
    pub fn bounds(&self) -> [Interval<f64>; 2] {
        [
            Interval::disc(self.pos.x, self.half_len),
            Interval::disc(self.pos.y, self.half_wid),
        ]
    }

    /// The vehicle's speed in px/tick.
    pub fn vel(&self) -> f64 {
        self.vel
    }

    /// The speed cap the vehicle restores toward, in px/tick.
    pub fn max_vel(&self) -> f64 {
        self.max_vel
    }

    /// The vehicle's speed in km/h.
    pub fn vel_kmh(&self) -> f64 {
        self.vel_kmh
    }

    /// The vehicle class.
    pub fn kind(&self) -> VehicleType {
        self.kind
    }

    /// The display colour.
    pub fn colour(&self) -> [u8; 3] {
        self.colour
    }

    /// Whether the vehicle has stalled.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Whether a lane change is in progress.
    pub fn is_changing_lane(&self) -> bool {
        self.lane_change.is_some()
    }

    /// The in-progress lane change, if there is one.
    pub fn lane_change(&self) -> Option<&LaneChange> {
        self.lane_change.as_ref()
    }

    /// Sets the vehicle's speed, clamped to be non-negative.
    pub(crate) fn set_vel(&mut self, vel: f64) {
        self.vel = f64::max(0.0, vel);
    }

    /// Permanently disables the vehicle. There is no recovery path;
    /// a stalled vehicle sits where it is until it is removed externally.
    pub(crate) fn stall(&mut self) {
        self.stalled = true;
        self.vel = 0.0;
        self.lane_change = None;
        self.colour = STALLED_COLOUR;
    }

    /// Commits the vehicle to a lane change toward `end_y`.
    pub(crate) fn begin_lane_change(&mut self, target_lane: usize, end_y: f64) {
        self.lane_change = Some(LaneChange {
            target_lane,
            progress: 0.0,
            start_y: self.pos.y,
            end_y,
        });
    }

    /// Advances the vehicle along its travel axis.
    pub(crate) fn advance(&mut self, road: &Road) {
        if self.stalled {
            return;
        }
        self.pos.x += road.direction(self.lane).sign() * self.vel;
    }

    /// Progresses an in-flight lane change by one tick.
    pub(crate) fn update_lane_change(&mut self) {
        let Some(lc) = self.lane_change.as_mut() else {
            return;
        };
        lc.progress += 1.0 / LANE_CHANGE_TICKS;

        if lc.progress >= 1.0 {
            self.pos.y = lc.end_y;
            self.lane = lc.target_lane;
            self.lane_change = None;
        } else {
            self.pos.y = CubicBezier1d::ease(lc.start_y, lc.end_y).sample(lc.progress);
            // Halfway through, the vehicle counts as occupying the target
            // lane so collision detection sees the committed position.
            if lc.progress >= 0.5 {
                self.lane = lc.target_lane;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::VehicleSet;

    /// Inserts a car-sized vehicle for scenario construction.
    pub(crate) fn insert(
        set: &mut VehicleSet,
        road: &Road,
        lane: usize,
        x: f64,
        vel: f64,
    ) -> VehicleId {
        insert_with(set, road, lane, x, vel, vel * 5.0)
    }

    /// Inserts a car-sized vehicle with an explicit km/h speed.
    pub(crate) fn insert_with(
        set: &mut VehicleSet,
        road: &Road,
        lane: usize,
        x: f64,
        vel: f64,
        vel_kmh: f64,
    ) -> VehicleId {
        let attributes = VehicleAttributes {
            lane,
            length: 40.0,
            width: 16.0,
            vel,
            vel_kmh,
            kind: VehicleType::Car,
            colour: [200, 40, 40],
        };
        set.insert_with_key(|id| Vehicle::new(id, &attributes, x, road.lane_centre_y(lane)))
    }
}
