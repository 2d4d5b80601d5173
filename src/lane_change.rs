//! Lane-change decision making and safety validation.
//!
//! A change moves through three states: idle, committed (after a
//! successful request) and complete, with the committed phase driven
//! tick-by-tick by [`Vehicle::update_lane_change`]. Decisions and
//! safety checks are re-evaluated from scratch every tick; a rejected
//! request has no effect and is simply retried later.

use log::debug;

use crate::debug::debug_span;
use crate::math::Point2d;
use crate::road::{Direction, Road};
use crate::util::Interval;
use crate::vehicle::{Vehicle, LANE_CHANGE_TICKS};
use crate::{VehicleId, VehicleSet};

/// Minimum speed below which a lane change will not be attempted, in px/tick.
const MIN_CHANGE_VEL: f64 = 1.0;

/// Safe-gap speed multiplier against a stalled vehicle in the path.
const STALLED_SAFETY_FACTOR: f64 = 25.0;

/// Safe-gap speed multiplier against a moving vehicle in the path.
const MOVING_SAFETY_FACTOR: f64 = 12.0;

/// The outcome of a lane-change decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaneDecision {
    /// No qualifying obstacle ahead; keep the current lane.
    Stay,
    /// Attempt a change into the given lane.
    ChangeTo(usize),
    /// Boxed in close behind the leader with nowhere to go; slow down.
    Decelerate,
}

/// Finds the nearest vehicle ahead in the subject's lane within its
/// detection window, returning its ID and centre-to-centre distance.
pub(crate) fn nearest_obstacle(
    vehicle: &Vehicle,
    vehicles: &VehicleSet,
    road: &Road,
) -> Option<(VehicleId, f64)> {
    let sign = road.direction(vehicle.lane()).sign();
    let detection_dist = 8.0 * vehicle.length() + 40.0 * vehicle.vel();
    vehicles
        .iter()
        .filter(|(id, _)| *id != vehicle.id())
        .filter(|(_, other)| other.lane() == vehicle.lane())
        .filter(|(_, other)| sign * (other.x() - vehicle.x()) > 0.0)
        .map(|(id, other)| (id, (other.x() - vehicle.x()).abs()))
        .filter(|(_, dist)| *dist <= detection_dist)
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Decides whether the vehicle should change lanes, and to where.
///
/// Policy, in priority order: a stalled leader must be bypassed; a
/// clearly slower leader is overtaken on the passing side, or on the
/// slow side when the passing side is unavailable and there is room;
/// an equal-speed leader crowding the gap is overtaken proactively;
/// otherwise a close leader demands deceleration and a distant one an
/// ordinary overtake.
pub fn decide_target_lane(vehicle: &Vehicle, vehicles: &VehicleSet, road: &Road) -> LaneDecision {
    let Some((obstacle_id, dist)) = nearest_obstacle(vehicle, vehicles, road) else {
        return LaneDecision::Stay;
    };
    let obstacle = &vehicles[obstacle_id];
    let lane = vehicle.lane();

    if obstacle.is_stalled() {
        // Bypass on the slow side; use the passing side when the slow
        // side is off the carriageway.
        if let Some(target) = road.slow_lane(lane).or_else(|| road.passing_lane(lane)) {
            return LaneDecision::ChangeTo(target);
        }
    } else if obstacle.vel() < vehicle.vel() - 1.0 {
        if let Some(target) = road.passing_lane(lane) {
            return LaneDecision::ChangeTo(target);
        }
        // Passing side unavailable; with enough room, pass on the slow side.
        if dist > 5.0 * vehicle.length() {
            if let Some(target) = road.slow_lane(lane) {
                return LaneDecision::ChangeTo(target);
            }
        }
    } else if obstacle.vel() <= vehicle.vel() && dist < 4.0 * vehicle.length() {
        // Proactive overtake of an equal-speed leader crowding the gap.
        if let Some(target) = road.passing_lane(lane) {
            return LaneDecision::ChangeTo(target);
        }
    } else if dist < 3.0 * vehicle.length() {
        return LaneDecision::Decelerate;
    } else if let Some(target) = road.passing_lane(lane) {
        return LaneDecision::ChangeTo(target);
    }

    LaneDecision::Stay
}

/// Validates that changing into `target_lane` is safe.
///
/// Every vehicle whose lane falls between the current and target lanes
/// is examined; any of them inside the direction-aware danger window
/// must leave a gap of at least half the summed lengths plus the faster
/// party's speed times a safety factor.
pub fn is_lane_change_safe(
    vehicle: &Vehicle,
    target_lane: usize,
    vehicles: &VehicleSet,
    road: &Road,
) -> bool {
    if !road.contains_lane(target_lane) {
        return false;
    }
    // Crossing the median is never permitted.
    if !road.same_side(vehicle.lane(), target_lane) {
        return false;
    }
    if vehicle.vel() < MIN_CHANGE_VEL {
        return false;
    }

    // The horizontal distance covered over the course of the change.
    let horizontal_dist = vehicle.vel() * LANE_CHANGE_TICKS;
    let lanes = Interval::new(
        vehicle.lane().min(target_lane),
        vehicle.lane().max(target_lane),
    );

    for (id, other) in vehicles {
        if id == vehicle.id() || !lanes.contains(other.lane()) {
            continue;
        }

        let x_diff = other.x() - vehicle.x();
        let danger = match road.direction(vehicle.lane()) {
            Direction::Eastbound => Interval::new(
                -2.0 * vehicle.length(),
                horizontal_dist + 2.0 * other.length(),
            ),
            Direction::Westbound => Interval::new(
                -(horizontal_dist + 2.0 * other.length()),
                2.0 * vehicle.length(),
            ),
        };
        if !danger.contains(x_diff) {
            continue;
        }

        let factor = if other.is_stalled() {
            STALLED_SAFETY_FACTOR
        } else {
            MOVING_SAFETY_FACTOR
        };
        let safe_dist = 0.5 * (vehicle.length() + other.length())
            + f64::max(vehicle.vel(), other.vel()) * factor;
        if x_diff.abs() < safe_dist {
            return false;
        }
    }
    true
}

/// Requests a lane change for the given vehicle, committing it if safe.
///
/// Returns false, without mutating anything, when a change is already
/// in progress, the target is the current lane, or the safety check
/// fails.
pub fn request_lane_change(
    vehicles: &mut VehicleSet,
    id: VehicleId,
    target_lane: usize,
    road: &Road,
) -> bool {
    let vehicle = &vehicles[id];
    if vehicle.is_changing_lane() || target_lane == vehicle.lane() {
        return false;
    }
    if !is_lane_change_safe(vehicle, target_lane, vehicles, road) {
        return false;
    }

    let end_y = road.lane_centre_y(target_lane);
    let p1 = vehicle.position();
    let p2 = Point2d::new(
        p1.x + road.direction(vehicle.lane()).sign() * vehicle.vel() * LANE_CHANGE_TICKS,
        end_y,
    );
    debug_span("lane change", p1, p2);
    debug!(
        "vehicle {:?} changing lane {} -> {}",
        id,
        vehicle.lane(),
        target_lane
    );

    vehicles[id].begin_lane_change(target_lane, end_y);
    true
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vehicle::testing::insert;
    use crate::VehicleSet;

    fn road() -> Road {
        Road::new(2000.0, 20.0)
    }

    #[test]
    fn unsafe_below_the_safety_distance_safe_above_it() {
        // Safe gap against the lane-2 vehicle: 40 + max(5, 5) * 12 = 100 px.
        let road = road();
        let mut vehicles = VehicleSet::default();
        let v = insert(&mut vehicles, &road, 1, 500.0, 5.0);

        let near = insert(&mut vehicles, &road, 2, 590.0, 5.0);
        assert!(!is_lane_change_safe(&vehicles[v], 2, &vehicles, &road));
        vehicles.remove(near);

        insert(&mut vehicles, &road, 2, 610.0, 5.0);
        assert!(is_lane_change_safe(&vehicles[v], 2, &vehicles, &road));
    }

    #[test]
    fn rejects_cross_median_and_off_bridge_targets() {
        let road = road();
        let mut vehicles = VehicleSet::default();
        let east = insert(&mut vehicles, &road, 2, 500.0, 5.0);
        let west = insert(&mut vehicles, &road, 3, 500.0, 5.0);
        assert!(!is_lane_change_safe(&vehicles[east], 3, &vehicles, &road));
        assert!(!is_lane_change_safe(&vehicles[west], 2, &vehicles, &road));
        assert!(!is_lane_change_safe(&vehicles[east], 6, &vehicles, &road));
    }

    #[test]
    fn rejects_a_crawling_vehicle() {
        let road = road();
        let mut vehicles = VehicleSet::default();
        let v = insert(&mut vehicles, &road, 1, 500.0, 0.5);
        assert!(!is_lane_change_safe(&vehicles[v], 2, &vehicles, &road));
    }

    #[test]
    fn a_committed_request_records_the_transition() {
        let road = road();
        let mut vehicles = VehicleSet::default();
        let v = insert(&mut vehicles, &road, 1, 500.0, 5.0);
        assert!(request_lane_change(&mut vehicles, v, 2, &road));

        let lc = vehicles[v].lane_change().unwrap();
        assert_eq!(lc.target_lane, 2);
        assert_eq!(lc.progress, 0.0);
        assert_eq!(lc.start_y, road.lane_centre_y(1));
        assert_eq!(lc.end_y, road.lane_centre_y(2));
    }

    #[test]
    fn requests_mid_change_are_rejected_without_mutation() {
        let road = road();
        let mut vehicles = VehicleSet::default();
        let v = insert(&mut vehicles, &road, 1, 500.0, 5.0);
        assert!(!request_lane_change(&mut vehicles, v, 1, &road));
        assert!(request_lane_change(&mut vehicles, v, 2, &road));

        assert!(!request_lane_change(&mut vehicles, v, 0, &road));
        let lc = vehicles[v].lane_change().unwrap();
        assert_eq!(lc.target_lane, 2);
        assert_eq!(lc.progress, 0.0);
    }

    #[test]
    fn bypasses_a_stalled_leader_on_the_slow_side() {
        let road = road();
        let mut vehicles = VehicleSet::default();
        let v = insert(&mut vehicles, &road, 1, 500.0, 10.0);
        let blocker = insert(&mut vehicles, &road, 1, 700.0, 10.0);
        vehicles[blocker].stall();
        assert_eq!(
            decide_target_lane(&vehicles[v], &vehicles, &road),
            LaneDecision::ChangeTo(2)
        );
    }

    #[test]
    fn bypasses_on_the_passing_side_from_the_slow_lane() {
        let road = road();
        let mut vehicles = VehicleSet::default();
        let v = insert(&mut vehicles, &road, 2, 500.0, 10.0);
        let blocker = insert(&mut vehicles, &road, 2, 700.0, 10.0);
        vehicles[blocker].stall();
        assert_eq!(
            decide_target_lane(&vehicles[v], &vehicles, &road),
            LaneDecision::ChangeTo(1)
        );
    }

    #[test]
    fn overtakes_a_slower_leader_on_the_passing_side() {
        let road = road();
        let mut vehicles = VehicleSet::default();
        let v = insert(&mut vehicles, &road, 1, 500.0, 10.0);
        insert(&mut vehicles, &road, 1, 700.0, 5.0);
        assert_eq!(
            decide_target_lane(&vehicles[v], &vehicles, &road),
            LaneDecision::ChangeTo(0)
        );
    }

    #[test]
    fn falls_back_to_the_slow_side_when_the_gap_is_large() {
        let road = road();
        let mut vehicles = VehicleSet::default();
        let v = insert(&mut vehicles, &road, 0, 500.0, 10.0);
        insert(&mut vehicles, &road, 0, 710.0, 5.0);
        assert_eq!(
            decide_target_lane(&vehicles[v], &vehicles, &road),
            LaneDecision::ChangeTo(1)
        );
    }

    #[test]
    fn decelerates_behind_a_close_faster_leader() {
        let road = road();
        let mut vehicles = VehicleSet::default();
        let v = insert(&mut vehicles, &road, 1, 500.0, 10.0);
        insert(&mut vehicles, &road, 1, 600.0, 12.0);
        assert_eq!(
            decide_target_lane(&vehicles[v], &vehicles, &road),
            LaneDecision::Decelerate
        );
    }

    #[test]
    fn stays_put_with_a_clear_detection_window() {
        let road = road();
        let mut vehicles = VehicleSet::default();
        let v = insert(&mut vehicles, &road, 1, 500.0, 10.0);
        // A vehicle beyond the detection window (320 + 400 px) is ignored.
        insert(&mut vehicles, &road, 1, 1300.0, 5.0);
        assert_eq!(
            decide_target_lane(&vehicles[v], &vehicles, &road),
            LaneDecision::Stay
        );
    }
}
