//! Pairwise collision detection and resolution.

use itertools::iproduct;
use log::{debug, trace};

use crate::debug::debug_marker;
use crate::road::Road;
use crate::vehicle::Vehicle;
use crate::VehicleSet;

/// Bounding boxes closer than this count as contact, in px.
const CONTACT_MARGIN: f64 = 2.0;

/// Predictive safe-gap speed multiplier behind a stalled leader.
const STALLED_SAFETY_FACTOR: f64 = 18.0;

/// Predictive safe-gap speed multiplier behind a moving leader.
const MOVING_SAFETY_FACTOR: f64 = 8.0;

/// Speed multiplier sizing the critical window for forced braking.
const CRITICAL_SAFETY_FACTOR: f64 = 3.0;

/// Checks whether two vehicles are in contact.
///
/// Vehicles more than one lane apart can never touch; otherwise their
/// bounding boxes are tested with a small margin so a near-touch counts.
pub fn check_collision(a: &Vehicle, b: &Vehicle) -> bool {
    if a.lane().abs_diff(b.lane()) > 1 {
        return false;
    }
    let [ax, ay] = a.bounds();
    let [bx, by] = b.bounds();
    ax.expand(CONTACT_MARGIN).overlaps(&bx) && ay.expand(CONTACT_MARGIN).overlaps(&by)
}

/// Predicts whether `back` is closing on `front` unsafely.
///
/// Fires well before the bounding boxes touch: the safe gap grows with
/// the trailing vehicle's speed, and faster still when the leader is
/// stalled.
pub fn check_will_collide(front: &Vehicle, back: &Vehicle, road: &Road) -> bool {
    if front.lane() != back.lane() {
        return false;
    }
    let sign = road.direction(back.lane()).sign();
    if sign * (front.x() - back.x()) <= 0.0 {
        return false;
    }
    let dist = (front.x() - back.x()).abs();
    let factor = if front.is_stalled() {
        STALLED_SAFETY_FACTOR
    } else {
        MOVING_SAFETY_FACTOR
    };
    let safe_dist = 0.5 * (front.length() + back.length()) + back.vel() * factor;
    dist < safe_dist
}

/// Detects and resolves collisions across the whole fleet.
///
/// Every ordered pair is evaluated in key order; the subject of a pair
/// stalls on contact, and is braked when a predicted collision falls
/// inside the critical window. Mutations are visible to later pair
/// evaluations in the same pass.
pub fn handle_collisions(vehicles: &mut VehicleSet, road: &Road) {
    let ids: Vec<_> = vehicles.keys().collect();
    for (a, b) in iproduct!(ids.iter(), ids.iter()) {
        if a == b {
            continue;
        }
        let Some([subject, other]) = vehicles.get_disjoint_mut([*a, *b]) else {
            continue;
        };
        if subject.is_stalled() {
            continue;
        }

        if check_collision(subject, other) {
            debug!(
                "vehicle {:?} stalled in lane {} at x = {:.0}",
                subject.id(),
                subject.lane(),
                subject.x()
            );
            debug_marker("stall", subject.position());
            subject.stall();
            continue;
        }

        if check_will_collide(other, subject, road) {
            let dist = (other.x() - subject.x()).abs();
            let critical = 0.5 * (subject.length() + other.length())
                + subject.vel() * CRITICAL_SAFETY_FACTOR;
            if dist < critical {
                // Creep rather than stop; contact is what finally stalls it.
                trace!("vehicle {:?} braking behind {:?}", subject.id(), other.id());
                subject.set_vel(f64::max(1.0, subject.vel() - 1.0));
            }
        }
    }
}
