//! Car-following behaviour classification and speed control.

use crate::vehicle::Vehicle;

/// Speed difference below which the trailing vehicle simply follows, in km/h.
const FOLLOW_SPEED_DIFF: f64 = 5.0;

/// Speed difference above which a collision is considered imminent, in km/h.
const CRASH_SPEED_DIFF: f64 = 30.0;

/// The driving regime of a vehicle relative to the one ahead of it.
///
/// A stateless classification, re-evaluated every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Behaviour {
    FreeDriving,
    Following,
    Overtaking,
    EmergencyBrake,
}

/// The trailing vehicle's speed relative to the leader, in km/h.
pub fn speed_diff(back: &Vehicle, front: &Vehicle) -> f64 {
    back.vel_kmh() - front.vel_kmh()
}

/// Classifies the trailing vehicle's regime against the leader.
pub fn decide_behaviour(back: &Vehicle, front: &Vehicle) -> Behaviour {
    if front.is_stalled() {
        return Behaviour::EmergencyBrake;
    }
    let diff = speed_diff(back, front);
    if diff > CRASH_SPEED_DIFF {
        Behaviour::EmergencyBrake
    } else if diff > FOLLOW_SPEED_DIFF {
        Behaviour::Overtaking
    } else if diff.abs() <= FOLLOW_SPEED_DIFF {
        Behaviour::Following
    } else {
        Behaviour::FreeDriving
    }
}

/// Applies the per-tick speed adjustment for the given regime.
///
/// `gap` is the centre-to-centre distance to the leader; the following
/// regime only accelerates toward a faster leader once the gap exceeds
/// four vehicle lengths, which keeps the follower from hunting around
/// the leader's speed.
pub fn adjust_speed(vehicle: &mut Vehicle, behaviour: Behaviour, front: Option<&Vehicle>, gap: f64) {
    match behaviour {
        Behaviour::FreeDriving | Behaviour::Overtaking => {
            if vehicle.vel() < vehicle.max_vel() {
                vehicle.set_vel(f64::min(vehicle.max_vel(), vehicle.vel() + 1.0));
            }
        }
        Behaviour::Following => {
            if let Some(front) = front {
                let target = front.vel();
                if vehicle.vel() > target {
                    vehicle.set_vel(f64::max(target, vehicle.vel() - 1.0));
                } else if vehicle.vel() < target && gap > 4.0 * vehicle.length() {
                    vehicle.set_vel(f64::min(target, vehicle.vel() + 1.0));
                }
            }
        }
        Behaviour::EmergencyBrake => {
            vehicle.set_vel(f64::max(0.0, vehicle.vel() - 2.0));
        }
    }
}
