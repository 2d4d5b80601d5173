pub use behaviour::{decide_behaviour, speed_diff, Behaviour};
pub use collision::{check_collision, check_will_collide};
pub use road::{Direction, Road, EXIT_MARGIN, LANE_COUNT};
pub use simulation::{FrontVehicleObserver, Simulation};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use spawn::Spawner;
pub use util::Interval;
pub use vehicle::{LaneChange, Vehicle, VehicleAttributes, VehicleType};

mod behaviour;
mod collision;
mod debug;
mod lane_change;
pub mod math;
mod road;
mod simulation;
mod spawn;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
}

type VehicleSet = SlotMap<VehicleId, Vehicle>;
