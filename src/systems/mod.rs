//! ECS systems for the swarm simulation.
//!
//! Systems hold all per-tick logic; the pool, grid and config are resources.
//!
//! ## Tick Order
//!
//! The systems run chained, in this order, once per `SwarmSim::tick`:
//!
//! 1. `spatial_grid_update_system` - rebuilds the neighbor grid from the pool
//! 2. `phase_transition_system` - Idle/Orbit/Attack state machine
//! 3. `steering_system` - flocking + orbit forces into velocity (parallel gather with `parallel`)
//! 4. `movement_system` - integrates velocity, applies the idle bob
//! 5. `player_contact_system` - reports charges that reach the player
//! 6. `death_system` - compacts agents whose death animation finished
//!
//! Every system iterates the pool's active region by slot. Only `death_system`
//! changes which agent occupies a slot.

pub mod flocking;
pub mod lifecycle;
pub mod movement;
pub mod phase;

pub use flocking::*;
pub use lifecycle::*;
pub use movement::*;
pub use phase::*;
