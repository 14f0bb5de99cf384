//! Swarm Sim - Particle Enemy Swarm Core
//!
//! A deterministic swarm of particle enemies that idle, orbit the player in a
//! flock and periodically charge. Agents live in a fixed-capacity dense pool
//! and are stepped by a `bevy_ecs` schedule; health and rendering are external
//! collaborators that talk to the core through identifiers and notifications.
//!
//! ```no_run
//! use swarm_sim::{CallbackSink, Notification, SwarmConfig, SwarmSim};
//! use glam::Vec3;
//!
//! let sink = CallbackSink(|n: Notification| println!("{n:?}"));
//! let mut sim = SwarmSim::with_sink(SwarmConfig::default(), sink);
//! sim.spawn_scattered(200, Vec3::ZERO, 20.0);
//! for _ in 0..60 {
//!     sim.tick(1.0 / 60.0, Vec3::new(0.0, 0.0, 5.0));
//! }
//! ```

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod notify;
pub mod pool;
pub mod render_bridge;
pub mod spatial;
pub mod systems;
pub mod world;

pub use api::SwarmSim;
pub use components::{Agent, AgentId, Health, Lifecycle, Phase, PhaseKind};
pub use config::SwarmConfig;
pub use error::{SwarmError, SwarmResult};
pub use notify::{CallbackSink, DamageOutcome, InboundMessage, Notification, NotificationSink, NullSink};
pub use pool::EnemyPool;
pub use spatial::SpatialGrid;
pub use world::{AgentSnapshot, RenderFrame};
