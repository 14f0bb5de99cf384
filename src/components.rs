//! Agent records stored in the enemy pool.
//!
//! Agents are not ECS entities: they live densely in `EnemyPool` slots and are
//! addressed from outside by `AgentId` only. Per-phase data is carried by the
//! `Phase` variants so nothing is "valid only sometimes".

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// IDENTITY
// ============================================================================

/// Stable identifier of one agent, handed to the health and render collaborators.
///
/// Issued from a monotonically increasing counter and never re-used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl AgentId {
    /// Placeholder carried by free slots. Never issued to a spawned agent.
    pub const VACANT: AgentId = AgentId(0);

    pub fn is_vacant(self) -> bool {
        self == Self::VACANT
    }

    /// Stable 32-bit hash of the identifier (splitmix64 finalizer).
    pub fn stable_hash(self) -> u32 {
        let mut z = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        (z ^ (z >> 31)) as u32
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enemy-{}", self.0)
    }
}

// ============================================================================
// HEALTH
// ============================================================================

/// Health of an agent. `current` stays within `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    /// Apply damage, clamped at zero.
    /// Returns true only on the call that takes health from positive to zero.
    pub fn damage(&mut self, amount: f32) -> bool {
        let was_alive = self.current > 0.0;
        self.current = (self.current - amount).max(0.0);
        was_alive && self.current <= 0.0
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(5.0)
    }
}

// ============================================================================
// BEHAVIOR PHASE
// ============================================================================

/// Behavioral mode of an Alive agent, with the payload each mode needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the player. `cooldown` is the parked orbit countdown,
    /// restored when the agent starts orbiting again.
    Idle { cooldown: f32 },
    /// Circling the player. `timer` counts down to the next charge.
    Orbit { timer: f32 },
    /// Charging in a fixed direction until `timer` runs out.
    Attack {
        timer: f32,
        direction: Vec3,
        /// Whether this charge already reached the player.
        struck: bool,
    },
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle { .. } => PhaseKind::Idle,
            Phase::Orbit { .. } => PhaseKind::Orbit,
            Phase::Attack { .. } => PhaseKind::Attack,
        }
    }

    /// Flocking only acts between orbiting and charging agents.
    pub fn is_flocking(&self) -> bool {
        !matches!(self, Phase::Idle { .. })
    }
}

/// Payload-free phase tag for read-only consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKind {
    Idle,
    Orbit,
    Attack,
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Idle => "Idle",
            PhaseKind::Orbit => "Orbit",
            PhaseKind::Attack => "Attack",
        }
    }
}

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Lifecycle of a pool slot. Phase exists only while Alive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Lifecycle {
    Alive(Phase),
    /// Playing the death animation since `started_at` (simulation seconds).
    Dying { started_at: f64 },
    Dead,
}

impl Lifecycle {
    pub fn is_alive(&self) -> bool {
        matches!(self, Lifecycle::Alive(_))
    }

    pub fn is_dying(&self) -> bool {
        matches!(self, Lifecycle::Dying { .. })
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, Lifecycle::Dead)
    }

    pub fn phase(&self) -> Option<&Phase> {
        match self {
            Lifecycle::Alive(phase) => Some(phase),
            _ => None,
        }
    }
}

// ============================================================================
// AGENT
// ============================================================================

/// One particle enemy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub health: Health,
    pub lifecycle: Lifecycle,
    /// +1 or -1; rotational bias while orbiting.
    pub orbit_direction: f32,
    /// Idle bob offset in radians, derived from the identifier.
    pub bob_phase: f32,
}

impl Agent {
    /// A freshly spawned agent, idle at `position`.
    pub fn spawn(id: AgentId, position: Vec3, max_health: f32, orbit_direction: f32, cooldown: f32) -> Self {
        let bob_phase = (id.stable_hash() as f32 / u32::MAX as f32) * std::f32::consts::TAU;
        Self {
            id,
            position,
            velocity: Vec3::ZERO,
            health: Health::new(max_health),
            lifecycle: Lifecycle::Alive(Phase::Idle { cooldown }),
            orbit_direction: if orbit_direction < 0.0 { -1.0 } else { 1.0 },
            bob_phase,
        }
    }

    /// Contents of a free slot.
    pub fn vacant() -> Self {
        Self {
            id: AgentId::VACANT,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            health: Health { current: 0.0, max: 0.0 },
            lifecycle: Lifecycle::Dead,
            orbit_direction: 1.0,
            bob_phase: 0.0,
        }
    }

    pub fn phase(&self) -> Option<&Phase> {
        self.lifecycle.phase()
    }

    /// Start dying at simulation time `now`. Returns false if not Alive.
    pub fn begin_dying(&mut self, now: f64) -> bool {
        if !self.lifecycle.is_alive() {
            return false;
        }
        self.lifecycle = Lifecycle::Dying { started_at: now };
        self.velocity = Vec3::ZERO;
        true
    }

    /// Death animation progress in `[0, 1]`; 0 for non-dying agents.
    pub fn death_progress(&self, now: f64, death_duration: f32) -> f32 {
        match self.lifecycle {
            Lifecycle::Dying { started_at } => {
                if death_duration <= 0.0 {
                    1.0
                } else {
                    ((now - started_at) / death_duration as f64).clamp(0.0, 1.0) as f32
                }
            }
            _ => 0.0,
        }
    }
}
