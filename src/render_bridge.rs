//! Render Integration Bridge
//!
//! Converts a [`RenderFrame`] into a flat `f32` buffer the renderer can upload
//! directly as per-instance data, one instance per active agent.
//!
//! # Stable Instance Contract
//!
//! Instance `i` in the buffer is render index `i`, which is slot `i` of the
//! pool for the frame the buffer was built from. Hit-testing against a drawn
//! frame must therefore resolve picks through that same frame (or buffer),
//! never through an older one.
//!
//! # Buffer Layout (Version 1.0)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ HEADER (1 element)                                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ [0] instance_count (as f32)                                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ INSTANCE DATA (instance_count × INSTANCE_STRIDE elements)       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ For each instance i (offset = 1 + i * INSTANCE_STRIDE):         │
//! │   [+0]  id_lo           - Low 24 bits of the agent id           │
//! │   [+1]  id_hi           - Remaining high bits of the agent id   │
//! │   [+2]  x               - X position (world units)              │
//! │   [+3]  y               - Y position (world units)              │
//! │   [+4]  z               - Z position (world units)              │
//! │   [+5]  vx              - X velocity (units/sec)                │
//! │   [+6]  vy              - Y velocity (units/sec)                │
//! │   [+7]  vz              - Z velocity (units/sec)                │
//! │   [+8]  health_fraction - health / max_health (0.0-1.0)         │
//! │   [+9]  state           - See STATE_* constants                 │
//! │   [+10] death_progress  - 0.0 alive, rising to 1.0 at removal   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ids are split in two so they stay exact in `f32` up to 2^48.

use crate::components::AgentId;
use crate::world::RenderFrame;

// ============================================================================
// CONSTANTS - STABLE INSTANCE CONTRACT
// ============================================================================

/// Number of f32 values per instance.
///
/// **Part of the stable render contract. Do not change without versioning.**
pub const INSTANCE_STRIDE: usize = 11;

/// Number of f32 values in the buffer header.
pub const HEADER_SIZE: usize = 1;

/// Ids are split at this many bits.
const ID_SPLIT_BITS: u32 = 24;
const ID_LO_MASK: u64 = (1 << ID_SPLIT_BITS) - 1;

/// State: idle bob
pub const STATE_IDLE: f32 = 0.0;
/// State: orbiting the player
pub const STATE_ORBIT: f32 = 1.0;
/// State: charging
pub const STATE_ATTACK: f32 = 2.0;
/// State: death animation
pub const STATE_DYING: f32 = 3.0;
/// State: vacant slot
pub const STATE_DEAD: f32 = 4.0;

/// Offset within instance data for: id low bits
pub const FIELD_ID_LO: usize = 0;
/// Offset within instance data for: id high bits
pub const FIELD_ID_HI: usize = 1;
/// Offset within instance data for: X position
pub const FIELD_X: usize = 2;
/// Offset within instance data for: Y position
pub const FIELD_Y: usize = 3;
/// Offset within instance data for: Z position
pub const FIELD_Z: usize = 4;
/// Offset within instance data for: X velocity
pub const FIELD_VX: usize = 5;
/// Offset within instance data for: Y velocity
pub const FIELD_VY: usize = 6;
/// Offset within instance data for: Z velocity
pub const FIELD_VZ: usize = 7;
/// Offset within instance data for: health fraction
pub const FIELD_HEALTH_FRACTION: usize = 8;
/// Offset within instance data for: state id
pub const FIELD_STATE: usize = 9;
/// Offset within instance data for: death progress
pub const FIELD_DEATH_PROGRESS: usize = 10;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Convert a snapshot state string to its numeric id.
///
/// Unknown strings map to `STATE_IDLE`.
#[inline]
pub fn state_to_id(state: &str) -> f32 {
    match state {
        "Idle" => STATE_IDLE,
        "Orbit" => STATE_ORBIT,
        "Attack" => STATE_ATTACK,
        "Dying" => STATE_DYING,
        "Dead" => STATE_DEAD,
        _ => STATE_IDLE,
    }
}

#[inline]
fn split_id(id: AgentId) -> (f32, f32) {
    ((id.0 & ID_LO_MASK) as f32, (id.0 >> ID_SPLIT_BITS) as f32)
}

#[inline]
fn join_id(lo: f32, hi: f32) -> AgentId {
    AgentId(((hi as u64) << ID_SPLIT_BITS) | (lo as u64 & ID_LO_MASK))
}

// ============================================================================
// MAIN SERIALIZATION FUNCTION
// ============================================================================

/// Convert a render frame to a flat instance buffer.
///
/// Deterministic: the same frame always produces the same buffer, instances
/// in slot order.
pub fn frame_to_instance_buffer(frame: &RenderFrame) -> Vec<f32> {
    let count = frame.agents.len();
    let buffer_size = calculate_buffer_size(count);
    let mut buffer = Vec::with_capacity(buffer_size);

    buffer.push(count as f32);

    for agent in &frame.agents {
        let (id_lo, id_hi) = split_id(agent.id);
        let health_fraction = if agent.health_max > 0.0 {
            (agent.health / agent.health_max).clamp(0.0, 1.0)
        } else {
            0.0
        };
        buffer.extend_from_slice(&[
            id_lo,
            id_hi,
            agent.x,
            agent.y,
            agent.z,
            agent.vx,
            agent.vy,
            agent.vz,
            health_fraction,
            state_to_id(&agent.state),
            agent.death_progress,
        ]);
    }

    debug_assert_eq!(buffer.len(), buffer_size, "Buffer size mismatch");
    buffer
}

/// `HEADER_SIZE + instance_count * INSTANCE_STRIDE`
#[inline]
pub fn calculate_buffer_size(instance_count: usize) -> usize {
    HEADER_SIZE + instance_count * INSTANCE_STRIDE
}

/// Returns `None` if the buffer is empty.
#[inline]
pub fn parse_instance_count(buffer: &[f32]) -> Option<usize> {
    buffer.first().map(|&count| count as usize)
}

#[inline]
pub const fn instance_offset(render_index: usize) -> usize {
    HEADER_SIZE + render_index * INSTANCE_STRIDE
}

/// Resolve a picked instance back to its agent id using the buffer it was drawn from.
///
/// Dead instances resolve to `None`.
pub fn identifier_at(buffer: &[f32], render_index: usize) -> Option<AgentId> {
    let count = parse_instance_count(buffer)?;
    if render_index >= count {
        return None;
    }
    let offset = instance_offset(render_index);
    if *buffer.get(offset + FIELD_STATE)? == STATE_DEAD {
        return None;
    }
    let lo = *buffer.get(offset + FIELD_ID_LO)?;
    let hi = *buffer.get(offset + FIELD_ID_HI)?;
    Some(join_id(lo, hi))
}

// ============================================================================
// TESTS
// ============================================================================
