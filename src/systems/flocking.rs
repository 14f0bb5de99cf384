//! Flocking and orbit forces, and the steering system that turns them into velocity.
//!
//! ## Force Model
//! Separation, alignment and cohesion come from a single pass over the grid
//! candidates: one distance per candidate, bucketed by which radii it falls
//! inside. Idle agents neither exert nor receive flocking influence.
//!
//! ## Parallel Feature
//! The gather phase only reads the pool and grid, so with `--features parallel`
//! it runs on rayon; forces are applied sequentially afterwards.

use crate::components::{Agent, Lifecycle, Phase};
use crate::config::SwarmConfig;
use crate::pool::EnemyPool;
use crate::spatial::SpatialGrid;
use crate::systems::movement::{DeltaTime, PlayerPosition};
use bevy_ecs::prelude::*;
use glam::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Distances at or below this are treated as coincident.
const EPSILON: f32 = 1.0e-5;

fn is_flocking(agent: &Agent) -> bool {
    agent.phase().is_some_and(Phase::is_flocking)
}

/// Combined separation + alignment + cohesion force on the agent in `slot`.
///
/// `agents` is the pool's active region; `grid` must have been rebuilt from it.
pub fn flocking_force(slot: usize, agents: &[Agent], grid: &SpatialGrid, config: &SwarmConfig) -> Vec3 {
    let Some(me) = agents.get(slot) else {
        return Vec3::ZERO;
    };
    if !is_flocking(me) {
        return Vec3::ZERO;
    }

    let r_sep = config.separation_radius;
    let r_align = config.alignment_radius;
    let r_coh = config.cohesion_radius;

    let mut separation = Vec3::ZERO;
    let mut velocity_sum = Vec3::ZERO;
    let mut align_count = 0u32;
    let mut position_sum = Vec3::ZERO;
    let mut cohesion_count = 0u32;

    for other_slot in grid.neighbors_of(me.position) {
        if other_slot == slot {
            continue;
        }
        let Some(other) = agents.get(other_slot) else {
            continue;
        };
        if !is_flocking(other) {
            continue;
        }

        let offset = me.position - other.position;
        let dist = offset.length();
        if dist <= EPSILON || !dist.is_finite() {
            continue;
        }

        if dist < r_sep {
            separation += (offset / dist) * (1.0 - dist / r_sep);
        }
        if dist < r_align {
            velocity_sum += other.velocity;
            align_count += 1;
        }
        if dist < r_coh {
            position_sum += other.position;
            cohesion_count += 1;
        }
    }

    let mut force = separation * config.separation_strength;
    if align_count > 0 {
        let avg_velocity = velocity_sum / align_count as f32;
        force += (avg_velocity - me.velocity) * config.alignment_strength;
    }
    if cohesion_count > 0 {
        let center = position_sum / cohesion_count as f32;
        force += (center - me.position) * config.cohesion_strength;
    }
    force
}

/// Radial spring toward `orbit_radius` plus a tangential push around the player.
pub fn orbit_force(agent: &Agent, player: Vec3, config: &SwarmConfig) -> Vec3 {
    let to_player = player - agent.position;
    let dist = to_player.length();
    if dist <= EPSILON {
        return Vec3::ZERO;
    }
    let dir = to_player / dist;
    let radial = dir * (dist - config.orbit_radius) * config.orbit_spring;
    // Zero when the player is straight above or below
    let tangent = dir.cross(Vec3::Y).normalize_or_zero() * agent.orbit_direction * config.orbit_tangent;
    radial + tangent
}

/// Steering force for one slot; zero for anything not orbiting.
fn steering_force(slot: usize, agents: &[Agent], grid: &SpatialGrid, config: &SwarmConfig, player: Vec3) -> Vec3 {
    match agents[slot].phase() {
        Some(Phase::Orbit { .. }) => {
            flocking_force(slot, agents, grid, config) + orbit_force(&agents[slot], player, config)
        }
        _ => Vec3::ZERO,
    }
}

/// Gather phase: forces for every active slot.
pub fn gather_forces(agents: &[Agent], grid: &SpatialGrid, config: &SwarmConfig, player: Vec3) -> Vec<Vec3> {
    #[cfg(feature = "parallel")]
    {
        (0..agents.len())
            .into_par_iter()
            .map(|slot| steering_force(slot, agents, grid, config, player))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..agents.len())
            .map(|slot| steering_force(slot, agents, grid, config, player))
            .collect()
    }
}

/// System that sets each Alive agent's velocity for this tick.
///
/// - Idle: held at zero (the bob is applied to position by `movement_system`).
/// - Orbit: accumulates flocking + orbit force, clamped to `max_speed`.
/// - Attack: `direction * attack_speed`, no steering.
pub fn steering_system(
    dt: Res<DeltaTime>,
    config: Res<SwarmConfig>,
    player: Res<PlayerPosition>,
    grid: Res<SpatialGrid>,
    mut pool: ResMut<EnemyPool>,
) {
    let delta = dt.0;
    let forces = gather_forces(pool.active(), &grid, &config, player.0);

    for (agent, force) in pool.active_mut().iter_mut().zip(forces) {
        let Lifecycle::Alive(phase) = agent.lifecycle else {
            continue;
        };
        let velocity = match phase {
            Phase::Idle { .. } => Vec3::ZERO,
            Phase::Orbit { .. } => (agent.velocity + force * delta).clamp_length_max(config.max_speed),
            Phase::Attack { direction, .. } => direction * config.attack_speed,
        };
        agent.velocity = if velocity.is_finite() { velocity } else { Vec3::ZERO };
    }
}
