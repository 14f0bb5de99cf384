//! Movement system - integrates velocity into position and applies the idle bob.

use crate::components::{Lifecycle, Phase};
use crate::config::SwarmConfig;
use crate::pool::EnemyPool;
use bevy_ecs::prelude::*;
use glam::Vec3;
use std::f64::consts::TAU;

/// Resource containing the delta time for the current tick.
#[derive(Resource, Default)]
pub struct DeltaTime(pub f32);

/// Tracked player position for the current tick.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct PlayerPosition(pub Vec3);

/// Simulation clock. Death timestamps are read from `elapsed`.
///
/// Kept in f64 so long sessions don't lose sub-frame resolution.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct SimClock {
    pub elapsed: f64,
    pub tick: u64,
}

impl SimClock {
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt as f64;
        self.tick = self.tick.wrapping_add(1);
    }
}

/// Vertical bob displacement rate for an idle agent at time `t`.
///
/// Derivative of `amplitude * sin(2π f t + phase)`, so integrating it each
/// tick keeps the agent oscillating around where it went idle.
#[inline]
pub fn idle_bob_rate(config: &SwarmConfig, bob_phase: f32, t: f64) -> f32 {
    let omega = TAU * config.bob_frequency as f64;
    // Wrap in f64 before narrowing so the angle stays precise late in a session
    let angle = (omega * t).rem_euclid(TAU) as f32 + bob_phase;
    config.bob_amplitude * omega as f32 * angle.cos()
}

/// System that applies velocity to position for Alive agents.
pub fn movement_system(
    dt: Res<DeltaTime>,
    clock: Res<SimClock>,
    config: Res<SwarmConfig>,
    mut pool: ResMut<EnemyPool>,
) {
    let delta = dt.0;
    for agent in pool.active_mut() {
        let Lifecycle::Alive(phase) = agent.lifecycle else {
            continue;
        };

        agent.position += agent.velocity * delta;

        if let Phase::Idle { .. } = phase {
            agent.position.y += idle_bob_rate(&config, agent.bob_phase, clock.elapsed) * delta;
        }
    }
}
