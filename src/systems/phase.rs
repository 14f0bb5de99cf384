//! Behavior phase state machine.
//!
//! Idle → Orbit when the player comes within `awareness_radius`; Orbit → Idle
//! beyond `awareness_radius * awareness_hysteresis`; Orbit → Attack when the
//! orbit countdown expires; Attack → Orbit when the charge ends.
//!
//! ## Data Access
//! - Reads: DeltaTime, SwarmConfig, PlayerPosition
//! - Writes: EnemyPool (phase, velocity on disengage), SwarmRng

use crate::components::{Lifecycle, Phase};
use crate::config::SwarmConfig;
use crate::pool::EnemyPool;
use crate::systems::movement::{DeltaTime, PlayerPosition};
use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Seeded RNG shared by spawning and attack scheduling.
#[derive(Resource, Debug, Clone)]
pub struct SwarmRng(pub ChaCha8Rng);

impl SwarmRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Uniform delay before the next charge.
    pub fn attack_interval(&mut self, config: &SwarmConfig) -> f32 {
        self.0
            .gen_range(config.min_attack_interval..=config.max_attack_interval)
    }

    /// +1 or -1 with equal odds.
    pub fn orbit_direction(&mut self) -> f32 {
        if self.0.gen_bool(0.5) {
            1.0
        } else {
            -1.0
        }
    }
}

/// Which edge of the state machine fired this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// Idle → Orbit
    Engage,
    /// Orbit → Idle
    Disengage,
    /// Orbit → Attack
    Charge,
    /// Attack → Orbit
    Recover,
}

/// Compute the next phase for an agent whose offset to the player is `to_player`.
///
/// `reseed` supplies the next orbit countdown and is only called on Attack → Orbit.
pub fn next_phase(
    phase: Phase,
    to_player: Vec3,
    dt: f32,
    config: &SwarmConfig,
    reseed: impl FnOnce() -> f32,
) -> (Phase, Transition) {
    let distance = to_player.length();
    match phase {
        Phase::Idle { cooldown } => {
            if distance < config.awareness_radius {
                (Phase::Orbit { timer: cooldown }, Transition::Engage)
            } else {
                (phase, Transition::None)
            }
        }
        Phase::Orbit { timer } => {
            if distance > config.disengage_radius() {
                return (Phase::Idle { cooldown: timer }, Transition::Disengage);
            }
            let timer = timer - dt;
            if timer <= 0.0 {
                // Aim is locked here for the whole charge
                let direction = to_player.normalize_or_zero();
                (
                    Phase::Attack {
                        timer: config.attack_duration,
                        direction,
                        struck: false,
                    },
                    Transition::Charge,
                )
            } else {
                (Phase::Orbit { timer }, Transition::None)
            }
        }
        Phase::Attack {
            timer,
            direction,
            struck,
        } => {
            let timer = timer - dt;
            if timer <= 0.0 {
                (Phase::Orbit { timer: reseed() }, Transition::Recover)
            } else {
                (
                    Phase::Attack {
                        timer,
                        direction,
                        struck,
                    },
                    Transition::None,
                )
            }
        }
    }
}

/// System that advances every Alive agent's phase by one tick.
pub fn phase_transition_system(
    dt: Res<DeltaTime>,
    config: Res<SwarmConfig>,
    player: Res<PlayerPosition>,
    mut rng: ResMut<SwarmRng>,
    mut pool: ResMut<EnemyPool>,
) {
    let delta = dt.0;
    for agent in pool.active_mut() {
        let Lifecycle::Alive(phase) = &mut agent.lifecycle else {
            continue;
        };

        let to_player = player.0 - agent.position;
        let (next, transition) = next_phase(*phase, to_player, delta, &config, || {
            rng.attack_interval(&config)
        });
        *phase = next;

        match transition {
            Transition::None => {}
            Transition::Disengage => {
                agent.velocity = Vec3::ZERO;
                debug!(id = %agent.id, "disengaged");
            }
            other => debug!(id = %agent.id, transition = ?other, "phase transition"),
        }
    }
}
