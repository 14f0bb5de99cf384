//! Tuning for the swarm simulation.
//!
//! All values are in world units and seconds. Load from JSON with
//! [`SwarmConfig::from_json_str`]; any missing field takes its default and
//! every field is clamped by [`SwarmConfig::sanitize`].

use crate::error::SwarmResult;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Number of pool slots.
    pub capacity: usize,
    /// Seed for the simulation RNG (orbit direction, attack intervals).
    pub seed: u64,
    /// Largest Δt a single schedule run integrates; longer frames are sub-stepped.
    pub max_dt: f32,
    /// Most sub-steps one `tick` may run. Time beyond `max_dt * max_substeps` is dropped.
    pub max_substeps: u32,

    // Lifecycle
    pub max_health: f32,
    /// Seconds between death and compaction.
    pub death_duration: f32,

    // Phase machine
    pub awareness_radius: f32,
    /// Orbit→Idle happens beyond `awareness_radius * awareness_hysteresis`.
    pub awareness_hysteresis: f32,
    pub orbit_radius: f32,
    /// Radial spring gain toward `orbit_radius`.
    pub orbit_spring: f32,
    /// Tangential push around the player.
    pub orbit_tangent: f32,
    pub max_speed: f32,
    pub attack_speed: f32,
    pub attack_duration: f32,
    pub min_attack_interval: f32,
    pub max_attack_interval: f32,

    // Idle bob
    pub bob_amplitude: f32,
    pub bob_frequency: f32,

    // Flocking
    pub separation_radius: f32,
    /// Also the spatial grid cell size.
    pub alignment_radius: f32,
    pub cohesion_radius: f32,
    pub separation_strength: f32,
    pub alignment_strength: f32,
    pub cohesion_strength: f32,

    // Player contact
    pub contact_radius: f32,
    pub contact_damage: f32,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            seed: 0x5EED_u64,
            max_dt: 0.1,
            max_substeps: 8,
            max_health: 5.0,
            death_duration: 0.5,
            awareness_radius: 10.0,
            awareness_hysteresis: 1.2,
            orbit_radius: 6.0,
            orbit_spring: 1.5,
            orbit_tangent: 4.0,
            max_speed: 6.0,
            attack_speed: 18.0,
            attack_duration: 0.6,
            min_attack_interval: 4.0,
            max_attack_interval: 10.0,
            bob_amplitude: 0.25,
            bob_frequency: 2.0,
            separation_radius: 1.5,
            alignment_radius: 4.0,
            cohesion_radius: 4.0,
            separation_strength: 8.0,
            alignment_strength: 1.0,
            cohesion_strength: 0.5,
            contact_radius: 1.0,
            contact_damage: 1.0,
        }
    }
}

impl SwarmConfig {
    /// Parse a (possibly partial) JSON config and sanitize it.
    pub fn from_json_str(json: &str) -> SwarmResult<Self> {
        let mut config: SwarmConfig = serde_json::from_str(json)?;
        config.sanitize();
        Ok(config)
    }

    /// Clamp every field to a usable range; non-finite values fall back to defaults.
    pub fn sanitize(&mut self) {
        let d = SwarmConfig::default();
        self.capacity = self.capacity.clamp(1, 65_536);
        self.max_dt = clamp_finite(self.max_dt, 1.0e-4, 1.0, d.max_dt);
        self.max_substeps = self.max_substeps.clamp(1, 64);
        self.max_health = clamp_finite(self.max_health, 0.01, 1.0e6, d.max_health);
        self.death_duration = clamp_finite(self.death_duration, 0.0, 60.0, d.death_duration);

        self.awareness_radius = clamp_finite(self.awareness_radius, 0.1, 1.0e4, d.awareness_radius);
        self.awareness_hysteresis =
            clamp_finite(self.awareness_hysteresis, 1.0, 4.0, d.awareness_hysteresis);
        self.orbit_radius = clamp_finite(self.orbit_radius, 0.0, 1.0e4, d.orbit_radius);
        self.orbit_spring = clamp_finite(self.orbit_spring, 0.0, 100.0, d.orbit_spring);
        self.orbit_tangent = clamp_finite(self.orbit_tangent, 0.0, 100.0, d.orbit_tangent);
        self.max_speed = clamp_finite(self.max_speed, 0.0, 1.0e3, d.max_speed);
        self.attack_speed = clamp_finite(self.attack_speed, 0.0, 1.0e3, d.attack_speed);
        self.attack_duration = clamp_finite(self.attack_duration, 0.01, 60.0, d.attack_duration);
        self.min_attack_interval =
            clamp_finite(self.min_attack_interval, 0.0, 600.0, d.min_attack_interval);
        self.max_attack_interval = clamp_finite(
            self.max_attack_interval,
            self.min_attack_interval,
            600.0,
            d.max_attack_interval.max(self.min_attack_interval),
        );

        self.bob_amplitude = clamp_finite(self.bob_amplitude, 0.0, 10.0, d.bob_amplitude);
        self.bob_frequency = clamp_finite(self.bob_frequency, 0.0, 60.0, d.bob_frequency);

        self.alignment_radius = clamp_finite(self.alignment_radius, 0.01, 1.0e3, d.alignment_radius);
        // The grid only looks one cell out, so no flocking radius may exceed the cell size.
        self.separation_radius = clamp_finite(
            self.separation_radius,
            0.0,
            self.alignment_radius,
            d.separation_radius.min(self.alignment_radius),
        );
        self.cohesion_radius = clamp_finite(
            self.cohesion_radius,
            0.0,
            self.alignment_radius,
            d.cohesion_radius.min(self.alignment_radius),
        );
        self.separation_strength =
            clamp_finite(self.separation_strength, 0.0, 1.0e3, d.separation_strength);
        self.alignment_strength =
            clamp_finite(self.alignment_strength, 0.0, 1.0e3, d.alignment_strength);
        self.cohesion_strength = clamp_finite(self.cohesion_strength, 0.0, 1.0e3, d.cohesion_strength);

        self.contact_radius = clamp_finite(self.contact_radius, 0.0, 1.0e3, d.contact_radius);
        self.contact_damage = clamp_finite(self.contact_damage, 0.0, 1.0e6, d.contact_damage);
    }

    /// Distance beyond which an orbiting agent loses interest.
    pub fn disengage_radius(&self) -> f32 {
        self.awareness_radius * self.awareness_hysteresis
    }
}

fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback.clamp(min, max)
    }
}
