//! Public API for the swarm simulation.
//!
//! `SwarmSim` is the only thing a host needs to hold. It owns the ECS world,
//! the tick schedule and the outbound notification sink.
//!
//! ## Threading
//!
//! Every mutating call takes `&mut self`, so inbound damage can never land in
//! the middle of a tick. Collaborators only ever receive copies
//! ([`RenderFrame`], [`Agent`], instance buffers).
//!
//! ## Sub-stepping
//!
//! `tick(dt, ..)` splits the caller's frame into equal sub-steps no longer
//! than `max_dt`, so a long frame neither flings agents across the map nor
//! falls behind the caller's clock. Notifications are flushed once, after the
//! last sub-step.

use crate::components::{Agent, AgentId, PhaseKind};
use crate::config::SwarmConfig;
use crate::notify::{DamageOutcome, InboundMessage, Notification, NotificationSink, NullSink, Outbox};
use crate::pool::EnemyPool;
use crate::spatial::{spatial_grid_update_system, SpatialGrid};
use crate::systems::*;
use crate::world::RenderFrame;
use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::Rng;
use tracing::{debug, info, warn};

/// The swarm simulation container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Spawning agents
/// - Stepping the simulation forward
/// - Applying identifier-keyed damage from the health collaborator
/// - Extracting render snapshots
pub struct SwarmSim {
    world: World,
    schedule: Schedule,
    sink: Box<dyn NotificationSink>,
}

impl SwarmSim {
    /// Create a simulation with default configuration that discards notifications.
    pub fn new() -> Self {
        Self::with_config(SwarmConfig::default())
    }

    pub fn with_config(config: SwarmConfig) -> Self {
        Self::with_sink(config, NullSink)
    }

    /// Create a simulation that delivers notifications to `sink` after every call.
    pub fn with_sink(mut config: SwarmConfig, sink: impl NotificationSink + 'static) -> Self {
        config.sanitize();
        info!(
            capacity = config.capacity,
            seed = config.seed,
            max_dt = config.max_dt,
            max_substeps = config.max_substeps,
            awareness_radius = config.awareness_radius,
            orbit_radius = config.orbit_radius,
            cell_size = config.alignment_radius,
            "swarm simulation created"
        );

        let mut world = World::new();
        world.insert_resource(EnemyPool::with_capacity(config.capacity));
        world.insert_resource(SpatialGrid::new(config.alignment_radius));
        world.insert_resource(SwarmRng::from_seed(config.seed));
        world.insert_resource(DeltaTime(0.0));
        world.insert_resource(SimClock::default());
        world.insert_resource(PlayerPosition::default());
        world.insert_resource(Outbox::default());
        world.insert_resource(config);

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                spatial_grid_update_system,
                phase_transition_system,
                steering_system,
                movement_system,
                player_contact_system,
                death_system,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            sink: Box::new(sink),
        }
    }

    /// Replace the notification sink. Already-delivered notifications are not replayed.
    pub fn set_sink(&mut self, sink: impl NotificationSink + 'static) {
        self.sink = Box::new(sink);
    }

    // ========================================================================
    // SPAWNING
    // ========================================================================

    /// Spawn up to `count` agents at `positions`.
    ///
    /// Returns how many were actually spawned: at most `count`, at most
    /// `positions.len()`, and no more than the pool has room for. Non-finite
    /// positions are skipped.
    pub fn spawn(&mut self, count: usize, positions: &[Vec3]) -> usize {
        let config = self.config().clone();
        let mut spawned = 0;

        for &position in positions.iter().take(count) {
            if !position.is_finite() {
                warn!(?position, "skipping spawn at non-finite position");
                continue;
            }

            let (orbit_direction, cooldown) = {
                let mut rng = self.world.resource_mut::<SwarmRng>();
                (rng.orbit_direction(), rng.attack_interval(&config))
            };

            let inserted = {
                let mut pool = self.world.resource_mut::<EnemyPool>();
                let agent = Agent::spawn(pool.next_id(), position, config.max_health, orbit_direction, cooldown);
                pool.insert(agent).map(|_| agent)
            };
            let agent = match inserted {
                Ok(agent) => agent,
                Err(err) => {
                    debug!(%err, spawned, requested = count, "spawn stopped early");
                    break;
                }
            };

            self.world.resource_mut::<Outbox>().push(Notification::Registered {
                id: agent.id,
                health: agent.health.current,
                max_health: agent.health.max,
            });
            spawned += 1;
        }

        self.flush();
        spawned
    }

    /// Spawn `count` agents uniformly inside a sphere of `radius` around `center`.
    pub fn spawn_scattered(&mut self, count: usize, center: Vec3, radius: f32) -> usize {
        let radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
        let positions: Vec<Vec3> = {
            let mut rng = self.world.resource_mut::<SwarmRng>();
            (0..count)
                .map(|_| {
                    // Rejection sample the unit ball
                    loop {
                        let p = Vec3::new(
                            rng.0.gen_range(-1.0..=1.0),
                            rng.0.gen_range(-1.0..=1.0),
                            rng.0.gen_range(-1.0..=1.0),
                        );
                        if p.length_squared() <= 1.0 {
                            break center + p * radius;
                        }
                    }
                })
                .collect()
        };
        self.spawn(count, &positions)
    }

    // ========================================================================
    // INBOUND NOTIFICATIONS
    // ========================================================================

    /// Apply damage reported by the health collaborator.
    ///
    /// Crossing 0 health starts the agent's death exactly once; anything
    /// aimed at a Dying, removed or unknown agent is ignored.
    pub fn notify_damage(&mut self, id: AgentId, amount: f32) -> DamageOutcome {
        if !amount.is_finite() || amount <= 0.0 {
            debug!(%id, amount, "ignoring non-positive damage");
            return DamageOutcome::Ignored;
        }
        let now = self.world.resource::<SimClock>().elapsed;
        let mut pool = self.world.resource_mut::<EnemyPool>();
        let agent = match pool.get_mut(id) {
            Ok(agent) => agent,
            Err(err) => {
                warn!(%err, "damage notification dropped");
                return DamageOutcome::Ignored;
            }
        };
        if !agent.lifecycle.is_alive() {
            return DamageOutcome::Ignored;
        }

        if agent.health.damage(amount) {
            agent.begin_dying(now);
            debug!(%id, "killed by damage");
            DamageOutcome::Killed
        } else {
            DamageOutcome::Damaged
        }
    }

    /// Force an agent into its death animation regardless of health.
    pub fn notify_external_death(&mut self, id: AgentId) -> DamageOutcome {
        let now = self.world.resource::<SimClock>().elapsed;
        let mut pool = self.world.resource_mut::<EnemyPool>();
        let agent = match pool.get_mut(id) {
            Ok(agent) => agent,
            Err(err) => {
                warn!(%err, "death notification dropped");
                return DamageOutcome::Ignored;
            }
        };
        if !agent.begin_dying(now) {
            return DamageOutcome::Ignored;
        }
        agent.health.current = 0.0;
        debug!(%id, "killed externally");
        DamageOutcome::Killed
    }

    /// Route a host message to the matching `notify_*` call.
    pub fn apply(&mut self, message: InboundMessage) -> DamageOutcome {
        match message {
            InboundMessage::Damage { id, amount } => self.notify_damage(id, amount),
            InboundMessage::Kill { id } => self.notify_external_death(id),
        }
    }

    // ========================================================================
    // STEPPING
    // ========================================================================

    /// Advance the simulation by `dt` seconds of caller time.
    ///
    /// Frames longer than `max_dt` run as `ceil(dt / max_dt)` equal sub-steps,
    /// at most `max_substeps`; only a stall longer than `max_dt * max_substeps`
    /// loses time. A non-finite or negative `dt` runs one zero-length step.
    /// A non-finite `player_position` keeps the previous one.
    pub fn tick(&mut self, dt: f32, player_position: Vec3) {
        let (max_dt, max_substeps) = {
            let config = self.config();
            (config.max_dt, config.max_substeps)
        };
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let steps = substep_count(dt, max_dt, max_substeps);
        let step_dt = (dt / steps as f32).min(max_dt);
        if steps == max_substeps && dt > max_dt * max_substeps as f32 {
            debug!(dt, steps, step_dt, "frame longer than the sub-step budget, truncating");
        }

        if player_position.is_finite() {
            self.world.resource_mut::<PlayerPosition>().0 = player_position;
        } else {
            warn!(?player_position, "ignoring non-finite player position");
        }
        self.world.resource_mut::<DeltaTime>().0 = step_dt;

        for _ in 0..steps {
            self.world.resource_mut::<SimClock>().advance(step_dt);
            self.schedule.run(&mut self.world);
            self.world.resource::<EnemyPool>().debug_validate();
        }
        self.flush();
    }

    fn flush(&mut self) {
        let mut outbox = self.world.resource_mut::<Outbox>();
        outbox.flush_into(self.sink.as_mut());
    }

    // ========================================================================
    // READ ACCESS
    // ========================================================================

    pub fn active_count(&self) -> usize {
        self.pool().active_count()
    }

    pub fn capacity(&self) -> usize {
        self.pool().capacity()
    }

    /// Schedule runs so far; a sub-stepped `tick` counts each sub-step.
    pub fn current_tick(&self) -> u64 {
        self.world.resource::<SimClock>().tick
    }

    pub fn current_time(&self) -> f64 {
        self.world.resource::<SimClock>().elapsed
    }

    pub fn config(&self) -> &SwarmConfig {
        self.world.resource::<SwarmConfig>()
    }

    /// Position of the agent in `slot`, valid until the next tick.
    pub fn position(&self, slot: usize) -> Option<Vec3> {
        self.pool().agent_at(slot).map(|agent| agent.position)
    }

    pub fn health_fraction(&self, slot: usize) -> Option<f32> {
        self.pool().agent_at(slot).map(|agent| agent.health.fraction())
    }

    /// `None` for empty slots and for Dying agents.
    pub fn phase(&self, slot: usize) -> Option<PhaseKind> {
        self.pool().agent_at(slot)?.phase().map(|phase| phase.kind())
    }

    pub fn death_progress(&self, slot: usize) -> Option<f32> {
        let now = self.current_time();
        let duration = self.config().death_duration;
        self.pool()
            .agent_at(slot)
            .map(|agent| agent.death_progress(now, duration))
    }

    /// Identifier drawn at `render_index`. Render index equals slot index.
    pub fn identifier_for_render_index(&self, render_index: usize) -> Option<AgentId> {
        self.pool()
            .agent_at(render_index)
            .filter(|agent| !agent.lifecycle.is_dead())
            .map(|agent| agent.id)
    }

    /// Copy of the agent currently bound to `id`.
    pub fn agent(&self, id: AgentId) -> Option<Agent> {
        self.pool().get(id).ok().copied()
    }

    /// Identifiers of every live or dying agent, in slot order.
    pub fn ids(&self) -> Vec<AgentId> {
        self.pool().ids().collect()
    }

    pub fn render_frame(&self) -> RenderFrame {
        let clock = self.world.resource::<SimClock>();
        RenderFrame::from_pool(self.pool(), clock.tick, clock.elapsed, self.config().death_duration)
    }

    pub fn render_frame_json(&self) -> String {
        self.render_frame()
            .to_json()
            .unwrap_or_else(|_| "{}".to_string())
    }

    pub fn pool(&self) -> &EnemyPool {
        self.world.resource::<EnemyPool>()
    }

    /// Get the spatial grid reference (for debugging/visualization).
    pub fn spatial_grid(&self) -> &SpatialGrid {
        self.world.resource::<SpatialGrid>()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }
}

/// Sub-steps needed to cover `dt` without any step exceeding `max_dt`.
fn substep_count(dt: f32, max_dt: f32, max_substeps: u32) -> u32 {
    // Slack keeps an exact multiple of max_dt from rounding up to an extra step
    let steps = (dt / max_dt - 1.0e-4).ceil().max(1.0);
    (steps as u32).min(max_substeps)
}

impl Default for SwarmSim {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Lifecycle;
    use std::sync::mpsc::{channel, Receiver};

    fn with_channel(config: SwarmConfig) -> (SwarmSim, Receiver<Notification>) {
        let (tx, rx) = channel();
        (SwarmSim::with_sink(config, tx), rx)
    }

    fn far_away() -> Vec3 {
        Vec3::new(1000.0, 0.0, 0.0)
    }

    #[test]
    fn test_new_sim() {
        let sim = SwarmSim::new();
        assert_eq!(sim.current_tick(), 0);
        assert_eq!(sim.active_count(), 0);
        assert_eq!(sim.capacity(), SwarmConfig::default().capacity);
    }

    #[test]
    fn test_tick_substeps_long_frames() {
        let mut sim = SwarmSim::new();
        sim.tick(0.05, Vec3::ZERO);
        assert_eq!(sim.current_tick(), 1);
        assert!((sim.current_time() - 0.05).abs() < 1e-6);

        // 0.25s at max_dt 0.1 runs as three equal sub-steps
        sim.tick(0.25, Vec3::ZERO);
        assert_eq!(sim.current_tick(), 4);
        assert!((sim.current_time() - 0.30).abs() < 1e-5);

        // A stall is capped at max_substeps * max_dt
        sim.tick(5.0, Vec3::ZERO);
        assert_eq!(sim.current_tick(), 12);
        assert!((sim.current_time() - 1.10).abs() < 1e-5);

        sim.tick(f32::NAN, Vec3::ZERO);
        sim.tick(-1.0, Vec3::ZERO);
        assert_eq!(sim.current_tick(), 14);
        assert!((sim.current_time() - 1.10).abs() < 1e-5);
    }

    #[test]
    fn test_substep_count() {
        assert_eq!(substep_count(0.0, 0.1, 8), 1);
        assert_eq!(substep_count(0.1, 0.1, 8), 1);
        assert_eq!(substep_count(0.5, 0.1, 8), 5);
        assert_eq!(substep_count(0.51, 0.1, 8), 6);
        assert_eq!(substep_count(60.0, 0.1, 8), 8);
    }

    #[test]
    fn test_single_long_tick_finishes_death() {
        let (mut sim, rx) = with_channel(SwarmConfig::default());
        sim.spawn(1, &[Vec3::ZERO]);
        let id = sim.identifier_for_render_index(0).unwrap();
        rx.try_iter().for_each(drop);

        assert_eq!(sim.notify_damage(id, 5.0), DamageOutcome::Killed);
        let death_duration = sim.config().death_duration;
        sim.tick(death_duration, far_away());

        assert_eq!(sim.active_count(), 0);
        assert!(sim.current_time() >= death_duration as f64 - 1e-6);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![Notification::Removed { id }]);
    }

    #[test]
    fn test_swarm_far_from_origin_keeps_ticking() {
        let mut sim = SwarmSim::new();
        let far = Vec3::new(1.0e10, 0.0, 0.0);
        assert_eq!(sim.spawn(2, &[far, far + Vec3::new(0.0, 0.0, 2048.0)]), 2);

        sim.tick(1.0 / 60.0, far);
        sim.tick(1.0 / 60.0, far);

        assert_eq!(sim.current_tick(), 2);
        assert_eq!(sim.active_count(), 2);
        assert!(sim.render_frame().agents.iter().all(|a| a.x.is_finite() && a.z.is_finite()));
    }

    #[test]
    fn test_spawn_registers_each_agent() {
        let (mut sim, rx) = with_channel(SwarmConfig::default());
        let spawned = sim.spawn(2, &[Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(spawned, 2);

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                Notification::Registered { id: AgentId(1), health: 5.0, max_health: 5.0 },
                Notification::Registered { id: AgentId(2), health: 5.0, max_health: 5.0 },
            ]
        );
        for slot in 0..2 {
            assert_eq!(sim.phase(slot), Some(PhaseKind::Idle));
            assert_eq!(sim.health_fraction(slot), Some(1.0));
        }
    }

    #[test]
    fn test_spawn_limited_by_positions_and_capacity() {
        let config = SwarmConfig { capacity: 4, ..Default::default() };
        let (mut sim, rx) = with_channel(config);

        assert_eq!(sim.spawn(5, &[Vec3::ZERO, Vec3::X]), 2);
        let positions = vec![Vec3::ONE; 10];
        assert_eq!(sim.spawn(10, &positions), 2);
        assert_eq!(sim.spawn(10, &positions), 0);
        assert_eq!(sim.active_count(), 4);
        assert_eq!(rx.try_iter().count(), 4);
    }

    #[test]
    fn test_spawn_skips_non_finite_positions() {
        let mut sim = SwarmSim::new();
        let spawned = sim.spawn(3, &[Vec3::ZERO, Vec3::new(f32::NAN, 0.0, 0.0), Vec3::X]);
        assert_eq!(spawned, 2);
        assert_eq!(sim.position(1), Some(Vec3::X));
    }

    #[test]
    fn test_spawn_scattered_stays_in_radius() {
        let mut sim = SwarmSim::new();
        let center = Vec3::new(5.0, 1.0, -3.0);
        assert_eq!(sim.spawn_scattered(200, center, 20.0), 200);
        for slot in 0..200 {
            let p = sim.position(slot).unwrap();
            assert!(p.distance(center) <= 20.0 + 1e-4);
        }
    }

    #[test]
    fn test_nearby_agents_enter_orbit_within_one_tick() {
        let config = SwarmConfig { awareness_radius: 10.0, ..Default::default() };
        let mut sim = SwarmSim::with_config(config);
        sim.spawn(
            3,
            &[Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 5.0), Vec3::new(-3.0, 4.0, 0.0)],
        );

        sim.tick(1.0 / 60.0, Vec3::ZERO);

        for slot in 0..3 {
            assert_eq!(sim.phase(slot), Some(PhaseKind::Orbit));
        }
    }

    #[test]
    fn test_lethal_damage_then_compaction_emits_one_removal() {
        let config = SwarmConfig {
            max_dt: 0.25,
            death_duration: 0.5,
            ..Default::default()
        };
        let (mut sim, rx) = with_channel(config);
        sim.spawn(1, &[Vec3::ZERO]);
        let id = sim.identifier_for_render_index(0).unwrap();
        rx.try_iter().for_each(drop);

        assert_eq!(sim.notify_damage(id, 5.0), DamageOutcome::Killed);
        assert_eq!(sim.phase(0), None);
        assert_eq!(sim.health_fraction(0), Some(0.0));

        sim.tick(0.25, far_away());
        assert_eq!(sim.active_count(), 1);
        assert!((sim.death_progress(0).unwrap() - 0.5).abs() < 1e-5);
        assert_eq!(rx.try_iter().count(), 0);

        sim.tick(0.25, far_away());
        assert_eq!(sim.active_count(), 0);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![Notification::Removed { id }]);

        sim.tick(0.25, far_away());
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn test_damage_is_idempotent_after_death() {
        let (mut sim, rx) = with_channel(SwarmConfig::default());
        sim.spawn(2, &[Vec3::ZERO, Vec3::X]);
        let id = sim.identifier_for_render_index(0).unwrap();

        assert_eq!(sim.notify_damage(id, 3.0), DamageOutcome::Damaged);
        assert_eq!(sim.notify_damage(id, 10.0), DamageOutcome::Killed);
        let dying = sim.agent(id).unwrap();
        assert_eq!(dying.health.current, 0.0);

        // Dying: further damage changes nothing
        assert_eq!(sim.notify_damage(id, 1.0), DamageOutcome::Ignored);
        assert_eq!(sim.notify_external_death(id), DamageOutcome::Ignored);
        assert_eq!(sim.agent(id).unwrap(), dying);

        for _ in 0..20 {
            sim.tick(0.1, far_away());
        }
        assert!(sim.agent(id).is_none());
        rx.try_iter().for_each(drop);

        // Removed: unknown id
        let before = sim.render_frame();
        assert_eq!(sim.notify_damage(id, 1.0), DamageOutcome::Ignored);
        assert_eq!(sim.notify_external_death(id), DamageOutcome::Ignored);
        assert_eq!(sim.render_frame(), before);
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn test_bogus_damage_amounts_ignored() {
        let mut sim = SwarmSim::new();
        sim.spawn(1, &[Vec3::ZERO]);
        let id = sim.identifier_for_render_index(0).unwrap();
        for amount in [-1.0, 0.0, f32::NAN, f32::INFINITY] {
            assert_eq!(sim.notify_damage(id, amount), DamageOutcome::Ignored);
        }
        assert_eq!(sim.health_fraction(0), Some(1.0));
    }

    #[test]
    fn test_apply_routes_inbound_messages() {
        let mut sim = SwarmSim::new();
        sim.spawn(2, &[Vec3::ZERO, Vec3::X]);

        let hit = InboundMessage::from_json_str(r#"{"type":"Damage","id":1,"amount":2.0}"#).unwrap();
        assert_eq!(sim.apply(hit), DamageOutcome::Damaged);
        assert_eq!(sim.apply(InboundMessage::Kill { id: AgentId(2) }), DamageOutcome::Killed);
        assert!(sim.agent(AgentId(2)).unwrap().lifecycle.is_dying());
        assert_eq!(sim.apply(InboundMessage::Kill { id: AgentId(99) }), DamageOutcome::Ignored);
    }

    #[test]
    fn test_render_index_after_compaction_swap() {
        let config = SwarmConfig {
            max_dt: 0.25,
            death_duration: 0.25,
            ..Default::default()
        };
        let mut sim = SwarmSim::with_config(config);
        sim.spawn(3, &[Vec3::ZERO, Vec3::X, Vec3::Z]);
        let first = sim.identifier_for_render_index(0).unwrap();
        let last = sim.identifier_for_render_index(2).unwrap();

        sim.notify_external_death(first);
        sim.tick(0.25, far_away());

        assert_eq!(sim.active_count(), 2);
        assert_eq!(sim.identifier_for_render_index(0), Some(last));
        assert_eq!(sim.render_frame().identifier_at(0), Some(last));
        assert_eq!(sim.identifier_for_render_index(2), None);
        assert!(sim.agent(first).is_none());
    }

    #[test]
    fn test_invariants_hold_across_ticks() {
        let config = SwarmConfig {
            capacity: 64,
            min_attack_interval: 0.2,
            max_attack_interval: 0.5,
            ..Default::default()
        };
        let mut sim = SwarmSim::with_config(config);
        sim.spawn_scattered(64, Vec3::ZERO, 8.0);

        for step in 0..200 {
            // Kill and respawn a few agents every tick
            if let Some(id) = sim.identifier_for_render_index(step % 7) {
                sim.notify_damage(id, 2.5);
            }
            sim.spawn_scattered(3, Vec3::ZERO, 8.0);
            let angle = step as f32 * 0.05;
            sim.tick(1.0 / 30.0, Vec3::new(angle.cos(), 0.0, angle.sin()) * 4.0);

            let pool = sim.pool();
            pool.debug_validate();
            assert!(pool.active_count() <= pool.capacity());
            for (slot, agent) in pool.active().iter().enumerate() {
                assert!(!matches!(agent.lifecycle, Lifecycle::Dead), "hole at slot {slot}");
            }
            let mut ids = sim.ids();
            let total = ids.len();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), total);
        }
    }

    #[test]
    fn test_500_agents_stay_finite() {
        let mut sim = SwarmSim::new();
        assert_eq!(sim.spawn_scattered(500, Vec3::ZERO, 20.0), 500);

        for step in 0..100 {
            let t = step as f32 * 0.1;
            sim.tick(1.0 / 30.0, Vec3::new(t.sin() * 5.0, 0.0, t.cos() * 5.0));
            assert!(sim.active_count() <= sim.capacity());
        }

        for agent in sim.pool().active() {
            assert!(agent.position.is_finite(), "{} at {:?}", agent.id, agent.position);
            assert!(agent.velocity.is_finite());
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut sim = SwarmSim::with_config(SwarmConfig { seed: 7, ..Default::default() });
            sim.spawn_scattered(100, Vec3::ZERO, 10.0);
            for _ in 0..60 {
                sim.tick(1.0 / 30.0, Vec3::new(2.0, 0.0, 0.0));
            }
            sim.render_frame()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_charge_reaches_player() {
        let config = SwarmConfig {
            awareness_radius: 10.0,
            orbit_radius: 3.0,
            min_attack_interval: 0.0,
            max_attack_interval: 0.0,
            attack_duration: 1.0,
            attack_speed: 20.0,
            contact_radius: 1.0,
            contact_damage: 2.0,
            ..Default::default()
        };
        let (mut sim, rx) = with_channel(config);
        sim.spawn(1, &[Vec3::new(4.0, 0.0, 0.0)]);
        let id = sim.identifier_for_render_index(0).unwrap();
        rx.try_iter().for_each(drop);

        let mut contacts = Vec::new();
        for _ in 0..20 {
            sim.tick(1.0 / 60.0, Vec3::ZERO);
            contacts.extend(rx.try_iter());
        }
        assert_eq!(contacts, vec![Notification::PlayerContact { id, damage: 2.0 }]);
    }

    #[test]
    fn test_render_frame_json() {
        let mut sim = SwarmSim::new();
        sim.spawn(1, &[Vec3::ZERO]);
        let json = sim.render_frame_json();
        assert!(json.contains("agents"));
        assert!(json.contains("Idle"));
    }

    #[test]
    fn test_spatial_grid_populated() {
        let mut sim = SwarmSim::new();
        sim.spawn_scattered(50, Vec3::ZERO, 30.0);
        sim.tick(0.05, far_away());
        assert_eq!(sim.spatial_grid().total_count(), 50);
    }

    #[test]
    fn test_stress_1000_agents() {
        use std::time::Instant;

        let mut sim = SwarmSim::new();
        assert_eq!(sim.spawn_scattered(1000, Vec3::ZERO, 40.0), 1000);

        let start = Instant::now();
        let frames = 100;
        for i in 0..frames {
            let t = i as f32 / 30.0;
            sim.tick(1.0 / 30.0, Vec3::new(t.cos() * 10.0, 0.0, t.sin() * 10.0));
        }
        let elapsed = start.elapsed();

        println!(
            "1000 agents, {} ticks in {:?} ({:.2} ms/tick)",
            frames,
            elapsed,
            elapsed.as_millis() as f64 / frames as f64
        );
        assert!(elapsed.as_secs() < 30, "Simulation too slow: {:?}", elapsed);
        assert_eq!(sim.active_count(), 1000);
    }
}
