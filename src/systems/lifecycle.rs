//! Lifecycle systems - player contact during charges and compaction of finished deaths.

use crate::components::{Lifecycle, Phase};
use crate::config::SwarmConfig;
use crate::notify::{Notification, Outbox};
use crate::pool::EnemyPool;
use crate::systems::movement::{PlayerPosition, SimClock};
use bevy_ecs::prelude::*;
use tracing::debug;

/// Slack on the death timer so accumulated float error can't add a tick.
const DEATH_SLACK: f64 = 1.0e-4;

/// System that reports a charging agent reaching the player, once per charge.
pub fn player_contact_system(
    config: Res<SwarmConfig>,
    player: Res<PlayerPosition>,
    mut pool: ResMut<EnemyPool>,
    mut outbox: ResMut<Outbox>,
) {
    let reach_sq = config.contact_radius * config.contact_radius;
    for agent in pool.active_mut() {
        let position = agent.position;
        let Lifecycle::Alive(Phase::Attack { struck, .. }) = &mut agent.lifecycle else {
            continue;
        };
        if *struck || position.distance_squared(player.0) > reach_sq {
            continue;
        }
        *struck = true;
        outbox.push(Notification::PlayerContact {
            id: agent.id,
            damage: config.contact_damage,
        });
    }
}

/// System that compacts agents whose death animation has finished.
///
/// Freeing slot `i` swaps the last active agent into `i`; the index is not
/// advanced after a free so the swapped-in agent is still visited this tick.
pub fn death_system(
    clock: Res<SimClock>,
    config: Res<SwarmConfig>,
    mut pool: ResMut<EnemyPool>,
    mut outbox: ResMut<Outbox>,
) {
    let now = clock.elapsed;
    let mut slot = 0;
    while slot < pool.active_count() {
        let Some(agent) = pool.agent_at(slot) else {
            break;
        };
        let (finished, announce) = match agent.lifecycle {
            Lifecycle::Alive(_) => (false, false),
            Lifecycle::Dying { started_at } => (now - started_at + DEATH_SLACK >= config.death_duration as f64, true),
            // Hole left by deferred compaction; nothing external knows this id anymore
            Lifecycle::Dead => (true, false),
        };
        if !finished {
            slot += 1;
            continue;
        }

        if let Some(freed) = pool.free(slot) {
            if announce {
                debug!(id = %freed.removed, slot, "compacted");
                outbox.push(Notification::Removed { id: freed.removed });
            }
        }
    }
}
