//! Read-only snapshot types for the rendering collaborator.
//!
//! A `RenderFrame` lists agents in slot order, so an agent's index in
//! `agents` is its render index for that frame.

use crate::components::{AgentId, Lifecycle};
use crate::pool::EnemyPool;
use serde::{Deserialize, Serialize};

/// Snapshot of a single agent's visual state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    pub health: f32,
    pub health_max: f32,
    /// Phase name while alive, otherwise "Dying" or "Dead".
    pub state: String,
    /// 0 until dying, then rises to 1 when the agent is removed.
    pub death_progress: f32,
}

/// Complete visual state of the swarm for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f64,
    pub capacity: usize,
    /// Active agents in slot order.
    pub agents: Vec<AgentSnapshot>,
}

impl RenderFrame {
    /// Build a frame from the pool's active region.
    pub fn from_pool(pool: &EnemyPool, tick: u64, time: f64, death_duration: f32) -> Self {
        let agents = pool
            .active()
            .iter()
            .map(|agent| {
                let state = match agent.lifecycle {
                    Lifecycle::Alive(phase) => phase.kind().as_str(),
                    Lifecycle::Dying { .. } => "Dying",
                    Lifecycle::Dead => "Dead",
                };
                AgentSnapshot {
                    id: agent.id,
                    x: agent.position.x,
                    y: agent.position.y,
                    z: agent.position.z,
                    vx: agent.velocity.x,
                    vy: agent.velocity.y,
                    vz: agent.velocity.z,
                    health: agent.health.current,
                    health_max: agent.health.max,
                    state: state.to_string(),
                    death_progress: agent.death_progress(time, death_duration),
                }
            })
            .collect();

        Self {
            tick,
            time,
            capacity: pool.capacity(),
            agents,
        }
    }

    /// Identifier drawn at `render_index` in this frame. `None` for Dead holes.
    pub fn identifier_at(&self, render_index: usize) -> Option<AgentId> {
        self.agents
            .get(render_index)
            .filter(|a| a.state != "Dead")
            .map(|a| a.id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}
