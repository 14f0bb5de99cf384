//! Error taxonomy for the swarm core.
//!
//! None of these are fatal to a tick. Pool exhaustion is absorbed by `spawn`,
//! unknown identifiers are logged and dropped by the notification bridge.

use crate::components::AgentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwarmError {
    /// Every slot holds a live or dying agent.
    #[error("enemy pool exhausted ({capacity} slots in use)")]
    PoolExhausted { capacity: usize },

    /// No active slot is bound to this identifier (already removed, or never spawned).
    #[error("unknown agent identifier {0}")]
    UnknownIdentifier(AgentId),

    #[error("invalid swarm config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type SwarmResult<T> = Result<T, SwarmError>;
