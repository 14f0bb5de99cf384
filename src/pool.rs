//! Fixed-capacity dense pool of agents.
//!
//! Slots `[0, active_count)` hold Alive or Dying agents; slots
//! `[active_count, capacity)` hold vacant (Dead) records. Freeing a slot
//! swaps the last active agent into it, so slot indices are only meaningful
//! within one tick. Across ticks, address agents by [`AgentId`].

use crate::components::{Agent, AgentId};
use crate::error::{SwarmError, SwarmResult};
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Result of freeing a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freed {
    /// Identifier that was bound to the freed slot.
    pub removed: AgentId,
    /// Agent that was swapped into the freed slot, if any.
    pub moved: Option<AgentId>,
}

#[derive(Resource, Debug)]
pub struct EnemyPool {
    slots: Vec<Agent>,
    active_count: usize,
    /// Identifier → current slot. Only non-Dead agents are present.
    index: HashMap<AgentId, usize>,
    next_id: u64,
}

impl EnemyPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![Agent::vacant(); capacity],
            active_count: 0,
            index: HashMap::with_capacity(capacity),
            next_id: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn free_slots(&self) -> usize {
        self.capacity() - self.active_count
    }

    /// Issue a fresh identifier. Never returns [`AgentId::VACANT`].
    pub fn next_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Reserve a slot.
    ///
    /// Grows the active region while there is room. At capacity, falls back to
    /// reusing a Dead slot inside the active region (only possible when
    /// compaction was deferred).
    pub fn allocate(&mut self) -> SwarmResult<usize> {
        if self.active_count < self.capacity() {
            let slot = self.active_count;
            self.active_count += 1;
            return Ok(slot);
        }
        self.slots[..self.active_count]
            .iter()
            .position(|agent| agent.lifecycle.is_dead())
            .ok_or(SwarmError::PoolExhausted { capacity: self.capacity() })
    }

    /// Allocate a slot and place `agent` in it.
    pub fn insert(&mut self, agent: Agent) -> SwarmResult<usize> {
        debug_assert!(!agent.id.is_vacant(), "vacant id inserted into pool");
        let slot = self.allocate()?;
        let old = self.slots[slot].id;
        if !old.is_vacant() {
            self.index.remove(&old);
        }
        self.slots[slot] = agent;
        self.index.insert(agent.id, slot);
        Ok(slot)
    }

    /// Release `slot`, swap-compacting the last active agent into it.
    pub fn free(&mut self, slot: usize) -> Option<Freed> {
        if slot >= self.active_count {
            return None;
        }
        let last = self.active_count - 1;
        let removed = self.slots[slot].id;
        self.index.remove(&removed);

        let moved = if slot != last {
            self.slots.swap(slot, last);
            let moved_id = self.slots[slot].id;
            if !self.slots[slot].lifecycle.is_dead() {
                self.index.insert(moved_id, slot);
            }
            Some(moved_id)
        } else {
            None
        };

        self.slots[last] = Agent::vacant();
        self.active_count = last;
        Some(Freed { removed, moved })
    }

    pub fn agent_at(&self, slot: usize) -> Option<&Agent> {
        if slot < self.active_count {
            self.slots.get(slot)
        } else {
            None
        }
    }

    pub fn agent_at_mut(&mut self, slot: usize) -> Option<&mut Agent> {
        if slot < self.active_count {
            self.slots.get_mut(slot)
        } else {
            None
        }
    }

    pub fn slot_of(&self, id: AgentId) -> SwarmResult<usize> {
        self.index
            .get(&id)
            .copied()
            .ok_or(SwarmError::UnknownIdentifier(id))
    }

    pub fn get(&self, id: AgentId) -> SwarmResult<&Agent> {
        let slot = self.slot_of(id)?;
        Ok(&self.slots[slot])
    }

    pub fn get_mut(&mut self, id: AgentId) -> SwarmResult<&mut Agent> {
        let slot = self.slot_of(id)?;
        Ok(&mut self.slots[slot])
    }

    /// Active region as a slice, indexed by slot.
    pub fn active(&self) -> &[Agent] {
        &self.slots[..self.active_count]
    }

    pub fn active_mut(&mut self) -> &mut [Agent] {
        &mut self.slots[..self.active_count]
    }

    /// Identifiers of all non-Dead agents, in slot order.
    pub fn ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.active()
            .iter()
            .filter(|agent| !agent.lifecycle.is_dead())
            .map(|agent| agent.id)
    }

    /// Mark an agent Dead without compacting its slot.
    ///
    /// Leaves a hole inside the active region that only `allocate` at capacity
    /// can reclaim.
    #[cfg(test)]
    pub(crate) fn mark_dead_deferred(&mut self, slot: usize) {
        if let Some(agent) = self.slots.get_mut(slot) {
            self.index.remove(&agent.id);
            agent.lifecycle = crate::components::Lifecycle::Dead;
        }
    }

    /// Panic if the slot regions, identifier index or phase tagging are inconsistent.
    pub fn debug_validate(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        let mut live = 0usize;
        for (slot, agent) in self.slots.iter().enumerate() {
            if slot < self.active_count {
                if agent.lifecycle.is_dead() {
                    continue; // deferred hole, see mark_dead_deferred
                }
                live += 1;
                debug_assert!(!agent.id.is_vacant(), "live slot {slot} has vacant id");
                debug_assert_eq!(
                    self.index.get(&agent.id),
                    Some(&slot),
                    "index out of sync for {}",
                    agent.id
                );
                debug_assert_eq!(
                    agent.phase().is_some(),
                    agent.lifecycle.is_alive(),
                    "phase/lifecycle mismatch at slot {slot}"
                );
            } else {
                debug_assert!(agent.lifecycle.is_dead(), "slot {slot} past active region is not Dead");
                debug_assert!(agent.id.is_vacant(), "slot {slot} past active region keeps an id");
            }
        }
        debug_assert_eq!(live, self.index.len(), "duplicate or stale identifiers in index");
    }
}
