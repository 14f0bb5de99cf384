//! Spatial partitioning for flocking neighbor queries.
//!
//! A uniform 3D hash grid keyed by integer cell coordinates. The cell size is
//! the flocking alignment radius, so the 27 cells around a query point cover
//! every agent within that radius. Candidates are not distance-filtered here.

use crate::pool::EnemyPool;
use bevy_ecs::prelude::*;
use glam::Vec3;
use std::collections::HashMap;

/// Integer cell coordinate.
pub type CellKey = (i32, i32, i32);

const CELL_KEY_LIMIT: i64 = i32::MAX as i64 - 1;

/// Grid-based spatial partitioning structure.
///
/// Rebuilt from scratch every tick; bucket allocations survive between ticks.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in world units.
    pub cell_size: f32,
    /// Map from cell coordinates to pool slots in that cell.
    cells: HashMap<CellKey, Vec<usize>>,
    total: usize,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0e-3),
            cells: HashMap::new(),
            total: 0,
        }
    }

    /// Convert world coordinates to cell coordinates.
    ///
    /// Keys are clamped one short of the `i32` range so the ±1 neighbor
    /// offsets in [`Self::neighbors_of`] never overflow.
    #[inline]
    pub fn world_to_cell(&self, position: Vec3) -> CellKey {
        let scaled = (position / self.cell_size).floor();
        let key = |v: f32| (v as i64).clamp(-CELL_KEY_LIMIT, CELL_KEY_LIMIT) as i32;
        (key(scaled.x), key(scaled.y), key(scaled.z))
    }

    /// Empty every bucket, keeping their allocations.
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.total = 0;
    }

    pub fn insert(&mut self, slot: usize, position: Vec3) {
        let cell = self.world_to_cell(position);
        self.cells.entry(cell).or_default().push(slot);
        self.total += 1;
    }

    /// Re-bucket every Alive agent in the active region of `pool`.
    ///
    /// Idle agents are included; Dying agents and non-finite positions are not.
    pub fn rebuild(&mut self, pool: &EnemyPool) {
        self.clear();
        for (slot, agent) in pool.active().iter().enumerate() {
            if agent.lifecycle.is_alive() && agent.position.is_finite() {
                self.insert(slot, agent.position);
            }
        }
        // Drop buckets that stayed empty so long-running sessions don't accumulate them.
        if self.cells.len() > 4 * self.total.max(64) {
            self.cells.retain(|_, bucket| !bucket.is_empty());
        }
    }

    /// Slots in the 3×3×3 block of cells around `position`.
    pub fn neighbors_of(&self, position: Vec3) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy, cz) = self.world_to_cell(position);
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                (-1..=1).flat_map(move |dz| {
                    self.cells
                        .get(&(cx + dx, cy + dy, cz + dz))
                        .into_iter()
                        .flatten()
                        .copied()
                })
            })
        })
    }

    pub fn cell_count(&self, cell: CellKey) -> usize {
        self.cells.get(&cell).map(|v| v.len()).unwrap_or(0)
    }

    pub fn total_count(&self) -> usize {
        self.total
    }

    /// Non-empty cells (for debugging/visualization).
    pub fn all_cells(&self) -> impl Iterator<Item = (&CellKey, &Vec<usize>)> {
        self.cells.iter().filter(|(_, bucket)| !bucket.is_empty())
    }
}

/// System that rebuilds the spatial grid each tick.
pub fn spatial_grid_update_system(mut grid: ResMut<SpatialGrid>, pool: Res<EnemyPool>) {
    grid.rebuild(&pool);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Agent;

    fn pool_with(positions: &[Vec3]) -> EnemyPool {
        let mut pool = EnemyPool::with_capacity(positions.len());
        for &p in positions {
            let id = pool.next_id();
            pool.insert(Agent::spawn(id, p, 5.0, 1.0, 5.0)).unwrap();
        }
        pool
    }

    fn sorted(grid: &SpatialGrid, p: Vec3) -> Vec<usize> {
        let mut v: Vec<_> = grid.neighbors_of(p).collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_world_to_cell_floors_negatives() {
        let grid = SpatialGrid::new(4.0);
        assert_eq!(grid.world_to_cell(Vec3::new(0.5, 3.9, 4.0)), (0, 0, 1));
        assert_eq!(grid.world_to_cell(Vec3::new(-0.1, -4.0, -4.1)), (-1, -1, -2));
    }

    #[test]
    fn test_neighbors_cover_adjacent_cells_only() {
        let pool = pool_with(&[
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(5.0, 1.0, 1.0),   // next cell in x
            Vec3::new(-3.0, -3.0, -3.0), // diagonal neighbor cell
            Vec3::new(20.0, 0.0, 0.0),  // far away
        ]);
        let mut grid = SpatialGrid::new(4.0);
        grid.rebuild(&pool);

        assert_eq!(grid.total_count(), 4);
        assert_eq!(sorted(&grid, Vec3::new(1.0, 1.0, 1.0)), vec![0, 1, 2]);
        assert_eq!(sorted(&grid, Vec3::new(21.0, 0.5, 0.5)), vec![3]);
        assert!(sorted(&grid, Vec3::new(100.0, 0.0, 0.0)).is_empty());
    }

    #[test]
    fn test_far_coordinates_do_not_overflow() {
        let far = Vec3::new(1.0e10, -1.0e10, 0.0);
        let pool = pool_with(&[far, far + Vec3::X]);
        let mut grid = SpatialGrid::new(4.0);
        grid.rebuild(&pool);

        let (cx, cy, _) = grid.world_to_cell(far);
        assert_eq!(cx, i32::MAX - 1);
        assert_eq!(cy, -(i32::MAX - 1));
        assert_eq!(sorted(&grid, far), vec![0, 1]);
        assert_eq!(grid.world_to_cell(Vec3::splat(f32::NAN)), (0, 0, 0));
    }

    #[test]
    fn test_rebuild_skips_dying_agents() {
        let mut pool = pool_with(&[Vec3::ZERO, Vec3::new(0.5, 0.0, 0.0)]);
        pool.agent_at_mut(1).unwrap().begin_dying(0.0);
        let mut grid = SpatialGrid::new(4.0);
        grid.rebuild(&pool);
        assert_eq!(sorted(&grid, Vec3::ZERO), vec![0]);
        assert_eq!(grid.cell_count((0, 0, 0)), 1);
    }

    #[test]
    fn test_rebuild_replaces_previous_contents() {
        let mut pool = pool_with(&[Vec3::ZERO, Vec3::new(50.0, 0.0, 0.0)]);
        let mut grid = SpatialGrid::new(4.0);
        grid.rebuild(&pool);
        pool.agent_at_mut(1).unwrap().position = Vec3::new(1.0, 0.0, 0.0);
        grid.rebuild(&pool);
        assert_eq!(grid.total_count(), 2);
        assert_eq!(sorted(&grid, Vec3::ZERO), vec![0, 1]);
        assert_eq!(grid.all_cells().count(), 1);
    }
}
