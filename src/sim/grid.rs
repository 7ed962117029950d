//! Uniform spatial grid for Poisson-disk placement and neighbor queries
//!
//! Cell size is `min_separation / √2`, so one cell's diagonal equals the
//! separation distance. Entries are keyed by pool slot. The pool compacts by
//! swap-removal, so removing slot `i` moves the particle from the last slot
//! into `i`; [`SpatialGrid::swap_remove`] mirrors that in one step.

use glam::Vec2;
use std::f32::consts::SQRT_2;

use super::state::Rect;
use crate::error::{ConfigError, Result};

/// Upper bound on cell count, guards against a tiny separation on a huge domain
const MAX_CELLS: usize = 1 << 24;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    domain: Rect,
    min_separation: f32,
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
    /// Owning cell of each pool slot
    slots: Vec<Option<usize>>,
    len: usize,
}

impl SpatialGrid {
    pub fn new(domain: Rect, min_separation: f32) -> Result<Self> {
        let mut grid = Self {
            domain,
            min_separation,
            cell_size: 1.0,
            cols: 1,
            rows: 1,
            cells: Vec::new(),
            slots: Vec::new(),
            len: 0,
        };
        grid.reconfigure(domain, min_separation)?;
        Ok(grid)
    }

    /// Change domain or separation. Drops all entries; call [`Self::rebuild`] after.
    pub fn reconfigure(&mut self, domain: Rect, min_separation: f32) -> Result<()> {
        if !min_separation.is_finite() || min_separation <= 0.0 {
            return Err(ConfigError::NonPositiveSeparation(min_separation));
        }
        if !domain.is_valid() {
            return Err(ConfigError::InvalidBounds(format!(
                "{:?} .. {:?}",
                domain.min, domain.max
            )));
        }

        let cell_size = min_separation / SQRT_2;
        let size = domain.size();
        let cols = ((size.x / cell_size).ceil() as usize).max(1);
        let rows = ((size.y / cell_size).ceil() as usize).max(1);
        if cols.saturating_mul(rows) > MAX_CELLS {
            return Err(ConfigError::InvalidParam(format!(
                "grid of {cols}x{rows} cells is too large; raise min_separation"
            )));
        }

        self.domain = domain;
        self.min_separation = min_separation;
        self.cell_size = cell_size;
        self.cols = cols;
        self.rows = rows;
        self.cells = vec![Vec::new(); cols * rows];
        self.slots.clear();
        self.len = 0;
        log::debug!("Spatial grid {}x{} cells of {:.4}", cols, rows, cell_size);
        Ok(())
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn min_separation(&self) -> f32 {
        self.min_separation
    }

    pub fn domain(&self) -> Rect {
        self.domain
    }

    /// (columns, rows)
    pub fn dims(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Ring count whose neighborhood covers every point within `radius`,
    /// capped at the whole grid
    pub fn rings_for(&self, radius: f32) -> i32 {
        let whole = self.cols.max(self.rows) as i32;
        ((radius / self.cell_size).ceil().max(0.0) as i32).min(whole)
    }

    /// Cell coordinates of a position, clamped to the border cells
    fn coords(&self, position: Vec2) -> (i32, i32) {
        let rel = (position - self.domain.min) / self.cell_size;
        let x = (rel.x.floor() as i32).clamp(0, self.cols as i32 - 1);
        let y = (rel.y.floor() as i32).clamp(0, self.rows as i32 - 1);
        (x, y)
    }

    /// Flat index of the cell containing `position`
    pub fn cell_index(&self, position: Vec2) -> usize {
        let (x, y) = self.coords(position);
        y as usize * self.cols + x as usize
    }

    /// Recorded cell of a slot
    pub fn cell_of(&self, index: usize) -> Option<usize> {
        self.slots.get(index).copied().flatten()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.cell_of(index).is_some()
    }

    pub fn insert(&mut self, index: usize, position: Vec2) {
        if self.contains(index) {
            self.remove(index);
        }
        let cell = self.cell_index(position);
        if self.slots.len() <= index {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(cell);
        self.cells[cell].push(index);
        self.len += 1;
    }

    /// Remove a slot from its recorded cell. Returns false if it was absent.
    pub fn remove(&mut self, index: usize) -> bool {
        let Some(cell) = self.slots.get_mut(index).and_then(Option::take) else {
            return false;
        };
        let entries = &mut self.cells[cell];
        if let Some(pos) = entries.iter().position(|&i| i == index) {
            entries.swap_remove(pos);
        }
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        self.len -= 1;
        true
    }

    /// Re-home a slot after its particle moved. Returns true if the cell changed.
    pub fn relocate(&mut self, index: usize, position: Vec2) -> bool {
        let cell = self.cell_index(position);
        match self.cell_of(index) {
            Some(current) if current == cell => false,
            _ => {
                self.insert(index, position);
                true
            }
        }
    }

    /// Re-key the entry for slot `from` as slot `to`, keeping its cell.
    /// `to` must not be present.
    pub fn relabel(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        debug_assert!(!self.contains(to), "relabel target slot {to} is occupied");
        let Some(cell) = self.slots.get_mut(from).and_then(Option::take) else {
            return;
        };
        if let Some(entry) = self.cells[cell].iter_mut().find(|i| **i == from) {
            *entry = to;
        }
        if self.slots.len() <= to {
            self.slots.resize(to + 1, None);
        }
        self.slots[to] = Some(cell);
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
    }

    /// Mirror of `Vec::swap_remove(index)` on a pool whose last slot is `last`:
    /// drop `index`, then re-key `last` as `index`.
    pub fn swap_remove(&mut self, index: usize, last: usize) {
        self.remove(index);
        if index != last {
            self.relabel(last, index);
        }
    }

    /// Slots stored in the cell of `position` and the `rings` cells around it
    pub fn neighbors(&self, position: Vec2, rings: i32) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy) = self.coords(position);
        let rings = rings.max(0);
        let x0 = cx.saturating_sub(rings).max(0);
        let x1 = cx.saturating_add(rings).min(self.cols as i32 - 1);
        let y0 = cy.saturating_sub(rings).max(0);
        let y1 = cy.saturating_add(rings).min(self.rows as i32 - 1);
        (y0..=y1).flat_map(move |y| {
            (x0..=x1).flat_map(move |x| self.cells[y as usize * self.cols + x as usize].iter().copied())
        })
    }

    /// Candidate slots near `position` (unfiltered by distance)
    pub fn query_ring(&self, position: Vec2, rings: i32) -> Vec<usize> {
        self.neighbors(position, rings).collect()
    }

    /// Slots whose position is strictly closer than `radius` to `position`
    pub fn query_radius(&self, position: Vec2, radius: f32, positions: &[Vec2]) -> Vec<usize> {
        let radius_sq = radius * radius;
        self.neighbors(position, self.rings_for(radius))
            .filter(|&i| {
                positions
                    .get(i)
                    .is_some_and(|p| p.distance_squared(position) < radius_sq)
            })
            .collect()
    }

    /// True when no stored slot is closer than `min_separation` to `position`
    pub fn is_clear(&self, position: Vec2, positions: &[Vec2]) -> bool {
        let radius_sq = self.min_separation * self.min_separation;
        self.neighbors(position, self.rings_for(self.min_separation))
            .all(|i| positions.get(i).is_none_or(|p| p.distance_squared(position) >= radius_sq))
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.slots.clear();
        self.len = 0;
    }

    /// Re-insert every position, slot `i` at `positions[i]`
    pub fn rebuild(&mut self, positions: &[Vec2]) {
        self.clear();
        for (i, &p) in positions.iter().enumerate() {
            self.insert(i, p);
        }
    }

    /// Every slot in `0..positions.len()` is stored exactly once, in the cell
    /// its position maps to, and nothing else is stored.
    pub fn is_consistent(&self, positions: &[Vec2]) -> bool {
        if self.len != positions.len() || self.slots.len() > positions.len() {
            return false;
        }
        let slots_ok = positions
            .iter()
            .enumerate()
            .all(|(i, &p)| self.cell_of(i) == Some(self.cell_index(p)));
        let cells_ok = self.cells.iter().enumerate().all(|(cell, entries)| {
            entries.iter().all(|&i| self.cell_of(i) == Some(cell))
        });
        let total: usize = self.cells.iter().map(Vec::len).sum();
        slots_ok && cells_ok && total == self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    fn unit_domain() -> Rect {
        Rect::new(Vec2::splat(-1.0), Vec2::splat(1.0))
    }

    /// Dart-throwing sample honoring `min_separation`
    fn poisson_points(grid: &mut SpatialGrid, count: usize, seed: u64) -> Vec<Vec2> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut points = Vec::new();
        let mut tries = 0;
        while points.len() < count && tries < 100_000 {
            tries += 1;
            let p = Vec2::new(rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0));
            if grid.is_clear(p, &points) {
                grid.insert(points.len(), p);
                points.push(p);
            }
        }
        points
    }

    #[test]
    fn test_rejects_bad_separation() {
        assert!(matches!(
            SpatialGrid::new(unit_domain(), 0.0),
            Err(ConfigError::NonPositiveSeparation(_))
        ));
        assert!(SpatialGrid::new(unit_domain(), f32::NAN).is_err());
        assert!(SpatialGrid::new(Rect::new(Vec2::ONE, Vec2::ZERO), 0.1).is_err());
    }

    #[test]
    fn test_cell_size_from_separation() {
        let grid = SpatialGrid::new(unit_domain(), 0.1).unwrap();
        assert!((grid.cell_size() - 0.1 / SQRT_2).abs() < 1e-7);
        assert_eq!(grid.rings_for(0.1), 2);
        assert_eq!(grid.rings_for(0.2), 3);
        assert_eq!(grid.dims(), (29, 29));
    }

    #[test]
    fn test_unbounded_queries_cover_whole_grid() {
        let mut grid = SpatialGrid::new(unit_domain(), 0.1).unwrap();
        let positions = [Vec2::ZERO, Vec2::splat(0.9), Vec2::splat(-0.9)];
        for (i, p) in positions.iter().enumerate() {
            grid.insert(i, *p);
        }
        let (cols, rows) = grid.dims();
        assert_eq!(grid.rings_for(f32::INFINITY), cols.max(rows) as i32);
        assert_eq!(grid.rings_for(f32::NAN), 0);

        let mut found = grid.query_radius(Vec2::ZERO, f32::INFINITY, &positions);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1, 2]);
        assert_eq!(grid.query_ring(Vec2::ZERO, i32::MAX).len(), 3);
        assert_eq!(grid.query_ring(Vec2::ZERO, i32::MIN).len(), 1);
    }

    #[test]
    fn test_outside_positions_clamp_to_border() {
        let grid = SpatialGrid::new(unit_domain(), 0.5).unwrap();
        let (cols, rows) = grid.dims();
        assert_eq!(grid.cell_index(Vec2::new(-10.0, -10.0)), 0);
        assert_eq!(grid.cell_index(Vec2::new(10.0, 10.0)), cols * rows - 1);
    }

    #[test]
    fn test_query_finds_all_within_two_separations() {
        let min_sep = 0.05;
        let mut grid = SpatialGrid::new(unit_domain(), min_sep).unwrap();
        let points = poisson_points(&mut grid, 300, 11);
        assert!(points.len() > 100);

        let rings = grid.rings_for(2.0 * min_sep);
        for (i, &p) in points.iter().enumerate() {
            let found = grid.query_ring(p, rings);
            for (j, &q) in points.iter().enumerate() {
                if i != j && p.distance(q) < 2.0 * min_sep {
                    assert!(found.contains(&j), "{j} near {i} was missed");
                }
            }
        }
    }

    #[test]
    fn test_poisson_points_respect_separation() {
        let min_sep = 0.05;
        let mut grid = SpatialGrid::new(unit_domain(), min_sep).unwrap();
        let points = poisson_points(&mut grid, 200, 3);
        for (i, p) in points.iter().enumerate() {
            for q in &points[i + 1..] {
                assert!(p.distance(*q) >= min_sep - 1e-6);
            }
            assert!(grid.query_radius(*p, min_sep, &points) == vec![i]);
        }
    }

    #[test]
    fn test_swap_remove_rehomes_last_slot() {
        let mut grid = SpatialGrid::new(unit_domain(), 0.1).unwrap();
        let mut pool = vec![
            Vec2::new(-0.9, -0.9),
            Vec2::new(0.0, 0.0),
            Vec2::new(0.9, 0.9),
        ];
        grid.rebuild(&pool);

        grid.swap_remove(0, pool.len() - 1);
        pool.swap_remove(0);

        assert!(grid.is_consistent(&pool));
        assert_eq!(grid.cell_of(0), Some(grid.cell_index(Vec2::new(0.9, 0.9))));
        assert_eq!(grid.cell_of(2), None);
        assert_eq!(grid.query_ring(Vec2::new(0.9, 0.9), 0), vec![0]);
    }

    #[test]
    fn test_swap_remove_last_slot() {
        let mut grid = SpatialGrid::new(unit_domain(), 0.1).unwrap();
        let mut pool = vec![Vec2::new(-0.5, 0.0), Vec2::new(0.5, 0.0)];
        grid.rebuild(&pool);

        grid.swap_remove(1, 1);
        pool.swap_remove(1);
        assert!(grid.is_consistent(&pool));

        grid.swap_remove(0, 0);
        pool.swap_remove(0);
        assert!(grid.is_consistent(&pool));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_relocate_moves_between_cells() {
        let mut grid = SpatialGrid::new(unit_domain(), 0.1).unwrap();
        let mut pool = vec![Vec2::ZERO];
        grid.rebuild(&pool);

        assert!(!grid.relocate(0, Vec2::new(0.001, 0.001)));
        pool[0] = Vec2::new(0.5, -0.5);
        assert!(grid.relocate(0, pool[0]));
        assert!(grid.is_consistent(&pool));
        assert!(grid.query_ring(Vec2::ZERO, 0).is_empty());
    }

    #[test]
    fn test_remove_missing_slot_is_noop() {
        let mut grid = SpatialGrid::new(unit_domain(), 0.1).unwrap();
        assert!(!grid.remove(4));
        grid.insert(0, Vec2::ZERO);
        assert!(grid.remove(0));
        assert!(!grid.remove(0));
        assert!(grid.is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push(f32, f32),
        Remove(usize),
        Move(usize, f32, f32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-1.2f32..1.2, -1.2f32..1.2).prop_map(|(x, y)| Op::Push(x, y)),
            (0usize..64).prop_map(Op::Remove),
            (0usize..64, -1.2f32..1.2, -1.2f32..1.2).prop_map(|(i, x, y)| Op::Move(i, x, y)),
        ]
    }

    proptest! {
        #[test]
        fn prop_grid_tracks_swap_removed_pool(ops in prop::collection::vec(op(), 1..200)) {
            let mut grid = SpatialGrid::new(unit_domain(), 0.1).unwrap();
            let mut pool: Vec<Vec2> = Vec::new();
            for op in ops {
                match op {
                    Op::Push(x, y) => {
                        grid.insert(pool.len(), Vec2::new(x, y));
                        pool.push(Vec2::new(x, y));
                    }
                    Op::Remove(i) if !pool.is_empty() => {
                        let i = i % pool.len();
                        grid.swap_remove(i, pool.len() - 1);
                        pool.swap_remove(i);
                    }
                    Op::Move(i, x, y) if !pool.is_empty() => {
                        let i = i % pool.len();
                        pool[i] = Vec2::new(x, y);
                        grid.relocate(i, pool[i]);
                    }
                    _ => {}
                }
                prop_assert!(grid.is_consistent(&pool));
            }
        }
    }
}
