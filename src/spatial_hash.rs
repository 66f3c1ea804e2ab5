use macroquad::prelude::Vec2;

/// Uniform grid bucketing of point-like entries.
///
/// Entries are non-owning keys stored with the position they were inserted at.
/// Positions outside the world map to the nearest edge cell, so every entry
/// always has a home bucket. Callers pair every `insert` with a `remove` at the
/// same position; the index never inspects the organisms themselves.
pub struct SpatialIndex<T> {
    cell_size: f32,
    inv_cell_size: f32,
    pub cols: usize,
    pub rows: usize,
    cells: Vec<Vec<(T, Vec2)>>,
    len: usize,
}

impl<T: Copy + PartialEq> SpatialIndex<T> {
    pub fn new(world_w: f32, world_h: f32, cell_size: f32) -> Self {
        let cols = ((world_w / cell_size).ceil() as usize).max(1);
        let rows = ((world_h / cell_size).ceil() as usize).max(1);
        let cells = (0..cols * rows).map(|_| Vec::with_capacity(8)).collect();
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cols,
            rows,
            cells,
            len: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid coordinates of the bucket holding `pos`, clamped to the grid.
    pub fn cell_of(&self, pos: Vec2) -> (usize, usize) {
        let cx = (pos.x * self.inv_cell_size).floor() as i64;
        let cy = (pos.y * self.inv_cell_size).floor() as i64;
        (
            cx.clamp(0, self.cols as i64 - 1) as usize,
            cy.clamp(0, self.rows as i64 - 1) as usize,
        )
    }

    fn bucket(&self, pos: Vec2) -> usize {
        let (cx, cy) = self.cell_of(pos);
        cy * self.cols + cx
    }

    pub fn insert(&mut self, item: T, pos: Vec2) {
        let idx = self.bucket(pos);
        self.cells[idx].push((item, pos));
        self.len += 1;
    }

    /// Remove `item` from the bucket of `pos`. Returns false if it was not there.
    pub fn remove(&mut self, item: T, pos: Vec2) -> bool {
        let idx = self.bucket(pos);
        let cell = &mut self.cells[idx];
        if let Some(slot) = cell.iter().position(|(entry, _)| *entry == item) {
            cell.swap_remove(slot);
            self.len -= 1;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.len = 0;
    }

    /// Clear all cells and re-insert every entry.
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = (T, Vec2)>) {
        self.clear();
        for (item, pos) in entries {
            self.insert(item, pos);
        }
    }

    /// Every entry stored in the 3×3 block of cells around `pos`.
    pub fn query_neighbors(&self, pos: Vec2) -> impl Iterator<Item = &(T, Vec2)> + '_ {
        self.block(pos, 1).flat_map(move |idx| self.cells[idx].iter())
    }

    /// Entries within `radius` of `pos` by exact distance.
    pub fn query_radius(&self, pos: Vec2, radius: f32) -> impl Iterator<Item = &(T, Vec2)> + '_ {
        let reach = ((radius * self.inv_cell_size).ceil() as usize).max(1);
        let radius_sq = radius * radius;
        self.block(pos, reach)
            .flat_map(move |idx| self.cells[idx].iter())
            .filter(move |(_, p)| p.distance_squared(pos) <= radius_sq)
    }

    /// Closest entry within `radius` accepted by `filter`.
    pub fn nearest(
        &self,
        pos: Vec2,
        radius: f32,
        mut filter: impl FnMut(&T) -> bool,
    ) -> Option<(T, Vec2, f32)> {
        let mut best: Option<(T, Vec2, f32)> = None;
        for (item, p) in self.query_radius(pos, radius) {
            if !filter(item) {
                continue;
            }
            let d_sq = p.distance_squared(pos);
            if best.map_or(true, |(_, _, b)| d_sq < b) {
                best = Some((*item, *p, d_sq));
            }
        }
        best
    }

    /// Bucket indices within `reach` cells of the bucket holding `pos`.
    /// Clipped at the world edges: lookups do not see across the x-wrap seam.
    fn block(&self, pos: Vec2, reach: usize) -> impl Iterator<Item = usize> {
        let (cx, cy) = self.cell_of(pos);
        let x0 = cx.saturating_sub(reach);
        let x1 = (cx + reach).min(self.cols - 1);
        let y0 = cy.saturating_sub(reach);
        let y1 = (cy + reach).min(self.rows - 1);
        let cols = self.cols;
        (y0..=y1).flat_map(move |gy| (x0..=x1).map(move |gx| gy * cols + gx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &(T, Vec2)> {
        self.cells.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
