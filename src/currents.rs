use std::f32::consts::{FRAC_PI_4, FRAC_PI_8, PI, TAU};

use macroquad::prelude::{vec2, Vec2};
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::calendar::Calendar;
use crate::config::{CurrentConfig, FieldConfig};
use crate::fields::ScalarFields;
use crate::random::SimContext;
use crate::spatial_hash::SpatialIndex;
use crate::world::World;

/// Strength and heading of the water at one grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurrentSample {
    pub strength: f32,
    pub direction: f32,
}

impl CurrentSample {
    pub fn vector(&self) -> Vec2 {
        Vec2::from_angle(self.direction) * self.strength
    }
}

/// Signed shortest rotation from `from` to `to`, in (-π, π].
pub fn angle_delta(from: f32, to: f32) -> f32 {
    (to - from + PI).rem_euclid(TAU) - PI
}

/// Layered current field over a coarse grid.
///
/// Each depth band carries a base strength and direction that relax toward
/// season targets; the boundary curves between bands relax toward noise-shifted
/// targets; every cell tracks its band with its own jitter and is slowed down
/// by nearby vegetation.
pub struct CurrentGrid {
    settings: CurrentConfig,
    width: f32,
    height: f32,
    cell_size: f32,
    pub cols: usize,
    pub rows: usize,
    layers: usize,
    strengths: Vec<f32>,
    directions: Vec<f32>,
    target_strengths: Vec<f32>,
    target_directions: Vec<f32>,
    initial_directions: Vec<f32>,
    base_boundaries: Vec<Vec<f32>>,
    target_boundaries: Vec<Vec<f32>>,
    boundaries: Vec<Vec<f32>>,
    cells: Vec<CurrentSample>,
    noise: Fbm<Perlin>,
}

impl CurrentGrid {
    pub fn new(world: &World, settings: &CurrentConfig, ctx: &mut SimContext) -> Self {
        let cell_size = settings.cell_size;
        let cols = (world.width / cell_size) as usize + 1;
        let rows = (world.height / cell_size) as usize + 1;
        let layers = settings.layers.max(1);

        let strengths: Vec<f32> = (0..layers)
            .map(|layer| lerp_pair(settings.base_strength, layer_t(layer, layers)))
            .collect();
        let directions: Vec<f32> = (0..layers)
            .map(|layer| lerp_pair(settings.base_direction, layer_t(layer, layers)))
            .collect();
        let base_boundaries = generate_boundaries(cols, layers, world.height, ctx);

        let noise_seed = ctx.derive_seed();
        let mut grid = Self {
            settings: settings.clone(),
            width: world.width,
            height: world.height,
            cell_size,
            cols,
            rows,
            layers,
            target_strengths: strengths.clone(),
            target_directions: directions.clone(),
            initial_directions: directions.clone(),
            strengths,
            directions,
            target_boundaries: base_boundaries.clone(),
            boundaries: base_boundaries.clone(),
            base_boundaries,
            cells: Vec::with_capacity(cols * rows),
            noise: Fbm::<Perlin>::new(noise_seed).set_octaves(4),
        };
        grid.initialize_cells(ctx);
        grid
    }

    fn initialize_cells(&mut self, ctx: &mut SimContext) {
        self.cells.clear();
        for row in 0..self.rows {
            let y = row as f32 * self.cell_size;
            for col in 0..self.cols {
                let x = col as f32 * self.cell_size;
                let layer = self.layer_at(x, y);
                self.cells.push(CurrentSample {
                    strength: self.strengths[layer] * (1.0 + ctx.jitter(0.15)),
                    direction: self.directions[layer] + ctx.jitter(FRAC_PI_4),
                });
            }
        }
    }

    /// Advance the field by one tick.
    pub fn update<K: Copy + PartialEq>(
        &mut self,
        calendar: &Calendar,
        fields: &ScalarFields,
        algae: &SpatialIndex<K>,
        ctx: &mut SimContext,
    ) {
        let season = calendar.season();
        let time = calendar.cycle_tick() as f32;
        self.update_targets(calendar);

        let s = &self.settings;
        for layer in 0..self.layers {
            self.strengths[layer] +=
                (self.target_strengths[layer] - self.strengths[layer]) * s.layer_strength_gain;
            let diff = angle_delta(self.directions[layer], self.target_directions[layer]);
            self.directions[layer] =
                (self.directions[layer] + diff * s.layer_direction_gain).rem_euclid(TAU);
        }

        for (live, target) in self.boundaries.iter_mut().zip(&self.target_boundaries) {
            for (y, goal) in live.iter_mut().zip(target) {
                *y += (goal - *y) * s.boundary_gain;
            }
        }
        // Relaxation keeps order up to rounding; close that last gap explicitly.
        for col in 0..self.cols {
            for layer in 1..=self.layers {
                let above = self.boundaries[layer - 1][col];
                if self.boundaries[layer][col] < above {
                    self.boundaries[layer][col] = above;
                }
            }
        }

        let season_factor = season.current_factor();
        let drag_radius = self.cell_size * 2.0;
        let temperature = fields.settings();
        for row in 0..self.rows {
            let y = row as f32 * self.cell_size;
            for col in 0..self.cols {
                let x = col as f32 * self.cell_size;
                let pos = vec2(x, y);
                let layer = self.layer_at(x, y);
                let warmth = normalized_temperature(fields.temperature_at(pos), temperature);

                let target_direction = self.directions[layer]
                    + (time * 0.01 + col as f32 * 0.1).sin() * FRAC_PI_8
                    + ctx.jitter(FRAC_PI_8);
                let target_strength = self.strengths[layer]
                    * season_factor
                    * (1.0 + warmth * self.settings.temperature_coupling)
                    * (1.0 + ctx.jitter(0.1));

                let cell = &mut self.cells[row * self.cols + col];
                for (_, seg) in algae.query_radius(pos, drag_radius) {
                    let distance = seg.distance(pos);
                    if distance < drag_radius {
                        cell.strength *=
                            1.0 - self.settings.algae_drag * (1.0 - distance / drag_radius);
                    }
                }
                cell.strength += (target_strength - cell.strength) * self.settings.cell_strength_gain;
                cell.direction += angle_delta(cell.direction, target_direction)
                    * self.settings.cell_direction_gain;
            }
        }
    }

    /// Recompute layer targets and boundary targets from the season table and noise.
    fn update_targets(&mut self, calendar: &Calendar) {
        let effect = calendar.season().current_effect();
        let time = calendar.cycle_tick() as f64;

        for layer in 0..self.layers {
            let t = layer_t(layer, self.layers);
            let strength_noise = self.noise.get([time * 0.005 + layer as f64, 0.0]) as f32 * 0.2;
            let direction_noise =
                self.noise.get([time * 0.01 + layer as f64 + 10.0, 0.5]) as f32 * FRAC_PI_4;
            self.target_strengths[layer] = (effect.strength * (1.0 - t * 0.3) + strength_noise).max(0.0);
            self.target_directions[layer] =
                self.initial_directions[layer] + effect.direction_shift + direction_noise;
        }

        let shift = effect.boundary_shift * self.height;
        for layer in 0..=self.layers {
            for col in 0..self.cols {
                let wobble = self.noise.get([col as f64 * 0.1, time * 0.02 + layer as f64]) as f32
                    * self.height
                    * 0.2;
                let goal = (self.base_boundaries[layer][col] + shift + wobble).clamp(0.0, self.height);
                let target = &mut self.target_boundaries[layer][col];
                *target += (goal - *target) * self.settings.boundary_target_gain;
            }
        }

        let min_gap = self.settings.min_gap_fraction * self.height;
        let mut column = vec![0.0; self.layers + 1];
        for col in 0..self.cols {
            for layer in 0..=self.layers {
                column[layer] = self.target_boundaries[layer][col];
            }
            enforce_min_gap(&mut column, min_gap, self.height);
            for layer in 0..=self.layers {
                self.target_boundaries[layer][col] = column[layer];
            }
        }
    }

    /// Depth band at (x, y): the first band whose lower boundary reaches y.
    pub fn layer_at(&self, x: f32, y: f32) -> usize {
        let col = self.column_of(x);
        for layer in 0..self.layers {
            if y <= self.boundaries[layer + 1][col] {
                return layer;
            }
        }
        self.layers - 1
    }

    fn column_of(&self, x: f32) -> usize {
        ((x / self.cell_size).floor().max(0.0) as usize).min(self.cols - 1)
    }

    /// Current at a world position; outside the grid the configured default applies.
    pub fn sample_at(&self, pos: Vec2) -> CurrentSample {
        if pos.x < 0.0 || pos.y < 0.0 {
            return self.default_sample();
        }
        let col = (pos.x / self.cell_size) as usize;
        let row = (pos.y / self.cell_size) as usize;
        if col >= self.cols || row >= self.rows {
            return self.default_sample();
        }
        self.cells[row * self.cols + col]
    }

    pub fn vector_at(&self, pos: Vec2) -> Vec2 {
        self.sample_at(pos).vector()
    }

    fn default_sample(&self) -> CurrentSample {
        CurrentSample {
            strength: self.settings.default_strength,
            direction: self.settings.default_direction,
        }
    }

    /// Live boundary curves, `layers + 1` of them, one y value per column.
    pub fn boundaries(&self) -> &[Vec<f32>] {
        &self.boundaries
    }

    pub fn target_boundaries(&self) -> &[Vec<f32>] {
        &self.target_boundaries
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    pub fn layer_strength(&self, layer: usize) -> f32 {
        self.strengths[layer]
    }

    pub fn layer_direction(&self, layer: usize) -> f32 {
        self.directions[layer]
    }

    pub fn width(&self) -> f32 {
        self.width
    }
}

fn layer_t(layer: usize, layers: usize) -> f32 {
    if layers > 1 {
        layer as f32 / (layers - 1) as f32
    } else {
        0.0
    }
}

fn lerp_pair(pair: [f32; 2], t: f32) -> f32 {
    pair[0] + (pair[1] - pair[0]) * t
}

fn normalized_temperature(value: f32, settings: &FieldConfig) -> f32 {
    let span = settings.max_temperature - settings.min_temperature;
    if span <= 0.0 {
        0.0
    } else {
        ((value - settings.min_temperature) / span).clamp(0.0, 1.0)
    }
}

/// Smoothstep easing.
fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// One wandering curve per boundary, eased between random anchors and smoothed,
/// then sorted per column so that boundary `i` never lies below boundary `i + 1`.
pub fn generate_boundaries(
    cols: usize,
    layers: usize,
    height: f32,
    ctx: &mut SimContext,
) -> Vec<Vec<f32>> {
    let min_segment = (cols / 10).max(1) as u32;
    let max_segment = (cols / 5).max(1) as u32;
    let mut boundaries = Vec::with_capacity(layers + 1);

    for layer in 0..=layers {
        let base = height * layer as f32 / layers as f32;
        let mut curve = Vec::with_capacity(cols);
        let mut y = base;
        for _ in 0..cols {
            curve.push(y);
            y = (y + ctx.jitter(height * 0.01)).clamp(0.0, height);
        }

        let mut segment = ctx.int_inclusive(min_segment, max_segment) as usize;
        for col in 1..cols {
            if col % segment == 0 || col == cols - 1 {
                let target = (base + ctx.jitter(height * 0.1)).clamp(0.0, height);
                let start = col.saturating_sub(segment);
                let anchor = curve[start];
                for i in start..=col {
                    let t = if col == start {
                        1.0
                    } else {
                        (i - start) as f32 / (col - start) as f32
                    };
                    let eased = smoothstep(t);
                    curve[i] = (1.0 - eased) * anchor + eased * target;
                }
                segment = ctx.int_inclusive(min_segment, max_segment) as usize;
            }
        }

        let mut smoothed = curve.clone();
        for col in 1..cols.saturating_sub(1) {
            smoothed[col] = (curve[col - 1] + curve[col] + curve[col + 1]) / 3.0;
        }
        boundaries.push(smoothed);
    }

    let mut column = vec![0.0; layers + 1];
    for col in 0..cols {
        for layer in 0..=layers {
            column[layer] = boundaries[layer][col];
        }
        column.sort_by(|a, b| a.total_cmp(b));
        for layer in 0..=layers {
            boundaries[layer][col] = column[layer];
        }
    }
    boundaries
}

/// Push adjacent boundaries at least `gap` apart inside [0, height], keeping order.
pub fn enforce_min_gap(column: &mut [f32], gap: f32, height: f32) {
    let n = column.len();
    if n == 0 {
        return;
    }
    for i in 1..n {
        if column[i] < column[i - 1] + gap {
            column[i] = column[i - 1] + gap;
        }
    }
    column[n - 1] = column[n - 1].min(height);
    for i in (0..n - 1).rev() {
        if column[i] > column[i + 1] - gap {
            column[i] = column[i + 1] - gap;
        }
        column[i] = column[i].max(0.0);
    }
}
