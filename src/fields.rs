use std::f32::consts::TAU;

use macroquad::prelude::Vec2;

use crate::calendar::Calendar;
use crate::config::FieldConfig;
use crate::world::World;

/// Temperature and oxygen grids, recomputed in full every tick.
///
/// Water is warmest at the surface and richest in oxygen near it; vegetation
/// adds oxygen around every segment, mostly around midday.
pub struct ScalarFields {
    settings: FieldConfig,
    height: f32,
    pub cols: usize,
    pub rows: usize,
    temperature: Vec<f32>,
    oxygen: Vec<f32>,
}

impl ScalarFields {
    pub fn new(world: &World, settings: &FieldConfig) -> Self {
        let cols = ((world.width / settings.cell_size) as usize).max(1);
        let rows = ((world.height / settings.cell_size) as usize).max(1);
        let mut fields = Self {
            settings: settings.clone(),
            height: world.height,
            cols,
            rows,
            temperature: vec![settings.min_temperature; cols * rows],
            oxygen: vec![settings.min_oxygen; cols * rows],
        };
        for gy in 0..rows {
            let y = gy as f32 * settings.cell_size;
            let (t, o) = (fields.base_temperature(y), fields.base_oxygen(y));
            for gx in 0..cols {
                fields.temperature[gy * cols + gx] = t;
                fields.oxygen[gy * cols + gx] = o;
            }
        }
        fields
    }

    pub fn settings(&self) -> &FieldConfig {
        &self.settings
    }

    /// Depth profile of temperature: warmest at the surface.
    pub fn base_temperature(&self, y: f32) -> f32 {
        let s = &self.settings;
        let depth = (y / self.height).clamp(0.0, 1.0);
        s.min_temperature + (s.max_temperature - s.min_temperature) * (1.0 - depth)
    }

    /// Depth profile of oxygen: richest at the surface.
    pub fn base_oxygen(&self, y: f32) -> f32 {
        let s = &self.settings;
        let depth = (y / self.height).clamp(0.0, 1.0);
        s.max_oxygen - (s.max_oxygen - s.min_oxygen) * depth
    }

    /// Recompute both grids from depth, day phase, season and vegetation.
    pub fn update(&mut self, calendar: &Calendar, segments: impl IntoIterator<Item = Vec2>) {
        let season = calendar.season();
        let day = calendar.day_progress();
        let warmth = (0.95 + 0.05 * (day * TAU).sin()) * season.temperature_factor();
        // Peaks at midday, a quarter of the way into the day; zero at midnight.
        let light = 0.5 + 0.5 * (day * TAU).sin();
        let oxygen_season = season.oxygen_factor();

        let cell = self.settings.cell_size;
        for gy in 0..self.rows {
            let y = gy as f32 * cell;
            let temperature = (self.base_temperature(y) * warmth)
                .clamp(self.settings.min_temperature, self.settings.max_temperature);
            let oxygen = self.base_oxygen(y);
            for gx in 0..self.cols {
                self.temperature[gy * self.cols + gx] = temperature;
                self.oxygen[gy * self.cols + gx] = oxygen;
            }
        }

        let radius = self.settings.oxygen_boost_radius;
        let boost = self.settings.oxygen_boost * light * oxygen_season;
        if radius > 0.0 && boost > 0.0 {
            let reach = (radius / cell).ceil() as i64;
            for seg in segments {
                let cx = (seg.x / cell).floor() as i64;
                let cy = (seg.y / cell).floor() as i64;
                for gy in (cy - reach).max(0)..=(cy + reach).min(self.rows as i64 - 1) {
                    for gx in (cx - reach).max(0)..=(cx + reach).min(self.cols as i64 - 1) {
                        let dx = gx as f32 * cell - seg.x;
                        let dy = gy as f32 * cell - seg.y;
                        let distance = (dx * dx + dy * dy).sqrt();
                        if distance < radius {
                            let idx = gy as usize * self.cols + gx as usize;
                            self.oxygen[idx] += boost * (1.0 - distance / radius);
                        }
                    }
                }
            }
        }

        let (lo, hi) = (self.settings.min_oxygen, self.settings.max_oxygen);
        for value in &mut self.oxygen {
            *value = value.clamp(lo, hi);
        }
    }

    fn index_of(&self, pos: Vec2) -> Option<usize> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let gx = (pos.x / self.settings.cell_size) as usize;
        let gy = (pos.y / self.settings.cell_size) as usize;
        if gx >= self.cols || gy >= self.rows {
            None
        } else {
            Some(gy * self.cols + gx)
        }
    }

    /// Temperature at a position; off-grid positions get the depth profile value.
    pub fn temperature_at(&self, pos: Vec2) -> f32 {
        match self.index_of(pos) {
            Some(idx) => self.temperature[idx],
            None => self.base_temperature(pos.y),
        }
    }

    /// Oxygen at a position; off-grid positions get the depth profile value.
    pub fn oxygen_at(&self, pos: Vec2) -> f32 {
        match self.index_of(pos) {
            Some(idx) => self.oxygen[idx],
            None => self.base_oxygen(pos.y),
        }
    }

    pub fn temperatures(&self) -> &[f32] {
        &self.temperature
    }

    pub fn oxygen_levels(&self) -> &[f32] {
        &self.oxygen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use macroquad::prelude::vec2;

    fn setup() -> (SimConfig, World, ScalarFields) {
        let config = SimConfig::default();
        let world = World::from_config(&config.world);
        let fields = ScalarFields::new(&world, &config.fields);
        (config, world, fields)
    }

    #[test]
    fn every_cell_stays_within_bounds_over_a_year() {
        let (config, _world, mut fields) = setup();
        let mut calendar = Calendar::new(&config.calendar);
        let thicket: Vec<Vec2> = (0..200)
            .map(|i| vec2(400.0 + (i % 20) as f32, 600.0 - (i / 20) as f32 * 5.0))
            .collect();
        let year = config.calendar.season_length() * 4;
        for tick in 0..year {
            calendar.advance();
            if tick % 37 != 0 {
                continue;
            }
            fields.update(&calendar, thicket.iter().copied());
            let f = &config.fields;
            assert!(fields
                .temperatures()
                .iter()
                .all(|t| (f.min_temperature..=f.max_temperature).contains(t)));
            assert!(fields
                .oxygen_levels()
                .iter()
                .all(|o| (f.min_oxygen..=f.max_oxygen).contains(o)));
        }
    }

    #[test]
    fn surface_is_warmer_than_the_bottom() {
        let (config, _world, mut fields) = setup();
        let calendar = Calendar::new(&config.calendar);
        fields.update(&calendar, std::iter::empty());
        assert!(fields.temperature_at(vec2(100.0, 5.0)) > fields.temperature_at(vec2(100.0, 640.0)));
        assert!(fields.oxygen_at(vec2(100.0, 5.0)) > fields.oxygen_at(vec2(100.0, 640.0)));
    }

    #[test]
    fn vegetation_raises_oxygen_during_the_day() {
        let (config, _world, mut bare) = setup();
        let mut grown = ScalarFields::new(&World::from_config(&config.world), &config.fields);
        let mut calendar = Calendar::new(&config.calendar);
        // Midday.
        for _ in 0..config.calendar.day_length / 4 {
            calendar.advance();
        }
        let probe = vec2(500.0, 500.0);
        bare.update(&calendar, std::iter::empty());
        grown.update(&calendar, [vec2(505.0, 505.0)]);
        assert!(grown.oxygen_at(probe) > bare.oxygen_at(probe));
    }

    #[test]
    fn off_grid_lookup_falls_back_to_depth_profile() {
        let (_config, _world, fields) = setup();
        let off = vec2(-20.0, 300.0);
        assert_eq!(fields.temperature_at(off), fields.base_temperature(300.0));
        assert_eq!(fields.oxygen_at(off), fields.base_oxygen(300.0));
    }
}
