use std::f32::consts::{FRAC_PI_4, FRAC_PI_6};

use serde::Serialize;

use crate::config::CalendarConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DayPhase {
    Day,
    Night,
}

/// Season cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

/// How a season pushes the layered currents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurrentEffect {
    pub strength: f32,
    pub direction_shift: f32,
    /// Vertical shift of the layer boundaries, as a fraction of world height.
    pub boundary_shift: f32,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    pub fn next(self) -> Self {
        match self {
            Season::Spring => Season::Summer,
            Season::Summer => Season::Autumn,
            Season::Autumn => Season::Winter,
            Season::Winter => Season::Spring,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Season::Spring => Season::Winter,
            Season::Summer => Season::Spring,
            Season::Autumn => Season::Summer,
            Season::Winter => Season::Autumn,
        }
    }

    /// Rate modifier for growth and reproduction.
    pub fn modifier(self) -> f32 {
        match self {
            Season::Spring => 1.0,
            Season::Summer => 1.1,
            Season::Autumn => 0.9,
            Season::Winter => 0.8,
        }
    }

    pub fn temperature_factor(self) -> f32 {
        self.modifier()
    }

    pub fn oxygen_factor(self) -> f32 {
        match self {
            Season::Spring => 1.0,
            Season::Summer => 1.2,
            Season::Autumn => 0.9,
            Season::Winter => 0.7,
        }
    }

    /// Vegetation growth and ambient spawning.
    pub fn growth_factor(self) -> f32 {
        match self {
            Season::Spring => 1.1,
            Season::Summer => 1.2,
            Season::Autumn => 0.9,
            Season::Winter => 0.7,
        }
    }

    /// Scale applied to per-cell current targets.
    pub fn current_factor(self) -> f32 {
        match self {
            Season::Spring => 0.8,
            Season::Summer => 1.0,
            Season::Autumn => 0.9,
            Season::Winter => 0.7,
        }
    }

    pub fn current_effect(self) -> CurrentEffect {
        match self {
            Season::Spring => CurrentEffect {
                strength: 0.4,
                direction_shift: -FRAC_PI_6,
                boundary_shift: -0.05,
            },
            Season::Summer => CurrentEffect {
                strength: 0.5,
                direction_shift: 0.0,
                boundary_shift: 0.0,
            },
            Season::Autumn => CurrentEffect {
                strength: 0.45,
                direction_shift: FRAC_PI_6,
                boundary_shift: 0.03,
            },
            Season::Winter => CurrentEffect {
                strength: 0.35,
                direction_shift: -FRAC_PI_4,
                boundary_shift: -0.07,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
        }
    }
}

/// Tick counter with derived day phase and season.
///
/// `tick` never goes backwards. The cycle clock that drives seasons restarts
/// after four full seasons, so every year starts from the same baseline.
#[derive(Clone, Debug)]
pub struct Calendar {
    tick: u64,
    cycle_tick: u32,
    day_length: u32,
    season_length: u32,
    transition_fraction: f32,
}

impl Calendar {
    pub fn new(config: &CalendarConfig) -> Self {
        Self {
            tick: 0,
            cycle_tick: 0,
            day_length: config.day_length.max(1),
            season_length: config.season_length().max(1),
            transition_fraction: config.transition_fraction,
        }
    }

    pub fn advance(&mut self) {
        self.tick += 1;
        self.cycle_tick += 1;
        if self.cycle_tick >= self.season_length * 4 {
            self.cycle_tick = 0;
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Ticks since the start of the current year.
    pub fn cycle_tick(&self) -> u32 {
        self.cycle_tick
    }

    /// Position within the current day in [0, 1).
    pub fn day_progress(&self) -> f32 {
        (self.cycle_tick % self.day_length) as f32 / self.day_length as f32
    }

    pub fn day_phase(&self) -> DayPhase {
        if self.day_progress() < 0.5 {
            DayPhase::Day
        } else {
            DayPhase::Night
        }
    }

    pub fn is_day(&self) -> bool {
        self.day_phase() == DayPhase::Day
    }

    pub fn season(&self) -> Season {
        Season::from_index(self.cycle_tick / self.season_length)
    }

    /// Position within the current season in [0, 1).
    pub fn season_progress(&self) -> f32 {
        (self.cycle_tick % self.season_length) as f32 / self.season_length as f32
    }

    /// Season modifier, blended across the first and last part of each season
    /// so that rates meet halfway at every season boundary.
    pub fn season_modifier(&self) -> f32 {
        let season = self.season();
        let current = season.modifier();
        let progress = self.season_progress();
        let window = self.transition_fraction;
        if window <= 0.0 {
            return current;
        }
        if progress < window {
            let from = 0.5 * (season.previous().modifier() + current);
            from + (current - from) * (progress / window)
        } else if progress > 1.0 - window {
            let to = 0.5 * (current + season.next().modifier());
            current + (to - current) * ((progress - (1.0 - window)) / window)
        } else {
            current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar(day_length: u32, days_in_season: u32) -> Calendar {
        Calendar::new(&CalendarConfig {
            day_length,
            days_in_season,
            transition_fraction: 0.1,
        })
    }

    #[test]
    fn day_then_night_within_one_day() {
        let mut cal = calendar(10, 2);
        assert_eq!(cal.day_phase(), DayPhase::Day);
        for _ in 0..5 {
            cal.advance();
        }
        assert_eq!(cal.day_phase(), DayPhase::Night);
        for _ in 0..5 {
            cal.advance();
        }
        assert_eq!(cal.day_phase(), DayPhase::Day);
    }

    #[test]
    fn seasons_roll_over_and_cycle_restarts() {
        let mut cal = calendar(10, 2);
        assert_eq!(cal.season(), Season::Spring);
        for _ in 0..20 {
            cal.advance();
        }
        assert_eq!(cal.season(), Season::Summer);
        for _ in 0..60 {
            cal.advance();
        }
        assert_eq!(cal.cycle_tick(), 0);
        assert_eq!(cal.tick(), 80);
        assert_eq!(cal.season(), Season::Spring);
    }

    #[test]
    fn season_modifier_has_no_jumps() {
        let mut cal = calendar(10, 10);
        let mut previous = cal.season_modifier();
        for _ in 0..1000 {
            cal.advance();
            let now = cal.season_modifier();
            assert!((now - previous).abs() < 0.011, "jump {previous} -> {now}");
            previous = now;
        }
    }

    #[test]
    fn mid_season_modifier_is_the_table_value() {
        let mut cal = calendar(10, 10);
        for _ in 0..150 {
            cal.advance();
        }
        assert_eq!(cal.season(), Season::Summer);
        assert!((cal.season_modifier() - 1.1).abs() < 1e-6);
    }
}
