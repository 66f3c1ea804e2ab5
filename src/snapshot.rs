//! Read-only views handed to the presentation layer.

use macroquad::prelude::{vec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::calendar::{DayPhase, Season};
use crate::entity::EntityId;
use crate::fish::{Fish, LifeStage};
use crate::genome::Trait;
use crate::stats::LifetimeTotals;
use crate::traits::{ReproductionStrategy, Sex};

// Serde-friendly wrapper for macroquad's Vec2.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Point {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Self {
        vec2(p.x, p.y)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GeneSnapshot {
    pub name: &'static str,
    pub alleles: [f32; 2],
    pub dominance: u8,
    pub phenotype: f32,
}

/// Full trait and genome view of one fish.
#[derive(Clone, Debug, Serialize)]
pub struct FishSnapshot {
    pub id: EntityId,
    pub pos: Point,
    pub heading: f32,
    pub predator: bool,
    pub sex: Sex,
    pub strategy: ReproductionStrategy,
    pub stage: LifeStage,
    pub condition: &'static str,
    pub ready_to_mate: bool,
    pub generation: u32,
    pub energy: f32,
    pub max_energy: f32,
    pub age: f32,
    pub max_age: f32,
    pub size: f32,
    pub max_size: f32,
    pub speed: f32,
    pub vision: f32,
    pub metabolism: f32,
    pub digestion: f32,
    pub defense: f32,
    pub reproduction_rate: f32,
    pub preferred_depth: f32,
    pub color: f32,
    pub genes: Vec<GeneSnapshot>,
}

impl FishSnapshot {
    pub fn of(id: EntityId, fish: &Fish) -> Self {
        let t = &fish.traits;
        let genes = Trait::ALL
            .iter()
            .map(|&name| {
                let gene = fish.genome.gene(name);
                GeneSnapshot {
                    name: name.name(),
                    alleles: gene.alleles,
                    dominance: gene.dominance,
                    phenotype: gene.phenotype(),
                }
            })
            .collect();
        Self {
            id,
            pos: fish.pos.into(),
            heading: fish.heading,
            predator: fish.is_predator(),
            sex: fish.sex,
            strategy: t.strategy,
            stage: fish.stage(),
            condition: fish.condition.label(),
            ready_to_mate: fish.ready_to_mate,
            generation: fish.generation,
            energy: fish.energy,
            max_energy: t.max_energy,
            age: fish.age,
            max_age: t.max_age,
            size: fish.size,
            max_size: t.max_size,
            speed: fish.speed,
            vision: t.vision,
            metabolism: t.metabolism,
            digestion: t.digestion,
            defense: t.defense,
            reproduction_rate: t.reproduction_rate,
            preferred_depth: t.preferred_depth,
            color: t.color,
            genes,
        }
    }
}

/// Head counts per species.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PopulationCounts {
    pub predators: usize,
    pub prey: usize,
    pub dead_fish: usize,
    pub pregnant: usize,
    pub eggs: usize,
    pub plankton: usize,
    pub crustaceans: usize,
    pub dead_algae: usize,
    pub algae: usize,
    pub algae_segments: usize,
}

impl PopulationCounts {
    pub fn live_fish(&self) -> usize {
        self.predators + self.prey
    }

    /// No live fish left anywhere.
    pub fn collapsed(&self) -> bool {
        self.live_fish() == 0
    }
}

/// Mean energy and size of the live fish in each class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ClassAverages {
    pub predator_energy: f32,
    pub prey_energy: f32,
    pub predator_size: f32,
    pub prey_size: f32,
}

impl ClassAverages {
    pub fn of<'a>(fish: impl Iterator<Item = &'a Fish>) -> Self {
        let (mut pe, mut ps, mut pn) = (0.0, 0.0, 0u32);
        let (mut qe, mut qs, mut qn) = (0.0, 0.0, 0u32);
        for f in fish.filter(|f| f.is_alive()) {
            if f.is_predator() {
                pe += f.energy;
                ps += f.size;
                pn += 1;
            } else {
                qe += f.energy;
                qs += f.size;
                qn += 1;
            }
        }
        let mean = |sum: f32, n: u32| if n > 0 { sum / n as f32 } else { 0.0 };
        Self {
            predator_energy: mean(pe, pn),
            prey_energy: mean(qe, qn),
            predator_size: mean(ps, pn),
            prey_size: mean(qs, qn),
        }
    }
}

/// Everything the water does at one coordinate.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct EnvironmentProbe {
    pub pos: Point,
    pub layer: usize,
    pub current_strength: f32,
    pub current_direction: f32,
    pub temperature: f32,
    pub oxygen: f32,
    pub in_vegetation: bool,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct CalendarSnapshot {
    pub tick: u64,
    pub day_phase: DayPhase,
    pub season: Season,
    pub season_modifier: f32,
}

/// End-of-run report printed by the headless driver.
#[derive(Clone, Debug, Serialize)]
pub struct SimSummary {
    pub seed: u64,
    pub ticks: u64,
    pub calendar: CalendarSnapshot,
    pub collapsed: bool,
    pub counts: PopulationCounts,
    pub averages: ClassAverages,
    pub totals: LifetimeTotals,
    pub peak_fish: usize,
    pub max_generation: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_converts_both_ways() {
        let p: Point = vec2(3.5, -2.0).into();
        assert_eq!(p, Point { x: 3.5, y: -2.0 });
        let v: Vec2 = p.into();
        assert_eq!(v, vec2(3.5, -2.0));
    }

    #[test]
    fn collapse_means_no_live_fish() {
        let mut counts = PopulationCounts {
            dead_fish: 4,
            eggs: 10,
            ..Default::default()
        };
        assert!(counts.collapsed());
        counts.prey = 1;
        assert!(!counts.collapsed());
        assert_eq!(counts.live_fish(), 1);
    }
}
