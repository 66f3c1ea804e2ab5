use std::collections::HashSet;

use macroquad::prelude::Vec2;
use tracing::{debug, warn};

use crate::config::SimConfig;
use crate::entity::{Arena, EntityId};
use crate::fish::{DeathCause, Fish};
use crate::food::FoodRef;
use crate::genome::Genome;
use crate::organisms::{Egg, Organisms};
use crate::random::SimContext;
use crate::reproduction::{self, MatingOutcome};
use crate::vegetation::Vegetation;

/// What a fish asked to eat this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Meal {
    Food(FoodRef),
    /// A drifting corpse.
    Corpse(EntityId),
    /// Live prey that failed its escape roll.
    Fish { prey: EntityId, retaliation: bool },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeedClaim {
    pub eater: EntityId,
    pub meal: Meal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatingIntent {
    pub first: EntityId,
    pub second: EntityId,
}

/// Pending birth record (to avoid borrow conflicts during iteration).
#[derive(Clone, Debug)]
pub struct BirthRecord {
    pub pos: Vec2,
    pub genome: Genome,
    pub generation: u32,
}

/// Structural changes gathered during the read phase of a tick.
#[derive(Default, Debug)]
pub struct PendingChanges {
    pub claims: Vec<FeedClaim>,
    pub matings: Vec<MatingIntent>,
    pub births: Vec<BirthRecord>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty() && self.matings.is_empty() && self.births.is_empty()
    }
}

/// Tally of one commit, folded into the population statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub meals: u32,
    pub fish_eaten: u32,
    pub matings: u32,
    pub births: u32,
    pub dropped_births: u32,
    pub eggs_laid: u32,
    pub starved: u32,
    pub removed: u32,
}

/// Mutable populations touched by a commit.
pub struct CommitTargets<'a> {
    pub fish: &'a mut Arena<Fish>,
    pub vegetation: &'a mut Vegetation,
    pub organisms: &'a mut Organisms,
}

/// Apply a tick's pending changes in a fixed order: meals, matings, births,
/// starvation, removals, then the new eggs.
pub fn apply(
    pending: PendingChanges,
    targets: CommitTargets,
    config: &SimConfig,
    height: f32,
    ctx: &mut SimContext,
) -> CommitReport {
    let CommitTargets {
        fish,
        vegetation,
        organisms,
    } = targets;
    let settings = &config.fish;
    let mut report = CommitReport::default();
    let mut eaten: HashSet<EntityId> = HashSet::new();

    for claim in pending.claims {
        if eaten.contains(&claim.eater) {
            continue;
        }
        let value = match claim.meal {
            Meal::Food(food) => take_food(food, vegetation, organisms, settings.algae_bite_energy),
            Meal::Corpse(id) => {
                if eaten.contains(&id) {
                    None
                } else {
                    let corpse = fish.get(id).filter(|f| f.is_dead()).map(|f| f.energy);
                    if corpse.is_some() {
                        eaten.insert(id);
                    }
                    corpse.map(|energy| energy * settings.corpse_gain_factor)
                }
            }
            Meal::Fish { prey, .. } => {
                if eaten.contains(&prey) {
                    None
                } else {
                    let energy = fish.get(prey).map(|f| f.energy.max(0.0));
                    if energy.is_some() {
                        eaten.insert(prey);
                        report.fish_eaten += 1;
                    }
                    energy
                }
            }
        };
        let Some(value) = value else {
            continue;
        };
        let Some(eater) = fish.get_mut(claim.eater) else {
            continue;
        };
        let gain = eater.digest(value);
        eater.gain_energy(gain);
        if let Meal::Fish {
            retaliation: true, ..
        } = claim.meal
        {
            eater.energy -= settings.retaliation_cost;
        }
        report.meals += 1;
    }

    let mut eggs: Vec<Egg> = Vec::new();
    for intent in pending.matings {
        if eaten.contains(&intent.first) || eaten.contains(&intent.second) {
            continue;
        }
        let Some((a, b)) = fish.get2_mut(intent.first, intent.second) else {
            continue;
        };
        match reproduction::mate(a, b, config, ctx) {
            Some(MatingOutcome::Eggs(clutch)) => {
                report.matings += 1;
                report.eggs_laid += clutch.len() as u32;
                eggs.extend(clutch);
            }
            Some(MatingOutcome::Pregnancy) => report.matings += 1,
            None => {}
        }
    }

    let cap = config.population.max_fish;
    for birth in pending.births {
        if fish.len() >= cap {
            report.dropped_births += 1;
            continue;
        }
        let mut child = Fish::new(
            birth.pos,
            birth.genome,
            Some(settings.hatchling_energy),
            settings,
            height,
            ctx,
        );
        child.generation = birth.generation;
        fish.spawn(child);
        report.births += 1;
    }
    if report.dropped_births > 0 {
        warn!(dropped = report.dropped_births, cap, "fish population at cap, births dropped");
    }

    for id in fish.ids() {
        if eaten.contains(&id) {
            continue;
        }
        if let Some(f) = fish.get_mut(id) {
            if f.check_energy(settings, ctx) == Some(DeathCause::Starvation) {
                report.starved += 1;
            }
        }
    }

    let doomed: Vec<EntityId> = fish
        .iter()
        .filter(|(id, f)| eaten.contains(id) || f.surfaced())
        .map(|(id, _)| id)
        .collect();
    for id in &doomed {
        fish.despawn(*id);
    }
    report.removed = doomed.len() as u32;

    for egg in eggs {
        organisms.eggs.spawn(egg);
    }

    if report != CommitReport::default() {
        debug!(?report, "tick committed");
    }
    report
}

/// Remove a food item and return its energy value, or `None` if someone
/// else got there first.
fn take_food(
    food: FoodRef,
    vegetation: &mut Vegetation,
    organisms: &mut Organisms,
    algae_bite: f32,
) -> Option<f32> {
    match food {
        FoodRef::AlgaeSegment(key) => vegetation.consume_segment(key).then_some(algae_bite),
        FoodRef::Plankton(id) => organisms.plankton.despawn(id).map(|p| p.energy_value),
        FoodRef::DeadAlgae(id) => organisms.dead_algae.despawn(id).map(|p| p.energy_value),
        FoodRef::Crustacean(id) => organisms.crustaceans.despawn(id).map(|c| c.energy_value),
        FoodRef::Egg(id) => organisms.eggs.despawn(id).map(|e| e.energy_value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlgaeConfig, PlanktonConfig};
    use crate::fish::Condition;
    use crate::organisms::Plankton;
    use crate::world::World;
    use macroquad::prelude::vec2;

    struct Bench {
        config: SimConfig,
        fish: Arena<Fish>,
        vegetation: Vegetation,
        organisms: Organisms,
        ctx: SimContext,
    }

    impl Bench {
        fn new() -> Self {
            let config = SimConfig::default();
            let world = World::new(1100.0, 650.0);
            Self {
                vegetation: Vegetation::new(&world, &AlgaeConfig::default(), 50.0),
                config,
                fish: Arena::new(),
                organisms: Organisms::new(),
                ctx: SimContext::new(7, 64),
            }
        }

        fn fish(&mut self, x: f32, energy: f32) -> EntityId {
            let genome = Genome::random(&mut self.ctx);
            let fish = Fish::new(vec2(x, 300.0), genome, Some(energy), &self.config.fish, 650.0, &mut self.ctx);
            self.fish.spawn(fish)
        }

        fn commit(&mut self, pending: PendingChanges) -> CommitReport {
            apply(
                pending,
                CommitTargets {
                    fish: &mut self.fish,
                    vegetation: &mut self.vegetation,
                    organisms: &mut self.organisms,
                },
                &self.config,
                650.0,
                &mut self.ctx,
            )
        }
    }

    #[test]
    fn contested_food_goes_to_the_first_claim() {
        let mut bench = Bench::new();
        let first = bench.fish(100.0, 10.0);
        let second = bench.fish(110.0, 10.0);
        let plankton = bench
            .organisms
            .plankton
            .spawn(Plankton::new(vec2(105.0, 300.0), &PlanktonConfig::default(), &mut bench.ctx));

        let mut pending = PendingChanges::default();
        for eater in [first, second] {
            pending.claims.push(FeedClaim {
                eater,
                meal: Meal::Food(FoodRef::Plankton(plankton)),
            });
        }
        let report = bench.commit(pending);

        assert_eq!(report.meals, 1);
        assert!(bench.organisms.plankton.is_empty());
        assert!(bench.fish.get(first).map(|f| f.energy).unwrap_or(0.0) > 10.0);
        assert_eq!(bench.fish.get(second).map(|f| f.energy), Some(10.0));
    }

    #[test]
    fn eaten_fish_are_removed_and_cannot_eat() {
        let mut bench = Bench::new();
        let hunter = bench.fish(100.0, 10.0);
        let prey = bench.fish(102.0, 30.0);
        let plankton = bench
            .organisms
            .plankton
            .spawn(Plankton::new(vec2(102.0, 300.0), &PlanktonConfig::default(), &mut bench.ctx));

        let mut pending = PendingChanges::default();
        pending.claims.push(FeedClaim {
            eater: hunter,
            meal: Meal::Fish {
                prey,
                retaliation: true,
            },
        });
        pending.claims.push(FeedClaim {
            eater: prey,
            meal: Meal::Food(FoodRef::Plankton(plankton)),
        });
        let report = bench.commit(pending);

        assert_eq!(report.fish_eaten, 1);
        assert_eq!(report.removed, 1);
        assert!(!bench.fish.contains(prey));
        assert_eq!(bench.organisms.plankton.len(), 1);
        let hunter = bench.fish.get(hunter).expect("hunter survives");
        let expected = (10.0 + hunter.digest(30.0)).min(hunter.traits.max_energy) - bench.config.fish.retaliation_cost;
        assert!((hunter.energy - expected).abs() < 1e-4);
    }

    #[test]
    fn starving_fish_become_corpses_and_surfaced_corpses_leave() {
        let mut bench = Bench::new();
        let starving = bench.fish(100.0, 0.0);
        let floater = bench.fish(300.0, 10.0);
        if let Some(f) = bench.fish.get_mut(floater) {
            f.condition = Condition::Dead;
            f.pos.y = -1.0;
        }
        let report = bench.commit(PendingChanges::default());

        assert_eq!(report.starved, 1);
        assert_eq!(report.removed, 1);
        let corpse = bench.fish.get(starving).expect("corpse stays");
        assert!(corpse.is_dead());
        assert!(corpse.energy >= 5.0);
        assert!(!bench.fish.contains(floater));
    }

    #[test]
    fn births_respect_the_population_cap() {
        let mut bench = Bench::new();
        bench.config.population.max_fish = 2;
        bench.fish(100.0, 30.0);
        let genome = Genome::random(&mut bench.ctx);
        let mut pending = PendingChanges::default();
        for _ in 0..3 {
            pending.births.push(BirthRecord {
                pos: vec2(100.0, 300.0),
                genome: genome.clone(),
                generation: 2,
            });
        }
        let report = bench.commit(pending);

        assert_eq!(report.births, 1);
        assert_eq!(report.dropped_births, 2);
        assert_eq!(bench.fish.len(), 2);
        assert!(bench.fish.values().any(|f| f.generation == 2));
    }
}
