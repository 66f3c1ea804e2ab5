use macroquad::prelude::vec2;
use tracing::debug;

use crate::config::{FishConfig, SimConfig};
use crate::fish::{Condition, Fish};
use crate::genome::Genome;
use crate::organisms::Egg;
use crate::random::SimContext;
use crate::traits::Sex;

/// What a successful mating produced.
#[derive(Debug)]
pub enum MatingOutcome {
    /// The mother now carries the litter.
    Pregnancy,
    /// The mother laid a clutch around herself.
    Eggs(Vec<Egg>),
}

/// Both partners ready, compatible, close enough and fed enough.
pub fn can_mate(a: &Fish, b: &Fish, settings: &FishConfig) -> bool {
    if !a.ready_to_mate || !b.ready_to_mate {
        return false;
    }
    if a.is_dead() || b.is_dead() || a.is_pregnant() || b.is_pregnant() {
        return false;
    }
    if a.is_predator() != b.is_predator() || a.sex == b.sex {
        return false;
    }
    let reach = (a.size + b.size) * 2.0;
    if a.pos.distance_squared(b.pos) > reach * reach {
        return false;
    }
    a.energy >= a.traits.max_energy * settings.min_mating_energy
        && b.energy >= b.traits.max_energy * settings.min_mating_energy
}

/// Mate two fish. The female either becomes pregnant with the recombined
/// litter or lays it as a clutch of eggs; both partners pay for the effort
/// and stop being ready.
pub fn mate(
    a: &mut Fish,
    b: &mut Fish,
    config: &SimConfig,
    ctx: &mut SimContext,
) -> Option<MatingOutcome> {
    let settings = &config.fish;
    if !can_mate(a, b, settings) {
        return None;
    }
    let (mother, father) = if a.sex == Sex::Female { (a, b) } else { (b, a) };

    let predator = mother.is_predator();
    let egg_layer = mother.traits.is_egg_layer();
    let count = match (egg_layer, predator) {
        (true, true) => ctx.int_in(settings.predator_clutch),
        (true, false) => ctx.int_in(settings.prey_clutch),
        (false, true) => ctx.int_in(settings.predator_litter),
        (false, false) => ctx.int_in(settings.prey_litter),
    };
    let litter: Vec<Genome> = (0..count)
        .map(|_| Genome::recombine(&mother.genome, &father.genome, &config.genetics, ctx))
        .collect();
    let generation = mother.generation.max(father.generation) + 1;

    let mother_cost = mating_cost(mother, settings) * if egg_layer { settings.egg_layer_cost_factor } else { 1.0 };
    let father_cost = mating_cost(father, settings);
    mother.energy -= mother_cost;
    father.energy -= father_cost;
    mother.ready_to_mate = false;
    father.ready_to_mate = false;

    debug!(count, egg_layer, predator, generation, "fish mated");

    if egg_layer {
        let spread = config.egg.spread;
        let eggs = litter
            .into_iter()
            .map(|genome| {
                let pos = mother.pos + vec2(ctx.jitter(spread), ctx.jitter(spread));
                Egg::new(pos, genome, predator, generation, &config.egg, ctx)
            })
            .collect();
        mother.condition = Condition::Refractory {
            remaining: mother.traits.after_birth_duration as f32 / config.egg.rest_divisor,
        };
        Some(MatingOutcome::Eggs(eggs))
    } else {
        mother.condition = Condition::Pregnant { timer: 0, litter };
        Some(MatingOutcome::Pregnancy)
    }
}

fn mating_cost(fish: &Fish, settings: &FishConfig) -> f32 {
    fish.traits.max_energy * settings.mating_cost * (1.0 + fish.traits.metabolism * 0.25)
}

/// Count a pregnancy forward; once it has run its course the litter is
/// released and the mother enters her after-birth rest.
pub fn give_birth(fish: &mut Fish, settings: &FishConfig) -> Option<Vec<Genome>> {
    let Condition::Pregnant { timer, litter } = &mut fish.condition else {
        return None;
    };
    if *timer < fish.traits.pregnancy_duration {
        *timer += 1;
        return None;
    }
    let litter = std::mem::take(litter);
    fish.condition = Condition::Refractory {
        remaining: fish.traits.after_birth_duration as f32,
    };
    fish.energy -= settings.birth_cost * (1.0 + fish.traits.metabolism * 0.25);
    Some(litter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Gene, Trait, TRAIT_COUNT};
    use crate::traits::ReproductionStrategy;

    fn genome(predator: f32) -> Genome {
        let mut genes = [Gene::new(0.5, 0.5, 0); TRAIT_COUNT];
        genes[Trait::Predator.index()] = Gene::new(predator, predator, 0);
        Genome::from_genes(genes)
    }

    fn pair(strategy: ReproductionStrategy, ctx: &mut SimContext) -> (Fish, Fish) {
        let settings = FishConfig::default();
        let make = |sex: Sex, x: f32, ctx: &mut SimContext| {
            let mut fish = Fish::new(vec2(x, 200.0), genome(0.1), Some(60.0), &settings, 650.0, ctx);
            fish.sex = sex;
            fish.traits.strategy = strategy;
            fish.age = fish.traits.min_reproduction_age + 1.0;
            fish.energy = fish.traits.max_energy * 0.8;
            fish.ready_to_mate = true;
            fish
        };
        let male = make(Sex::Male, 100.0, ctx);
        let female = make(Sex::Female, 101.0, ctx);
        (male, female)
    }

    #[test]
    fn live_bearers_become_pregnant() {
        let config = SimConfig::default();
        let mut ctx = SimContext::new(1, 64);
        let (mut male, mut female) = pair(ReproductionStrategy::LiveBearer, &mut ctx);
        let outcome = mate(&mut male, &mut female, &config, &mut ctx);
        assert!(matches!(outcome, Some(MatingOutcome::Pregnancy)));
        assert!(!male.ready_to_mate && !female.ready_to_mate);
        match &female.condition {
            Condition::Pregnant { timer, litter } => {
                assert_eq!(*timer, 0);
                assert!((1..=3).contains(&litter.len()));
            }
            other => panic!("expected pregnancy, got {other:?}"),
        }
        assert_eq!(male.condition, Condition::Alive);
    }

    #[test]
    fn egg_layers_lay_a_clutch_and_pay_less() {
        let config = SimConfig::default();
        let mut ctx = SimContext::new(2, 64);
        let (mut male, mut female) = pair(ReproductionStrategy::EggLayer, &mut ctx);
        let (male_before, female_before) = (male.energy, female.energy);
        let outcome = mate(&mut female, &mut male, &config, &mut ctx);
        let Some(MatingOutcome::Eggs(eggs)) = outcome else {
            panic!("expected eggs");
        };
        assert!((15..=25).contains(&eggs.len()));
        assert!(eggs.iter().all(|e| e.pos.distance(female.pos) <= config.egg.spread * 2.0_f32.sqrt()));
        assert!(matches!(female.condition, Condition::Refractory { .. }));
        assert!(!male.ready_to_mate && !female.ready_to_mate);

        let male_paid = male_before - male.energy;
        let female_paid = female_before - female.energy;
        let female_full = mating_cost(&female, &config.fish);
        assert!((female_paid - female_full * config.fish.egg_layer_cost_factor).abs() < 1e-3);
        assert!((male_paid - mating_cost(&male, &config.fish)).abs() < 1e-3);
    }

    #[test]
    fn incompatible_pairs_are_rejected() {
        let config = SimConfig::default();
        let mut ctx = SimContext::new(3, 64);

        let (mut male, mut female) = pair(ReproductionStrategy::LiveBearer, &mut ctx);
        female.sex = Sex::Male;
        assert!(mate(&mut male, &mut female, &config, &mut ctx).is_none());

        let (mut male, mut female) = pair(ReproductionStrategy::LiveBearer, &mut ctx);
        female.pos = vec2(400.0, 400.0);
        assert!(mate(&mut male, &mut female, &config, &mut ctx).is_none());

        let (mut male, mut female) = pair(ReproductionStrategy::LiveBearer, &mut ctx);
        male.energy = male.traits.max_energy * 0.1;
        assert!(mate(&mut male, &mut female, &config, &mut ctx).is_none());
        assert!(male.ready_to_mate && female.ready_to_mate);

        let (mut male, mut female) = pair(ReproductionStrategy::LiveBearer, &mut ctx);
        male.ready_to_mate = false;
        assert!(mate(&mut male, &mut female, &config, &mut ctx).is_none());
    }

    #[test]
    fn birth_waits_for_the_full_pregnancy() {
        let config = SimConfig::default();
        let mut ctx = SimContext::new(4, 64);
        let (mut male, mut female) = pair(ReproductionStrategy::LiveBearer, &mut ctx);
        mate(&mut male, &mut female, &config, &mut ctx).expect("mated");
        let duration = female.traits.pregnancy_duration;
        for _ in 0..duration {
            assert!(give_birth(&mut female, &config.fish).is_none());
        }
        let before = female.energy;
        let litter = give_birth(&mut female, &config.fish).expect("born");
        assert!(!litter.is_empty());
        assert!(female.energy < before);
        assert_eq!(
            female.condition,
            Condition::Refractory {
                remaining: female.traits.after_birth_duration as f32
            }
        );
        assert!(give_birth(&mut female, &config.fish).is_none());
    }
}
