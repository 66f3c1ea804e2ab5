use serde::{Deserialize, Serialize};

use crate::config::FishConfig;
use crate::genome::{Genome, Trait};
use crate::random::SimContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn random(ctx: &mut SimContext) -> Self {
        if ctx.coin() {
            Sex::Male
        } else {
            Sex::Female
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReproductionStrategy {
    EggLayer,
    LiveBearer,
}

// Phenotype to physiology scaling, (prey, predator).
const SPEED_SCALE: (f32, f32) = (2.5, 1.5);
const SIZE_SCALE: (f32, f32) = (6.0, 10.0);
const SIZE_BASE: (f32, f32) = (3.0, 5.0);
const VISION_SCALE: (f32, f32) = (80.0, 60.0);
const VISION_BASE: (f32, f32) = (50.0, 40.0);
const REPRODUCTION_SCALE: (f32, f32) = (0.45, 0.25);
const EGG_LAYER_BELOW: (f32, f32) = (0.7, 0.3);

const MATE_VISION_FACTOR: f32 = 1.5;
const EXTREME_ALLELE: f32 = 0.8;
const DEFENSE_UPKEEP: f32 = 0.05;

fn by_class(pair: (f32, f32), predator: bool) -> f32 {
    if predator {
        pair.1
    } else {
        pair.0
    }
}

/// Physiology of one fish, derived once from its genome and sex.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FishTraits {
    pub is_predator: bool,
    pub strategy: ReproductionStrategy,
    /// Cruising speed at full size; shrinks as the body grows.
    pub base_speed: f32,
    pub max_size: f32,
    pub vision: f32,
    pub mate_vision: f32,
    pub vision_sq: f32,
    pub vision_sq_in_algae: f32,
    pub metabolism: f32,
    pub digestion: f32,
    pub reproduction_rate: f32,
    pub defense: f32,
    pub preferred_depth: f32,
    pub turn_speed: f32,
    pub max_energy: f32,
    pub energy_threshold: f32,
    pub max_age: f32,
    pub min_reproduction_age: f32,
    pub pregnancy_duration: u32,
    pub after_birth_duration: u32,
    pub pregnancy_upkeep: f32,
    pub float_speed: f32,
    /// Upkeep paid for extreme speed, size or vision alleles.
    pub energy_penalty: f32,
    pub defense_cost: f32,
    pub color: f32,
}

impl FishTraits {
    pub fn derive(
        genome: &Genome,
        sex: Sex,
        settings: &FishConfig,
        height: f32,
        ctx: &mut SimContext,
    ) -> Self {
        let predator = genome.is_predator();
        let ph = |t: Trait| genome.phenotype(t);

        let strategy = if ph(Trait::ReproductionStrategy) < by_class(EGG_LAYER_BELOW, predator) {
            ReproductionStrategy::EggLayer
        } else {
            ReproductionStrategy::LiveBearer
        };

        let mut speed = ph(Trait::Speed) * by_class(SPEED_SCALE, predator);
        let mut max_size = ph(Trait::Size) * by_class(SIZE_SCALE, predator) + by_class(SIZE_BASE, predator);
        let vision = ph(Trait::Vision) * by_class(VISION_SCALE, predator) + by_class(VISION_BASE, predator);
        let mut metabolism = ph(Trait::Metabolism);
        let digestion = ph(Trait::Digestion);
        let reproduction_rate = ph(Trait::Reproduction) * by_class(REPRODUCTION_SCALE, predator);
        let mut defense = ph(Trait::Defense);
        let preferred_depth =
            ph(Trait::PreferredDepth) * (height - 2.0 * max_size).max(0.0) + max_size;
        let mut turn_speed = if predator {
            settings.predator_turn_speed
        } else {
            settings.prey_turn_speed
        };

        // Pleiotropy: one gene pulls on several traits.
        metabolism = (metabolism + max_size / 20.0).min(1.0);
        defense *= 1.0 - ph(Trait::Speed) * 0.4;
        speed *= 1.0 - defense * 0.3;
        max_size *= 1.0 - defense * 0.2;
        turn_speed *= 1.0 - ph(Trait::Size) * 0.25;
        metabolism = (metabolism + ph(Trait::Vision) * 0.2).min(1.0);

        let energy_penalty: f32 = [Trait::Speed, Trait::Size, Trait::Vision]
            .into_iter()
            .map(|t| ph(t))
            .filter(|v| *v > EXTREME_ALLELE)
            .map(|v| (v - EXTREME_ALLELE) * 0.5)
            .sum();
        let defense_cost = defense * DEFENSE_UPKEEP;

        match sex {
            Sex::Male => speed *= 0.9,
            Sex::Female => defense *= 1.1,
        }

        let class_factor = if predator { 1.2 } else { 1.0 };
        let max_age = max_size * 4.0 * ctx.uniform(0.8, 1.2) * class_factor * (1.0 - metabolism * 0.3);
        let repro_factor = if predator { 1.5 } else { 1.0 };
        let min_reproduction_age = max_size * 0.4 * ctx.uniform(0.7, 1.3) * repro_factor;

        let (pregnancy, after_birth, threshold, upkeep) = if predator {
            (
                settings.predator_pregnancy_duration,
                settings.predator_after_birth,
                settings.predator_energy_threshold,
                settings.predator_pregnancy_upkeep,
            )
        } else {
            (
                settings.prey_pregnancy_duration,
                settings.prey_after_birth,
                settings.prey_energy_threshold,
                settings.prey_pregnancy_upkeep,
            )
        };

        let mut traits = Self {
            is_predator: predator,
            strategy,
            base_speed: speed,
            max_size,
            vision,
            mate_vision: 0.0,
            vision_sq: 0.0,
            vision_sq_in_algae: 0.0,
            metabolism,
            digestion,
            reproduction_rate,
            defense,
            preferred_depth,
            turn_speed,
            max_energy: 0.0,
            energy_threshold: threshold,
            max_age,
            min_reproduction_age,
            pregnancy_duration: ctx.int_in(pregnancy),
            after_birth_duration: ctx.int_in(after_birth),
            pregnancy_upkeep: upkeep,
            float_speed: 1.5 / (1.0 + settings.initial_size) / 2.0,
            energy_penalty,
            defense_cost,
            color: ph(Trait::Color),
        };
        traits.recompute(settings);
        traits
    }

    /// Refresh the values that depend on other traits.
    pub fn recompute(&mut self, settings: &FishConfig) {
        self.max_energy = max_energy(
            settings,
            self.max_size,
            self.digestion,
            self.reproduction_rate,
            self.metabolism,
        );
        self.mate_vision = self.vision * MATE_VISION_FACTOR;
        self.vision_sq = self.vision * self.vision;
        self.vision_sq_in_algae = self.vision_sq * settings.vision_in_algae * settings.vision_in_algae;
    }

    pub fn is_egg_layer(&self) -> bool {
        self.strategy == ReproductionStrategy::EggLayer
    }
}

/// Energy capacity of a body: bigger, better digesting and more fertile fish
/// store more, fast metabolisms store less.
pub fn max_energy(
    settings: &FishConfig,
    max_size: f32,
    digestion: f32,
    reproduction_rate: f32,
    metabolism: f32,
) -> f32 {
    settings.max_energy
        * (settings.size_effect * max_size
            + settings.digestion_effect * digestion
            + settings.reproduction_effect * reproduction_rate)
        / (1.0 + settings.metabolism_effect * metabolism)
        / 3.0
}

/// Hand-authored trait values that replace the derived ones.
///
/// Every value is clamped into the range a user may enter for it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraitOverrides {
    pub max_age: Option<f32>,
    pub max_size: Option<f32>,
    pub speed: Option<f32>,
    pub vision: Option<f32>,
    pub metabolism: Option<f32>,
    pub digestion: Option<f32>,
    pub reproduction_rate: Option<f32>,
    pub defense: Option<f32>,
    pub preferred_depth: Option<f32>,
    pub sex: Option<Sex>,
    pub strategy: Option<ReproductionStrategy>,
}

impl TraitOverrides {
    pub fn is_empty(&self) -> bool {
        self.max_age.is_none()
            && self.max_size.is_none()
            && self.speed.is_none()
            && self.vision.is_none()
            && self.metabolism.is_none()
            && self.digestion.is_none()
            && self.reproduction_rate.is_none()
            && self.defense.is_none()
            && self.preferred_depth.is_none()
            && self.sex.is_none()
            && self.strategy.is_none()
    }

    pub fn apply(&self, traits: &mut FishTraits, settings: &FishConfig, height: f32) {
        if let Some(v) = self.max_age {
            traits.max_age = v.clamp(10.0, 200.0);
        }
        if let Some(v) = self.max_size {
            traits.max_size = v.clamp(1.0, 15.0);
        }
        if let Some(v) = self.speed {
            traits.base_speed = v.clamp(0.5, 5.0);
        }
        if let Some(v) = self.vision {
            traits.vision = v.clamp(10.0, 100.0);
        }
        if let Some(v) = self.metabolism {
            traits.metabolism = v.clamp(0.1, 1.0);
        }
        if let Some(v) = self.digestion {
            traits.digestion = v.clamp(0.1, 1.0);
        }
        if let Some(v) = self.reproduction_rate {
            traits.reproduction_rate = v.clamp(0.1, 1.0);
        }
        if let Some(v) = self.defense {
            traits.defense = v.clamp(0.1, 1.0);
        }
        if let Some(v) = self.preferred_depth {
            traits.preferred_depth = v.clamp(0.0, height);
        }
        if let Some(strategy) = self.strategy {
            traits.strategy = strategy;
        }
        traits.recompute(settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Gene, TRAIT_COUNT};

    fn genome_with(value: f32, predator: f32) -> Genome {
        let mut genes = [Gene::new(value, value, 0); TRAIT_COUNT];
        genes[Trait::Predator.index()] = Gene::new(predator, predator, 0);
        Genome::from_genes(genes)
    }

    #[test]
    fn predators_are_bigger_and_see_less_far() {
        let settings = FishConfig::default();
        let mut ctx = SimContext::new(1, 64);
        let prey = FishTraits::derive(&genome_with(0.5, 0.1), Sex::Female, &settings, 650.0, &mut ctx);
        let hunter = FishTraits::derive(&genome_with(0.5, 0.9), Sex::Female, &settings, 650.0, &mut ctx);
        assert!(!prey.is_predator && hunter.is_predator);
        assert!(hunter.max_size > prey.max_size);
        assert!(hunter.vision < prey.vision);
        assert_eq!(hunter.energy_threshold, 35.0);
        assert_eq!(prey.energy_threshold, 20.0);
        assert!(hunter.turn_speed < prey.turn_speed);
    }

    #[test]
    fn dimorphism_slows_males_and_armours_females() {
        let settings = FishConfig::default();
        let genome = genome_with(0.5, 0.1);
        let male = FishTraits::derive(&genome, Sex::Male, &settings, 650.0, &mut SimContext::new(3, 8));
        let female = FishTraits::derive(&genome, Sex::Female, &settings, 650.0, &mut SimContext::new(3, 8));
        assert!((male.base_speed - female.base_speed * 0.9).abs() < 1e-5);
        assert!((female.defense - male.defense * 1.1).abs() < 1e-5);
    }

    #[test]
    fn extreme_alleles_cost_energy() {
        let settings = FishConfig::default();
        let mut ctx = SimContext::new(4, 8);
        let moderate = FishTraits::derive(&genome_with(0.5, 0.1), Sex::Male, &settings, 650.0, &mut ctx);
        let extreme = FishTraits::derive(&genome_with(1.0, 0.1), Sex::Male, &settings, 650.0, &mut ctx);
        assert_eq!(moderate.energy_penalty, 0.0);
        assert!((extreme.energy_penalty - 0.3).abs() < 1e-5);
        assert!(extreme.metabolism <= 1.0);
    }

    #[test]
    fn vision_radii_are_squared() {
        let settings = FishConfig::default();
        let traits = FishTraits::derive(&genome_with(0.4, 0.2), Sex::Male, &settings, 650.0, &mut SimContext::new(5, 8));
        assert!((traits.vision_sq - traits.vision * traits.vision).abs() < 1e-3);
        let reduced = traits.vision * settings.vision_in_algae;
        assert!((traits.vision_sq_in_algae - reduced * reduced).abs() < 1e-3);
        assert!(traits.vision_sq_in_algae < traits.vision_sq);
    }

    #[test]
    fn overrides_are_clamped_and_recomputed() {
        let settings = FishConfig::default();
        let mut traits = FishTraits::derive(&genome_with(0.5, 0.1), Sex::Male, &settings, 650.0, &mut SimContext::new(6, 8));
        let before = traits.max_energy;
        let overrides = TraitOverrides {
            max_size: Some(40.0),
            vision: Some(3.0),
            defense: Some(0.0),
            preferred_depth: Some(900.0),
            ..TraitOverrides::default()
        };
        overrides.apply(&mut traits, &settings, 650.0);
        assert_eq!(traits.max_size, 15.0);
        assert_eq!(traits.vision, 10.0);
        assert_eq!(traits.defense, 0.1);
        assert_eq!(traits.preferred_depth, 650.0);
        assert_eq!(traits.vision_sq, 100.0);
        assert!(traits.max_energy > before);
    }
}
